//! # SQLite Specific SQL
//!
//! This module centralizes SQL strings for the SQLite provider: catalogue
//! introspection and the bundled Northwind demo warehouse.

/// Lists user tables, skipping SQLite's internal ones.
pub const LIST_TABLES: &str =
    "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name;";

/// Returns the `PRAGMA` that describes the columns of one table.
///
/// The table name comes from `sqlite_master`, never from user input.
pub fn table_info(table_name: &str) -> String {
    format!("PRAGMA table_info(\"{}\");", table_name.replace('"', "\"\""))
}

/// Table definitions of the Northwind demo warehouse.
pub const NORTHWIND_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS categories (
        category_id INTEGER PRIMARY KEY,
        category_name TEXT NOT NULL,
        description TEXT
    )",
    "CREATE TABLE IF NOT EXISTS suppliers (
        supplier_id INTEGER PRIMARY KEY,
        company_name TEXT NOT NULL,
        country TEXT
    )",
    "CREATE TABLE IF NOT EXISTS products (
        product_id INTEGER PRIMARY KEY,
        product_name TEXT NOT NULL,
        supplier_id INTEGER,
        category_id INTEGER,
        unit_price REAL,
        units_in_stock INTEGER,
        discontinued INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS customers (
        customer_id TEXT PRIMARY KEY,
        company_name TEXT NOT NULL,
        contact_name TEXT,
        city TEXT,
        country TEXT
    )",
    "CREATE TABLE IF NOT EXISTS employees (
        employee_id INTEGER PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        title TEXT,
        city TEXT,
        country TEXT,
        hire_date TEXT
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        order_id INTEGER PRIMARY KEY,
        customer_id TEXT,
        employee_id INTEGER,
        order_date TEXT,
        ship_city TEXT,
        ship_country TEXT
    )",
    "CREATE TABLE IF NOT EXISTS order_details (
        order_id INTEGER NOT NULL,
        product_id INTEGER NOT NULL,
        unit_price REAL NOT NULL,
        quantity INTEGER NOT NULL,
        discount REAL NOT NULL DEFAULT 0
    )",
];

/// A small, consistent slice of Northwind data for demos and tests.
pub const NORTHWIND_SAMPLE_DATA: &[&str] = &[
    "INSERT INTO categories (category_id, category_name, description) VALUES
        (1, 'Beverages', 'Soft drinks, coffees, teas, beers, and ales'),
        (2, 'Condiments', 'Sweet and savory sauces, relishes, spreads, and seasonings'),
        (3, 'Confections', 'Desserts, candies, and sweet breads'),
        (4, 'Dairy Products', 'Cheeses')",
    "INSERT INTO suppliers (supplier_id, company_name, country) VALUES
        (1, 'Exotic Liquids', 'UK'),
        (2, 'New Orleans Cajun Delights', 'USA'),
        (3, 'Formaggi Fortini s.r.l.', 'Italy')",
    "INSERT INTO products (product_id, product_name, supplier_id, category_id, unit_price, units_in_stock, discontinued) VALUES
        (1, 'Chai', 1, 1, 18.0, 39, 0),
        (2, 'Chang', 1, 1, 19.0, 17, 0),
        (3, 'Aniseed Syrup', 1, 2, 10.0, 13, 0),
        (4, 'Chef Anton''s Cajun Seasoning', 2, 2, 22.0, 53, 0),
        (5, 'Chef Anton''s Gumbo Mix', 2, 2, 21.35, 0, 1),
        (6, 'Teatime Chocolate Biscuits', 1, 3, 9.2, 25, 0),
        (7, 'Gorgonzola Telino', 3, 4, 12.5, 0, 0),
        (8, 'Mascarpone Fabioli', 3, 4, 32.0, 9, 0)",
    "INSERT INTO customers (customer_id, company_name, contact_name, city, country) VALUES
        ('ALFKI', 'Alfreds Futterkiste', 'Maria Anders', 'Berlin', 'Germany'),
        ('ANATR', 'Ana Trujillo Emparedados y helados', 'Ana Trujillo', 'Mexico D.F.', 'Mexico'),
        ('BERGS', 'Berglunds snabbkop', 'Christina Berglund', 'Lulea', 'Sweden'),
        ('BONAP', 'Bon app''', 'Laurence Lebihan', 'Marseille', 'France'),
        ('SAVEA', 'Save-a-lot Markets', 'Jose Pavarotti', 'Boise', 'USA')",
    "INSERT INTO employees (employee_id, first_name, last_name, title, city, country, hire_date) VALUES
        (1, 'Nancy', 'Davolio', 'Sales Representative', 'Seattle', 'USA', '1992-05-01'),
        (2, 'Andrew', 'Fuller', 'Vice President, Sales', 'Tacoma', 'USA', '1992-08-14'),
        (3, 'Steven', 'Buchanan', 'Sales Manager', 'London', 'UK', '1993-10-17')",
    "INSERT INTO orders (order_id, customer_id, employee_id, order_date, ship_city, ship_country) VALUES
        (10248, 'ALFKI', 1, '1996-07-04', 'Berlin', 'Germany'),
        (10249, 'ANATR', 2, '1996-07-05', 'Mexico D.F.', 'Mexico'),
        (10250, 'BERGS', 1, '1996-07-08', 'Lulea', 'Sweden'),
        (10251, 'BONAP', 3, '1997-01-15', 'Marseille', 'France'),
        (10252, 'SAVEA', 2, '1997-03-02', 'Boise', 'USA'),
        (10253, 'ALFKI', 1, '1997-06-21', 'Berlin', 'Germany'),
        (10254, 'SAVEA', 3, '1997-11-30', 'Boise', 'USA'),
        (10255, 'BERGS', 2, '1998-02-11', 'Lulea', 'Sweden')",
    "INSERT INTO order_details (order_id, product_id, unit_price, quantity, discount) VALUES
        (10248, 1, 18.0, 12, 0),
        (10248, 7, 12.5, 10, 0),
        (10249, 2, 19.0, 9, 0),
        (10249, 8, 32.0, 40, 0.05),
        (10250, 4, 22.0, 10, 0),
        (10250, 6, 9.2, 35, 0.15),
        (10251, 3, 10.0, 6, 0),
        (10251, 5, 21.35, 15, 0.05),
        (10252, 1, 18.0, 40, 0),
        (10252, 8, 32.0, 25, 0),
        (10253, 2, 19.0, 20, 0),
        (10254, 6, 9.2, 21, 0),
        (10254, 4, 22.0, 15, 0.1),
        (10255, 7, 12.5, 30, 0)",
];
