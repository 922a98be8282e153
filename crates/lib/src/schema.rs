//! # Schema Provider
//!
//! Supplies the warehouse schema to the translator and keeps the last good copy
//! around so that a flaky catalogue never blocks a request.

use crate::{
    constants::{SCHEMA_CACHE_TTL, SCHEMA_FETCH_TIMEOUT},
    providers::db::storage::Storage,
    types::{ColumnDescription, SchemaDescription, TableDescription},
};
use serde::{ser::SerializeStruct, Serialize, Serializer};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};
use tracing::{debug, info, warn};

/// Where a served schema came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaSource {
    /// Fetched from the store during this call.
    Live,
    /// Served from the memoized copy.
    Cache,
    /// The last good copy, served because a refresh failed.
    Stale,
    /// The built-in minimal schema, served because nothing better was available.
    Fallback,
}

impl SchemaSource {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Stale | Self::Fallback)
    }
}

#[derive(Debug, Clone)]
pub struct SchemaSnapshot {
    pub schema: Arc<SchemaDescription>,
    pub source: SchemaSource,
}

impl Serialize for SchemaSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SchemaSnapshot", 3)?;
        state.serialize_field("source", &self.source)?;
        state.serialize_field("degraded", &self.source.is_degraded())?;
        state.serialize_field("tables", &self.schema.tables)?;
        state.end()
    }
}

#[derive(Debug)]
struct CachedSchema {
    schema: Arc<SchemaDescription>,
    fetched_at: Instant,
}

/// A TTL-memoized view of the warehouse catalogue.
///
/// Reads are concurrent. At most one refresh runs at a time; callers that
/// arrive during a refresh get the cached copy (marked stale if it has
/// expired), or wait for the refresh when there is nothing cached yet.
#[derive(Debug)]
pub struct SchemaProvider {
    storage: Arc<dyn Storage>,
    ttl: Duration,
    fetch_timeout: Duration,
    cache: RwLock<Option<CachedSchema>>,
    refresh: Mutex<()>,
}

impl SchemaProvider {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_settings(storage, SCHEMA_CACHE_TTL, SCHEMA_FETCH_TIMEOUT)
    }

    pub fn with_settings(storage: Arc<dyn Storage>, ttl: Duration, fetch_timeout: Duration) -> Self {
        Self {
            storage,
            ttl,
            fetch_timeout,
            cache: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Returns the current schema. Never fails.
    pub async fn get_schema(&self) -> SchemaSnapshot {
        if let Some(schema) = self.fresh_copy().await {
            return SchemaSnapshot {
                schema,
                source: SchemaSource::Cache,
            };
        }

        let _guard = match self.refresh.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                if let Some(snapshot) = self.cached_snapshot().await {
                    debug!(source = ?snapshot.source, "Schema refresh already in flight. Serving cached copy.");
                    return snapshot;
                }
                let guard = self.refresh.lock().await;
                // The refresh we waited on may have filled the cache.
                if let Some(schema) = self.fresh_copy().await {
                    return SchemaSnapshot {
                        schema,
                        source: SchemaSource::Cache,
                    };
                }
                guard
            }
        };

        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> SchemaSnapshot {
        let fetched = tokio::time::timeout(self.fetch_timeout, self.storage.introspect_schema()).await;

        let failure = match fetched {
            Ok(Ok(rows)) if !rows.is_empty() => {
                let schema = Arc::new(SchemaDescription::from_rows(rows));
                info!(
                    "Fetched warehouse schema from {} ({} tables).",
                    self.storage.name(),
                    schema.tables.len()
                );
                *self.cache.write().await = Some(CachedSchema {
                    schema: schema.clone(),
                    fetched_at: Instant::now(),
                });
                return SchemaSnapshot {
                    schema,
                    source: SchemaSource::Live,
                };
            }
            Ok(Ok(_)) => "catalogue returned no columns".to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {}s", self.fetch_timeout.as_secs()),
        };

        match self.any_copy().await {
            Some(schema) => {
                warn!("Schema refresh failed ({failure}). Serving stale copy.");
                SchemaSnapshot {
                    schema,
                    source: SchemaSource::Stale,
                }
            }
            None => {
                warn!("Schema fetch failed ({failure}). Serving built-in fallback schema.");
                SchemaSnapshot {
                    schema: Arc::new(fallback_schema()),
                    source: SchemaSource::Fallback,
                }
            }
        }
    }

    async fn fresh_copy(&self) -> Option<Arc<SchemaDescription>> {
        self.cache
            .read()
            .await
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.schema.clone())
    }

    /// The cached copy, labelled `Stale` once it has outlived the TTL.
    async fn cached_snapshot(&self) -> Option<SchemaSnapshot> {
        self.cache.read().await.as_ref().map(|cached| SchemaSnapshot {
            schema: cached.schema.clone(),
            source: if cached.fetched_at.elapsed() < self.ttl {
                SchemaSource::Cache
            } else {
                SchemaSource::Stale
            },
        })
    }

    async fn any_copy(&self) -> Option<Arc<SchemaDescription>> {
        self.cache
            .read()
            .await
            .as_ref()
            .map(|cached| cached.schema.clone())
    }
}

/// The minimal Northwind schema used when the catalogue cannot be read.
pub fn fallback_schema() -> SchemaDescription {
    fn table(name: &str, columns: &[(&str, &str)]) -> TableDescription {
        TableDescription {
            name: name.to_string(),
            columns: columns
                .iter()
                .map(|(name, data_type)| ColumnDescription {
                    name: name.to_string(),
                    data_type: data_type.to_string(),
                })
                .collect(),
        }
    }

    SchemaDescription {
        tables: vec![
            table(
                "employees",
                &[
                    ("employee_id", "integer"),
                    ("first_name", "text"),
                    ("last_name", "text"),
                    ("title", "text"),
                    ("country", "text"),
                ],
            ),
            table(
                "customers",
                &[
                    ("customer_id", "text"),
                    ("company_name", "text"),
                    ("city", "text"),
                    ("country", "text"),
                ],
            ),
            table(
                "orders",
                &[
                    ("order_id", "integer"),
                    ("customer_id", "text"),
                    ("employee_id", "integer"),
                    ("order_date", "text"),
                    ("ship_country", "text"),
                ],
            ),
            table(
                "products",
                &[
                    ("product_id", "integer"),
                    ("product_name", "text"),
                    ("category_id", "integer"),
                    ("unit_price", "real"),
                    ("units_in_stock", "integer"),
                ],
            ),
        ],
    }
}
