#[tokio::main]
async fn main() -> anyhow::Result<()> {
    insightql_server::start().await
}
