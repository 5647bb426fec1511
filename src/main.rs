#[tokio::main]
async fn main() -> anyhow::Result<()> {
    statcan_explorer::run().await
}
