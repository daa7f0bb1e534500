#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tamer::replay::run().await
}
