use anyhow::Result;
use krishna::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
