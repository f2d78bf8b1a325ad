use anyhow::{Context, Result, bail};

use crate::core::AppConfig;
use crate::openai::{CompletionClient, OpenAiClient};

/// Sends a single message and prints the reply to stdout. A failed
/// completion is returned as an error so the process exits non-zero
/// instead of printing the error text as if it were a reply.
pub async fn run(config: &AppConfig, message: String) -> Result<()> {
    let reply = ask(&OpenAiClient::from_config(config), &message).await?;
    println!("{}", reply);
    Ok(())
}

async fn ask(client: &dyn CompletionClient, message: &str) -> Result<String> {
    if message.trim().is_empty() {
        bail!("Message is empty, nothing to send");
    }

    let reply = client
        .complete(message)
        .await
        .inspect_err(|e| tracing::error!("Completion failed: {:?}", e))
        .context("Completion request failed")?;
    Ok(reply)
}
