use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod ask;
pub mod chat;
pub mod render;

use crate::core::config::timeout_from_secs;
use crate::core::{AppConfig, ConfigError};

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat session (default)
    Chat {
        /// Append to the terminal instead of redrawing the screen
        #[arg(long, action, default_value = "false")]
        no_clear: bool,
    },
    /// Send a single message and print the reply
    Ask {
        /// The message to send
        message: String,
    },
}

/// Settings that take precedence over the environment
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Base URL of the OpenAI compatible API
    #[arg(long, global = true)]
    api_host: Option<String>,

    /// Model identifier to request completions from
    #[arg(long, global = true)]
    model: Option<String>,

    /// Maximum number of tokens in a reply
    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    /// Request timeout in seconds, no timeout when unset
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
}

impl Overrides {
    pub fn apply(self, config: &mut AppConfig) -> Result<(), ConfigError> {
        if let Some(api_host) = self.api_host {
            config.openai_api_hostname = api_host;
        }
        if let Some(model) = self.model {
            config.openai_model = model;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Some(timeout_from_secs("--timeout-secs", secs)?);
        }
        Ok(())
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    overrides: Overrides,
}

fn init_tracing() {
    // Logs go to stderr so they don't interleave with the chat
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=warn", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    init_tracing();
    execute(args, AppConfig::from_env).await
}

/// Loads the config and then runs the sub command. Without a
/// credential this returns before the editor or the client exist.
async fn execute<F>(args: Cli, load_config: F) -> Result<()>
where
    F: FnOnce() -> Result<AppConfig, ConfigError>,
{
    let mut config = load_config()?;
    args.overrides.apply(&mut config)?;

    // Handle each sub command
    match args.command {
        Some(Command::Chat { no_clear }) => {
            chat::run(&config, !no_clear).await?;
        }
        Some(Command::Ask { message }) => {
            ask::run(&config, message).await?;
        }
        None => {
            chat::run(&config, true).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config() -> AppConfig {
        AppConfig::from_lookup(|key| {
            (key == crate::core::config::API_KEY_VAR).then(|| "sk-test".to_string())
        })
        .unwrap()
    }

    #[test]
    fn test_parse_defaults_to_no_command() {
        let cli = Cli::try_parse_from(["krishna"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["krishna", "ask", "hello there"]).unwrap();
        match cli.command {
            Some(Command::Ask { message }) => assert_eq!(message, "hello there"),
            _ => panic!("Expected ask command"),
        }
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::try_parse_from([
            "krishna",
            "chat",
            "--no-clear",
            "--model",
            "openai/gpt-3.5-turbo",
            "--max-tokens",
            "300",
            "--timeout-secs",
            "20",
            "--api-host",
            "http://localhost:1234",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Command::Chat { no_clear: true })));

        let mut config = test_config();
        cli.overrides.apply(&mut config).unwrap();

        assert_eq!(config.openai_model, "openai/gpt-3.5-turbo");
        assert_eq!(config.max_tokens, 300);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(20)));
        assert_eq!(config.openai_api_hostname, "http://localhost:1234");
        assert_eq!(config.openai_api_key, "sk-test");
    }

    #[test]
    fn test_zero_timeout_override_is_rejected() {
        let cli = Cli::try_parse_from(["krishna", "--timeout-secs", "0"]).unwrap();

        let mut config = test_config();
        let result = cli.overrides.apply(&mut config);

        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = test_config();
        Overrides::default().apply(&mut config).unwrap();

        assert_eq!(config.openai_model, crate::core::config::DEFAULT_MODEL);
        assert_eq!(config.max_tokens, crate::core::config::DEFAULT_MAX_TOKENS);
        assert!(config.request_timeout.is_none());
    }

    #[tokio::test]
    async fn test_missing_credential_stops_before_chat_starts() {
        let cli = Cli::try_parse_from(["krishna", "chat"]).unwrap();
        let result = execute(cli, || AppConfig::from_lookup(|_| None)).await;

        let err = result.expect_err("Should fail without a credential");
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingCredential(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_credential_sends_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"hello"}}]}"#)
            .expect(0)
            .create();

        let url = server.url();
        let cli = Cli::try_parse_from(["krishna", "--api-host", url.as_str(), "ask", "hi"]).unwrap();
        let result = execute(cli, || AppConfig::from_lookup(|_| None)).await;

        mock.assert();
        assert!(result.is_err());
    }
}
