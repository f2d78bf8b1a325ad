use std::io;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use super::render::{PROMPT, THINKING, render_page};
use crate::ai::chat::ChatBuilder;
use crate::core::AppConfig;
use crate::openai::OpenAiClient;

pub async fn run(config: &AppConfig, clear: bool) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let client = OpenAiClient::from_config(config);
    let mut chat = ChatBuilder::new(Box::new(client)).build();
    let mut stdout = io::stdout();

    tracing::debug!("Starting chat session with model {}", config.openai_model);
    render_page(chat.transcript(), &mut stdout, clear)?;

    loop {
        let readline = rl.readline(PROMPT);
        match readline {
            Ok(line) => {
                // Submitting nothing is a no-op
                if line.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(line.as_str())?;

                println!("{}", THINKING);
                chat.submit(&line).await;
                render_page(chat.transcript(), &mut stdout, clear)?;
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
