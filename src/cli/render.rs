//! Terminal rendering of a chat transcript.
use std::io::{self, Write};

use crate::ai::chat::{Transcript, Turn};
use crate::openai::Role;

pub const BRAND: &str = "Krishna ai";
pub const HEADING: &str = "What can I help with?";
pub const FOOTER: &str = "made with ❤️ from Sohan";
pub const PROMPT: &str = "Message Krishna AI... > ";
pub const THINKING: &str = "KrishnaAI is thinking...";

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const RULE: &str = "────────────────────────────────────────";

fn label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Krishna AI",
    }
}

fn render_turn<W: Write>(turn: &Turn, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}:", label(turn.role()))?;
    for line in turn.content().lines() {
        writeln!(out, "  {}", line)?;
    }
    writeln!(out)
}

/// Writes every turn in order as a labelled block.
pub fn render_transcript<W: Write>(transcript: &Transcript, out: &mut W) -> io::Result<()> {
    for turn in transcript.iter() {
        render_turn(turn, out)?;
    }
    Ok(())
}

/// Redraws the whole page: branding, heading, the full transcript
/// and the footer.
pub fn render_page<W: Write>(transcript: &Transcript, out: &mut W, clear: bool) -> io::Result<()> {
    if clear {
        write!(out, "{}", CLEAR_SCREEN)?;
    }
    writeln!(out, "[{}]", BRAND)?;
    writeln!(out)?;
    writeln!(out, "{}", HEADING)?;
    writeln!(out)?;
    render_transcript(transcript, out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "{}", FOOTER)?;
    out.flush()
}
