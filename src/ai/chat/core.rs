use super::models::{Transcript, Turn};
use crate::openai::BoxedCompletionClient;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResponse,
}

// Puts the session back to `Idle` when dropped, including when the
// `submit` future is dropped before the reply arrives.
struct AwaitingGuard<'a>(&'a mut SessionState);

impl<'a> AwaitingGuard<'a> {
    fn enter(state: &'a mut SessionState) -> Self {
        *state = SessionState::AwaitingResponse;
        Self(state)
    }
}

impl Drop for AwaitingGuard<'_> {
    fn drop(&mut self) {
        *self.0 = SessionState::Idle;
    }
}

/// A single chat session with an LLM using an OpenAI compatible API.
///
/// Owns the transcript for as long as the session lives. Only one
/// request can be in flight at a time since `submit` takes `&mut
/// self`. Failed requests show up in the transcript as assistant
/// turns carrying the error text rather than as errors.
///
/// `SessionState::AwaitingResponse` only holds while `submit` is
/// awaiting the client. Callers can't observe it because of the
/// `&mut self` borrow, and it resets to `Idle` even if the future is
/// dropped. A dropped `submit` leaves the user turn without a reply.
///
/// Use `ChatBuilder` to construct a valid `Chat`.
pub struct Chat {
    client: BoxedCompletionClient,
    transcript: Transcript,
    state: SessionState,
}

impl Chat {
    /// Runs the next turn in the chat. Returns `None` without doing
    /// anything when the input is empty or only whitespace, otherwise
    /// returns the assistant's reply after it's been added to the
    /// transcript.
    pub async fn submit(&mut self, input: &str) -> Option<&Turn> {
        if input.trim().is_empty() {
            return None;
        }

        self.transcript.append(Turn::user(input));

        let awaiting = AwaitingGuard::enter(&mut self.state);
        let reply = match self.client.complete(input).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Completion failed: {:?}", e);
                e.to_string()
            }
        };
        drop(awaiting);

        self.transcript.append(Turn::assistant(&reply));

        self.transcript.last()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> SessionState {
        self.state
    }
}

pub struct ChatBuilder {
    client: BoxedCompletionClient,
    transcript: Transcript,
}

impl ChatBuilder {
    pub fn new(client: BoxedCompletionClient) -> Self {
        Self {
            client,
            transcript: Transcript::new(),
        }
    }

    pub fn build(self) -> Chat {
        Chat {
            client: self.client,
            transcript: self.transcript,
            state: SessionState::Idle,
        }
    }

    pub fn transcript(mut self, turns: Vec<Turn>) -> Self {
        self.transcript = Transcript::new_with_turns(turns);
        self
    }
}
