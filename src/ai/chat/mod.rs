mod core;
pub mod models;
pub use self::core::{Chat, ChatBuilder, SessionState};
pub use models::{Transcript, Turn};
