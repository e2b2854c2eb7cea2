pub mod client;
pub mod prompt;

pub use client::{Completer, CompletionError, GeminiClient};
