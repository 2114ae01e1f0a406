//! Selection protocol
//!
//! Prompt compilation on the way out, reply parsing on the way back.

pub mod parser;
pub mod prompt;

pub use parser::{cleanup, parse, SelectionOutcome};
pub use prompt::{compile, conversation, SYSTEM_PROMPT};
