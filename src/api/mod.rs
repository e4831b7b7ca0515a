//! API Module
//!
//! Chat completion wire types for the upstream provider.

pub mod completion;

pub use completion::{Choice, CompletionRequest, CompletionResponse, ContentPart, Message, MessageContent};
