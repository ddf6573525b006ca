//! Oracle access: the trait every stage calls, the HTTP client,
//! structured-output parsing and the offline scripted oracle.

pub mod client;
pub mod oracle;
pub mod parser;
pub mod scripted;

pub use client::LlmClient;
pub use oracle::{generate_structured, generate_within, Oracle, Prompt};
pub use scripted::ScriptedOracle;
