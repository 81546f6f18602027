//! mail-triage — Gmail inbox triage into a Google Sheet.
//!
//! A sequential batch job: fetch recent mailbox messages, classify each one
//! with a streamed Groq completion, extract the four-field JSON record from
//! the response, and append one row per ticket to the spreadsheet tab
//! matching its category.

pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod mail;
pub mod pipeline;
pub mod sheets;
pub mod ticket;
