pub mod client;
pub mod payload;

pub use client::{LokiClient, PushError, PushOutcome};
