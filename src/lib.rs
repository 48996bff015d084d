//! Terminal client for the Bassam assistant.
//!
//! Answers stream in over an SSE channel and render incrementally into a
//! transcript; when the channel is unavailable or dies before producing
//! anything, the client falls back to the single-shot endpoint. A second
//! client covers the companion search and people-lookup service.

pub mod backend;
pub mod cli;
pub mod config;
pub mod core;
pub mod logging;
pub mod search;

pub use crate::backend::{AnswerBackend, BackendError, HttpBackend, MockBackend, StreamSignal};
pub use crate::core::{AskSession, ClientError, Query, QueryHandle, Result, SessionConfig};
