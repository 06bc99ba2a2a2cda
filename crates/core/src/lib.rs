//! # Advisor Core
//!
//! Core logic for the tongue advisor service.
//!
//! This crate contains everything between the HTTP surface and the outside
//! world:
//! - Runtime configuration resolved once at startup (`config`)
//! - The two-slot session store backing `userFeeling`/`tongueImage` (`session`)
//! - The fixed persona prompt and chat-completions request template (`prompt`)
//! - The completion provider client and analysis service (`provider`)
//!
//! **No API concerns**: HTTP routing, status codes, CORS, and rate limiting
//! belong in `api-rest`.

pub mod config;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod session;

pub use config::{Config, ProviderConfig};
pub use error::{AdvisorError, AdvisorResult};
pub use provider::{AnalysisService, CompletionBackend, OpenAiBackend};
pub use session::SessionStore;
