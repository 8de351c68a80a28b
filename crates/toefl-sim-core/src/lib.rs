//! toefl-sim-core: prompts, session state, timers and parsers.
//!
//! This crate holds everything about a practice session that does not touch
//! the network: the data model, prompt templates, topic rotation, the
//! countdown timer, response parsers, and the `Trainer` workflow that ties
//! them to an `LlmProvider`.

pub mod client;
pub mod error;
pub mod model;
pub mod parser;
pub mod practice;
pub mod prompts;
pub mod session;
pub mod timer;
pub mod topics;
pub mod traits;
