// # rbl-core
//
// Core library for the RBL blacklist monitor.
//
// ## Architecture Overview
//
// This library provides the engine that checks IP addresses against DNS
// blacklists (RBLs):
// - **Resolver**: Trait for performing the A-record lookups
// - **ResultSink**: Trait for recording outcomes and run summaries
// - **CheckEngine**: Orchestrates name building, lookup, classification,
//   rate limiting, and batch runs
// - **ProviderRegistry**: The set of known blacklist providers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: DNS transport lives behind the Resolver
//    trait; classification and orchestration are pure of I/O details
// 2. **Resilience**: Any single provider failing, timing out, or answering
//    garbage degrades one outcome, never the run
// 3. **Library-First**: Embedders bring their own Resolver/ResultSink or
//    use the shipped ones

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod provider;
pub mod query_name;
pub mod sink;
pub mod traits;

// Re-export core types for convenience
pub use config::CheckConfig;
pub use engine::CheckEngine;
pub use error::{Error, Result};
pub use outcome::{CheckOutcome, CheckRunSummary, LookupTarget, RunId};
pub use provider::{Provider, ProviderRegistry};
pub use sink::{FileSink, MemorySink};
pub use traits::{AnswerRecord, Lookup, Resolver, ResultSink};
