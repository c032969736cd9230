//! Port traits consumed and implemented around the check engine
//!
//! - `Resolver`: DNS A-record lookup strategy (raw socket or system path)
//! - `ResultSink`: where per-check outcomes and run records land

pub mod resolver;
pub mod result_sink;

pub use resolver::{AnswerRecord, Lookup, Resolver};
pub use result_sink::ResultSink;
