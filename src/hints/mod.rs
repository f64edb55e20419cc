//! Hint Normalization Module
//!
//! This module turns the raw, optional search hints a caller sends into the
//! canonical `VerificationHints` the backend expects, or into "no hints".
//! It also owns the ISO-8601 timestamp parsing shared by every operation.

mod normalizer;
mod timestamp;


pub use normalizer::{HintNormalizer, HintsInput, TimeRangePolicy};
pub use timestamp::{parse_optional_timestamp, parse_timestamp};
