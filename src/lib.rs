//! This crate verifies database transactions against a blockchain-anchored audit trail.
//! It includes modules for data types, hint normalization, the ledger backend contract,
//! transaction and batch verification, the batch catalog, the JSON-RPC API and configuration.

pub mod types; // Defines common data structures shared with the ledger backend.
pub mod error; // Error types for input validation and backend failures.
pub mod hints; // Normalizes caller-supplied verification hints.
pub mod backend; // The ledger backend contract and the snapshot-backed ledger.
pub mod verification; // Single-transaction and batch verification orchestrators.
pub mod catalog; // Batch listing, search and ledger inspection.
pub mod api; // Handles the JSON-RPC API.
pub mod config; // Defines and loads service configuration.

// Re-export commonly used types and configurations for easier access.
pub use types::*;
pub use config::Config;
pub use error::{AuditError, BackendError, InputError};
pub use backend::{LedgerBackend, SnapshotLedger};
