//! Ledger Backend Module
//!
//! This module defines the contract this service consumes from the ledger
//! backend (blockchain client, object storage, proof verification):
//! - LedgerBackend: async trait every backend implements
//! - SnapshotLedger: in-process backend served from a JSON snapshot
//!
//! The service layer only ever reads through this contract.

mod client;
mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{contract_address, position_from_transaction_id, LedgerBackend};
pub use snapshot::{LedgerBatch, LedgerSnapshot, SnapshotLedger};
