//! Verification Module
//!
//! This module orchestrates transaction verification against the ledger:
//! - TransactionVerifier: one transaction, with search statistics,
//!   operation-type fallback and batch enrichment
//! - BatchVerifier: many transactions in one backend call
//!
//! Both are boundaries: they always return a result value, never an error.

mod batch;
mod transaction;


pub use batch::{
    BatchVerificationResult, BatchVerificationSummary, BatchVerifier, IndividualResult,
    VerifyBatchRequest,
};
pub use transaction::{
    BatchInfo, SearchInfo, TransactionVerifier, VerificationMethod, VerificationResult,
    VerifyTransactionRequest, DEFAULT_POSITION_SCAN_WINDOW,
};
