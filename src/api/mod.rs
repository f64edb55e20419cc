//! API Module
//!
//! This module handles the JSON-RPC API of the verifier.
//! It provides the HTTP endpoint that auditors and tools call to verify
//! transactions and browse the batch catalog.

mod server;


pub use server::{router, AppState, Server};
