//! Transaction approval and reconciliation engine.
//!
//! The crate sits between transaction producers (wallet bridges, scheduled
//! ledger entries) and the signers that execute them. Each incoming intent
//! gets an [`session::ApprovalSession`] that walks a small state machine:
//! guard checks, signer dispatch, mirror confirmation, and finally a
//! best-effort enrichment pass that reconciles the finalized mirror record
//! with the pre-approval snapshot.
//!
//! Collaborators (signers, schedule and mirror lookups, notification sink,
//! byte decoder) are trait objects supplied by the host in
//! [`session::Services`], so the engine itself stays transport-free.

pub mod config;
pub mod confirm;
pub mod enrich;
pub mod error;
pub mod guards;
pub mod merge;
pub mod poller;
pub mod services;
pub mod session;
pub mod transaction;
pub mod utils;
