//! # Identity Module
//!
//! Accounts are the principals that sign transactions. Every account is
//! identified by a 20-byte [`AccountId`] derived from the Ed25519 public key
//! that controls it, and rendered as a base58-check address.
//!
//! Multi-signed transactions name their signers by `AccountId`, and the
//! signers array is kept in ascending `AccountId` order.

pub mod account;

pub use account::{AccountError, AccountId};
