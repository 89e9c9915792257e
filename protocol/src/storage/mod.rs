//! # Storage Module
//!
//! Persistence of transaction records. The [`TxStore`] trait is the seam the
//! rest of the crate writes through; [`SledTxStore`] is the embedded
//! implementation, keyed by transaction id with a per-account index.
//!
//! Records are encoded with bincode on disk. JSON is for the CLI and
//! debugging; bincode is for storage.

pub mod db;

pub use db::{DbError, SledTxStore, TxStore};
