// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tessera Protocol - Core Library
//!
//! The canonical signed transaction model: one unit of state-change intent,
//! its deterministic binary encoding, its identity digest, single- and
//! multi-signature verification, and the record it leaves in storage.
//!
//! ## Architecture
//!
//! - **crypto** - SHA-512-half digests, Ed25519 keys, BLAKE3 account ids.
//! - **identity** - 20-byte account ids and their base58-check addresses.
//! - **transaction** - Fields, codec, signing, checks, sub-transactions.
//! - **storage** - The record store seam and its sled implementation.
//! - **config** - Protocol constants.
//!
//! ## Quick Start
//!
//! ```
//! use tessera_protocol::crypto::TxKeypair;
//! use tessera_protocol::identity::AccountId;
//! use tessera_protocol::transaction::{
//!     check_sign, passes_local_checks, sign_transaction, sterilize, FieldId, NoSignerLists,
//!     Transaction, TxType,
//! };
//!
//! let keypair = TxKeypair::generate();
//! let account = AccountId::from_public_key(&keypair.public_key());
//!
//! let mut tx = Transaction::new(TxType::AccountSet, |f| {
//!     f.set_u32(FieldId::Sequence, 1)?;
//!     f.set_u64(FieldId::Fee, 10)?;
//!     f.set_account(FieldId::Account, account)
//! })
//! .unwrap();
//! sign_transaction(&mut tx, &keypair).unwrap();
//!
//! let tx = sterilize(&tx).unwrap();
//! assert!(passes_local_checks(&tx).ok);
//! assert!(check_sign(&tx, false, &NoSignerLists).ok);
//! ```
//!
//! ## Design Philosophy
//!
//! 1. Decoding never trusts its input: every field is typed and checked.
//! 2. An id is only trusted after sterilization.
//! 3. No unsafe code in crypto paths.

pub mod config;
pub mod crypto;
pub mod identity;
pub mod storage;
pub mod transaction;
