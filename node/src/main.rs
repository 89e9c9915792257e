// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tessera CLI
//!
//! Entry point for the `tessera` binary:
//!
//! - `keygen`  - generate a keypair and its account address
//! - `sign`    - JSON transaction in, signed canonical hex blob out
//! - `decode`  - hex blob in, JSON out
//! - `verify`  - local checks and signature check on a blob
//! - `record`  - persistence record (SQL) for a blob, optionally stored
//! - `version` - print build version information

mod cli;
mod logging;

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::{json, Value};

use tessera_protocol::crypto::TxKeypair;
use tessera_protocol::identity::AccountId;
use tessera_protocol::storage::{SledTxStore, TxStore};
use tessera_protocol::transaction::{
    check_sign, get_meta_sql, passes_local_checks, sign_transaction, sterilize, NoSignerLists,
    Transaction, TxStatus,
};

use cli::{Commands, TesseraCli};

fn main() -> Result<()> {
    let cli = TesseraCli::parse();
    logging::init_logging("tessera=info,tessera_protocol=warn", cli.log_format);

    match cli.command {
        Commands::Keygen(args) => {
            let out = keygen(args.seed.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Sign(args) => {
            let json = read_json(&args.tx)?;
            let keypair = TxKeypair::from_hex(&args.secret_key).context("invalid secret key")?;
            let out = sign_json(&json, &keypair)?;
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Decode(args) => {
            let out = decode_blob(&args.blob)?;
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Verify(args) => {
            let out = verify_blob(&args.blob.blob, args.allow_multi_sign)?;
            println!("{}", serde_json::to_string_pretty(&out)?);
            if out["ok"] != Value::Bool(true) {
                bail!("transaction failed verification");
            }
        }
        Commands::Record(args) => {
            let status = TxStatus::try_from(args.status)?;
            let sql = record_blob(
                &args.blob.blob,
                args.ledger_seq,
                status,
                &args.meta,
                args.db.as_deref(),
            )?;
            println!("{sql}");
        }
        Commands::Version => print_version(),
    }
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read transaction from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).context("transaction file is not valid JSON")
}

fn parse_blob(blob: &str) -> Result<Transaction> {
    let bytes = hex::decode(blob.trim()).context("blob is not valid hex")?;
    let tx = Transaction::from_bytes(&bytes).context("failed to decode transaction")?;
    Ok(sterilize(&tx)?)
}

fn keygen(seed: Option<&str>) -> Result<Value> {
    let keypair = match seed {
        Some(hex_seed) => TxKeypair::from_hex(hex_seed).context("invalid seed")?,
        None => TxKeypair::generate(),
    };
    let public_key = keypair.public_key();
    let account = AccountId::from_public_key(&public_key);
    tracing::info!(account = %account, "keypair generated");
    Ok(json!({
        "account": account.to_address(),
        "public_key": hex::encode_upper(public_key.to_wire()),
        "secret_key": keypair.secret_key_hex(),
    }))
}

/// Build, sign and sterilize a JSON transaction issued by the keypair's
/// account. The keypair's public key fills in `SigningPubKey`.
fn sign_json(json: &Value, keypair: &TxKeypair) -> Result<Value> {
    let public_key = keypair.public_key();
    let account = AccountId::from_public_key(&public_key);
    let mut json = json.clone();
    let obj = json.as_object_mut().context("transaction must be a JSON object")?;
    obj.insert("SigningPubKey".into(), Value::String(hex::encode_upper(public_key.to_wire())));
    let mut tx = Transaction::from_json(&json, account).context("invalid transaction")?;
    sign_transaction(&mut tx, keypair)?;
    let tx = sterilize(&tx).context("signed transaction does not round-trip")?;

    let check = passes_local_checks(&tx);
    if !check.ok {
        bail!("signed transaction fails local checks: {}", check.reason);
    }

    let id = tx.require_id()?;
    tracing::info!(tx_id = %id, tx_type = %tx.tx_type(), "transaction signed");
    Ok(json!({
        "hash": id.to_hex(),
        "tx_blob": hex::encode_upper(tessera_protocol::transaction::codec::encode(&tx)),
    }))
}

fn decode_blob(blob: &str) -> Result<Value> {
    Ok(parse_blob(blob)?.to_json())
}

fn verify_blob(blob: &str, allow_multi_sign: bool) -> Result<Value> {
    let tx = parse_blob(blob)?;
    let local = passes_local_checks(&tx);
    let sign = check_sign(&tx, allow_multi_sign, &NoSignerLists);
    Ok(json!({
        "hash": tx.require_id()?.to_hex(),
        "ok": local.ok && sign.ok,
        "local_checks": { "ok": local.ok, "reason": local.reason },
        "signature": { "ok": sign.ok, "reason": sign.reason },
    }))
}

fn record_blob(
    blob: &str,
    ledger_seq: u32,
    status: TxStatus,
    meta_hex: &str,
    db: Option<&Path>,
) -> Result<String> {
    let tx = parse_blob(blob)?;
    let meta = hex::decode(meta_hex).context("meta is not valid hex")?;
    let record = get_meta_sql(&tx, ledger_seq, status, &meta)?;

    if let Some(path) = db {
        let store = SledTxStore::open(path)
            .with_context(|| format!("failed to open store at {}", path.display()))?;
        store.upsert(&record)?;
        store.flush()?;
        tracing::info!(tx_id = %record.tx_id, db = %path.display(), "record stored");
    }
    Ok(record.to_sql())
}

fn print_version() {
    println!("tessera   {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {}", tessera_protocol::config::PROTOCOL_VERSION);
}
