//! End-to-end tests for the transaction lifecycle.
//!
//! Each test builds transactions through the public API only: construct,
//! sign, sterilize, check, flatten and persist. Stores are temporary.

use tessera_protocol::crypto::keys::TxKeypair;
use tessera_protocol::identity::AccountId;
use tessera_protocol::storage::{SledTxStore, TxStore};
use tessera_protocol::transaction::codec::{decode, encode};
use tessera_protocol::transaction::{
    add_signer, check_sign, get_meta_sql, get_txs, is_pseudo_tx, passes_local_checks,
    sign_for, sign_transaction, signing_digest, sterilize, ErrorKind, FieldId, FieldSet,
    FieldValue, InnerObject, MemorySignerLists, SignerEntry, SignerList, Transaction, TxError,
    TxStatus, TxType,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn payment(from: AccountId, to: AccountId, amount: u64) -> Transaction {
    Transaction::new(TxType::Payment, |f| {
        f.set_u32(FieldId::Sequence, 1)?;
        f.set_u64(FieldId::Fee, 12)?;
        f.set_account(FieldId::Account, from)?;
        f.set_blob(FieldId::SigningPubKey, Vec::new())?;
        f.set_account(FieldId::Destination, to)?;
        f.set_u64(FieldId::Amount, amount)
    })
    .expect("payment")
}

fn signed_payment(kp: &TxKeypair) -> Transaction {
    let from = AccountId::from_public_key(&kp.public_key());
    let mut tx = payment(from, AccountId::from_bytes([0x22; 20]), 5_000);
    sign_transaction(&mut tx, kp).expect("sign");
    tx
}

fn statement(op: u16, name_in_db: &[u8]) -> Transaction {
    let mut table = FieldSet::new();
    table.set_blob(FieldId::TableName, b"orders".to_vec()).unwrap();
    table.set_blob(FieldId::NameInDb, name_in_db.to_vec()).unwrap();
    let tables = vec![InnerObject::new(FieldId::Table, table)];
    Transaction::new(TxType::SqlStatement, move |f| {
        f.set_u16(FieldId::OpType, op)?;
        f.set_account(FieldId::Owner, AccountId::from_bytes([0x33; 20]))?;
        f.set_array(FieldId::Tables, tables)
    })
    .expect("statement")
}

fn sql_transaction(children: Vec<Transaction>) -> Transaction {
    let count = children.len() as u32;
    let mut tx = Transaction::new(TxType::SqlTransaction, |f| {
        f.set_u32(FieldId::Sequence, 9)?;
        f.set_u64(FieldId::Fee, 10)?;
        f.set_account(FieldId::Account, AccountId::from_bytes([0x11; 20]))?;
        f.set_blob(FieldId::SigningPubKey, Vec::new())?;
        f.set_u32(FieldId::OperationCount, count)
    })
    .expect("sql transaction");
    for child in children {
        tx.add_sub_tx(child).expect("add child");
    }
    tx
}

/// An owner account with a signer list of `n` weight-1 keys and the
/// ledger keys registered.
type SignerKeys = Vec<(AccountId, TxKeypair)>;

fn signer_fixture(n: usize, quorum: u32) -> (MemorySignerLists, AccountId, SignerKeys) {
    let source = MemorySignerLists::new();
    let owner = AccountId::from_bytes([0xAA; 20]);
    let mut keys: SignerKeys = (0..n)
        .map(|i| {
            let kp = TxKeypair::from_seed(&[0x40 + i as u8; 32]);
            (source.register_key(kp.public_key()), kp)
        })
        .collect();
    keys.sort_by_key(|(a, _)| *a);
    let entries = keys
        .iter()
        .map(|(account, _)| SignerEntry {
            account: *account,
            weight: 1,
        })
        .collect();
    source.set_signer_list(owner, SignerList { quorum, entries });
    (source, owner, keys)
}

fn multi_signed(owner: AccountId, keys: &[(AccountId, TxKeypair)]) -> Transaction {
    let mut tx = payment(owner, AccountId::from_bytes([0x22; 20]), 1);
    let entries: Vec<InnerObject> = keys
        .iter()
        .map(|(account, kp)| sign_for(&tx, kp, *account).to_inner().unwrap())
        .collect();
    tx.set_field(FieldId::Signers, FieldValue::Array(entries))
        .expect("signers");
    tx
}

// ---------------------------------------------------------------------------
// Round trip and sterilization
// ---------------------------------------------------------------------------

#[test]
fn round_trip_preserves_nested_sub_transactions() {
    let tx = sql_transaction(vec![statement(6, b"\x01"), statement(8, b"\x02")]);
    let back = decode(&encode(&tx)).expect("decode");
    assert_eq!(back, tx);
    assert_eq!(back.sub_txs().len(), 2);
    assert_eq!(back.sub_txs()[1].fields().get_u16(FieldId::OpType).unwrap(), 8);
}

#[test]
fn sterilize_is_idempotent() {
    let kp = TxKeypair::from_seed(&[3; 32]);
    let once = sterilize(&signed_payment(&kp)).unwrap();
    let twice = sterilize(&once).unwrap();
    assert_eq!(encode(&once), encode(&twice));
    assert_eq!(once.id(), twice.id());
}

#[test]
fn sterilized_transactions_are_frozen() {
    let kp = TxKeypair::from_seed(&[4; 32]);
    let mut tx = sterilize(&signed_payment(&kp)).unwrap();
    assert_eq!(tx.set_sequence(2), Err(TxError::Sterilized));
    assert_eq!(sign_transaction(&mut tx, &kp), Err(TxError::Sterilized));
}

// ---------------------------------------------------------------------------
// Digests
// ---------------------------------------------------------------------------

#[test]
fn signing_digest_ignores_signature_fields() {
    let kp = TxKeypair::from_seed(&[5; 32]);
    let from = AccountId::from_public_key(&kp.public_key());
    let mut tx = payment(from, AccountId::from_bytes([0x22; 20]), 5_000);
    tx.set_field(FieldId::SigningPubKey, FieldValue::Blob(kp.public_key().to_wire()))
        .unwrap();
    let before = signing_digest(&tx);
    sign_transaction(&mut tx, &kp).unwrap();
    assert_eq!(signing_digest(&tx), before);
}

#[test]
fn identity_changes_with_signed_fields() {
    let from = AccountId::from_bytes([1; 20]);
    let to = AccountId::from_bytes([2; 20]);
    let a = sterilize(&payment(from, to, 100)).unwrap();
    let b = sterilize(&payment(from, to, 100)).unwrap();
    let c = sterilize(&payment(from, to, 101)).unwrap();
    assert_eq!(a.id(), b.id());
    assert_ne!(a.id(), c.id());
}

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

#[test]
fn single_signed_payment_verifies_after_decode() {
    let kp = TxKeypair::generate();
    let tx = sterilize(&signed_payment(&kp)).unwrap();
    let decoded = Transaction::from_bytes(&encode(&tx)).unwrap();
    assert!(check_sign(&decoded, false, &MemorySignerLists::new()).ok);
}

#[test]
fn multi_sig_boundaries() {
    let (source, owner, keys) = signer_fixture(9, 1);

    let one = multi_signed(owner, &keys[..1]);
    assert!(check_sign(&one, true, &source).ok);

    let eight = multi_signed(owner, &keys[..8]);
    assert!(check_sign(&eight, true, &source).ok);

    let nine = multi_signed(owner, &keys);
    let r = check_sign(&nine, true, &source);
    assert_eq!(r.kind, Some(ErrorKind::SignerSetInvalid));

    let zero = multi_signed(owner, &[]);
    let r = check_sign(&zero, true, &source);
    assert_eq!(r.kind, Some(ErrorKind::SignerSetInvalid));
}

#[test]
fn duplicate_signer_is_rejected_regardless_of_signatures() {
    let (source, owner, keys) = signer_fixture(2, 1);
    let mut tx = payment(owner, AccountId::from_bytes([0x22; 20]), 1);
    let entry = sign_for(&tx, &keys[0].1, keys[0].0);

    add_signer(&mut tx, entry.clone()).unwrap();
    assert!(matches!(
        add_signer(&mut tx, entry.clone()),
        Err(TxError::SignerSetInvalid(_))
    ));

    tx.set_field(
        FieldId::Signers,
        FieldValue::Array(vec![entry.to_inner().unwrap(), entry.to_inner().unwrap()]),
    )
    .unwrap();
    let r = check_sign(&tx, true, &source);
    assert_eq!(r.kind, Some(ErrorKind::SignerSetInvalid));
}

// ---------------------------------------------------------------------------
// Local checks
// ---------------------------------------------------------------------------

#[test]
fn pseudo_transactions_never_pass_local_checks() {
    let set_fee = Transaction::new(TxType::SetFee, |f| {
        f.set_u32(FieldId::Sequence, 0)?;
        f.set_u64(FieldId::Fee, 0)?;
        f.set_account(FieldId::Account, AccountId::ZERO)?;
        f.set_blob(FieldId::SigningPubKey, Vec::new())?;
        f.set_u32(FieldId::LedgerSequence, 100)?;
        f.set_u32(FieldId::ReferenceFeeUnits, 10)?;
        f.set_u64(FieldId::BaseFee, 10)
    })
    .unwrap();
    let set_fee = sterilize(&set_fee).unwrap();
    assert!(is_pseudo_tx(&set_fee));
    let r = passes_local_checks(&set_fee);
    assert!(!r.ok);
    assert_eq!(r.kind, Some(ErrorKind::LocalCheckFailed));

    let kp = TxKeypair::from_seed(&[6; 32]);
    let transfer = sterilize(&signed_payment(&kp)).unwrap();
    assert!(!is_pseudo_tx(&transfer));
    assert!(passes_local_checks(&transfer).ok);
}

// ---------------------------------------------------------------------------
// Sub-transactions
// ---------------------------------------------------------------------------

#[test]
fn sub_transactions_keep_order_through_get_txs() {
    let (a, b, c) = (statement(6, b"\x0A"), statement(7, b"\x0B"), statement(8, b"\x0C"));
    let parent = sql_transaction(vec![a.clone(), b.clone(), c.clone()]);
    assert_eq!(parent.sub_txs(), &[a.clone(), b.clone(), c.clone()]);
    assert_eq!(get_txs(&parent, None, None), vec![a, b, c]);

    let lone = payment(AccountId::from_bytes([1; 20]), AccountId::from_bytes([2; 20]), 1);
    assert_eq!(get_txs(&lone, None, None), vec![lone.clone()]);
}

// ---------------------------------------------------------------------------
// Status and persistence
// ---------------------------------------------------------------------------

#[test]
fn status_vocabulary_is_closed() {
    for outcome in ["new", "validated", "tecCLAIM", "", "VALIDATED"] {
        let status = TxStatus::from_outcome(outcome);
        assert!("NCHVIU".contains(status.code()));
    }
    assert_eq!(TxStatus::from_outcome("tecCLAIM"), TxStatus::Unknown);
}

#[test]
fn record_persists_and_replays() {
    let kp = TxKeypair::from_seed(&[7; 32]);
    let tx = sterilize(&signed_payment(&kp)).unwrap();
    let store = SledTxStore::open_temporary().unwrap();

    let held = get_meta_sql(&tx, 10, TxStatus::Held, b"").unwrap();
    store.upsert(&held).unwrap();
    let validated = get_meta_sql(&tx, 11, TxStatus::Validated, b"\x01").unwrap();
    store.upsert(&validated).unwrap();

    let stored = store.get(&tx.require_id().unwrap()).unwrap().unwrap();
    assert_eq!(stored, validated);
    let replayed = sterilize(&Transaction::from_bytes(&stored.raw).unwrap()).unwrap();
    assert_eq!(replayed, tx);
    assert_eq!(store.by_account(&tx.account().unwrap()).unwrap().len(), 1);
}

#[test]
fn unsterilized_transaction_has_no_record() {
    let tx = payment(AccountId::from_bytes([1; 20]), AccountId::from_bytes([2; 20]), 1);
    assert_eq!(
        get_meta_sql(&tx, 1, TxStatus::New, b""),
        Err(TxError::Unsterilized)
    );
}
