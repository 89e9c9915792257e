//! Canonical binary encoding.
//!
//! ```text
//! field    := header value
//! header   := (type << 4 | code)               type < 16, code < 16
//!           | (type << 4) code                 type < 16, code >= 16
//!           | code type                        type >= 16, code < 16
//!           | 0x00 type code                   both >= 16
//! value    := u16 | u32 | u64                  big-endian
//!           | hash256                          32 raw bytes
//!           | vl bytes                         blob, account
//!           | object* ArrayEnd                 array
//! object   := header field* ObjectEnd
//! ```
//!
//! Encoding always walks fields in `(type, code)` order. Decoding accepts
//! any order but rejects duplicates, unknown codes, stray markers and
//! truncated input.

use bytes::{Buf, BufMut, BytesMut};

use super::builder::Transaction;
use super::error::TxError;
use super::fields::{FieldId, FieldSet, FieldType, FieldValue, InnerObject};
use super::formats::Scope;
use crate::config::MAX_VL_LENGTH;
use crate::identity::AccountId;

/// `(type, code)` of the inner-object terminator.
const OBJECT_END: (u8, u8) = (14, 1);
/// `(type, code)` of the array terminator.
const ARRAY_END: (u8, u8) = (15, 1);
/// Deepest inner-object nesting a decoder will follow.
const MAX_NESTING_DEPTH: usize = 3;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Full canonical bytes of a transaction.
pub fn encode(tx: &Transaction) -> Vec<u8> {
    let mut out = BytesMut::new();
    write_fields(&tx.to_field_set(), false, &mut out);
    out.to_vec()
}

/// Canonical bytes without the non-signing fields.
pub fn encode_for_signing(tx: &Transaction) -> Vec<u8> {
    let mut out = BytesMut::new();
    write_fields(&tx.to_field_set(), true, &mut out);
    out.to_vec()
}

/// Decode a top-level transaction. The whole input must be consumed.
pub fn decode(bytes: &[u8]) -> Result<Transaction, TxError> {
    let mut buf = bytes;
    let fields = read_object(&mut buf, false, 0)?;
    Transaction::from_field_set(fields, Scope::TopLevel)
}

/// Encoded size of one field, header included.
pub(crate) fn encoded_field_len(field: FieldId, value: &FieldValue) -> usize {
    let mut out = BytesMut::new();
    write_field(field, value, false, &mut out);
    out.len()
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub(crate) fn write_fields(fields: &FieldSet, signing_only: bool, out: &mut BytesMut) {
    for (field, value) in fields.iter() {
        if signing_only && !field.is_signing_field() {
            continue;
        }
        write_field(field, value, signing_only, out);
    }
}

fn write_field(field: FieldId, value: &FieldValue, signing_only: bool, out: &mut BytesMut) {
    let (type_code, field_code) = field.sort_key();
    put_header(out, type_code, field_code);
    match value {
        FieldValue::UInt16(v) => out.put_u16(*v),
        FieldValue::UInt32(v) => out.put_u32(*v),
        FieldValue::UInt64(v) => out.put_u64(*v),
        FieldValue::Hash256(v) => out.put_slice(v),
        FieldValue::Blob(v) => put_vl(out, v),
        FieldValue::Account(id) => put_vl(out, id.as_bytes()),
        FieldValue::Array(items) => {
            for item in items {
                let (t, c) = item.kind.sort_key();
                put_header(out, t, c);
                write_fields(&item.fields, signing_only, out);
                put_header(out, OBJECT_END.0, OBJECT_END.1);
            }
            put_header(out, ARRAY_END.0, ARRAY_END.1);
        }
    }
}

fn put_header(out: &mut BytesMut, type_code: u8, field_code: u8) {
    match (type_code < 16, field_code < 16) {
        (true, true) => out.put_u8((type_code << 4) | field_code),
        (true, false) => {
            out.put_u8(type_code << 4);
            out.put_u8(field_code);
        }
        (false, true) => {
            out.put_u8(field_code);
            out.put_u8(type_code);
        }
        (false, false) => {
            out.put_u8(0);
            out.put_u8(type_code);
            out.put_u8(field_code);
        }
    }
}

/// Write a length prefix and payload. Callers guarantee the length fits,
/// which [`FieldSet::set`] enforces for blobs.
fn put_vl(out: &mut BytesMut, data: &[u8]) {
    let len = data.len();
    if len <= 192 {
        out.put_u8(len as u8);
    } else if len <= 12_480 {
        let l = len - 193;
        out.put_u8(193 + (l >> 8) as u8);
        out.put_u8((l & 0xff) as u8);
    } else {
        let l = len - 12_481;
        out.put_u8(241 + (l >> 16) as u8);
        out.put_u8(((l >> 8) & 0xff) as u8);
        out.put_u8((l & 0xff) as u8);
    }
    out.put_slice(data);
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn need(buf: &&[u8], n: usize, what: &str) -> Result<(), TxError> {
    if buf.remaining() < n {
        return Err(TxError::malformed(format!(
            "truncated {}: need {} bytes, have {}",
            what,
            n,
            buf.remaining()
        )));
    }
    Ok(())
}

fn read_header(buf: &mut &[u8]) -> Result<(u8, u8), TxError> {
    need(buf, 1, "field header")?;
    let first = buf.get_u8();
    let mut type_code = first >> 4;
    let mut field_code = first & 0x0f;

    if type_code == 0 {
        need(buf, 1, "field header")?;
        type_code = buf.get_u8();
        if type_code < 16 {
            return Err(TxError::malformed("non-canonical field header"));
        }
    }
    if field_code == 0 {
        need(buf, 1, "field header")?;
        field_code = buf.get_u8();
        if field_code < 16 {
            return Err(TxError::malformed("non-canonical field header"));
        }
    }
    Ok((type_code, field_code))
}

fn read_vl(buf: &mut &[u8]) -> Result<Vec<u8>, TxError> {
    need(buf, 1, "length prefix")?;
    let b1 = buf.get_u8() as usize;
    let len = match b1 {
        0..=192 => b1,
        193..=240 => {
            need(buf, 1, "length prefix")?;
            193 + (b1 - 193) * 256 + buf.get_u8() as usize
        }
        241..=254 => {
            need(buf, 2, "length prefix")?;
            let b2 = buf.get_u8() as usize;
            let b3 = buf.get_u8() as usize;
            12_481 + (b1 - 241) * 65_536 + b2 * 256 + b3
        }
        _ => return Err(TxError::malformed("invalid length prefix")),
    };
    if len > MAX_VL_LENGTH {
        return Err(TxError::malformed("length prefix out of range"));
    }
    need(buf, len, "variable-length field")?;
    let mut data = vec![0u8; len];
    buf.copy_to_slice(&mut data);
    Ok(data)
}

/// Read fields until the input runs out (`terminated == false`) or until an
/// `ObjectEnd` marker (`terminated == true`).
fn read_object(buf: &mut &[u8], terminated: bool, depth: usize) -> Result<FieldSet, TxError> {
    let mut fields = FieldSet::new();
    loop {
        if !buf.has_remaining() {
            if terminated {
                return Err(TxError::malformed("inner object is not terminated"));
            }
            return Ok(fields);
        }

        let codes = read_header(buf)?;
        if codes == OBJECT_END {
            if terminated {
                return Ok(fields);
            }
            return Err(TxError::malformed("unexpected object end marker"));
        }
        if codes == ARRAY_END {
            return Err(TxError::malformed("unexpected array end marker"));
        }

        let field = FieldId::from_codes(codes.0, codes.1).ok_or_else(|| {
            TxError::malformed(format!("unknown field ({}, {})", codes.0, codes.1))
        })?;
        if fields.contains(field) {
            return Err(TxError::malformed(format!("duplicate field {}", field)));
        }

        let value = match field.field_type() {
            FieldType::UInt16 => {
                need(buf, 2, field.name())?;
                FieldValue::UInt16(buf.get_u16())
            }
            FieldType::UInt32 => {
                need(buf, 4, field.name())?;
                FieldValue::UInt32(buf.get_u32())
            }
            FieldType::UInt64 => {
                need(buf, 8, field.name())?;
                FieldValue::UInt64(buf.get_u64())
            }
            FieldType::Hash256 => {
                need(buf, 32, field.name())?;
                let mut h = [0u8; 32];
                buf.copy_to_slice(&mut h);
                FieldValue::Hash256(h)
            }
            FieldType::Blob => FieldValue::Blob(read_vl(buf)?),
            FieldType::Account => {
                let raw = read_vl(buf)?;
                let id = AccountId::from_slice(&raw).ok_or_else(|| {
                    TxError::malformed(format!("{} must be 20 bytes, got {}", field, raw.len()))
                })?;
                FieldValue::Account(id)
            }
            FieldType::Object => {
                return Err(TxError::malformed(format!(
                    "inner object {} outside an array",
                    field
                )))
            }
            FieldType::Array => FieldValue::Array(read_array(buf, field, depth)?),
        };
        fields.set(field, value)?;
    }
}

fn read_array(buf: &mut &[u8], array: FieldId, depth: usize) -> Result<Vec<InnerObject>, TxError> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(TxError::malformed("inner objects nested too deeply"));
    }
    let mut items = Vec::new();
    loop {
        let codes = read_header(buf)?;
        if codes == ARRAY_END {
            return Ok(items);
        }
        let kind = FieldId::from_codes(codes.0, codes.1)
            .filter(|k| Some(*k) == array.inner_kind())
            .ok_or_else(|| {
                TxError::malformed(format!(
                    "array {} holds an unexpected element ({}, {})",
                    array, codes.0, codes.1
                ))
            })?;
        let fields = read_object(buf, true, depth + 1)?;
        items.push(InnerObject::new(kind, fields));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_set(fields: &FieldSet) -> Vec<u8> {
        let mut out = BytesMut::new();
        write_fields(fields, false, &mut out);
        out.to_vec()
    }

    #[test]
    fn header_forms() {
        let mut out = BytesMut::new();
        put_header(&mut out, 1, 2);
        put_header(&mut out, 2, 27);
        put_header(&mut out, 16, 3);
        put_header(&mut out, 16, 17);
        assert_eq!(out.to_vec(), vec![0x12, 0x20, 27, 0x03, 16, 0x00, 16, 17]);

        let mut buf: &[u8] = &out;
        assert_eq!(read_header(&mut buf).unwrap(), (1, 2));
        assert_eq!(read_header(&mut buf).unwrap(), (2, 27));
        assert_eq!(read_header(&mut buf).unwrap(), (16, 3));
        assert_eq!(read_header(&mut buf).unwrap(), (16, 17));
    }

    #[test]
    fn non_canonical_header_is_rejected() {
        // Field code 4 written in the extended form.
        let mut buf: &[u8] = &[0x20, 0x04];
        assert!(read_header(&mut buf).is_err());
    }

    #[test]
    fn length_prefix_boundaries() {
        for len in [0usize, 192, 193, 12_480, 12_481, 20_000] {
            let mut out = BytesMut::new();
            let data = vec![7u8; len];
            put_vl(&mut out, &data);
            let expected_prefix = if len <= 192 {
                1
            } else if len <= 12_480 {
                2
            } else {
                3
            };
            assert_eq!(out.len(), len + expected_prefix, "len {len}");
            let mut buf: &[u8] = &out;
            assert_eq!(read_vl(&mut buf).unwrap(), data);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn field_order_is_canonical_on_encode() {
        let mut fields = FieldSet::new();
        fields.set_u64(FieldId::Fee, 10).unwrap();
        fields.set_u16(FieldId::TransactionType, 3).unwrap();
        let bytes = encode_set(&fields);
        assert_eq!(bytes[0], 0x12);
        assert_eq!(bytes[3], 0x38);
    }

    #[test]
    fn decode_accepts_any_order() {
        // Fee (3,8) then TransactionType (1,2).
        let bytes = [0x38, 0, 0, 0, 0, 0, 0, 0, 10, 0x12, 0, 3];
        let mut buf: &[u8] = &bytes;
        let fields = read_object(&mut buf, false, 0).unwrap();
        assert_eq!(fields.get_u64(FieldId::Fee).unwrap(), 10);
        assert_eq!(fields.get_u16(FieldId::TransactionType).unwrap(), 3);
    }

    #[test]
    fn decode_rejects_duplicates_and_unknown_codes() {
        let dup = [0x12, 0, 3, 0x12, 0, 3];
        assert!(read_object(&mut &dup[..], false, 0).is_err());

        // UInt32 code 9 is not registered.
        let unknown = [0x29, 0, 0, 0, 1];
        assert!(read_object(&mut &unknown[..], false, 0).is_err());
    }

    #[test]
    fn decode_rejects_truncation_and_stray_markers() {
        let truncated = [0x24, 0, 0];
        assert!(read_object(&mut &truncated[..], false, 0).is_err());
        assert!(read_object(&mut &[0xE1][..], false, 0).is_err());
        assert!(read_object(&mut &[0xF1][..], false, 0).is_err());
    }

    #[test]
    fn arrays_round_trip_and_check_kind() {
        let mut memo = FieldSet::new();
        memo.set_blob(FieldId::MemoData, b"hello".to_vec()).unwrap();
        let mut fields = FieldSet::new();
        fields
            .set_array(FieldId::Memos, vec![InnerObject::new(FieldId::Memo, memo)])
            .unwrap();

        let bytes = encode_set(&fields);
        assert_eq!(*bytes.last().unwrap(), 0xF1);
        let decoded = read_object(&mut &bytes[..], false, 0).unwrap();
        assert_eq!(decoded, fields);

        // Swap the Memo header (0xEA) for a Signer header (0xE0 0x10).
        let mut wrong = vec![0xF9, 0xE0, 0x10];
        wrong.extend_from_slice(&bytes[2..]);
        assert!(read_object(&mut &wrong[..], false, 0).is_err());
    }

    #[test]
    fn signing_encoding_drops_signature_fields() {
        let mut fields = FieldSet::new();
        fields.set_u16(FieldId::TransactionType, 3).unwrap();
        fields.set_blob(FieldId::TxnSignature, vec![1; 64]).unwrap();
        let mut out = BytesMut::new();
        write_fields(&fields, true, &mut out);
        assert_eq!(out.to_vec(), vec![0x12, 0, 3]);
    }

    #[test]
    fn account_length_is_enforced() {
        // Account (8,1) with a 19-byte payload.
        let mut bytes = vec![0x81, 19];
        bytes.extend_from_slice(&[1u8; 19]);
        assert!(read_object(&mut &bytes[..], false, 0).is_err());
    }
}
