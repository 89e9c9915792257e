//! JSON representation.
//!
//! ```json
//! {
//!   "TransactionType": "Payment",
//!   "Account": "rN7n7otQDd6FczFgLdSqtcsAUxDkw6fzRH",
//!   "Amount": "1000",
//!   "Memos": [{ "Memo": { "MemoData": "68656C6C6F" } }]
//! }
//! ```
//!
//! Keys are field names. Integers are numbers (`UInt64` also as decimal
//! strings), blobs and hashes are hex, accounts are addresses, and arrays
//! hold single-key objects naming their inner-object kind. A sterilized
//! transaction also carries its `hash`.

use serde_json::{Map, Value};

use super::builder::Transaction;
use super::error::TxError;
use super::fields::{FieldId, FieldSet, FieldType, FieldValue, InnerObject};
use super::formats::{check_template, Scope};
use super::types::TxType;
use crate::identity::AccountId;

/// Key holding the identity digest in rendered JSON. Ignored on input.
const HASH_KEY: &str = "hash";

impl Transaction {
    /// Build a transaction from its JSON form, issued by `account`.
    ///
    /// `account` overrides any `Account` the object carries. Fields the
    /// type's template requires must be present; the result is not
    /// sterilized.
    pub fn from_json(value: &Value, account: AccountId) -> Result<Self, TxError> {
        let obj = value
            .as_object()
            .ok_or_else(|| TxError::InvalidJson("transaction must be an object".into()))?;
        let tx_type = match obj.get(FieldId::TransactionType.name()) {
            None => return Err(TxError::MissingType),
            Some(v) => parse_type(v)?,
        };
        let parsed = parse_object(obj)?;
        let tx = Transaction::new(tx_type, move |fields| {
            *fields = parsed;
            fields.set_account(FieldId::Account, account)
        })?;
        check_template(tx_type, Scope::TopLevel, &tx.fields, !tx.sub_txs.is_empty())?;
        Ok(tx)
    }

    /// Render as JSON.
    pub fn to_json(&self) -> Value {
        let mut obj = render_object(&self.to_field_set());
        if let Some(id) = self.id() {
            obj.insert(HASH_KEY.into(), Value::String(id.to_hex()));
        }
        Value::Object(obj)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn invalid(field: FieldId, what: &str) -> TxError {
    TxError::InvalidJson(format!("{} must be {}", field, what))
}

fn parse_type(v: &Value) -> Result<TxType, TxError> {
    match v {
        Value::String(name) => name.parse(),
        Value::Number(n) => {
            let code = n
                .as_u64()
                .and_then(|c| u16::try_from(c).ok())
                .ok_or_else(|| TxError::UnknownType(n.to_string()))?;
            TxType::from_code(code).ok_or_else(|| TxError::UnknownType(code.to_string()))
        }
        _ => Err(invalid(FieldId::TransactionType, "a type name")),
    }
}

fn parse_object(obj: &Map<String, Value>) -> Result<FieldSet, TxError> {
    let mut fields = FieldSet::new();
    for (key, value) in obj {
        if key == HASH_KEY {
            continue;
        }
        let field = FieldId::from_name(key)
            .ok_or_else(|| TxError::InvalidJson(format!("unknown field {key}")))?;
        fields.set(field, parse_value(field, value)?)?;
    }
    Ok(fields)
}

fn parse_uint(field: FieldId, v: &Value) -> Result<u64, TxError> {
    match v {
        Value::Number(n) => n.as_u64().ok_or_else(|| invalid(field, "an unsigned integer")),
        Value::String(s) if field.field_type() == FieldType::UInt64 => s
            .parse()
            .map_err(|_| invalid(field, "a decimal string")),
        _ => Err(invalid(field, "an unsigned integer")),
    }
}

fn parse_hex(field: FieldId, v: &Value) -> Result<Vec<u8>, TxError> {
    let s = v.as_str().ok_or_else(|| invalid(field, "a hex string"))?;
    hex::decode(s).map_err(|_| invalid(field, "a hex string"))
}

fn parse_value(field: FieldId, v: &Value) -> Result<FieldValue, TxError> {
    Ok(match field.field_type() {
        FieldType::UInt16 if field == FieldId::TransactionType => {
            FieldValue::UInt16(parse_type(v)?.code())
        }
        FieldType::UInt16 => FieldValue::UInt16(
            u16::try_from(parse_uint(field, v)?).map_err(|_| invalid(field, "a 16-bit integer"))?,
        ),
        FieldType::UInt32 => FieldValue::UInt32(
            u32::try_from(parse_uint(field, v)?).map_err(|_| invalid(field, "a 32-bit integer"))?,
        ),
        FieldType::UInt64 => FieldValue::UInt64(parse_uint(field, v)?),
        FieldType::Hash256 => {
            let bytes = parse_hex(field, v)?;
            let hash: [u8; 32] = bytes
                .try_into()
                .map_err(|_| invalid(field, "32 bytes of hex"))?;
            FieldValue::Hash256(hash)
        }
        FieldType::Blob => FieldValue::Blob(parse_hex(field, v)?),
        FieldType::Account => {
            let s = v.as_str().ok_or_else(|| invalid(field, "an address"))?;
            let id = AccountId::from_address(s)
                .map_err(|e| TxError::InvalidJson(format!("{field}: {e}")))?;
            FieldValue::Account(id)
        }
        FieldType::Array => FieldValue::Array(parse_array(field, v)?),
        FieldType::Object => return Err(invalid(field, "inside an array")),
    })
}

fn parse_array(field: FieldId, v: &Value) -> Result<Vec<InnerObject>, TxError> {
    let items = v.as_array().ok_or_else(|| invalid(field, "an array"))?;
    let kind = field
        .inner_kind()
        .ok_or_else(|| invalid(field, "an array field"))?;
    items
        .iter()
        .map(|item| {
            let inner = item
                .as_object()
                .filter(|o| o.len() == 1)
                .and_then(|o| o.get(kind.name()))
                .and_then(Value::as_object)
                .ok_or_else(|| {
                    TxError::InvalidJson(format!(
                        "{} entries must be {{\"{}\": {{...}}}}",
                        field, kind
                    ))
                })?;
            Ok::<_, TxError>(InnerObject::new(kind, parse_object(inner)?))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_object(fields: &FieldSet) -> Map<String, Value> {
    let mut obj = Map::new();
    for (field, value) in fields.iter() {
        obj.insert(field.name().to_string(), render_value(field, value));
    }
    obj
}

fn render_value(field: FieldId, value: &FieldValue) -> Value {
    match value {
        FieldValue::UInt16(v) if field == FieldId::TransactionType => match TxType::from_code(*v) {
            Some(t) => Value::String(t.name().to_string()),
            None => Value::from(*v),
        },
        FieldValue::UInt16(v) => Value::from(*v),
        FieldValue::UInt32(v) => Value::from(*v),
        FieldValue::UInt64(v) => Value::from(*v),
        FieldValue::Hash256(h) => Value::String(hex::encode_upper(h)),
        FieldValue::Blob(b) => Value::String(hex::encode_upper(b)),
        FieldValue::Account(id) => Value::String(id.to_address()),
        FieldValue::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| {
                    let mut wrapper = Map::new();
                    wrapper.insert(
                        item.kind.name().to_string(),
                        Value::Object(render_object(&item.fields)),
                    );
                    Value::Object(wrapper)
                })
                .collect(),
        ),
    }
}
