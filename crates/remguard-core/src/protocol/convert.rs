//! JSON <-> [`Value`] mapping.
//!
//! Inbound:
//! - arrays become tables keyed `1..=n`, objects become string-keyed tables;
//! - `{"$type": "buffer", "data": "<base64>"}` becomes a buffer;
//! - any other object with a string `$type` becomes a host object tagged
//!   with it (remaining fields kept as opaque data).
//!
//! Inbound containers larger than [`MAX_CONTAINER_ENTRIES`] are refused.
//! Outbound encoding refuses cyclic tables and non-string/number keys.

use std::collections::HashSet;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde_json::{Map, Number};

use crate::error::{GuardError, Result};
use crate::value::{HostObject, Table, TableId, Value};

/// Field carrying the type marker of tagged objects.
pub const TYPE_FIELD: &str = "$type";

/// Most entries a decoded array or object may carry.
pub const MAX_CONTAINER_ENTRIES: usize = 1024;

/// Reply encoding stops here; the decoder is bounded by serde_json itself.
const MAX_ENCODE_DEPTH: usize = 64;

pub fn value_from_json(v: serde_json::Value) -> Result<Value> {
    Ok(match v {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(
            n.as_f64()
                .ok_or_else(|| GuardError::BadRequest(format!("unrepresentable number: {n}")))?,
        ),
        serde_json::Value::String(s) => Value::from(s),
        serde_json::Value::Array(items) => {
            check_container_len(items.len())?;
            let entries = items
                .into_iter()
                .enumerate()
                .map(|(i, item)| Ok((Value::Number((i + 1) as f64), value_from_json(item)?)))
                .collect::<Result<Vec<_>>>()?;
            Value::Table(Table::from_entries(entries))
        }
        serde_json::Value::Object(mut obj) => match obj.remove(TYPE_FIELD) {
            Some(serde_json::Value::String(tag)) => tagged_from_json(tag, obj)?,
            Some(other) => {
                return Err(GuardError::BadRequest(format!(
                    "{TYPE_FIELD} must be a string, got {other}"
                )))
            }
            None => {
                check_container_len(obj.len())?;
                // Map keys are unique already.
                let entries = obj
                    .into_iter()
                    .map(|(k, v)| Ok((Value::from(k), value_from_json(v)?)))
                    .collect::<Result<Vec<_>>>()?;
                Value::Table(Table::from_entries(entries))
            }
        },
    })
}

fn check_container_len(len: usize) -> Result<()> {
    if len > MAX_CONTAINER_ENTRIES {
        return Err(GuardError::BadRequest(format!(
            "container has {len} entries, limit is {MAX_CONTAINER_ENTRIES}"
        )));
    }
    Ok(())
}

fn tagged_from_json(tag: String, mut obj: Map<String, serde_json::Value>) -> Result<Value> {
    if tag == "buffer" {
        let data = match obj.remove("data") {
            Some(serde_json::Value::String(s)) => s,
            _ => {
                return Err(GuardError::BadRequest(
                    "buffer requires a base64 string `data` field".into(),
                ))
            }
        };
        let raw = STANDARD
            .decode(data.as_bytes())
            .map_err(|e| GuardError::BadRequest(format!("buffer data is not base64: {e}")))?;
        return Ok(Value::Buffer(Bytes::from(raw)));
    }
    Ok(Value::Host(HostObject::new(
        tag,
        serde_json::Value::Object(obj),
    )))
}

pub fn value_to_json(v: &Value) -> Result<serde_json::Value> {
    let mut path = HashSet::new();
    encode(v, &mut path, 0)
}

fn encode(v: &Value, path: &mut HashSet<TableId>, depth: usize) -> Result<serde_json::Value> {
    Ok(match v {
        Value::Nil => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        // NaN and infinities have no JSON form.
        Value::Number(n) => Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Str(s) => serde_json::Value::String(s.to_string()),
        Value::Buffer(b) => {
            let mut obj = Map::new();
            obj.insert(TYPE_FIELD.into(), "buffer".into());
            obj.insert("data".into(), STANDARD.encode(b).into());
            serde_json::Value::Object(obj)
        }
        Value::Host(h) => {
            let mut obj = match &h.data {
                serde_json::Value::Object(m) => m.clone(),
                serde_json::Value::Null => Map::new(),
                other => {
                    let mut m = Map::new();
                    m.insert("data".into(), other.clone());
                    m
                }
            };
            obj.insert(TYPE_FIELD.into(), h.tag.to_string().into());
            serde_json::Value::Object(obj)
        }
        Value::Function(_) => {
            return Err(GuardError::BadRequest("functions cannot be encoded".into()))
        }
        Value::Table(t) => {
            if depth >= MAX_ENCODE_DEPTH {
                return Err(GuardError::BadRequest("table nesting too deep to encode".into()));
            }
            if !path.insert(t.id()) {
                return Err(GuardError::BadRequest("cyclic table cannot be encoded".into()));
            }
            let out = encode_table(t, path, depth)?;
            path.remove(&t.id());
            out
        }
    })
}

fn encode_table(
    t: &Table,
    path: &mut HashSet<TableId>,
    depth: usize,
) -> Result<serde_json::Value> {
    let entries = t.entries();
    let is_list = entries
        .iter()
        .enumerate()
        .all(|(i, (k, _))| matches!(k, Value::Number(n) if *n == (i + 1) as f64));

    if is_list {
        let items = entries
            .iter()
            .map(|(_, v)| encode(v, path, depth + 1))
            .collect::<Result<Vec<_>>>()?;
        return Ok(serde_json::Value::Array(items));
    }

    let mut obj = Map::new();
    for (k, v) in &entries {
        let key = match k {
            Value::Str(s) => s.to_string(),
            Value::Number(n) => n.to_string(),
            other => {
                return Err(GuardError::BadRequest(format!(
                    "table key of type {} cannot be encoded",
                    other.type_tag()
                )))
            }
        };
        obj.insert(key, encode(v, path, depth + 1)?);
    }
    Ok(serde_json::Value::Object(obj))
}
