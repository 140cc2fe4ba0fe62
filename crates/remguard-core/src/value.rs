//! Dynamic argument values and their classification.
//!
//! Arguments arrive as loosely typed values. Tables are shared,
//! interior-mutable containers compared by identity, so a table may contain
//! itself directly or through other tables. Consumers must never assume the
//! value graph is a tree.

use std::fmt;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use serde::Deserialize;

/// Coarse kind of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Number,
    String,
    Boolean,
    #[serde(alias = "structured")]
    Table,
    Function,
    Other,
}

impl PrimitiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::Number => "number",
            PrimitiveKind::String => "string",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Table => "table",
            PrimitiveKind::Function => "function",
            PrimitiveKind::Other => "other",
        }
    }
}

/// Domain object owned by the host environment (e.g. a 3D vector).
///
/// Opaque to the guard beyond its tag.
#[derive(Debug, Clone, PartialEq)]
pub struct HostObject {
    pub tag: Arc<str>,
    pub data: serde_json::Value,
}

impl HostObject {
    pub fn new(tag: impl Into<Arc<str>>, data: serde_json::Value) -> Self {
        Self { tag: tag.into(), data }
    }
}

/// Reference to a callable living in the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef(pub Arc<str>);

/// One argument value.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(Arc<str>),
    Table(Table),
    Function(FunctionRef),
    Buffer(Bytes),
    Host(HostObject),
}

impl Value {
    /// Coarse classification.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Value::Number(_) => PrimitiveKind::Number,
            Value::Str(_) => PrimitiveKind::String,
            Value::Bool(_) => PrimitiveKind::Boolean,
            Value::Table(_) => PrimitiveKind::Table,
            Value::Function(_) => PrimitiveKind::Function,
            Value::Nil | Value::Buffer(_) | Value::Host(_) => PrimitiveKind::Other,
        }
    }

    /// Host-level tag. Host objects report their own tag; everything else
    /// reports a fixed name, so host allow-lists may also list primitives.
    pub fn type_tag(&self) -> &str {
        match self {
            Value::Host(h) => &h.tag,
            Value::Nil => "nil",
            Value::Buffer(_) => "buffer",
            other => other.kind().as_str(),
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Buffer(a), Value::Buffer(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Table(t) => fmt::Debug::fmt(t, f),
            Value::Function(r) => write!(f, "function<{}>", r.0),
            Value::Buffer(b) => write!(f, "buffer<{} bytes>", b.len()),
            Value::Host(h) => write!(f, "{}<{}>", h.tag, h.data),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Buffer(b)
    }
}

impl From<HostObject> for Value {
    fn from(h: HostObject) -> Self {
        Value::Host(h)
    }
}

/// Stable identity of a table for the lifetime of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(usize);

/// Shared keyed container.
///
/// Cloning a `Table` clones the handle, not the contents.
#[derive(Clone, Default)]
pub struct Table {
    inner: Arc<RwLock<Vec<(Value, Value)>>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an array-like table keyed `1..=n`.
    pub fn from_list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let t = Self::new();
        for v in items {
            t.push(v);
        }
        t
    }

    /// Build a table from entries whose keys are already known to be
    /// distinct. No duplicate-key check is made.
    pub fn from_entries(entries: Vec<(Value, Value)>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(entries)),
        }
    }

    pub fn id(&self) -> TableId {
        TableId(Arc::as_ptr(&self.inner) as *const () as usize)
    }

    pub fn ptr_eq(&self, other: &Table) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Set `key` to `value`, replacing an existing entry with an equal key.
    pub fn set(&self, key: impl Into<Value>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut g = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = g.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            g.push((key, value));
        }
    }

    /// Append with the next integer key.
    pub fn push(&self, value: impl Into<Value>) {
        let mut g = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let next = g.len() as f64 + 1.0;
        g.push((Value::Number(next), value.into()));
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        let g = self.inner.read().unwrap_or_else(|e| e.into_inner());
        g.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current entries. The lock is released before returning,
    /// so callers may await or recurse freely while walking the snapshot.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl fmt::Debug for Table {
    // Shallow on purpose: tables may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table<{:#x}; {} entries>", self.id().0, self.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn classify_kinds_and_tags() {
        let host = Value::Host(HostObject::new("Vector3", serde_json::json!({"x": 1})));
        assert_eq!(host.kind(), PrimitiveKind::Other);
        assert_eq!(host.type_tag(), "Vector3");
        assert_eq!(Value::from(1.5).type_tag(), "number");
        assert_eq!(Value::Nil.type_tag(), "nil");
        assert_eq!(Value::Buffer(Bytes::from_static(b"x")).kind(), PrimitiveKind::Other);
        assert_eq!(Value::from(Table::new()).kind(), PrimitiveKind::Table);
    }

    #[test]
    fn self_referential_table_is_representable() {
        let t = Table::new();
        t.set("self", t.clone());
        let inner = t.get(&Value::from("self")).unwrap();
        assert!(inner.as_table().unwrap().ptr_eq(&t));
        // Debug must not recurse.
        let _ = format!("{:?}", Value::from(t));
    }

    #[test]
    fn set_replaces_equal_key() {
        let t = Table::from_list([Value::from(1.0), Value::from(2.0)]);
        t.set(1.0, "one");
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(&Value::from(1.0)), Some(Value::from("one")));
    }
}
