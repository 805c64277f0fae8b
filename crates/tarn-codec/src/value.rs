//! Native values and static record descriptors.

use std::cmp::Ordering;

/// A native value the codec can marshal.
///
/// `Map` entries are sorted by [`key_cmp`] at emission time; `Pairs`
/// entries keep their order. `Record` carries a static descriptor instead
/// of relying on runtime reflection.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Binary payload; rendered as a base64 `!!binary` scalar.
    Bytes(Vec<u8>),
    Sequence(Vec<Value>),
    /// Unordered mapping; emitted in deterministic key order.
    Map(Vec<(Value, Value)>),
    /// Ordered mapping; emitted as given.
    Pairs(Vec<(Value, Value)>),
    Record(Record),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "binary",
            Value::Sequence(_) => "sequence",
            Value::Map(_) => "map",
            Value::Pairs(_) => "pairs",
            Value::Record(r) => r.info.type_name,
        }
    }

    /// The zero predicate behind omit-if-zero field handling.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Str(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::Sequence(items) => items.is_empty(),
            Value::Map(entries) | Value::Pairs(entries) => entries.is_empty(),
            Value::Record(r) => r.fields.iter().all(Value::is_zero) && r.inline.is_empty(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Bool(_)
                | Value::Int(_)
                | Value::Float(_)
                | Value::Str(_)
                | Value::Bytes(_)
        )
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Static descriptor of a record type: the replacement for runtime field
/// reflection. Declared once per type, usually as a `static`.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordInfo {
    pub type_name: &'static str,
    /// Declared fields, in declaration order. Embedded record fields appear
    /// here flattened, each with an [`FieldPath::Embedded`] path.
    pub fields: &'static [FieldInfo],
    /// The record absorbs undeclared keys into its `inline` map.
    pub has_inline: bool,
}

/// Where a declared field's value lives inside a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    /// Direct field slot.
    Index(usize),
    /// Path through nested embedded records; every step but the last must
    /// resolve to a `Value::Record`.
    Embedded(&'static [usize]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Mapping key the field is written under.
    pub key: &'static str,
    pub path: FieldPath,
    /// Emit the field's value in flow notation.
    pub flow: bool,
    /// Skip the field when its value is zero.
    pub omit_empty: bool,
}

/// A record value: field slots in declaration order plus inline-absorbed
/// entries that had no declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub info: &'static RecordInfo,
    pub fields: Vec<Value>,
    pub inline: Vec<(Value, Value)>,
}

impl Record {
    pub fn new(info: &'static RecordInfo) -> Self {
        Self {
            info,
            fields: vec![Value::Null; info.fields.len()],
            inline: Vec::new(),
        }
    }

    /// Resolve a field path, walking embedded records.
    pub fn field(&self, path: &FieldPath) -> Option<&Value> {
        match path {
            FieldPath::Index(i) => self.fields.get(*i),
            FieldPath::Embedded(steps) => {
                let (last, rest) = steps.split_last()?;
                let mut record = self;
                for step in rest {
                    match record.fields.get(*step)? {
                        Value::Record(inner) => record = inner,
                        _ => return None,
                    }
                }
                record.fields.get(*last)
            }
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Str(_) | Value::Bytes(_) => 3,
        Value::Sequence(_) | Value::Map(_) | Value::Pairs(_) | Value::Record(_) => 4,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Total order over mapping keys: null < bool < number < string, numbers
/// comparing numerically. Makes `Map` emission deterministic.
pub fn key_cmp(a: &Value, b: &Value) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        _ => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}
