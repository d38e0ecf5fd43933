//! Row cell values and row schema descriptors

use bytes::Bytes;
use serde::de::{self, SeqAccess, Visitor};
use serde::{ser, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One output record: positional cell values
pub type Row = Vec<CellValue>;

/// Opaque cell value produced by the execution engine
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Binary(Bytes),
}

impl CellValue {
    /// Value type tag of this cell
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::None,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Integer(_) => ValueType::Integer,
            Self::Number(_) => ValueType::Number,
            Self::String(_) => ValueType::String,
            Self::Binary(_) => ValueType::Binary,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Textual form used by the scalar output strategy.
///
/// `Null` renders as the empty string; binary renders as lossy UTF-8.
/// Numbers keep a fractional part (`42.0`) so they stay distinct from integers.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v:?}"),
            Self::String(v) => f.write_str(v),
            Self::Binary(v) => f.write_str(&String::from_utf8_lossy(v)),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Boolean(v) => serializer.serialize_bool(*v),
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Number(v) if v.is_finite() => serializer.serialize_f64(*v),
            // JSON has no representation for NaN / infinity
            Self::Number(v) => Err(ser::Error::custom(format!(
                "non-finite number {v} is not serializable"
            ))),
            Self::String(v) => serializer.serialize_str(v),
            Self::Binary(v) => serializer.serialize_bytes(v),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CellValueVisitor)
    }
}

struct CellValueVisitor;

impl<'de> Visitor<'de> for CellValueVisitor {
    type Value = CellValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a null, boolean, number, string or byte array cell")
    }

    fn visit_unit<E: de::Error>(self) -> Result<CellValue, E> {
        Ok(CellValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<CellValue, E> {
        Ok(CellValue::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<CellValue, E> {
        Ok(CellValue::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<CellValue, E> {
        Ok(CellValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<CellValue, E> {
        Ok(i64::try_from(v)
            .map(CellValue::Integer)
            .unwrap_or(CellValue::Number(v as f64)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<CellValue, E> {
        Ok(CellValue::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<CellValue, E> {
        Ok(CellValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<CellValue, E> {
        Ok(CellValue::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<CellValue, E> {
        Ok(CellValue::Binary(Bytes::copy_from_slice(v)))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<CellValue, E> {
        Ok(CellValue::Binary(Bytes::from(v)))
    }

    // Binary cells serialize as a sequence of octets in JSON
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<CellValue, A::Error> {
        let mut buf = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            buf.push(byte);
        }
        Ok(CellValue::Binary(Bytes::from(buf)))
    }
}

/// Logical type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    None,
    Boolean,
    Integer,
    Number,
    String,
    Binary,
    Date,
    Timestamp,
}

/// Positional field descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    #[serde(default)]
    pub value_type: ValueType,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// Describes the positional names/types of one row's values
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowSchema {
    pub fields: Vec<FieldMeta>,
}

impl RowSchema {
    pub fn new(fields: Vec<FieldMeta>) -> Self {
        Self { fields }
    }

    /// Build a schema by inferring field types from a row
    pub fn infer(names: &[&str], row: &[CellValue]) -> Self {
        let fields = names
            .iter()
            .zip(row)
            .map(|(name, cell)| FieldMeta::new(*name, cell.value_type()))
            .collect();
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a field by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}
