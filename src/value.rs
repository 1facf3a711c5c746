use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single raw field as delivered by an adapter. Table services return a mix
/// of shapes for the same logical column: plain scalars, localized numeric
/// strings ("1,234.5"), or a one-element list wrapping the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Integer(i64),
    Number(f64),
    Text(String),
    Tagged(Vec<TextFragment>),
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
}

impl RawValue {
    pub fn tagged(text: impl Into<String>) -> Self {
        RawValue::Tagged(vec![TextFragment { text: text.into() }])
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

/// Normalized field value. `Missing` covers absent keys, nulls, and shapes
/// that carry no usable payload (e.g. an empty tagged list).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    /// Numeric view for values that arrived as numbers. Textual values are
    /// deliberately excluded; lenient text parsing belongs to the change
    /// calculator.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Missing => Ok(()),
        }
    }
}

/// Extracts a scalar from a raw field shape. Total: unparsable strings pass
/// through unchanged instead of failing.
pub fn normalize(raw: Option<&RawValue>) -> FieldValue {
    let Some(raw) = raw else {
        return FieldValue::Missing;
    };

    match raw {
        RawValue::Tagged(fragments) => fragments
            .first()
            .map(|fragment| FieldValue::Text(fragment.text.clone()))
            .unwrap_or(FieldValue::Missing),
        RawValue::Text(text) => parse_localized_text(text),
        RawValue::Integer(v) => FieldValue::Int(*v),
        RawValue::Number(v) => FieldValue::Float(*v),
        RawValue::Null => FieldValue::Missing,
    }
}

fn parse_localized_text(text: &str) -> FieldValue {
    let cleaned = text.replace(',', "");
    if cleaned.contains('.') {
        match cleaned.parse::<f64>() {
            Ok(v) => FieldValue::Float(v),
            Err(_) => FieldValue::Text(text.to_string()),
        }
    } else {
        match cleaned.parse::<i64>() {
            Ok(v) => FieldValue::Int(v),
            Err(_) => FieldValue::Text(text.to_string()),
        }
    }
}

/// One record fetched for a (store, period): field name to raw value.
/// Immutable once fetched, except for merging in supplementary API fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.fields.get(field)
    }

    /// Normalized lookup; absent keys come back as `Missing`.
    pub fn field(&self, field: &str) -> FieldValue {
        normalize(self.get(field))
    }

    /// Normalized lookup with a declared fallback for missing data.
    pub fn field_or(&self, field: &str, default: FieldValue) -> FieldValue {
        match self.field(field) {
            FieldValue::Missing => default,
            value => value,
        }
    }

    /// Folds supplementary fields (e.g. loss metrics from a second API) into
    /// this record, overwriting on collision.
    pub fn merge(&mut self, other: RawRecord) {
        self.fields.extend(other.fields);
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl FromIterator<(String, RawValue)> for RawRecord {
    fn from_iter<T: IntoIterator<Item = (String, RawValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
