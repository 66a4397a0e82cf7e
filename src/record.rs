use std::collections::HashMap;
use std::fmt;

/// Unique identifier of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Number(n) => write!(f, "{n}"),
            RowId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RowId {
    fn from(n: i64) -> Self {
        RowId::Number(n)
    }
}

impl From<i32> for RowId {
    fn from(n: i32) -> Self {
        RowId::Number(n as i64)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        RowId::Text(s.to_string())
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        RowId::Text(s)
    }
}

/// A single field value of a record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Finite numeric content, if any. NaN and infinities count as missing.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// String form used for display, search and string comparison.
    pub fn as_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Value::Number(n) => n.to_string(),
            Value::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
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

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// An opaque record owned by the data layer. The engine only reads it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub id: Option<RowId>,
    values: HashMap<String, Value>,
    max_lengths: HashMap<String, usize>,
}

impl Row {
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// A record the data layer delivered without an id. Such rows are
    /// skipped when rendering.
    pub fn without_id() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Overrides the truncation length for a single cell of this row.
    pub fn with_max_length(mut self, key: impl Into<String>, max_length: usize) -> Self {
        self.max_lengths.insert(key.into(), max_length);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn cell_max_length(&self, key: &str) -> Option<usize> {
        self.max_lengths.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(Value::Number(42.0).as_text(), "42");
        assert_eq!(Value::Number(-3.5).as_text(), "-3.5");
        assert_eq!(Value::Null.as_text(), "");
    }

    #[test]
    fn nan_is_not_a_number() {
        assert_eq!(Value::Number(f64::NAN).as_number(), None);
        assert_eq!(Value::Number(1.5).as_number(), Some(1.5));
        assert_eq!(Value::from("1.5").as_number(), None);
    }

    #[test]
    fn row_builder() {
        let row = Row::new(7)
            .with("name", "Asha")
            .with("score", 12.0)
            .with("city", None::<&str>)
            .with_max_length("name", 3);
        assert_eq!(row.id, Some(RowId::Number(7)));
        assert_eq!(row.get("name"), Some(&Value::Text("Asha".into())));
        assert_eq!(row.get("city"), Some(&Value::Null));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.cell_max_length("name"), Some(3));
        assert_eq!(row.cell_max_length("score"), None);
        assert_eq!(Row::without_id().id, None);
    }
}
