use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use derive_setters::Setters;

use crate::domain::LeadTableError;
use crate::record::{Row, Value};

pub type ComputeFn = Arc<dyn Fn(&Row) -> Value + Send + Sync>;
pub type RenderFn = Arc<dyn Fn(&Value, &Row) -> String + Send + Sync>;

/// How a column reads its value from a row.
#[derive(Clone)]
pub enum Accessor {
    Field(String),
    Computed(ComputeFn),
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Field(key) => f.debug_tuple("Field").field(key).finish(),
            Accessor::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Drives comparison and which cells get follow-up classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnKind {
    #[default]
    Text,
    Number,
    FollowUp,
}

#[derive(Clone, Setters)]
pub struct ColumnModel {
    #[setters(skip)]
    pub key: String,
    #[setters(skip)]
    pub label: String,
    #[setters(skip)]
    pub accessor: Accessor,
    #[setters(skip)]
    pub renderer: Option<RenderFn>,
    pub kind: ColumnKind,
    pub sortable: bool,
    pub hideable: bool,
    #[setters(strip_option)]
    pub max_length: Option<usize>,
    #[setters(strip_option, into)]
    pub width: Option<String>,
}

impl ColumnModel {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            accessor: Accessor::Field(key.clone()),
            key,
            label: label.into(),
            renderer: None,
            kind: ColumnKind::Text,
            sortable: true,
            hideable: true,
            max_length: None,
            width: None,
        }
    }

    /// Reads the column from another field of the row.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.accessor = Accessor::Field(field.into());
        self
    }

    pub fn computed(mut self, f: impl Fn(&Row) -> Value + Send + Sync + 'static) -> Self {
        self.accessor = Accessor::Computed(Arc::new(f));
        self
    }

    pub fn rendered_with(
        mut self,
        f: impl Fn(&Value, &Row) -> String + Send + Sync + 'static,
    ) -> Self {
        self.renderer = Some(Arc::new(f));
        self
    }

    pub fn value(&self, row: &Row) -> Value {
        match &self.accessor {
            Accessor::Field(field) => row.get(field).cloned().unwrap_or_default(),
            Accessor::Computed(f) => f(row),
        }
    }

    /// Full, untruncated cell text. Display, tooltip and search all read this.
    pub fn text(&self, row: &Row) -> String {
        let value = self.value(row);
        match &self.renderer {
            Some(render) => render(&value, row),
            None => value.as_text(),
        }
    }
}

impl fmt::Debug for ColumnModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnModel")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("accessor", &self.accessor)
            .field("renderer", &self.renderer.as_ref().map(|_| ".."))
            .field("kind", &self.kind)
            .field("sortable", &self.sortable)
            .field("hideable", &self.hideable)
            .field("max_length", &self.max_length)
            .field("width", &self.width)
            .finish()
    }
}

pub fn find_column<'a>(columns: &'a [ColumnModel], key: &str) -> Option<&'a ColumnModel> {
    columns.iter().find(|c| c.key == key)
}

/// Column keys must be unique within one table.
pub fn validate_columns(columns: &[ColumnModel]) -> Result<(), LeadTableError> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.key.as_str()) {
            return Err(LeadTableError::InvalidConfig(format!(
                "duplicate column key \"{}\"",
                column.key
            )));
        }
    }
    Ok(())
}
