use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::column::{ColumnModel, find_column};

/// Keys of the columns the user has hidden.
///
/// Immutable: every toggle returns a new set which the host hands to its
/// visibility callback. At least one column always stays visible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilitySet {
    hidden: BTreeSet<String>,
}

impl VisibilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_hidden<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hidden: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty()
    }

    /// Sorted hidden keys, the payload of a visibility change.
    pub fn hidden_keys(&self) -> Vec<String> {
        self.hidden.iter().cloned().collect()
    }

    pub fn visible_count(&self, columns: &[ColumnModel]) -> usize {
        columns.iter().filter(|c| !self.is_hidden(&c.key)).count()
    }

    /// Shows a hidden key. Hides a visible key only while more than one
    /// column is visible, otherwise returns the set unchanged.
    pub fn toggle(&self, key: &str, visible_count: usize) -> Self {
        let mut next = self.clone();
        if next.hidden.remove(key) {
            trace!("Showing column \"{key}\"");
        } else if visible_count > 1 {
            trace!("Hiding column \"{key}\"");
            next.hidden.insert(key.to_string());
        } else {
            trace!("Refusing to hide \"{key}\", it is the last visible column");
        }
        next
    }

    /// [`toggle`](Self::toggle) against a concrete column list. Unknown keys
    /// and columns that are not hideable are left alone.
    pub fn toggle_column(&self, key: &str, columns: &[ColumnModel]) -> Self {
        let Some(column) = find_column(columns, key) else {
            return self.clone();
        };
        if !column.hideable && !self.is_hidden(key) {
            trace!("Column \"{key}\" cannot be hidden");
            return self.clone();
        }
        self.toggle(key, self.visible_count(columns))
    }

    /// Columns to render, in model order. A set restored from outside that
    /// hides every column is repaired by showing the first one.
    pub fn visible_columns<'a>(&self, columns: &'a [ColumnModel]) -> Vec<&'a ColumnModel> {
        let visible: Vec<&ColumnModel> = columns.iter().filter(|c| !self.is_hidden(&c.key)).collect();
        if visible.is_empty() && !columns.is_empty() {
            warn!("All columns are hidden, showing \"{}\"", columns[0].key);
            return vec![&columns[0]];
        }
        visible
    }
}
