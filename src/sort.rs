use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::column::{ColumnKind, ColumnModel, find_column};
use crate::record::{Row, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// `None` means rows keep the order the data layer delivered them in.
pub type SortConfig = Option<SortSpec>;

/// Header click. Sorting the same column flips its direction, a new column
/// starts ascending. There is no way back to unsorted by clicking.
pub fn toggle(current: &SortConfig, columns: &[ColumnModel], key: &str) -> SortConfig {
    match find_column(columns, key) {
        Some(column) if column.sortable => {}
        _ => {
            trace!("Ignoring sort toggle on \"{key}\"");
            return current.clone();
        }
    }

    match current {
        Some(spec) if spec.key == key => Some(SortSpec {
            key: spec.key.clone(),
            direction: spec.direction.flip(),
        }),
        _ => Some(SortSpec::asc(key)),
    }
}

// Numeric columns also accept numbers that arrived as text.
fn numeric(value: &Value, kind: ColumnKind) -> Option<f64> {
    match (value, kind) {
        (Value::Text(s), ColumnKind::Number) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => value.as_number(),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Ascending total order over cell values, the same for every column kind.
///
/// Values split into two classes: non-numbers (null, NaN, text, booleans)
/// sort below all numbers. Numbers compare numerically, non-numbers by
/// case-folded string form with ties broken by the raw string. Only
/// [`ColumnKind::Number`] columns read numeric text as a number.
pub fn compare(a: &Value, b: &Value, kind: ColumnKind) -> Ordering {
    match (numeric(a, kind), numeric(b, kind)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => compare_text(&a.as_text(), &b.as_text()),
    }
}

/// Stable sort of row indices. An unknown or non-sortable key leaves the
/// order untouched.
pub fn sort_indices(rows: &[Row], indices: &mut [usize], columns: &[ColumnModel], sort: &SortConfig) {
    let Some(spec) = sort else {
        return;
    };
    let column = match find_column(columns, &spec.key) {
        Some(column) if column.sortable => column,
        Some(_) => {
            debug!("Sort key \"{}\" is not sortable, keeping order", spec.key);
            return;
        }
        None => {
            debug!("Sort key \"{}\" matches no column, keeping order", spec.key);
            return;
        }
    };

    // Resolve every value once instead of on each comparison
    let mut keyed: Vec<(usize, Value)> = indices
        .iter()
        .map(|&idx| (idx, column.value(&rows[idx])))
        .collect();

    keyed.sort_by(|(_, a), (_, b)| {
        let ord = compare(a, b, column.kind);
        match spec.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    for (slot, (idx, _)) in indices.iter_mut().zip(keyed) {
        *slot = idx;
    }
}
