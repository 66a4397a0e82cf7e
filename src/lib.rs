//! Tabular presentation engine for record lists.
//!
//! The engine turns a list of [`Row`]s and a list of [`ColumnModel`]s into a
//! sorted, paginated, column-filtered and truncation-safe projection, and
//! classifies follow-up timestamps into urgency buckets. Everything in the
//! engine is a pure function of its inputs; the terminal viewer in
//! [`model`], [`controller`] and [`ui`] is one host that owns the preference
//! state and feeds it back on every render.

pub mod column;
pub mod controller;
pub mod domain;
pub mod followup;
pub mod inputter;
pub mod interaction;
pub mod loader;
pub mod model;
pub mod pagination;
pub mod pipeline;
pub mod record;
pub mod sort;
pub mod truncate;
pub mod ui;
pub mod visibility;

pub use column::{Accessor, ColumnKind, ColumnModel};
pub use domain::LeadTableError;
pub use followup::{FollowUpCategory, FollowUpStatus, classify};
pub use interaction::{Interaction, TableCallbacks, TableEvent, interact};
pub use pagination::{PageAction, PageToken, PaginationState, window};
pub use pipeline::{CellView, EmptyState, RenderCache, RenderedTable, TableProps, render};
pub use record::{Row, RowId, Value};
pub use sort::{SortConfig, SortDirection, SortSpec};
pub use truncate::{Truncated, TruncationPolicy};
pub use visibility::VisibilitySet;
