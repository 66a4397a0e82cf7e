//! Composition of sort, pagination, visibility, truncation and follow-up
//! classification into one renderable projection.
//!
//! [`render`] is a pure function: identical inputs give an identical
//! [`RenderedTable`]. [`RenderCache`] memoizes it for hosts that re-render
//! far more often than their inputs change.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, FixedOffset};
use derive_setters::Setters;
use tracing::{debug, trace};

use crate::column::{ColumnKind, ColumnModel};
use crate::followup::{FollowUpStatus, classify};
use crate::pagination::{PageToken, PaginationState};
use crate::record::{Row, RowId};
use crate::sort::{SortConfig, SortDirection, sort_indices};
use crate::truncate::TruncationPolicy;
use crate::visibility::VisibilitySet;

/// Everything the host passes down on each render besides rows and columns.
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct TableProps {
    pub sort: SortConfig,
    /// `total_records` is ignored on input, the pipeline counts for itself.
    pub pagination: PaginationState,
    pub hidden: VisibilitySet,
    pub truncation: TruncationPolicy,
    #[setters(strip_option, into)]
    pub search: Option<String>,
    /// Clock reading for follow-up classification. Its offset is the zone
    /// all calendar-day comparisons happen in.
    pub now: DateTime<FixedOffset>,
}

impl TableProps {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            sort: None,
            pagination: PaginationState::default(),
            hidden: VisibilitySet::new(),
            truncation: TruncationPolicy::default(),
            search: None,
            now,
        }
    }

    /// Search term if one is active. Blank terms count as no search.
    pub fn active_search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    pub sorted: Option<SortDirection>,
    pub width: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellView {
    pub key: String,
    pub display: String,
    /// Untruncated text, shown as tooltip when `needs_tooltip` is set.
    pub full: String,
    pub needs_tooltip: bool,
    pub followup: Option<FollowUpStatus>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub id: RowId,
    pub cells: Vec<CellView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
    NoRecords,
    NoMatches { search: String },
}

impl EmptyState {
    pub fn message(&self) -> String {
        match self {
            EmptyState::NoRecords => "No records found.".to_string(),
            EmptyState::NoMatches { search } => format!("No records match \"{search}\"."),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTable {
    pub headers: Vec<HeaderView>,
    pub rows: Vec<RowView>,
    /// Effective pagination: totals counted after filtering, page clamped.
    pub pagination: PaginationState,
    pub window: Vec<PageToken>,
    pub empty: Option<EmptyState>,
}

fn matches_search(row: &Row, columns: &[ColumnModel], needle: &str) -> bool {
    columns
        .iter()
        .any(|column| column.text(row).to_lowercase().contains(needle))
}

/// Indices of the rows to show, in display order: rows without an id are
/// dropped, the search filter applied, then the sort.
pub fn ordered_indices(
    rows: &[Row],
    columns: &[ColumnModel],
    sort: &SortConfig,
    search: Option<&str>,
) -> Vec<usize> {
    let needle = search.map(str::to_lowercase);
    let mut skipped = 0;

    let mut indices: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            if row.id.is_none() {
                skipped += 1;
                return false;
            }
            true
        })
        .filter(|(_, row)| match &needle {
            Some(needle) => matches_search(row, columns, needle),
            None => true,
        })
        .map(|(idx, _)| idx)
        .collect();

    if skipped > 0 {
        debug!("Skipped {skipped} rows without an id");
    }

    sort_indices(rows, &mut indices, columns, sort);
    indices
}

/// Slices the ordered rows to the current page and formats the visible cells.
pub fn project(
    rows: &[Row],
    columns: &[ColumnModel],
    order: &[usize],
    props: &TableProps,
) -> RenderedTable {
    let pagination = props.pagination.with_total_records(order.len()).clamped();
    let visible = props.hidden.visible_columns(columns);

    let headers = visible
        .iter()
        .map(|column| HeaderView {
            key: column.key.clone(),
            label: column.label.clone(),
            sortable: column.sortable,
            sorted: props
                .sort
                .as_ref()
                .filter(|spec| spec.key == column.key)
                .map(|spec| spec.direction),
            width: column.width.clone(),
        })
        .collect();

    let page_rows = order[pagination.range()]
        .iter()
        .filter_map(|&idx| {
            let row = &rows[idx];
            let id = row.id.clone()?;
            let cells = visible
                .iter()
                .map(|column| format_cell(row, column, props))
                .collect();
            Some(RowView { id, cells })
        })
        .collect();

    let empty = order.is_empty().then(|| match props.active_search() {
        Some(search) => EmptyState::NoMatches {
            search: search.to_string(),
        },
        None => EmptyState::NoRecords,
    });

    RenderedTable {
        headers,
        rows: page_rows,
        window: pagination.window(),
        pagination,
        empty,
    }
}

fn format_cell(row: &Row, column: &ColumnModel, props: &TableProps) -> CellView {
    let full = column.text(row);
    let truncated = props.truncation.format_cell(row, column, &full);
    let followup = (column.kind == ColumnKind::FollowUp)
        .then(|| classify(&column.value(row).as_text(), &props.now));
    CellView {
        key: column.key.clone(),
        display: truncated.display,
        full,
        needs_tooltip: truncated.needs_tooltip,
        followup,
    }
}

pub fn render(rows: &[Row], columns: &[ColumnModel], props: &TableProps) -> RenderedTable {
    let order = ordered_indices(rows, columns, &props.sort, props.active_search());
    project(rows, columns, &order, props)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub order_hits: usize,
    pub order_misses: usize,
    pub projection_hits: usize,
    pub projection_misses: usize,
}

struct OrderEntry {
    rows: Arc<Vec<Row>>,
    columns: Arc<Vec<ColumnModel>>,
    sort: SortConfig,
    search: Option<String>,
    order: Arc<Vec<usize>>,
}

struct ProjectionEntry {
    props: TableProps,
    table: Arc<RenderedTable>,
}

/// Memoized [`render`].
///
/// The ordered index list is rebuilt only when rows, columns, sort or search
/// change. The projection is rebuilt when any prop changes, including `now`.
/// Rows and columns are compared by identity, so hosts must swap the `Arc`
/// when their data changes.
#[derive(Default)]
pub struct RenderCache {
    order: Option<OrderEntry>,
    projection: Option<ProjectionEntry>,
    stats: CacheStats,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn render(
        &mut self,
        rows: &Arc<Vec<Row>>,
        columns: &Arc<Vec<ColumnModel>>,
        props: &TableProps,
    ) -> Arc<RenderedTable> {
        let search = props.active_search().map(str::to_string);

        let order_is_fresh = self.order.as_ref().is_some_and(|entry| {
            Arc::ptr_eq(&entry.rows, rows)
                && Arc::ptr_eq(&entry.columns, columns)
                && entry.sort == props.sort
                && entry.search == search
        });

        if order_is_fresh {
            self.stats.order_hits += 1;
            if let Some(entry) = self.projection.as_ref().filter(|entry| entry.props == *props) {
                self.stats.projection_hits += 1;
                return Arc::clone(&entry.table);
            }
        } else {
            let start_time = Instant::now();
            let order = ordered_indices(rows, columns, &props.sort, search.as_deref());
            trace!(
                "Ordered {} of {} rows in {}µs",
                order.len(),
                rows.len(),
                start_time.elapsed().as_micros()
            );
            self.stats.order_misses += 1;
            self.order = Some(OrderEntry {
                rows: Arc::clone(rows),
                columns: Arc::clone(columns),
                sort: props.sort.clone(),
                search,
                order: Arc::new(order),
            });
        }

        let Some(order) = self.order.as_ref().map(|entry| Arc::clone(&entry.order)) else {
            return Arc::new(render(rows, columns, props));
        };

        self.stats.projection_misses += 1;
        let table = Arc::new(project(rows, columns, &order, props));
        self.projection = Some(ProjectionEntry {
            props: props.clone(),
            table: Arc::clone(&table),
        });
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::followup::FollowUpCategory;
    use crate::sort::SortSpec;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 9, 30, 0)
            .unwrap()
    }

    fn columns() -> Vec<ColumnModel> {
        vec![
            ColumnModel::new("name", "Name"),
            ColumnModel::new("city", "City").max_length(10),
            ColumnModel::new("score", "Score").kind(ColumnKind::Number),
            ColumnModel::new("follow_up", "Follow up").kind(ColumnKind::FollowUp),
        ]
    }

    fn rows() -> Vec<Row> {
        vec![
            Row::new(1)
                .with("name", "Asha")
                .with("city", "Hyderabad, Telangana, India")
                .with("score", 30.0)
                .with("follow_up", "2024-01-01T10:00:00Z"),
            Row::new(2)
                .with("name", "Bilal")
                .with("city", "Pune")
                .with("score", 10.0)
                .with("follow_up", "Not Scheduled"),
            Row::without_id().with("name", "Ghost"),
            Row::new(3)
                .with("name", "Chitra")
                .with("city", "Chennai")
                .with("score", 20.0)
                .with("follow_up", "2023-12-30"),
        ]
    }

    fn names(table: &RenderedTable) -> Vec<String> {
        table
            .rows
            .iter()
            .map(|row| row.cells[0].full.clone())
            .collect()
    }

    #[test]
    fn rows_without_id_are_skipped() {
        let table = render(&rows(), &columns(), &TableProps::new(now()));
        assert_eq!(names(&table), vec!["Asha", "Bilal", "Chitra"]);
        assert_eq!(table.pagination.total_records, 3);
        assert_eq!(table.empty, None);
    }

    #[test]
    fn sort_then_page_then_project() {
        let props = TableProps::new(now())
            .sort(Some(SortSpec::desc("score")))
            .pagination(PaginationState::new(2, 2, 0))
            .hidden(VisibilitySet::from_hidden(["city"]));
        let table = render(&rows(), &columns(), &props);

        assert_eq!(table.pagination, PaginationState::new(2, 2, 3));
        assert_eq!(table.window, vec![PageToken::Page(1), PageToken::Page(2)]);
        assert_eq!(names(&table), vec!["Bilal"]);
        let keys: Vec<&str> = table.headers.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "score", "follow_up"]);
        assert_eq!(table.headers[1].sorted, Some(SortDirection::Desc));
        assert_eq!(table.headers[0].sorted, None);
    }

    #[test]
    fn cells_are_truncated_and_classified() {
        let table = render(&rows(), &columns(), &TableProps::new(now()));
        let asha = &table.rows[0];
        assert_eq!(asha.id, RowId::Number(1));

        let city = &asha.cells[1];
        assert_eq!(city.display, "Hyderabad,…");
        assert_eq!(city.full, "Hyderabad, Telangana, India");
        assert!(city.needs_tooltip);

        let follow_up = asha.cells[3].followup.unwrap();
        assert_eq!(follow_up.category, FollowUpCategory::Upcoming);
        assert!(follow_up.is_due_soon);
        assert_eq!(asha.cells[0].followup, None);

        let bilal = table.rows[1].cells[3].followup.unwrap();
        assert_eq!(bilal.category, FollowUpCategory::Unscheduled);
        let chitra = table.rows[2].cells[3].followup.unwrap();
        assert_eq!(chitra.category, FollowUpCategory::Overdue);
        assert!(chitra.pulses());
    }

    #[test]
    fn search_matches_untruncated_text() {
        let props = TableProps::new(now()).search("telangana");
        let table = render(&rows(), &columns(), &props);
        assert_eq!(names(&table), vec!["Asha"]);
    }

    #[test]
    fn empty_states() {
        let no_rows = render(&[], &columns(), &TableProps::new(now()));
        assert_eq!(no_rows.empty, Some(EmptyState::NoRecords));
        assert_eq!(no_rows.pagination.total_pages(), 1);
        assert_eq!(no_rows.window, vec![PageToken::Page(1)]);
        assert!(no_rows.rows.is_empty());
        assert_eq!(no_rows.headers.len(), 4);

        let no_match = render(&rows(), &columns(), &TableProps::new(now()).search(" Zurich "));
        assert_eq!(
            no_match.empty,
            Some(EmptyState::NoMatches {
                search: "Zurich".into()
            })
        );
        assert_eq!(no_match.empty.unwrap().message(), "No records match \"Zurich\".");
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        let props = TableProps::new(now()).pagination(PaginationState::new(9, 2, 0));
        let table = render(&rows(), &columns(), &props);
        assert_eq!(table.pagination.current_page, 2);
        assert_eq!(names(&table), vec!["Chitra"]);
    }

    #[test]
    fn unknown_sort_key_keeps_source_order() {
        let props = TableProps::new(now()).sort(Some(SortSpec::asc("nope")));
        assert_eq!(names(&render(&rows(), &columns(), &props)), vec!["Asha", "Bilal", "Chitra"]);
    }

    #[test]
    fn identical_inputs_identical_output() {
        let props = TableProps::new(now()).sort(Some(SortSpec::asc("name")));
        assert_eq!(
            render(&rows(), &columns(), &props),
            render(&rows(), &columns(), &props)
        );
    }

    #[test]
    fn cache_reuses_order_and_projection() {
        let rows = Arc::new(rows());
        let columns = Arc::new(columns());
        let mut cache = RenderCache::new();
        let props = TableProps::new(now()).sort(Some(SortSpec::asc("name")));

        let first = cache.render(&rows, &columns, &props);
        let second = cache.render(&rows, &columns, &props);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            cache.stats(),
            CacheStats {
                order_hits: 1,
                order_misses: 1,
                projection_hits: 1,
                projection_misses: 1
            }
        );

        // A clock tick only redoes the projection
        let later = props.clone().now(now() + chrono::TimeDelta::minutes(45));
        let third = cache.render(&rows, &columns, &later);
        assert_eq!(cache.stats().order_misses, 1);
        assert_eq!(cache.stats().projection_misses, 2);
        assert!(!third.rows[0].cells[3].followup.unwrap().is_due_soon);

        // New data means a new order
        let swapped = Arc::new(rows.as_ref().clone());
        cache.render(&swapped, &columns, &later);
        assert_eq!(cache.stats().order_misses, 2);

        assert_eq!(*cache.render(&swapped, &columns, &later), render(&swapped, &columns, &later));
    }
}
