//! User interactions and the events they emit to the host.
//!
//! The engine holds no state of its own. A click is translated into a
//! [`TableEvent`] carrying the new value, and the host decides what to do
//! with it: apply it to its [`TableProps`], persist it, or ignore it.

use tracing::trace;

use crate::column::ColumnModel;
use crate::pagination::{PageAction, PaginationState};
use crate::pipeline::TableProps;
use crate::sort::{self, SortConfig};
use crate::visibility::VisibilitySet;

#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    HeaderClicked(String),
    Page(PageAction),
    PageSizeSelected(usize),
    ColumnToggled(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    SortChanged(SortConfig),
    PageChanged(usize),
    PageSizeChanged(usize),
    ColumnVisibilityChanged(Vec<String>),
}

/// Receiver of table events. Every hook defaults to doing nothing.
pub trait TableCallbacks {
    fn on_sort_change(&mut self, _sort: SortConfig) {}
    fn on_page_change(&mut self, _page: usize) {}
    fn on_page_size_change(&mut self, _page_size: usize) {}
    fn on_column_visibility_change(&mut self, _hidden: Vec<String>) {}
}

impl TableEvent {
    pub fn dispatch<C: TableCallbacks + ?Sized>(self, callbacks: &mut C) {
        match self {
            TableEvent::SortChanged(sort) => callbacks.on_sort_change(sort),
            TableEvent::PageChanged(page) => callbacks.on_page_change(page),
            TableEvent::PageSizeChanged(size) => callbacks.on_page_size_change(size),
            TableEvent::ColumnVisibilityChanged(hidden) => {
                callbacks.on_column_visibility_change(hidden)
            }
        }
    }
}

/// Applying events to the props is what a host without extra bookkeeping
/// does.
impl TableCallbacks for TableProps {
    fn on_sort_change(&mut self, sort: SortConfig) {
        self.sort = sort;
    }

    fn on_page_change(&mut self, page: usize) {
        self.pagination.current_page = page;
    }

    fn on_page_size_change(&mut self, page_size: usize) {
        self.pagination = self.pagination.with_page_size(page_size);
    }

    fn on_column_visibility_change(&mut self, hidden: Vec<String>) {
        self.hidden = VisibilitySet::from_hidden(hidden);
    }
}

/// Event for `interaction`, or `None` when it changes nothing.
///
/// `pagination` is the effective state of the last render, so page buttons
/// are judged against the real record count.
pub fn interact(
    columns: &[ColumnModel],
    props: &TableProps,
    pagination: &PaginationState,
    interaction: &Interaction,
) -> Option<TableEvent> {
    let event = match interaction {
        Interaction::HeaderClicked(key) => {
            let next = sort::toggle(&props.sort, columns, key);
            (next != props.sort).then_some(TableEvent::SortChanged(next))
        }
        Interaction::Page(action) => pagination.request(*action).map(TableEvent::PageChanged),
        Interaction::PageSizeSelected(size) => (*size > 0 && *size != pagination.page_size)
            .then_some(TableEvent::PageSizeChanged(*size)),
        Interaction::ColumnToggled(key) => {
            let next = props.hidden.toggle_column(key, columns);
            (next != props.hidden).then(|| TableEvent::ColumnVisibilityChanged(next.hidden_keys()))
        }
    };
    trace!("Interaction {interaction:?} => {event:?}");
    event
}
