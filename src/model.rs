use std::sync::Arc;

use arboard::Clipboard;
use chrono::{DateTime, FixedOffset, TimeDelta};
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, error, info, trace};

use crate::column::ColumnModel;
use crate::domain::{CMDMode, HELP_TEXT, LeadTableError, Message, ViewerConfig};
use crate::inputter::{InputResult, Inputter};
use crate::interaction::{Interaction, TableEvent, interact};
use crate::loader::LoadedTable;
use crate::pagination::{PageAction, PageToken, PaginationState, next_page_size, previous_page_size};
use crate::pipeline::{CellView, RenderCache, RenderedTable, TableProps};
use crate::record::Row;
use crate::truncate::TruncationPolicy;

/// Follow-up classification is refreshed at most this often.
pub const CLOCK_TICK: TimeDelta = TimeDelta::seconds(10);

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

/// The screen that hosts the table: owns sort, visibility and pagination
/// preferences and re-renders through the pipeline whenever they change.
pub struct Model {
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    name: String,
    rows: Arc<Vec<Row>>,
    columns: Arc<Vec<ColumnModel>>,
    props: TableProps,
    cache: RenderCache,
    rendered: Arc<RenderedTable>,
    curser_row: usize,
    curser_column: usize,
    clipboard: Option<Clipboard>,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    popup_message: Option<String>,
    status_message: String,
}

impl Model {
    pub fn init(config: &ViewerConfig, table: LoadedTable, now: DateTime<FixedOffset>) -> Self {
        let props = TableProps::new(now)
            .pagination(PaginationState::new(1, config.page_size, 0))
            .truncation(TruncationPolicy::new(config.max_length));

        let mut model = Self {
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            name: table.name,
            rows: Arc::new(table.rows),
            columns: Arc::new(table.columns),
            props,
            cache: RenderCache::new(),
            rendered: Arc::new(RenderedTable {
                headers: Vec::new(),
                rows: Vec::new(),
                pagination: PaginationState::default(),
                window: Vec::new(),
                empty: None,
            }),
            curser_row: 0,
            curser_column: 0,
            clipboard: None,
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            popup_message: None,
            status_message: String::new(),
        };
        model.refresh();
        model.set_status_message(format!("Loaded {} records", model.rows.len()));
        model
    }

    // --------------------------- Accessors --------------------------------- //

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &RenderedTable {
        &self.rendered
    }

    pub fn props(&self) -> &TableProps {
        &self.props
    }

    pub fn selection(&self) -> (usize, usize) {
        (self.curser_row, self.curser_column)
    }

    pub fn selected_cell(&self) -> Option<&CellView> {
        self.rendered
            .rows
            .get(self.curser_row)
            .and_then(|row| row.cells.get(self.curser_column))
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn popup_message(&self) -> Option<&str> {
        self.popup_message.as_deref()
    }

    pub fn cmd_input(&self) -> Option<&InputResult> {
        self.active_cmdinput.then_some(&self.last_input)
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn cache_stats(&self) -> crate::pipeline::CacheStats {
        self.cache.stats()
    }

    // ---------------------------- Updates ---------------------------------- //

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    /// Advances the clock used for follow-up classification.
    pub fn tick(&mut self, now: DateTime<FixedOffset>) {
        if now.signed_duration_since(self.props.now).abs() >= CLOCK_TICK {
            trace!("Clock tick {now}");
            self.props.now = now;
            self.refresh();
        }
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), LeadTableError> {
        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);

        match self.modus {
            Modus::TABLE => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_selection_up(),
                Message::MoveDown => self.move_selection_down(),
                Message::MoveLeft => self.move_selection_left(),
                Message::MoveRight => self.move_selection_right(),
                Message::NextPage => self.interact(Interaction::Page(PageAction::Next)),
                Message::PreviousPage => self.interact(Interaction::Page(PageAction::Previous)),
                Message::FirstPage => {
                    self.interact(Interaction::Page(PageAction::Token(PageToken::Page(1))))
                }
                Message::LastPage => {
                    let last = self.rendered.pagination.total_pages();
                    self.interact(Interaction::Page(PageAction::Token(PageToken::Page(last))))
                }
                Message::LargerPageSize => {
                    let size = next_page_size(self.props.pagination.page_size);
                    self.interact(Interaction::PageSizeSelected(size))
                }
                Message::SmallerPageSize => {
                    let size = previous_page_size(self.props.pagination.page_size);
                    self.interact(Interaction::PageSizeSelected(size))
                }
                Message::ToggleSort => self.toggle_sort(),
                Message::HideColumn => self.hide_column(),
                Message::ShowAllColumns => self.show_all_columns(),
                Message::Search => self.enter_cmd_mode(CMDMode::Search),
                Message::ClearSearch => self.apply_search(None),
                Message::CopyCell => self.copy_cell(),
                Message::Help => self.show_help(),
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.exit(),
                _ => (),
            },
            Modus::CMDINPUT => {
                if let Message::RawKey(key) = msg {
                    self.raw_input(key)
                }
            }
        }
        Ok(())
    }

    fn refresh(&mut self) {
        self.rendered = self.cache.render(&self.rows, &self.columns, &self.props);
        // Keep the stored page inside the range the pipeline settled on
        self.props.pagination = self.rendered.pagination;
        self.curser_row = self
            .curser_row
            .min(self.rendered.rows.len().saturating_sub(1));
        self.curser_column = self
            .curser_column
            .min(self.rendered.headers.len().saturating_sub(1));
    }

    fn interact(&mut self, interaction: Interaction) {
        let pagination = self.rendered.pagination;
        match interact(&self.columns, &self.props, &pagination, &interaction) {
            Some(event) => self.apply_event(event),
            None => debug!("{interaction:?} changed nothing"),
        }
    }

    fn apply_event(&mut self, event: TableEvent) {
        info!("Table event {event:?}");
        let message = match &event {
            TableEvent::SortChanged(Some(spec)) => {
                format!("Sorted by {} {}", spec.key, spec.direction.arrow())
            }
            TableEvent::SortChanged(None) => "Unsorted".to_string(),
            TableEvent::PageChanged(page) => format!("Page {page}"),
            TableEvent::PageSizeChanged(size) => format!("{size} records per page"),
            TableEvent::ColumnVisibilityChanged(hidden) if hidden.is_empty() => {
                "All columns visible".to_string()
            }
            TableEvent::ColumnVisibilityChanged(hidden) => {
                format!("Hidden: {}", hidden.join(", "))
            }
        };
        let resets_cursor = matches!(
            event,
            TableEvent::PageChanged(_) | TableEvent::PageSizeChanged(_)
        );

        event.dispatch(&mut self.props);
        if resets_cursor {
            self.curser_row = 0;
        }
        self.refresh();
        self.set_status_message(message);
    }

    fn current_key(&self) -> Option<String> {
        self.rendered
            .headers
            .get(self.curser_column)
            .map(|h| h.key.clone())
    }

    fn toggle_sort(&mut self) {
        let Some(key) = self.current_key() else {
            return;
        };
        let pagination = self.rendered.pagination;
        match interact(
            &self.columns,
            &self.props,
            &pagination,
            &Interaction::HeaderClicked(key.clone()),
        ) {
            Some(event) => self.apply_event(event),
            None => self.set_status_message(format!("{key} is not sortable")),
        }
    }

    fn hide_column(&mut self) {
        let Some(key) = self.current_key() else {
            return;
        };
        let pagination = self.rendered.pagination;
        match interact(
            &self.columns,
            &self.props,
            &pagination,
            &Interaction::ColumnToggled(key.clone()),
        ) {
            Some(event) => self.apply_event(event),
            None => self.set_status_message(format!("Cannot hide {key}")),
        }
    }

    fn show_all_columns(&mut self) {
        if !self.props.hidden.is_empty() {
            self.apply_event(TableEvent::ColumnVisibilityChanged(Vec::new()));
        }
    }

    fn apply_search(&mut self, term: Option<String>) {
        let term = term.filter(|t| !t.trim().is_empty());
        if term == self.props.search {
            return;
        }
        info!("Search {term:?}");
        self.props.search = term;
        // A new search always starts on the first page
        self.props.pagination = self.props.pagination.first_page();
        self.curser_row = 0;
        self.refresh();

        let found = self.rendered.pagination.total_records;
        match &self.props.search {
            Some(term) => self.set_status_message(format!("Found {found} records for \"{term}\"")),
            None => self.set_status_message(format!("{found} records")),
        }
    }

    fn move_selection_up(&mut self) {
        self.curser_row = self.curser_row.saturating_sub(1);
    }

    fn move_selection_down(&mut self) {
        if self.curser_row + 1 < self.rendered.rows.len() {
            self.curser_row += 1;
        }
    }

    fn move_selection_left(&mut self) {
        self.curser_column = self.curser_column.saturating_sub(1);
    }

    fn move_selection_right(&mut self) {
        if self.curser_column + 1 < self.rendered.headers.len() {
            self.curser_column += 1;
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    fn copy_cell(&mut self) {
        let Some(cell) = self.selected_cell().map(|c| c.full.clone()) else {
            return;
        };
        trace!("Cell content: {}", cell);

        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    error!("Clipboard unavailable: {:?}", e);
                    self.set_status_message("Clipboard unavailable");
                    return;
                }
            }
        }
        let result = self.clipboard.as_mut().map(|c| c.set_text(cell));
        match result {
            Some(Ok(_)) => self.set_status_message("Copied cell"),
            Some(Err(e)) => error!("Error copying to clipboard: {:?}", e),
            None => {}
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.popup_message = Some(HELP_TEXT.to_string());
    }

    fn exit(&mut self) {
        if self.modus == Modus::POPUP {
            trace!("Close popup ...");
            self.modus = self.previous_modus;
            self.previous_modus = Modus::POPUP;
            self.popup_message = None;
        }
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode ...");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.active_cmdinput = true;
        self.input.set(self.props.search.as_deref().unwrap_or_default());
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if self.active_cmdinput {
            self.last_input = self.input.read(key);
            if self.last_input.finished {
                self.handle_cmd_input();
            }
        }
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {}", self.last_input.input);
        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        if self.last_input.canceled {
            self.cmd_mode = None;
            return;
        }
        let cmd_input = self.last_input.input.clone();
        match self.cmd_mode.take() {
            Some(CMDMode::Search) => self.apply_search(Some(cmd_input)),
            None => info!("Cmd mode is none!"),
        }
    }
}
