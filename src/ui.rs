use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row as UiRow, Table, TableState, Wrap},
};

use crate::followup::{FollowUpCategory, FollowUpStatus};
use crate::model::Model;
use crate::pagination::PageToken;
use crate::pipeline::{CellView, HeaderView, RenderedTable};

pub const CMDLINE_HEIGH: u16 = 1;
pub const FOOTER_HEIGHT: u16 = 1;
pub const COLUMN_WIDTH_MARGIN: u16 = 1;
const MIN_COLUMN_WIDTH: u16 = 3;
const UNPARSEABLE_MARK: &str = "? ";

#[derive(Default)]
pub struct TableUI {
    state: TableState,
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let [table_area, footer_area, cmdline_area] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(FOOTER_HEIGHT),
            Constraint::Length(CMDLINE_HEIGH),
        ])
        .areas(frame.area());

        let table = model.table();
        let (row, column) = model.selection();

        match &table.empty {
            Some(empty) => {
                let block = table_block(model);
                let message = Paragraph::new(empty.message().italic().dark_gray())
                    .centered()
                    .block(block);
                frame.render_widget(message, table_area);
            }
            None => {
                self.state.select(Some(row));
                self.state.select_column(Some(column));
                let widget = build_table(table, column).block(table_block(model));
                frame.render_stateful_widget(widget, table_area, &mut self.state);
            }
        }

        frame.render_widget(Paragraph::new(footer_line(table)), footer_area);
        draw_cmdline(model, frame, cmdline_area);

        if let Some(message) = model.popup_message() {
            draw_popup(message, frame);
        }
    }
}

fn table_block(model: &Model) -> Block<'static> {
    let mut title = vec![Span::from(format!(" {} ", model.name())).bold()];
    if let Some(search) = model.props().active_search() {
        title.push(Span::from(format!("/{search} ")).yellow());
    }
    Block::bordered()
        .title(Line::from(title).centered())
        .border_set(border::ROUNDED)
}

fn build_table(table: &RenderedTable, selected_column: usize) -> Table<'static> {
    let header = UiRow::new(
        table
            .headers
            .iter()
            .enumerate()
            .map(|(idx, h)| header_cell(h, idx == selected_column)),
    )
    .style(Style::new().bold());

    let rows = table
        .rows
        .iter()
        .map(|row| UiRow::new(row.cells.iter().map(body_cell)));

    Table::new(rows, column_widths(table))
        .header(header)
        .column_spacing(COLUMN_WIDTH_MARGIN)
        .row_highlight_style(Style::new().bg(Color::DarkGray))
        .cell_highlight_style(Style::new().reversed())
}

fn header_cell(header: &HeaderView, selected: bool) -> Cell<'static> {
    let mut spans = vec![Span::from(header.label.clone())];
    if let Some(direction) = header.sorted {
        spans.push(Span::from(format!(" {}", direction.arrow())).cyan());
    }
    let style = if selected {
        Style::new().underlined()
    } else if header.sortable {
        Style::new()
    } else {
        Style::new().dim()
    };
    Cell::from(Line::from(spans)).style(style)
}

fn body_cell(cell: &CellView) -> Cell<'static> {
    match cell.followup {
        Some(status) => {
            let text = match status.category {
                FollowUpCategory::Unparseable => format!("{UNPARSEABLE_MARK}{}", cell.display),
                _ => cell.display.clone(),
            };
            Cell::from(text).style(followup_style(&status))
        }
        None => Cell::from(cell.display.clone()),
    }
}

/// Terminal rendering of the follow-up urgency cues.
pub fn followup_style(status: &FollowUpStatus) -> Style {
    let style = match status.category {
        FollowUpCategory::Unscheduled => Style::new().fg(Color::DarkGray).italic(),
        FollowUpCategory::Unparseable => Style::new().dim(),
        FollowUpCategory::Overdue => Style::new().fg(Color::Red).bold(),
        FollowUpCategory::DueToday | FollowUpCategory::Upcoming if status.is_due_soon => {
            Style::new().fg(Color::Yellow).bold()
        }
        FollowUpCategory::DueToday => Style::new().fg(Color::Yellow),
        FollowUpCategory::Upcoming => Style::new().fg(Color::Green),
    };
    if status.pulses() {
        style.add_modifier(Modifier::SLOW_BLINK)
    } else {
        style
    }
}

fn column_widths(table: &RenderedTable) -> Vec<Constraint> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            if let Some(width) = header.width.as_deref().and_then(parse_width) {
                return width;
            }
            let sort_mark = if header.sorted.is_some() { 2 } else { 0 };
            let content = table
                .rows
                .iter()
                .filter_map(|row| row.cells.get(idx))
                .map(|cell| {
                    let mark = match cell.followup {
                        Some(s) if s.category == FollowUpCategory::Unparseable => {
                            UNPARSEABLE_MARK.chars().count()
                        }
                        _ => 0,
                    };
                    cell.display.chars().count() + mark
                })
                .max()
                .unwrap_or(0);
            let width = content.max(header.label.chars().count() + sort_mark);
            Constraint::Length((width as u16).max(MIN_COLUMN_WIDTH))
        })
        .collect()
}

// Leading digits of a width hint. "30%" is a share of the table width,
// anything else ("120", "12ch") counts terminal cells.
fn parse_width(hint: &str) -> Option<Constraint> {
    let hint = hint.trim();
    let digits: String = hint.chars().take_while(|c| c.is_ascii_digit()).collect();
    let width: u16 = digits.parse().ok().filter(|w| *w > 0)?;
    if hint[digits.len()..].trim_start().starts_with('%') {
        Some(Constraint::Percentage(width.min(100)))
    } else {
        Some(Constraint::Length(width))
    }
}

fn footer_line(table: &RenderedTable) -> Line<'static> {
    let pagination = &table.pagination;
    let enabled = |on: bool| if on { Style::new() } else { Style::new().dark_gray() };

    let mut spans = vec![Span::styled("‹ ", enabled(pagination.can_go_previous()))];
    for token in &table.window {
        let span = match token {
            PageToken::Page(page) if *page == pagination.current_page => {
                Span::from(format!("[{token}]")).bold().reversed()
            }
            PageToken::Page(_) => Span::from(token.to_string()),
            PageToken::Ellipsis => Span::from(token.to_string()).dark_gray(),
        };
        spans.push(span);
        spans.push(Span::from(" "));
    }
    spans.push(Span::styled("›", enabled(pagination.can_go_next())));
    spans.push(
        Span::from(format!(
            "  Page {}/{} · {} records · {} per page",
            pagination.current_page,
            pagination.total_pages(),
            pagination.total_records,
            pagination.page_size
        ))
        .dark_gray(),
    );
    Line::from(spans)
}

fn draw_cmdline(model: &Model, frame: &mut Frame, area: Rect) {
    if let Some(input) = model.cmd_input() {
        let line = Line::from(vec![Span::from("/").yellow(), Span::from(input.input.clone())]);
        frame.render_widget(Paragraph::new(line), area);
        let cursor = input.input.chars().take(input.curser_pos).count() as u16 + 1;
        frame.set_cursor_position(Position::new(area.x + cursor, area.y));
        return;
    }

    // Truncated cells reveal their full text on the status line
    let line = match model.selected_cell() {
        Some(cell) if cell.needs_tooltip => Line::from(cell.full.clone()).italic(),
        Some(cell) => match cell.followup {
            Some(status) => Line::from(vec![
                Span::from(status.category.label()).style(followup_style(&status)),
                Span::from(format!("  {}", model.status_message())).dark_gray(),
            ]),
            None => Line::from(model.status_message().to_string()).dark_gray(),
        },
        None => Line::from(model.status_message().to_string()).dark_gray(),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_popup(message: &str, frame: &mut Frame) {
    let text = Text::from(message.to_string());
    let width = text.width() as u16 + 4;
    let height = text.height() as u16 + 2;
    let area = centered(frame.area(), width, height);

    let block = Block::bordered()
        .title(Line::from(" Help ").centered())
        .title_bottom(Line::from(" <Esc> ").centered())
        .border_set(border::THICK);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_hints() {
        assert_eq!(parse_width("120"), Some(Constraint::Length(120)));
        assert_eq!(parse_width(" 12ch"), Some(Constraint::Length(12)));
        assert_eq!(parse_width("30%"), Some(Constraint::Percentage(30)));
        assert_eq!(parse_width("250%"), Some(Constraint::Percentage(100)));
        assert_eq!(parse_width("auto"), None);
        assert_eq!(parse_width("0%"), None);
    }

    #[test]
    fn overdue_cells_blink() {
        let style = followup_style(&FollowUpStatus::new(FollowUpCategory::Overdue, true));
        assert!(style.add_modifier.contains(Modifier::SLOW_BLINK));
        assert_eq!(style.fg, Some(Color::Red));

        let calm = followup_style(&FollowUpStatus::new(FollowUpCategory::Upcoming, false));
        assert!(!calm.add_modifier.contains(Modifier::SLOW_BLINK));
    }
}
