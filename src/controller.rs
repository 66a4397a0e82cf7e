use std::time::Duration;
use tracing::trace;

use crate::domain::{LeadTableError, Message, ViewerConfig};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &ViewerConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, LeadTableError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                if model.raw_keyevents() {
                    Ok(Some(Message::RawKey(key)))
                } else {
                    Ok(self.handle_key(key))
                }
            }
            _ => Ok(None),
        }
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Up | KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down | KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::Left | KeyCode::Char('h'), _) => Some(Message::MoveLeft),
            (KeyCode::Right | KeyCode::Char('l'), _) => Some(Message::MoveRight),
            (KeyCode::Char('n') | KeyCode::PageDown, _) => Some(Message::NextPage),
            (KeyCode::Char('p') | KeyCode::PageUp, _) => Some(Message::PreviousPage),
            (KeyCode::Char('g') | KeyCode::Home, _) => Some(Message::FirstPage),
            (KeyCode::Char('G') | KeyCode::End, _) => Some(Message::LastPage),
            (KeyCode::Char('+'), _) => Some(Message::LargerPageSize),
            (KeyCode::Char('-'), _) => Some(Message::SmallerPageSize),
            (KeyCode::Char('s'), _) => Some(Message::ToggleSort),
            (KeyCode::Char('x'), _) => Some(Message::HideColumn),
            (KeyCode::Char('a'), _) => Some(Message::ShowAllColumns),
            (KeyCode::Char('/'), _) => Some(Message::Search),
            (KeyCode::Char('c'), _) => Some(Message::ClearSearch),
            (KeyCode::Char('y'), _) => Some(Message::CopyCell),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn key_bindings() {
        let controller = Controller::new(&ViewerConfig::default());
        assert_eq!(controller.handle_key(key(KeyCode::Char('q'))), Some(Message::Quit));
        assert_eq!(controller.handle_key(key(KeyCode::Char('j'))), Some(Message::MoveDown));
        assert_eq!(controller.handle_key(key(KeyCode::PageDown)), Some(Message::NextPage));
        assert_eq!(controller.handle_key(key(KeyCode::Char('G'))), Some(Message::LastPage));
        assert_eq!(controller.handle_key(key(KeyCode::Char('s'))), Some(Message::ToggleSort));
        assert_eq!(controller.handle_key(key(KeyCode::Char('/'))), Some(Message::Search));
        assert_eq!(controller.handle_key(key(KeyCode::Char('z'))), None);
    }

    #[test]
    fn ctrl_c_quits_but_c_clears() {
        let controller = Controller::new(&ViewerConfig::default());
        assert_eq!(
            controller.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Message::Quit)
        );
        assert_eq!(controller.handle_key(key(KeyCode::Char('c'))), Some(Message::ClearSearch));
    }
}
