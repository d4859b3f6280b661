//! Component trait: the interface every UI panel implements.
//!
//! Components own their view state (cursor, scroll) and read everything else
//! from `AppState`. They return `Vec<Action>` instead of touching the node.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;

pub trait Component {
    fn id(&self) -> ComponentId;

    /// Only called for keys the App did not consume globally.
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action>;

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState);
}
