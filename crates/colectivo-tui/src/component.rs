//! Component trait implemented by each panel and overlay.
//!
//! A component keeps its own view state (cursor, scroll, draft), reads the
//! rest from `AppState`, and asks for changes by returning `Action`s.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;

pub trait Component {
    fn id(&self) -> ComponentId;

    /// Keys reach a component only while it has focus, or while it is the
    /// open modal.
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action>;

    /// UI tick, every 100 ms.  Animations live here.
    fn tick(&mut self, _state: &AppState) -> Vec<Action> {
        Vec::new()
    }

    /// An action the App wants this component to see, focused or not.
    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        Vec::new()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState);
}
