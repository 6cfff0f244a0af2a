/// Keyboard state for the room walker.
///
/// Movement is level-triggered (held keys), actions are edge-triggered.
/// Terminals rarely report key releases, so a key counts as held until
/// no Press/Repeat event has arrived for `HOLD_TIMEOUT`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT_KEYS: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('h')];
const RIGHT_KEYS: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('l')];
const ACTION_KEYS: [KeyCode; 4] = [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('k'), KeyCode::Enter];

/// One tick's worth of player intent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Intent {
    /// -1, 0 or 1.
    pub dx: i32,
    pub action: bool,
    pub toggle_map: bool,
    pub quit: bool,
}

pub struct InputState {
    last_active: HashMap<KeyCode, Instant>,
    fresh_presses: Vec<KeyCode>,
    raw_events: Vec<KeyEvent>,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Read every pending terminal event without blocking.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            self.raw_events.push(key);
            if key.kind == KeyEventKind::Release {
                self.last_active.remove(&key.code);
                continue;
            }
            if !self.is_held(key.code) {
                self.fresh_presses.push(key.code);
            }
            self.last_active.insert(key.code, Instant::now());
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code).is_some_and(|t| t.elapsed() < HOLD_TIMEOUT)
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL) && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    /// Fold the current key state into an `Intent`.
    pub fn intent(&self) -> Intent {
        let left = self.any_held(&LEFT_KEYS);
        let right = self.any_held(&RIGHT_KEYS);
        Intent {
            dx: right as i32 - left as i32,
            action: self.any_pressed(&ACTION_KEYS),
            toggle_map: self.was_pressed(KeyCode::Char('m')) || self.was_pressed(KeyCode::Tab),
            quit: self.ctrl_c_pressed() || self.was_pressed(KeyCode::Esc) || self.was_pressed(KeyCode::Char('q')),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut InputState, code: KeyCode) {
        input.fresh_presses.push(code);
        input.last_active.insert(code, Instant::now());
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::Left);
        press(&mut input, KeyCode::Char('d'));
        assert_eq!(input.intent().dx, 0);
    }

    #[test]
    fn held_key_moves_fresh_key_acts() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::Right);
        press(&mut input, KeyCode::Up);
        let intent = input.intent();
        assert_eq!(intent.dx, 1);
        assert!(intent.action);
        assert!(!intent.quit);

        // Still held next frame, but no longer a fresh press.
        input.fresh_presses.clear();
        let intent = input.intent();
        assert_eq!(intent.dx, 1);
        assert!(!intent.action);
    }

    #[test]
    fn escape_quits() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::Esc);
        assert!(input.intent().quit);
    }
}
