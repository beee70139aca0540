/// Key bindings for the viewer
use crossterm::event::KeyCode;
use rotary_core::{PartId, PartRegistry};

/// Degrees per step added or removed by the speed keys
pub const SPEED_STEP: f64 = 5.0;
/// Camera orbit per key press, radians
pub const ORBIT_STEP: f32 = 0.1;

/// Visibility checkbox for one part.
///
/// Holds the part id by value so every binding toggles its own part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityToggle {
    pub part: PartId,
}

impl VisibilityToggle {
    /// Flip the part's visibility; returns the new state
    pub fn apply(self, registry: &mut PartRegistry) -> Option<bool> {
        let part = registry.get_mut(self.part)?;
        part.visible = !part.visible;
        Some(part.visible)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ToggleAnimation,
    AdjustSpeed(f64),
    ToggleExplode,
    ToggleVisibility(VisibilityToggle),
    Orbit { yaw: f32, pitch: f32 },
    Zoom(f32),
    ToggleProjection,
    Quit,
}

/// Maps keys to commands; digits `1`-`9` select parts in load order
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    visibility: Vec<VisibilityToggle>,
}

impl KeyMap {
    pub fn for_registry(registry: &PartRegistry) -> Self {
        Self {
            visibility: registry
                .ids()
                .take(9)
                .map(|part| VisibilityToggle { part })
                .collect(),
        }
    }

    /// Hotkey shown next to a part in the overlay
    pub fn hotkey(&self, part: PartId) -> Option<char> {
        self.visibility
            .iter()
            .position(|toggle| toggle.part == part)
            .and_then(|i| char::from_digit(i as u32 + 1, 10))
    }

    pub fn command(&self, code: KeyCode) -> Option<Command> {
        let command = match code {
            KeyCode::Char(' ') => Command::ToggleAnimation,
            KeyCode::Char('+') | KeyCode::Char('=') => Command::AdjustSpeed(SPEED_STEP),
            KeyCode::Char('-') | KeyCode::Char('_') => Command::AdjustSpeed(-SPEED_STEP),
            KeyCode::Char('x') => Command::ToggleExplode,
            KeyCode::Char('p') => Command::ToggleProjection,
            KeyCode::Char('z') => Command::Zoom(0.9),
            KeyCode::Char('c') => Command::Zoom(1.1),
            KeyCode::Char('w') | KeyCode::Up => Command::Orbit {
                yaw: 0.0,
                pitch: ORBIT_STEP,
            },
            KeyCode::Char('s') | KeyCode::Down => Command::Orbit {
                yaw: 0.0,
                pitch: -ORBIT_STEP,
            },
            KeyCode::Char('a') | KeyCode::Left => Command::Orbit {
                yaw: -ORBIT_STEP,
                pitch: 0.0,
            },
            KeyCode::Char('d') | KeyCode::Right => Command::Orbit {
                yaw: ORBIT_STEP,
                pitch: 0.0,
            },
            KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
            KeyCode::Char(c @ '1'..='9') => {
                let index = c.to_digit(10)? as usize - 1;
                Command::ToggleVisibility(*self.visibility.get(index)?)
            }
            _ => return None,
        };
        Some(command)
    }
}
