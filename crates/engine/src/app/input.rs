use super::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    BuySmallChum,
    BuyLargeChum,
    BuyCod,
    BuyBass,
    BuyJanitor,
    BuyCarnivore,
    BuyWin,
    Quit,
}

const ACTION_COUNT: usize = 8;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::BuySmallChum,
        InputAction::BuyLargeChum,
        InputAction::BuyCod,
        InputAction::BuyBass,
        InputAction::BuyJanitor,
        InputAction::BuyCarnivore,
        InputAction::BuyWin,
        InputAction::Quit,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::BuySmallChum => 0,
            InputAction::BuyLargeChum => 1,
            InputAction::BuyCod => 2,
            InputAction::BuyBass => 3,
            InputAction::BuyJanitor => 4,
            InputAction::BuyCarnivore => 5,
            InputAction::BuyWin => 6,
            InputAction::Quit => 7,
        }
    }

    pub fn from_key(key: KeyCode) -> Self {
        match key {
            KeyCode::Q => InputAction::BuySmallChum,
            KeyCode::W => InputAction::BuyLargeChum,
            KeyCode::Digit1 => InputAction::BuyCod,
            KeyCode::Digit2 => InputAction::BuyBass,
            KeyCode::Digit3 => InputAction::BuyJanitor,
            KeyCode::Digit4 => InputAction::BuyCarnivore,
            KeyCode::Enter => InputAction::BuyWin,
            KeyCode::Escape => InputAction::Quit,
        }
    }
}

/// Physical keys the tank reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Q,
    W,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Enter,
    Escape,
}

/// Raw device transitions delivered by an input source, before edge detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInputEvent {
    KeyPressed(KeyCode),
    KeyReleased(KeyCode),
    CursorMoved(Vec2),
    CursorLeft,
    PointerPressed,
    PointerReleased,
    CloseRequested,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    pressed: ActionStates,
    cursor_position_px: Option<Vec2>,
    click_pressed: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// True only on the tick the action's key went down.
    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.pressed.set(action, true);
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_click_pressed(mut self, click_pressed: bool) -> Self {
        self.click_pressed = click_pressed;
        self
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn click_pressed(&self) -> bool {
        self.click_pressed
    }

    /// Cursor position of a click that started this tick.
    pub fn click_position(&self) -> Option<Vec2> {
        if self.click_pressed {
            self.cursor_position_px
        } else {
            None
        }
    }
}

/// Folds raw transitions into edge-triggered per-tick snapshots.
#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    quit_requested: bool,
    keys_down: ActionStates,
    pressed_edges: ActionStates,
    cursor_position_px: Option<Vec2>,
    pointer_is_down: bool,
    click_pressed_edge: bool,
}

impl InputCollector {
    pub(crate) fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub(crate) fn handle_event(&mut self, event: RawInputEvent) {
        match event {
            RawInputEvent::KeyPressed(key) => self.handle_key_state(key, true),
            RawInputEvent::KeyReleased(key) => self.handle_key_state(key, false),
            RawInputEvent::CursorMoved(position) => self.cursor_position_px = Some(position),
            RawInputEvent::CursorLeft => self.cursor_position_px = None,
            RawInputEvent::PointerPressed => {
                if !self.pointer_is_down {
                    self.click_pressed_edge = true;
                }
                self.pointer_is_down = true;
            }
            RawInputEvent::PointerReleased => self.pointer_is_down = false,
            RawInputEvent::CloseRequested => self.quit_requested = true,
        }
    }

    fn handle_key_state(&mut self, key: KeyCode, is_pressed: bool) {
        let action = InputAction::from_key(key);
        if is_pressed {
            if !self.keys_down.is_down(action) {
                self.pressed_edges.set(action, true);
            }
            if action == InputAction::Quit {
                self.quit_requested = true;
            }
        }
        self.keys_down.set(action, is_pressed);
    }

    pub(crate) fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            quit_requested: self.quit_requested,
            pressed: self.pressed_edges,
            cursor_position_px: self.cursor_position_px,
            click_pressed: self.click_pressed_edge,
        };
        self.pressed_edges = ActionStates::default();
        self.click_pressed_edge = false;
        snapshot
    }
}
