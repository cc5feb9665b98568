//! Polling keyboard source backed by `GetAsyncKeyState`.

use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;

use crate::input::keys::{KeyCode, KeySource};

/// Reports the physical state of one key, regardless of which window has focus.
#[derive(Clone, Copy, Debug)]
pub struct AsyncKeyPoller {
    key: KeyCode,
}

impl AsyncKeyPoller {
    pub fn new(key: KeyCode) -> Self {
        Self { key }
    }
}

impl KeySource for AsyncKeyPoller {
    fn is_pressed(&mut self) -> bool {
        // High bit set means the key is currently down
        let state = unsafe { GetAsyncKeyState(self.key.0 as i32) };
        (state as u16 & 0x8000) != 0
    }
}
