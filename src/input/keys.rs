//! Key identifiers and key state sources.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ConfigError;

/// A Windows virtual-key code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const SPACE: KeyCode = KeyCode(0x20);
    pub const F12: KeyCode = KeyCode(0x7B);
}

impl FromStr for KeyCode {
    type Err = ConfigError;

    /// Parses names like `space`, `f5`, `a`, `7` or a raw `0x20` code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let unknown = || ConfigError::UnknownKey(s.to_string());

        let code = match name.as_str() {
            "space" => 0x20,
            "enter" | "return" => 0x0D,
            "tab" => 0x09,
            "escape" | "esc" => 0x1B,
            "backspace" => 0x08,
            "shift" => 0x10,
            "ctrl" | "control" => 0x11,
            "alt" => 0x12,
            _ => {
                if let Some(hex) = name.strip_prefix("0x") {
                    let code = u16::from_str_radix(hex, 16).map_err(|_| unknown())?;
                    if code == 0 || code > 0xFE {
                        return Err(unknown());
                    }
                    code
                } else if let Some(n) = name.strip_prefix('f').and_then(|n| n.parse::<u16>().ok())
                {
                    if !(1..=24).contains(&n) {
                        return Err(unknown());
                    }
                    0x70 + n - 1
                } else {
                    let mut chars = name.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c @ 'a'..='z'), None) => c.to_ascii_uppercase() as u16,
                        (Some(c @ '0'..='9'), None) => c as u16,
                        _ => return Err(unknown()),
                    }
                }
            }
        };
        Ok(KeyCode(code))
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Samples whether a key is currently down.
pub trait KeySource {
    fn is_pressed(&mut self) -> bool;
}

impl<K: KeySource + ?Sized> KeySource for Box<K> {
    fn is_pressed(&mut self) -> bool {
        (**self).is_pressed()
    }
}

/// Key state written by a listener thread and read by the capture loop.
///
/// The flag is the only state shared between the two threads.
#[derive(Clone, Debug, Default)]
pub struct SharedKeyState {
    down: Arc<AtomicBool>,
}

impl SharedKeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the listener on key-down / key-up notifications.
    pub fn set_pressed(&self, pressed: bool) {
        self.down.store(pressed, Ordering::SeqCst);
    }
}

impl KeySource for SharedKeyState {
    fn is_pressed(&mut self) -> bool {
        self.down.load(Ordering::SeqCst)
    }
}
