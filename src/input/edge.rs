//! Rising-edge detection over a sampled key state.

/// Detector state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EdgeState {
    /// Key is up; the next press fires.
    #[default]
    Idle,
    /// Key is down and has already fired.
    Held,
}

/// Turns a polled "key is down" boolean into one trigger per physical press.
#[derive(Clone, Debug, Default)]
pub struct KeyEdgeDetector {
    state: EdgeState,
}

impl KeyEdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one sample. Returns true only on the `Idle -> Held` transition.
    pub fn update(&mut self, pressed: bool) -> bool {
        match (self.state, pressed) {
            (EdgeState::Idle, true) => {
                self.state = EdgeState::Held;
                true
            }
            (EdgeState::Held, false) => {
                self.state = EdgeState::Idle;
                false
            }
            _ => false,
        }
    }

    pub fn state(&self) -> EdgeState {
        self.state
    }
}
