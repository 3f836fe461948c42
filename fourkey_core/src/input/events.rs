use fourkey_schema::Millis;
use serde::{Deserialize, Serialize};

use crate::gameplay::judge::Lane;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub lane: Lane,
    pub pressed: bool,
    /// Audio time of the transition.
    pub time_ms: Millis,
}

impl KeyEvent {
    pub fn down(lane: Lane, time_ms: Millis) -> Self {
        Self { lane, pressed: true, time_ms }
    }

    pub fn up(lane: Lane, time_ms: Millis) -> Self {
        Self { lane, pressed: false, time_ms }
    }
}
