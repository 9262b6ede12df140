//! Player notifications and speed presets

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::replay::cache::EventHistory;

/// Supported playback rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum PlaybackSpeed {
    Half,
    #[default]
    Normal,
    OneAndHalf,
    Double,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 4] = [
        PlaybackSpeed::Half,
        PlaybackSpeed::Normal,
        PlaybackSpeed::OneAndHalf,
        PlaybackSpeed::Double,
    ];

    pub fn factor(self) -> f64 {
        match self {
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::OneAndHalf => 1.5,
            PlaybackSpeed::Double => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("Unsupported playback speed {0} (expected 0.5, 1, 1.5 or 2)")]
pub struct UnsupportedSpeed(pub f64);

impl TryFrom<f64> for PlaybackSpeed {
    type Error = UnsupportedSpeed;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        PlaybackSpeed::ALL
            .into_iter()
            .find(|speed| speed.factor() == value)
            .ok_or(UnsupportedSpeed(value))
    }
}

impl From<PlaybackSpeed> for f64 {
    fn from(speed: PlaybackSpeed) -> Self {
        speed.factor()
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.factor())
    }
}

/// Notification for UI collaborators, drained with `Player::poll_events`
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Status { playing: bool },
    Speed { speed: PlaybackSpeed },
    TimeUpdate,
    Error { error: String },
    /// A named custom event stream advanced
    Custom(EventHistory),
}
