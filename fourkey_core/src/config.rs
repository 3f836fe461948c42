use std::{fs, path::Path};

use fourkey_schema::LANE_COUNT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gameplay::JudgementTier;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid judgement windows: {0}")]
    Windows(String),
    #[error("invalid key bindings: {0}")]
    KeyBindings(String),
    #[error("invalid scroll speed: {0}")]
    ScrollSpeed(f64),
}

/// Half-widths in milliseconds of each judgement tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JudgementWindows {
    pub perfect: f64,
    pub great: f64,
    pub good: f64,
    pub bad: f64,
    pub miss: f64,
    /// How long a note stays judgeable after its time before it expires.
    pub max_window: f64,
}

impl JudgementWindows {
    pub const MANUAL: Self = Self {
        perfect: 22.0,
        great: 46.0,
        good: 86.0,
        bad: 136.0,
        miss: 180.0,
        max_window: 179.0,
    };

    pub const AUTO: Self = Self {
        perfect: 30.0,
        great: 200.0,
        good: 300.0,
        bad: 400.0,
        miss: 500.0,
        max_window: 1.0,
    };

    /// Tier for an absolute offset. Bounds are inclusive and checked tightest
    /// first; `None` past the miss window.
    pub fn classify(&self, diff: f64) -> Option<JudgementTier> {
        let diff = diff.abs();
        if !diff.is_finite() {
            return None;
        }
        JudgementTier::ALL
            .into_iter()
            .zip([self.perfect, self.great, self.good, self.bad, self.miss])
            .find(|(_, limit)| diff <= *limit)
            .map(|(tier, _)| tier)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tiers = [self.perfect, self.great, self.good, self.bad, self.miss];
        if tiers.iter().chain([&self.max_window]).any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::Windows("windows must be finite and non-negative".into()));
        }
        if tiers.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(ConfigError::Windows(format!(
                "tiers must widen from perfect to miss, got {tiers:?}"
            )));
        }
        Ok(())
    }
}

impl Default for JudgementWindows {
    fn default() -> Self {
        Self::MANUAL
    }
}

/// Lowest scroll speed in px/s regardless of the user setting.
pub const MIN_SCROLL_PX_PER_SEC: f64 = 200.0;
const SCROLL_SETTING_SCALE: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    pub auto_play: bool,
    /// User-facing speed setting, see [`GameplayConfig::scroll_px_per_sec`].
    pub scroll_speed: f64,
    pub show_sv: bool,
    pub bpm_scaling: bool,
    /// Key names for lanes 0..4, matched case-insensitively.
    pub key_bindings: [String; LANE_COUNT],
    /// Replaces the manual/auto preset when set.
    pub windows: Option<JudgementWindows>,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            auto_play: false,
            scroll_speed: 20.0,
            show_sv: true,
            bpm_scaling: false,
            key_bindings: ["d", "f", "j", "k"].map(String::from),
            windows: None,
        }
    }
}

impl GameplayConfig {
    pub fn from_json_str(src: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&src)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scroll_speed.is_finite() {
            return Err(ConfigError::ScrollSpeed(self.scroll_speed));
        }
        if let Some(windows) = &self.windows {
            windows.validate()?;
        }
        for (i, key) in self.key_bindings.iter().enumerate() {
            if key.trim().is_empty() {
                return Err(ConfigError::KeyBindings(format!("lane {i} has no key")));
            }
            if self.key_bindings[..i].iter().any(|other| other.eq_ignore_ascii_case(key)) {
                return Err(ConfigError::KeyBindings(format!("key {key:?} is bound twice")));
            }
        }
        Ok(())
    }

    /// Active window set: the override, else the preset for the play mode.
    pub fn windows(&self) -> JudgementWindows {
        self.windows.unwrap_or(if self.auto_play {
            JudgementWindows::AUTO
        } else {
            JudgementWindows::MANUAL
        })
    }

    pub fn scroll_px_per_sec(&self) -> f64 {
        (self.scroll_speed * SCROLL_SETTING_SCALE).max(MIN_SCROLL_PX_PER_SEC)
    }

    pub fn lane_for_key(&self, key: &str) -> Option<usize> {
        self.key_bindings.iter().position(|k| k.eq_ignore_ascii_case(key))
    }
}
