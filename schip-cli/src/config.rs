//! Run configuration, loaded from YAML.
use std::path::Path;

use schip::{
    prelude::{Chip8Conf, KeyCode, Quirks},
    Hz,
};
use serde::Deserialize;

use crate::error::AppError;

/// Everything that can be tuned for a headless run.
///
/// ```yaml
/// clock_hz: 700
/// frames: 600
/// throttle: true
/// seed: 42
/// quirks:
///   shift_vx: false
/// input:
///   - { frame: 30, key: 5, pressed: true }
///   - { frame: 32, key: 5, pressed: false }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub clock_hz: u64,
    pub quirks: Quirks,
    /// Number of 60 Hz frames to run before printing the display.
    pub frames: usize,
    /// Run in real time instead of as fast as possible.
    pub throttle: bool,
    pub seed: Option<u64>,
    /// Scripted keypad input.
    pub input: Vec<InputEvent>,
}

/// Key state change applied before the given frame runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputEvent {
    pub frame: usize,
    pub key: KeyCode,
    #[serde(default = "default_pressed")]
    pub pressed: bool,
}

fn default_pressed() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clock_hz: Hz::default().0,
            quirks: Quirks::default(),
            frames: 120,
            throttle: false,
            seed: None,
            input: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_file(filepath: impl AsRef<Path>) -> Result<Self, AppError> {
        let file = std::fs::File::open(filepath.as_ref())?;
        let config: Config = serde_yaml::from_reader(file)?;
        log::debug!("loaded config: {:#?}", config);
        Ok(config)
    }

    #[cfg(test)]
    pub fn parse(source: &str) -> Result<Self, AppError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn vm_conf(&self) -> Chip8Conf {
        Chip8Conf {
            clock_frequency: Hz(self.clock_hz),
            quirks: self.quirks,
            seed: self.seed,
        }
    }

    /// Input events scheduled for the given frame.
    pub fn input_at(&self, frame: usize) -> impl Iterator<Item = &InputEvent> {
        self.input.iter().filter(move |event| event.frame == frame)
    }
}
