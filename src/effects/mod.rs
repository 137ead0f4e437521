pub(crate) mod breathe;
pub(crate) mod staticcolor;

use palette::Srgb;
use serde::Deserialize;

use crate::effects::breathe::Breathe;
use crate::effects::staticcolor::StaticColor;

pub trait LightingEffect: Send {
    fn step(&mut self) -> Srgb<u8>;
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EffectKind {
    #[default]
    Breathe,
    Static,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    pub period_secs: f32,
    pub frame_rate: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectSpec {
    pub color_name: String,
    pub color: Srgb<u8>,
    pub addresses: Vec<usize>,
    pub timing: Timing,
    pub kind: EffectKind,
}

#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error("Color '{name}' not recognized. Available colors: {available}")]
    UnknownColor { name: String, available: String },

    #[error("No LED addresses given")]
    NoAddresses,

    #[error("Invalid timing: period {period_secs}s at {frame_rate} fps")]
    InvalidTiming { period_secs: f32, frame_rate: f32 },

    #[error("Shutting down, no new effects are started")]
    ShutDown,

    #[error("Cannot spawn effect thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl Timing {
    pub fn validate(self) -> Result<Timing, EffectError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if valid(self.period_secs) && valid(self.frame_rate) {
            Ok(self)
        } else {
            Err(EffectError::InvalidTiming {
                period_secs: self.period_secs,
                frame_rate: self.frame_rate,
            })
        }
    }

    pub fn total_steps(&self) -> u64 {
        ((self.period_secs * self.frame_rate).round() as u64).max(2)
    }
}

impl EffectSpec {
    pub fn build(&self) -> Box<dyn LightingEffect> {
        match self.kind {
            EffectKind::Breathe => Box::new(Breathe::new(self.color, self.timing.total_steps())),
            EffectKind::Static => Box::new(StaticColor::new(self.color)),
        }
    }
}
