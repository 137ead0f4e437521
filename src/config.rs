use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use config_file::{ConfigFileError, FromConfigFile};
use serde::Deserialize;

use crate::colors::Palette;
use crate::effects::{EffectError, EffectKind, Timing};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot load {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: ConfigFileError,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),

    #[error(transparent)]
    Effect(#[from] EffectError),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OutputConfig {
    Ola {
        address: SocketAddr,
        #[serde(default)]
        universe: u16,
    },
    DryRun,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig::Ola {
            address: SocketAddr::from(([127, 0, 0, 1], 7770)),
            universe: 0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pixel_count: usize,
    pub period_secs: f32,
    pub frame_rate: f32,
    pub effect: EffectKind,
    pub item_color: String,
    pub order_color: String,
    pub inventory: Option<PathBuf>,
    pub output: OutputConfig,
    pub palette: Option<BTreeMap<String, [u8; 3]>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pixel_count: 55,
            period_secs: 5.0,
            frame_rate: 30.0,
            effect: EffectKind::Breathe,
            item_color: "Green".to_string(),
            order_color: "Blue".to_string(),
            inventory: None,
            output: OutputConfig::default(),
            palette: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        Config::from_config_file(path).map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn palette(&self) -> Palette {
        match &self.palette {
            Some(colors) => Palette::new(colors.clone()),
            None => Palette::default(),
        }
    }

    pub fn timing(&self) -> Timing {
        Timing {
            period_secs: self.period_secs,
            frame_rate: self.frame_rate,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pixel_count == 0 {
            return Err(ConfigError::Invalid("pixel_count must be at least 1".to_string()));
        }
        self.timing().validate()?;

        let palette = self.palette();
        palette.get(&self.item_color)?;
        palette.get(&self.order_color)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(name: &str, contents: &str) -> Result<Config, ConfigError> {
        let path = std::env::temp_dir().join(format!(
            "lagerlicht-{name}-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        let config = Config::load(&path);
        std::fs::remove_file(&path).unwrap();
        config
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.timing().total_steps(), 150);
        assert!(config.palette().get("Orange").is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = load_str(
            "partial",
            "pixel_count = 120\neffect = \"static\"\n\n[output]\nkind = \"dry-run\"\n",
        )
        .unwrap();

        assert_eq!(config.pixel_count, 120);
        assert_eq!(config.effect, EffectKind::Static);
        assert_eq!(config.output, OutputConfig::DryRun);
        assert_eq!(config.frame_rate, 30.0);
        assert_eq!(config.item_color, "Green");
    }

    #[test]
    fn custom_palette_and_output() {
        let config = load_str(
            "palette",
            concat!(
                "item_color = \"Teal\"\n",
                "order_color = \"Teal\"\n",
                "[output]\n",
                "kind = \"ola\"\n",
                "address = \"10.0.0.5:7770\"\n",
                "universe = 2\n",
                "[palette]\n",
                "Teal = [0, 128, 128]\n",
            ),
        )
        .unwrap();

        config.validate().unwrap();
        assert!(config.palette().get("Orange").is_err());
        assert_eq!(
            config.output,
            OutputConfig::Ola {
                address: "10.0.0.5:7770".parse().unwrap(),
                universe: 2,
            }
        );
    }

    #[test]
    fn default_color_must_exist() {
        let config = Config {
            order_color: "Magenta".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Effect(EffectError::UnknownColor { .. }))
        ));
    }

    #[test]
    fn rejects_broken_settings() {
        let config = Config {
            pixel_count: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            frame_rate: 0.0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Effect(EffectError::InvalidTiming { .. }))
        ));
    }
}
