use std::collections::BTreeMap;

use palette::Srgb;

use crate::effects::EffectError;

pub const BLACK: Srgb<u8> = Srgb::new(0, 0, 0);

#[derive(Clone, Debug)]
pub struct Palette {
    colors: BTreeMap<String, Srgb<u8>>,
}

impl Palette {
    pub fn new<I, S>(colors: I) -> Palette
    where
        I: IntoIterator<Item = (S, [u8; 3])>,
        S: Into<String>,
    {
        Palette {
            colors: colors
                .into_iter()
                .map(|(name, [r, g, b])| (name.into(), Srgb::new(r, g, b)))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Result<Srgb<u8>, EffectError> {
        self.colors
            .get(name)
            .copied()
            .ok_or_else(|| EffectError::UnknownColor {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.colors.keys().map(String::as_str).collect()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::new([
            ("Orange", [255, 165, 0]),
            ("White", [255, 255, 255]),
            ("Blue", [0, 0, 255]),
            ("Green", [0, 255, 0]),
            ("Red", [255, 0, 0]),
            ("Purple", [128, 0, 128]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_lookup() {
        let palette = Palette::default();
        assert_eq!(palette.get("Orange").unwrap(), Srgb::new(255, 165, 0));
        assert_eq!(palette.get("Purple").unwrap(), Srgb::new(128, 0, 128));
        assert_eq!(palette.names().len(), 6);
    }

    #[test]
    fn unknown_color_is_rejected() {
        let palette = Palette::new([("Red", [255, 0, 0])]);
        match palette.get("red") {
            Err(EffectError::UnknownColor { name, available }) => {
                assert_eq!(name, "red");
                assert_eq!(available, "Red");
            }
            other => panic!("unexpected lookup result: {other:?}"),
        }
        assert!(palette.get("Magenta").is_err());
    }
}
