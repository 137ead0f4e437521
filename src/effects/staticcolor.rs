use palette::Srgb;

use crate::effects::LightingEffect;

pub struct StaticColor {
    color: Srgb<u8>,
}

impl StaticColor {
    pub fn new(color: Srgb<u8>) -> StaticColor {
        StaticColor { color }
    }
}

impl LightingEffect for StaticColor {
    fn step(&mut self) -> Srgb<u8> {
        self.color
    }
}
