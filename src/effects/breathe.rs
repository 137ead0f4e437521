use palette::Srgb;

use crate::effects::LightingEffect;
use crate::waveform;

pub struct Breathe {
    base: Srgb<u8>,
    half_cycle: u64,
    step: u64,
}

impl Breathe {
    pub fn new(base: Srgb<u8>, total_steps: u64) -> Breathe {
        Breathe {
            base,
            half_cycle: (total_steps / 2).max(1),
            step: 0,
        }
    }
}

impl LightingEffect for Breathe {
    fn step(&mut self) -> Srgb<u8> {
        let brightness = waveform::brightness(self.step, self.half_cycle);
        self.step = (self.step + 1) % (2 * self.half_cycle);
        waveform::scale_color(self.base, brightness)
    }
}
