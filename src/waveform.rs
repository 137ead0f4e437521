use std::f32::consts::PI;

use palette::Srgb;

pub fn brightness(step: u64, half_cycle: u64) -> f32 {
    let half_cycle = half_cycle.max(1);
    // Reducing first keeps the f32 argument small on long running effects
    let phase = (step % (2 * half_cycle)) as f32 / half_cycle as f32;
    (((PI * phase).sin() + 1.0) / 2.0).clamp(0.0, 1.0)
}

pub fn scale_color(base: Srgb<u8>, brightness: f32) -> Srgb<u8> {
    let brightness = brightness.clamp(0.0, 1.0);
    let scale = |channel: u8| (channel as f32 * brightness) as u8;
    Srgb::new(scale(base.red), scale(base.green), scale(base.blue))
}
