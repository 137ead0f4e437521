use palette::Srgb;
use parking_lot::Mutex;

use crate::colors::BLACK;
use crate::sink::{PixelSink, SinkError};

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("Flush failed, frame dropped: {0}")]
    Flush(#[from] SinkError),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FrameWrite {
    pub written: usize,
    pub skipped: Vec<usize>,
}

pub struct DeviceSurface {
    state: Mutex<SurfaceState>,
    pixel_count: usize,
}

struct SurfaceState {
    pixels: Vec<Srgb<u8>>,
    sink: Box<dyn PixelSink>,
}

impl DeviceSurface {
    pub fn new(pixel_count: usize, sink: Box<dyn PixelSink>) -> DeviceSurface {
        DeviceSurface {
            state: Mutex::new(SurfaceState {
                pixels: vec![BLACK; pixel_count],
                sink,
            }),
            pixel_count,
        }
    }

    pub fn len(&self) -> usize {
        self.pixel_count
    }

    pub fn pixel(&self, index: usize) -> Option<Srgb<u8>> {
        self.state.lock().pixels.get(index).copied()
    }

    pub fn snapshot(&self) -> Vec<Srgb<u8>> {
        self.state.lock().pixels.clone()
    }

    pub fn set_pixels(
        &self,
        addresses: &[usize],
        color: Srgb<u8>,
    ) -> Result<FrameWrite, SurfaceError> {
        let mut state = self.state.lock();
        let mut frame = FrameWrite::default();

        for &address in addresses {
            match state.pixels.get_mut(address) {
                Some(pixel) => {
                    *pixel = color;
                    frame.written += 1;
                }
                None => {
                    log::warn!(
                        "LED index {address} is out of range (0 to {})",
                        self.pixel_count.saturating_sub(1)
                    );
                    frame.skipped.push(address);
                }
            }
        }

        state.flush()?;
        Ok(frame)
    }

    pub fn clear_pixels(&self, addresses: &[usize]) -> Result<FrameWrite, SurfaceError> {
        self.set_pixels(addresses, BLACK)
    }

    pub fn clear_all(&self) -> Result<(), SurfaceError> {
        let mut state = self.state.lock();
        state.pixels.fill(BLACK);
        state.flush()?;
        Ok(())
    }
}

impl SurfaceState {
    fn flush(&mut self) -> Result<(), SinkError> {
        let SurfaceState { pixels, sink } = self;
        sink.flush(pixels)
    }
}
