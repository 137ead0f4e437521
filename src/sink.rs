use palette::Srgb;

pub trait PixelSink: Send {
    fn flush(&mut self, pixels: &[Srgb<u8>]) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error while sending frame: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot encode frame: {0}")]
    Encode(String),
}

#[derive(Default)]
pub struct DryRunSink {
    frames: u64,
}

impl PixelSink for DryRunSink {
    fn flush(&mut self, pixels: &[Srgb<u8>]) -> Result<(), SinkError> {
        self.frames += 1;
        if log::log_enabled!(log::Level::Trace) {
            let lit: Vec<String> = pixels
                .iter()
                .enumerate()
                .filter(|(_, p)| p.red != 0 || p.green != 0 || p.blue != 0)
                .map(|(i, p)| format!("{i}=({},{},{})", p.red, p.green, p.blue))
                .collect();
            log::trace!("frame {}: [{}]", self.frames, lit.join(" "));
        }
        Ok(())
    }
}
