use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use palette::Srgb;
use rosc::{encoder, OscMessage, OscPacket, OscType};

use crate::sink::{PixelSink, SinkError};

const UNIVERSE_SIZE: usize = 512;
const PIXELS_PER_UNIVERSE: usize = UNIVERSE_SIZE / 3;

pub struct OlaOutput {
    sock: UdpSocket,
    first_universe: u16,
    buffer: Vec<u8>,
}

impl OlaOutput {
    pub fn new(target_addr: SocketAddr, first_universe: u16) -> Result<Self, SinkError> {
        let our_addr = match target_addr {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let sock = UdpSocket::bind(our_addr)?;
        // Fails early when there is no route to the daemon
        sock.connect(target_addr)?;
        log::info!("Sending DMX to OLA at {target_addr}, starting at universe {first_universe}");

        Ok(OlaOutput {
            sock,
            first_universe,
            buffer: vec![0; UNIVERSE_SIZE],
        })
    }

    pub fn universe_count(pixel_count: usize) -> usize {
        pixel_count.div_ceil(PIXELS_PER_UNIVERSE).max(1)
    }

    fn set_rgb(&mut self, start_channel: usize, color: Srgb<u8>) {
        let (r, g, b) = color.into_components();
        self.buffer[start_channel..start_channel + 3].copy_from_slice(&[r, g, b]);
    }

    fn send_universe(&self, universe: usize) -> Result<(), SinkError> {
        let msg_buf = encoder::encode(&OscPacket::Message(OscMessage {
            addr: format!("/dmx/universe/{}", self.first_universe as usize + universe),
            args: vec![OscType::Blob(self.buffer.clone())],
        }))
        .map_err(|err| SinkError::Encode(format!("{err:?}")))?;
        self.sock.send(&msg_buf)?;
        Ok(())
    }

    fn blackout(&mut self) {
        self.buffer.fill(0);
    }
}

impl PixelSink for OlaOutput {
    fn flush(&mut self, pixels: &[Srgb<u8>]) -> Result<(), SinkError> {
        for (universe, chunk) in pixels.chunks(PIXELS_PER_UNIVERSE).enumerate() {
            self.blackout();
            for (i, color) in chunk.iter().enumerate() {
                self.set_rgb(i * 3, *color);
            }
            self.send_universe(universe)?;
        }
        Ok(())
    }
}
