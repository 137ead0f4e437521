use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::cancel::CancelToken;
use crate::effects::{EffectError, EffectSpec};
use crate::intervaltimer::IntervalTimer;
use crate::surface::DeviceSurface;

pub type EffectId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectState {
    Running,
    Stopping,
    Stopped,
}

#[derive(Clone, Debug)]
pub struct EffectHandle {
    id: EffectId,
    state: Arc<Mutex<EffectState>>,
}

impl EffectHandle {
    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn state(&self) -> EffectState {
        *self.state.lock()
    }
}

pub(crate) struct RunningEffect {
    handle: EffectHandle,
    spec: Arc<EffectSpec>,
    channel: Option<String>,
    cancel: CancelToken,
    thread: JoinHandle<()>,
}

impl RunningEffect {
    pub(crate) fn spawn(
        id: EffectId,
        spec: EffectSpec,
        channel: Option<String>,
        surface: Arc<DeviceSurface>,
    ) -> Result<RunningEffect, EffectError> {
        let handle = EffectHandle {
            id,
            state: Arc::new(Mutex::new(EffectState::Running)),
        };
        let spec = Arc::new(spec);
        let cancel = CancelToken::new();

        let thread = {
            let spec = Arc::clone(&spec);
            let cancel = cancel.clone();
            let state = Arc::clone(&handle.state);
            thread::Builder::new()
                .name(format!("effect-{id}"))
                .spawn(move || run(id, &spec, &surface, &cancel, &state))?
        };

        Ok(RunningEffect {
            handle,
            spec,
            channel,
            cancel,
            thread,
        })
    }

    pub(crate) fn handle(&self) -> &EffectHandle {
        &self.handle
    }

    pub(crate) fn spec(&self) -> &EffectSpec {
        &self.spec
    }

    pub(crate) fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub(crate) fn cancel(&self) {
        let mut state = self.handle.state.lock();
        if *state == EffectState::Running {
            *state = EffectState::Stopping;
        }
        self.cancel.cancel();
    }

    // A panicked effect never cleared its addresses
    pub(crate) fn join(self, surface: &DeviceSurface) {
        let id = self.handle.id;
        if self.thread.join().is_err() {
            log::error!("Effect {id} panicked, clearing its LEDs");
            if let Err(err) = surface.clear_pixels(&self.spec.addresses) {
                log::warn!("Effect {id}: cleanup failed: {err}");
            }
            *self.handle.state.lock() = EffectState::Stopped;
        }
        log::debug!("Effect {id} stopped");
    }
}

fn run(
    id: EffectId,
    spec: &EffectSpec,
    surface: &DeviceSurface,
    cancel: &CancelToken,
    state: &Mutex<EffectState>,
) {
    let mut effect = spec.build();
    let mut timer = IntervalTimer::new(
        spec.timing.frame_rate,
        log::log_enabled!(log::Level::Trace),
    );
    log::debug!("Effect {id} running, {:?} per frame", timer.interval());
    let mut reported_dark = false;

    while !cancel.is_cancelled() {
        let color = effect.step();
        if cancel.is_cancelled() {
            break;
        }

        match surface.set_pixels(&spec.addresses, color) {
            Ok(frame) if frame.written == 0 && !reported_dark => {
                log::warn!(
                    "Effect {id} lights nothing, {:?} are all off the strip",
                    frame.skipped
                );
                reported_dark = true;
            }
            Ok(_) => {}
            Err(err) => log::warn!("Effect {id}: {err}"),
        }

        if !timer.sleep_until_next_tick(cancel) {
            break;
        }
    }

    *state.lock() = EffectState::Stopping;
    if let Err(err) = surface.clear_pixels(&spec.addresses) {
        log::warn!("Effect {id}: cleanup failed: {err}");
    }
    *state.lock() = EffectState::Stopped;
}
