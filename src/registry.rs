use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::colors::Palette;
use crate::effects::{EffectError, EffectKind, EffectSpec, Timing};
use crate::runner::{EffectHandle, EffectId, EffectState, RunningEffect};
use crate::surface::{DeviceSurface, SurfaceError};

#[derive(Clone, Debug)]
pub struct EffectRequest {
    pub color: String,
    pub addresses: Vec<usize>,
    pub timing: Timing,
    pub kind: EffectKind,
}

impl EffectRequest {
    pub fn new(color: impl Into<String>, addresses: Vec<usize>, timing: Timing) -> Self {
        EffectRequest {
            color: color.into(),
            addresses,
            timing,
            kind: EffectKind::default(),
        }
    }

    pub fn kind(mut self, kind: EffectKind) -> Self {
        self.kind = kind;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectInfo {
    pub id: EffectId,
    pub channel: Option<String>,
    pub color_name: String,
    pub addresses: Vec<usize>,
    pub state: EffectState,
}

pub struct EffectRegistry {
    surface: Arc<DeviceSurface>,
    palette: Palette,
    // Serializes start, stop and stop_all so replacing a channel cannot race
    start_lock: Mutex<()>,
    state: Mutex<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    closed: bool,
    last_id: EffectId,
    effects: BTreeMap<EffectId, RunningEffect>,
    channels: HashMap<String, EffectId>,
}

impl RegistryState {
    fn remove(&mut self, id: EffectId) -> Option<RunningEffect> {
        let effect = self.effects.remove(&id)?;
        if let Some(channel) = effect.channel() {
            if self.channels.get(channel) == Some(&id) {
                self.channels.remove(channel);
            }
        }
        Some(effect)
    }
}

impl EffectRegistry {
    pub fn new(surface: Arc<DeviceSurface>, palette: Palette) -> EffectRegistry {
        EffectRegistry {
            surface,
            palette,
            start_lock: Mutex::new(()),
            state: Mutex::new(RegistryState::default()),
        }
    }

    pub fn surface(&self) -> &DeviceSurface {
        &self.surface
    }

    fn validate(&self, request: EffectRequest) -> Result<EffectSpec, EffectError> {
        let color = self.palette.get(&request.color)?;
        if request.addresses.is_empty() {
            return Err(EffectError::NoAddresses);
        }
        let timing = request.timing.validate()?;

        Ok(EffectSpec {
            color_name: request.color,
            color,
            addresses: request.addresses,
            timing,
            kind: request.kind,
        })
    }

    pub fn start(
        &self,
        request: EffectRequest,
        channel: Option<&str>,
    ) -> Result<EffectHandle, EffectError> {
        let spec = self.validate(request)?;
        let _start = self.start_lock.lock();
        if self.state.lock().closed {
            return Err(EffectError::ShutDown);
        }

        if let Some(channel) = channel {
            let previous = {
                let mut state = self.state.lock();
                let id = state.channels.get(channel).copied();
                id.and_then(|id| state.remove(id))
            };
            if let Some(previous) = previous {
                log::info!(
                    "Replacing effect {} on channel '{channel}'",
                    previous.handle().id()
                );
                self.drain(previous);
            }
        }

        let id = {
            let mut state = self.state.lock();
            state.last_id += 1;
            state.last_id
        };

        log::info!(
            "Starting effect {id}: {} {:?} on {:?}",
            spec.color_name,
            spec.kind,
            spec.addresses
        );
        let effect = RunningEffect::spawn(
            id,
            spec,
            channel.map(str::to_string),
            Arc::clone(&self.surface),
        )?;
        let handle = effect.handle().clone();

        let mut state = self.state.lock();
        if let Some(channel) = channel {
            state.channels.insert(channel.to_string(), id);
        }
        state.effects.insert(id, effect);

        Ok(handle)
    }

    /// Stops one effect and waits until its LEDs are cleared. Returns false
    /// if the effect is no longer tracked.
    pub fn stop(&self, handle: &EffectHandle) -> bool {
        self.stop_id(handle.id())
    }

    pub fn stop_id(&self, id: EffectId) -> bool {
        let _start = self.start_lock.lock();
        let effect = self.state.lock().remove(id);
        match effect {
            Some(effect) => {
                log::info!("Stopping effect {id}");
                self.drain(effect);
                true
            }
            None => {
                log::debug!("Effect {id} is not running");
                false
            }
        }
    }

    pub fn stop_all(&self) -> Result<usize, SurfaceError> {
        let _start = self.start_lock.lock();
        self.drain_all()
    }

    /// Like `stop_all`, but every later `start` fails with
    /// `EffectError::ShutDown`.
    pub fn shutdown(&self) -> Result<usize, SurfaceError> {
        let _start = self.start_lock.lock();
        self.state.lock().closed = true;
        self.drain_all()
    }

    fn drain_all(&self) -> Result<usize, SurfaceError> {
        let effects: Vec<RunningEffect> = {
            let mut state = self.state.lock();
            state.channels.clear();
            std::mem::take(&mut state.effects).into_values().collect()
        };

        // Signal everyone first so they wind down in parallel
        for effect in &effects {
            effect.cancel();
        }
        let count = effects.len();
        for effect in effects {
            effect.join(&self.surface);
        }
        if count > 0 {
            log::info!("Stopped {count} effect(s)");
        }

        self.surface.clear_all()?;
        Ok(count)
    }

    fn drain(&self, effect: RunningEffect) {
        effect.cancel();
        effect.join(&self.surface);
    }

    pub fn len(&self) -> usize {
        self.state.lock().effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_tracked(&self, handle: &EffectHandle) -> bool {
        self.state.lock().effects.contains_key(&handle.id())
    }

    pub fn active(&self) -> Vec<EffectInfo> {
        self.state
            .lock()
            .effects
            .values()
            .map(|effect| EffectInfo {
                id: effect.handle().id(),
                channel: effect.channel().map(str::to_string),
                color_name: effect.spec().color_name.clone(),
                addresses: effect.spec().addresses.clone(),
                state: effect.handle().state(),
            })
            .collect()
    }
}

impl Drop for EffectRegistry {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            log::warn!("Final blackout failed: {err}");
        }
    }
}
