// Volkeys Capture State Machine
// Interactive recording of one binding from a live event stream

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

use crate::alert::{default_sink, AlertSink};
use crate::binding::{Binding, BindingError, Trigger};
use crate::input::{HookError, InputEvent, InputSource, Interest, RawKey};
use crate::key::{identity_of, KeyId, MouseButton, ScrollDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Collecting,
    Complete,
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("capture session has not produced a terminal input yet")]
    Incomplete,

    #[error("captured chord is not a valid binding: {0}")]
    Invalid(#[from] BindingError),

    #[error("input source shut down before a binding was captured")]
    SourceClosed,

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("capture worker thread panicked")]
    Worker,
}

/// Accumulates modifiers until a terminal input arrives, then freezes.
///
/// Modifier presses accumulate; a non-modifier key press, a non-ordinary
/// button press, or a scroll pulse over a non-empty accumulator completes
/// the session. Once complete, further events are ignored.
pub struct CaptureSession {
    modifiers: Vec<KeyId>,
    terminal: Option<Trigger>,
    alerts: Arc<dyn AlertSink>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::with_alerts(default_sink())
    }

    pub fn with_alerts(alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            modifiers: Vec::new(),
            terminal: None,
            alerts,
        }
    }

    pub fn state(&self) -> CaptureState {
        if self.terminal.is_some() {
            CaptureState::Complete
        } else {
            CaptureState::Collecting
        }
    }

    pub fn modifiers(&self) -> &[KeyId] {
        &self.modifiers
    }

    pub fn feed(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyPress(raw) => self.on_key_press(raw),
            InputEvent::KeyRelease(raw) => self.on_key_release(raw),
            InputEvent::Button { button, pressed } => self.on_button(*button, *pressed),
            InputEvent::Scroll { delta } => self.on_scroll(*delta),
        }
    }

    pub fn on_key_press(&mut self, raw: &RawKey) {
        if self.state() == CaptureState::Complete {
            return;
        }
        let key = identity_of(raw);
        if key.is_modifier() {
            // a modifier nobody can re-identify would make the binding
            // permanently unmatchable; leave it out
            if key.code().is_none() {
                log::debug!("ignoring unresolvable modifier during capture: {}", key.name());
                return;
            }
            if !self.modifiers.contains(&key) {
                self.modifiers.push(key);
            }
        } else {
            self.terminal = Some(Trigger::Key(key));
        }
    }

    /// A release of a key we never saw pressed means the stream and the
    /// accumulator have diverged; clearing beats carrying a phantom
    /// modifier into the finished binding.
    pub fn on_key_release(&mut self, raw: &RawKey) {
        if self.state() == CaptureState::Complete {
            return;
        }
        let key = identity_of(raw);
        if key.code().is_none() {
            return;
        }
        if let Some(pos) = self.modifiers.iter().position(|m| *m == key) {
            self.modifiers.remove(pos);
        } else {
            self.alerts.alert(&format!(
                "unknown key '{}' released, cleared captured modifiers",
                key.name()
            ));
            self.modifiers.clear();
        }
    }

    /// Button releases never terminate the session: a button pressed
    /// before capture started may release mid-capture.
    pub fn on_button(&mut self, button: MouseButton, pressed: bool) {
        if self.state() == CaptureState::Complete || !pressed {
            return;
        }
        if button.is_ordinary() {
            log::debug!("ignoring ordinary Mouse{} during capture", button.label());
            return;
        }
        self.terminal = Some(Trigger::Button(button));
    }

    /// A bare scroll is never capturable; casual scrolling must not
    /// rebind anything.
    pub fn on_scroll(&mut self, delta: i32) {
        if self.state() == CaptureState::Complete || self.modifiers.is_empty() {
            return;
        }
        if let Some(dir) = ScrollDirection::from_delta(delta) {
            self.terminal = Some(Trigger::Scroll(dir));
        }
    }

    /// Freeze the session into a binding.
    pub fn into_binding(self) -> Result<Binding, CaptureError> {
        let trigger = self.terminal.ok_or(CaptureError::Incomplete)?;
        Ok(Binding::captured(self.modifiers, trigger)?)
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a capture session against a live input source.
///
/// `collect` starts both hook families, drains their events through a
/// single-consumer channel on a dedicated worker thread, and blocks the
/// caller on the join until the session completes. The hook threads only
/// ever send into the channel, so they are never blocked by the capture.
pub struct Collector<S: InputSource> {
    source: S,
    alerts: Arc<dyn AlertSink>,
}

impl<S: InputSource> Collector<S> {
    pub fn new(source: S) -> Self {
        Self::with_alerts(source, default_sink())
    }

    pub fn with_alerts(source: S, alerts: Arc<dyn AlertSink>) -> Self {
        Self { source, alerts }
    }

    /// Blocks until the user completes a chord. If the source shuts down
    /// first the session is discarded without side effects.
    pub fn collect(&mut self) -> Result<Binding, CaptureError> {
        let (tx, rx) = mpsc::channel();
        self.source.start(Interest::ALL, tx)?;

        let alerts = Arc::clone(&self.alerts);
        let spawned = thread::Builder::new()
            .name("volkeys-capture".to_string())
            .spawn(move || run_session(rx, alerts));
        let worker = match spawned {
            Ok(worker) => worker,
            Err(err) => {
                self.source.stop();
                return Err(HookError::Spawn(err).into());
            }
        };

        let result = worker.join().map_err(|_| CaptureError::Worker);
        self.source.stop();
        let binding = result??;
        log::info!("captured binding: {binding}");
        Ok(binding)
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

fn run_session(
    rx: Receiver<InputEvent>,
    alerts: Arc<dyn AlertSink>,
) -> Result<Binding, CaptureError> {
    let mut session = CaptureSession::with_alerts(alerts);
    while let Ok(event) = rx.recv() {
        session.feed(&event);
        if session.state() == CaptureState::Complete {
            return session.into_binding();
        }
    }
    Err(CaptureError::SourceClosed)
}
