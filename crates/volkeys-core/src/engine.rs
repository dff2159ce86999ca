// Volkeys Match Engine
// Runtime dispatcher: live pressed state, group evaluation, hook lifecycle

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::alert::{default_sink, AlertSink};
use crate::binding::InputCandidate;
use crate::group::BindingGroup;
use crate::input::{HookError, InputEvent, InputSource, Interest, RawKey};
use crate::key::{identity_of, KeyId, MouseButton, ScrollDirection};

/// The set of currently depressed inputs. Owned by exactly one consumer at
/// a time; never shared with the hook threads.
#[derive(Debug, Default)]
pub struct LiveInputState {
    pressed: Vec<KeyId>,
}

impl LiveInputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pressed(&self) -> &[KeyId] {
        &self.pressed
    }

    fn press(&mut self, key: KeyId) -> bool {
        if self.pressed.contains(&key) {
            return false;
        }
        self.pressed.push(key);
        true
    }

    fn release(&mut self, key: &KeyId) -> bool {
        match self.pressed.iter().position(|p| p == key) {
            Some(pos) => {
                self.pressed.remove(pos);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.pressed.clear();
    }

    /// Sorted code snapshot, cheap to compare across evaluations.
    fn snapshot(&self) -> SmallVec<[u32; 8]> {
        let mut codes: SmallVec<[u32; 8]> = self
            .pressed
            .iter()
            .filter_map(|key| key.code())
            .collect();
        codes.sort_unstable();
        codes
    }

    fn candidate(&self, scroll: Option<ScrollDirection>) -> InputCandidate {
        InputCandidate::from_pressed(&self.pressed, scroll)
    }
}

/// A bound action. Failures are reported through the alert sink; they
/// never unwind into the engine.
pub type ActionFn = Box<dyn FnMut() -> anyhow::Result<()> + Send>;

struct Registration {
    group: BindingGroup,
    action: ActionFn,
}

/// Evaluates every registered group against the live input state and fires
/// at most one action per qualifying state transition.
///
/// The engine is passive: feed it events with [`process`](Self::process).
/// [`Listener`] owns the hook plumbing around it.
pub struct MatchEngine {
    state: LiveInputState,
    prev_snapshot: SmallVec<[u32; 8]>,
    registrations: IndexMap<String, Registration>,
    alerts: Arc<dyn AlertSink>,
}

impl MatchEngine {
    pub fn new() -> Self {
        Self::with_alerts(default_sink())
    }

    pub fn with_alerts(alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            state: LiveInputState::new(),
            prev_snapshot: SmallVec::new(),
            registrations: IndexMap::new(),
            alerts,
        }
    }

    /// Register a group and its action. Registration order is dispatch
    /// precedence; re-registering a name replaces the group in place.
    pub fn register<F>(&mut self, group: BindingGroup, action: F)
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        self.registrations.insert(
            group.name().to_string(),
            Registration {
                group,
                action: Box::new(action),
            },
        );
    }

    pub fn unregister(&mut self, name: &str) -> Option<BindingGroup> {
        self.registrations
            .shift_remove(name)
            .map(|reg| reg.group)
    }

    pub fn groups(&self) -> impl Iterator<Item = &BindingGroup> {
        self.registrations.values().map(|reg| &reg.group)
    }

    pub fn pressed(&self) -> &[KeyId] {
        self.state.pressed()
    }

    /// Hook families the registered bindings actually need. Mouse hooks
    /// are only requested when some binding uses a button or scroll.
    pub fn interest(&self) -> Interest {
        Interest {
            keyboard: true,
            mouse: self
                .registrations
                .values()
                .any(|reg| reg.group.uses_mouse()),
        }
    }

    pub fn process(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyPress(raw) => self.on_key_press(raw),
            InputEvent::KeyRelease(raw) => self.on_key_release(raw),
            InputEvent::Button { button, pressed } => self.on_button(*button, *pressed),
            InputEvent::Scroll { delta } => self.on_scroll(*delta),
        }
    }

    /// OS key repeat re-delivers the press of a held key; the pressed set
    /// does not change, so no re-evaluation and no duplicate firing.
    fn on_key_press(&mut self, raw: &RawKey) {
        let key = identity_of(raw);
        if key.code().is_none() {
            log::debug!("dropping key press with unresolvable code: {}", key.name());
            return;
        }
        self.state.press(key);
        let snapshot = self.state.snapshot();
        if snapshot != self.prev_snapshot {
            self.prev_snapshot = snapshot;
            self.evaluate(None);
        }
    }

    /// An untracked release means a press was lost somewhere. Clearing the
    /// whole set trades partial-state survivability for consistency; the
    /// worst outcome is a binding that does not fire until re-chorded.
    fn on_key_release(&mut self, raw: &RawKey) {
        let key = identity_of(raw);
        if key.code().is_none() {
            return;
        }
        if !self.state.release(&key) {
            self.alerts.alert("unknown key released, cleared all keys");
            self.state.clear();
        }
        self.prev_snapshot = self.state.snapshot();
    }

    fn on_button(&mut self, button: MouseButton, pressed: bool) {
        if button.is_ordinary() {
            return;
        }
        let key = KeyId::from_button(button);
        if pressed {
            self.state.press(key);
            self.prev_snapshot = self.state.snapshot();
            self.evaluate(None);
        } else {
            // a stray button release carries no chord-corruption risk
            self.state.release(&key);
            self.prev_snapshot = self.state.snapshot();
        }
    }

    /// A scroll is a pulse, not a held state: one evaluation with the
    /// direction, then it is gone.
    fn on_scroll(&mut self, delta: i32) {
        if let Some(dir) = ScrollDirection::from_delta(delta) {
            self.evaluate(Some(dir));
        }
    }

    fn evaluate(&mut self, scroll: Option<ScrollDirection>) {
        let candidate = self.state.candidate(scroll);
        for (name, reg) in &mut self.registrations {
            if reg.group.is_active(&candidate) {
                log::debug!("binding group '{name}' activated");
                if let Err(err) = (reg.action)() {
                    self.alerts
                        .alert(&format!("action '{name}' failed: {err:#}"));
                }
                break;
            }
        }
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListenError {
    #[error("listener is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("dispatch thread panicked")]
    Dispatch,
}

/// Owns the hooks and the dispatch thread around a [`MatchEngine`].
///
/// While running, the engine lives on the dispatch thread and the single
/// consumer channel serializes the keyboard- and mouse-hook producers.
/// Registration changes follow stop–mutate–restart: [`stop`](Self::stop)
/// hands the engine back, [`engine_mut`](Self::engine_mut) is only
/// available while stopped, and the group table is therefore never touched
/// mid-evaluation.
pub struct Listener<S: InputSource> {
    source: S,
    engine: Option<MatchEngine>,
    worker: Option<JoinHandle<MatchEngine>>,
}

impl<S: InputSource> Listener<S> {
    pub fn new(source: S, engine: MatchEngine) -> Self {
        Self {
            source,
            engine: Some(engine),
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Whether the dispatch thread has exited on its own (event stream
    /// ended, e.g. a replay ran dry).
    pub fn is_finished(&self) -> bool {
        self.worker
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(false)
    }

    pub fn start(&mut self) -> Result<(), ListenError> {
        let Some(mut engine) = self.engine.take() else {
            return Err(ListenError::AlreadyRunning);
        };
        let interest = engine.interest();
        let (tx, rx) = mpsc::channel();
        if let Err(err) = self.source.start(interest, tx) {
            self.engine = Some(engine);
            return Err(err.into());
        }

        let spawned = thread::Builder::new()
            .name("volkeys-dispatch".to_string())
            .spawn(move || {
                dispatch(rx, &mut engine);
                engine
            });

        match spawned {
            Ok(worker) => {
                self.worker = Some(worker);
                Ok(())
            }
            Err(err) => {
                self.source.stop();
                Err(HookError::Spawn(err).into())
            }
        }
    }

    /// Release the hooks, drain the dispatch thread, and take the engine
    /// back for mutation.
    pub fn stop(&mut self) -> Result<(), ListenError> {
        self.source.stop();
        self.join_worker()
    }

    /// Block until the event stream ends of its own accord.
    pub fn wait(&mut self) -> Result<(), ListenError> {
        self.join_worker()
    }

    fn join_worker(&mut self) -> Result<(), ListenError> {
        if let Some(worker) = self.worker.take() {
            let engine = worker.join().map_err(|_| ListenError::Dispatch)?;
            self.engine = Some(engine);
        }
        Ok(())
    }

    /// The engine, only while stopped.
    pub fn engine(&self) -> Option<&MatchEngine> {
        self.engine.as_ref()
    }

    /// Mutable engine access, only while stopped.
    pub fn engine_mut(&mut self) -> Option<&mut MatchEngine> {
        self.engine.as_mut()
    }

    pub fn into_parts(mut self) -> (S, Option<MatchEngine>) {
        let _ = self.join_worker();
        (self.source, self.engine)
    }
}

fn dispatch(rx: Receiver<InputEvent>, engine: &mut MatchEngine) {
    while let Ok(event) = rx.recv() {
        engine.process(&event);
    }
}
