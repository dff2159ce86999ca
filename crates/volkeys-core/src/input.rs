// Volkeys Input Events
// Raw event model and the input-hook source contract

use std::collections::VecDeque;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::key::MouseButton;

/// A key event as delivered by the OS hook, before canonicalization.
///
/// Hooks report keys in different shapes: a virtual key code, a symbolic
/// name ("LEFT_CTRL"), a printable character ('g'), or any mix of them.
/// [`crate::key::identity_of`] collapses all of these into one [`KeyId`].
///
/// [`KeyId`]: crate::key::KeyId
#[derive(Debug, Clone, Default)]
pub struct RawKey {
    pub code: Option<u32>,
    pub symbol: Option<String>,
    pub ch: Option<char>,
}

impl RawKey {
    /// A key known by code and symbolic name.
    pub fn symbolic(code: u32, symbol: &str) -> Self {
        Self {
            code: Some(code),
            symbol: Some(symbol.to_string()),
            ch: None,
        }
    }

    /// A key known by code and printable character.
    pub fn printable(code: u32, ch: char) -> Self {
        Self {
            code: Some(code),
            symbol: None,
            ch: Some(ch),
        }
    }

    /// A key known only by symbolic name; the code resolves from the tables.
    pub fn named(symbol: &str) -> Self {
        Self {
            code: None,
            symbol: Some(symbol.to_string()),
            ch: None,
        }
    }

    /// A key known only by printable character.
    pub fn of_char(ch: char) -> Self {
        Self {
            code: None,
            symbol: None,
            ch: Some(ch),
        }
    }

    /// A key the OS could not describe beyond (maybe) a code.
    pub fn opaque(code: Option<u32>) -> Self {
        Self {
            code,
            symbol: None,
            ch: None,
        }
    }
}

/// A discrete event from the input hooks.
#[derive(Debug, Clone)]
pub enum InputEvent {
    KeyPress(RawKey),
    KeyRelease(RawKey),
    Button { button: MouseButton, pressed: bool },
    Scroll { delta: i32 },
}

impl InputEvent {
    /// Which hook family produces this event.
    pub fn is_mouse(&self) -> bool {
        matches!(
            self,
            InputEvent::Button { .. } | InputEvent::Scroll { .. }
        )
    }
}

/// Which hook families a consumer wants. Mouse hooks are system-wide
/// interception; nothing should ask for them without a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interest {
    pub keyboard: bool,
    pub mouse: bool,
}

impl Interest {
    pub const ALL: Interest = Interest {
        keyboard: true,
        mouse: true,
    };

    pub const KEYBOARD: Interest = Interest {
        keyboard: true,
        mouse: false,
    };

    pub fn wants(&self, event: &InputEvent) -> bool {
        if event.is_mouse() {
            self.mouse
        } else {
            self.keyboard
        }
    }
}

/// Errors acquiring or running input hooks.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("input hooks already started")]
    AlreadyStarted,

    #[error("failed to spawn hook thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// An input-hook facility. Implementations deliver events from their own
/// notification threads into the supplied channel sender.
///
/// Contract: `start` acquires hooks for the requested interest and must not
/// block; `stop` releases every hook and drops all clones of the sender so
/// the consumer's channel disconnects. Events outside the requested
/// interest must not be delivered.
pub trait InputSource {
    fn start(&mut self, interest: Interest, tx: Sender<InputEvent>) -> Result<(), HookError>;
    fn stop(&mut self);
}

/// Replays a fixed list of events from a feeder thread, standing in for OS
/// hooks in the tester binary and in tests. The feeder drops its sender
/// when the script runs dry, which ends any consumer cleanly.
pub struct ScriptedSource {
    queue: Arc<Mutex<VecDeque<InputEvent>>>,
    worker: Option<JoinHandle<()>>,
}

impl ScriptedSource {
    pub fn new(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(events.into_iter().collect())),
            worker: None,
        }
    }

    /// Append an event; only observed if the feeder has not yet drained
    /// past the end of the queue.
    pub fn push(&self, event: InputEvent) {
        self.queue.lock().push_back(event);
    }
}

impl InputSource for ScriptedSource {
    fn start(&mut self, interest: Interest, tx: Sender<InputEvent>) -> Result<(), HookError> {
        if self.worker.is_some() {
            return Err(HookError::AlreadyStarted);
        }
        let queue = Arc::clone(&self.queue);
        let worker = std::thread::Builder::new()
            .name("volkeys-scripted-source".to_string())
            .spawn(move || loop {
                let event = queue.lock().pop_front();
                match event {
                    Some(event) if interest.wants(&event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Some(_) => {}
                    None => break,
                }
            })?;
        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        self.queue.lock().clear();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
