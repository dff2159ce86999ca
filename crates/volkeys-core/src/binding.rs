// Volkeys Binding Type
// One activation condition: a set of modifiers plus one terminal trigger

use std::collections::BTreeSet;
use std::fmt;

use crate::key::{KeyId, MouseButton, ScrollDirection};
use crate::modifier::is_modifier_code;

/// The single non-modifier input that completes a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Key(KeyId),
    Button(MouseButton),
    Scroll(ScrollDirection),
}

impl Trigger {
    /// Code of the pressed input that satisfies this trigger. `None` only
    /// for scroll triggers, which are pulses rather than held inputs.
    pub fn terminal_code(&self) -> Option<u32> {
        match self {
            Trigger::Key(key) => key.code(),
            Trigger::Button(button) => Some(button.code()),
            Trigger::Scroll(_) => None,
        }
    }

    pub fn is_scroll(&self) -> bool {
        matches!(self, Trigger::Scroll(_))
    }

    pub fn uses_mouse(&self) -> bool {
        matches!(self, Trigger::Button(_) | Trigger::Scroll(_))
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Key(key) => write!(f, "{}", key.name()),
            Trigger::Button(button) => write!(f, "Mouse{}", button.label()),
            Trigger::Scroll(dir) => write!(f, "{}", dir.token()),
        }
    }
}

/// Where a binding came from. Rendering is identical either way; the
/// origin exists for logging and diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Captured,
    Loaded,
}

/// Rejected binding shapes, caught at construction so nothing invalid ever
/// reaches the match engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("Mouse{0} is an ordinary button and cannot complete a binding")]
    OrdinaryButton(MouseButton),

    #[error("'{0}' has no resolvable key code; the binding could never match")]
    UnresolvedCode(String),

    #[error("'{0}' is not a modifier key")]
    NotAModifier(String),

    #[error("a scroll trigger needs at least one modifier")]
    BareScroll,
}

/// The live input state a binding is evaluated against: pressed modifier
/// codes, pressed non-modifier codes, and the transient scroll pulse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputCandidate {
    pub modifier_codes: BTreeSet<u32>,
    pub terminal_codes: BTreeSet<u32>,
    pub scroll: Option<ScrollDirection>,
}

impl InputCandidate {
    /// Partition a pressed set into the candidate shape. Identities
    /// without a code cannot participate and are skipped.
    pub fn from_pressed(pressed: &[KeyId], scroll: Option<ScrollDirection>) -> Self {
        let mut candidate = InputCandidate {
            scroll,
            ..Default::default()
        };
        for key in pressed {
            if let Some(code) = key.code() {
                if key.is_modifier() {
                    candidate.modifier_codes.insert(code);
                } else {
                    candidate.terminal_codes.insert(code);
                }
            }
        }
        candidate
    }
}

/// An immutable activation condition.
///
/// Bindings are exact chords: the candidate's modifier set must equal this
/// binding's modifier set, not merely contain it, so a binding never fires
/// while an unrelated modifier is held and never masks another binding
/// bound to a superset of its modifiers.
#[derive(Debug, Clone)]
pub struct Binding {
    modifiers: Vec<KeyId>,
    modifier_codes: BTreeSet<u32>,
    trigger: Trigger,
    origin: Origin,
}

impl Binding {
    /// Build a binding from a just-captured chord.
    pub fn captured(
        modifiers: Vec<KeyId>,
        trigger: Trigger,
    ) -> Result<Self, BindingError> {
        Self::build(modifiers, trigger, Origin::Captured)
    }

    /// Build a binding reconstructed from storage or configuration.
    pub fn loaded(modifiers: Vec<KeyId>, trigger: Trigger) -> Result<Self, BindingError> {
        Self::build(modifiers, trigger, Origin::Loaded)
    }

    fn build(
        modifiers: Vec<KeyId>,
        trigger: Trigger,
        origin: Origin,
    ) -> Result<Self, BindingError> {
        match &trigger {
            Trigger::Button(button) if button.is_ordinary() => {
                return Err(BindingError::OrdinaryButton(*button));
            }
            Trigger::Key(key) if key.code().is_none() => {
                return Err(BindingError::UnresolvedCode(key.name().to_string()));
            }
            Trigger::Scroll(_) if modifiers.is_empty() => {
                return Err(BindingError::BareScroll);
            }
            _ => {}
        }

        let mut deduped = Vec::with_capacity(modifiers.len());
        let mut codes = BTreeSet::new();
        for modifier in modifiers {
            let code = modifier
                .code()
                .ok_or_else(|| BindingError::UnresolvedCode(modifier.name().to_string()))?;
            if !is_modifier_code(code) {
                return Err(BindingError::NotAModifier(modifier.name().to_string()));
            }
            if codes.insert(code) {
                deduped.push(modifier);
            }
        }

        Ok(Self {
            modifiers: deduped,
            modifier_codes: codes,
            trigger,
            origin,
        })
    }

    pub fn modifiers(&self) -> &[KeyId] {
        &self.modifiers
    }

    pub fn modifier_codes(&self) -> &BTreeSet<u32> {
        &self.modifier_codes
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Exact-chord activation check. Deterministic, no side effects.
    ///
    /// Key and button triggers require the scroll pulse to be absent, so a
    /// chord that already fired on its press is not fired again by an
    /// unrelated wheel event while it is still held.
    pub fn activates(&self, candidate: &InputCandidate) -> bool {
        if candidate.modifier_codes != self.modifier_codes {
            return false;
        }
        match &self.trigger {
            Trigger::Scroll(dir) => {
                candidate.scroll == Some(*dir) && candidate.terminal_codes.is_empty()
            }
            trigger => {
                let Some(code) = trigger.terminal_code() else {
                    return false;
                };
                candidate.scroll.is_none()
                    && candidate.terminal_codes.len() == 1
                    && candidate.terminal_codes.contains(&code)
            }
        }
    }

    /// Canonical rendering: `Mod1 + Mod2 + Trigger`.
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = self
            .modifiers
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        parts.push(self.trigger.to_string());
        parts.join(" + ")
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        // Origin is bookkeeping: a captured binding and its reloaded twin
        // are the same binding.
        self.modifier_codes == other.modifier_codes && self.trigger == other.trigger
    }
}

impl Eq for Binding {}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
