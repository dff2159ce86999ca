// Volkeys Chord String Parser
// Parses chord strings like "Ctrl+Shift+G" into bindings

use crate::binding::{Binding, BindingError, Trigger};
use crate::key::{key_from_name, KeyId, MouseButton, ScrollDirection};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordParseError {
    #[error("chord string cannot be empty")]
    EmptyInput,

    #[error("chord string cannot start or end with '+'")]
    DanglingSeparator,

    #[error("unknown key name: '{0}'")]
    UnknownKey(String),

    #[error("unknown mouse button: '{0}'")]
    UnknownButton(String),

    #[error(transparent)]
    Invalid(#[from] BindingError),
}

/// Parse a chord expression into a binding.
///
/// The last `+`-separated component is the trigger: a key name
/// ("G", "PLAYPAUSE"), a mouse button ("MouseMiddle"), or a scroll
/// direction ("ScrollUp" / "<ScrollUp>"). Everything before it must be a
/// modifier name. Duplicate modifiers collapse.
///
/// # Examples
/// ```
/// use volkeys_core::parse::parse_chord;
/// let binding = parse_chord("Ctrl+Shift+ScrollUp").unwrap();
/// assert_eq!(binding.describe(), "LEFT_CTRL + LEFT_SHIFT + <ScrollUp>");
/// ```
pub fn parse_chord(exp: &str) -> Result<Binding, ChordParseError> {
    let trimmed = exp.trim();
    if trimmed.is_empty() {
        return Err(ChordParseError::EmptyInput);
    }
    if trimmed.starts_with('+') || trimmed.ends_with('+') {
        return Err(ChordParseError::DanglingSeparator);
    }

    let parts: Vec<&str> = trimmed.split('+').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ChordParseError::DanglingSeparator);
    }

    // last component is the trigger, the rest are modifiers
    let (trigger_str, modifier_strs) = parts.split_last().unwrap_or((&"", &[]));
    let trigger = parse_trigger(trigger_str)?;

    let mut modifiers: Vec<KeyId> = Vec::with_capacity(modifier_strs.len());
    for name in modifier_strs {
        let code = key_from_name(name)
            .ok_or_else(|| ChordParseError::UnknownKey(name.to_string()))?;
        let key = KeyId::from_code(code);
        if !modifiers.contains(&key) {
            modifiers.push(key);
        }
    }

    Ok(Binding::loaded(modifiers, trigger)?)
}

fn parse_trigger(token: &str) -> Result<Trigger, ChordParseError> {
    if let Some(dir) = scroll_direction(token) {
        return Ok(Trigger::Scroll(dir));
    }
    if let Some(label) = token.strip_prefix("Mouse") {
        let button = MouseButton::from_label(label)
            .ok_or_else(|| ChordParseError::UnknownButton(token.to_string()))?;
        return Ok(Trigger::Button(button));
    }
    let code =
        key_from_name(token).ok_or_else(|| ChordParseError::UnknownKey(token.to_string()))?;
    Ok(Trigger::Key(KeyId::from_code(code)))
}

fn scroll_direction(token: &str) -> Option<ScrollDirection> {
    match token {
        "ScrollUp" | "<ScrollUp>" => Some(ScrollDirection::Up),
        "ScrollDown" | "<ScrollDown>" => Some(ScrollDirection::Down),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_chord() {
        let binding = parse_chord("Ctrl+Shift+G").unwrap();
        assert_eq!(
            binding.modifier_codes().iter().copied().collect::<Vec<_>>(),
            vec![29, 42]
        );
        assert_eq!(binding.trigger().terminal_code(), Some(34));
    }

    #[test]
    fn test_parse_bare_key() {
        let binding = parse_chord("PLAYPAUSE").unwrap();
        assert!(binding.modifiers().is_empty());
        assert_eq!(binding.trigger().terminal_code(), Some(164));
    }

    #[test]
    fn test_parse_scroll_chord() {
        let binding = parse_chord("Ctrl+Shift+ScrollUp").unwrap();
        assert_eq!(
            binding.trigger(),
            &Trigger::Scroll(ScrollDirection::Up)
        );
        // the literal persisted token also parses
        let binding = parse_chord("Ctrl+<ScrollDown>").unwrap();
        assert_eq!(
            binding.trigger(),
            &Trigger::Scroll(ScrollDirection::Down)
        );
    }

    #[test]
    fn test_parse_button_chord() {
        let binding = parse_chord("Ctrl+MouseMiddle").unwrap();
        assert_eq!(
            binding.trigger(),
            &Trigger::Button(MouseButton::Middle)
        );
    }

    #[test]
    fn test_parse_ordinary_button_is_invalid() {
        let err = parse_chord("Ctrl+MouseLeft").unwrap_err();
        assert!(matches!(
            err,
            ChordParseError::Invalid(BindingError::OrdinaryButton(MouseButton::Left))
        ));
    }

    #[test]
    fn test_parse_bare_scroll_is_invalid() {
        let err = parse_chord("ScrollUp").unwrap_err();
        assert!(matches!(
            err,
            ChordParseError::Invalid(BindingError::BareScroll)
        ));
    }

    #[test]
    fn test_parse_duplicate_modifiers_collapse() {
        let binding = parse_chord("Ctrl+Control+G").unwrap();
        assert_eq!(binding.modifiers().len(), 1);
    }

    #[test]
    fn test_parse_non_modifier_prefix_rejected() {
        let err = parse_chord("G+Ctrl+H").unwrap_err();
        assert!(matches!(
            err,
            ChordParseError::Invalid(BindingError::NotAModifier(_))
        ));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_chord(""), Err(ChordParseError::EmptyInput));
        assert_eq!(parse_chord("Ctrl+"), Err(ChordParseError::DanglingSeparator));
        assert_eq!(
            parse_chord("Ctrl++G"),
            Err(ChordParseError::DanglingSeparator)
        );
        assert!(matches!(
            parse_chord("Hyper+G"),
            Err(ChordParseError::UnknownKey(_))
        ));
        assert!(matches!(
            parse_chord("Ctrl+MouseWheelie"),
            Err(ChordParseError::UnknownButton(_))
        ));
    }
}
