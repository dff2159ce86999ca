// Volkeys Persistence Codec
// Canonical text form for binding groups, human-diffable

use std::fmt::Write as _;

use crate::binding::{Binding, BindingError, Trigger};
use crate::group::BindingGroup;
use crate::key::{KeyId, MouseButton, ScrollDirection};

pub const SECTION_MODIFIERS: &str = "modifiers";
pub const SECTION_KEY: &str = "key";
pub const SECTION_MOUSE_BUTTON: &str = "mouse_button";
pub const SECTION_SCROLL: &str = "scroll";

/// Why one binding block failed to decode. Siblings in the same file are
/// unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingDecodeError {
    #[error("unrecognized section header '{0}'")]
    UnknownSection(String),

    #[error("malformed entry '{0}' (expected <code>:<name>)")]
    MalformedEntry(String),

    #[error("unknown scroll token '{0}'")]
    BadScrollToken(String),

    #[error("binding has no key, mouse_button or scroll section")]
    MissingTerminal,

    #[error("binding has more than one terminal entry")]
    DuplicateTerminal,

    #[error(transparent)]
    Invalid(#[from] BindingError),
}

/// The resource did not resolve to a binding group at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorruptError {
    #[error("resource is empty")]
    Empty,

    #[error("none of the {count} binding blocks decoded cleanly (first failure: {first})")]
    NoValidBindings {
        count: usize,
        first: BindingDecodeError,
    },
}

/// A decoded group plus the per-binding failures that were skipped.
#[derive(Debug)]
pub struct DecodedGroup {
    pub group: BindingGroup,
    pub rejected: Vec<BindingDecodeError>,
}

/// Render a group in the canonical text form: one block per binding,
/// blocks separated by a blank line.
///
/// Member codes are guaranteed by binding validation, so encoding cannot
/// fail; anything unresolvable was rejected before it got here.
pub fn encode_group(group: &BindingGroup) -> String {
    let blocks: Vec<String> = group.bindings().iter().map(encode_binding).collect();
    blocks.join("\n")
}

fn encode_binding(binding: &Binding) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{SECTION_MODIFIERS}");
    for modifier in binding.modifiers() {
        if let Some(code) = modifier.code() {
            let _ = writeln!(out, "{}:{}", code, modifier.name());
        }
    }
    match binding.trigger() {
        Trigger::Key(key) => {
            let _ = writeln!(out, "{SECTION_KEY}");
            if let Some(code) = key.code() {
                let _ = writeln!(out, "{}:{}", code, key.name());
            }
        }
        Trigger::Button(button) => {
            let _ = writeln!(out, "{SECTION_MOUSE_BUTTON}");
            let _ = writeln!(out, "{}:{}", button.code(), button.label());
        }
        Trigger::Scroll(dir) => {
            let _ = writeln!(out, "{SECTION_SCROLL}");
            let _ = writeln!(out, "{}", dir.token());
        }
    }
    out
}

/// Decode the canonical text form. A bad block fails that binding only;
/// the group is corrupt when no block decodes at all.
pub fn decode_group(name: &str, text: &str) -> Result<DecodedGroup, CorruptError> {
    let blocks = split_blocks(text);
    if blocks.is_empty() {
        return Err(CorruptError::Empty);
    }

    let mut bindings = Vec::new();
    let mut rejected = Vec::new();
    for block in &blocks {
        match decode_binding(block) {
            Ok(binding) => bindings.push(binding),
            Err(err) => {
                log::warn!("skipping binding block in '{name}': {err}");
                rejected.push(err);
            }
        }
    }

    if bindings.is_empty() {
        // rejected is non-empty here: blocks was non-empty and every one failed
        let first = rejected
            .first()
            .cloned()
            .unwrap_or(BindingDecodeError::MissingTerminal);
        return Err(CorruptError::NoValidBindings {
            count: blocks.len(),
            first,
        });
    }

    Ok(DecodedGroup {
        group: BindingGroup::with_bindings(name, bindings),
        rejected,
    })
}

fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

enum Section {
    Modifiers,
    Key,
    MouseButton,
    Scroll,
}

fn decode_binding(lines: &[&str]) -> Result<Binding, BindingDecodeError> {
    let mut modifiers: Vec<KeyId> = Vec::new();
    let mut terminal: Option<Trigger> = None;
    let mut section: Option<Section> = None;

    for &line in lines {
        match line {
            SECTION_MODIFIERS => section = Some(Section::Modifiers),
            SECTION_KEY => section = Some(Section::Key),
            SECTION_MOUSE_BUTTON => section = Some(Section::MouseButton),
            SECTION_SCROLL => section = Some(Section::Scroll),
            entry => match section {
                None => return Err(BindingDecodeError::UnknownSection(entry.to_string())),
                Some(Section::Modifiers) => {
                    let (code, name) = parse_entry(entry)?;
                    modifiers.push(KeyId::from_parts(code, name));
                }
                Some(Section::Key) => {
                    if terminal.is_some() {
                        return Err(BindingDecodeError::DuplicateTerminal);
                    }
                    let (code, name) = parse_entry(entry)?;
                    terminal = Some(Trigger::Key(KeyId::from_parts(code, name)));
                }
                Some(Section::MouseButton) => {
                    if terminal.is_some() {
                        return Err(BindingDecodeError::DuplicateTerminal);
                    }
                    let (code, _name) = parse_entry(entry)?;
                    terminal = Some(Trigger::Button(MouseButton::from_code(code)));
                }
                Some(Section::Scroll) => {
                    if terminal.is_some() {
                        return Err(BindingDecodeError::DuplicateTerminal);
                    }
                    let dir = ScrollDirection::from_token(entry)
                        .ok_or_else(|| BindingDecodeError::BadScrollToken(entry.to_string()))?;
                    terminal = Some(Trigger::Scroll(dir));
                }
            },
        }
    }

    let trigger = terminal.ok_or(BindingDecodeError::MissingTerminal)?;
    Ok(Binding::loaded(modifiers, trigger)?)
}

/// Parse a `<code>:<name>` line. A line with no separator is presumed to
/// be an attempted section header that is not one of the four recognized
/// tokens.
fn parse_entry(entry: &str) -> Result<(u32, &str), BindingDecodeError> {
    let (code, name) = entry
        .split_once(':')
        .ok_or_else(|| BindingDecodeError::UnknownSection(entry.to_string()))?;
    let code: u32 = code
        .trim()
        .parse()
        .map_err(|_| BindingDecodeError::MalformedEntry(entry.to_string()))?;
    Ok((code, name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Trigger;
    use crate::key::KeyId;

    fn sample_group() -> BindingGroup {
        let ctrl = KeyId::from_code(29);
        let shift = KeyId::from_code(42);
        let chord = Binding::captured(
            vec![ctrl.clone(), shift.clone()],
            Trigger::Key(KeyId::from_code(34)),
        )
        .unwrap();
        let wheel = Binding::captured(
            vec![ctrl, shift],
            Trigger::Scroll(ScrollDirection::Up),
        )
        .unwrap();
        let button =
            Binding::captured(vec![KeyId::from_code(29)], Trigger::Button(MouseButton::Middle))
                .unwrap();
        BindingGroup::with_bindings("volume_up", vec![chord, wheel, button])
    }

    #[test]
    fn test_encode_canonical_form() {
        let group = BindingGroup::with_bindings(
            "volume_up",
            vec![Binding::captured(
                vec![KeyId::from_code(29), KeyId::from_code(42)],
                Trigger::Key(KeyId::from_code(34)),
            )
            .unwrap()],
        );
        let text = encode_group(&group);
        assert_eq!(
            text,
            "modifiers\n29:LEFT_CTRL\n42:LEFT_SHIFT\nkey\n34:G\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let group = sample_group();
        let decoded = decode_group("volume_up", &encode_group(&group)).unwrap();
        assert!(decoded.rejected.is_empty());
        assert_eq!(decoded.group, group);
    }

    #[test]
    fn test_scroll_section_round_trip() {
        let text = "modifiers\n29:LEFT_CTRL\nscroll\n<ScrollDown>\n";
        let decoded = decode_group("volume_down", text).unwrap();
        assert_eq!(decoded.group.len(), 1);
        assert_eq!(
            decoded.group.bindings()[0].trigger(),
            &Trigger::Scroll(ScrollDirection::Down)
        );
    }

    #[test]
    fn test_unknown_section_fails_binding_but_keeps_siblings() {
        let text = "modifiers\n29:LEFT_CTRL\nkey\n34:G\n\nmodifiers\n29:LEFT_CTRL\nwheel\n<ScrollUp>\n";
        let decoded = decode_group("volume_up", text).unwrap();
        assert_eq!(decoded.group.len(), 1);
        assert_eq!(
            decoded.rejected,
            vec![BindingDecodeError::UnknownSection("wheel".to_string())]
        );
        assert_eq!(decoded.group.bindings()[0].trigger().terminal_code(), Some(34));
    }

    #[test]
    fn test_content_before_any_section_is_rejected() {
        let text = "29:LEFT_CTRL\nkey\n34:G\n";
        let err = decode_group("volume_up", text).unwrap_err();
        assert!(matches!(
            err,
            CorruptError::NoValidBindings {
                first: BindingDecodeError::UnknownSection(_),
                ..
            }
        ));
    }

    #[test]
    fn test_bad_scroll_token_fails_binding() {
        let text = "modifiers\n29:LEFT_CTRL\nscroll\n<ScrollSideways>\n\nmodifiers\n29:LEFT_CTRL\nscroll\n<ScrollUp>\n";
        let decoded = decode_group("volume_up", text).unwrap();
        assert_eq!(decoded.group.len(), 1);
        assert_eq!(
            decoded.rejected,
            vec![BindingDecodeError::BadScrollToken("<ScrollSideways>".to_string())]
        );
    }

    #[test]
    fn test_missing_terminal_fails_binding() {
        let text = "modifiers\n29:LEFT_CTRL\n";
        let err = decode_group("volume_up", text).unwrap_err();
        assert!(matches!(
            err,
            CorruptError::NoValidBindings {
                first: BindingDecodeError::MissingTerminal,
                ..
            }
        ));
    }

    #[test]
    fn test_two_terminals_fail_binding() {
        let text = "modifiers\n29:LEFT_CTRL\nkey\n34:G\n35:H\n";
        let err = decode_group("volume_up", text).unwrap_err();
        assert!(matches!(
            err,
            CorruptError::NoValidBindings {
                first: BindingDecodeError::DuplicateTerminal,
                ..
            }
        ));
    }

    #[test]
    fn test_ordinary_button_file_is_rejected() {
        let text = "modifiers\n29:LEFT_CTRL\nmouse_button\n272:Left\n";
        let err = decode_group("click", text).unwrap_err();
        assert!(matches!(
            err,
            CorruptError::NoValidBindings {
                first: BindingDecodeError::Invalid(BindingError::OrdinaryButton(_)),
                ..
            }
        ));
    }

    #[test]
    fn test_empty_resource_is_corrupt() {
        for text in ["", "\n\n  \n"] {
            let err = decode_group("volume_up", text).unwrap_err();
            assert_eq!(err, CorruptError::Empty);
        }
    }

    #[test]
    fn test_non_numeric_code_is_malformed() {
        let text = "modifiers\nctrl:LEFT_CTRL\nkey\n34:G\n";
        let err = decode_group("volume_up", text).unwrap_err();
        assert!(matches!(
            err,
            CorruptError::NoValidBindings {
                first: BindingDecodeError::MalformedEntry(_),
                ..
            }
        ));
    }
}
