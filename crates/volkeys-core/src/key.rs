// Volkeys Key Identity Model
// Canonical identity for keyboard keys, mouse buttons and scroll gestures

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::input::RawKey;
use crate::modifier::is_modifier_code;

/// Canonical identity of one input origin.
///
/// Two identities compare equal iff their `code` values are equal; the
/// display name is derived at ingestion and never participates in equality.
/// Keyboard keys use the Linux input-event code space, mouse buttons the
/// disjoint `BTN_*` range (see [`MouseButton`]).
#[derive(Debug, Clone)]
pub struct KeyId {
    code: Option<u32>,
    name: String,
    modifier: bool,
}

impl KeyId {
    /// Identity for a known key code. The display name comes from the
    /// static table, falling back to `KEY_<code>`.
    pub fn from_code(code: u32) -> Self {
        let name = key_name(code)
            .map(str::to_string)
            .unwrap_or_else(|| format!("KEY_{code}"));
        Self {
            code: Some(code),
            name,
            modifier: is_modifier_code(code),
        }
    }

    /// Identity for a code/name pair read back from storage. The persisted
    /// name wins for display; classification is always by code.
    pub fn from_parts(code: u32, name: &str) -> Self {
        if name.is_empty() {
            return Self::from_code(code);
        }
        Self {
            code: Some(code),
            name: name.to_string(),
            modifier: is_modifier_code(code),
        }
    }

    /// Identity for a non-ordinary mouse button tracked in the pressed set.
    pub fn from_button(button: MouseButton) -> Self {
        Self {
            code: Some(button.code()),
            name: format!("Mouse{}", button.label()),
            modifier: false,
        }
    }

    pub fn code(&self) -> Option<u32> {
        self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_modifier(&self) -> bool {
        self.modifier
    }
}

impl PartialEq for KeyId {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for KeyId {}

impl Hash for KeyId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Canonicalize a raw key event into a [`KeyId`]. Total and pure.
///
/// The code is the OS-supplied code when present, otherwise resolved from
/// the symbolic name or printable character. Inputs carrying neither a
/// symbolic name nor a printable character are classified as modifiers:
/// such keys are typically special OS keys and must never become a sole
/// terminal trigger.
pub fn identity_of(raw: &RawKey) -> KeyId {
    let code = raw
        .code
        .or_else(|| raw.symbol.as_deref().and_then(key_from_name))
        .or_else(|| raw.ch.and_then(key_from_char));

    let name = if let Some(symbol) = &raw.symbol {
        symbol.clone()
    } else if let Some(ch) = raw.ch {
        ch.to_uppercase().to_string()
    } else if let Some(code) = code {
        key_name(code)
            .map(str::to_string)
            .unwrap_or_else(|| format!("KEY_{code}"))
    } else {
        "UNKNOWN".to_string()
    };

    let modifier = match code {
        Some(code) if is_modifier_code(code) => true,
        _ => raw.symbol.is_none() && raw.ch.is_none(),
    };

    KeyId {
        code,
        name,
        modifier,
    }
}

/// A physical mouse button.
///
/// Buttons live in the `BTN_*` code range (0x110..), disjoint from keyboard
/// key codes. `Left` and `Right` are the two ordinary buttons: they are
/// never tracked and can never complete a binding, so every click does not
/// become a hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Side,
    Extra,
    Forward,
    Back,
    Task,
    Other(u32),
}

impl MouseButton {
    pub fn code(self) -> u32 {
        match self {
            MouseButton::Left => 0x110,
            MouseButton::Right => 0x111,
            MouseButton::Middle => 0x112,
            MouseButton::Side => 0x113,
            MouseButton::Extra => 0x114,
            MouseButton::Forward => 0x115,
            MouseButton::Back => 0x116,
            MouseButton::Task => 0x117,
            MouseButton::Other(code) => code,
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            0x110 => MouseButton::Left,
            0x111 => MouseButton::Right,
            0x112 => MouseButton::Middle,
            0x113 => MouseButton::Side,
            0x114 => MouseButton::Extra,
            0x115 => MouseButton::Forward,
            0x116 => MouseButton::Back,
            0x117 => MouseButton::Task,
            other => MouseButton::Other(other),
        }
    }

    /// Parse a button label as it appears in chord strings, e.g. "Middle".
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "left" => Some(MouseButton::Left),
            "right" => Some(MouseButton::Right),
            "middle" => Some(MouseButton::Middle),
            "side" => Some(MouseButton::Side),
            "extra" => Some(MouseButton::Extra),
            "forward" => Some(MouseButton::Forward),
            "back" => Some(MouseButton::Back),
            "task" => Some(MouseButton::Task),
            _ => None,
        }
    }

    /// The two ordinary buttons users click all day.
    pub fn is_ordinary(self) -> bool {
        matches!(self, MouseButton::Left | MouseButton::Right)
    }

    pub fn label(self) -> String {
        match self {
            MouseButton::Left => "Left".to_string(),
            MouseButton::Right => "Right".to_string(),
            MouseButton::Middle => "Middle".to_string(),
            MouseButton::Side => "Side".to_string(),
            MouseButton::Extra => "Extra".to_string(),
            MouseButton::Forward => "Forward".to_string(),
            MouseButton::Back => "Back".to_string(),
            MouseButton::Task => "Task".to_string(),
            MouseButton::Other(code) => format!("Button{code}"),
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Direction of a scroll-wheel pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// Direction of a raw wheel delta. A zero delta has no direction.
    pub fn from_delta(delta: i32) -> Option<Self> {
        match delta {
            d if d > 0 => Some(ScrollDirection::Up),
            d if d < 0 => Some(ScrollDirection::Down),
            _ => None,
        }
    }

    /// The literal token used in rendered chords and persisted files.
    pub fn token(self) -> &'static str {
        match self {
            ScrollDirection::Up => "<ScrollUp>",
            ScrollDirection::Down => "<ScrollDown>",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "<ScrollUp>" => Some(ScrollDirection::Up),
            "<ScrollDown>" => Some(ScrollDirection::Down),
            _ => None,
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Display name for a key code, sorted table + binary search.
pub fn key_name(code: u32) -> Option<&'static str> {
    KEY_NAMES
        .binary_search_by_key(&code, |&(c, _)| c)
        .ok()
        .map(|idx| KEY_NAMES[idx].1)
}

/// Resolve a key name (or alias) to its code. Case-insensitive.
pub fn key_from_name(name: &str) -> Option<u32> {
    let upper = name.to_uppercase();
    if let Some(&(_, code)) = NAME_ALIASES.iter().find(|(n, _)| *n == upper) {
        return Some(code);
    }
    KEY_NAMES
        .iter()
        .find(|(_, n)| *n == upper)
        .map(|&(code, _)| code)
}

/// Resolve a printable character to its key code.
pub fn key_from_char(c: char) -> Option<u32> {
    if c.is_ascii_alphanumeric() {
        return key_from_name(&c.to_string());
    }
    match c {
        ';' => Some(39),  // SEMICOLON
        '\'' => Some(40), // APOSTROPHE
        '=' => Some(13),  // EQUAL
        '-' => Some(12),  // MINUS
        '`' => Some(41),  // GRAVE
        '[' => Some(26),  // LEFT_BRACE
        ']' => Some(27),  // RIGHT_BRACE
        ',' => Some(51),  // COMMA
        '.' => Some(52),  // DOT
        '/' => Some(53),  // SLASH
        ' ' => Some(57),  // SPACE
        '\\' => Some(43), // BACKSLASH
        _ => None,
    }
}

// Linux input-event-codes, sorted by code for binary search.
static KEY_NAMES: &[(u32, &str)] = &[
    (1, "ESC"),
    (2, "1"),
    (3, "2"),
    (4, "3"),
    (5, "4"),
    (6, "5"),
    (7, "6"),
    (8, "7"),
    (9, "8"),
    (10, "9"),
    (11, "0"),
    (12, "MINUS"),
    (13, "EQUAL"),
    (14, "BACKSPACE"),
    (15, "TAB"),
    (16, "Q"),
    (17, "W"),
    (18, "E"),
    (19, "R"),
    (20, "T"),
    (21, "Y"),
    (22, "U"),
    (23, "I"),
    (24, "O"),
    (25, "P"),
    (26, "LEFT_BRACE"),
    (27, "RIGHT_BRACE"),
    (28, "ENTER"),
    (29, "LEFT_CTRL"),
    (30, "A"),
    (31, "S"),
    (32, "D"),
    (33, "F"),
    (34, "G"),
    (35, "H"),
    (36, "J"),
    (37, "K"),
    (38, "L"),
    (39, "SEMICOLON"),
    (40, "APOSTROPHE"),
    (41, "GRAVE"),
    (42, "LEFT_SHIFT"),
    (43, "BACKSLASH"),
    (44, "Z"),
    (45, "X"),
    (46, "C"),
    (47, "V"),
    (48, "B"),
    (49, "N"),
    (50, "M"),
    (51, "COMMA"),
    (52, "DOT"),
    (53, "SLASH"),
    (54, "RIGHT_SHIFT"),
    (55, "KPASTERISK"),
    (56, "LEFT_ALT"),
    (57, "SPACE"),
    (58, "CAPSLOCK"),
    (59, "F1"),
    (60, "F2"),
    (61, "F3"),
    (62, "F4"),
    (63, "F5"),
    (64, "F6"),
    (65, "F7"),
    (66, "F8"),
    (67, "F9"),
    (68, "F10"),
    (69, "NUMLOCK"),
    (70, "SCROLLLOCK"),
    (87, "F11"),
    (88, "F12"),
    (96, "KPENTER"),
    (97, "RIGHT_CTRL"),
    (98, "KPSLASH"),
    (99, "SYSRQ"),
    (100, "RIGHT_ALT"),
    (102, "HOME"),
    (103, "UP"),
    (104, "PAGE_UP"),
    (105, "LEFT"),
    (106, "RIGHT"),
    (107, "END"),
    (108, "DOWN"),
    (109, "PAGE_DOWN"),
    (110, "INSERT"),
    (111, "DELETE"),
    (113, "MUTE"),
    (114, "VOLUMEDOWN"),
    (115, "VOLUMEUP"),
    (119, "PAUSE"),
    (125, "LEFT_META"),
    (126, "RIGHT_META"),
    (127, "COMPOSE"),
    (139, "MENU"),
    (163, "NEXTSONG"),
    (164, "PLAYPAUSE"),
    (165, "PREVIOUSSONG"),
];

// Generic and alternate spellings accepted in chords and scripts. Generic
// modifier names canonicalize to the left-hand code.
static NAME_ALIASES: &[(&str, u32)] = &[
    ("CTRL", 29),
    ("CONTROL", 29),
    ("SHIFT", 42),
    ("ALT", 56),
    ("OPT", 56),
    ("OPTION", 56),
    ("ALT_GR", 100),
    ("ALTGR", 100),
    ("META", 125),
    ("SUPER", 125),
    ("WIN", 125),
    ("CMD", 125),
    ("COMMAND", 125),
    ("ESCAPE", 1),
    ("RETURN", 28),
    ("DEL", 111),
    ("PRINT", 99),
    ("PRTSCR", 99),
];
