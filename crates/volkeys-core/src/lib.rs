// Volkeys Core Library
// Keybind capture and matching engine

pub mod alert;
pub mod binding;
pub mod capture;
pub mod codec;
pub mod engine;
pub mod group;
pub mod input;
pub mod key;
pub mod modifier;
pub mod parse;
pub mod settings;
pub mod store;

pub use alert::{AlertSink, LogAlert};
pub use binding::{Binding, BindingError, InputCandidate, Origin, Trigger};
pub use capture::{CaptureError, CaptureSession, CaptureState, Collector};
pub use codec::{
    decode_group, encode_group, BindingDecodeError, CorruptError, DecodedGroup,
};
pub use engine::{ActionFn, ListenError, Listener, LiveInputState, MatchEngine};
pub use group::{BindingGroup, GroupError};
pub use input::{
    HookError, InputEvent, InputSource, Interest, RawKey, ScriptedSource,
};
pub use key::{
    identity_of, key_from_char, key_from_name, key_name, KeyId, MouseButton, ScrollDirection,
};
pub use modifier::{is_modifier_code, modifier_name, MODIFIER_KEY_CODES};
pub use parse::{parse_chord, ChordParseError};
pub use settings::{Settings, SettingsError};
pub use store::{BindingStore, StoreError};
