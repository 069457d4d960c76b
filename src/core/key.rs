//! # Keys
//!
//! The small alphabet every decoded keystroke is reduced to. A `Key` is built
//! once by the decoder and never mutated afterwards; listeners receive it by
//! reference.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Symbolic key identifier, or the literal character for everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyName {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Space,
    Enter,
    Cancel,
    Tab,
    Backspace,
    Escape,
    /// Any other character, named after itself.
    Char(char),
}

impl KeyName {
    const NAMED: [(KeyName, &'static str); 12] = [
        (KeyName::Up, "up"),
        (KeyName::Down, "down"),
        (KeyName::Left, "left"),
        (KeyName::Right, "right"),
        (KeyName::Home, "home"),
        (KeyName::End, "end"),
        (KeyName::Space, "space"),
        (KeyName::Enter, "enter"),
        (KeyName::Cancel, "cancel"),
        (KeyName::Tab, "tab"),
        (KeyName::Backspace, "backspace"),
        (KeyName::Escape, "escape"),
    ];
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let KeyName::Char(c) = self {
            return write!(f, "{c}");
        }
        let label = Self::NAMED
            .iter()
            .find(|(name, _)| name == self)
            .map(|(_, label)| *label)
            .unwrap_or("?");
        f.write_str(label)
    }
}

/// Error returned when a key name in configuration is neither a known symbol
/// nor a single character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyNameError(pub String);

impl fmt::Display for ParseKeyNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown key name: {:?}", self.0)
    }
}

impl std::error::Error for ParseKeyNameError {}

impl FromStr for KeyName {
    type Err = ParseKeyNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        if let Some((name, _)) = Self::NAMED.iter().find(|(_, label)| *label == lowered) {
            return Ok(*name);
        }
        // "esc" and "return" are common enough in configs to accept
        match lowered.as_str() {
            "esc" => return Ok(KeyName::Escape),
            "return" => return Ok(KeyName::Enter),
            _ => {}
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(KeyName::Char(c)),
            _ => Err(ParseKeyNameError(s.to_string())),
        }
    }
}

impl Serialize for KeyName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One decoded keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub name: KeyName,
    /// The literal character when the key is printable.
    pub char: Option<char>,
    pub shift: bool,
    pub ctrl: bool,
}

impl Key {
    /// A non-printable key such as an arrow or Enter.
    pub fn named(name: KeyName) -> Self {
        let char = match name {
            KeyName::Space => Some(' '),
            _ => None,
        };
        Self {
            name,
            char,
            shift: false,
            ctrl: name == KeyName::Cancel,
        }
    }

    /// A printable character key.
    pub fn char(c: char) -> Self {
        Self {
            name: KeyName::Char(c),
            char: Some(c),
            shift: c.is_uppercase(),
            ctrl: false,
        }
    }

    /// A control character that has no dedicated name (e.g. Ctrl+A).
    pub fn control(c: char) -> Self {
        Self {
            name: KeyName::Char(c),
            char: None,
            shift: false,
            ctrl: true,
        }
    }

    /// Printable characters carry their literal value; everything else does not.
    pub fn is_printable(&self) -> bool {
        self.char.is_some()
    }
}
