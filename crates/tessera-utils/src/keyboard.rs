//! Key codes and keystroke normalization.
//!
//! A keystroke is encoded as one number: the key code plus modifier bits.
//! Definitions like `"Ctrl+Shift+A"` and live keyboard events map into the
//! same code space, which is what [`KeystrokeHandler`](crate::KeystrokeHandler)
//! dispatches on.

use smol_str::SmolStr;

use crate::dom::{DomEvent, KeyboardEventInit};
use crate::env::Env;
use crate::error::{Error, Result};
use crate::locale::LanguageDirection;

pub const CTRL: u32 = 0x110000;
pub const SHIFT: u32 = 0x220000;
pub const CMD: u32 = 0x440000;
pub const ALT: u32 = 0x880000;

const MODIFIER_MASK: u32 = CTRL | SHIFT | CMD | ALT;

pub const ARROW_LEFT: u32 = 37;
pub const ARROW_UP: u32 = 38;
pub const ARROW_RIGHT: u32 = 39;
pub const ARROW_DOWN: u32 = 40;
pub const BACKSPACE: u32 = 8;
pub const DELETE: u32 = 46;
pub const ENTER: u32 = 13;
pub const SPACE: u32 = 32;
pub const ESC: u32 = 27;
pub const TAB: u32 = 9;

/// Look up the code of a key or modifier name (case-insensitive).
pub fn key_code(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    let code = match name.as_str() {
        "arrowleft" => ARROW_LEFT,
        "arrowup" => ARROW_UP,
        "arrowright" => ARROW_RIGHT,
        "arrowdown" => ARROW_DOWN,
        "backspace" => BACKSPACE,
        "delete" => DELETE,
        "enter" => ENTER,
        "space" => SPACE,
        "esc" => ESC,
        "tab" => TAB,
        "ctrl" => CTRL,
        "shift" => SHIFT,
        "alt" => ALT,
        "cmd" => CMD,
        "'" => 222,
        "," => 108,
        "-" => 109,
        "." => 110,
        "/" => 111,
        ";" => 186,
        "=" => 187,
        "[" => 219,
        "\\" => 220,
        "]" => 221,
        "`" => 223,
        _ => return single_char_code(&name).or_else(|| function_key_code(&name)),
    };
    Some(code)
}

fn single_char_code(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match c {
        'a'..='z' => Some(c as u32 - 'a' as u32 + 65),
        '0'..='9' => Some(c as u32 - '0' as u32 + 48),
        _ => None,
    }
}

fn function_key_code(name: &str) -> Option<u32> {
    let number: u32 = name.strip_prefix('f')?.parse().ok()?;
    (1..=12).contains(&number).then(|| 111 + number)
}

/// Name of a plain key code, the inverse of [`key_code`] for keys.
pub fn key_name(code: u32) -> Option<SmolStr> {
    let name = match code {
        ARROW_LEFT => "arrowleft",
        ARROW_UP => "arrowup",
        ARROW_RIGHT => "arrowright",
        ARROW_DOWN => "arrowdown",
        BACKSPACE => "backspace",
        DELETE => "delete",
        ENTER => "enter",
        SPACE => "space",
        ESC => "esc",
        TAB => "tab",
        65..=90 => return char_name(code - 65 + 'a' as u32),
        48..=57 => return char_name(code - 48 + '0' as u32),
        112..=123 => return Some(smol_str::format_smolstr!("f{}", code - 111)),
        _ => return None,
    };
    Some(SmolStr::new(name))
}

fn char_name(code: u32) -> Option<SmolStr> {
    char::from_u32(code).map(|c| SmolStr::new(c.encode_utf8(&mut [0; 4])))
}

/// One element of a keystroke definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    Name(SmolStr),
    Code(u32),
}

impl From<&str> for KeyPart {
    fn from(name: &str) -> Self {
        Self::Name(SmolStr::new(name))
    }
}

impl From<u32> for KeyPart {
    fn from(code: u32) -> Self {
        Self::Code(code)
    }
}

/// A keystroke definition: `"Ctrl+B"`, a list of parts, or a ready code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keystroke {
    Text(SmolStr),
    Parts(Vec<KeyPart>),
    Code(u32),
}

impl From<&str> for Keystroke {
    fn from(text: &str) -> Self {
        Self::Text(SmolStr::new(text))
    }
}

impl From<u32> for Keystroke {
    fn from(code: u32) -> Self {
        Self::Code(code)
    }
}

impl<P: Into<KeyPart>, const N: usize> From<[P; N]> for Keystroke {
    fn from(parts: [P; N]) -> Self {
        Self::Parts(parts.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<KeyPart>> for Keystroke {
    fn from(parts: Vec<KeyPart>) -> Self {
        Self::Parts(parts)
    }
}

/// Split `"Ctrl+Shift+A"` into trimmed tokens.
fn split_keystroke_text(text: &str) -> Vec<&str> {
    // A trailing `+` means the plus key itself, which has no code here, so
    // empty tokens are simply dropped.
    text.split('+')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Code of a named key with the platform `Ctrl` → `Cmd` mapping.
///
/// A trailing `!` (`"Ctrl!"`) opts out of the mapping.
fn env_key_code(name: &str, env: Env) -> Result<u32> {
    if let Some(exact) = name.strip_suffix('!') {
        return key_code(exact).ok_or_else(|| unknown(exact));
    }
    let code = key_code(name).ok_or_else(|| unknown(name))?;
    Ok(if env.is_mac && code == CTRL { CMD } else { code })
}

fn unknown(name: &str) -> Error {
    Error::UnknownKey {
        key: SmolStr::new(name),
    }
}

/// Normalize a keystroke definition into its numeric code.
pub fn parse_keystroke(keystroke: &Keystroke, env: Env) -> Result<u32> {
    match keystroke {
        Keystroke::Code(code) => Ok(*code),
        Keystroke::Text(text) => split_keystroke_text(text)
            .into_iter()
            .try_fold(0, |sum, token| -> Result<u32> {
                Ok(sum + env_key_code(token, env)?)
            }),
        Keystroke::Parts(parts) => parts.iter().try_fold(0, |sum, part| -> Result<u32> {
            Ok(sum
                + match part {
                    KeyPart::Name(name) => env_key_code(name, env)?,
                    KeyPart::Code(code) => *code,
                })
        }),
    }
}

/// Key and modifier state of a keyboard event, plus the DOM event it came
/// from (if any) so handlers can cancel it.
#[derive(Debug, Clone, Default)]
pub struct KeyEventData {
    pub key_code: u32,
    pub ctrl_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
    pub meta_key: bool,
    pub dom_event: Option<DomEvent>,
}

impl KeyEventData {
    pub fn new(key_code: u32) -> Self {
        Self {
            key_code,
            ..Self::default()
        }
    }

    /// Build event data from a keystroke definition, e.g. `"Ctrl+K"`.
    pub fn from_keystroke(keystroke: impl Into<Keystroke>, env: Env) -> Result<Self> {
        let code = parse_keystroke(&keystroke.into(), env)?;
        Ok(Self {
            key_code: code & !MODIFIER_MASK,
            ctrl_key: code & CTRL == CTRL,
            shift_key: code & SHIFT == SHIFT,
            alt_key: code & ALT == ALT,
            meta_key: code & CMD == CMD,
            dom_event: None,
        })
    }

    /// Event data of a native keyboard event. Non-keyboard events yield
    /// key code `0`.
    pub fn from_dom(event: &DomEvent) -> Self {
        let init = event.keyboard_init().unwrap_or_default();
        Self {
            key_code: init.key_code,
            ctrl_key: init.ctrl_key,
            shift_key: init.shift_key,
            alt_key: init.alt_key,
            meta_key: init.meta_key,
            dom_event: Some(event.clone()),
        }
    }

    /// A native `keydown` event carrying this key state.
    pub fn to_dom_event(&self, kind: &str) -> DomEvent {
        DomEvent::keyboard(
            kind,
            KeyboardEventInit {
                key_code: self.key_code,
                ctrl_key: self.ctrl_key,
                shift_key: self.shift_key,
                alt_key: self.alt_key,
                meta_key: self.meta_key,
            },
        )
    }

    pub fn prevent_default(&self) {
        if let Some(event) = &self.dom_event {
            event.prevent_default();
        }
    }

    pub fn stop_propagation(&self) {
        if let Some(event) = &self.dom_event {
            event.stop_propagation();
        }
    }
}

/// Code of the keystroke a key event represents.
pub fn keystroke_code(data: &KeyEventData) -> u32 {
    let mut code = data.key_code;
    if data.ctrl_key {
        code += CTRL;
    }
    if data.shift_key {
        code += SHIFT;
    }
    if data.alt_key {
        code += ALT;
    }
    if data.meta_key {
        code += CMD;
    }
    code
}

/// Human-readable form of a keystroke for tooltips.
///
/// On Mac the modifiers become symbols (`⌘B`, `⇧⌘Z`); elsewhere tokens are
/// capitalized and joined with `+` (`Ctrl+B`).
pub fn keystroke_text(keystroke: &str, env: Env) -> String {
    let tokens = split_keystroke_text(keystroke);
    if !env.is_mac {
        return tokens
            .iter()
            .map(|token| capitalize(token.trim_end_matches('!')))
            .collect::<Vec<_>>()
            .join("+");
    }

    let mut modifiers = 0;
    let mut keys = Vec::new();
    for token in tokens {
        match env_key_code(token, env) {
            Ok(code) if code & MODIFIER_MASK == code && code != 0 => modifiers |= code,
            _ => keys.push(capitalize(token)),
        }
    }
    let mut text = String::new();
    for (bit, symbol) in [(CTRL, '⌃'), (ALT, '⌥'), (SHIFT, '⇧'), (CMD, '⌘')] {
        if modifiers & bit == bit {
            text.push(symbol);
        }
    }
    text.push_str(&keys.join("+"));
    text
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn is_arrow_key_code(code: u32) -> bool {
    matches!(code, ARROW_LEFT | ARROW_UP | ARROW_RIGHT | ARROW_DOWN)
}

/// Swap left and right arrows for right-to-left content.
pub fn get_localized_arrow_key_code(code: u32, direction: LanguageDirection) -> u32 {
    if direction == LanguageDirection::Ltr {
        return code;
    }
    match code {
        ARROW_LEFT => ARROW_RIGHT,
        ARROW_RIGHT => ARROW_LEFT,
        other => other,
    }
}

/// Whether the arrow moves "forward" in reading order.
pub fn is_forward_arrow_key_code(code: u32, direction: LanguageDirection) -> bool {
    let localized = get_localized_arrow_key_code(code, direction);
    localized == ARROW_DOWN || localized == ARROW_RIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parses_text_parts_and_codes_alike() {
        let env = Env::other();
        let from_text = parse_keystroke(&"Ctrl+Shift+A".into(), env).unwrap();
        let from_parts = parse_keystroke(&["ctrl", "shift", "a"].into(), env).unwrap();
        let mixed = parse_keystroke(
            &Keystroke::Parts(vec![KeyPart::Code(CTRL), "shift".into(), KeyPart::Code(65)]),
            env,
        )
        .unwrap();

        assert_eq!(from_text, CTRL + SHIFT + 65);
        assert_eq!(from_parts, from_text);
        assert_eq!(mixed, from_text);
        assert_eq!(parse_keystroke(&"F10".into(), env).unwrap(), 121);
        assert_eq!(parse_keystroke(&"alt + 9".into(), env).unwrap(), ALT + 57);
    }

    #[test]
    fn mac_maps_ctrl_to_cmd_unless_forced() {
        let mac = Env::mac();
        assert_eq!(parse_keystroke(&"Ctrl+B".into(), mac).unwrap(), CMD + 66);
        assert_eq!(parse_keystroke(&"Ctrl!+B".into(), mac).unwrap(), CTRL + 66);
        assert_eq!(parse_keystroke(&"Ctrl+B".into(), Env::other()).unwrap(), CTRL + 66);
    }

    #[test]
    fn unknown_keys_are_reported_by_kind() {
        let err = parse_keystroke(&"Ctrl+Hyper".into(), Env::other()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownKey);
        assert_eq!(err.code(), "keyboard-unknown-key");
    }

    #[test]
    fn event_data_matches_definition_codes() {
        let env = Env::other();
        let data = KeyEventData::from_keystroke("Shift+Tab", env).unwrap();
        assert!(data.shift_key && !data.ctrl_key);
        assert_eq!(data.key_code, TAB);
        assert_eq!(
            keystroke_code(&data),
            parse_keystroke(&"Shift+Tab".into(), env).unwrap()
        );

        let event = data.to_dom_event("keydown");
        assert_eq!(keystroke_code(&KeyEventData::from_dom(&event)), SHIFT + TAB);
    }

    #[test]
    fn tooltip_text() {
        assert_eq!(keystroke_text("ctrl+b", Env::other()), "Ctrl+B");
        assert_eq!(keystroke_text("Ctrl+Shift+Z", Env::mac()), "⇧⌘Z");
        assert_eq!(keystroke_text("Ctrl!+Alt+K", Env::mac()), "⌃⌥K");
    }

    #[test]
    fn arrows_flip_for_rtl() {
        assert_eq!(
            get_localized_arrow_key_code(ARROW_LEFT, LanguageDirection::Rtl),
            ARROW_RIGHT
        );
        assert_eq!(
            get_localized_arrow_key_code(ARROW_UP, LanguageDirection::Rtl),
            ARROW_UP
        );
        assert!(is_forward_arrow_key_code(ARROW_LEFT, LanguageDirection::Rtl));
        assert!(!is_forward_arrow_key_code(ARROW_LEFT, LanguageDirection::Ltr));
        assert!(is_arrow_key_code(ARROW_DOWN) && !is_arrow_key_code(TAB));
        assert_eq!(key_name(121).as_deref(), Some("f10"));
        assert_eq!(key_code("Z"), Some(90));
    }
}
