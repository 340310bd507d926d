pub use crate::Result;

use crate::geometry::Pos;
use crate::window::Window;

use std::collections::HashMap;
use std::convert::TryFrom;
use std::vec::Vec;

use anyhow::anyhow;
use strum::EnumIter;

/// Keysym names to the hardware key codes they are bound to.
pub type CodeMap = HashMap<String, u8>;

#[repr(u8)]
#[derive(Debug, PartialEq, EnumIter, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum Modifier {
    Ctrl = 1 << 0,
    Shift = 1 << 1,
    Alt = 1 << 2,
    AltGr = 1 << 3,
    Super = 1 << 4,
    NumLock = 1 << 5,
    ScrollLock = 1 << 6,
}

impl TryFrom<&str> for Modifier {
    type Error = anyhow::Error;

    fn try_from(val: &str) -> Result<Self> {
        match val {
            "A" | "Alt" | "Meta" => Ok(Self::Alt),
            "AGr" | "AltGr" => Ok(Self::AltGr),
            "M" | "Super" => Ok(Self::Super),
            "S" | "Shift" => Ok(Self::Shift),
            "C" | "Ctrl" | "Control" => Ok(Self::Ctrl),
            "N" | "NumLock" => Ok(Self::NumLock),
            "L" | "ScrollLock" => Ok(Self::ScrollLock),
            "1" | "Mod" => Ok(if cfg!(debug_assertions) {
                Self::Alt
            } else {
                Self::Super
            }),
            "2" | "Sec" => Ok(if cfg!(debug_assertions) {
                Self::Super
            } else {
                Self::Alt
            }),
            _ => Err(anyhow!("unable to resolve \"{}\" to modifier", val)),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum Button {
    Left,
    Middle,
    Right,
    ScrollUp,
    ScrollDown,
    Backward,
    Forward,
}

impl TryFrom<&str> for Button {
    type Error = anyhow::Error;

    fn try_from(val: &str) -> Result<Self> {
        match val {
            "1" | "Left" => Ok(Self::Left),
            "2" | "Middle" => Ok(Self::Middle),
            "3" | "Right" => Ok(Self::Right),
            "4" | "ScrollUp" => Ok(Self::ScrollUp),
            "5" | "ScrollDown" => Ok(Self::ScrollDown),
            "8" | "Backward" => Ok(Self::Backward),
            "9" | "Forward" => Ok(Self::Forward),
            _ => Err(anyhow!("unable to resolve \"{}\" to button", val)),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum MouseEventKind {
    Press,
    Release,
    Motion,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum EventTarget {
    Global,
    Root,
    Client,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct MouseEventKey {
    pub kind: MouseEventKind,
    pub target: EventTarget,
}

/// A button together with its modifiers, kept sorted so that equal
/// shortcuts hash equally.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct MouseShortcut {
    pub button: Button,
    pub modifiers: Vec<Modifier>,
}

impl MouseShortcut {
    pub fn new(
        button: Button,
        mut modifiers: Vec<Modifier>,
    ) -> Self {
        modifiers.sort();
        modifiers.dedup();

        Self {
            button,
            modifiers,
        }
    }

    pub fn mask(&self) -> u16 {
        self.modifiers
            .iter()
            .fold(0, |acc, &modifier| acc | u16::from(modifier))
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub window: Window,
    pub subwindow: Option<Window>,
    pub on_root: bool,
    pub root_rpos: Pos,
    pub shortcut: MouseShortcut,
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct KeyCode {
    pub mask: u16,
    pub code: u8,
}

impl KeyCode {
    /// Strips the lock modifiers, which never take part in a binding.
    pub fn without_mask(
        &self,
        mask: u16,
    ) -> Self {
        Self {
            mask: self.mask & !mask,
            code: self.code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcut_modifier_order_is_irrelevant() {
        let a = MouseShortcut::new(Button::Left, vec![Modifier::Shift, Modifier::Alt]);
        let b = MouseShortcut::new(Button::Left, vec![Modifier::Alt, Modifier::Shift]);

        assert_eq!(a, b);
        assert_eq!(a.mask(), b.mask());
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(Modifier::try_from("Hyper").is_err());
        assert!(Button::try_from("6").is_err());
        assert_eq!(Button::try_from("3").ok(), Some(Button::Right));
    }
}
