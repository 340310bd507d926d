use crate::geometry::Pos;
use crate::geometry::Region;
use crate::input::KeyCode;
use crate::input::MouseEvent;
use crate::window::Window;

#[derive(Debug, Clone)]
pub enum Event {
    Mouse {
        event: MouseEvent,
    },
    Key {
        key_code: KeyCode,
    },
    MapRequest {
        window: Window,
        ignore: bool,
    },
    Enter {
        window: Window,
        root_rpos: Pos,
        window_rpos: Pos,
    },
    Leave {
        window: Window,
        root_rpos: Pos,
        window_rpos: Pos,
    },
    Destroy {
        window: Window,
    },
    Expose {
        window: Window,
    },
    Unmap {
        window: Window,
        ignore: bool,
    },
    ConfigureRequest {
        window: Window,
        changes: WindowChanges,
        on_root: bool,
    },
    Configure {
        window: Window,
        region: Region,
        on_root: bool,
    },
    Property {
        window: Window,
        kind: PropertyKind,
        on_root: bool,
    },
    Mapping {
        request: u8,
    },
}

#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq)]
pub enum StackMode {
    Above,
    Below,
    TopIf,
    BottomIf,
    Opposite,
}

/// The fields a client asked to change in a ConfigureRequest; absent
/// fields were not part of the request's value mask.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WindowChanges {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub border_width: Option<u32>,
    pub sibling: Option<Window>,
    pub stack_mode: Option<StackMode>,
}

impl Default for WindowChanges {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            width: None,
            height: None,
            border_width: None,
            sibling: None,
            stack_mode: None,
        }
    }
}

impl WindowChanges {
    #[inline]
    pub fn changes_geometry(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.width.is_some() || self.height.is_some()
    }

    #[inline]
    pub fn changes_size(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }
}

#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq)]
pub enum PropertyKind {
    Name,
    Size,
    TransientFor,
}
