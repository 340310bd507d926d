use crate::geometry::Region;

pub type Window = u32;

#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq)]
pub enum IcccmWindowState {
    Withdrawn,
    Normal,
    Iconic,
}

/// Server-side attributes of a top-level window, as reported when it is
/// first discovered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WindowAttributes {
    pub region: Region,
    pub border_width: u32,
    pub override_redirect: bool,
    pub viewable: bool,
}

impl WindowAttributes {
    pub fn new(
        region: Region,
        border_width: u32,
    ) -> Self {
        Self {
            region,
            border_width,
            override_redirect: false,
            viewable: false,
        }
    }
}
