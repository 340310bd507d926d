use winsys::event::Event;
use winsys::geometry::Pos;
use winsys::geometry::Region;
use winsys::input::MouseEventKind;
use winsys::window::Window;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DragKind {
    Move,
    Resize,
}

/// A pointer-driven move or resize in progress.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Drag {
    kind: DragKind,
    window: Window,
    grip: Pos,
    origin: Region,
    border: u32,
}

impl Drag {
    pub fn new(
        kind: DragKind,
        window: Window,
        grip: Pos,
        origin: Region,
        border: u32,
    ) -> Self {
        Self {
            kind,
            window,
            grip,
            origin,
            border,
        }
    }

    #[inline]
    pub fn kind(&self) -> DragKind {
        self.kind
    }

    #[inline]
    pub fn window(&self) -> Window {
        self.window
    }

    #[inline]
    pub fn origin(&self) -> Region {
        self.origin
    }

    /// Where the pointer is put when a resize starts: the last pixel of
    /// the window's bottom-right border corner.
    pub fn resize_grip(
        region: &Region,
        border: u32,
    ) -> Pos {
        let border = 2 * border as i32;

        Pos {
            x: region.pos.x + region.dim.w + border - 1,
            y: region.pos.y + region.dim.h + border - 1,
        }
    }

    /// Events processed while dragging; the rest wait until release.
    pub fn handles(event: &Event) -> bool {
        match event {
            Event::Mouse {
                event,
            } => match event.kind {
                MouseEventKind::Motion | MouseEventKind::Release => true,
                MouseEventKind::Press => false,
            },
            Event::ConfigureRequest {
                ..
            }
            | Event::Expose {
                ..
            }
            | Event::MapRequest {
                ..
            } => true,
            _ => false,
        }
    }

    /// The geometry the dragged window takes for the given pointer
    /// position. Moves snap to the edges of `area` within `snap` pixels.
    pub fn region_for(
        &self,
        pointer: Pos,
        area: &Region,
        snap: i32,
    ) -> Region {
        let border = 2 * self.border as i32;
        let mut region = self.origin;

        match self.kind {
            DragKind::Move => {
                let delta = pointer - self.grip;
                region.pos = self.origin.pos + delta;

                let (area_pos, area_dim) = area.values();
                let right = area_pos.x + area_dim.w;
                let bottom = area_pos.y + area_dim.h;

                if (area_pos.x - region.pos.x).abs() < snap {
                    region.pos.x = area_pos.x;
                } else if (right - (region.pos.x + region.dim.w + border)).abs() < snap {
                    region.pos.x = right - region.dim.w - border;
                }

                if (area_pos.y - region.pos.y).abs() < snap {
                    region.pos.y = area_pos.y;
                } else if (bottom - (region.pos.y + region.dim.h + border)).abs() < snap {
                    region.pos.y = bottom - region.dim.h - border;
                }
            },
            DragKind::Resize => {
                region.dim.w = std::cmp::max(pointer.x - self.origin.pos.x - border + 1, 1);
                region.dim.h = std::cmp::max(pointer.y - self.origin.pos.y - border + 1, 1);
            },
        }

        region
    }

    /// Whether the drag has carried the window more than `snap` pixels
    /// away from where it started.
    pub fn exceeds_snap(
        &self,
        region: &Region,
        snap: i32,
    ) -> bool {
        match self.kind {
            DragKind::Move => {
                (region.pos.x - self.origin.pos.x).abs() > snap
                    || (region.pos.y - self.origin.pos.y).abs() > snap
            },
            DragKind::Resize => {
                (region.dim.w - self.origin.dim.w).abs() > snap
                    || (region.dim.h - self.origin.dim.h).abs() > snap
            },
        }
    }
}
