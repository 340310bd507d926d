use std::ops::Add;
use std::ops::Sub;

#[derive(Debug, PartialOrd, Ord, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Debug, Copy, Clone, Hash, PartialOrd, Ord, PartialEq, Eq)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Default for Pos {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
        }
    }
}

impl Pos {
    pub fn values(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn dist(
        &self,
        pos: Self,
    ) -> Distance {
        Distance {
            dx: (pos.x - self.x),
            dy: (pos.y - self.y),
        }
    }
}

impl Add<Distance> for Pos {
    type Output = Self;

    fn add(
        self,
        dist: Distance,
    ) -> Self::Output {
        Self::Output {
            x: self.x + dist.dx,
            y: self.y + dist.dy,
        }
    }
}

impl Sub for Pos {
    type Output = Distance;

    fn sub(
        self,
        other: Self,
    ) -> Self::Output {
        other.dist(self)
    }
}

#[derive(Debug, Copy, Clone, Hash, PartialOrd, Ord, PartialEq, Eq)]
pub struct Dim {
    pub w: i32,
    pub h: i32,
}

impl Default for Dim {
    fn default() -> Self {
        Self {
            w: 0,
            h: 0,
        }
    }
}

impl Dim {
    pub fn values(&self) -> (i32, i32) {
        (self.w, self.h)
    }

    #[inline]
    pub fn area(&self) -> i64 {
        if self.w <= 0 || self.h <= 0 {
            0
        } else {
            self.w as i64 * self.h as i64
        }
    }
}

#[derive(Debug, Copy, Clone, Hash, PartialOrd, Ord, PartialEq, Eq)]
pub struct Region {
    pub pos: Pos,
    pub dim: Dim,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            pos: Default::default(),
            dim: Default::default(),
        }
    }
}

impl Region {
    pub fn new(
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    ) -> Self {
        Self {
            pos: Pos {
                x,
                y,
            },
            dim: Dim {
                w,
                h,
            },
        }
    }

    pub fn values(&self) -> (Pos, Dim) {
        (self.pos, self.dim)
    }

    #[inline]
    pub fn area(&self) -> i64 {
        self.dim.area()
    }

    pub fn encompasses(
        &self,
        pos: Pos,
    ) -> bool {
        pos.x >= self.pos.x
            && pos.y >= self.pos.y
            && pos.x <= self.pos.x + self.dim.w
            && pos.y <= self.pos.y + self.dim.h
    }

    pub fn contains(
        &self,
        region: Region,
    ) -> bool {
        self.encompasses(region.pos) && self.encompasses(region.bottom_right())
    }

    /// The shared area of two regions, if they have one.
    pub fn intersection(
        &self,
        other: &Region,
    ) -> Option<Region> {
        let left = std::cmp::max(self.pos.x, other.pos.x);
        let top = std::cmp::max(self.pos.y, other.pos.y);
        let right = std::cmp::min(self.pos.x + self.dim.w, other.pos.x + other.dim.w);
        let bottom = std::cmp::min(self.pos.y + self.dim.h, other.pos.y + other.dim.h);

        if right > left && bottom > top {
            Some(Region::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    #[inline]
    pub fn overlaps(
        &self,
        other: &Region,
    ) -> bool {
        self.intersection(other).is_some()
    }

    pub fn split_at_width(
        &self,
        width: i32,
    ) -> (Self, Self) {
        let width = std::cmp::min(width, self.dim.w);

        (
            Self {
                dim: Dim {
                    w: width,
                    ..self.dim
                },
                ..*self
            },
            Self {
                pos: Pos {
                    x: self.pos.x + width,
                    ..self.pos
                },
                dim: Dim {
                    w: self.dim.w - width,
                    ..self.dim
                },
            },
        )
    }

    pub fn split_at_height(
        &self,
        height: i32,
    ) -> (Self, Self) {
        let height = std::cmp::min(height, self.dim.h);

        (
            Self {
                dim: Dim {
                    h: height,
                    ..self.dim
                },
                ..*self
            },
            Self {
                pos: Pos {
                    y: self.pos.y + height,
                    ..self.pos
                },
                dim: Dim {
                    h: self.dim.h - height,
                    ..self.dim
                },
            },
        )
    }

    /// Shrinks the region by a border of the given width on each side,
    /// keeping the position.
    pub fn without_border(
        mut self,
        border: u32,
    ) -> Self {
        self.dim.w -= 2 * border as i32;
        self.dim.h -= 2 * border as i32;
        self
    }

    pub fn with_border(
        mut self,
        border: u32,
    ) -> Self {
        self.dim.w += 2 * border as i32;
        self.dim.h += 2 * border as i32;
        self
    }

    pub fn bottom_right(&self) -> Pos {
        Pos {
            x: self.pos.x + self.dim.w,
            y: self.pos.y + self.dim.h,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq)]
pub struct Distance {
    pub dx: i32,
    pub dy: i32,
}

impl Distance {
    pub fn values(&self) -> (i32, i32) {
        (self.dx, self.dy)
    }
}
