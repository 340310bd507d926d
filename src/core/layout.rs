use crate::error::StateChangeError;

use winsys::geometry::Region;

use strum::EnumCount;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use strum_macros::ToString;

use std::string::ToString;
use std::vec::Vec;

/// Maps a work area and a tiled client count to one outer rectangle per
/// client, or to nothing when the layout leaves geometry alone.
type LayoutFn = fn(&Region, &LayoutData, usize) -> Option<Vec<Region>>;

#[non_exhaustive]
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct LayoutData {
    pub main_count: u32,
    pub main_factor: f32,
    pub column_count: u32,
}

impl Default for LayoutData {
    fn default() -> Self {
        Self {
            main_count: 1u32,
            main_factor: 0.60f32,
            column_count: 1u32,
        }
    }
}

#[non_exhaustive]
#[repr(u8)]
#[derive(
    Debug, Hash, PartialEq, Eq, Clone, Copy, EnumIter, EnumCount, EnumString, ToString,
)]
pub enum LayoutKind {
    #[strum(serialize = "tile")]
    Tile = b'[',
    #[strum(serialize = "tileleft")]
    TileLeft = b']',
    #[strum(serialize = "grid")]
    Grid = b'#',
    #[strum(serialize = "spiral")]
    Spiral = b'@',
    #[strum(serialize = "dwindle")]
    Dwindle = b'\\',
    #[strum(serialize = "max")]
    Max = b'M',
    #[strum(serialize = "floating")]
    Floating = b'~',
}

/// Splits `len` pixels starting at `start` into `count` runs; the last run
/// takes the remainder.
#[inline]
fn split_evenly(
    start: i32,
    len: i32,
    count: i32,
) -> Vec<(i32, i32)> {
    if count <= 0 {
        return Vec::with_capacity(0);
    }

    let step = len / count;

    (0..count)
        .map(|i| {
            if i == count - 1 {
                (start + i * step, len - i * step)
            } else {
                (start + i * step, step)
            }
        })
        .collect()
}

impl LayoutKind {
    pub fn symbol(&self) -> char {
        (*self as u8) as char
    }

    pub fn name(&self) -> String {
        self.to_string()
    }

    #[inline]
    pub fn count() -> usize {
        Self::COUNT
    }

    #[inline]
    pub fn is_floating(&self) -> bool {
        *self == LayoutKind::Floating
    }

    /// Layouts with a master column whose parameters can be adjusted.
    #[inline]
    pub fn has_main_column(&self) -> bool {
        match *self {
            LayoutKind::Tile | LayoutKind::TileLeft => true,
            _ => false,
        }
    }

    #[inline]
    pub fn arrange(
        &self,
        region: &Region,
        data: &LayoutData,
        n: usize,
    ) -> Option<Vec<Region>> {
        (self.func())(region, data, n)
    }

    fn tile(
        region: &Region,
        data: &LayoutData,
        n: usize,
        mirrored: bool,
    ) -> Vec<Region> {
        if n == 0 {
            return Vec::with_capacity(0);
        }

        let (pos, dim) = region.values();
        let n = n as i32;

        let n_main = std::cmp::min(n, data.main_count as i32);
        let n_stack = n - n_main;

        let main_width = if n_main == 0 {
            0
        } else if n_stack == 0 {
            dim.w
        } else {
            (dim.w as f32 * data.main_factor).round() as i32
        };

        let (main_x, stack_x) = if mirrored {
            (pos.x + dim.w - main_width, pos.x)
        } else {
            (pos.x, pos.x + main_width)
        };

        let mut regions = Vec::with_capacity(n as usize);

        for (y, h) in split_evenly(pos.y, dim.h, n_main) {
            regions.push(Region::new(main_x, y, main_width, h));
        }

        if n_stack > 0 {
            let column_count = std::cmp::max(
                1,
                std::cmp::min(n_stack, data.column_count as i32),
            );

            let per_column = n_stack / column_count;
            let columns = split_evenly(stack_x, dim.w - main_width, column_count);

            for (i, (x, w)) in columns.into_iter().enumerate() {
                let i = i as i32;
                let count = if i == column_count - 1 {
                    n_stack - i * per_column
                } else {
                    per_column
                };

                for (y, h) in split_evenly(pos.y, dim.h, count) {
                    regions.push(Region::new(x, y, w, h));
                }
            }
        }

        regions
    }

    fn grid(
        region: &Region,
        n: usize,
    ) -> Vec<Region> {
        if n == 0 {
            return Vec::with_capacity(0);
        }

        let (pos, dim) = region.values();
        let n = n as i32;

        let mut rows = 0;
        while rows * rows < n {
            rows += 1;
        }

        let cols = if (rows - 1) * rows >= n { rows - 1 } else { rows };
        let used_rows = (n + cols - 1) / cols;

        split_evenly(pos.y, dim.h, used_rows)
            .into_iter()
            .enumerate()
            .flat_map(|(row, (y, h))| {
                let row = row as i32;
                let in_row = std::cmp::min(cols, n - row * cols);

                split_evenly(pos.x, dim.w, in_row)
                    .into_iter()
                    .map(move |(x, w)| Region::new(x, y, w, h))
            })
            .collect()
    }

    /// Fibonacci partition: each client takes half of what is left, the
    /// split alternating between width and height.
    fn fibonacci(
        region: &Region,
        n: usize,
        spiral: bool,
    ) -> Vec<Region> {
        let mut regions = Vec::with_capacity(n);
        let mut remaining = *region;

        for i in 0..n {
            if i == n - 1 {
                regions.push(remaining);
                break;
            }

            let split_width = match (i % 2 == 0, remaining.dim.w >= 2, remaining.dim.h >= 2) {
                (_, false, false) => {
                    // too small to split any further
                    regions.extend(std::iter::repeat(remaining).take(n - i));
                    break;
                },
                (true, true, _) | (false, true, false) => true,
                _ => false,
            };

            let (client, rest) = if split_width {
                let half = remaining.dim.w / 2;

                if spiral && i % 4 >= 2 {
                    let (rest, client) = remaining.split_at_width(remaining.dim.w - half);
                    (client, rest)
                } else {
                    remaining.split_at_width(half)
                }
            } else {
                let half = remaining.dim.h / 2;

                if spiral && i % 4 >= 2 {
                    let (rest, client) = remaining.split_at_height(remaining.dim.h - half);
                    (client, rest)
                } else {
                    remaining.split_at_height(half)
                }
            };

            regions.push(client);
            remaining = rest;
        }

        regions
    }

    fn func(&self) -> LayoutFn {
        match *self {
            LayoutKind::Tile => |region, data, n| Some(Self::tile(region, data, n, false)),
            LayoutKind::TileLeft => |region, data, n| Some(Self::tile(region, data, n, true)),
            LayoutKind::Grid => |region, _, n| Some(Self::grid(region, n)),
            LayoutKind::Spiral => |region, _, n| Some(Self::fibonacci(region, n, true)),
            LayoutKind::Dwindle => |region, _, n| Some(Self::fibonacci(region, n, false)),
            LayoutKind::Max => |region, _, n| Some(vec![*region; n]),
            LayoutKind::Floating => |_, _, _| None,
        }
    }
}

pub struct Layout {
    kind: LayoutKind,
    prev_kind: LayoutKind,
    data: LayoutData,
}

impl Layout {
    pub const MIN_MAIN_FACTOR: f32 = 0.10f32;
    pub const MAX_MAIN_FACTOR: f32 = 0.90f32;
    pub const MAX_MAIN_COUNT: u32 = 16;
    pub const MAX_COLUMN_COUNT: u32 = 16;

    #[inline]
    pub fn new(
        kind: LayoutKind,
        data: LayoutData,
    ) -> Self {
        Self {
            kind,
            prev_kind: kind,
            data: Self::clamp_data(data),
        }
    }

    pub fn clamp_data(data: LayoutData) -> LayoutData {
        LayoutData {
            main_count: std::cmp::min(data.main_count, Self::MAX_MAIN_COUNT),
            main_factor: data
                .main_factor
                .max(Self::MIN_MAIN_FACTOR)
                .min(Self::MAX_MAIN_FACTOR),
            column_count: std::cmp::max(
                1,
                std::cmp::min(data.column_count, Self::MAX_COLUMN_COUNT),
            ),
        }
    }

    #[inline]
    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    #[inline]
    pub fn prev_kind(&self) -> LayoutKind {
        self.prev_kind
    }

    #[inline]
    pub fn data(&self) -> &LayoutData {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut LayoutData {
        &mut self.data
    }

    #[inline]
    pub fn set_kind(
        &mut self,
        kind: LayoutKind,
    ) -> Result<LayoutKind, StateChangeError> {
        if kind == self.kind {
            return Err(StateChangeError::EarlyStop);
        }

        self.prev_kind = self.kind;
        self.kind = kind;

        Ok(self.prev_kind)
    }

    #[inline]
    pub fn arrange(
        &self,
        region: &Region,
        n: usize,
    ) -> Option<Vec<Region>> {
        self.kind.arrange(region, &self.data, n)
    }
}

impl std::fmt::Debug for Layout {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("kind", &self.kind)
            .field("prev_kind", &self.prev_kind)
            .field("data", &self.data)
            .finish()
    }
}
