use crate::geometry::Dim;

/// Parsed WM_NORMAL_HINTS. Every field is either a sane positive value or
/// absent; malformed entries are dropped at construction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SizeHints {
    pub min_width: Option<i32>,
    pub min_height: Option<i32>,
    pub max_width: Option<i32>,
    pub max_height: Option<i32>,
    pub base_width: Option<i32>,
    pub base_height: Option<i32>,
    pub inc_width: Option<i32>,
    pub inc_height: Option<i32>,
    pub min_ratio: Option<f64>,
    pub max_ratio: Option<f64>,
}

impl Default for SizeHints {
    fn default() -> Self {
        Self {
            min_width: None,
            min_height: None,
            max_width: None,
            max_height: None,
            base_width: None,
            base_height: None,
            inc_width: None,
            inc_height: None,
            min_ratio: None,
            max_ratio: None,
        }
    }
}

#[inline]
fn positive(value: i32) -> Option<i32> {
    if value > 0 {
        Some(value)
    } else {
        None
    }
}

#[inline]
fn ratio(
    numerator: i32,
    denominator: i32,
) -> Option<f64> {
    if numerator > 0 && denominator > 0 {
        Some(numerator as f64 / denominator as f64)
    } else {
        None
    }
}

impl SizeHints {
    /// Builds hints from raw (width, height) pairs and (numerator,
    /// denominator) aspect bounds. The base size falls back to the minimum
    /// size and vice versa.
    pub fn new(
        min_size: Option<(i32, i32)>,
        max_size: Option<(i32, i32)>,
        base_size: Option<(i32, i32)>,
        size_increment: Option<(i32, i32)>,
        aspect: Option<((i32, i32), (i32, i32))>,
    ) -> Self {
        let (sh_min_width, sh_min_height) =
            min_size.map_or((None, None), |(w, h)| (positive(w), positive(h)));

        let (sh_base_width, sh_base_height) =
            base_size.map_or((None, None), |(w, h)| (positive(w), positive(h)));

        let (mut max_width, mut max_height) =
            max_size.map_or((None, None), |(w, h)| (positive(w), positive(h)));

        let min_width = sh_min_width.or(sh_base_width);
        let min_height = sh_min_height.or(sh_base_height);
        let base_width = sh_base_width.or(sh_min_width);
        let base_height = sh_base_height.or(sh_min_height);

        if let (Some(min), Some(max)) = (min_width, max_width) {
            if max < min {
                max_width = None;
            }
        }

        if let (Some(min), Some(max)) = (min_height, max_height) {
            if max < min {
                max_height = None;
            }
        }

        let (inc_width, inc_height) = size_increment.map_or((None, None), |(w, h)| {
            (
                positive(w).filter(|&w| w < 0xFFFF),
                positive(h).filter(|&h| h < 0xFFFF),
            )
        });

        let (mut min_ratio, mut max_ratio) =
            aspect.map_or((None, None), |((min_num, min_den), (max_num, max_den))| {
                (ratio(min_num, min_den), ratio(max_num, max_den))
            });

        if let (Some(min), Some(max)) = (min_ratio, max_ratio) {
            if min > max {
                min_ratio = None;
                max_ratio = None;
            }
        }

        Self {
            min_width,
            min_height,
            max_width,
            max_height,
            base_width,
            base_height,
            inc_width,
            inc_height,
            min_ratio,
            max_ratio,
        }
    }

    /// A window whose minimum and maximum sizes coincide cannot be resized.
    pub fn is_fixed(&self) -> bool {
        match (
            self.min_width,
            self.min_height,
            self.max_width,
            self.max_height,
        ) {
            (Some(min_w), Some(min_h), Some(max_w), Some(max_h)) => {
                min_w == max_w && min_h == max_h
            },
            _ => false,
        }
    }

    /// Reconciles a requested size with the hints: aspect ratio first,
    /// then the min/max bounds, then the resize increments.
    pub fn apply(
        &self,
        dim: Dim,
    ) -> Dim {
        let (mut w, mut h) = dim.values();
        let base_width = self.base_width.unwrap_or(0);
        let base_height = self.base_height.unwrap_or(0);

        if (self.min_ratio.is_some() || self.max_ratio.is_some())
            && w > base_width
            && h > base_height
        {
            let dx = (w - base_width) as f64;
            let dy = (h - base_height) as f64;
            let current = dx / dy;

            let bound = match (self.min_ratio, self.max_ratio) {
                (Some(min), _) if current < min => Some(min),
                (_, Some(max)) if current > max => Some(max),
                _ => None,
            };

            if let Some(ratio) = bound {
                let dy = (dx * ratio + dy) / (ratio * ratio + 1f64);
                let dx = dy * ratio;

                w = dx.round() as i32 + base_width;
                h = dy.round() as i32 + base_height;
            }
        }

        if let Some(min_width) = self.min_width {
            w = std::cmp::max(w, min_width);
        }

        if let Some(min_height) = self.min_height {
            h = std::cmp::max(h, min_height);
        }

        if let Some(max_width) = self.max_width {
            w = std::cmp::min(w, max_width);
        }

        if let Some(max_height) = self.max_height {
            h = std::cmp::min(h, max_height);
        }

        if let Some(inc_width) = self.inc_width {
            if w > base_width {
                w -= (w - base_width) % inc_width;
            }
        }

        if let Some(inc_height) = self.inc_height {
            if h > base_height {
                h -= (h - base_height) % inc_height;
            }
        }

        Dim {
            w,
            h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(
        w: i32,
        h: i32,
    ) -> Dim {
        Dim {
            w,
            h,
        }
    }

    #[test]
    fn equal_min_and_max_is_fixed() {
        let hints = SizeHints::new(Some((300, 200)), Some((300, 200)), None, None, None);

        assert!(hints.is_fixed());
        assert_eq!(hints.apply(dim(640, 480)), dim(300, 200));
        assert_eq!(hints.apply(dim(10, 10)), dim(300, 200));
    }

    #[test]
    fn base_and_min_fall_back_to_each_other() {
        let hints = SizeHints::new(None, None, Some((20, 30)), None, None);
        assert_eq!(hints.min_width, Some(20));
        assert_eq!(hints.min_height, Some(30));

        let hints = SizeHints::new(Some((40, 50)), None, None, None, None);
        assert_eq!(hints.base_width, Some(40));
        assert_eq!(hints.base_height, Some(50));
    }

    #[test]
    fn increments_snap_down_above_base() {
        let hints = SizeHints::new(None, None, Some((4, 6)), Some((10, 20)), None);

        assert_eq!(hints.apply(dim(4 + 57, 6 + 45)), dim(4 + 50, 6 + 40));
        assert_eq!(hints.apply(dim(4 + 50, 6 + 40)), dim(4 + 50, 6 + 40));
    }

    #[test]
    fn aspect_is_clamped_into_range() {
        // between 1:1 and 2:1
        let hints = SizeHints::new(None, None, None, None, Some(((1, 1), (2, 1))));

        let tall = hints.apply(dim(100, 300));
        let ratio = tall.w as f64 / tall.h as f64;
        assert!((ratio - 1f64).abs() < 0.02, "{:?}", tall);

        let wide = hints.apply(dim(900, 100));
        let ratio = wide.w as f64 / wide.h as f64;
        assert!((ratio - 2f64).abs() < 0.02, "{:?}", wide);

        assert_eq!(hints.apply(dim(150, 100)), dim(150, 100));
    }

    #[test]
    fn malformed_hints_are_ignored() {
        let hints = SizeHints::new(
            Some((500, 500)),
            Some((100, 100)),
            None,
            Some((0, -3)),
            Some(((1, 0), (0, 1))),
        );

        assert_eq!(hints.max_width, None);
        assert_eq!(hints.max_height, None);
        assert_eq!(hints.inc_width, None);
        assert_eq!(hints.inc_height, None);
        assert_eq!(hints.min_ratio, None);
        assert_eq!(hints.max_ratio, None);
        assert!(!hints.is_fixed());
        assert_eq!(hints.apply(dim(800, 600)), dim(800, 600));
    }

    #[test]
    fn conforming_size_is_left_alone() {
        let hints = SizeHints::new(
            Some((100, 100)),
            Some((1000, 1000)),
            Some((100, 100)),
            Some((8, 16)),
            Some(((1, 2), (3, 1))),
        );

        let conforming = dim(100 + 8 * 40, 100 + 16 * 20);
        assert_eq!(hints.apply(conforming), conforming);
    }
}
