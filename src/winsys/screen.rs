use crate::geometry::Region;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BarPosition {
    Top,
    Bottom,
    Off,
}

/// The physical display and the band reserved for the status surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    full_region: Region,
    work_area: Region,
    bar_position: BarPosition,
    bar_height: u32,
    showing_bar: bool,
}

impl Screen {
    pub fn new(region: Region) -> Self {
        Self {
            full_region: region,
            work_area: region,
            bar_position: BarPosition::Off,
            bar_height: 0,
            showing_bar: true,
        }
    }

    #[inline]
    pub fn full_region(&self) -> Region {
        self.full_region
    }

    #[inline]
    pub fn work_area(&self) -> Region {
        self.work_area
    }

    #[inline]
    pub fn bar_position(&self) -> BarPosition {
        self.bar_position
    }

    #[inline]
    pub fn bar_height(&self) -> u32 {
        self.bar_height
    }

    #[inline]
    pub fn showing_bar(&self) -> bool {
        self.showing_bar
    }

    /// Reserves a band for the status surface along the given edge.
    pub fn set_bar(
        &mut self,
        position: BarPosition,
        height: u32,
    ) {
        self.bar_position = position;
        self.bar_height = height;
        self.compute_work_area();
    }

    pub fn set_showing_bar(
        &mut self,
        show: bool,
    ) {
        self.showing_bar = show;
        self.compute_work_area();
    }

    pub fn set_full_region(
        &mut self,
        region: Region,
    ) {
        self.full_region = region;
        self.compute_work_area();
    }

    /// Where the status surface goes when shown, if anywhere.
    pub fn bar_region(&self) -> Option<Region> {
        let region = self.full_region;
        let height = self.bar_height as i32;

        match self.bar_position {
            BarPosition::Off => None,
            BarPosition::Top => Some(Region::new(region.pos.x, region.pos.y, region.dim.w, height)),
            BarPosition::Bottom => Some(Region::new(
                region.pos.x,
                region.pos.y + region.dim.h - height,
                region.dim.w,
                height,
            )),
        }
    }

    fn compute_work_area(&mut self) {
        let mut region = self.full_region;
        let height = std::cmp::min(self.bar_height as i32, region.dim.h);

        if self.showing_bar {
            match self.bar_position {
                BarPosition::Top => {
                    region.pos.y += height;
                    region.dim.h -= height;
                },
                BarPosition::Bottom => {
                    region.dim.h -= height;
                },
                BarPosition::Off => {},
            }
        }

        self.work_area = region;
    }
}
