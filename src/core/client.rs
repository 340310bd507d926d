use winsys::geometry::Region;
use winsys::hints::SizeHints;
use winsys::window::Window;

use std::cell::Cell;
use std::cell::RefCell;

pub struct Client {
    window: Window,
    name: RefCell<String>,
    class: RefCell<String>,
    instance: RefCell<String>,
    region: Cell<Region>,
    float_region: Cell<Region>,
    border: Cell<u32>,
    original_border: u32,
    tags: RefCell<Vec<bool>>,
    size_hints: Cell<Option<SizeHints>>,
    transient_for: Cell<Option<Window>>,
    floating: Cell<bool>,
    fixed: Cell<bool>,
    maximized: Cell<bool>,
    was_floating: Cell<bool>,
    banned: Cell<bool>,
    mapped: Cell<bool>,
    expected_unmap_count: Cell<u8>,
}

impl Client {
    pub fn new(
        window: Window,
        region: Region,
        original_border: u32,
        tags: Vec<bool>,
    ) -> Self {
        Self {
            window,
            name: RefCell::new(String::new()),
            class: RefCell::new(String::new()),
            instance: RefCell::new(String::new()),
            region: Cell::new(region),
            float_region: Cell::new(region),
            border: Cell::new(original_border),
            original_border,
            tags: RefCell::new(tags),
            size_hints: Cell::new(None),
            transient_for: Cell::new(None),
            floating: Cell::new(false),
            fixed: Cell::new(false),
            maximized: Cell::new(false),
            was_floating: Cell::new(false),
            banned: Cell::new(false),
            mapped: Cell::new(false),
            expected_unmap_count: Cell::new(0),
        }
    }

    #[inline]
    pub fn window(&self) -> Window {
        self.window
    }

    #[inline]
    pub fn set_name(
        &self,
        name: impl Into<String>,
    ) {
        self.name.replace(name.into());
    }

    #[inline]
    pub fn name(&self) -> String {
        self.name.borrow().to_owned()
    }

    #[inline]
    pub fn set_class(
        &self,
        class: impl Into<String>,
    ) {
        self.class.replace(class.into());
    }

    #[inline]
    pub fn class(&self) -> String {
        self.class.borrow().to_owned()
    }

    #[inline]
    pub fn set_instance(
        &self,
        instance: impl Into<String>,
    ) {
        self.instance.replace(instance.into());
    }

    #[inline]
    pub fn instance(&self) -> String {
        self.instance.borrow().to_owned()
    }

    /// The string rules are matched against.
    #[inline]
    pub fn identity(&self) -> String {
        format!("{}:{}:{}", self.class.borrow(), self.instance.borrow(), self.name.borrow())
    }

    /// Geometry inside the border, as last pushed to the server.
    #[inline]
    pub fn region(&self) -> Region {
        self.region.get()
    }

    #[inline]
    pub fn set_region(
        &self,
        region: Region,
    ) {
        self.region.set(region);
    }

    /// Geometry remembered for restoring a floating client.
    #[inline]
    pub fn float_region(&self) -> Region {
        self.float_region.get()
    }

    #[inline]
    pub fn set_float_region(
        &self,
        region: Region,
    ) {
        self.float_region.set(region);
    }

    #[inline]
    pub fn border(&self) -> u32 {
        self.border.get()
    }

    #[inline]
    pub fn set_border(
        &self,
        border: u32,
    ) {
        self.border.set(border);
    }

    #[inline]
    pub fn original_border(&self) -> u32 {
        self.original_border
    }

    #[inline]
    pub fn tags(&self) -> Vec<bool> {
        self.tags.borrow().clone()
    }

    #[inline]
    pub fn set_tags(
        &self,
        tags: Vec<bool>,
    ) {
        self.tags.replace(tags);
    }

    #[inline]
    pub fn has_tag(
        &self,
        index: usize,
    ) -> bool {
        self.tags.borrow().get(index).copied().unwrap_or(false)
    }

    #[inline]
    pub fn size_hints(&self) -> Option<SizeHints> {
        self.size_hints.get()
    }

    /// Stores new size hints and re-derives whether the client is fixed.
    pub fn set_size_hints(
        &self,
        size_hints: Option<SizeHints>,
    ) {
        self.size_hints.set(size_hints);
        self.fixed
            .set(size_hints.map_or(false, |hints| hints.is_fixed()));
    }

    #[inline]
    pub fn transient_for(&self) -> Option<Window> {
        self.transient_for.get()
    }

    #[inline]
    pub fn set_transient_for(
        &self,
        parent: Option<Window>,
    ) {
        self.transient_for.set(parent);
    }

    #[inline]
    pub fn is_floating(&self) -> bool {
        self.floating.get()
    }

    #[inline]
    pub fn set_floating(
        &self,
        floating: bool,
    ) {
        self.floating.set(floating);
    }

    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.fixed.get()
    }

    #[inline]
    pub fn is_maximized(&self) -> bool {
        self.maximized.get()
    }

    #[inline]
    pub fn set_maximized(
        &self,
        maximized: bool,
    ) {
        self.maximized.set(maximized);
    }

    #[inline]
    pub fn was_floating(&self) -> bool {
        self.was_floating.get()
    }

    #[inline]
    pub fn set_was_floating(
        &self,
        was_floating: bool,
    ) {
        self.was_floating.set(was_floating);
    }

    #[inline]
    pub fn is_banned(&self) -> bool {
        self.banned.get()
    }

    #[inline]
    pub fn set_banned(
        &self,
        banned: bool,
    ) {
        self.banned.set(banned);
    }

    #[inline]
    pub fn is_mapped(&self) -> bool {
        self.mapped.get()
    }

    #[inline]
    pub fn set_mapped(
        &self,
        mapped: bool,
    ) {
        self.mapped.set(mapped);
    }

    #[inline]
    pub fn expect_unmap(&self) {
        self.expected_unmap_count
            .set(self.expected_unmap_count.get().saturating_add(1));
    }

    /// Consumes one expected unmap, returning whether there was one.
    #[inline]
    pub fn consume_unmap_if_expecting(&self) -> bool {
        let expected_unmap_count = self.expected_unmap_count.get();
        let expecting = expected_unmap_count > 0;

        if expecting {
            self.expected_unmap_count.set(expected_unmap_count - 1);
        }

        expecting
    }

    #[inline]
    pub fn expected_unmap_count(&self) -> u8 {
        self.expected_unmap_count.get()
    }

    /// Computes the geometry a resize request settles on, or `None` when the
    /// request collapses to an empty window. Hints are honored first; a
    /// position that would leave the window entirely off the display is
    /// pulled back onto it.
    pub fn constrain(
        &self,
        requested: Region,
        honor_hints: bool,
        display: &Region,
    ) -> Option<Region> {
        let mut region = requested;

        if honor_hints {
            if let Some(size_hints) = self.size_hints() {
                region.dim = size_hints.apply(region.dim);
            }
        }

        if region.dim.w <= 0 || region.dim.h <= 0 {
            return None;
        }

        let border = 2 * self.border() as i32;
        let (display_pos, display_dim) = display.values();

        if region.pos.x >= display_pos.x + display_dim.w {
            region.pos.x = display_pos.x + display_dim.w - region.dim.w - border;
        }

        if region.pos.y >= display_pos.y + display_dim.h {
            region.pos.y = display_pos.y + display_dim.h - region.dim.h - border;
        }

        if region.pos.x + region.dim.w + border <= display_pos.x {
            region.pos.x = display_pos.x;
        }

        if region.pos.y + region.dim.h + border <= display_pos.y {
            region.pos.y = display_pos.y;
        }

        Some(region)
    }
}

/// Pulls a region with the given border inside an area, favoring the
/// top-left corner when it does not fit.
pub fn clamp_into(
    mut region: Region,
    border: u32,
    area: &Region,
) -> Region {
    let border = 2 * border as i32;
    let (area_pos, area_dim) = area.values();

    if region.pos.x + region.dim.w + border > area_pos.x + area_dim.w {
        region.pos.x = area_pos.x + area_dim.w - region.dim.w - border;
    }

    if region.pos.y + region.dim.h + border > area_pos.y + area_dim.h {
        region.pos.y = area_pos.y + area_dim.h - region.dim.h - border;
    }

    if region.pos.x < area_pos.x {
        region.pos.x = area_pos.x;
    }

    if region.pos.y < area_pos.y {
        region.pos.y = area_pos.y;
    }

    region
}

impl PartialEq for Client {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.window == other.window
    }
}

impl std::fmt::Debug for Client {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("window", &format_args!("{:#0x}", &self.window))
            .field("name", &self.name)
            .field("class", &self.class)
            .field("instance", &self.instance)
            .field("region", &self.region)
            .field("float_region", &self.float_region)
            .field("border", &self.border)
            .field("tags", &self.tags)
            .field("transient_for", &self.transient_for)
            .field("floating", &self.floating)
            .field("fixed", &self.fixed)
            .field("maximized", &self.maximized)
            .field("banned", &self.banned)
            .field("expected_unmap_count", &self.expected_unmap_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISPLAY: Region = Region {
        pos: winsys::geometry::Pos {
            x: 0,
            y: 0,
        },
        dim: winsys::geometry::Dim {
            w: 1920,
            h: 1080,
        },
    };

    fn client() -> Client {
        Client::new(0x200001, Region::new(10, 10, 400, 300), 1, vec![true])
    }

    #[test]
    fn conforming_request_is_unchanged() {
        let client = client();
        client.set_size_hints(Some(SizeHints::new(
            Some((100, 100)),
            None,
            None,
            Some((10, 10)),
            None,
        )));

        let region = Region::new(50, 60, 300, 200);
        assert_eq!(client.constrain(region, true, &DISPLAY), Some(region));
    }

    #[test]
    fn fixed_hints_collapse_any_request() {
        let client = client();
        client.set_size_hints(Some(SizeHints::new(
            Some((300, 200)),
            Some((300, 200)),
            None,
            None,
            None,
        )));

        assert!(client.is_fixed());

        let region = client.constrain(Region::new(0, 0, 800, 600), true, &DISPLAY);
        assert_eq!(region, Some(Region::new(0, 0, 300, 200)));

        let region = client.constrain(Region::new(0, 0, 800, 600), false, &DISPLAY);
        assert_eq!(region, Some(Region::new(0, 0, 800, 600)));
    }

    #[test]
    fn empty_requests_are_rejected() {
        let client = client();

        assert_eq!(client.constrain(Region::new(0, 0, 0, 100), true, &DISPLAY), None);
        assert_eq!(client.constrain(Region::new(0, 0, 100, -4), false, &DISPLAY), None);
    }

    #[test]
    fn offscreen_positions_are_pulled_back() {
        let client = client();

        let region = client
            .constrain(Region::new(5000, 3000, 100, 100), false, &DISPLAY)
            .unwrap();
        assert_eq!(region.pos.x, 1920 - 100 - 2);
        assert_eq!(region.pos.y, 1080 - 100 - 2);

        let region = client
            .constrain(Region::new(-500, -500, 100, 100), false, &DISPLAY)
            .unwrap();
        assert_eq!(region.pos.x, 0);
        assert_eq!(region.pos.y, 0);

        let partly = Region::new(-50, -50, 100, 100);
        assert_eq!(client.constrain(partly, false, &DISPLAY), Some(partly));
    }

    #[test]
    fn windows_just_past_the_display_edge_are_pulled_back() {
        let client = client();

        let region = client
            .constrain(Region::new(1920, 1080, 100, 100), false, &DISPLAY)
            .unwrap();
        assert_eq!(region.pos.x, 1920 - 100 - 2);
        assert_eq!(region.pos.y, 1080 - 100 - 2);

        // 100 wide plus a border of 1 on either side ends exactly at 0
        let region = client
            .constrain(Region::new(-102, -102, 100, 100), false, &DISPLAY)
            .unwrap();
        assert_eq!(region.pos.x, 0);
        assert_eq!(region.pos.y, 0);

        let edge = Region::new(-101, 1079, 100, 100);
        assert_eq!(client.constrain(edge, false, &DISPLAY), Some(edge));
    }

    #[test]
    fn unmap_expectations_are_counted() {
        let client = client();

        assert!(!client.consume_unmap_if_expecting());

        client.expect_unmap();
        client.expect_unmap();
        assert!(client.consume_unmap_if_expecting());
        assert!(client.consume_unmap_if_expecting());
        assert!(!client.consume_unmap_if_expecting());
    }

    #[test]
    fn regions_are_clamped_into_the_work_area() {
        let area = Region::new(0, 20, 1920, 1060);

        assert_eq!(
            clamp_into(Region::new(1800, 0, 400, 300), 1, &area),
            Region::new(1920 - 402, 20, 400, 300)
        );
    }
}
