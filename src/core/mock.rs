use winsys::connection::Connection;
use winsys::event::Event;
use winsys::event::WindowChanges;
use winsys::geometry::Pos;
use winsys::geometry::Region;
use winsys::hints::SizeHints;
use winsys::input::KeyCode;
use winsys::input::MouseShortcut;
use winsys::window::IcccmWindowState;
use winsys::window::Window;
use winsys::window::WindowAttributes;

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::os::unix::io::RawFd;

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Map(Window),
    Unmap(Window),
    Place(Window, Region, u32),
    Configure(Window, WindowChanges),
    ConfigureNotify(Window, Region, u32),
    Focus(Window),
    Unfocus,
    StackAbove(Window, Option<Window>),
    BorderWidth(Window, u32),
    BorderColor(Window, u32),
    State(Window, IcccmWindowState),
    Kill(Window),
    GrabPointer,
    ReleasePointer,
    WarpPointer(Pos),
}

#[derive(Debug, Clone)]
pub struct MockWindow {
    pub attrs: WindowAttributes,
    pub name: String,
    pub class: String,
    pub instance: String,
    pub transient_for: Option<Window>,
    pub size_hints: Option<SizeHints>,
    pub dock: bool,
    pub props: Option<String>,
    pub state: Option<IcccmWindowState>,
}

/// An in-memory display server that records every request and keeps a
/// simulated stacking order, top to bottom.
pub struct MockConnection {
    screen: Region,
    windows: RefCell<HashMap<Window, MockWindow>>,
    requests: RefCell<Vec<Request>>,
    stacking: RefCell<Vec<Window>>,
    events: RefCell<VecDeque<Event>>,
    root_name: RefCell<Option<String>>,
    root_props: RefCell<Option<String>>,
    pointer: Cell<Pos>,
}

impl MockConnection {
    pub fn new(screen: Region) -> Self {
        Self {
            screen,
            windows: RefCell::new(HashMap::new()),
            requests: RefCell::new(Vec::new()),
            stacking: RefCell::new(Vec::new()),
            events: RefCell::new(VecDeque::new()),
            root_name: RefCell::new(None),
            root_props: RefCell::new(None),
            pointer: Cell::new(Pos::default()),
        }
    }

    pub fn add_window(
        &self,
        window: Window,
        region: Region,
    ) {
        self.windows.borrow_mut().insert(window, MockWindow {
            attrs: WindowAttributes::new(region, 0),
            name: format!("window {}", window),
            class: String::from("Mock"),
            instance: String::from("mock"),
            transient_for: None,
            size_hints: None,
            dock: false,
            props: None,
            state: None,
        });
    }

    pub fn edit_window(
        &self,
        window: Window,
        edit: impl FnOnce(&mut MockWindow),
    ) {
        if let Some(mock) = self.windows.borrow_mut().get_mut(&window) {
            edit(mock);
        }
    }

    pub fn window(
        &self,
        window: Window,
    ) -> Option<MockWindow> {
        self.windows.borrow().get(&window).cloned()
    }

    pub fn push_event(
        &self,
        event: Event,
    ) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }

    pub fn stacking(&self) -> Vec<Window> {
        self.stacking.borrow().clone()
    }

    pub fn root_name(&self) -> Option<String> {
        self.root_name.borrow().clone()
    }

    pub fn set_root_props_value(
        &self,
        props: &str,
    ) {
        *self.root_props.borrow_mut() = Some(props.to_owned());
    }

    fn record(
        &self,
        request: Request,
    ) {
        self.requests.borrow_mut().push(request);
    }
}

impl Connection for MockConnection {
    fn flush(&self) -> bool {
        true
    }

    fn step(&self) -> Option<Event> {
        self.events.borrow_mut().pop_front()
    }

    fn descriptor(&self) -> RawFd {
        -1
    }

    fn screen_region(&self) -> Region {
        self.screen
    }

    fn top_level_windows(&self) -> Vec<Window> {
        let mut windows: Vec<Window> = self
            .windows
            .borrow()
            .iter()
            .filter(|(_, mock)| mock.attrs.viewable)
            .map(|(&window, _)| window)
            .collect();

        windows.sort();
        windows
    }

    fn get_pointer_position(&self) -> Pos {
        self.pointer.get()
    }

    fn warp_pointer(
        &self,
        pos: Pos,
    ) {
        self.pointer.set(pos);
        self.record(Request::WarpPointer(pos));
    }

    fn grab_pointer(&self) -> bool {
        self.record(Request::GrabPointer);
        true
    }

    fn release_pointer(&self) {
        self.record(Request::ReleasePointer);
    }

    fn cleanup(&self) {}

    fn grab_server(&self) {}

    fn ungrab_server(&self) {}

    fn sync(&self) {}

    fn init_window(
        &self,
        _window: Window,
        _focus_follows_mouse: bool,
    ) {
    }

    fn map_window(
        &self,
        window: Window,
    ) {
        self.edit_window(window, |mock| mock.attrs.viewable = true);

        let mut stacking = self.stacking.borrow_mut();
        if !stacking.contains(&window) {
            stacking.insert(0, window);
        }

        drop(stacking);
        self.record(Request::Map(window));
    }

    fn unmap_window(
        &self,
        window: Window,
    ) {
        self.edit_window(window, |mock| mock.attrs.viewable = false);
        self.record(Request::Unmap(window));
    }

    fn close_window(
        &self,
        window: Window,
    ) -> bool {
        self.record(Request::Kill(window));
        true
    }

    fn kill_window(
        &self,
        window: Window,
    ) -> bool {
        self.record(Request::Kill(window));
        true
    }

    fn place_window(
        &self,
        window: Window,
        region: &Region,
        border_width: u32,
    ) {
        self.edit_window(window, |mock| {
            mock.attrs.region = *region;
            mock.attrs.border_width = border_width;
        });

        self.record(Request::Place(window, *region, border_width));
    }

    fn configure_window(
        &self,
        window: Window,
        changes: &WindowChanges,
    ) {
        self.record(Request::Configure(window, *changes));
    }

    fn send_configure_notify(
        &self,
        window: Window,
        region: &Region,
        border_width: u32,
    ) {
        self.record(Request::ConfigureNotify(window, *region, border_width));
    }

    fn focus_window(
        &self,
        window: Window,
    ) {
        self.record(Request::Focus(window));
    }

    fn unfocus(&self) {
        self.record(Request::Unfocus);
    }

    fn stack_window_above(
        &self,
        window: Window,
        sibling: Option<Window>,
    ) {
        let mut stacking = self.stacking.borrow_mut();
        stacking.retain(|&other| other != window);

        let index = sibling
            .and_then(|sibling| stacking.iter().position(|&other| other == sibling))
            .unwrap_or(0);

        stacking.insert(index, window);
        drop(stacking);

        self.record(Request::StackAbove(window, sibling));
    }

    fn discard_enter_events(&self) {}

    fn grab_bindings(
        &self,
        _key_codes: &[&KeyCode],
        _mouse_shortcuts: &[&MouseShortcut],
    ) {
    }

    fn regrab_buttons(
        &self,
        _window: Window,
    ) {
    }

    fn grab_buttons(
        &self,
        _window: Window,
        _mouse_shortcuts: &[&MouseShortcut],
    ) {
    }

    fn ungrab_buttons(
        &self,
        _window: Window,
    ) {
    }

    fn set_window_border_width(
        &self,
        window: Window,
        width: u32,
    ) {
        self.record(Request::BorderWidth(window, width));
    }

    fn set_window_border_color(
        &self,
        window: Window,
        color: u32,
    ) {
        self.record(Request::BorderColor(window, color));
    }

    fn set_window_opacity(
        &self,
        _window: Window,
        _opacity: Option<f64>,
    ) {
    }

    fn get_window_attributes(
        &self,
        window: Window,
    ) -> Option<WindowAttributes> {
        self.windows.borrow().get(&window).map(|mock| mock.attrs)
    }

    fn window_is_dock(
        &self,
        window: Window,
    ) -> bool {
        self.windows
            .borrow()
            .get(&window)
            .map_or(false, |mock| mock.dock)
    }

    fn set_icccm_window_state(
        &self,
        window: Window,
        state: IcccmWindowState,
    ) {
        self.edit_window(window, |mock| mock.state = Some(state));
        self.record(Request::State(window, state));
    }

    fn get_icccm_window_state(
        &self,
        window: Window,
    ) -> Option<IcccmWindowState> {
        self.windows.borrow().get(&window).and_then(|mock| mock.state)
    }

    fn get_icccm_window_name(
        &self,
        window: Window,
    ) -> String {
        self.windows
            .borrow()
            .get(&window)
            .map_or_else(String::new, |mock| mock.name.clone())
    }

    fn get_icccm_window_class(
        &self,
        window: Window,
    ) -> String {
        self.windows
            .borrow()
            .get(&window)
            .map_or_else(String::new, |mock| mock.class.clone())
    }

    fn get_icccm_window_instance(
        &self,
        window: Window,
    ) -> String {
        self.windows
            .borrow()
            .get(&window)
            .map_or_else(String::new, |mock| mock.instance.clone())
    }

    fn get_icccm_window_transient_for(
        &self,
        window: Window,
    ) -> Option<Window> {
        self.windows
            .borrow()
            .get(&window)
            .and_then(|mock| mock.transient_for)
    }

    fn get_icccm_window_size_hints(
        &self,
        window: Window,
    ) -> Option<SizeHints> {
        self.windows
            .borrow()
            .get(&window)
            .and_then(|mock| mock.size_hints)
    }

    fn init_wm_properties(
        &self,
        _wm_name: &str,
    ) {
    }

    fn set_root_window_name(
        &self,
        name: &str,
    ) {
        *self.root_name.borrow_mut() = Some(name.to_owned());
    }

    fn set_active_window(
        &self,
        _window: Option<Window>,
    ) {
    }

    fn update_client_list(
        &self,
        _clients: &[Window],
    ) {
    }

    fn update_client_list_stacking(
        &self,
        _clients: &[Window],
    ) {
    }

    fn get_window_props(
        &self,
        window: Window,
    ) -> Option<String> {
        self.windows
            .borrow()
            .get(&window)
            .and_then(|mock| mock.props.clone())
    }

    fn set_window_props(
        &self,
        window: Window,
        props: &str,
    ) {
        self.edit_window(window, |mock| mock.props = Some(props.to_owned()));
    }

    fn get_root_props(&self) -> Option<String> {
        self.root_props.borrow().clone()
    }

    fn set_root_props(
        &self,
        props: &str,
    ) {
        *self.root_props.borrow_mut() = Some(props.to_owned());
    }
}
