use crate::event::Event;
use crate::event::WindowChanges;
use crate::geometry::Pos;
use crate::geometry::Region;
use crate::hints::SizeHints;
use crate::input::KeyCode;
use crate::input::MouseShortcut;
use crate::window::IcccmWindowState;
use crate::window::Window;
use crate::window::WindowAttributes;

use std::os::unix::io::RawFd;

pub trait Connection {
    fn flush(&self) -> bool;
    fn step(&self) -> Option<Event>;
    fn descriptor(&self) -> RawFd;
    fn screen_region(&self) -> Region;
    fn top_level_windows(&self) -> Vec<Window>;
    fn get_pointer_position(&self) -> Pos;
    fn warp_pointer(
        &self,
        pos: Pos,
    );
    fn grab_pointer(&self) -> bool;
    fn release_pointer(&self);
    fn cleanup(&self);

    // Server synchronisation
    fn grab_server(&self);
    fn ungrab_server(&self);
    fn sync(&self);

    // Window manipulation
    fn init_window(
        &self,
        window: Window,
        focus_follows_mouse: bool,
    );
    fn map_window(
        &self,
        window: Window,
    );
    fn unmap_window(
        &self,
        window: Window,
    );
    fn close_window(
        &self,
        window: Window,
    ) -> bool;
    fn kill_window(
        &self,
        window: Window,
    ) -> bool;
    fn place_window(
        &self,
        window: Window,
        region: &Region,
        border_width: u32,
    );
    fn configure_window(
        &self,
        window: Window,
        changes: &WindowChanges,
    );
    fn send_configure_notify(
        &self,
        window: Window,
        region: &Region,
        border_width: u32,
    );
    fn focus_window(
        &self,
        window: Window,
    );
    fn unfocus(&self);
    fn stack_window_above(
        &self,
        window: Window,
        sibling: Option<Window>,
    );
    fn discard_enter_events(&self);
    fn grab_bindings(
        &self,
        key_codes: &[&KeyCode],
        mouse_shortcuts: &[&MouseShortcut],
    );
    fn regrab_buttons(
        &self,
        window: Window,
    );
    fn grab_buttons(
        &self,
        window: Window,
        mouse_shortcuts: &[&MouseShortcut],
    );
    fn ungrab_buttons(
        &self,
        window: Window,
    );
    fn set_window_border_width(
        &self,
        window: Window,
        width: u32,
    );
    fn set_window_border_color(
        &self,
        window: Window,
        color: u32,
    );
    fn set_window_opacity(
        &self,
        window: Window,
        opacity: Option<f64>,
    );
    fn get_window_attributes(
        &self,
        window: Window,
    ) -> Option<WindowAttributes>;
    fn window_is_dock(
        &self,
        window: Window,
    ) -> bool;

    // ICCCM
    fn set_icccm_window_state(
        &self,
        window: Window,
        state: IcccmWindowState,
    );
    fn get_icccm_window_state(
        &self,
        window: Window,
    ) -> Option<IcccmWindowState>;
    fn get_icccm_window_name(
        &self,
        window: Window,
    ) -> String;
    fn get_icccm_window_class(
        &self,
        window: Window,
    ) -> String;
    fn get_icccm_window_instance(
        &self,
        window: Window,
    ) -> String;
    fn get_icccm_window_transient_for(
        &self,
        window: Window,
    ) -> Option<Window>;
    fn get_icccm_window_size_hints(
        &self,
        window: Window,
    ) -> Option<SizeHints>;

    // EWMH and session properties
    fn init_wm_properties(
        &self,
        wm_name: &str,
    );
    fn set_root_window_name(
        &self,
        name: &str,
    );
    fn set_active_window(
        &self,
        window: Option<Window>,
    );
    fn update_client_list(
        &self,
        clients: &[Window],
    );
    fn update_client_list_stacking(
        &self,
        clients: &[Window],
    );
    fn get_window_props(
        &self,
        window: Window,
    ) -> Option<String>;
    fn set_window_props(
        &self,
        window: Window,
        props: &str,
    );
    fn get_root_props(&self) -> Option<String>;
    fn set_root_props(
        &self,
        props: &str,
    );
}
