use crate::connection::Connection;
use crate::event::Event;
use crate::event::PropertyKind;
use crate::event::StackMode;
use crate::event::WindowChanges;
use crate::geometry::Pos;
use crate::geometry::Region;
use crate::hints::SizeHints;
use crate::input::Button;
use crate::input::KeyCode;
use crate::input::Modifier;
use crate::input::MouseEvent;
use crate::input::MouseEventKind;
use crate::input::MouseShortcut;
use crate::window::IcccmWindowState;
use crate::window::Window;
use crate::window::WindowAttributes;
use crate::Result;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::TryFrom;
use std::os::unix::io::RawFd;

use x11rb::connection;
use x11rb::cursor::Handle as CursorHandle;
use x11rb::errors::ReplyError;
use x11rb::properties;
use x11rb::protocol::xproto;
use x11rb::protocol::xproto::ConnectionExt;
use x11rb::protocol::xproto::EventMask;
use x11rb::protocol::xproto::ModMask;
use x11rb::protocol::xproto::CLIENT_MESSAGE_EVENT;
use x11rb::protocol::ErrorKind;
use x11rb::protocol::Event as XEvent;
use x11rb::resource_manager::Database;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::x11_utils::X11Error;

use anyhow::anyhow;

type Atom = u32;

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        Any,
        ATOM,
        CARDINAL,
        WINDOW,
        STRING,
        UTF8_STRING,

        // ICCCM client properties
        WM_NAME,
        WM_CLASS,
        WM_PROTOCOLS,
        WM_NORMAL_HINTS,
        WM_DELETE_WINDOW,
        WM_TRANSIENT_FOR,

        // ICCCM window manager properties
        WM_STATE,

        // EWMH root properties
        _NET_SUPPORTED,
        _NET_CLIENT_LIST,
        _NET_CLIENT_LIST_STACKING,
        _NET_ACTIVE_WINDOW,
        _NET_SUPPORTING_WM_CHECK,

        // EWMH application properties
        _NET_WM_NAME,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_WINDOW_OPACITY,
        _NET_WM_PID,

        // session properties
        _TAGWM_PROPERTIES,
        _TAGWM_VIEW,
    }
}

/// Whether a protocol error is an expected race with a window that is
/// going away, or a harmless rejection of a best-effort request.
pub fn is_benign(
    kind: ErrorKind,
    major_opcode: u8,
) -> bool {
    match kind {
        ErrorKind::Window => true,
        ErrorKind::Match => {
            major_opcode == xproto::SET_INPUT_FOCUS_REQUEST
                || major_opcode == xproto::CONFIGURE_WINDOW_REQUEST
        },
        ErrorKind::Drawable => {
            major_opcode == xproto::POLY_TEXT8_REQUEST
                || major_opcode == xproto::POLY_FILL_RECTANGLE_REQUEST
                || major_opcode == xproto::POLY_SEGMENT_REQUEST
                || major_opcode == xproto::COPY_AREA_REQUEST
        },
        ErrorKind::Access => {
            major_opcode == xproto::GRAB_KEY_REQUEST || major_opcode == xproto::GRAB_BUTTON_REQUEST
        },
        _ => false,
    }
}

pub struct XConnection<'conn, Conn: connection::Connection> {
    conn: &'conn Conn,
    descriptor: RawFd,
    atoms: Atoms,
    screen: xproto::Screen,
    check_window: Window,
    pending: RefCell<VecDeque<XEvent>>,
    lock_masks: [u16; 4],
    root_event_mask: EventMask,
    window_event_mask: EventMask,
    mouse_event_mask: EventMask,
    regrab_event_mask: EventMask,
}

impl<'conn, Conn: connection::Connection> XConnection<'conn, Conn> {
    pub fn new(
        conn: &'conn Conn,
        screen_num: usize,
        descriptor: RawFd,
    ) -> Result<Self> {
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .cloned()
            .ok_or_else(|| anyhow!("no screen with number {}", screen_num))?;

        let root = screen.root;

        let aux = xproto::ChangeWindowAttributesAux::default()
            .event_mask(EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY);

        let res = conn.change_window_attributes(root, &aux)?.check();
        if let Err(ReplyError::X11Error(err)) = res {
            if err.error_kind == ErrorKind::Access {
                return Err(anyhow!("another window manager is already running"));
            } else {
                return Err(anyhow!("unable to set up window manager"));
            }
        }

        let atoms = Atoms::new(conn)?.reply()?;
        let check_window = conn.generate_id()?;

        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            check_window,
            root,
            -1,
            -1,
            1,
            1,
            0,
            xproto::WindowClass::INPUT_ONLY,
            x11rb::COPY_FROM_PARENT,
            &xproto::CreateWindowAux::default().override_redirect(1),
        )?;

        conn.map_window(check_window)?;
        conn.configure_window(
            check_window,
            &xproto::ConfigureWindowAux::default().stack_mode(xproto::StackMode::BELOW),
        )?;

        if let Ok(database) = Database::new_from_default(conn) {
            drop(
                CursorHandle::new(conn, screen_num, &database).map(|cookie| {
                    cookie.reply().map(|reply| {
                        let aux = xproto::ChangeWindowAttributesAux::default()
                            .cursor(reply.load_cursor(conn, "left_ptr").ok());

                        drop(conn.change_window_attributes(root, &aux));
                    })
                }),
            );
        }

        let numlock = u16::from(ModMask::M2);
        let capslock = u16::from(ModMask::LOCK);
        let lock_masks = [0, numlock, capslock, numlock | capslock];

        let root_event_mask: EventMask = EventMask::PROPERTY_CHANGE
            | EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::STRUCTURE_NOTIFY
            | EventMask::BUTTON_PRESS
            | EventMask::ENTER_WINDOW
            | EventMask::LEAVE_WINDOW;

        let window_event_mask: EventMask = EventMask::PROPERTY_CHANGE;

        let mouse_event_mask: EventMask =
            EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::BUTTON_MOTION;

        let regrab_event_mask: EventMask = EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE;

        Ok(Self {
            conn,
            descriptor,
            atoms,
            screen,
            check_window,
            pending: RefCell::new(VecDeque::new()),
            lock_masks,
            root_event_mask,
            window_event_mask,
            mouse_event_mask,
            regrab_event_mask,
        })
    }

    #[inline]
    fn root(&self) -> Window {
        self.screen.root
    }

    pub fn window_is_any_of_types(
        &self,
        window: Window,
        types: &[Atom],
    ) -> bool {
        self.conn
            .get_property(
                false,
                window,
                self.atoms._NET_WM_WINDOW_TYPE,
                self.atoms.ATOM,
                0,
                std::u32::MAX,
            )
            .map_or(false, |cookie| {
                cookie.reply().map_or(false, |reply| {
                    reply.value32().map_or(false, |mut window_types| {
                        window_types.any(|type_| types.contains(&type_))
                    })
                })
            })
    }

    pub fn window_has_any_of_protocols(
        &self,
        window: Window,
        protocols: &[Atom],
    ) -> bool {
        self.conn
            .get_property(
                false,
                window,
                self.atoms.WM_PROTOCOLS,
                self.atoms.ATOM,
                0,
                std::u32::MAX,
            )
            .map_or(false, |cookie| {
                cookie.reply().map_or(false, |reply| {
                    reply.value32().map_or(false, |mut window_protocols| {
                        window_protocols.any(|protocol| protocols.contains(&protocol))
                    })
                })
            })
    }

    fn get_string_property(
        &self,
        window: Window,
        atom: Atom,
    ) -> Option<String> {
        self.conn
            .get_property(false, window, atom, self.atoms.Any, 0, std::u32::MAX)
            .ok()?
            .reply()
            .ok()
            .and_then(|reply| {
                let value: Vec<u8> = reply.value8()?.collect();

                if value.is_empty() {
                    None
                } else {
                    String::from_utf8(value).ok()
                }
            })
    }

    #[inline]
    fn set_string_property(
        &self,
        window: Window,
        atom: Atom,
        value: &str,
    ) {
        drop(self.conn.change_property8(
            xproto::PropMode::REPLACE,
            window,
            atom,
            self.atoms.STRING,
            value.as_bytes(),
        ));
    }

    #[inline]
    fn send_client_message(
        &self,
        window: Window,
        atom: Atom,
        type_: Atom,
    ) -> Result<()> {
        let data = [atom, x11rb::CURRENT_TIME, 0, 0, 0];

        let event = xproto::ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window,
            type_,
            data: data.into(),
        };

        self.conn
            .send_event(false, window, EventMask::NO_EVENT, &event)?;

        Ok(())
    }

    #[inline]
    fn send_protocol_client_message(
        &self,
        window: Window,
        atom: Atom,
    ) -> Result<()> {
        self.send_client_message(window, atom, self.atoms.WM_PROTOCOLS)
    }

    fn next_x_event(&self) -> Option<XEvent> {
        if let Some(event) = self.pending.borrow_mut().pop_front() {
            return Some(event);
        }

        self.conn.poll_for_event().ok().flatten()
    }

    #[inline]
    fn mouse_event(
        &self,
        kind: MouseEventKind,
        event: xproto::Window,
        child: xproto::Window,
        detail: Option<u8>,
        state: u16,
        root_x: i16,
        root_y: i16,
    ) -> Option<Event> {
        let button = match detail {
            Some(detail) => Button::try_from(detail).ok()?,
            None => Button::Left,
        };

        Some(Event::Mouse {
            event: MouseEvent {
                kind,
                window: event,
                subwindow: if child == x11rb::NONE {
                    None
                } else {
                    Some(child)
                },
                on_root: event == self.root(),
                root_rpos: Pos {
                    x: root_x as i32,
                    y: root_y as i32,
                },
                shortcut: MouseShortcut::new(button, Modifier::from_state(state)),
            },
        })
    }

    #[inline]
    fn on_button_press(
        &self,
        event: &xproto::ButtonPressEvent,
    ) -> Option<Event> {
        self.mouse_event(
            MouseEventKind::Press,
            event.event,
            event.child,
            Some(event.detail),
            event.state,
            event.root_x,
            event.root_y,
        )
    }

    #[inline]
    fn on_button_release(
        &self,
        event: &xproto::ButtonReleaseEvent,
    ) -> Option<Event> {
        self.mouse_event(
            MouseEventKind::Release,
            event.event,
            event.child,
            Some(event.detail),
            event.state,
            event.root_x,
            event.root_y,
        )
    }

    #[inline]
    fn on_motion_notify(
        &self,
        event: &xproto::MotionNotifyEvent,
    ) -> Option<Event> {
        self.mouse_event(
            MouseEventKind::Motion,
            event.event,
            event.child,
            None,
            event.state,
            event.root_x,
            event.root_y,
        )
    }

    #[inline]
    fn on_key_press(
        &self,
        event: &xproto::KeyPressEvent,
    ) -> Option<Event> {
        let locks = u16::from(ModMask::M2) | u16::from(ModMask::LOCK);

        Some(Event::Key {
            key_code: KeyCode {
                mask: event.state,
                code: event.detail,
            }
            .without_mask(locks),
        })
    }

    #[inline]
    fn on_map_request(
        &self,
        event: &xproto::MapRequestEvent,
    ) -> Option<Event> {
        Some(Event::MapRequest {
            window: event.window,
            ignore: self
                .get_window_attributes(event.window)
                .map_or(true, |attrs| attrs.override_redirect),
        })
    }

    #[inline]
    fn on_enter_notify(
        &self,
        event: &xproto::EnterNotifyEvent,
    ) -> Option<Event> {
        if (event.mode != xproto::NotifyMode::NORMAL
            || event.detail == xproto::NotifyDetail::INFERIOR)
            && event.event != self.root()
        {
            return None;
        }

        Some(Event::Enter {
            window: event.event,
            root_rpos: Pos {
                x: event.root_x as i32,
                y: event.root_y as i32,
            },
            window_rpos: Pos {
                x: event.event_x as i32,
                y: event.event_y as i32,
            },
        })
    }

    #[inline]
    fn on_leave_notify(
        &self,
        event: &xproto::LeaveNotifyEvent,
    ) -> Option<Event> {
        Some(Event::Leave {
            window: event.event,
            root_rpos: Pos {
                x: event.root_x as i32,
                y: event.root_y as i32,
            },
            window_rpos: Pos {
                x: event.event_x as i32,
                y: event.event_y as i32,
            },
        })
    }

    #[inline]
    fn on_destroy_notify(
        &self,
        event: &xproto::DestroyNotifyEvent,
    ) -> Option<Event> {
        Some(Event::Destroy {
            window: event.window,
        })
    }

    #[inline]
    fn on_expose(
        &self,
        event: &xproto::ExposeEvent,
    ) -> Option<Event> {
        if event.count != 0 {
            return None;
        }

        Some(Event::Expose {
            window: event.window,
        })
    }

    #[inline]
    fn on_unmap_notify(
        &self,
        event: &xproto::UnmapNotifyEvent,
    ) -> Option<Event> {
        Some(Event::Unmap {
            window: event.window,
            ignore: self
                .get_window_attributes(event.window)
                .map_or(false, |attrs| attrs.override_redirect),
        })
    }

    #[inline]
    fn on_configure_request(
        &self,
        event: &xproto::ConfigureRequestEvent,
    ) -> Option<Event> {
        let has = |field: xproto::ConfigWindow| event.value_mask & u16::from(field) != 0;

        let changes = WindowChanges {
            x: if has(xproto::ConfigWindow::X) {
                Some(event.x as i32)
            } else {
                None
            },
            y: if has(xproto::ConfigWindow::Y) {
                Some(event.y as i32)
            } else {
                None
            },
            width: if has(xproto::ConfigWindow::WIDTH) {
                Some(event.width as i32)
            } else {
                None
            },
            height: if has(xproto::ConfigWindow::HEIGHT) {
                Some(event.height as i32)
            } else {
                None
            },
            border_width: if has(xproto::ConfigWindow::BORDER_WIDTH) {
                Some(event.border_width as u32)
            } else {
                None
            },
            sibling: if has(xproto::ConfigWindow::SIBLING) && event.sibling != x11rb::NONE {
                Some(event.sibling)
            } else {
                None
            },
            stack_mode: if has(xproto::ConfigWindow::STACK_MODE) {
                Some(match event.stack_mode {
                    xproto::StackMode::ABOVE => StackMode::Above,
                    xproto::StackMode::BELOW => StackMode::Below,
                    xproto::StackMode::TOP_IF => StackMode::TopIf,
                    xproto::StackMode::BOTTOM_IF => StackMode::BottomIf,
                    _ => StackMode::Opposite,
                })
            } else {
                None
            },
        };

        Some(Event::ConfigureRequest {
            window: event.window,
            changes,
            on_root: event.window == self.root(),
        })
    }

    #[inline]
    fn on_configure_notify(
        &self,
        event: &xproto::ConfigureNotifyEvent,
    ) -> Option<Event> {
        Some(Event::Configure {
            window: event.window,
            region: Region::new(
                event.x as i32,
                event.y as i32,
                event.width as i32,
                event.height as i32,
            ),
            on_root: event.window == self.root(),
        })
    }

    #[inline]
    fn on_property_notify(
        &self,
        event: &xproto::PropertyNotifyEvent,
    ) -> Option<Event> {
        if event.state != xproto::Property::NEW_VALUE {
            return None;
        }

        let kind = if event.atom == self.atoms.WM_NAME || event.atom == self.atoms._NET_WM_NAME {
            PropertyKind::Name
        } else if event.atom == self.atoms.WM_NORMAL_HINTS {
            PropertyKind::Size
        } else if event.atom == self.atoms.WM_TRANSIENT_FOR {
            PropertyKind::TransientFor
        } else {
            return None;
        };

        Some(Event::Property {
            window: event.window,
            kind,
            on_root: event.window == self.root(),
        })
    }

    #[inline]
    fn on_mapping_notify(
        &self,
        event: &xproto::MappingNotifyEvent,
    ) -> Option<Event> {
        Some(Event::Mapping {
            request: u8::from(event.request),
        })
    }

    #[inline]
    fn on_error(
        &self,
        error: &X11Error,
    ) -> Option<Event> {
        if is_benign(error.error_kind, error.major_opcode) {
            trace!("ignoring benign protocol error: {:?}", error);
        } else {
            error!(
                "protocol error {:?} for request {} (minor {}), value {:#0x}",
                error.error_kind, error.major_opcode, error.minor_opcode, error.bad_value
            );
        }

        None
    }
}

impl<'conn, Conn: connection::Connection> Connection for XConnection<'conn, Conn> {
    #[inline]
    fn flush(&self) -> bool {
        self.conn.flush().is_ok()
    }

    fn step(&self) -> Option<Event> {
        while let Some(event) = self.next_x_event() {
            trace!("received x event: {:?}", event);

            let event = match event {
                XEvent::ButtonPress(e) => self.on_button_press(&e),
                XEvent::ButtonRelease(e) => self.on_button_release(&e),
                XEvent::MotionNotify(e) => self.on_motion_notify(&e),
                XEvent::KeyPress(e) => self.on_key_press(&e),
                XEvent::MapRequest(e) => self.on_map_request(&e),
                XEvent::EnterNotify(e) => self.on_enter_notify(&e),
                XEvent::LeaveNotify(e) => self.on_leave_notify(&e),
                XEvent::DestroyNotify(e) => self.on_destroy_notify(&e),
                XEvent::Expose(e) => self.on_expose(&e),
                XEvent::UnmapNotify(e) => self.on_unmap_notify(&e),
                XEvent::ConfigureRequest(e) => self.on_configure_request(&e),
                XEvent::ConfigureNotify(e) => self.on_configure_notify(&e),
                XEvent::PropertyNotify(e) => self.on_property_notify(&e),
                XEvent::MappingNotify(e) => self.on_mapping_notify(&e),
                XEvent::Error(e) => self.on_error(&e),
                _ => None,
            };

            if event.is_some() {
                return event;
            }
        }

        None
    }

    #[inline]
    fn descriptor(&self) -> RawFd {
        self.descriptor
    }

    #[inline]
    fn screen_region(&self) -> Region {
        Region::new(
            0,
            0,
            self.screen.width_in_pixels as i32,
            self.screen.height_in_pixels as i32,
        )
    }

    fn top_level_windows(&self) -> Vec<Window> {
        let children = self
            .conn
            .query_tree(self.root())
            .map_or(Vec::with_capacity(0), |cookie| {
                cookie
                    .reply()
                    .map_or(Vec::with_capacity(0), |reply| reply.children)
            });

        let (transients, windows): (Vec<Window>, Vec<Window>) = children
            .into_iter()
            .filter(|&window| {
                self.get_window_attributes(window).map_or(false, |attrs| {
                    !attrs.override_redirect
                        && (attrs.viewable
                            || self.get_icccm_window_state(window)
                                == Some(IcccmWindowState::Iconic))
                })
            })
            .partition(|&window| self.get_icccm_window_transient_for(window).is_some());

        windows.into_iter().chain(transients.into_iter()).collect()
    }

    #[inline]
    fn get_pointer_position(&self) -> Pos {
        self.conn
            .query_pointer(self.root())
            .map_or(Pos::default(), |cookie| {
                cookie.reply().map_or(Pos::default(), |reply| Pos {
                    x: reply.root_x as i32,
                    y: reply.root_y as i32,
                })
            })
    }

    #[inline]
    fn warp_pointer(
        &self,
        pos: Pos,
    ) {
        drop(self.conn.warp_pointer(
            x11rb::NONE,
            self.root(),
            0,
            0,
            0,
            0,
            pos.x as i16,
            pos.y as i16,
        ));
    }

    fn grab_pointer(&self) -> bool {
        self.conn
            .grab_pointer(
                false,
                self.root(),
                u32::from(EventMask::POINTER_MOTION | EventMask::BUTTON_RELEASE) as u16,
                xproto::GrabMode::ASYNC,
                xproto::GrabMode::ASYNC,
                x11rb::NONE,
                x11rb::NONE,
                x11rb::CURRENT_TIME,
            )
            .map_or(false, |cookie| {
                cookie.reply().map_or(false, |reply| {
                    reply.status == xproto::GrabStatus::SUCCESS
                })
            })
    }

    #[inline]
    fn release_pointer(&self) {
        drop(self.conn.ungrab_pointer(x11rb::CURRENT_TIME));
    }

    fn cleanup(&self) {
        drop(
            self.conn
                .ungrab_key(xproto::Grab::ANY, self.root(), xproto::ModMask::ANY),
        );

        drop(self.conn.destroy_window(self.check_window));

        for &atom in &[
            self.atoms._NET_ACTIVE_WINDOW,
            self.atoms._NET_SUPPORTING_WM_CHECK,
            self.atoms._NET_WM_NAME,
            self.atoms.WM_CLASS,
            self.atoms._NET_SUPPORTED,
            self.atoms._NET_WM_PID,
            self.atoms._NET_CLIENT_LIST,
            self.atoms._NET_CLIENT_LIST_STACKING,
        ] {
            drop(self.conn.delete_property(self.root(), atom));
        }

        drop(self.conn.set_input_focus(
            xproto::InputFocus::POINTER_ROOT,
            x11rb::NONE,
            x11rb::CURRENT_TIME,
        ));

        self.flush();
    }

    #[inline]
    fn grab_server(&self) {
        drop(self.conn.grab_server());
    }

    #[inline]
    fn ungrab_server(&self) {
        drop(self.conn.ungrab_server());
    }

    #[inline]
    fn sync(&self) {
        drop(
            self.conn
                .get_input_focus()
                .map(|cookie| cookie.reply().map(|_| ())),
        );
    }

    #[inline]
    fn init_window(
        &self,
        window: Window,
        focus_follows_mouse: bool,
    ) {
        drop(self.conn.change_window_attributes(
            window,
            &xproto::ChangeWindowAttributesAux::default().event_mask(
                self.window_event_mask
                    | if focus_follows_mouse {
                        EventMask::ENTER_WINDOW
                    } else {
                        EventMask::NO_EVENT
                    },
            ),
        ));
    }

    #[inline]
    fn map_window(
        &self,
        window: Window,
    ) {
        drop(self.conn.map_window(window));
    }

    #[inline]
    fn unmap_window(
        &self,
        window: Window,
    ) {
        drop(self.conn.unmap_window(window));
    }

    #[inline]
    fn close_window(
        &self,
        window: Window,
    ) -> bool {
        self.send_protocol_client_message(window, self.atoms.WM_DELETE_WINDOW)
            .map_or(false, |_| self.flush())
    }

    #[inline]
    fn kill_window(
        &self,
        window: Window,
    ) -> bool {
        let protocols = &[self.atoms.WM_DELETE_WINDOW];

        if self.window_has_any_of_protocols(window, protocols) {
            self.close_window(window)
        } else {
            self.conn
                .kill_client(window)
                .map_or(false, |_| self.flush())
        }
    }

    #[inline]
    fn place_window(
        &self,
        window: Window,
        region: &Region,
        border_width: u32,
    ) {
        drop(
            self.conn.configure_window(
                window,
                &xproto::ConfigureWindowAux::default()
                    .x(region.pos.x as i32)
                    .y(region.pos.y as i32)
                    .width(region.dim.w as u32)
                    .height(region.dim.h as u32)
                    .border_width(border_width),
            ),
        );
    }

    fn configure_window(
        &self,
        window: Window,
        changes: &WindowChanges,
    ) {
        let mut aux = xproto::ConfigureWindowAux::default();

        aux.x = changes.x;
        aux.y = changes.y;
        aux.width = changes.width.map(|w| w as u32);
        aux.height = changes.height.map(|h| h as u32);
        aux.border_width = changes.border_width;
        aux.sibling = changes.sibling;
        aux.stack_mode = changes.stack_mode.map(|mode| match mode {
            StackMode::Above => xproto::StackMode::ABOVE,
            StackMode::Below => xproto::StackMode::BELOW,
            StackMode::TopIf => xproto::StackMode::TOP_IF,
            StackMode::BottomIf => xproto::StackMode::BOTTOM_IF,
            StackMode::Opposite => xproto::StackMode::OPPOSITE,
        });

        drop(self.conn.configure_window(window, &aux));
    }

    fn send_configure_notify(
        &self,
        window: Window,
        region: &Region,
        border_width: u32,
    ) {
        let event = xproto::ConfigureNotifyEvent {
            response_type: xproto::CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: x11rb::NONE,
            x: region.pos.x as i16,
            y: region.pos.y as i16,
            width: region.dim.w as u16,
            height: region.dim.h as u16,
            border_width: border_width as u16,
            override_redirect: false,
        };

        drop(
            self.conn
                .send_event(false, window, EventMask::STRUCTURE_NOTIFY, &event),
        );
    }

    #[inline]
    fn focus_window(
        &self,
        window: Window,
    ) {
        drop(
            self.conn
                .set_input_focus(xproto::InputFocus::POINTER_ROOT, window, x11rb::CURRENT_TIME),
        );

        self.set_active_window(Some(window));
    }

    #[inline]
    fn unfocus(&self) {
        drop(self.conn.set_input_focus(
            xproto::InputFocus::POINTER_ROOT,
            self.root(),
            x11rb::CURRENT_TIME,
        ));

        self.set_active_window(None);
    }

    #[inline]
    fn stack_window_above(
        &self,
        window: Window,
        sibling: Option<Window>,
    ) {
        let mut aux = xproto::ConfigureWindowAux::default().stack_mode(xproto::StackMode::ABOVE);

        if let Some(sibling) = sibling {
            aux = aux.sibling(sibling);
        }

        drop(self.conn.configure_window(window, &aux));
    }

    fn discard_enter_events(&self) {
        self.flush();
        self.sync();

        let mut pending = self.pending.borrow_mut();

        while let Ok(Some(event)) = self.conn.poll_for_event() {
            pending.push_back(event);
        }

        pending.retain(|event| !matches!(event, XEvent::EnterNotify(_)));
    }

    fn grab_bindings(
        &self,
        key_codes: &[&KeyCode],
        mouse_shortcuts: &[&MouseShortcut],
    ) {
        drop(
            self.conn
                .ungrab_key(xproto::Grab::ANY, self.root(), xproto::ModMask::ANY),
        );

        for &m in &self.lock_masks {
            for key_code in key_codes {
                drop(self.conn.grab_key(
                    false,
                    self.root(),
                    key_code.mask | m,
                    key_code.code,
                    xproto::GrabMode::ASYNC,
                    xproto::GrabMode::ASYNC,
                ));
            }

            for shortcut in mouse_shortcuts {
                if let Ok(button) = xproto::ButtonIndex::try_from(u8::from(shortcut.button)) {
                    drop(self.conn.grab_button(
                        false,
                        self.root(),
                        u32::from(self.mouse_event_mask) as u16,
                        xproto::GrabMode::ASYNC,
                        xproto::GrabMode::ASYNC,
                        x11rb::NONE,
                        x11rb::NONE,
                        button,
                        shortcut.mask() | m,
                    ));
                }
            }
        }

        drop(self.conn.change_window_attributes(
            self.root(),
            &xproto::ChangeWindowAttributesAux::default().event_mask(self.root_event_mask),
        ));

        self.flush();
    }

    #[inline]
    fn regrab_buttons(
        &self,
        window: Window,
    ) {
        drop(self.conn.grab_button(
            false,
            window,
            u32::from(self.regrab_event_mask) as u16,
            xproto::GrabMode::ASYNC,
            xproto::GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            xproto::ButtonIndex::ANY,
            xproto::ModMask::ANY,
        ));
    }

    fn grab_buttons(
        &self,
        window: Window,
        mouse_shortcuts: &[&MouseShortcut],
    ) {
        for &m in &self.lock_masks {
            for shortcut in mouse_shortcuts {
                if let Ok(button) = xproto::ButtonIndex::try_from(u8::from(shortcut.button)) {
                    drop(self.conn.grab_button(
                        false,
                        window,
                        u32::from(self.mouse_event_mask) as u16,
                        xproto::GrabMode::ASYNC,
                        xproto::GrabMode::ASYNC,
                        x11rb::NONE,
                        x11rb::NONE,
                        button,
                        shortcut.mask() | m,
                    ));
                }
            }
        }
    }

    #[inline]
    fn ungrab_buttons(
        &self,
        window: Window,
    ) {
        drop(
            self.conn
                .ungrab_button(xproto::ButtonIndex::ANY, window, xproto::ModMask::ANY),
        );
    }

    #[inline]
    fn set_window_border_width(
        &self,
        window: Window,
        width: u32,
    ) {
        drop(self.conn.configure_window(
            window,
            &xproto::ConfigureWindowAux::default().border_width(width),
        ));
    }

    #[inline]
    fn set_window_border_color(
        &self,
        window: Window,
        color: u32,
    ) {
        drop(self.conn.change_window_attributes(
            window,
            &xproto::ChangeWindowAttributesAux::default().border_pixel(color),
        ));
    }

    fn set_window_opacity(
        &self,
        window: Window,
        opacity: Option<f64>,
    ) {
        match opacity {
            Some(opacity) => {
                let value = (opacity.max(0f64).min(1f64) * std::u32::MAX as f64) as u32;

                drop(self.conn.change_property32(
                    xproto::PropMode::REPLACE,
                    window,
                    self.atoms._NET_WM_WINDOW_OPACITY,
                    self.atoms.CARDINAL,
                    &[value],
                ));
            },
            None => {
                drop(
                    self.conn
                        .delete_property(window, self.atoms._NET_WM_WINDOW_OPACITY),
                );
            },
        }
    }

    fn get_window_attributes(
        &self,
        window: Window,
    ) -> Option<WindowAttributes> {
        let attrs = self
            .conn
            .get_window_attributes(window)
            .ok()?
            .reply()
            .ok()?;

        let geometry = self.conn.get_geometry(window).ok()?.reply().ok()?;

        Some(WindowAttributes {
            region: Region::new(
                geometry.x as i32,
                geometry.y as i32,
                geometry.width as i32,
                geometry.height as i32,
            ),
            border_width: geometry.border_width as u32,
            override_redirect: attrs.override_redirect,
            viewable: attrs.map_state == xproto::MapState::VIEWABLE,
        })
    }

    #[inline]
    fn window_is_dock(
        &self,
        window: Window,
    ) -> bool {
        self.window_is_any_of_types(window, &[self.atoms._NET_WM_WINDOW_TYPE_DOCK])
    }

    #[inline]
    fn set_icccm_window_state(
        &self,
        window: Window,
        state: IcccmWindowState,
    ) {
        drop(self.conn.change_property32(
            xproto::PropMode::REPLACE,
            window,
            self.atoms.WM_STATE,
            self.atoms.WM_STATE,
            &[
                match state {
                    IcccmWindowState::Withdrawn => 0,
                    IcccmWindowState::Normal => 1,
                    IcccmWindowState::Iconic => 3,
                },
                0,
            ],
        ));
    }

    fn get_icccm_window_state(
        &self,
        window: Window,
    ) -> Option<IcccmWindowState> {
        self.conn
            .get_property(
                false,
                window,
                self.atoms.WM_STATE,
                self.atoms.WM_STATE,
                0,
                2,
            )
            .ok()?
            .reply()
            .ok()
            .and_then(|reply| match reply.value32()?.next()? {
                0 => Some(IcccmWindowState::Withdrawn),
                1 => Some(IcccmWindowState::Normal),
                3 => Some(IcccmWindowState::Iconic),
                _ => None,
            })
    }

    #[inline]
    fn get_icccm_window_name(
        &self,
        window: Window,
    ) -> String {
        static NO_NAME: &str = "n/a";

        self.get_string_property(window, self.atoms._NET_WM_NAME)
            .or_else(|| self.get_string_property(window, self.atoms.WM_NAME))
            .unwrap_or_else(|| NO_NAME.to_owned())
    }

    #[inline]
    fn get_icccm_window_class(
        &self,
        window: Window,
    ) -> String {
        static NO_CLASS: &str = "n/a";

        properties::WmClass::get(self.conn, window).map_or(NO_CLASS.to_owned(), |cookie| {
            cookie.reply().map_or(NO_CLASS.to_owned(), |reply| {
                std::str::from_utf8(reply.class())
                    .map_or(NO_CLASS.to_owned(), |class| class.to_owned())
            })
        })
    }

    #[inline]
    fn get_icccm_window_instance(
        &self,
        window: Window,
    ) -> String {
        static NO_INSTANCE: &str = "n/a";

        properties::WmClass::get(self.conn, window).map_or(NO_INSTANCE.to_owned(), |cookie| {
            cookie.reply().map_or(NO_INSTANCE.to_owned(), |reply| {
                std::str::from_utf8(reply.instance())
                    .map_or(NO_INSTANCE.to_owned(), |instance| instance.to_owned())
            })
        })
    }

    #[inline]
    fn get_icccm_window_transient_for(
        &self,
        window: Window,
    ) -> Option<Window> {
        self.conn
            .get_property(
                false,
                window,
                self.atoms.WM_TRANSIENT_FOR,
                self.atoms.WINDOW,
                0,
                std::u32::MAX,
            )
            .ok()?
            .reply()
            .ok()
            .and_then(|transient_for| {
                transient_for
                    .value32()?
                    .next()
                    .filter(|&parent| parent != x11rb::NONE)
            })
    }

    fn get_icccm_window_size_hints(
        &self,
        window: Window,
    ) -> Option<SizeHints> {
        let size_hints = properties::WmSizeHints::get_normal_hints(self.conn, window)
            .ok()?
            .reply()
            .ok()?;

        Some(SizeHints::new(
            size_hints.min_size,
            size_hints.max_size,
            size_hints.base_size,
            size_hints.size_increment,
            size_hints.aspect.map(|(min_ratio, max_ratio)| {
                (
                    (min_ratio.numerator, min_ratio.denominator),
                    (max_ratio.numerator, max_ratio.denominator),
                )
            }),
        ))
    }

    fn init_wm_properties(
        &self,
        wm_name: &str,
    ) {
        let wm_instance_class_names = &[wm_name, wm_name];
        let wm_class = wm_instance_class_names.join("\0");

        for &window in &[self.check_window, self.root()] {
            drop(self.conn.change_property8(
                xproto::PropMode::REPLACE,
                window,
                self.atoms._NET_WM_NAME,
                self.atoms.UTF8_STRING,
                wm_name.as_bytes(),
            ));

            drop(self.conn.change_property8(
                xproto::PropMode::REPLACE,
                window,
                self.atoms.WM_CLASS,
                self.atoms.UTF8_STRING,
                wm_class.as_bytes(),
            ));

            drop(self.conn.change_property32(
                xproto::PropMode::REPLACE,
                window,
                self.atoms._NET_SUPPORTING_WM_CHECK,
                self.atoms.WINDOW,
                &[self.check_window],
            ));

            drop(self.conn.change_property32(
                xproto::PropMode::REPLACE,
                window,
                self.atoms._NET_WM_PID,
                self.atoms.CARDINAL,
                &[std::process::id() as u32],
            ));
        }

        drop(self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.root(),
            self.atoms._NET_SUPPORTED,
            self.atoms.ATOM,
            &[
                self.atoms._NET_ACTIVE_WINDOW,
                self.atoms._NET_CLIENT_LIST,
                self.atoms._NET_CLIENT_LIST_STACKING,
                self.atoms._NET_SUPPORTED,
                self.atoms._NET_SUPPORTING_WM_CHECK,
                self.atoms._NET_WM_NAME,
                self.atoms._NET_WM_WINDOW_TYPE,
                self.atoms._NET_WM_WINDOW_TYPE_DOCK,
                self.atoms._NET_WM_WINDOW_OPACITY,
            ],
        ));

        drop(
            self.conn
                .delete_property(self.root(), self.atoms._NET_CLIENT_LIST),
        );
    }

    #[inline]
    fn set_root_window_name(
        &self,
        name: &str,
    ) {
        drop(self.conn.change_property8(
            xproto::PropMode::REPLACE,
            self.root(),
            self.atoms.WM_NAME,
            self.atoms.UTF8_STRING,
            name.as_bytes(),
        ));
    }

    #[inline]
    fn set_active_window(
        &self,
        window: Option<Window>,
    ) {
        match window {
            Some(window) => {
                drop(self.conn.change_property32(
                    xproto::PropMode::REPLACE,
                    self.root(),
                    self.atoms._NET_ACTIVE_WINDOW,
                    self.atoms.WINDOW,
                    &[window],
                ));
            },
            None => {
                drop(
                    self.conn
                        .delete_property(self.root(), self.atoms._NET_ACTIVE_WINDOW),
                );
            },
        }
    }

    #[inline]
    fn update_client_list(
        &self,
        clients: &[Window],
    ) {
        drop(self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.root(),
            self.atoms._NET_CLIENT_LIST,
            self.atoms.WINDOW,
            clients,
        ));
    }

    #[inline]
    fn update_client_list_stacking(
        &self,
        clients: &[Window],
    ) {
        drop(self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.root(),
            self.atoms._NET_CLIENT_LIST_STACKING,
            self.atoms.WINDOW,
            clients,
        ));
    }

    #[inline]
    fn get_window_props(
        &self,
        window: Window,
    ) -> Option<String> {
        self.get_string_property(window, self.atoms._TAGWM_PROPERTIES)
    }

    #[inline]
    fn set_window_props(
        &self,
        window: Window,
        props: &str,
    ) {
        self.set_string_property(window, self.atoms._TAGWM_PROPERTIES, props);
    }

    #[inline]
    fn get_root_props(&self) -> Option<String> {
        self.get_string_property(self.root(), self.atoms._TAGWM_VIEW)
    }

    #[inline]
    fn set_root_props(
        &self,
        props: &str,
    ) {
        self.set_string_property(self.root(), self.atoms._TAGWM_VIEW, props);
    }
}
