use crate::binding::KeyBindings;
use crate::binding::MouseBindings;
use crate::change::Change;
use crate::change::Direction;
use crate::client::clamp_into;
use crate::client::Client;
use crate::config::Config;
use crate::config::WM_NAME;
use crate::drag::Drag;
use crate::drag::DragKind;
use crate::error::StateChangeError;
use crate::layout::Layout;
use crate::layout::LayoutKind;
use crate::registry::ClientId;
use crate::registry::Registry;
use crate::stack;
use crate::status::StatusFeed;
use crate::tag;
use crate::tag::TagSet;
use crate::util::Util;

use winsys::connection::Connection;
use winsys::event::Event;
use winsys::event::PropertyKind;
use winsys::event::WindowChanges;
use winsys::geometry::Pos;
use winsys::geometry::Region;
use winsys::input::EventTarget;
use winsys::input::KeyCode;
use winsys::input::MouseEvent;
use winsys::input::MouseEventKey;
use winsys::input::MouseEventKind;
use winsys::input::MouseShortcut;
use winsys::screen::BarPosition;
use winsys::screen::Screen;
use winsys::window::IcccmWindowState;
use winsys::window::Window;

use nix::errno::Errno;
use nix::poll::poll;
use nix::poll::PollFd;
use nix::poll::PollFlags;

use std::collections::VecDeque;

/// All window management state of a running session, driven by one event
/// loop over the display connection and the status feed.
pub struct Session<'session> {
    conn: &'session dyn Connection,
    config: Config,
    registry: Registry,
    tag_set: TagSet,
    layout: Layout,
    screen: Screen,
    bar: Option<Window>,
    focus: Option<ClientId>,
    drag: Option<Drag>,
    deferred: VecDeque<Event>,
    status: Option<StatusFeed>,
    stacking_order: Vec<Window>,
    key_codes: Vec<KeyCode>,
    root_shortcuts: Vec<MouseShortcut>,
    client_shortcuts: Vec<MouseShortcut>,
    running: bool,
}

impl<'session> Session<'session> {
    pub fn new(
        conn: &'session dyn Connection,
        config: Config,
        key_bindings: &KeyBindings,
        mouse_bindings: &MouseBindings,
    ) -> winsys::Result<Self> {
        let tag_set = TagSet::new(config.tags.clone(), config.initial_layout())?;
        let layout = Layout::new(config.initial_layout(), config.layout_data);

        let mut screen = Screen::new(conn.screen_region());
        screen.set_showing_bar(config.bar_position != BarPosition::Off);

        let mut root_shortcuts = Vec::new();
        let mut client_shortcuts = Vec::new();

        for (key, shortcut) in mouse_bindings.keys() {
            let shortcuts = match key.target {
                EventTarget::Client => &mut client_shortcuts,
                EventTarget::Root | EventTarget::Global => &mut root_shortcuts,
            };

            if !shortcuts.contains(shortcut) {
                shortcuts.push(shortcut.clone());
            }
        }

        Ok(Self::init(Self {
            conn,
            config,
            registry: Registry::new(),
            tag_set,
            layout,
            screen,
            bar: None,
            focus: None,
            drag: None,
            deferred: VecDeque::new(),
            status: None,
            stacking_order: Vec::new(),
            key_codes: key_bindings.keys().copied().collect(),
            root_shortcuts,
            client_shortcuts,
            running: true,
        }))
    }

    fn init(mut session: Self) -> Self {
        info!("initializing window manager");

        session.conn.init_wm_properties(WM_NAME);
        session.grab_bindings();

        let persisted = session
            .conn
            .get_root_props()
            .and_then(|props| session.tag_set.decode_view(&props));

        if let Some(selected) = persisted {
            if session.tag_set.restore_view(selected).is_err() {
                warn!("ignoring persisted view without a selected tag");
            }
        }

        drop(session.layout.set_kind(session.tag_set.view_layout()));

        for window in session.conn.top_level_windows() {
            if session.conn.window_is_dock(window) {
                session.set_bar(window);
            } else {
                drop(session.manage(window));
            }
        }

        session.arrange();
        session
    }

    pub fn run(
        &mut self,
        mut key_bindings: KeyBindings,
        mut mouse_bindings: MouseBindings,
    ) {
        if self.status.is_none() {
            self.status = Some(StatusFeed::stdin());
        }

        while self.running {
            self.conn.flush();

            if let Some(event) = self.next_event() {
                self.handle_event(event, &mut key_bindings, &mut mouse_bindings);
            } else {
                self.wait_for_input();
            }
        }

        self.exit();
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[inline]
    pub fn tag_set(&self) -> &TagSet {
        &self.tag_set
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    #[inline]
    pub fn bar(&self) -> Option<Window> {
        self.bar
    }

    /// The current server stacking, top to bottom.
    #[inline]
    pub fn stacking_order(&self) -> &[Window] {
        &self.stacking_order
    }

    #[inline]
    pub fn focused_client(&self) -> Option<&Client> {
        self.focus.and_then(|id| self.registry.get(id))
    }

    #[inline]
    pub fn focused_window(&self) -> Option<Window> {
        self.focused_client().map(Client::window)
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    #[inline]
    pub fn set_status_feed(
        &mut self,
        status: StatusFeed,
    ) {
        self.status = Some(status);
    }

    #[inline]
    fn is_visible(
        &self,
        client: &Client,
    ) -> bool {
        self.tag_set.is_visible(&client.tags())
    }

    #[inline]
    fn is_tiled(
        &self,
        client: &Client,
    ) -> bool {
        self.is_visible(client) && !client.is_floating()
    }

    pub fn window_is_visible(
        &self,
        window: Window,
    ) -> bool {
        self.registry
            .get_by_window(window)
            .map_or(false, |client| self.is_visible(client))
    }

    fn visible_clients(&self) -> Vec<ClientId> {
        self.registry
            .iter()
            .filter(|(_, client)| self.is_visible(client))
            .map(|(id, _)| id)
            .collect()
    }

    fn tiled_clients(&self) -> Vec<ClientId> {
        self.registry
            .iter()
            .filter(|(_, client)| self.is_tiled(client))
            .map(|(id, _)| id)
            .collect()
    }

    fn grab_bindings(&self) {
        self.conn.grab_bindings(
            &self.key_codes.iter().collect::<Vec<&KeyCode>>(),
            &self.root_shortcuts.iter().collect::<Vec<&MouseShortcut>>(),
        );
    }

    fn save_props(
        &self,
        id: ClientId,
    ) {
        if let Some(client) = self.registry.get(id) {
            self.conn.set_window_props(
                client.window(),
                &tag::encode_props(&client.tags(), client.is_floating()),
            );
        }
    }

    fn update_client_list(&self) {
        self.conn.update_client_list(
            &self
                .registry
                .iter()
                .map(|(_, client)| client.window())
                .collect::<Vec<Window>>(),
        );
    }

    fn initial_tags(
        &self,
        client: &Client,
    ) -> (Vec<bool>, bool) {
        let persisted = self
            .conn
            .get_window_props(client.window())
            .and_then(|props| tag::decode_props(&props, self.tag_set.len()))
            .filter(|(tags, _)| tags.iter().any(|&t| t));

        if let Some(persisted) = persisted {
            return persisted;
        }

        let fallback = || {
            client
                .transient_for()
                .and_then(|parent| self.registry.get_by_window(parent))
                .map_or_else(|| self.tag_set.current_tags(), Client::tags)
        };

        match self.config.rules.apply(&self.tag_set, &client.identity()) {
            Some((tags, floating)) if tags.iter().any(|&t| t) => (tags, floating),
            Some((_, floating)) => (fallback(), floating),
            None => (fallback(), false),
        }
    }

    pub fn manage(
        &mut self,
        window: Window,
    ) -> Result<(), StateChangeError> {
        if self.registry.contains(window) || self.bar == Some(window) {
            return Err(StateChangeError::EarlyStop);
        }

        let attrs = self
            .conn
            .get_window_attributes(window)
            .ok_or(StateChangeError::InvalidCaller)?;

        if attrs.override_redirect {
            return Err(StateChangeError::InvalidCaller);
        }

        let full_region = self.screen.full_region();

        let (region, border) = if attrs.region.dim == full_region.dim {
            (
                Region {
                    pos: full_region.pos,
                    dim: attrs.region.dim,
                },
                attrs.border_width,
            )
        } else {
            let border = self.config.border_width;
            (clamp_into(attrs.region, border, &self.screen.work_area()), border)
        };

        let client = Client::new(window, region, attrs.border_width, Vec::new());
        client.set_border(border);
        client.set_mapped(attrs.viewable);
        client.set_name(self.conn.get_icccm_window_name(window));
        client.set_class(self.conn.get_icccm_window_class(window));
        client.set_instance(self.conn.get_icccm_window_instance(window));
        client.set_size_hints(self.conn.get_icccm_window_size_hints(window));
        client.set_transient_for(
            self.conn
                .get_icccm_window_transient_for(window)
                .filter(|&parent| parent != window),
        );

        let (tags, floating) = self.initial_tags(&client);
        client.set_tags(tags);
        client.set_floating(floating || client.transient_for().is_some() || client.is_fixed());

        info!("managing client with window {:#0x}", window);

        self.conn.set_window_props(
            window,
            &tag::encode_props(&client.tags(), client.is_floating()),
        );
        self.conn.place_window(window, &region, border);
        self.conn.set_window_border_color(window, self.config.colors.normal);
        self.conn.set_window_opacity(window, self.config.unfocused_opacity);
        self.conn.init_window(window, self.config.focus_follows_mouse);
        self.conn.regrab_buttons(window);

        let id = self.registry.insert(client)?;

        self.ban(id);
        self.update_client_list();
        self.arrange();

        Ok(())
    }

    pub fn unmanage(
        &mut self,
        id: ClientId,
        state: IcccmWindowState,
    ) -> Result<(), StateChangeError> {
        let (window, border) = self
            .registry
            .get(id)
            .map(|client| (client.window(), client.original_border()))
            .ok_or(StateChangeError::InvalidCaller)?;

        info!("unmanaging client with window {:#0x}", window);

        self.conn.grab_server();
        self.conn.set_window_border_width(window, border);
        self.registry.remove(id);
        self.conn.ungrab_buttons(window);
        self.conn.set_icccm_window_state(window, state);
        self.conn.sync();
        self.conn.ungrab_server();

        self.stacking_order.retain(|&other| other != window);
        self.update_client_list();

        // the stale handle no longer resolves, so focus() always moves away
        if self.focus == Some(id) {
            self.focus(None);
        }

        if state != IcccmWindowState::Normal {
            self.arrange();
        }

        Ok(())
    }

    fn ban(
        &self,
        id: ClientId,
    ) {
        if let Some(client) = self.registry.get(id) {
            if client.is_banned() {
                return;
            }

            let window = client.window();

            if client.is_mapped() {
                client.expect_unmap();
            }

            self.conn.unmap_window(window);
            self.conn.set_icccm_window_state(window, IcccmWindowState::Iconic);

            client.set_mapped(false);
            client.set_banned(true);
        }
    }

    fn unban(
        &self,
        id: ClientId,
    ) {
        if let Some(client) = self.registry.get(id) {
            if !client.is_banned() {
                return;
            }

            let window = client.window();

            self.conn.map_window(window);
            self.conn.set_icccm_window_state(window, IcccmWindowState::Normal);

            client.set_mapped(true);
            client.set_banned(false);
        }
    }

    /// Moves and resizes a client, honoring its size hints when asked to.
    /// Nothing is sent to the server when the geometry settles on what the
    /// client already has.
    pub fn resize(
        &self,
        id: ClientId,
        requested: Region,
        honor_hints: bool,
    ) -> bool {
        let client = match self.registry.get(id) {
            Some(client) => client,
            None => return false,
        };

        let region = match client.constrain(requested, honor_hints, &self.screen.full_region()) {
            Some(region) => region,
            None => return false,
        };

        if region == client.region() {
            return false;
        }

        client.set_region(region);

        if client.is_floating() && !client.is_maximized() {
            client.set_float_region(region);
        }

        self.conn.place_window(client.window(), &region, client.border());
        true
    }

    /// Gives input focus to `target`, or, when that is absent or hidden,
    /// to the most recently focused visible client.
    pub fn focus(
        &mut self,
        target: Option<ClientId>,
    ) {
        let target = target
            .filter(|&id| {
                self.registry
                    .get(id)
                    .map_or(false, |client| self.is_visible(client))
            })
            .or_else(|| {
                self.registry
                    .iter_stack()
                    .find(|(_, client)| self.is_visible(client))
                    .map(|(id, _)| id)
            });

        if target == self.focus {
            return;
        }

        if let Some(id) = target {
            drop(self.registry.raise_in_stack(id));
        }

        if let Some(client) = self.focus.and_then(|id| self.registry.get(id)) {
            let window = client.window();

            self.conn.ungrab_buttons(window);
            self.conn.regrab_buttons(window);
            self.conn
                .set_window_border_color(window, self.config.colors.normal);
            self.conn
                .set_window_opacity(window, self.config.unfocused_opacity);
        }

        match target.and_then(|id| self.registry.get(id)) {
            Some(client) => {
                let window = client.window();
                info!("focusing client with window {:#0x}", window);

                self.conn.ungrab_buttons(window);
                self.conn.grab_buttons(
                    window,
                    &self.client_shortcuts.iter().collect::<Vec<&MouseShortcut>>(),
                );
                self.conn
                    .set_window_border_color(window, self.config.colors.focused);
                self.conn.set_window_opacity(window, None);

                if self.config.unfocused_opacity.is_some() {
                    for (_, other) in self
                        .registry
                        .iter_stack()
                        .filter(|(id, _)| Some(*id) != target)
                    {
                        self.conn
                            .set_window_opacity(other.window(), self.config.unfocused_opacity);
                    }
                }

                self.conn.focus_window(window);
            },
            None => {
                debug!("no client left to focus");
                self.conn.unfocus();
            },
        }

        self.focus = target;
    }

    /// Brings every client in line with the current view: hides or shows
    /// it, runs the active layout over the tiled ones, then re-derives focus
    /// and stacking.
    pub fn arrange(&mut self) {
        for id in self.registry.clients().to_vec() {
            let visible = self
                .registry
                .get(id)
                .map_or(false, |client| self.is_visible(client));

            if visible {
                self.unban(id);
            } else {
                self.ban(id);
            }
        }

        let tiled = self.tiled_clients();
        let work_area = self.screen.work_area();

        if let Some(regions) = self.layout.arrange(&work_area, tiled.len()) {
            debug!(
                "applying {} layout to {} clients",
                self.layout.kind().name(),
                tiled.len()
            );

            for (id, region) in tiled.into_iter().zip(regions.into_iter()) {
                let border = self.registry.get(id).map_or(0, Client::border);
                self.resize(id, region.without_border(border), self.config.resize_hints);
            }
        }

        self.focus(self.focus);
        self.restack();
    }

    /// Recomputes the stacking order and sends only the requests needed to
    /// reach it.
    pub fn restack(&mut self) {
        let floating_layout = self.layout.kind().is_floating();
        let focused = self.focused_client();
        let mut order = Vec::with_capacity(self.registry.len() + 1);

        if let Some(client) = focused {
            if floating_layout || client.is_floating() {
                order.push(client.window());
            }
        }

        for (id, client) in self.registry.iter_stack() {
            if Some(id) != self.focus
                && self.is_visible(client)
                && (floating_layout || client.is_floating())
            {
                order.push(client.window());
            }
        }

        if !floating_layout {
            if let Some(client) = focused {
                if !client.is_floating() {
                    order.push(client.window());
                }
            }

            for (id, client) in self.registry.iter() {
                if Some(id) != self.focus && self.is_tiled(client) {
                    order.push(client.window());
                }
            }
        }

        let mut order = stack::with_transient_groups(&order, |window| {
            self.registry
                .get_by_window(window)
                .and_then(Client::transient_for)
        });

        if let Some(bar) = self.bar {
            order.insert(0, bar);
        }

        for (window, sibling) in stack::restack_requests(&self.stacking_order, &order) {
            self.conn.stack_window_above(window, sibling);
        }

        self.conn.update_client_list_stacking(
            &order
                .iter()
                .rev()
                .copied()
                .filter(|&window| Some(window) != self.bar)
                .collect::<Vec<Window>>(),
        );

        self.stacking_order = order;
        self.conn.discard_enter_events();
    }

    fn set_bar(
        &mut self,
        window: Window,
    ) {
        let region = self
            .conn
            .get_window_attributes(window)
            .map_or(Region::default(), |attrs| {
                attrs.region.with_border(attrs.border_width)
            });

        let full_region = self.screen.full_region();
        let position = if region.pos.y + region.dim.h / 2 <= full_region.pos.y + full_region.dim.h / 2 {
            BarPosition::Top
        } else {
            BarPosition::Bottom
        };

        info!("using window {:#0x} as status surface at {:?}", window, position);

        self.bar = Some(window);
        self.screen
            .set_bar(position, std::cmp::max(region.dim.h, 0) as u32);

        if self.screen.showing_bar() {
            self.conn.map_window(window);
        }

        self.arrange();
    }

    fn next_event(&mut self) -> Option<Event> {
        if self.drag.is_none() {
            if let Some(event) = self.deferred.pop_front() {
                return Some(event);
            }
        }

        self.conn.step()
    }

    fn wait_for_input(&mut self) {
        let mut fds = vec![PollFd::new(self.conn.descriptor(), PollFlags::POLLIN)];

        if let Some(fd) = self.status.as_ref().and_then(StatusFeed::descriptor) {
            fds.push(PollFd::new(fd, PollFlags::POLLIN));
        }

        match poll(&mut fds, -1) {
            Ok(_) => {},
            Err(e) if e.as_errno() == Some(Errno::EINTR) => return,
            Err(e) => {
                error!("unable to poll for input: {}", e);
                self.running = false;
                return;
            },
        }

        let ready = |fd: &PollFd, flags: PollFlags| {
            fd.revents()
                .map_or(false, |revents| revents.intersects(flags))
        };

        if ready(
            &fds[0],
            PollFlags::POLLHUP | PollFlags::POLLERR | PollFlags::POLLNVAL,
        ) {
            error!("lost the connection to the display server");
            self.running = false;
            return;
        }

        if fds.len() > 1
            && ready(
                &fds[1],
                PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR,
            )
        {
            self.read_status();
        }
    }

    /// Publishes the latest status text, if the feed produced any.
    pub fn read_status(&mut self) {
        if let Some(text) = self.status.as_mut().and_then(StatusFeed::read) {
            debug!("updating status text to {}", text);
            self.conn.set_root_window_name(&text);
        }
    }

    pub fn handle_event(
        &mut self,
        event: Event,
        key_bindings: &mut KeyBindings,
        mouse_bindings: &mut MouseBindings,
    ) {
        if self.drag.is_some() && !Drag::handles(&event) {
            trace!("deferring event until the drag ends: {:?}", event);
            self.deferred.push_back(event);
            return;
        }

        trace!("received event: {:?}", event);

        match event {
            Event::Mouse {
                event,
            } => self.handle_mouse(event, mouse_bindings),
            Event::Key {
                key_code,
            } => self.handle_key(key_code, key_bindings),
            Event::MapRequest {
                window,
                ignore,
            } => self.handle_map_request(window, ignore),
            Event::Enter {
                window,
                ..
            } => self.handle_enter(window),
            Event::Leave {
                window,
                ..
            } => trace!("LEAVE for window {:#0x}", window),
            Event::Destroy {
                window,
            } => self.handle_destroy(window),
            Event::Expose {
                window,
            } => trace!("EXPOSE for window {:#0x}", window),
            Event::Unmap {
                window,
                ignore,
            } => self.handle_unmap(window, ignore),
            Event::ConfigureRequest {
                window,
                changes,
                ..
            } => self.handle_configure_request(window, changes),
            Event::Configure {
                window,
                region,
                on_root,
            } => self.handle_configure(window, region, on_root),
            Event::Property {
                window,
                kind,
                on_root,
            } => self.handle_property(window, kind, on_root),
            Event::Mapping {
                request,
            } => self.handle_mapping(request),
        }
    }

    fn handle_mouse(
        &mut self,
        event: MouseEvent,
        mouse_bindings: &mut MouseBindings,
    ) {
        match event.kind {
            MouseEventKind::Release => {
                if self.drag.is_some() {
                    self.stop_drag();
                    return;
                }
            },
            MouseEventKind::Motion => {
                if self.drag.is_some() {
                    self.handle_drag(event.root_rpos);
                }

                return;
            },
            MouseEventKind::Press => {},
        }

        {
            // handle global mouse bindings
            let binding = mouse_bindings.get_mut(&(
                MouseEventKey {
                    kind: event.kind,
                    target: EventTarget::Global,
                },
                event.shortcut.clone(),
            ));

            if let Some((action, _)) = binding {
                action(self, None);
                return;
            }
        }

        let window = if event.on_root {
            match event.subwindow {
                Some(subwindow) => subwindow,
                None => {
                    // handle root-targeted mouse bindings
                    let binding = mouse_bindings.get_mut(&(
                        MouseEventKey {
                            kind: event.kind,
                            target: EventTarget::Root,
                        },
                        event.shortcut.clone(),
                    ));

                    if let Some((action, _)) = binding {
                        action(self, None);
                    }

                    return;
                },
            }
        } else {
            event.window
        };

        let id = match self.registry.id_of(window) {
            Some(id) => id,
            None => return,
        };

        // handle client-targeted mouse bindings
        let binding = mouse_bindings.get_mut(&(
            MouseEventKey {
                kind: event.kind,
                target: EventTarget::Client,
            },
            event.shortcut.clone(),
        ));

        match binding {
            Some((action, moves_focus)) => {
                if *moves_focus {
                    self.focus(Some(id));
                    self.restack();
                }

                action(self, Some(window));
            },
            None => {
                if event.kind == MouseEventKind::Press {
                    self.focus(Some(id));
                    self.restack();
                }
            },
        }
    }

    fn handle_key(
        &mut self,
        key_code: KeyCode,
        key_bindings: &mut KeyBindings,
    ) {
        if let Some(action) = key_bindings.get_mut(&key_code) {
            debug!("processing key binding: {:?}", key_code);
            action(self);
        }
    }

    fn handle_map_request(
        &mut self,
        window: Window,
        ignore: bool,
    ) {
        debug!("MAP_REQUEST for window {:#0x}", window);

        if ignore {
            return;
        }

        if self.conn.window_is_dock(window) {
            self.set_bar(window);
            return;
        }

        drop(self.manage(window));
    }

    fn handle_enter(
        &mut self,
        window: Window,
    ) {
        debug!("ENTER for window {:#0x}", window);

        if !self.config.focus_follows_mouse {
            return;
        }

        let id = self.registry.id_of(window);
        self.focus(id);
    }

    fn handle_destroy(
        &mut self,
        window: Window,
    ) {
        debug!("DESTROY for window {:#0x}", window);

        if let Some(id) = self.registry.id_of(window) {
            drop(self.unmanage(id, IcccmWindowState::Withdrawn));
        } else if self.bar == Some(window) {
            info!("status surface {:#0x} destroyed", window);

            self.bar = None;
            self.screen.set_bar(BarPosition::Off, 0);
            self.stacking_order.retain(|&other| other != window);
            self.arrange();
        }
    }

    fn handle_unmap(
        &mut self,
        window: Window,
        ignore: bool,
    ) {
        debug!("UNMAP for window {:#0x}", window);

        if ignore {
            return;
        }

        if let Some(id) = self.registry.id_of(window) {
            let expected = self
                .registry
                .get(id)
                .map_or(false, Client::consume_unmap_if_expecting);

            if !expected {
                drop(self.unmanage(id, IcccmWindowState::Withdrawn));
            }
        }
    }

    fn handle_configure_request(
        &mut self,
        window: Window,
        changes: WindowChanges,
    ) {
        debug!("CONFIGURE_REQUEST for window {:#0x}: {:?}", window, changes);

        let client = match self.registry.get_by_window(window) {
            Some(client) => client,
            None => {
                self.conn.configure_window(window, &changes);
                return;
            },
        };

        if !(client.is_fixed() || client.is_floating() || self.layout.kind().is_floating()) {
            self.conn
                .send_configure_notify(window, &client.region(), client.border());
            return;
        }

        if let Some(border) = changes.border_width {
            client.set_border(border);
        }

        let mut region = client.region();

        if let Some(x) = changes.x {
            region.pos.x = x;
        }

        if let Some(y) = changes.y {
            region.pos.y = y;
        }

        if let Some(width) = changes.width {
            region.dim.w = width;
        }

        if let Some(height) = changes.height {
            region.dim.h = height;
        }

        if client.is_floating() {
            let full_region = self.screen.full_region();
            let border = 2 * client.border() as i32;

            if region.pos.x + region.dim.w + border > full_region.pos.x + full_region.dim.w {
                region.pos.x = full_region.pos.x + (full_region.dim.w - region.dim.w - border) / 2;
            }

            if region.pos.y + region.dim.h + border > full_region.pos.y + full_region.dim.h {
                region.pos.y = full_region.pos.y + (full_region.dim.h - region.dim.h - border) / 2;
            }
        }

        let unchanged = region == client.region();
        let moved_only = (changes.x.is_some() || changes.y.is_some()) && !changes.changes_size();

        client.set_region(region);

        if client.is_floating() && !client.is_maximized() {
            client.set_float_region(region);
        }

        if self.is_visible(client) {
            self.conn.place_window(window, &region, client.border());
        }

        if unchanged || moved_only {
            self.conn
                .send_configure_notify(window, &region, client.border());
        }
    }

    fn handle_configure(
        &mut self,
        window: Window,
        region: Region,
        on_root: bool,
    ) {
        if on_root && region != self.screen.full_region() {
            debug!("CONFIGURE for root window {:#0x}: {:?}", window, region);

            self.screen.set_full_region(region);
            self.arrange();
        }
    }

    fn handle_property(
        &mut self,
        window: Window,
        kind: PropertyKind,
        on_root: bool,
    ) {
        debug!("PROPERTY for window {:#0x} of kind {:?}", window, kind);

        if on_root {
            return;
        }

        let id = match self.registry.id_of(window) {
            Some(id) => id,
            None => return,
        };

        match kind {
            PropertyKind::TransientFor => {
                let parent = self
                    .conn
                    .get_icccm_window_transient_for(window)
                    .filter(|&parent| parent != window);

                let must_float = match self.registry.get(id) {
                    Some(client) => {
                        client.set_transient_for(parent);

                        !client.is_floating()
                            && parent.map_or(false, |parent| self.registry.contains(parent))
                    },
                    None => false,
                };

                if must_float {
                    drop(self.set_floating(id, true));
                } else {
                    self.restack();
                }
            },
            PropertyKind::Size => {
                if let Some(client) = self.registry.get(id) {
                    client.set_size_hints(self.conn.get_icccm_window_size_hints(window));
                }
            },
            PropertyKind::Name => {
                if let Some(client) = self.registry.get(id) {
                    client.set_name(self.conn.get_icccm_window_name(window));
                }
            },
        }
    }

    fn handle_mapping(
        &mut self,
        request: u8,
    ) {
        debug!("MAPPING with request {}", request);
        self.grab_bindings();
    }

    pub fn start_move(
        &mut self,
        window: Window,
    ) -> Result<(), StateChangeError> {
        self.start_drag(window, DragKind::Move)
    }

    pub fn start_resize(
        &mut self,
        window: Window,
    ) -> Result<(), StateChangeError> {
        self.start_drag(window, DragKind::Resize)
    }

    fn start_drag(
        &mut self,
        window: Window,
        kind: DragKind,
    ) -> Result<(), StateChangeError> {
        if self.drag.is_some() {
            return Err(StateChangeError::EarlyStop);
        }

        let (region, border) = match self.registry.get_by_window(window) {
            Some(client) if kind == DragKind::Resize && client.is_fixed() => {
                return Err(StateChangeError::InvalidCaller);
            },
            Some(client) => (client.region(), client.border()),
            None => return Err(StateChangeError::InvalidCaller),
        };

        if !self.conn.grab_pointer() {
            return Err(StateChangeError::StateUnchanged);
        }

        let grip = match kind {
            DragKind::Move => self.conn.get_pointer_position(),
            DragKind::Resize => {
                let grip = Drag::resize_grip(&region, border);
                self.conn.warp_pointer(grip);
                grip
            },
        };

        info!("starting {:?} of client with window {:#0x}", kind, window);

        self.drag = Some(Drag::new(kind, window, grip, region, border));
        self.restack();

        Ok(())
    }

    fn handle_drag(
        &mut self,
        pointer: Pos,
    ) {
        let drag = match self.drag {
            Some(drag) => drag,
            None => return,
        };

        let id = match self.registry.id_of(drag.window()) {
            Some(id) => id,
            None => {
                self.stop_drag();
                return;
            },
        };

        let floating_layout = self.layout.kind().is_floating();
        let region = drag.region_for(pointer, &self.screen.work_area(), self.config.snap);
        let floating = self.registry.get(id).map_or(false, Client::is_floating);

        if !floating && !floating_layout && drag.exceeds_snap(&region, self.config.snap) {
            drop(self.set_floating(id, true));
        }

        let floating = self.registry.get(id).map_or(false, Client::is_floating);

        if floating || floating_layout {
            self.resize(id, region, drag.kind() == DragKind::Resize);
        }
    }

    fn stop_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            info!(
                "stopping {:?} of client with window {:#0x}",
                drag.kind(),
                drag.window()
            );

            self.conn.release_pointer();
        }
    }

    fn set_floating(
        &mut self,
        id: ClientId,
        floating: bool,
    ) -> Result<(), StateChangeError> {
        let client = self.registry.get(id).ok_or(StateChangeError::InvalidCaller)?;

        if client.is_floating() == floating {
            return Err(StateChangeError::EarlyStop);
        }

        client.set_floating(floating);
        self.save_props(id);
        self.arrange();

        Ok(())
    }

    fn apply_view(&mut self) {
        drop(self.layout.set_kind(self.tag_set.view_layout()));
        self.conn.set_root_props(&self.tag_set.encode_view());
        self.arrange();
    }

    pub fn view(
        &mut self,
        index: usize,
    ) -> Result<(), StateChangeError> {
        self.tag_set.view(index)?;
        info!("viewing tag {}", index);
        self.apply_view();
        Ok(())
    }

    pub fn view_all(&mut self) -> Result<(), StateChangeError> {
        self.tag_set.view_all()?;
        self.apply_view();
        Ok(())
    }

    pub fn toggle_view(
        &mut self,
        index: usize,
    ) -> Result<(), StateChangeError> {
        self.tag_set.toggle_view(index)?;
        self.apply_view();
        Ok(())
    }

    pub fn view_prev_selected(&mut self) -> Result<(), StateChangeError> {
        self.tag_set.view_prev_selected()?;
        self.apply_view();
        Ok(())
    }

    pub fn view_next(&mut self) -> Result<(), StateChangeError> {
        self.tag_set.view_relative(Direction::Forward)?;
        self.apply_view();
        Ok(())
    }

    pub fn view_prev(&mut self) -> Result<(), StateChangeError> {
        self.tag_set.view_relative(Direction::Backward)?;
        self.apply_view();
        Ok(())
    }

    fn set_focused_tags(
        &mut self,
        tags: Vec<bool>,
    ) -> Result<(), StateChangeError> {
        let id = self.focus.ok_or(StateChangeError::InvalidCaller)?;
        let client = self.registry.get(id).ok_or(StateChangeError::InvalidCaller)?;

        if client.tags() == tags {
            return Err(StateChangeError::EarlyStop);
        }

        client.set_tags(tags);
        self.save_props(id);
        self.arrange();

        Ok(())
    }

    pub fn tag(
        &mut self,
        index: usize,
    ) -> Result<(), StateChangeError> {
        if index >= self.tag_set.len() {
            return Err(StateChangeError::InvalidCaller);
        }

        let mut tags = vec![false; self.tag_set.len()];
        tags[index] = true;

        self.set_focused_tags(tags)
    }

    pub fn tag_all(&mut self) -> Result<(), StateChangeError> {
        self.set_focused_tags(vec![true; self.tag_set.len()])
    }

    pub fn toggle_tag(
        &mut self,
        index: usize,
    ) -> Result<(), StateChangeError> {
        let mut tags = self
            .focused_client()
            .map(Client::tags)
            .ok_or(StateChangeError::InvalidCaller)?;

        TagSet::toggle_in(&mut tags, index)?;
        self.set_focused_tags(tags)
    }

    pub fn set_layout(
        &mut self,
        kind: LayoutKind,
    ) -> Result<(), StateChangeError> {
        self.layout.set_kind(kind)?;
        self.tag_set.set_view_layout(kind);

        info!("activating layout {}", kind.name());
        self.arrange();

        Ok(())
    }

    pub fn toggle_layout(&mut self) -> Result<(), StateChangeError> {
        self.set_layout(self.layout.prev_kind())
    }

    pub fn cycle_layout(
        &mut self,
        dir: Direction,
    ) -> Result<(), StateChangeError> {
        let layouts = &self.config.layouts;

        if layouts.is_empty() {
            return Err(StateChangeError::InvalidCaller);
        }

        let index = layouts
            .iter()
            .position(|&kind| kind == self.layout.kind())
            .map_or(0, |index| Util::next_index(layouts.len(), index, dir));

        let kind = layouts[index];
        self.set_layout(kind)
    }

    pub fn change_main_factor(
        &mut self,
        change: Change<f32>,
    ) -> Result<(), StateChangeError> {
        let kind = self.layout.kind();

        if !kind.has_main_column() {
            return Err(StateChangeError::InvalidCaller);
        }

        let change = if kind == LayoutKind::TileLeft {
            change.rev()
        } else {
            change
        };

        let data = self.layout.data_mut();
        let main_factor = match change {
            Change::Inc(delta) => data.main_factor + delta,
            Change::Dec(delta) => data.main_factor - delta,
        }
        .max(Layout::MIN_MAIN_FACTOR)
        .min(Layout::MAX_MAIN_FACTOR);

        if (main_factor - data.main_factor).abs() < std::f32::EPSILON {
            return Err(StateChangeError::LimitReached);
        }

        data.main_factor = main_factor;
        self.arrange();

        Ok(())
    }

    pub fn change_main_count(
        &mut self,
        change: Change<u32>,
    ) -> Result<(), StateChangeError> {
        if !self.layout.kind().has_main_column() {
            return Err(StateChangeError::InvalidCaller);
        }

        let data = self.layout.data_mut();
        let main_count =
            Util::change_within_range(0, Layout::MAX_MAIN_COUNT, data.main_count, change);

        if main_count == data.main_count {
            return Err(StateChangeError::LimitReached);
        }

        data.main_count = main_count;
        self.arrange();

        Ok(())
    }

    pub fn change_column_count(
        &mut self,
        change: Change<u32>,
    ) -> Result<(), StateChangeError> {
        if !self.layout.kind().has_main_column() {
            return Err(StateChangeError::InvalidCaller);
        }

        let data = self.layout.data_mut();
        let column_count =
            Util::change_within_range(1, Layout::MAX_COLUMN_COUNT, data.column_count, change);

        if column_count == data.column_count {
            return Err(StateChangeError::LimitReached);
        }

        data.column_count = column_count;
        self.arrange();

        Ok(())
    }

    pub fn focus_window(
        &mut self,
        window: Window,
    ) -> Result<(), StateChangeError> {
        let id = self
            .registry
            .id_of(window)
            .ok_or(StateChangeError::InvalidCaller)?;

        self.focus(Some(id));
        self.restack();

        Ok(())
    }

    pub fn cycle_focus(
        &mut self,
        dir: Direction,
    ) -> Result<(), StateChangeError> {
        let visible = self.visible_clients();

        if visible.is_empty() {
            return Err(StateChangeError::InvalidCaller);
        }

        let index = visible
            .iter()
            .position(|&id| Some(id) == self.focus)
            .map_or(0, |index| Util::next_index(visible.len(), index, dir));

        if Some(visible[index]) == self.focus {
            return Err(StateChangeError::StateUnchanged);
        }

        self.focus(Some(visible[index]));
        self.restack();

        Ok(())
    }

    pub fn focus_next(&mut self) -> Result<(), StateChangeError> {
        self.cycle_focus(Direction::Forward)
    }

    pub fn focus_prev(&mut self) -> Result<(), StateChangeError> {
        self.cycle_focus(Direction::Backward)
    }

    /// Promotes the focused tiled client to the main slot, or, if it is
    /// already there, the tiled client after it.
    pub fn zoom(&mut self) -> Result<(), StateChangeError> {
        if self.layout.kind().is_floating() {
            return Err(StateChangeError::InvalidCaller);
        }

        let id = self.focus.ok_or(StateChangeError::InvalidCaller)?;
        let tiled = self.tiled_clients();

        if !tiled.contains(&id) {
            return Err(StateChangeError::InvalidCaller);
        }

        let target = if tiled.first() == Some(&id) {
            *tiled.get(1).ok_or(StateChangeError::LimitReached)?
        } else {
            id
        };

        drop(self.registry.move_to_front(target));
        self.focus(Some(target));
        self.arrange();

        Ok(())
    }

    fn swap(
        &mut self,
        dir: Direction,
    ) -> Result<(), StateChangeError> {
        if self.layout.kind().is_floating() {
            return Err(StateChangeError::InvalidCaller);
        }

        let id = self.focus.ok_or(StateChangeError::InvalidCaller)?;
        let tiled = self.tiled_clients();
        let index = tiled
            .iter()
            .position(|&other| other == id)
            .ok_or(StateChangeError::InvalidCaller)?;

        let other = tiled[Util::next_index(tiled.len(), index, dir)];
        self.registry.swap(id, other)?;
        self.arrange();

        Ok(())
    }

    pub fn swap_next(&mut self) -> Result<(), StateChangeError> {
        self.swap(Direction::Forward)
    }

    pub fn swap_prev(&mut self) -> Result<(), StateChangeError> {
        self.swap(Direction::Backward)
    }

    pub fn toggle_floating(&mut self) -> Result<(), StateChangeError> {
        if self.layout.kind().is_floating() {
            return Err(StateChangeError::InvalidCaller);
        }

        let id = self.focus.ok_or(StateChangeError::InvalidCaller)?;
        let client = self.registry.get(id).ok_or(StateChangeError::InvalidCaller)?;
        let floating = !client.is_floating();

        if !floating && client.is_fixed() {
            return Err(StateChangeError::InvalidCaller);
        }

        client.set_floating(floating);

        if floating {
            let region = client.float_region();
            self.resize(id, region, true);
        }

        self.save_props(id);
        self.arrange();

        Ok(())
    }

    fn maximize(
        &mut self,
        horizontally: bool,
        vertically: bool,
    ) -> Result<(), StateChangeError> {
        let id = self.focus.ok_or(StateChangeError::InvalidCaller)?;
        let client = self.registry.get(id).ok_or(StateChangeError::InvalidCaller)?;

        if client.is_maximized() {
            info!("restoring client with window {:#0x}", client.window());

            client.set_maximized(false);
            client.set_floating(client.was_floating());

            let region = client.float_region();
            self.resize(id, region, true);
        } else {
            info!("maximizing client with window {:#0x}", client.window());

            let work_area = self.screen.work_area();
            let border = 2 * client.border() as i32;
            let mut region = client.region();

            client.set_float_region(region);
            client.set_was_floating(client.is_floating());
            client.set_floating(true);
            client.set_maximized(true);

            if horizontally {
                region.pos.x = work_area.pos.x;
                region.dim.w = work_area.dim.w - border;
            }

            if vertically {
                region.pos.y = work_area.pos.y;
                region.dim.h = work_area.dim.h - border;
            }

            self.resize(id, region, true);
        }

        self.save_props(id);
        self.arrange();
        Ok(())
    }

    pub fn toggle_max(&mut self) -> Result<(), StateChangeError> {
        self.maximize(true, true)
    }

    pub fn toggle_vertical_max(&mut self) -> Result<(), StateChangeError> {
        self.maximize(false, true)
    }

    pub fn toggle_horizontal_max(&mut self) -> Result<(), StateChangeError> {
        self.maximize(true, false)
    }

    pub fn kill_client(&mut self) -> Result<(), StateChangeError> {
        let window = self.focused_window().ok_or(StateChangeError::InvalidCaller)?;
        info!("killing client with window {:#0x}", window);

        if self.conn.kill_window(window) {
            Ok(())
        } else {
            Err(StateChangeError::StateUnchanged)
        }
    }

    pub fn toggle_bar(&mut self) -> Result<(), StateChangeError> {
        let bar = self.bar.ok_or(StateChangeError::InvalidCaller)?;
        let showing = !self.screen.showing_bar();

        self.screen.set_showing_bar(showing);

        if showing {
            self.conn.map_window(bar);
        } else {
            self.conn.unmap_window(bar);
        }

        self.arrange();
        Ok(())
    }

    pub fn quit(&mut self) -> Result<(), StateChangeError> {
        info!("quit requested");
        self.running = false;
        Ok(())
    }

    /// Hands every client back in a normal state and releases the display.
    pub fn exit(&mut self) {
        info!("exit called, shutting down window manager");

        for id in self.registry.clients().to_vec() {
            self.unban(id);
            drop(self.unmanage(id, IcccmWindowState::Normal));
        }

        self.running = false;
        self.conn.cleanup();
        self.conn.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::mock::MockConnection;
    use crate::mock::Request;
    use crate::rule::Rule;
    use crate::rule::Rules;

    use winsys::geometry::Dim;
    use winsys::hints::SizeHints;
    use winsys::input::Button;

    use nix::unistd;

    use std::collections::HashMap;

    const SCREEN: Region = Region {
        pos: Pos {
            x: 0,
            y: 0,
        },
        dim: Dim {
            w: 1000,
            h: 800,
        },
    };

    const A: Window = 0xa;
    const B: Window = 0xb;
    const C: Window = 0xc;
    const F: Window = 0xf;

    fn session_with(
        conn: &MockConnection,
        config: Config,
    ) -> Session<'_> {
        Session::new(conn, config, &HashMap::new(), &HashMap::new()).unwrap()
    }

    fn session(conn: &MockConnection) -> Session<'_> {
        session_with(conn, Config::default())
    }

    fn dispatch(
        session: &mut Session<'_>,
        event: Event,
    ) {
        let mut key_bindings: KeyBindings = HashMap::new();
        let mut mouse_bindings: MouseBindings = HashMap::new();
        session.handle_event(event, &mut key_bindings, &mut mouse_bindings);
    }

    fn pointer(
        kind: MouseEventKind,
        pos: Pos,
    ) -> Event {
        Event::Mouse {
            event: MouseEvent {
                kind,
                window: 1,
                subwindow: None,
                on_root: true,
                root_rpos: pos,
                shortcut: MouseShortcut::new(Button::Left, Vec::new()),
            },
        }
    }

    fn fixed_hints(
        w: i32,
        h: i32,
    ) -> Option<SizeHints> {
        Some(SizeHints::new(Some((w, h)), Some((w, h)), None, None, None))
    }

    #[test]
    fn manage_then_unmanage_hands_the_window_back() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(10, 10, 200, 100));
        session.manage(1).unwrap();

        assert_eq!(session.manage(1), Err(StateChangeError::EarlyStop));
        assert_eq!(session.registry().len(), 1);
        assert_eq!(session.focused_window(), Some(1));
        assert_eq!(conn.window(1).unwrap().props, Some("1000000000".into()));

        let client = session.registry().get_by_window(1).unwrap();
        assert!(!client.is_banned());
        assert_eq!(client.region(), Region::new(0, 0, 998, 798));

        let id = session.registry().id_of(1).unwrap();
        session.unmanage(id, IcccmWindowState::Withdrawn).unwrap();

        assert!(!session.registry().contains(1));
        assert_eq!(session.focused_window(), None);
        assert_eq!(conn.window(1).unwrap().state, Some(IcccmWindowState::Withdrawn));
        assert!(conn.requests().contains(&Request::BorderWidth(1, 0)));
        assert_eq!(conn.requests().last(), Some(&Request::Unfocus));
    }

    #[test]
    fn unmanage_restores_both_lists_around_existing_clients() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        for window in 1..=3 {
            conn.add_window(window, Region::new(10, 10, 200, 100));
            session.manage(window).unwrap();
        }

        session.focus_window(2).unwrap();

        let clients = session.registry().clients().to_vec();
        let stack = session.registry().stack().to_vec();

        conn.add_window(4, Region::new(10, 10, 200, 100));
        session.manage(4).unwrap();
        assert_eq!(session.registry().len(), 4);

        let id = session.registry().id_of(4).unwrap();
        session.unmanage(id, IcccmWindowState::Withdrawn).unwrap();

        assert_eq!(session.registry().clients(), clients.as_slice());
        assert_eq!(session.registry().stack(), stack.as_slice());
        assert_eq!(session.focused_window(), Some(2));
    }

    #[test]
    fn unmanaging_the_focused_client_moves_focus_on() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(10, 10, 200, 100));
        conn.add_window(2, Region::new(10, 10, 200, 100));
        session.manage(1).unwrap();
        session.manage(2).unwrap();
        session.focus_window(2).unwrap();

        conn.clear_requests();
        let id = session.registry().id_of(2).unwrap();
        session.unmanage(id, IcccmWindowState::Withdrawn).unwrap();

        assert_eq!(session.focused_window(), Some(1));
        assert!(conn.requests().contains(&Request::Focus(1)));

        conn.clear_requests();
        let id = session.registry().id_of(1).unwrap();
        session.unmanage(id, IcccmWindowState::Withdrawn).unwrap();

        assert_eq!(session.focused_window(), None);
        assert!(conn.requests().contains(&Request::Unfocus));
        assert!(!conn.requests().contains(&Request::Focus(1)));
    }

    #[test]
    fn unmanage_to_normal_state_leaves_the_arrangement_alone() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(10, 10, 200, 100));
        conn.add_window(2, Region::new(10, 10, 200, 100));
        session.manage(1).unwrap();
        session.manage(2).unwrap();

        let region = session.registry().get_by_window(1).unwrap().region();
        let stacking = session.stacking_order().to_vec();

        conn.clear_requests();
        let id = session.registry().id_of(2).unwrap();
        session.unmanage(id, IcccmWindowState::Normal).unwrap();

        assert!(!conn.requests().iter().any(|request| matches!(
            request,
            Request::Place(..) | Request::StackAbove(..)
        )));
        assert_eq!(session.registry().get_by_window(1).unwrap().region(), region);
        assert_eq!(
            session.stacking_order(),
            stacking.into_iter().filter(|&window| window != 2).collect::<Vec<_>>().as_slice()
        );
        assert_eq!(conn.window(2).unwrap().state, Some(IcccmWindowState::Normal));
    }

    #[test]
    fn override_redirect_windows_are_not_managed() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(10, 10, 200, 100));
        conn.edit_window(1, |mock| mock.attrs.override_redirect = true);

        assert_eq!(session.manage(1), Err(StateChangeError::InvalidCaller));
        assert_eq!(session.manage(2), Err(StateChangeError::InvalidCaller));
        assert!(session.registry().is_empty());
    }

    #[test]
    fn settled_geometry_is_not_resent() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(10, 10, 200, 100));
        conn.add_window(2, Region::new(10, 10, 200, 100));
        session.manage(1).unwrap();
        session.manage(2).unwrap();

        conn.clear_requests();
        session.arrange();

        assert!(!conn
            .requests()
            .iter()
            .any(|request| matches!(request, Request::Place(..))));

        let id = session.registry().id_of(1).unwrap();
        let region = session.registry().get(id).unwrap().region();
        assert!(!session.resize(id, region, true));
    }

    #[test]
    fn fixed_clients_float_and_keep_their_size() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(100, 100, 300, 200));
        conn.edit_window(1, |mock| mock.size_hints = fixed_hints(300, 200));
        session.manage(1).unwrap();

        let id = session.registry().id_of(1).unwrap();
        let client = session.registry().get(id).unwrap();
        assert!(client.is_fixed());
        assert!(client.is_floating());
        assert_eq!(client.region(), Region::new(100, 100, 300, 200));

        assert!(session.resize(id, Region::new(0, 0, 640, 480), true));
        assert_eq!(
            session.registry().get(id).unwrap().region(),
            Region::new(0, 0, 300, 200)
        );

        assert!(!session.resize(id, Region::new(0, 0, 0, 480), false));
        assert_eq!(session.start_resize(1), Err(StateChangeError::InvalidCaller));
    }

    #[test]
    fn full_display_windows_keep_their_border_at_the_origin() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(40, 40, 1000, 800));
        conn.edit_window(1, |mock| mock.attrs.border_width = 3);
        session.manage(1).unwrap();

        let place = conn
            .requests()
            .into_iter()
            .find(|request| matches!(request, Request::Place(..)));

        assert_eq!(place, Some(Request::Place(1, Region::new(0, 0, 1000, 800), 3)));
        assert_eq!(session.registry().get_by_window(1).unwrap().border(), 3);
    }

    #[test]
    fn the_last_selected_tag_cannot_be_toggled_off() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        assert_eq!(session.toggle_view(0), Err(StateChangeError::LimitReached));
        assert_eq!(session.toggle_view(42), Err(StateChangeError::InvalidCaller));

        session.toggle_view(3).unwrap();
        session.toggle_view(0).unwrap();
        assert_eq!(session.tag_set().first_selected(), 3);
    }

    #[test]
    fn transient_chain_stacks_below_the_focused_window() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);
        let region = Region::new(10, 10, 100, 100);

        conn.add_window(C, region);
        session.manage(C).unwrap();

        conn.add_window(B, region);
        conn.edit_window(B, |mock| mock.transient_for = Some(C));
        session.manage(B).unwrap();

        conn.add_window(A, region);
        conn.edit_window(A, |mock| mock.transient_for = Some(B));
        session.manage(A).unwrap();

        conn.add_window(F, region);
        conn.edit_window(F, |mock| mock.size_hints = fixed_hints(100, 100));
        session.manage(F).unwrap();

        session.focus_window(F).unwrap();

        assert_eq!(session.stacking_order(), &[F, A, B, C]);
        assert_eq!(conn.stacking(), vec![F, A, B, C]);
        assert_eq!(session.registry().get_by_window(A).unwrap().tags()[0], true);
    }

    #[test]
    fn unmaps_caused_by_hiding_are_consumed() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(10, 10, 200, 100));
        session.manage(1).unwrap();
        session.view(1).unwrap();

        let client = session.registry().get_by_window(1).unwrap();
        assert!(client.is_banned());
        assert_eq!(client.expected_unmap_count(), 1);

        dispatch(&mut session, Event::Unmap {
            window: 1,
            ignore: false,
        });

        assert!(session.registry().contains(1));

        dispatch(&mut session, Event::Unmap {
            window: 1,
            ignore: false,
        });

        assert!(!session.registry().contains(1));
    }

    #[test]
    fn configure_requests_follow_the_floating_state() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(10, 10, 200, 100));
        session.manage(1).unwrap();
        conn.clear_requests();

        dispatch(&mut session, Event::ConfigureRequest {
            window: 1,
            changes: WindowChanges {
                width: Some(50),
                ..Default::default()
            },
            on_root: false,
        });

        assert_eq!(conn.requests(), vec![Request::ConfigureNotify(
            1,
            Region::new(0, 0, 998, 798),
            1
        )]);

        session.set_layout(LayoutKind::Floating).unwrap();
        conn.clear_requests();

        dispatch(&mut session, Event::ConfigureRequest {
            window: 1,
            changes: WindowChanges {
                x: Some(20),
                y: Some(30),
                ..Default::default()
            },
            on_root: false,
        });

        let region = Region::new(20, 30, 998, 798);
        assert_eq!(conn.requests(), vec![
            Request::Place(1, region, 1),
            Request::ConfigureNotify(1, region, 1),
        ]);

        let changes = WindowChanges {
            width: Some(10),
            ..Default::default()
        };

        conn.clear_requests();
        dispatch(&mut session, Event::ConfigureRequest {
            window: 99,
            changes,
            on_root: false,
        });

        assert_eq!(conn.requests(), vec![Request::Configure(99, changes)]);
    }

    #[test]
    fn events_during_a_drag_wait_for_the_release() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(100, 100, 300, 200));
        conn.edit_window(1, |mock| mock.size_hints = fixed_hints(300, 200));
        session.manage(1).unwrap();

        conn.add_window(2, Region::new(10, 10, 200, 100));
        session.manage(2).unwrap();

        session.start_move(1).unwrap();
        assert!(session.is_dragging());
        assert_eq!(session.start_move(1), Err(StateChangeError::EarlyStop));

        dispatch(&mut session, Event::Destroy {
            window: 2,
        });

        assert!(session.registry().contains(2));

        dispatch(&mut session, pointer(MouseEventKind::Motion, Pos {
            x: 50,
            y: 60,
        }));

        assert_eq!(
            session.registry().get_by_window(1).unwrap().region(),
            Region::new(150, 160, 300, 200)
        );

        dispatch(&mut session, pointer(MouseEventKind::Release, Pos {
            x: 50,
            y: 60,
        }));

        assert!(!session.is_dragging());
        assert!(conn.requests().contains(&Request::ReleasePointer));

        let event = session.next_event().unwrap();
        dispatch(&mut session, event);

        assert!(!session.registry().contains(2));
        assert!(session.next_event().is_none());
    }

    #[test]
    fn dragging_a_tiled_client_past_the_snap_floats_it() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(10, 10, 200, 100));
        session.manage(1).unwrap();
        session.start_move(1).unwrap();

        dispatch(&mut session, pointer(MouseEventKind::Motion, Pos {
            x: 4,
            y: 4,
        }));

        assert!(!session.registry().get_by_window(1).unwrap().is_floating());

        dispatch(&mut session, pointer(MouseEventKind::Motion, Pos {
            x: 120,
            y: 90,
        }));

        let client = session.registry().get_by_window(1).unwrap();
        assert!(client.is_floating());
        assert_eq!(client.region().pos, Pos {
            x: 120,
            y: 90
        });
        assert_eq!(conn.window(1).unwrap().props, Some("1000000001".into()));
    }

    #[test]
    fn persisted_tags_win_over_rules() {
        let conn = MockConnection::new(SCREEN);
        let config = Config {
            rules: Rules::new(vec![Rule::new("^Mock:", Some("^3$"), false).unwrap()]),
            ..Default::default()
        };

        let mut session = session_with(&conn, config);

        conn.add_window(1, Region::new(10, 10, 200, 100));
        session.manage(1).unwrap();

        let client = session.registry().get_by_window(1).unwrap();
        assert_eq!(client.tags(), vec![
            false, false, true, false, false, false, false, false, false
        ]);
        assert!(client.is_banned());

        conn.add_window(2, Region::new(10, 10, 200, 100));
        conn.edit_window(2, |mock| mock.props = Some("0100000001".into()));
        session.manage(2).unwrap();

        let client = session.registry().get_by_window(2).unwrap();
        assert!(client.has_tag(1));
        assert!(!client.has_tag(2));
        assert!(client.is_floating());

        conn.add_window(3, Region::new(10, 10, 200, 100));
        conn.edit_window(3, |mock| mock.props = Some("01x".into()));
        session.manage(3).unwrap();
        assert!(session.registry().get_by_window(3).unwrap().has_tag(2));
    }

    #[test]
    fn transients_follow_rules_before_their_parent() {
        let conn = MockConnection::new(SCREEN);
        let config = Config {
            rules: Rules::new(vec![Rule::new("window 2$", Some("^3$"), false).unwrap()]),
            ..Default::default()
        };

        let mut session = session_with(&conn, config);

        conn.add_window(1, Region::new(10, 10, 200, 100));
        conn.edit_window(1, |mock| mock.props = Some("0100000000".into()));
        session.manage(1).unwrap();

        conn.add_window(2, Region::new(10, 10, 200, 100));
        conn.edit_window(2, |mock| mock.transient_for = Some(1));
        session.manage(2).unwrap();

        let client = session.registry().get_by_window(2).unwrap();
        assert!(client.has_tag(2));
        assert!(!client.has_tag(1));
        assert!(client.is_floating());

        conn.add_window(3, Region::new(10, 10, 200, 100));
        conn.edit_window(3, |mock| mock.transient_for = Some(1));
        session.manage(3).unwrap();

        let client = session.registry().get_by_window(3).unwrap();
        assert!(client.has_tag(1));
        assert!(!client.has_tag(0));
    }

    #[test]
    fn the_view_survives_a_restart() {
        let conn = MockConnection::new(SCREEN);
        let mut first = session(&conn);

        first.view(2).unwrap();
        assert_eq!(conn.get_root_props(), Some("001000000".into()));
        drop(first);

        let second = session(&conn);
        assert_eq!(second.tag_set().first_selected(), 2);

        conn.set_root_props_value("000000000");
        let third = session(&conn);
        assert_eq!(third.tag_set().first_selected(), 0);
    }

    #[test]
    fn docks_become_the_status_surface() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(10, 10, 200, 100));
        session.manage(1).unwrap();

        conn.add_window(9, Region::new(0, 780, 1000, 20));
        conn.edit_window(9, |mock| mock.dock = true);

        dispatch(&mut session, Event::MapRequest {
            window: 9,
            ignore: false,
        });

        assert_eq!(session.bar(), Some(9));
        assert!(!session.registry().contains(9));
        assert_eq!(session.screen().work_area(), Region::new(0, 0, 1000, 780));
        assert_eq!(session.stacking_order()[0], 9);
        assert_eq!(
            session.registry().get_by_window(1).unwrap().region(),
            Region::new(0, 0, 998, 778)
        );

        session.toggle_bar().unwrap();
        assert_eq!(session.screen().work_area(), SCREEN);

        dispatch(&mut session, Event::Destroy {
            window: 9,
        });

        assert_eq!(session.bar(), None);
        assert_eq!(session.toggle_bar(), Err(StateChangeError::InvalidCaller));
    }

    #[test]
    fn maximizing_twice_restores_the_arrangement() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(10, 10, 200, 100));
        conn.add_window(2, Region::new(10, 10, 200, 100));
        session.manage(1).unwrap();
        session.manage(2).unwrap();

        let tiled = session.registry().get_by_window(1).unwrap().region();

        session.toggle_max().unwrap();
        let client = session.registry().get_by_window(1).unwrap();
        assert!(client.is_floating());
        assert!(client.is_maximized());
        assert_eq!(client.region(), Region::new(0, 0, 998, 798));
        assert_eq!(conn.window(1).unwrap().props, Some("1000000001".into()));

        session.toggle_max().unwrap();
        let client = session.registry().get_by_window(1).unwrap();
        assert!(!client.is_floating());
        assert_eq!(client.region(), tiled);
        assert_eq!(conn.window(1).unwrap().props, Some("1000000000".into()));
    }

    #[test]
    fn layout_actions_respect_their_limits() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        assert_eq!(session.set_layout(LayoutKind::Tile), Err(StateChangeError::EarlyStop));

        for _ in 0..10 {
            drop(session.change_main_factor(Change::Inc(0.1)));
        }

        assert_eq!(
            session.change_main_factor(Change::Inc(0.1)),
            Err(StateChangeError::LimitReached)
        );

        assert_eq!(
            session.change_main_count(Change::Dec(1)),
            Ok(())
        );
        assert_eq!(
            session.change_main_count(Change::Dec(1)),
            Err(StateChangeError::LimitReached)
        );

        session.set_layout(LayoutKind::Grid).unwrap();
        assert_eq!(
            session.change_main_factor(Change::Dec(0.1)),
            Err(StateChangeError::InvalidCaller)
        );

        session.toggle_layout().unwrap();
        assert_eq!(session.layout().kind(), LayoutKind::Tile);

        session.view(4).unwrap();
        session.set_layout(LayoutKind::Max).unwrap();
        session.view(0).unwrap();
        assert_eq!(session.layout().kind(), LayoutKind::Tile);
        session.view(4).unwrap();
        assert_eq!(session.layout().kind(), LayoutKind::Max);
    }

    #[test]
    fn zoom_promotes_the_focused_client() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        for window in 1..=3 {
            conn.add_window(window, Region::new(10, 10, 200, 100));
            session.manage(window).unwrap();
        }

        // newest first: 3 2 1
        session.focus_window(1).unwrap();
        session.zoom().unwrap();

        let order: Vec<Window> = session
            .registry()
            .iter()
            .map(|(_, client)| client.window())
            .collect();

        assert_eq!(order, vec![1, 3, 2]);

        session.zoom().unwrap();
        assert_eq!(session.focused_window(), Some(3));

        session.swap_next().unwrap();
        let order: Vec<Window> = session
            .registry()
            .iter()
            .map(|(_, client)| client.window())
            .collect();

        assert_eq!(order, vec![1, 3, 2]);
    }

    #[test]
    fn focus_cycles_through_visible_clients() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        assert_eq!(session.focus_next(), Err(StateChangeError::InvalidCaller));

        for window in 1..=3 {
            conn.add_window(window, Region::new(10, 10, 200, 100));
            session.manage(window).unwrap();
        }

        session.focus_window(3).unwrap();
        session.focus_next().unwrap();
        assert_eq!(session.focused_window(), Some(2));

        session.focus_prev().unwrap();
        session.focus_prev().unwrap();
        assert_eq!(session.focused_window(), Some(1));
    }

    #[test]
    fn status_text_is_published_on_the_root_window() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        let (read_end, write_end) = unistd::pipe().unwrap();
        session.set_status_feed(StatusFeed::new(read_end));

        unistd::write(write_end, b"load 0.42\n").unwrap();
        session.read_status();
        assert_eq!(conn.root_name(), Some("load 0.42".into()));

        unistd::close(write_end).unwrap();
        session.read_status();
        assert_eq!(conn.root_name(), Some("EOF".into()));

        unistd::close(read_end).unwrap();
    }

    #[test]
    fn quitting_hands_every_client_back() {
        let conn = MockConnection::new(SCREEN);
        let mut session = session(&conn);

        conn.add_window(1, Region::new(10, 10, 200, 100));
        conn.add_window(2, Region::new(10, 10, 200, 100));
        session.manage(1).unwrap();
        session.manage(2).unwrap();
        session.tag(5).unwrap();

        session.quit().unwrap();
        assert!(!session.is_running());

        conn.clear_requests();
        session.exit();
        assert!(session.registry().is_empty());
        assert!(!conn.requests().iter().any(|request| matches!(
            request,
            Request::Place(..) | Request::StackAbove(..)
        )));
        assert_eq!(conn.window(1).unwrap().state, Some(IcccmWindowState::Normal));
        assert_eq!(conn.window(2).unwrap().state, Some(IcccmWindowState::Normal));
        assert!(conn.window(1).unwrap().attrs.viewable);
    }
}
