#![deny(clippy::all)]
#![allow(dead_code)]

#[macro_use]
extern crate log;

use simplelog::LevelFilter;
use simplelog::SimpleLogger;

use winsys::xdata::xconnection::XConnection;
pub use winsys::Result;

use x11rb::rust_connection::RustConnection;

use std::os::unix::io::AsRawFd;

#[macro_use]
mod macros;

mod binding;
mod change;
mod client;
mod config;
mod drag;
mod error;
mod layout;
mod registry;
mod rule;
mod session;
mod stack;
mod status;
mod tag;
mod util;

#[cfg(test)]
mod mock;

use binding::KeyBindings;
use binding::MouseBindings;
use change::Change;
use change::Direction;
use config::Config;
use layout::LayoutKind;
use session::Session;

pub fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    SimpleLogger::init(LevelFilter::Debug, simplelog::Config::default())?;

    #[cfg(not(debug_assertions))]
    SimpleLogger::init(LevelFilter::Info, simplelog::Config::default())?;

    let (conn, screen_num) = RustConnection::connect(None)?;
    let xconn = XConnection::new(&conn, screen_num, conn.stream().as_raw_fd())?;

    let config = Config::default();
    let (mouse_bindings, key_bindings) = init_bindings(config.tags.len());

    Session::new(&xconn, config, &key_bindings, &mouse_bindings)?
        .run(key_bindings, mouse_bindings);

    Ok(())
}

fn init_bindings(tag_count: usize) -> (MouseBindings, KeyBindings) {
    // (kind, target, focus): "[modifiers]-button" => action
    let mouse_bindings = build_mouse_bindings!(
        (Press, Client, true):
        "1-Left" => do_internal_mouse_block!(session, window, {
            if let Some(window) = window {
                drop(session.start_move(window));
            }
        }),
        (Press, Client, true):
        "1-Middle" => do_internal_mouse!(toggle_floating),
        (Press, Client, true):
        "1-Right" => do_internal_mouse_block!(session, window, {
            if let Some(window) = window {
                drop(session.start_resize(window));
            }
        }),

        (Press, Global, false):
        "1-ScrollDown" => do_internal_mouse!(focus_next),
        (Press, Global, false):
        "1-ScrollUp" => do_internal_mouse!(focus_prev),
        (Press, Global, false):
        "1-S-ScrollDown" => do_internal_mouse!(view_next),
        (Press, Global, false):
        "1-S-ScrollUp" => do_internal_mouse!(view_prev),

        (Release, Global, false):
        "1-ScrollDown" => do_nothing!(),
        (Release, Global, false):
        "1-ScrollUp" => do_nothing!(),
    );

    // "[modifiers]-key" => action
    let mut key_bindings = build_key_bindings!(
        "1-S-q" => do_internal!(quit),
        "1-S-c" => do_internal!(kill_client),
        "1-b" => do_internal!(toggle_bar),

        // client state modifiers
        "1-S-space" => do_internal!(toggle_floating),
        "1-f" => do_internal!(toggle_max),
        "1-S-v" => do_internal!(toggle_vertical_max),
        "1-S-h" => do_internal!(toggle_horizontal_max),

        // client order modifiers
        "1-j" => do_internal!(focus_next),
        "1-k" => do_internal!(focus_prev),
        "1-S-j" => do_internal!(swap_next),
        "1-S-k" => do_internal!(swap_prev),
        "1-Return" => do_internal!(zoom),

        // layout setters
        "1-t" => do_internal!(set_layout, LayoutKind::Tile),
        "1-S-t" => do_internal!(set_layout, LayoutKind::TileLeft),
        "1-g" => do_internal!(set_layout, LayoutKind::Grid),
        "1-s" => do_internal!(set_layout, LayoutKind::Spiral),
        "1-S-s" => do_internal!(set_layout, LayoutKind::Dwindle),
        "1-m" => do_internal!(set_layout, LayoutKind::Max),
        "1-S-f" => do_internal!(set_layout, LayoutKind::Floating),
        "1-space" => do_internal!(cycle_layout, Direction::Forward),
        "1-S-Tab" => do_internal!(toggle_layout),

        // layout-data modifiers
        "1-l" => do_internal!(change_main_factor, Change::Inc(0.05f32)),
        "1-h" => do_internal!(change_main_factor, Change::Dec(0.05f32)),
        "1-i" => do_internal!(change_main_count, Change::Inc(1u32)),
        "1-d" => do_internal!(change_main_count, Change::Dec(1u32)),
        "1-S-i" => do_internal!(change_column_count, Change::Inc(1u32)),
        "1-S-d" => do_internal!(change_column_count, Change::Dec(1u32)),

        // view selection
        "1-Tab" => do_internal!(view_prev_selected),
        "1-0" => do_internal!(view_all),
        "1-S-0" => do_internal!(tag_all),
        "1-bracketleft" => do_internal!(view_prev),
        "1-bracketright" => do_internal!(view_next),

        // external spawn commands
        "1-S-Return" => spawn_external!("xterm"),
        "1-p" => spawn_external!("dmenu_run"),

        // external shell commands
        "Print" => spawn_from_shell!("import -window root $HOME/$(date +%s).png"),
    );

    let keycodes = util::Util::system_keycodes();

    for index in 0..std::cmp::min(tag_count, 9) {
        let digit = (index + 1).to_string();

        let tag_bindings: Vec<(String, binding::KeyAction)> = vec![
            (
                format!("1-{}", digit),
                do_internal!(view, index),
            ),
            (
                format!("1-C-{}", digit),
                do_internal!(toggle_view, index),
            ),
            (
                format!("1-S-{}", digit),
                do_internal!(tag, index),
            ),
            (
                format!("1-C-S-{}", digit),
                do_internal!(toggle_tag, index),
            ),
        ];

        for (binding, action) in tag_bindings {
            match util::Util::parse_key_binding(&binding, &keycodes) {
                None => warn!("could not parse key binding: {}", binding),
                Some(keycode) => drop(key_bindings.insert(keycode, action)),
            }
        }
    }

    (mouse_bindings, key_bindings)
}
