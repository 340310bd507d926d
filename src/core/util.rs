use crate::change::Change;
use crate::change::Direction;

use winsys::input::Button;
use winsys::input::CodeMap;
use winsys::input::KeyCode;
use winsys::input::Modifier;
use winsys::input::MouseShortcut;

use std::cmp::Ord;
use std::convert::TryFrom;
use std::hash::BuildHasher;
use std::hash::Hasher;
use std::ops::Add;
use std::ops::AddAssign;
use std::ops::Mul;
use std::ops::MulAssign;
use std::ops::Sub;
use std::ops::SubAssign;
use std::process::Command;
use std::process::Stdio;

/// Hasher for maps keyed by window identifiers, which are already unique.
#[derive(Default)]
pub struct IdHasher {
    state: u64,
}

impl Hasher for IdHasher {
    #[inline]
    fn write(
        &mut self,
        bytes: &[u8],
    ) {
        for &byte in bytes {
            self.state = self.state.rotate_left(8) + u64::from(byte);
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }
}

#[derive(Default, Clone)]
pub struct BuildIdHasher;

impl BuildHasher for BuildIdHasher {
    type Hasher = IdHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        Self::Hasher {
            state: 0,
        }
    }
}

pub struct Util;

impl Util {
    #[inline]
    pub fn next_index(
        len: usize,
        index: usize,
        dir: Direction,
    ) -> usize {
        if len == 0 {
            return 0;
        }

        match dir {
            Direction::Forward => (index + 1) % len,
            Direction::Backward => {
                if index == 0 {
                    len - 1
                } else {
                    index - 1
                }
            },
        }
    }

    #[inline]
    pub fn change_within_range<T>(
        min: T,
        max: T,
        mut base: T,
        change: Change<T>,
    ) -> T
    where
        T: Ord
            + Add<Output = T>
            + AddAssign
            + Mul<Output = T>
            + MulAssign
            + Sub<Output = T>
            + SubAssign
            + Copy,
    {
        match change {
            Change::Inc(delta) => {
                base += delta;
                if base > max {
                    max
                } else {
                    base
                }
            },
            Change::Dec(delta) => {
                if base >= min + delta {
                    base - delta
                } else {
                    min
                }
            },
        }
    }

    pub fn spawn<S: Into<String>>(cmd: S) {
        let cmd = cmd.into();
        let args: Vec<&str> = cmd.split_whitespace().collect();

        if let Some((program, args)) = args.split_first() {
            if let Err(e) = Command::new(program)
                .args(args)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                warn!("unable to spawn {}: {}", program, e);
            }
        }
    }

    pub fn spawn_shell<S: Into<String>>(cmd: S) {
        let cmd = cmd.into();

        if let Err(e) = Command::new("sh")
            .arg("-c")
            .arg(&cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            warn!("unable to spawn shell command {}: {}", cmd, e);
        }
    }

    /// Parses `xmodmap -pke` output into a keysym name to keycode map.
    pub fn parse_keycodes(xmodmap: &str) -> CodeMap {
        xmodmap
            .lines()
            .flat_map(|line| {
                let mut words = line.split_whitespace();
                let key_code: Option<u8> = words.nth(1).and_then(|word| word.parse().ok());

                key_code
                    .into_iter()
                    .flat_map(move |key_code| words.clone().skip(1).map(move |name| (name.into(), key_code)))
            })
            .collect::<CodeMap>()
    }

    pub fn system_keycodes() -> CodeMap {
        match Command::new("xmodmap").arg("-pke").output() {
            Err(e) => {
                warn!("unable to fetch keycodes via xmodmap: {}", e);
                CodeMap::new()
            },
            Ok(o) => match String::from_utf8(o.stdout) {
                Err(e) => {
                    warn!("invalid utf8 from xmodmap: {}", e);
                    CodeMap::new()
                },
                Ok(s) => Self::parse_keycodes(&s),
            },
        }
    }

    pub fn parse_key_binding(
        key_binding: impl Into<String>,
        keycodes: &CodeMap,
    ) -> Option<KeyCode> {
        let s = key_binding.into();
        let mut constituents: Vec<&str> = s.split('-').collect();
        let code = *keycodes.get(constituents.pop()?)?;

        let mask = constituents
            .iter()
            .map(|&modifier| Modifier::try_from(modifier).map(u16::from))
            .collect::<Result<Vec<u16>, _>>()
            .ok()?
            .into_iter()
            .fold(0, |acc, modifier| acc | modifier);

        Some(KeyCode {
            mask,
            code,
        })
    }

    pub fn parse_mouse_binding(mouse_binding: impl Into<String>) -> Option<MouseShortcut> {
        let s = mouse_binding.into();
        let mut constituents: Vec<&str> = s.split('-').collect();
        let button = Button::try_from(constituents.pop()?).ok()?;

        let modifiers = constituents
            .iter()
            .map(|&modifier| Modifier::try_from(modifier))
            .collect::<Result<Vec<Modifier>, _>>()
            .ok()?;

        Some(MouseShortcut::new(button, modifiers))
    }
}
