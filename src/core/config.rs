use crate::layout::Layout;
use crate::layout::LayoutData;
use crate::layout::LayoutKind;
use crate::rule::Rule;
use crate::rule::Rules;

use winsys::screen::BarPosition;
use winsys::Result;

use anyhow::anyhow;
use strum::EnumCount;
use strum::IntoEnumIterator;

use std::str::FromStr;

pub const WM_NAME: &str = "tagwm";

pub type Color = u32;

const DEFAULT_NORMAL_BORDER: Color = 0xdddddd;
const DEFAULT_FOCUSED_BORDER: Color = 0x008b8b;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    pub normal: Color,
    pub focused: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            normal: DEFAULT_NORMAL_BORDER,
            focused: DEFAULT_FOCUSED_BORDER,
        }
    }
}

/// Validated session configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub tags: Vec<String>,
    pub layouts: Vec<LayoutKind>,
    pub rules: Rules,
    pub layout_data: LayoutData,
    pub border_width: u32,
    pub snap: i32,
    pub colors: ColorScheme,
    pub unfocused_opacity: Option<f64>,
    pub resize_hints: bool,
    pub bar_position: BarPosition,
    pub focus_follows_mouse: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tags: (1..=9).map(|i| i.to_string()).collect(),
            layouts: LayoutKind::iter().collect(),
            rules: Rules::default(),
            layout_data: LayoutData::default(),
            border_width: 1,
            snap: 8,
            colors: ColorScheme::default(),
            unfocused_opacity: None,
            resize_hints: true,
            bar_position: BarPosition::Top,
            focus_follows_mouse: true,
        }
    }
}

impl Config {
    /// The layout a fresh tag starts with.
    #[inline]
    pub fn initial_layout(&self) -> LayoutKind {
        self.layouts.first().copied().unwrap_or(LayoutKind::Tile)
    }
}

/// Raw configuration values as an external configuration source would
/// provide them.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    pub tags: Vec<String>,
    pub layouts: Vec<String>,
    pub rules: Vec<(String, Option<String>, bool)>,
    pub normal_border_color: String,
    pub focused_border_color: String,
    pub unfocused_opacity: i32,
    pub main_factor: f32,
    pub main_count: i32,
    pub column_count: i32,
    pub border_width: u32,
    pub snap: i32,
    pub resize_hints: bool,
    pub bar_position: BarPosition,
    pub focus_follows_mouse: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        let config = Config::default();

        Self {
            tags: config.tags,
            layouts: config.layouts.iter().map(LayoutKind::name).collect(),
            rules: Vec::new(),
            normal_border_color: format!("#{:06x}", DEFAULT_NORMAL_BORDER),
            focused_border_color: format!("#{:06x}", DEFAULT_FOCUSED_BORDER),
            unfocused_opacity: 100,
            main_factor: config.layout_data.main_factor,
            main_count: config.layout_data.main_count as i32,
            column_count: config.layout_data.column_count as i32,
            border_width: config.border_width,
            snap: config.snap,
            resize_hints: config.resize_hints,
            bar_position: config.bar_position,
            focus_follows_mouse: config.focus_follows_mouse,
        }
    }
}

/// Parses `#rrggbb` or `rrggbb`.
pub fn parse_color(color: &str) -> Option<Color> {
    let hex = color.strip_prefix('#').unwrap_or(color);

    if hex.len() != 6 {
        return None;
    }

    u32::from_str_radix(hex, 16).ok()
}

impl ConfigBuilder {
    pub fn build(self) -> Result<Config> {
        if self.tags.is_empty() {
            return Err(anyhow!("no tags configured"));
        }

        let mut layouts = Vec::with_capacity(LayoutKind::COUNT);

        for name in &self.layouts {
            match LayoutKind::from_str(name) {
                Ok(kind) if !layouts.contains(&kind) => layouts.push(kind),
                Ok(_) => warn!("skipping duplicate layout {}", name),
                Err(_) => warn!("skipping unknown layout {}", name),
            }
        }

        if layouts.is_empty() {
            warn!("no usable layouts configured, falling back to tile and floating");
            layouts = vec![LayoutKind::Tile, LayoutKind::Floating];
        }

        let rules = self
            .rules
            .iter()
            .filter_map(|(pattern, tags, floating)| {
                match Rule::new(pattern, tags.as_deref(), *floating) {
                    Ok(rule) => Some(rule),
                    Err(e) => {
                        warn!("skipping rule {}: {}", pattern, e);
                        None
                    },
                }
            })
            .collect();

        let colors = ColorScheme {
            normal: parse_color(&self.normal_border_color).unwrap_or_else(|| {
                warn!("invalid color {}, using default", self.normal_border_color);
                DEFAULT_NORMAL_BORDER
            }),
            focused: parse_color(&self.focused_border_color).unwrap_or_else(|| {
                warn!("invalid color {}, using default", self.focused_border_color);
                DEFAULT_FOCUSED_BORDER
            }),
        };

        let unfocused_opacity = if self.unfocused_opacity <= 0 || self.unfocused_opacity >= 100 {
            None
        } else {
            Some(self.unfocused_opacity as f64 / 100f64)
        };

        Ok(Config {
            tags: self.tags,
            layouts,
            rules: Rules::new(rules),
            layout_data: Layout::clamp_data(LayoutData {
                main_count: std::cmp::max(self.main_count, 0) as u32,
                main_factor: self.main_factor,
                column_count: std::cmp::max(self.column_count, 1) as u32,
            }),
            border_width: self.border_width,
            snap: std::cmp::max(self.snap, 0),
            colors,
            unfocused_opacity,
            resize_hints: self.resize_hints,
            bar_position: self.bar_position,
            focus_follows_mouse: self.focus_follows_mouse,
        })
    }
}
