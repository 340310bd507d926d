use crate::change::Direction;
use crate::error::StateChangeError;
use crate::layout::LayoutKind;
use crate::util::Util;

use anyhow::anyhow;
use regex::Regex;

/// The configured tags, the current view over them, and the layout each
/// tag last used.
#[derive(Debug, Clone, PartialEq)]
pub struct TagSet {
    names: Vec<String>,
    selected: Vec<bool>,
    prev_selected: Vec<bool>,
    layouts: Vec<LayoutKind>,
}

impl TagSet {
    pub fn new(
        names: Vec<String>,
        layout: LayoutKind,
    ) -> winsys::Result<Self> {
        if names.is_empty() {
            return Err(anyhow!("at least one tag must be configured"));
        }

        let mut selected = vec![false; names.len()];
        selected[0] = true;

        Ok(Self {
            layouts: vec![layout; names.len()],
            prev_selected: selected.clone(),
            selected,
            names,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    pub fn selected(&self) -> &[bool] {
        &self.selected
    }

    #[inline]
    pub fn prev_selected(&self) -> &[bool] {
        &self.prev_selected
    }

    #[inline]
    pub fn index_of(
        &self,
        name: &str,
    ) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// A tag membership is visible when it shares a tag with the view.
    #[inline]
    pub fn is_visible(
        &self,
        tags: &[bool],
    ) -> bool {
        tags.iter().zip(self.selected.iter()).any(|(&t, &s)| t && s)
    }

    #[inline]
    pub fn is_tag_selected(
        &self,
        index: usize,
    ) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }

    #[inline]
    pub fn first_selected(&self) -> usize {
        self.selected.iter().position(|&s| s).unwrap_or(0)
    }

    /// The layout remembered by the first selected tag.
    #[inline]
    pub fn view_layout(&self) -> LayoutKind {
        self.layouts[self.first_selected()]
    }

    #[inline]
    pub fn layout_of(
        &self,
        index: usize,
    ) -> Option<LayoutKind> {
        self.layouts.get(index).copied()
    }

    /// Records the layout on every selected tag.
    pub fn set_view_layout(
        &mut self,
        layout: LayoutKind,
    ) {
        for (kind, &selected) in self.layouts.iter_mut().zip(self.selected.iter()) {
            if selected {
                *kind = layout;
            }
        }
    }

    /// Membership with only the current view's tags set.
    #[inline]
    pub fn current_tags(&self) -> Vec<bool> {
        self.selected.clone()
    }

    /// Membership of the tags whose names match the pattern.
    pub fn matching_tags(
        &self,
        pattern: &Regex,
    ) -> Vec<bool> {
        self.names.iter().map(|name| pattern.is_match(name)).collect()
    }

    fn replace_view(
        &mut self,
        selected: Vec<bool>,
    ) -> Result<(), StateChangeError> {
        if selected == self.selected {
            return Err(StateChangeError::EarlyStop);
        }

        self.prev_selected = std::mem::replace(&mut self.selected, selected);
        Ok(())
    }

    pub fn view(
        &mut self,
        index: usize,
    ) -> Result<(), StateChangeError> {
        if index >= self.len() {
            return Err(StateChangeError::InvalidCaller);
        }

        let mut selected = vec![false; self.len()];
        selected[index] = true;

        self.replace_view(selected)
    }

    pub fn view_all(&mut self) -> Result<(), StateChangeError> {
        self.replace_view(vec![true; self.len()])
    }

    /// Flips one tag in the view, refusing to clear the last selected bit.
    pub fn toggle_view(
        &mut self,
        index: usize,
    ) -> Result<(), StateChangeError> {
        let mut selected = self.selected.clone();
        Self::toggle_in(&mut selected, index)?;
        self.replace_view(selected)
    }

    pub fn view_prev_selected(&mut self) -> Result<(), StateChangeError> {
        if self.prev_selected == self.selected {
            return Err(StateChangeError::StateUnchanged);
        }

        std::mem::swap(&mut self.selected, &mut self.prev_selected);
        Ok(())
    }

    /// Views the tag next to the first selected one, wrapping around.
    pub fn view_relative(
        &mut self,
        dir: Direction,
    ) -> Result<(), StateChangeError> {
        let index = Util::next_index(self.len(), self.first_selected(), dir);
        self.view(index)
    }

    /// Restores a persisted view; views without a selected tag or with a
    /// different tag count are rejected.
    pub fn restore_view(
        &mut self,
        selected: Vec<bool>,
    ) -> Result<(), StateChangeError> {
        if selected.len() != self.len() || !selected.iter().any(|&s| s) {
            return Err(StateChangeError::InvalidCaller);
        }

        self.selected = selected;
        self.prev_selected = self.selected.clone();
        Ok(())
    }

    /// Flips one bit of a membership vector unless it is the last set bit.
    pub fn toggle_in(
        tags: &mut [bool],
        index: usize,
    ) -> Result<(), StateChangeError> {
        match tags.get(index).copied() {
            None => Err(StateChangeError::InvalidCaller),
            Some(true) if tags.iter().filter(|&&t| t).count() == 1 => {
                Err(StateChangeError::LimitReached)
            },
            Some(set) => {
                tags[index] = !set;
                Ok(())
            },
        }
    }

    pub fn encode_view(&self) -> String {
        self.selected.iter().map(|&s| if s { '1' } else { '0' }).collect()
    }

    pub fn decode_view(
        &self,
        props: &str,
    ) -> Option<Vec<bool>> {
        decode_bits(props).filter(|bits| bits.len() == self.len())
    }
}

fn decode_bits(props: &str) -> Option<Vec<bool>> {
    props
        .chars()
        .map(|c| match c {
            '1' => Some(true),
            '0' => Some(false),
            _ => None,
        })
        .collect()
}

/// Packs a client's tag membership and floating flag into one `'1'`/`'0'`
/// character per tag followed by the floating character.
pub fn encode_props(
    tags: &[bool],
    floating: bool,
) -> String {
    tags.iter()
        .chain(std::iter::once(&floating))
        .map(|&b| if b { '1' } else { '0' })
        .collect()
}

/// Unpacks a persisted property; it must hold exactly one character per
/// configured tag plus the floating character.
pub fn decode_props(
    props: &str,
    tag_count: usize,
) -> Option<(Vec<bool>, bool)> {
    let mut bits = decode_bits(props)?;

    if bits.len() != tag_count + 1 {
        return None;
    }

    let floating = bits.pop()?;
    Some((bits, floating))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_set(n: usize) -> TagSet {
        TagSet::new(
            (1..=n).map(|i| i.to_string()).collect(),
            LayoutKind::Tile,
        )
        .unwrap()
    }

    #[test]
    fn empty_tag_list_is_rejected() {
        assert!(TagSet::new(Vec::new(), LayoutKind::Tile).is_err());
    }

    #[test]
    fn visibility_requires_a_shared_tag() {
        let mut tags = tag_set(3);

        assert!(tags.is_visible(&[true, false, false]));
        assert!(!tags.is_visible(&[false, true, true]));

        tags.toggle_view(2).unwrap();
        assert!(tags.is_visible(&[false, true, true]));
        assert!(!tags.is_visible(&[false, false, false]));
    }

    #[test]
    fn toggling_every_tag_off_keeps_one_selected() {
        let mut tags = tag_set(4);
        tags.view_all().unwrap();

        for i in 0..4 {
            let _ = tags.toggle_view(i);
        }

        assert_eq!(tags.selected().iter().filter(|&&s| s).count(), 1);
        assert_eq!(tags.selected(), &[false, false, false, true]);
        assert_eq!(tags.toggle_view(3), Err(StateChangeError::LimitReached));
    }

    #[test]
    fn previous_view_is_swapped_back() {
        let mut tags = tag_set(3);

        tags.view(2).unwrap();
        assert_eq!(tags.view(2), Err(StateChangeError::EarlyStop));

        tags.view_prev_selected().unwrap();
        assert_eq!(tags.selected(), &[true, false, false]);

        tags.view_prev_selected().unwrap();
        assert_eq!(tags.selected(), &[false, false, true]);
    }

    #[test]
    fn relative_view_wraps() {
        let mut tags = tag_set(3);

        tags.view_relative(Direction::Backward).unwrap();
        assert_eq!(tags.first_selected(), 2);

        tags.view_relative(Direction::Forward).unwrap();
        assert_eq!(tags.first_selected(), 0);
    }

    #[test]
    fn layouts_follow_the_first_selected_tag() {
        let mut tags = tag_set(3);

        tags.view(1).unwrap();
        tags.set_view_layout(LayoutKind::Grid);
        assert_eq!(tags.view_layout(), LayoutKind::Grid);

        tags.view(0).unwrap();
        assert_eq!(tags.view_layout(), LayoutKind::Tile);

        tags.toggle_view(1).unwrap();
        assert_eq!(tags.view_layout(), LayoutKind::Tile);
        assert_eq!(tags.layout_of(1), Some(LayoutKind::Grid));
    }

    #[test]
    fn props_round_trip() {
        for n in 1..6 {
            for mask in 0..(1u32 << n) {
                let tags: Vec<bool> = (0..n).map(|i| mask & (1 << i) != 0).collect();

                for &floating in &[false, true] {
                    let props = encode_props(&tags, floating);
                    assert_eq!(decode_props(&props, n), Some((tags.clone(), floating)));
                }
            }
        }
    }

    #[test]
    fn mismatched_props_are_rejected() {
        assert_eq!(encode_props(&[true, false, true], true), "1011");
        assert_eq!(decode_props("1011", 4), None);
        assert_eq!(decode_props("10110", 3), None);
        assert_eq!(decode_props("1x11", 3), None);
        assert_eq!(decode_props("", 0), None);
    }

    #[test]
    fn persisted_view_must_select_something() {
        let mut tags = tag_set(3);

        assert_eq!(tags.decode_view("010"), Some(vec![false, true, false]));
        assert_eq!(tags.decode_view("01"), None);
        assert!(tags.restore_view(vec![false; 3]).is_err());

        tags.restore_view(vec![false, true, true]).unwrap();
        assert_eq!(tags.encode_view(), "011");
    }

    #[test]
    fn tags_are_matched_by_pattern() {
        let tags = TagSet::new(
            vec!["web".into(), "mail".into(), "www".into()],
            LayoutKind::Tile,
        )
        .unwrap();

        let pattern = Regex::new("^w").unwrap();
        assert_eq!(tags.matching_tags(&pattern), vec![true, false, true]);
        assert_eq!(tags.index_of("mail"), Some(1));
    }
}
