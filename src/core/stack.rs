use winsys::window::Window;

use std::collections::HashMap;
use std::collections::HashSet;
use std::vec::Vec;

/// Orders windows from top to bottom. `order` is the stacking the view
/// asks for; every window whose transient parent chain leads to another
/// window in `order` is gathered into that chain's group. A group is
/// placed where its highest member was, its root at the bottom and each
/// transient directly above its parent.
pub fn with_transient_groups(
    order: &[Window],
    transient_for: impl Fn(Window) -> Option<Window>,
) -> Vec<Window> {
    let present: HashSet<Window> = order.iter().copied().collect();
    let position: HashMap<Window, usize> = order
        .iter()
        .enumerate()
        .map(|(i, &window)| (window, i))
        .collect();

    let parent_of = |window: Window| -> Option<Window> {
        transient_for(window).filter(|parent| *parent != window && present.contains(parent))
    };

    let root_of = |window: Window| -> Window {
        let mut root = window;
        let mut seen = HashSet::new();
        seen.insert(root);

        while let Some(parent) = parent_of(root) {
            if !seen.insert(parent) {
                break;
            }

            root = parent;
        }

        root
    };

    let mut children: HashMap<Window, Vec<Window>> = HashMap::new();
    let mut roots: Vec<Window> = Vec::with_capacity(order.len());
    let mut seen_roots: HashSet<Window> = HashSet::new();

    for &window in order {
        let root = root_of(window);

        if seen_roots.insert(root) {
            roots.push(root);
        }

        if window != root {
            if let Some(parent) = parent_of(window) {
                children.entry(parent).or_default().push(window);
            }
        }
    }

    let mut stacked = Vec::with_capacity(order.len());
    let mut placed: HashSet<Window> = HashSet::new();

    for root in roots {
        // bottom to top: parent first, lower transients before higher ones
        let mut group = Vec::new();
        let mut pending = vec![root];

        while let Some(window) = pending.pop() {
            if !placed.insert(window) {
                continue;
            }

            group.push(window);

            if let Some(children) = children.get(&window) {
                let mut children = children.clone();
                children.sort_by_key(|child| position.get(child).copied().unwrap_or(0));
                pending.extend(children);
            }
        }

        stacked.extend(group.into_iter().rev());
    }

    stacked
}

/// Computes the `(window, sibling)` pairs that turn the stacking in
/// `current` into `target`, both top to bottom. Each window is stacked
/// directly above the one below it; windows at the bottom that are already
/// in place are left alone. Windows of `current` missing from `target` are
/// never used as a sibling. When nothing is in place, the lowest window of
/// `current` still in `target` anchors the first request, so the group is
/// not raised above unrelated windows.
pub fn restack_requests(
    current: &[Window],
    target: &[Window],
) -> Vec<(Window, Option<Window>)> {
    let current: Vec<Window> = current
        .iter()
        .filter(|window| target.contains(window))
        .copied()
        .collect();

    let in_place = current
        .iter()
        .rev()
        .zip(target.iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let mut requests = Vec::with_capacity(target.len() - in_place);
    let mut below = if in_place > 0 {
        Some(target[target.len() - in_place])
    } else {
        current.last().copied()
    };

    for &window in target.iter().rev().skip(in_place) {
        requests.push((window, below));
        below = Some(window);
    }

    requests
}
