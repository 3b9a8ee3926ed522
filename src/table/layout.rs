//! Column order, widths and visibility, plus the in-progress resize and
//! drag gestures that edit them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::columns::{ColumnSet, NAME_COLUMN, SELECT_COLUMN};

/// First index a reorderable column may occupy.
pub const FIRST_MOVABLE: usize = 2;

/// The persisted shape of a user's table layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutState {
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub widths: BTreeMap<String, u16>,
    #[serde(default)]
    pub hidden: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ResizeGesture {
    column: String,
    original: u16,
    live: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DragGesture {
    column: String,
    target: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnLayout {
    order: Vec<String>,
    widths: BTreeMap<String, u16>,
    hidden: BTreeSet<String>,
    resize: Option<ResizeGesture>,
    drag: Option<DragGesture>,
}

/// Drop ids that no longer exist, append columns the saved order does not
/// know about yet, and pin the selection and name columns to the front.
fn normalize_order(saved: &[String], columns: &ColumnSet) -> Vec<String> {
    let mut order = vec![SELECT_COLUMN.to_string(), NAME_COLUMN.to_string()];
    for id in saved {
        let movable = columns.get(id).is_some_and(|c| c.is_reorderable());
        if movable && !order.contains(id) {
            order.push(id.clone());
        }
    }
    for column in columns.all() {
        if !order.contains(&column.id) {
            order.push(column.id.clone());
        }
    }
    order
}

impl ColumnLayout {
    pub fn new(state: Option<LayoutState>, columns: &ColumnSet) -> Self {
        let state = state.unwrap_or_default();
        let mut layout = Self {
            order: normalize_order(&state.order, columns),
            widths: state.widths,
            hidden: state.hidden,
            resize: None,
            drag: None,
        };
        layout.sync_columns(columns);
        layout
    }

    /// Re-normalize after the column set changed (custom fields loaded,
    /// renamed or deactivated).
    pub fn sync_columns(&mut self, columns: &ColumnSet) {
        self.order = normalize_order(&self.order, columns);
        self.widths.retain(|id, width| match columns.get(id) {
            Some(column) if column.is_resizable() => {
                *width = (*width).max(column.min_width);
                true
            }
            _ => false,
        });
        self.hidden
            .retain(|id| columns.get(id).is_some_and(|c| c.is_hideable()));
        if let Some(resize) = &self.resize {
            if !columns.contains(&resize.column) {
                self.resize = None;
            }
        }
        if let Some(drag) = &self.drag {
            if !columns.contains(&drag.column) {
                self.drag = None;
            }
        }
    }

    pub fn to_state(&self) -> LayoutState {
        LayoutState {
            order: self.order.clone(),
            widths: self.widths.clone(),
            hidden: self.hidden.clone(),
        }
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Column ids in render order, with any drag previewed at its target.
    pub fn visible(&self) -> Vec<String> {
        let order = match &self.drag {
            Some(drag) => spliced(&self.order, &drag.column, drag.target),
            None => self.order.clone(),
        };
        order
            .into_iter()
            .filter(|id| !self.hidden.contains(id))
            .collect()
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden.contains(id)
    }

    pub fn width(&self, id: &str, columns: &ColumnSet) -> u16 {
        if let Some(resize) = &self.resize {
            if resize.column == id {
                return resize.live;
            }
        }
        let Some(column) = columns.get(id) else {
            return 0;
        };
        self.widths
            .get(id)
            .copied()
            .unwrap_or(column.default_width)
            .max(column.min_width)
    }

    pub fn resizing(&self) -> Option<&str> {
        self.resize.as_ref().map(|r| r.column.as_str())
    }

    pub fn dragging(&self) -> Option<&str> {
        self.drag.as_ref().map(|d| d.column.as_str())
    }

    pub fn begin_resize(&mut self, id: &str, columns: &ColumnSet) -> bool {
        match columns.get(id) {
            Some(column) if column.is_resizable() => {
                let width = self.width(id, columns);
                self.drag = None;
                self.resize = Some(ResizeGesture {
                    column: id.to_string(),
                    original: width,
                    live: width,
                });
                true
            }
            _ => false,
        }
    }

    /// Widen or narrow the live width; never below the column minimum.
    pub fn adjust_resize(&mut self, delta: i32, columns: &ColumnSet) {
        let Some(resize) = self.resize.as_mut() else {
            return;
        };
        let min = columns.get(&resize.column).map_or(1, |c| c.min_width);
        let next = (i32::from(resize.live) + delta).clamp(i32::from(min), i32::from(u16::MAX));
        resize.live = next as u16;
    }

    /// Keep the live width. Returns true when it differs from where the
    /// gesture started.
    pub fn commit_resize(&mut self) -> bool {
        let Some(resize) = self.resize.take() else {
            return false;
        };
        self.widths.insert(resize.column, resize.live);
        resize.live != resize.original
    }

    pub fn cancel_resize(&mut self) {
        self.resize = None;
    }

    pub fn begin_drag(&mut self, id: &str, columns: &ColumnSet) -> bool {
        if !columns.get(id).is_some_and(|c| c.is_reorderable()) {
            return false;
        }
        let Some(position) = self.order.iter().position(|c| c == id) else {
            return false;
        };
        self.resize = None;
        self.drag = Some(DragGesture {
            column: id.to_string(),
            target: position,
        });
        true
    }

    /// Step the drop target left or right, skipping hidden columns.
    pub fn drag_by(&mut self, delta: isize) {
        let len = self.order.len();
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let others: Vec<&String> = self.order.iter().filter(|c| **c != drag.column).collect();
        let mut remaining = delta.unsigned_abs();
        let mut target = drag.target;
        while remaining > 0 {
            let passed = if delta > 0 {
                if target + 1 >= len {
                    break;
                }
                target += 1;
                others[target - 1]
            } else {
                if target <= FIRST_MOVABLE {
                    break;
                }
                target -= 1;
                others[target]
            };
            if !self.hidden.contains(passed) {
                remaining -= 1;
            }
        }
        drag.target = target;
    }

    /// Place the dragged column at its target. Returns true when the order
    /// changed.
    pub fn drop_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let next = spliced(&self.order, &drag.column, drag.target);
        let changed = next != self.order;
        self.order = next;
        changed
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    pub fn toggle_hidden(&mut self, id: &str, columns: &ColumnSet) -> bool {
        if !columns.get(id).is_some_and(|c| c.is_hideable()) {
            return false;
        }
        if !self.hidden.remove(id) {
            self.hidden.insert(id.to_string());
        }
        true
    }
}

fn spliced(order: &[String], id: &str, target: usize) -> Vec<String> {
    let mut next: Vec<String> = order.iter().filter(|c| *c != id).cloned().collect();
    let at = target.min(next.len());
    next.insert(at, id.to_string());
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> ColumnSet {
        ColumnSet::build(&[], 8)
    }

    #[test]
    fn test_normalize_pins_front_and_appends_missing() {
        let set = columns();
        let saved = LayoutState {
            order: vec![
                "status".into(),
                "name".into(),
                "gone".into(),
                "select".into(),
                "email".into(),
            ],
            ..LayoutState::default()
        };
        let layout = ColumnLayout::new(Some(saved), &set);
        let order = layout.order();
        assert_eq!(&order[..4], &["select", "name", "status", "email"]);
        assert!(!order.iter().any(|id| id == "gone"));
        assert_eq!(order.len(), set.all().len());
    }

    #[test]
    fn test_reorder_survives_persist_and_reload() {
        let set = columns();
        let mut layout = ColumnLayout::new(None, &set);
        assert!(layout.begin_drag("updatedAt", &set));
        layout.drag_by(-50);
        assert!(layout.drop_drag());
        assert_eq!(layout.order()[2], "updatedAt");
        assert!(!layout.begin_drag("name", &set));

        let reloaded = ColumnLayout::new(Some(layout.to_state()), &set);
        assert_eq!(reloaded.order(), layout.order());
        assert_eq!(reloaded.order()[0], SELECT_COLUMN);
        assert_eq!(reloaded.order()[1], NAME_COLUMN);
    }

    #[test]
    fn test_drag_never_passes_name() {
        let set = columns();
        let mut layout = ColumnLayout::new(None, &set);
        let start = layout.order().iter().position(|c| c == "status").unwrap();
        assert!(layout.begin_drag("status", &set));
        layout.drag_by(-50);
        assert_eq!(layout.visible()[2], "status");
        assert!(layout.drop_drag());
        assert_eq!(layout.order()[2], "status");
        assert!(start > 2);
        assert!(!layout.begin_drag("select", &set));
    }

    #[test]
    fn test_resize_clamps_and_cancel_restores() {
        let set = columns();
        let mut layout = ColumnLayout::new(None, &set);
        let before = layout.width("email", &set);
        assert!(layout.begin_resize("email", &set));
        layout.adjust_resize(-500, &set);
        assert_eq!(layout.width("email", &set), 8);
        layout.cancel_resize();
        assert_eq!(layout.width("email", &set), before);

        layout.begin_resize("name", &set);
        layout.adjust_resize(-500, &set);
        assert!(layout.commit_resize());
        assert_eq!(layout.width("name", &set), 12);
        assert!(!layout.begin_resize("select", &set));
    }

    #[test]
    fn test_saved_widths_respect_minimum() {
        let set = columns();
        let mut widths = BTreeMap::new();
        widths.insert("phone".to_string(), 2u16);
        let layout = ColumnLayout::new(
            Some(LayoutState {
                widths,
                ..LayoutState::default()
            }),
            &set,
        );
        assert_eq!(layout.width("phone", &set), 8);
    }

    #[test]
    fn test_hide_keeps_pinned_columns() {
        let set = columns();
        let mut layout = ColumnLayout::new(None, &set);
        assert!(layout.toggle_hidden("phone", &set));
        assert!(!layout.visible().iter().any(|c| c == "phone"));
        assert!(!layout.toggle_hidden("name", &set));
        assert!(layout.toggle_hidden("phone", &set));
        assert!(layout.visible().iter().any(|c| c == "phone"));
    }
}
