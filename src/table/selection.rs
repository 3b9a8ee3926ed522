use std::collections::BTreeSet;

/// Tri-state of the header checkbox relative to the rows on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCheck {
    All,
    Some,
    None,
}

impl HeaderCheck {
    pub fn glyph(self) -> &'static str {
        match self {
            HeaderCheck::All => "[x]",
            HeaderCheck::Some => "[-]",
            HeaderCheck::None => "[ ]",
        }
    }
}

/// Selected contact ids. Keyed by id so it survives paging and re-sorting.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns whether the id is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn header(&self, visible: &[&str]) -> HeaderCheck {
        let selected = visible.iter().filter(|id| self.ids.contains(**id)).count();
        if selected == 0 {
            HeaderCheck::None
        } else if selected == visible.len() {
            HeaderCheck::All
        } else {
            HeaderCheck::Some
        }
    }

    /// Select every visible row, or clear them when all are already selected.
    pub fn toggle_all(&mut self, visible: &[&str]) {
        if self.header(visible) == HeaderCheck::All {
            for id in visible {
                self.ids.remove(*id);
            }
        } else {
            self.ids.extend(visible.iter().map(|id| id.to_string()));
        }
    }

    pub fn remove_many(&mut self, ids: &[String]) {
        for id in ids {
            self.ids.remove(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
