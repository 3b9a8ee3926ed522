use std::ops::Range;

/// Which slice of the rows is on screen, and which slice is rendered.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    offset: usize,
    height: usize,
    overscan: usize,
}

impl Viewport {
    pub fn new(overscan: usize) -> Self {
        Self {
            offset: 0,
            height: 0,
            overscan,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set_height(&mut self, height: usize, row_count: usize) {
        self.height = height;
        self.offset = self.offset.min(self.max_offset(row_count));
    }

    fn max_offset(&self, row_count: usize) -> usize {
        row_count.saturating_sub(self.height.max(1))
    }

    pub fn visible(&self, row_count: usize) -> Range<usize> {
        let start = self.offset.min(row_count);
        start..(start + self.height).min(row_count)
    }

    /// Rows to build: the visible window plus `overscan` on either side.
    pub fn mounted(&self, row_count: usize) -> Range<usize> {
        let visible = self.visible(row_count);
        let start = visible.start.saturating_sub(self.overscan);
        let end = (visible.end + self.overscan).min(row_count);
        start..end
    }

    /// Scroll just enough to bring `row` on screen.
    pub fn scroll_to(&mut self, row: usize, row_count: usize) {
        if self.height == 0 {
            self.offset = row.min(self.max_offset(row_count));
            return;
        }
        if row < self.offset {
            self.offset = row;
        } else if row >= self.offset + self.height {
            self.offset = row + 1 - self.height;
        }
        self.offset = self.offset.min(self.max_offset(row_count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mounted_rows_are_bounded() {
        for rows in [0usize, 1, 5, 37, 100, 1000] {
            let mut viewport = Viewport::new(4);
            viewport.set_height(20, rows);
            for offset in (0..rows + 10).step_by(7) {
                viewport.scroll_to(offset, rows);
                let mounted = viewport.mounted(rows);
                assert!(mounted.len() <= 20 + 2 * 4, "rows={} offset={}", rows, offset);
                assert!(mounted.end <= rows);
                let visible = viewport.visible(rows);
                assert!(mounted.start <= visible.start && visible.end <= mounted.end);
            }
        }
    }

    #[test]
    fn test_scroll_to_keeps_row_visible() {
        let mut viewport = Viewport::new(2);
        viewport.set_height(10, 100);
        viewport.scroll_to(42, 100);
        assert!(viewport.visible(100).contains(&42));
        viewport.scroll_to(3, 100);
        assert_eq!(viewport.visible(100).start, 3);
        viewport.scroll_to(99, 100);
        assert_eq!(viewport.visible(100), 90..100);
    }
}
