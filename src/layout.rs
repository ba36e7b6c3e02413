use ratatui::layout::Rect;

pub const MIN_SPLIT: f64 = 0.2;
pub const MAX_SPLIT: f64 = 0.8;

/// Rectangles of the log pane, detail pane and query line
#[derive(Clone, Debug)]
pub struct PaneLayout {
    split_ratio: f64,
    step: f64,
    log: Rect,
    detail: Rect,
    query: Rect,
}

/// The drawable area inside a one-cell border
pub fn inset(rect: Rect) -> Rect {
    if rect.width < 2 || rect.height < 2 {
        return Rect::new(rect.x, rect.y, 0, 0);
    }
    Rect::new(rect.x + 1, rect.y + 1, rect.width - 2, rect.height - 2)
}

impl PaneLayout {
    pub fn new(split_ratio: f64, step: f64) -> Self {
        Self {
            split_ratio: split_ratio.clamp(MIN_SPLIT, MAX_SPLIT),
            step,
            log: Rect::default(),
            detail: Rect::default(),
            query: Rect::default(),
        }
    }

    pub fn split_ratio(&self) -> f64 {
        self.split_ratio
    }

    /// Move the divider by `delta`; the ratio stays a multiple of the step
    pub fn adjust_split(&mut self, delta: f64) {
        let mut ratio = self.split_ratio + delta;
        if self.step > 0.0 {
            ratio = (ratio / self.step).round() / self.step.recip();
        }
        self.split_ratio = ratio.clamp(MIN_SPLIT, MAX_SPLIT);
    }

    pub fn shrink_log(&mut self) {
        self.adjust_split(-self.step);
    }

    pub fn grow_log(&mut self) {
        self.adjust_split(self.step);
    }

    /// Recompute every rectangle for a terminal of the given size.
    ///
    /// The divider column is `ceil(ratio * width) - 1`; the last row is left
    /// for the query line.
    pub fn compute(&mut self, width: u16, height: u16) {
        if width == 0 || height == 0 {
            self.log = Rect::default();
            self.detail = Rect::default();
            self.query = Rect::default();
            return;
        }

        let divider = ((self.split_ratio * f64::from(width)).ceil() as u16)
            .saturating_sub(1)
            .min(width - 1);
        let pane_height = height - 1;

        self.log = Rect::new(0, 0, divider + 1, pane_height);
        self.detail = Rect::new(divider + 1, 0, width - divider - 1, pane_height);
        self.query = Rect::new(0, height - 1, width, 1);
    }

    pub fn log_pane(&self) -> Rect {
        self.log
    }

    pub fn detail_pane(&self) -> Rect {
        self.detail
    }

    pub fn query_line(&self) -> Rect {
        self.query
    }

    /// Rows available for log entries
    pub fn log_rows(&self) -> usize {
        inset(self.log).height as usize
    }

    pub fn detail_rows(&self) -> usize {
        inset(self.detail).height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let mut layout = PaneLayout::new(0.5, 0.05);
        layout.compute(80, 24);
        assert_eq!(layout.log_pane(), Rect::new(0, 0, 40, 23));
        assert_eq!(layout.detail_pane(), Rect::new(40, 0, 40, 23));
        assert_eq!(layout.query_line(), Rect::new(0, 23, 80, 1));
        assert_eq!(layout.log_rows(), 21);
        assert_eq!(inset(layout.log_pane()), Rect::new(1, 1, 38, 21));
    }

    #[test]
    fn test_divider_rounds_up() {
        let mut layout = PaneLayout::new(0.33, 0.05);
        layout.compute(10, 5);
        // ceil(3.3) - 1 = 3, so the log pane spans columns 0..=3
        assert_eq!(layout.log_pane().width, 4);
        assert_eq!(layout.detail_pane().x, 4);
        assert_eq!(layout.detail_pane().width, 6);
    }

    #[test]
    fn test_shrink_clamps_at_minimum() {
        let mut layout = PaneLayout::new(0.5, 0.05);
        for _ in 0..10 {
            layout.shrink_log();
            assert!(layout.split_ratio() >= MIN_SPLIT);
        }
        assert_eq!(layout.split_ratio(), MIN_SPLIT);
    }

    #[test]
    fn test_repeated_steps_stay_on_grid() {
        let mut layout = PaneLayout::new(0.5, 0.05);
        for _ in 0..3 {
            layout.shrink_log();
        }
        assert_eq!(layout.split_ratio(), 0.35);
        layout.compute(80, 24);
        // ceil(0.35 * 80) - 1 = 27
        assert_eq!(layout.log_pane().width, 28);

        for _ in 0..7 {
            layout.shrink_log();
        }
        for _ in 0..6 {
            layout.grow_log();
        }
        assert_eq!(layout.split_ratio(), 0.5);
    }

    #[test]
    fn test_grow_clamps_at_maximum() {
        let mut layout = PaneLayout::new(0.7, 0.05);
        for _ in 0..5 {
            layout.grow_log();
        }
        assert_eq!(layout.split_ratio(), MAX_SPLIT);
    }

    #[test]
    fn test_initial_ratio_is_clamped() {
        assert_eq!(PaneLayout::new(0.95, 0.05).split_ratio(), MAX_SPLIT);
        assert_eq!(PaneLayout::new(0.0, 0.05).split_ratio(), MIN_SPLIT);
    }

    #[test]
    fn test_degenerate_sizes() {
        let mut layout = PaneLayout::new(0.5, 0.05);
        layout.compute(0, 0);
        assert_eq!(layout.log_rows(), 0);

        layout.compute(1, 1);
        assert_eq!(layout.log_pane().height, 0);
        assert_eq!(layout.query_line(), Rect::new(0, 0, 1, 1));
        assert_eq!(layout.detail_pane().width, 0);

        layout.compute(3, 2);
        assert_eq!(layout.log_rows(), 0);
        assert_eq!(inset(layout.log_pane()).width, 0);
    }
}
