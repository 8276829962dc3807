/// The two vertically synced panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPane {
    Table,
    Chart,
}

impl ScrollPane {
    pub fn other(self) -> Self {
        match self {
            ScrollPane::Table => ScrollPane::Chart,
            ScrollPane::Chart => ScrollPane::Table,
        }
    }
}

/// Keeps the task table and the chart at the same vertical offset.
///
/// Each pane reports its offset after rendering; when one moves, the
/// other is handed the new offset on its next frame. Broadcasts are
/// throttled to one per frame interval and a pane's own programmatic
/// jump is absorbed so the panes never ping-pong.
#[derive(Debug, Default)]
pub struct ScrollSync {
    offset: f32,
    pending: Option<ScrollPane>,
    expected: Option<(ScrollPane, f32)>,
    last_broadcast: Option<f64>,
}

impl ScrollSync {
    pub const DEBOUNCE_SECS: f64 = 0.016;
    pub const MIN_DELTA: f32 = 0.5;

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Record a pane's offset for this frame. A movement beyond
    /// `MIN_DELTA` makes the pane the leader and schedules the other
    /// pane to follow.
    pub fn report(&mut self, now: f64, pane: ScrollPane, offset: f32) {
        if let Some((target, value)) = self.expected {
            if target == pane {
                self.expected = None;
                if (offset - value).abs() < Self::MIN_DELTA {
                    return;
                }
            }
        }
        if (offset - self.offset).abs() < Self::MIN_DELTA {
            return;
        }
        if let Some(t) = self.last_broadcast {
            if now - t < Self::DEBOUNCE_SECS {
                return;
            }
        }
        self.offset = offset;
        self.pending = Some(pane.other());
        self.last_broadcast = Some(now);
    }

    /// Offset this pane must jump to, when the other pane moved.
    /// Consumed on read.
    pub fn take_pending(&mut self, pane: ScrollPane) -> Option<f32> {
        if self.pending == Some(pane) {
            self.pending = None;
            self.expected = Some((pane, self.offset));
            Some(self.offset)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follower_is_handed_the_leaders_offset() {
        let mut sync = ScrollSync::default();
        sync.report(0.0, ScrollPane::Table, 120.0);
        assert_eq!(sync.take_pending(ScrollPane::Table), None);
        assert_eq!(sync.take_pending(ScrollPane::Chart), Some(120.0));
        assert_eq!(sync.take_pending(ScrollPane::Chart), None);
    }

    #[test]
    fn applied_jump_does_not_bounce_back() {
        let mut sync = ScrollSync::default();
        sync.report(0.0, ScrollPane::Table, 120.0);
        assert_eq!(sync.take_pending(ScrollPane::Chart), Some(120.0));
        // the chart reports the offset it was just given
        sync.report(0.02, ScrollPane::Chart, 120.0);
        assert_eq!(sync.take_pending(ScrollPane::Table), None);
    }

    #[test]
    fn sub_pixel_jitter_is_ignored() {
        let mut sync = ScrollSync::default();
        sync.report(0.0, ScrollPane::Table, 0.3);
        assert_eq!(sync.take_pending(ScrollPane::Chart), None);
    }

    #[test]
    fn broadcasts_are_throttled_to_the_frame_interval() {
        let mut sync = ScrollSync::default();
        sync.report(0.0, ScrollPane::Table, 100.0);
        sync.report(0.005, ScrollPane::Table, 140.0);
        assert_eq!(sync.take_pending(ScrollPane::Chart), Some(100.0));
        // past the interval the newer offset goes through
        sync.report(0.02, ScrollPane::Table, 140.0);
        assert_eq!(sync.take_pending(ScrollPane::Chart), Some(140.0));
    }

    #[test]
    fn leadership_moves_with_the_user() {
        let mut sync = ScrollSync::default();
        sync.report(0.0, ScrollPane::Table, 80.0);
        assert_eq!(sync.take_pending(ScrollPane::Chart), Some(80.0));
        sync.report(0.02, ScrollPane::Chart, 80.0);
        // now the user scrolls the chart
        sync.report(0.1, ScrollPane::Chart, 300.0);
        assert_eq!(sync.take_pending(ScrollPane::Table), Some(300.0));
    }
}
