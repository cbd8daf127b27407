//! Download progress accounting.

/// Bytes received against the advertised length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes written so far.
    pub received: u64,
    /// Advertised content length, if the server sent one.
    pub total: Option<u64>,
}

impl DownloadProgress {
    /// Start tracking a transfer of `total` bytes.
    pub fn new(total: Option<u64>) -> Self {
        Self { received: 0, total }
    }

    /// Record `bytes` more received.
    pub fn advance(&mut self, bytes: u64) {
        self.received += bytes;
    }

    /// Percentage complete, `None` when the length is unknown or zero.
    ///
    /// Capped at 100 for servers that under-report their length.
    pub fn percent(&self) -> Option<u8> {
        match self.total {
            Some(total) if total > 0 => {
                Some((self.received.saturating_mul(100) / total).min(100) as u8)
            }
            _ => None,
        }
    }
}

/// Emits each 10% step once.
#[derive(Debug, Default)]
pub(crate) struct DecileTracker {
    last: Option<u8>,
}

impl DecileTracker {
    /// Returns the percentage when `progress` entered a new 10% band.
    pub(crate) fn step(&mut self, progress: &DownloadProgress) -> Option<u8> {
        let percent = progress.percent()?;
        let decile = percent / 10;
        if self.last == Some(decile) {
            return None;
        }
        self.last = Some(decile);
        Some(percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_known_length() {
        let mut progress = DownloadProgress::new(Some(200));
        progress.advance(50);
        assert_eq!(progress.percent(), Some(25));
        progress.advance(150);
        assert_eq!(progress.percent(), Some(100));
    }

    #[test]
    fn percent_unknown_without_length() {
        let mut progress = DownloadProgress::new(None);
        progress.advance(1024);
        assert_eq!(progress.percent(), None);
    }

    #[test]
    fn percent_unknown_for_zero_length() {
        let mut progress = DownloadProgress::new(Some(0));
        progress.advance(10);
        assert_eq!(progress.percent(), None);
    }

    #[test]
    fn percent_capped_when_length_under_reported() {
        let mut progress = DownloadProgress::new(Some(10));
        progress.advance(40);
        assert_eq!(progress.percent(), Some(100));
    }

    #[test]
    fn decile_tracker_reports_each_band_once() {
        let mut tracker = DecileTracker::default();
        let mut progress = DownloadProgress::new(Some(100));

        let mut reported = Vec::new();
        for _ in 0..100 {
            progress.advance(1);
            if let Some(p) = tracker.step(&progress) {
                reported.push(p);
            }
        }

        assert_eq!(reported, vec![1, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    }

    #[test]
    fn decile_tracker_silent_without_length() {
        let mut tracker = DecileTracker::default();
        let mut progress = DownloadProgress::new(None);
        progress.advance(5);
        assert_eq!(tracker.step(&progress), None);
    }
}
