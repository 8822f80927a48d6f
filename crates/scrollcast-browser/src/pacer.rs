//! Constant frame rate pacing for screencast frames.
//!
//! The screencast only emits a frame when the page repaints. The encoder
//! reads a constant-rate stream, so each frame is held (repeated) until the
//! slot of the next one.

/// Maps timestamped frames onto fixed-rate output slots.
///
/// Slot `k` shows the latest frame whose timestamp is at or before
/// `origin + k / fps`, where `origin` is the first frame's timestamp.
#[derive(Debug, Clone)]
pub struct FramePacer {
    fps: f64,
    origin: Option<f64>,
    next_slot: u64,
}

impl FramePacer {
    pub fn new(fps: u32) -> Self {
        Self {
            fps: fps.max(1) as f64,
            origin: None,
            next_slot: 0,
        }
    }

    /// A frame arrived at `timestamp` (seconds).
    ///
    /// Returns how many copies of the previously held frame to write before
    /// the new frame takes over. Zero for the first frame and for frames that
    /// land in an already filled slot.
    pub fn on_frame(&mut self, timestamp: f64) -> u64 {
        let Some(origin) = self.origin else {
            self.origin = Some(timestamp);
            return 0;
        };
        self.fill_until(self.slot(origin, timestamp))
    }

    /// Recording stopped at `timestamp`.
    ///
    /// Returns how many copies of the held frame close out the stream,
    /// including the slot `timestamp` falls in. Zero if no frame arrived.
    pub fn finish(&mut self, timestamp: f64) -> u64 {
        let Some(origin) = self.origin else {
            return 0;
        };
        let last = self.slot(origin, timestamp).max(self.next_slot);
        self.fill_until(last + 1)
    }

    /// Output slots written so far.
    pub fn frames_emitted(&self) -> u64 {
        self.next_slot
    }

    fn slot(&self, origin: f64, timestamp: f64) -> u64 {
        let elapsed = (timestamp - origin).max(0.0);
        (elapsed * self.fps).floor() as u64
    }

    fn fill_until(&mut self, slot: u64) -> u64 {
        if slot <= self.next_slot {
            return 0;
        }
        let copies = slot - self.next_slot;
        self.next_slot = slot;
        copies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_writes_nothing() {
        let mut pacer = FramePacer::new(30);
        assert_eq!(pacer.on_frame(1_700_000_000.0), 0);
        assert_eq!(pacer.frames_emitted(), 0);
    }

    #[test]
    fn test_gap_repeats_previous_frame() {
        let mut pacer = FramePacer::new(30);
        pacer.on_frame(10.0);
        // one second later: thirty slots held the first frame
        assert_eq!(pacer.on_frame(11.0), 30);
        assert_eq!(pacer.frames_emitted(), 30);
    }

    #[test]
    fn test_frames_within_one_slot_collapse() {
        let mut pacer = FramePacer::new(30);
        pacer.on_frame(0.0);
        assert_eq!(pacer.on_frame(0.01), 0);
        assert_eq!(pacer.on_frame(0.02), 0);
        assert_eq!(pacer.on_frame(0.04), 1);
    }

    #[test]
    fn test_out_of_order_frame_is_ignored() {
        let mut pacer = FramePacer::new(30);
        pacer.on_frame(5.0);
        pacer.on_frame(6.0);
        assert_eq!(pacer.on_frame(5.5), 0);
        assert_eq!(pacer.frames_emitted(), 30);
    }

    #[test]
    fn test_finish_fills_to_stop_time() {
        let mut pacer = FramePacer::new(30);
        pacer.on_frame(0.0);
        pacer.on_frame(1.0);
        // slots 30..=60 show the second frame
        assert_eq!(pacer.finish(2.0), 31);
        assert_eq!(pacer.frames_emitted(), 61);
    }

    #[test]
    fn test_static_page_still_produces_frames() {
        let mut pacer = FramePacer::new(30);
        pacer.on_frame(100.0);
        assert_eq!(pacer.finish(104.0), 121);
    }

    #[test]
    fn test_finish_without_frames() {
        let mut pacer = FramePacer::new(30);
        assert_eq!(pacer.finish(3.0), 0);
    }

    #[test]
    fn test_total_matches_duration() {
        let mut pacer = FramePacer::new(30);
        let mut total = 0;
        let mut t = 0.0;
        pacer.on_frame(t);
        while t < 3.0 {
            t += 0.137;
            total += pacer.on_frame(t);
        }
        total += pacer.finish(t);
        let expected = (t * 30.0).floor() as u64 + 1;
        assert_eq!(total, expected);
    }
}
