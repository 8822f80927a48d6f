//! Scripted scrolling.
//!
//! The page is scrolled from Rust, one small script per tick, so the loop has
//! a termination condition the caller can see: the accumulated scroll
//! distance reaches the document's scroll height, or the optional time bound
//! runs out.

use std::time::Duration;

/// Default pixels scrolled per tick.
pub const DEFAULT_SCROLL_STEP_PX: f64 = 100.0;
/// Default interval between ticks.
pub const DEFAULT_SCROLL_TICK: Duration = Duration::from_millis(100);
/// Shortest tick the loop will run at.
pub const MIN_SCROLL_TICK: Duration = Duration::from_millis(1);

/// How far to scroll on each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollPlan {
    /// Scroll a fixed number of pixels every tick.
    Fixed { step_px: f64, tick: Duration },
    /// Spread the whole page over `duration`.
    Timed { duration: Duration, tick: Duration },
}

impl Default for ScrollPlan {
    fn default() -> Self {
        Self::fixed(DEFAULT_SCROLL_STEP_PX, DEFAULT_SCROLL_TICK)
    }
}

impl ScrollPlan {
    pub fn fixed(step_px: f64, tick: Duration) -> Self {
        Self::Fixed { step_px, tick }
    }

    pub fn timed(duration: Duration, tick: Duration) -> Self {
        Self::Timed { duration, tick }
    }

    /// Interval between ticks, never shorter than [`MIN_SCROLL_TICK`].
    pub fn tick(&self) -> Duration {
        match self {
            Self::Fixed { tick, .. } | Self::Timed { tick, .. } => (*tick).max(MIN_SCROLL_TICK),
        }
    }

    /// Pixels to scroll this tick for a document of `scroll_height`.
    pub fn step_for(&self, scroll_height: f64) -> f64 {
        match self {
            Self::Fixed { step_px, .. } if is_valid_step(*step_px) => *step_px,
            Self::Fixed { .. } => DEFAULT_SCROLL_STEP_PX,
            Self::Timed { duration, tick } => {
                let ticks = ticks_in(*duration, (*tick).max(MIN_SCROLL_TICK)).max(1);
                (scroll_height / ticks as f64).max(1.0)
            }
        }
    }
}

/// A step that moves the page forward: finite and positive.
pub fn is_valid_step(step_px: f64) -> bool {
    step_px.is_finite() && step_px > 0.0
}

/// Script run once per tick: scroll by the step, report the document height.
pub fn scroll_script(step_px: f64) -> String {
    format!(
        "(() => {{ window.scrollBy(0, {}); return document.body.scrollHeight; }})()",
        step_px
    )
}

/// Script reading the current document height without scrolling.
pub const SCROLL_HEIGHT_SCRIPT: &str = "document.body.scrollHeight";

/// Why the scroll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// Scroll distance reached the document height.
    ReachedBottom,
    /// The configured time bound ran out first.
    TimeLimit,
}

/// Running state of the scroll loop.
#[derive(Debug, Clone)]
pub struct ScrollState {
    plan: ScrollPlan,
    max_ticks: Option<u64>,
    distance: f64,
    ticks: u64,
}

impl ScrollState {
    pub fn new(plan: ScrollPlan, max_duration: Option<Duration>) -> Self {
        Self {
            plan,
            max_ticks: max_duration.map(|max| ticks_in(max, plan.tick())),
            distance: 0.0,
            ticks: 0,
        }
    }

    /// Step to scroll next, given the latest known document height.
    pub fn next_step(&self, scroll_height: f64) -> f64 {
        self.plan.step_for(scroll_height)
    }

    /// Record one tick that scrolled `step` on a document of `scroll_height`.
    ///
    /// Returns the outcome once the loop should stop.
    pub fn record(&mut self, step: f64, scroll_height: f64) -> Option<ScrollOutcome> {
        self.distance += step;
        self.ticks += 1;

        if self.distance >= scroll_height {
            return Some(ScrollOutcome::ReachedBottom);
        }
        match self.max_ticks {
            Some(max) if self.ticks >= max => Some(ScrollOutcome::TimeLimit),
            _ => None,
        }
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

fn ticks_in(duration: Duration, tick: Duration) -> u64 {
    if tick.is_zero() {
        return 0;
    }
    (duration.as_millis() / tick.as_millis().max(1)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_plan_stops_at_scroll_height() {
        let mut state = ScrollState::new(ScrollPlan::default(), None);
        let height = 2500.0;
        let mut outcome = None;
        while outcome.is_none() {
            let step = state.next_step(height);
            outcome = state.record(step, height);
        }
        assert_eq!(outcome, Some(ScrollOutcome::ReachedBottom));
        assert_eq!(state.ticks(), 25);
        assert!(state.distance() >= height);
    }

    #[test]
    fn test_short_page_stops_after_one_tick() {
        let mut state = ScrollState::new(ScrollPlan::default(), None);
        assert_eq!(state.record(100.0, 0.0), Some(ScrollOutcome::ReachedBottom));
    }

    #[test]
    fn test_growing_page_is_unbounded_without_limit() {
        let mut state = ScrollState::new(ScrollPlan::default(), None);
        // Height stays ahead of the scroll position, as on an infinite feed.
        for i in 0..10_000 {
            let height = 1080.0 + (i as f64 + 1.0) * 200.0;
            assert_eq!(state.record(100.0, height), None);
        }
    }

    #[test]
    fn test_max_duration_bounds_growing_page() {
        let tick = Duration::from_millis(100);
        let mut state =
            ScrollState::new(ScrollPlan::fixed(100.0, tick), Some(Duration::from_secs(2)));
        let mut outcome = None;
        let mut i = 0.0;
        while outcome.is_none() {
            i += 1.0;
            outcome = state.record(100.0, 1080.0 + i * 200.0);
        }
        assert_eq!(outcome, Some(ScrollOutcome::TimeLimit));
        assert_eq!(state.ticks(), 20);
    }

    #[test]
    fn test_timed_plan_spreads_height_over_duration() {
        let plan = ScrollPlan::timed(Duration::from_secs(5), Duration::from_millis(100));
        assert!((plan.step_for(10_000.0) - 200.0).abs() < f64::EPSILON);

        let mut state = ScrollState::new(plan, None);
        let mut outcome = None;
        while outcome.is_none() {
            let step = state.next_step(10_000.0);
            outcome = state.record(step, 10_000.0);
        }
        assert_eq!(state.ticks(), 50);
    }

    #[test]
    fn test_timed_plan_degenerate_duration() {
        let plan = ScrollPlan::timed(Duration::ZERO, Duration::from_millis(100));
        assert!((plan.step_for(3000.0) - 3000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scroll_script() {
        assert_eq!(
            scroll_script(100.0),
            "(() => { window.scrollBy(0, 100); return document.body.scrollHeight; })()"
        );
    }

    #[test]
    fn test_zero_tick_is_clamped() {
        let plan = ScrollPlan::fixed(100.0, Duration::ZERO);
        assert_eq!(plan.tick(), MIN_SCROLL_TICK);
        let timed = ScrollPlan::timed(Duration::from_secs(1), Duration::ZERO);
        assert_eq!(timed.tick(), MIN_SCROLL_TICK);
    }

    #[test]
    fn test_unusable_fixed_step_falls_back_to_default() {
        for step in [0.0, -50.0, f64::NAN, f64::INFINITY] {
            let plan = ScrollPlan::fixed(step, DEFAULT_SCROLL_TICK);
            assert_eq!(plan.step_for(1000.0), DEFAULT_SCROLL_STEP_PX, "step {}", step);
        }
    }

    #[test]
    fn test_zero_step_plan_still_reaches_bottom() {
        let mut state = ScrollState::new(ScrollPlan::fixed(0.0, Duration::ZERO), None);
        let mut outcome = None;
        for _ in 0..100 {
            let step = state.next_step(1000.0);
            outcome = state.record(step, 1000.0);
            if outcome.is_some() {
                break;
            }
        }
        assert_eq!(outcome, Some(ScrollOutcome::ReachedBottom));
        assert_eq!(state.ticks(), 10);
    }
}
