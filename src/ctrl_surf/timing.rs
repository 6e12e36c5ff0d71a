use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

/// Shared timer service.
///
/// Callbacks run in sequence on the timer thread.
#[derive(Clone)]
pub struct Timers(Arc<Mutex<timer::Timer>>);

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}

impl Timers {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(timer::Timer::new())))
    }

    pub fn once<F>(&self, delay: Duration, cb: F) -> timer::Guard
    where
        F: FnMut() + Send + 'static,
    {
        self.0
            .lock()
            .unwrap()
            .schedule_with_delay(to_chrono(delay), cb)
    }

    pub fn repeating<F>(&self, period: Duration, cb: F) -> timer::Guard
    where
        F: FnMut() + Send + 'static,
    {
        self.0
            .lock()
            .unwrap()
            .schedule_repeating(to_chrono(period), cb)
    }
}

fn to_chrono(dur: Duration) -> chrono::Duration {
    chrono::Duration::from_std(dur).unwrap_or_else(|_| chrono::Duration::weeks(52))
}

/// At most one scheduled task per control.
///
/// Arming cancels the previous task. Cancelling a task which
/// already fired or was already cancelled is a no-op.
#[derive(Default)]
pub struct TimerSlot(Option<timer::Guard>);

impl TimerSlot {
    pub fn replace(&mut self, guard: timer::Guard) {
        // Dropping the previous guard cancels it.
        self.0 = Some(guard);
    }

    pub fn cancel(&mut self) {
        self.0 = None;
    }

    pub fn is_armed(&self) -> bool {
        self.0.is_some()
    }
}

impl std::fmt::Debug for TimerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TimerSlot").field(&self.is_armed()).finish()
    }
}

/// Press-and-hold and double-press logic shared by buttons and knobs.
#[derive(Debug, Default)]
pub struct PressTracker {
    hold: TimerSlot,
    last_release: Option<Instant>,
}

impl PressTracker {
    /// Arms the hold timer which calls `on_hold` unless cancelled in time.
    pub fn press<F>(&mut self, timers: &Timers, hold_duration: Duration, on_hold: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.hold.replace(timers.once(hold_duration, on_hold));
    }

    /// Returns `true` if this release completes a double press.
    pub fn release(&mut self, now: Instant, double_press_window: Duration) -> bool {
        self.hold.cancel();

        match self.last_release {
            Some(prev) if now.saturating_duration_since(prev) < double_press_window => {
                // Three quick releases make one double press, not two.
                self.last_release = None;
                true
            }
            _ => {
                self.last_release = Some(now);
                false
            }
        }
    }

    pub fn cancel_hold(&mut self) {
        self.hold.cancel();
    }

    pub fn is_hold_armed(&self) -> bool {
        self.hold.is_armed()
    }
}

const MIN_ELAPSED: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Increment,
    Decrement,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    /// Accumulated value after this rotation.
    pub value: i64,
    pub magnitude: u8,
    /// Ticks per second.
    pub velocity: f64,
    pub speed_range: u8,
}

/// Rotary encoder accumulation and velocity classification.
#[derive(Debug)]
pub struct Rotary {
    value: i64,
    last_rotation: Instant,
    thresholds: Arc<[f64]>,
}

impl Rotary {
    pub fn new(thresholds: Arc<[f64]>, now: Instant) -> Self {
        Self {
            value: 0,
            last_rotation: now,
            thresholds,
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn rotate(&mut self, direction: Direction, magnitude: u8, now: Instant) -> Rotation {
        let elapsed = now
            .saturating_duration_since(self.last_rotation)
            .max(MIN_ELAPSED);
        self.last_rotation = now;

        let velocity = magnitude as f64 / elapsed.as_secs_f64();

        match direction {
            Direction::Increment => self.value += magnitude as i64,
            Direction::Decrement => self.value -= magnitude as i64,
        }

        Rotation {
            value: self.value,
            magnitude,
            velocity,
            speed_range: speed_range(velocity, &self.thresholds),
        }
    }
}

/// `1 +` the number of thresholds exceeded by `velocity`.
pub fn speed_range(velocity: f64, thresholds: &[f64]) -> u8 {
    1 + thresholds.iter().filter(|&&t| velocity > t).count() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn speed_range_is_monotonic() {
        let thresholds = [20.0, 1000.0];
        assert_eq!(speed_range(5.0, &thresholds), 1);
        assert_eq!(speed_range(20.0, &thresholds), 1);
        assert_eq!(speed_range(25.0, &thresholds), 2);
        assert_eq!(speed_range(1500.0, &thresholds), 3);
        assert_eq!(speed_range(1500.0, &[]), 1);
    }

    #[test]
    fn rotary_accumulates_without_wrapping() {
        let start = Instant::now();
        let mut rotary = Rotary::new(Arc::from([20.0, 1000.0].as_slice()), start);

        let rot = rotary.rotate(Direction::Increment, 5, start + Duration::from_secs(1));
        assert_eq!(rot.value, 5);
        assert_eq!(rot.magnitude, 5);
        assert!((rot.velocity - 5.0).abs() < 1e-9);
        assert_eq!(rot.speed_range, 1);

        let rot = rotary.rotate(Direction::Decrement, 63, start + Duration::from_secs(2));
        assert_eq!(rot.value, -58);
        assert_eq!(rotary.value(), -58);
    }

    #[test]
    fn rotary_elapsed_floor() {
        let start = Instant::now();
        let mut rotary = Rotary::new(Arc::from([20.0, 1000.0].as_slice()), start);

        // Same instant: elapsed is floored to 1ms.
        let rot = rotary.rotate(Direction::Increment, 2, start);
        assert!((rot.velocity - 2000.0).abs() < 1e-6);
        assert_eq!(rot.speed_range, 3);

        let rot = rotary.rotate(Direction::Increment, 1, start + Duration::from_millis(40));
        assert!((rot.velocity - 25.0).abs() < 1e-6);
        assert_eq!(rot.speed_range, 2);
    }

    #[test]
    fn double_press_window() {
        let window = Duration::from_millis(500);
        let start = Instant::now();
        let mut tracker = PressTracker::default();

        assert!(!tracker.release(start, window));
        assert!(tracker.release(start + Duration::from_millis(400), window));
        // The reference was reset: a third quick release doesn't count.
        assert!(!tracker.release(start + Duration::from_millis(450), window));
        assert!(tracker.release(start + Duration::from_millis(600), window));
        // Too late.
        assert!(!tracker.release(start + Duration::from_millis(1200), window));
    }

    #[test]
    fn hold_fires_unless_released() {
        let timers = Timers::new();
        let held = Arc::new(AtomicUsize::new(0));
        let mut tracker = PressTracker::default();

        let held_cb = Arc::clone(&held);
        tracker.press(&timers, Duration::from_millis(50), move || {
            held_cb.fetch_add(1, Ordering::SeqCst);
        });
        assert!(tracker.is_hold_armed());
        tracker.release(Instant::now(), Duration::from_millis(500));
        assert!(!tracker.is_hold_armed());

        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(held.load(Ordering::SeqCst), 0);

        let held_cb = Arc::clone(&held);
        tracker.press(&timers, Duration::from_millis(50), move || {
            held_cb.fetch_add(1, Ordering::SeqCst);
        });
        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(held.load(Ordering::SeqCst), 1);

        // Cancelling after the fact is a no-op.
        tracker.cancel_hold();
        tracker.cancel_hold();
        assert_eq!(held.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rearming_replaces_pending_timer() {
        let timers = Timers::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::default();

        for _ in 0..3 {
            let fired = Arc::clone(&fired);
            slot.replace(timers.once(Duration::from_millis(50), move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }));
        }

        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
