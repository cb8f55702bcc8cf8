/// Counts ticks over a fixed horizon.
///
/// # Examples
///
/// ```
/// use ev_station_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(3);
/// let mut ticks = Vec::new();
///
/// while let Some(tick) = clock.tick() {
///     ticks.push(tick);
/// }
/// assert_eq!(ticks, vec![0, 1, 2]);
/// assert!(clock.is_finished());
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    current: usize,
    total: usize,
}

impl Clock {
    /// Creates a clock that yields `total` ticks.
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    /// Returns the next tick index, or `None` once the horizon is reached.
    pub fn tick(&mut self) -> Option<usize> {
        if self.current < self.total {
            let tick = self.current;
            self.current += 1;
            Some(tick)
        } else {
            None
        }
    }

    /// Ticks not yet handed out.
    pub fn remaining(&self) -> usize {
        self.total - self.current
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.total
    }
}
