//! Frame-rate bookkeeping: one history sample per elapsed second.

/// Fixed-capacity ring. The write cursor is `total_count % capacity`, so
/// `total_count` keeps counting after the ring wraps.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    total_count: u64,
}

impl<T: Clone + Default> RingBuffer<T> {
    /// A zero capacity is bumped to one slot.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![T::default(); capacity.max(1)],
            total_count: 0,
        }
    }
}

impl<T> RingBuffer<T> {
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Number of slots holding a written value.
    pub fn len(&self) -> usize {
        (self.total_count as usize).min(self.capacity())
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    pub fn has_wrapped(&self) -> bool {
        self.total_count > self.capacity() as u64
    }

    /// Stores `value` and returns the slot it landed in.
    pub fn push(&mut self, value: T) -> usize {
        self.total_count += 1;
        let index = ((self.total_count - 1) % self.capacity() as u64) as usize;
        self.slots[index] = value;
        index
    }

    /// Raw slot access, indexed like the underlying array.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len() {
            self.slots.get(index)
        } else {
            None
        }
    }

    pub fn latest(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        let index = ((self.total_count - 1) % self.capacity() as u64) as usize;
        self.slots.get(index)
    }

    /// Written values, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let start = if self.has_wrapped() {
            (self.total_count % self.capacity() as u64) as usize
        } else {
            0
        };
        let len = self.len();
        (0..len).map(move |offset| &self.slots[(start + offset) % self.capacity()])
    }
}

/// Frames-per-second samples plus the highest one seen.
#[derive(Debug, Clone)]
pub struct FpsHistory {
    samples: RingBuffer<u32>,
    highest: u32,
}

impl FpsHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: RingBuffer::new(capacity),
            highest: 0,
        }
    }

    pub fn record(&mut self, frames: u32) -> usize {
        self.highest = self.highest.max(frames);
        self.samples.push(frames)
    }

    pub fn samples(&self) -> &RingBuffer<u32> {
        &self.samples
    }

    pub fn total_count(&self) -> u64 {
        self.samples.total_count()
    }

    pub fn highest(&self) -> u32 {
        self.highest
    }

    pub fn latest(&self) -> Option<u32> {
        self.samples.latest().copied()
    }
}

/// Counts frames and folds them into an [`FpsHistory`] once more than a
/// second has passed since the last sample boundary.
#[derive(Debug, Clone)]
pub struct FpsTracker {
    history: FpsHistory,
    frames: u32,
    boundary: Option<f64>,
}

impl FpsTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: FpsHistory::new(capacity),
            frames: 0,
            boundary: None,
        }
    }

    /// Registers one rendered frame at `now` seconds. Returns the sample
    /// written when this frame closed an interval.
    pub fn tick(&mut self, now: f64) -> Option<u32> {
        let boundary = *self.boundary.get_or_insert(now);
        self.frames += 1;

        if now - boundary > 1.0 {
            self.boundary = Some(now);
            let frames = std::mem::take(&mut self.frames);
            self.history.record(frames);
            log::debug!("fps sample {frames} (peak {})", self.history.highest());
            return Some(frames);
        }

        None
    }

    pub fn history(&self) -> &FpsHistory {
        &self.history
    }

    /// Frames counted in the interval that is still open.
    pub fn pending_frames(&self) -> u32 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_wraps_and_keeps_counting() {
        let mut ring = RingBuffer::<u32>::new(3);
        assert!(ring.is_empty());
        assert_eq!(ring.push(10), 0);
        assert_eq!(ring.push(20), 1);
        assert_eq!(ring.push(30), 2);
        assert!(!ring.has_wrapped());
        assert_eq!(ring.push(40), 0);

        assert!(ring.has_wrapped());
        assert_eq!(ring.total_count(), 4);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.get(0), Some(&40));
        assert_eq!(ring.latest(), Some(&40));
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![20, 30, 40]);
    }

    #[test]
    fn unwritten_slots_are_not_readable() {
        let mut ring = RingBuffer::<u32>::new(4);
        ring.push(7);
        assert_eq!(ring.get(0), Some(&7));
        assert_eq!(ring.get(1), None);
        assert_eq!(ring.iter().count(), 1);
    }

    #[test]
    fn zero_capacity_holds_one_sample() {
        let mut ring = RingBuffer::<u32>::new(0);
        ring.push(1);
        ring.push(2);
        assert_eq!(ring.capacity(), 1);
        assert_eq!(ring.latest(), Some(&2));
    }

    #[test]
    fn tracker_waits_for_more_than_a_second() {
        let mut tracker = FpsTracker::new(8);
        assert_eq!(tracker.tick(0.0), None);
        assert_eq!(tracker.tick(0.5), None);
        // Exactly one second does not close the interval.
        assert_eq!(tracker.tick(1.0), None);
        assert_eq!(tracker.tick(1.25), Some(4));
        assert_eq!(tracker.pending_frames(), 0);
        assert_eq!(tracker.history().total_count(), 1);
    }

    #[test]
    fn highest_tracks_the_largest_interval() {
        let mut history = FpsHistory::new(2);
        history.record(30);
        history.record(60);
        history.record(45);
        assert_eq!(history.highest(), 60);
        assert_eq!(history.latest(), Some(45));
    }
}
