//! One history sample per elapsed second, independent of the frame rate.

use gl_cube::renderer::{FpsTracker, RingBuffer};

const STEP: f64 = 0.125;
const PAST_BOUNDARY: f64 = 1.25;

/// Ticks `frames` frames in the interval starting at `start`: all but the last
/// inside the second, the last one just past it.
fn run_interval(tracker: &mut FpsTracker, start: f64, frames: u32) -> Option<u32> {
    assert!((1..=9).contains(&frames));
    for i in 0..frames - 1 {
        assert_eq!(tracker.tick(start + i as f64 * STEP), None);
    }
    tracker.tick(start + PAST_BOUNDARY)
}

#[test]
fn each_boundary_records_the_frames_of_its_interval() {
    let counts = [4, 7, 2, 9, 5];
    let mut tracker = FpsTracker::new(3);
    let mut start = 0.0;

    for (k, &frames) in counts.iter().enumerate() {
        assert_eq!(run_interval(&mut tracker, start, frames), Some(frames));
        start += PAST_BOUNDARY;

        let history = tracker.history();
        let total = k as u64 + 1;
        assert_eq!(history.total_count(), total);
        let slot = ((total - 1) % 3) as usize;
        assert_eq!(history.samples().get(slot), Some(&frames));
        assert_eq!(
            history.highest(),
            *counts[..=k].iter().max().unwrap()
        );
    }

    let oldest_first: Vec<u32> = tracker.history().samples().iter().copied().collect();
    assert_eq!(oldest_first, vec![2, 9, 5]);
    assert!(tracker.history().samples().has_wrapped());
}

#[test]
fn exactly_one_second_does_not_close_the_interval() {
    let mut tracker = FpsTracker::new(4);
    assert_eq!(tracker.tick(2.0), None);
    assert_eq!(tracker.tick(3.0), None);
    assert_eq!(tracker.pending_frames(), 2);

    assert_eq!(tracker.tick(3.125), Some(3));
    assert_eq!(tracker.pending_frames(), 0);
}

#[test]
fn slow_frames_still_produce_one_sample_per_boundary() {
    let mut tracker = FpsTracker::new(8);
    tracker.tick(0.0);
    // A single frame taking several seconds closes one interval, not three.
    assert_eq!(tracker.tick(3.5), Some(2));
    assert_eq!(tracker.history().total_count(), 1);
}

#[test]
fn ring_keeps_counting_after_it_wraps() {
    let mut ring = RingBuffer::<u32>::new(2);
    assert!(ring.is_empty());

    assert_eq!(ring.push(10), 0);
    assert_eq!(ring.push(20), 1);
    assert!(!ring.has_wrapped());
    assert_eq!(ring.push(30), 0);

    assert_eq!(ring.total_count(), 3);
    assert_eq!(ring.len(), 2);
    assert_eq!(ring.latest(), Some(&30));
    assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![20, 30]);
}
