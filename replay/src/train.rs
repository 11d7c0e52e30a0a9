//! Trains and state queries at arbitrary times.

use std::sync::Arc;

use crate::snapshot::Snapshot;
use crate::timeline::Timeline;
use crate::{ReplayError, Time};

/// Trains are identified by name.
pub type TrainName = Arc<str>;

#[derive(Clone, Debug, PartialEq)]
pub struct TrainParams {
    pub length: f64,
    pub color: String,
}

#[derive(Debug)]
pub struct Train {
    timeline: Timeline,
}

impl Train {
    pub fn new(name: &str, params: TrainParams) -> Result<Train, ReplayError> {
        if !(params.length > 0.0) || !params.length.is_finite() {
            return Err(ReplayError::InvalidArgument(
                    format!("train {} has invalid length {}", name, params.length)));
        }
        Ok(Train { timeline: Timeline::new(Arc::from(name), params) })
    }

    pub fn name(&self) -> &str { self.timeline.train() }
    pub fn params(&self) -> &TrainParams { self.timeline.params() }
    pub fn length(&self) -> f64 { self.params().length }
    pub fn color(&self) -> &str { &self.params().color }

    pub fn timeline(&self) -> &Timeline { &self.timeline }

    /// Events from the log are recorded through the timeline.
    pub fn timeline_mut(&mut self) -> &mut Timeline { &mut self.timeline }

    /// State of the train at `time`.
    ///
    /// Recorded states are returned as they are, times between two recorded
    /// states are interpolated, and times after the last recorded state give
    /// the last state.
    pub fn get_state(&self, time: Time) -> Result<Snapshot, ReplayError> {
        let upper = self.timeline.snapshots().partition_point(|s| s.time() <= time);
        self.state_at(time, upper)
    }

    /// Same as `get_state`, searching from `hint`, typically the state
    /// returned by the previous query.
    pub fn get_state_from(&self, time: Time, hint: &Snapshot) -> Result<Snapshot, ReplayError> {
        if hint.train() != self.name() {
            return Err(ReplayError::InvalidArgument(
                    format!("state of train {} given as hint for train {}", hint.train(), self.name())));
        }
        let snapshots = self.timeline.snapshots();
        match snapshots.get(hint.index()) {
            Some(stored) if stored == hint => {
                let upper = gallop(snapshots, hint.index(), time);
                self.state_at(time, upper)
            }
            _ => {
                trace!("Hint #{} for train {} is not a recorded state", hint.index(), self.name());
                self.get_state(time)
            }
        }
    }

    // `upper` is the number of recorded states at or before `time`.
    fn state_at(&self, time: Time, upper: usize) -> Result<Snapshot, ReplayError> {
        let snapshots = self.timeline.snapshots();
        if upper == 0 {
            return Err(ReplayError::InvalidArgument(
                    format!("time {} is before the first state of train {} at {}",
                            time, self.name(), snapshots[0].time())));
        }
        let lower = &snapshots[upper - 1];
        if lower.time() == time || upper == snapshots.len() {
            return Ok(lower.clone());
        }
        lower.interpolate(time, &snapshots[upper])
    }
}

/// Number of snapshots at or before `time`, found by exponential search
/// outwards from `start`.
fn gallop(snapshots: &[Snapshot], start: usize, time: Time) -> usize {
    let (mut lo, mut hi);
    let mut step = 1;
    if snapshots[start].time() <= time {
        // Everything before `lo` is at or before `time`.
        lo = start + 1;
        hi = lo;
        while hi < snapshots.len() && snapshots[hi].time() <= time {
            lo = hi + 1;
            hi = lo + step;
            step *= 2;
        }
        hi = hi.min(snapshots.len());
    } else {
        // Everything from `hi` on is after `time`.
        hi = start;
        lo = hi;
        while lo > 0 && snapshots[lo - 1].time() > time {
            hi = lo - 1;
            lo = hi.saturating_sub(step);
            step *= 2;
        }
    }
    lo + snapshots[lo..hi].partition_point(|s| s.time() <= time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Coordinates, Graph};
    use crate::snapshot::Condition;
    use crate::INIT_STATE_TIME;

    fn graph() -> Graph {
        let mut g = Graph::new();
        g.add_node("a", Coordinates::new(0.0, 0.0)).unwrap();
        g.add_node("b", Coordinates::new(50.0, 0.0)).unwrap();
        g.add_node("c", Coordinates::new(50.0, 50.0)).unwrap();
        g.add_edge("e1", "a", "b", 50.0).unwrap();
        g.add_edge("e2", "b", "c", 50.0).unwrap();
        g
    }

    fn train(name: &str) -> Train {
        Train::new(name, TrainParams { length: 10.0, color: "red".to_string() }).unwrap()
    }

    // One event per second, moving 1.0 each time.
    fn busy_train(g: &Graph, events: usize) -> Train {
        let mut t = train("t1");
        t.timeline_mut().init(0, g.edge("e1").unwrap()).unwrap();
        for i in 1..events {
            t.timeline_mut().move_by(i as Time * 1_000, 1.0).unwrap();
        }
        t
    }

    #[test]
    fn test_new_rejects_bad_length() {
        assert!(Train::new("t", TrainParams { length: 0.0, color: "red".to_string() }).is_err());
        assert!(Train::new("t", TrainParams { length: std::f64::NAN, color: "red".to_string() }).is_err());
    }

    #[test]
    fn test_speed_interpolation() {
        let mut g = Graph::new();
        g.add_node("a", Coordinates::new(0.0, 0.0)).unwrap();
        g.add_node("b", Coordinates::new(50.0, 0.0)).unwrap();
        g.add_edge("e", "a", "b", 50.0).unwrap();

        let mut t = train("t1");
        t.timeline_mut().init(0, g.edge("e").unwrap()).unwrap();
        t.timeline_mut().speed(20_000, 5.0, 0.0).unwrap();
        let s = t.get_state(12_000).unwrap();
        assert_abs_diff_eq!(s.speed(), 0.25, epsilon = 0.01);
        assert_abs_diff_eq!(s.total_distance(), 3.0, epsilon = 1e-9);
        assert_eq!(t.get_state(20_000).unwrap().speed(), 0.0);
    }

    #[test]
    fn test_exact_and_sticky_states() {
        let g = graph();
        let t = busy_train(&g, 5);
        for s in t.timeline().snapshots() {
            assert_eq!(&t.get_state(s.time()).unwrap(), s);
        }
        assert_eq!(&t.get_state(1_000_000).unwrap(), t.timeline().last());
    }

    #[test]
    fn test_before_first_state() {
        let g = graph();
        let t = busy_train(&g, 3);
        assert!(!t.get_state(INIT_STATE_TIME).unwrap().is_initialized());
        match t.get_state(INIT_STATE_TIME - 1) {
            Err(ReplayError::InvalidArgument(_)) => {},
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn test_before_init_event() {
        let g = graph();
        let mut t = train("t1");
        t.timeline_mut().init(5_000, g.edge("e1").unwrap()).unwrap();
        let s = t.get_state(2_000).unwrap();
        assert!(!s.is_initialized());
        assert_eq!(s.time(), 2_000);
    }

    #[test]
    fn test_interpolated_state() {
        let g = graph();
        let t = busy_train(&g, 5);
        let s = t.get_state(2_500).unwrap();
        assert_eq!(s.index(), 3);
        assert_abs_diff_eq!(s.total_distance(), 2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(s.speed(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.position().unwrap().front_distance(), 12.5, epsilon = 1e-9);
    }

    #[test]
    fn test_equal_times_give_latest() {
        let g = graph();
        let mut t = train("t1");
        t.timeline_mut().init(0, g.edge("e1").unwrap()).unwrap();
        t.timeline_mut().move_by(1_000, 1.0).unwrap();
        t.timeline_mut().move_by(1_000, 2.0).unwrap();
        t.timeline_mut().move_by(2_000, 2.0).unwrap();
        assert_eq!(t.get_state(1_000).unwrap().total_distance(), 3.0);
        assert_abs_diff_eq!(t.get_state(1_500).unwrap().total_distance(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_terminated_speed_is_steady() {
        let g = graph();
        let mut t = train("t1");
        {
            let tl = t.timeline_mut();
            tl.init(0, g.edge("e1").unwrap()).unwrap();
            tl.speed(1_000, 1.0, 5.0).unwrap();
            tl.terminate(2_000, 1.0).unwrap();
            tl.move_by(3_000, 0.0).unwrap();
            tl.move_by(4_000, 0.0).unwrap();
        }
        for &time in &[2_000, 2_500, 3_000, 3_500, 4_000, 9_000] {
            let s = t.get_state(time).unwrap();
            assert!(s.is_terminated(), "at {}", time);
            assert_eq!(s.speed(), 5.0, "at {}", time);
            assert_eq!(s.total_distance(), 2.0, "at {}", time);
        }
    }

    #[test]
    fn test_hinted_search_agrees() {
        let g = graph();
        let t = busy_train(&g, 40);
        let snapshots = t.timeline().snapshots();
        for hint in snapshots {
            for &time in &[INIT_STATE_TIME, 0, 1, 999, 1_000, 7_250, 20_000, 33_001, 39_000, 90_000] {
                assert_eq!(t.get_state_from(time, hint).unwrap(), t.get_state(time).unwrap());
            }
        }
        assert!(t.get_state_from(INIT_STATE_TIME - 1, &snapshots[20]).is_err());
    }

    #[test]
    fn test_hint_from_other_train() {
        let g = graph();
        let t = busy_train(&g, 3);
        let other = train("t2");
        match t.get_state_from(1_000, other.timeline().last()) {
            Err(ReplayError::InvalidArgument(_)) => {},
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn test_foreign_hint_falls_back() {
        let g = graph();
        let t = busy_train(&g, 10);
        let interpolated = t.get_state(4_500).unwrap();
        assert_eq!(t.get_state_from(8_200, &interpolated).unwrap(), t.get_state(8_200).unwrap());

        let made_up = Snapshot::new(Arc::from("t1"), 99, 3_000, 0.0, 0.0, Condition::Uninitialized).unwrap();
        assert_eq!(t.get_state_from(2_200, &made_up).unwrap(), t.get_state(2_200).unwrap());
    }

    #[test]
    fn test_gallop() {
        let g = graph();
        let t = busy_train(&g, 17);
        let snapshots = t.timeline().snapshots();
        for start in 0..snapshots.len() {
            for time in (-2_000..18_000).step_by(250) {
                let expected = snapshots.partition_point(|s| s.time() <= time);
                assert_eq!(gallop(snapshots, start, time), expected, "start {} time {}", start, time);
            }
        }
    }
}
