//! Recorded train states and interpolation between them.

use std::fmt;
use std::sync::Arc;

use crate::graph::Edge;
use crate::position::Position;
use crate::train::TrainName;
use crate::{ReplayError, Time, INIT_STATE_TIME, MILLIS_PER_SECOND};

#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Uninitialized,
    Running(Position),
    Terminated(Position),
}

/// The state of one train at one point in time.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    train: TrainName,
    index: usize,
    time: Time,
    speed: f64,
    total_distance: f64,
    condition: Condition,
}

impl Snapshot {
    pub fn new(train: TrainName, index: usize, time: Time, speed: f64, total_distance: f64,
               condition: Condition) -> Result<Snapshot, ReplayError> {
        if !(speed >= 0.0) || !speed.is_finite() {
            return Err(ReplayError::InvalidArgument(format!("invalid speed {}", speed)));
        }
        if !(total_distance >= 0.0) || !total_distance.is_finite() {
            return Err(ReplayError::InvalidArgument(format!("invalid distance {}", total_distance)));
        }
        Ok(Snapshot { train, index, time, speed, total_distance, condition })
    }

    /// The state every train starts out in.
    pub fn initial(train: TrainName) -> Snapshot {
        Snapshot {
            train,
            index: 0,
            time: INIT_STATE_TIME,
            speed: 0.0,
            total_distance: 0.0,
            condition: Condition::Uninitialized,
        }
    }

    pub(crate) fn successor(&self, time: Time, speed: f64, total_distance: f64,
                            condition: Condition) -> Snapshot {
        Snapshot {
            train: self.train.clone(),
            index: self.index + 1,
            time,
            speed,
            total_distance,
            condition,
        }
    }

    pub fn train(&self) -> &str { &self.train }
    /// Index of the recorded snapshot this state is, or follows.
    pub fn index(&self) -> usize { self.index }
    pub fn time(&self) -> Time { self.time }
    /// Speed in distance units per second.
    pub fn speed(&self) -> f64 { self.speed }
    pub fn total_distance(&self) -> f64 { self.total_distance }
    pub fn condition(&self) -> &Condition { &self.condition }

    pub fn position(&self) -> Option<&Position> {
        match self.condition {
            Condition::Uninitialized => None,
            Condition::Running(ref p) | Condition::Terminated(ref p) => Some(p),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.position().is_some()
    }

    pub fn is_terminated(&self) -> bool {
        match self.condition {
            Condition::Terminated(_) => true,
            _ => false,
        }
    }

    /// State at `time`, which must lie between the times of `self` and
    /// `other`. Gives the same result whichever of the two it is called on.
    ///
    /// Distance and position advance linearly over the interval, and the
    /// speed is the rate of that advance.
    pub fn interpolate(&self, time: Time, other: &Snapshot) -> Result<Snapshot, ReplayError> {
        if self.train != other.train {
            return Err(ReplayError::InvalidArgument(
                    format!("cannot interpolate between trains {} and {}", self.train, other.train)));
        }
        let (lo, hi) = if (self.time, self.index) <= (other.time, other.index) {
            (self, other)
        } else {
            (other, self)
        };
        if time < lo.time || time > hi.time {
            return Err(ReplayError::InvalidArgument(
                    format!("time {} is outside of [{}, {}]", time, lo.time, hi.time)));
        }

        let from = match lo.position() {
            Some(p) => p,
            None => return Ok(Snapshot {
                time,
                condition: Condition::Uninitialized,
                ..lo.clone()
            }),
        };

        // Log times may lie anywhere in the `Time` range.
        let duration = hi.time as f64 - lo.time as f64;
        let distance = (hi.total_distance - lo.total_distance).max(0.0);
        let (advance, speed) = if lo.is_terminated() {
            (0.0, lo.speed)
        } else if duration > 0.0 {
            let fraction = (time as f64 - lo.time as f64) / duration;
            (distance * fraction, distance / duration * MILLIS_PER_SECOND)
        } else {
            (0.0, lo.speed)
        };

        let lookahead = hi.position().and_then(|to| lookahead(from, to));
        let position = from.interpolation_move(advance, lookahead)?;
        let condition = if lo.is_terminated() || (time == hi.time && hi.is_terminated()) {
            Condition::Terminated(position)
        } else {
            Condition::Running(position)
        };

        Ok(Snapshot {
            train: lo.train.clone(),
            index: lo.index,
            time,
            speed,
            total_distance: lo.total_distance + advance,
            condition,
        })
    }
}

/// The edge `to` has directly in front of the front edge of `from`.
fn lookahead<'a>(from: &Position, to: &'a Position) -> Option<&'a Arc<Edge>> {
    let front = from.front_edge();
    match to.edges().iter().position(|e| e.edge == *front) {
        Some(i) if i > 0 => Some(&to.edges()[i - 1].edge),
        _ => None,
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{} t={} v={:.3} x={:.3}", self.index, self.time, self.speed, self.total_distance)?;
        match self.condition {
            Condition::Uninitialized => write!(f, " uninitialized"),
            Condition::Running(ref p) => write!(f, " {}", p),
            Condition::Terminated(ref p) => write!(f, " {} terminated", p),
        }
    }
}
