//! The event log of one train.
//!
//! A `Timeline` accepts the events read from a simulation log, checks them
//! against the state of the train, and records for each accepted event an
//! `Event` and the `Snapshot` it leads to. Contract violations (moving a train
//! that was never placed, crossing a node that was not announced, ...) are
//! returned as errors and leave the timeline untouched. Anomalies in the data
//! itself -- times running backwards, events after termination -- are
//! absorbed and recorded as warnings on the event.
//!
//! The `distance` argument of every event is the distance travelled since
//! the previous event.

use std::fmt;
use std::sync::Arc;

use crate::graph::{Edge, Node};
use crate::position::Position;
use crate::snapshot::{Condition, Snapshot};
use crate::train::{TrainName, TrainParams};
use crate::{ReplayError, Time, TOLERANCE};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Init,
    Speed,
    Move,
    Reach,
    Leave,
    Terminate,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    /// Time given in the log.
    pub requested_time: Time,
    /// Time the event was recorded at. Never earlier than the previous event.
    pub time: Time,
    pub description: String,
    pub warnings: Vec<String>,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {:?} {}", self.time, self.kind, self.description)
    }
}

#[derive(Debug)]
pub struct Timeline {
    train: TrainName,
    params: TrainParams,
    events: Vec<Event>,
    snapshots: Vec<Snapshot>,
}

impl Timeline {
    pub fn new(train: TrainName, params: TrainParams) -> Timeline {
        Timeline {
            snapshots: vec![Snapshot::initial(train.clone())],
            events: Vec::new(),
            train,
            params,
        }
    }

    pub fn train(&self) -> &TrainName { &self.train }
    pub fn params(&self) -> &TrainParams { &self.params }
    pub fn events(&self) -> &[Event] { &self.events }

    /// Recorded states, ordered by time. The first one is the
    /// uninitialized state at `INIT_STATE_TIME`, the one at index `i + 1`
    /// is the result of event `i`.
    pub fn snapshots(&self) -> &[Snapshot] { &self.snapshots }

    pub fn last(&self) -> &Snapshot {
        &self.snapshots[self.snapshots.len() - 1]
    }

    /// Place the train on `edge`, entering at `node_a` and heading for `node_b`.
    pub fn init(&mut self, time: Time, edge: &Arc<Edge>) -> Result<&Event, ReplayError> {
        self.init_towards(time, edge, &edge.node_b)
    }

    /// Place the train on `edge`, heading for `exit`.
    pub fn init_towards(&mut self, time: Time, edge: &Arc<Edge>, exit: &Arc<Node>)
                        -> Result<&Event, ReplayError> {
        if self.last().is_initialized() {
            return Err(ReplayError::IllegalState(format!("train {} is already initialized", self.train)));
        }
        let entry = edge.other_node(exit).ok_or_else(|| ReplayError::InvalidArgument(
                format!("node {} is not an endpoint of edge {}", exit.name, edge.name)))?;
        let position = Position::init(&self.params, edge, entry, exit)?;

        let mut warnings = Vec::new();
        let recorded = self.recorded_time(time, &mut warnings);
        let snapshot = self.last().successor(recorded, 0.0, 0.0, Condition::Running(position));
        let description = format!("enter {} towards {}", edge.name, exit.name);
        Ok(self.push(EventKind::Init, time, description, warnings, snapshot))
    }

    /// Move by `distance` and change to `speed`.
    pub fn speed(&mut self, time: Time, distance: f64, speed: f64) -> Result<&Event, ReplayError> {
        let description = format!("speed {} after {}", speed, distance);
        self.advance(EventKind::Speed, time, distance, Some(speed), description)
    }

    /// Move by `distance`, keeping the speed.
    pub fn move_by(&mut self, time: Time, distance: f64) -> Result<&Event, ReplayError> {
        let description = format!("move {}", distance);
        self.advance(EventKind::Move, time, distance, None, description)
    }

    /// Move by `distance` and stop recording the train.
    pub fn terminate(&mut self, time: Time, distance: f64) -> Result<&Event, ReplayError> {
        let description = format!("terminate after {}", distance);
        self.advance(EventKind::Terminate, time, distance, None, description)
    }

    /// The front reaches the end of its edge and enters `edge`.
    pub fn reach(&mut self, time: Time, edge: &Arc<Edge>, distance: f64) -> Result<&Event, ReplayError> {
        let description = format!("front enters {} after {}", edge.name, distance);
        let position = match self.movable(EventKind::Reach)? {
            Some(p) => p,
            None => return Ok(self.freeze(EventKind::Reach, time, description)),
        };

        let mut warnings = Vec::new();
        let distance = non_negative("distance", distance, &mut warnings);
        let to_node = position.front_remaining();
        let overflow = overflow(distance, to_node, &mut warnings);
        let position = position.reach_front(edge)?.move_by(overflow)?;
        self.record_move(EventKind::Reach, time, to_node + overflow, None, position, warnings, description)
    }

    /// The back of the train leaves `edge`.
    pub fn leave(&mut self, time: Time, edge: &Arc<Edge>, distance: f64) -> Result<&Event, ReplayError> {
        let description = format!("back leaves {} after {}", edge.name, distance);
        let position = match self.movable(EventKind::Leave)? {
            Some(p) => p,
            None => return Ok(self.freeze(EventKind::Leave, time, description)),
        };
        if position.back_edge() != edge {
            return Err(ReplayError::InvalidArgument(
                    format!("back of train {} is on edge {}, not {}",
                            self.train, position.back_edge().name, edge.name)));
        }
        let n = position.edges().len();
        if n < 2 {
            return Err(ReplayError::IllegalState(
                    format!("train {} occupies only edge {}", self.train, edge.name)));
        }
        let new_back = position.edges()[n - 2].edge.clone();

        let mut warnings = Vec::new();
        let distance = non_negative("distance", distance, &mut warnings);
        let to_node = position.back_distance();
        let overflow = overflow(distance, to_node, &mut warnings);
        let position = position.leave_back(&new_back, overflow)?;
        self.record_move(EventKind::Leave, time, to_node + overflow, None, position, warnings, description)
    }

    fn advance(&mut self, kind: EventKind, time: Time, distance: f64, speed: Option<f64>,
               description: String) -> Result<&Event, ReplayError> {
        let position = match self.movable(kind)? {
            Some(p) => p,
            None => return Ok(self.freeze(kind, time, description)),
        };

        let mut warnings = Vec::new();
        let distance = non_negative("distance", distance, &mut warnings);
        let speed = speed.map(|v| non_negative("speed", v, &mut warnings));
        let position = position.move_by(distance)?;
        self.record_move(kind, time, distance, speed, position, warnings, description)
    }

    /// Position of a train that events may move, or `None` for a terminated train.
    fn movable(&self, kind: EventKind) -> Result<Option<Position>, ReplayError> {
        match *self.last().condition() {
            Condition::Uninitialized => Err(ReplayError::IllegalState(
                    format!("{:?} event before train {} is initialized", kind, self.train))),
            Condition::Running(ref p) => Ok(Some(p.clone())),
            Condition::Terminated(_) => Ok(None),
        }
    }

    fn record_move(&mut self, kind: EventKind, time: Time, distance: f64, speed: Option<f64>,
                   position: Position, mut warnings: Vec<String>, description: String)
                   -> Result<&Event, ReplayError> {
        let recorded = self.recorded_time(time, &mut warnings);
        let snapshot = {
            let last = self.last();
            let condition = if kind == EventKind::Terminate {
                Condition::Terminated(position)
            } else {
                Condition::Running(position)
            };
            last.successor(recorded, speed.unwrap_or(last.speed()),
                           last.total_distance() + distance, condition)
        };
        Ok(self.push(kind, time, description, warnings, snapshot))
    }

    /// Record an event on a terminated train without changing its state.
    fn freeze(&mut self, kind: EventKind, time: Time, description: String) -> &Event {
        let mut warnings = vec![format!("train {} has already terminated", self.train)];
        let recorded = self.recorded_time(time, &mut warnings);
        let snapshot = {
            let last = self.last();
            last.successor(recorded, last.speed(), last.total_distance(), last.condition().clone())
        };
        self.push(kind, time, description, warnings, snapshot)
    }

    fn recorded_time(&self, time: Time, warnings: &mut Vec<String>) -> Time {
        if time < 0 {
            warnings.push(format!("negative time {}", time));
        }
        let previous = self.last().time();
        if time < previous {
            warnings.push(format!("time {} is before the previous event at {}", time, previous));
            previous
        } else {
            time
        }
    }

    fn push(&mut self, kind: EventKind, requested_time: Time, description: String,
            warnings: Vec<String>, snapshot: Snapshot) -> &Event {
        for w in &warnings {
            warn!("Train {}: {:?} at {}: {}", self.train, kind, requested_time, w);
        }
        debug!("Train {}: {:?} {} -> {}", self.train, kind, description, snapshot);

        self.events.push(Event {
            kind,
            requested_time,
            time: snapshot.time(),
            description,
            warnings,
        });
        self.snapshots.push(snapshot);
        &self.events[self.events.len() - 1]
    }
}

fn non_negative(what: &str, value: f64, warnings: &mut Vec<String>) -> f64 {
    if value >= 0.0 && value.is_finite() {
        value
    } else {
        warnings.push(format!("invalid {} {} taken as 0", what, value));
        0.0
    }
}

/// Distance left after reaching a node `to_node` ahead.
fn overflow(distance: f64, to_node: f64, warnings: &mut Vec<String>) -> f64 {
    if distance < to_node - TOLERANCE {
        warnings.push(format!("distance {} does not reach the node {} ahead", distance, to_node));
    }
    (distance - to_node).max(0.0)
}
