//! The stretch of track occupied by a train.
//!
//! A `Position` lists the edges under a train from front to back, each in the
//! direction of travel. The front is stored as the progress made from the
//! entry node of the front edge, the back as the distance the back still has
//! to travel to the exit node of the back edge. For a train of length `L`:
//!
//! * on a single edge of length `len`: `front + back - len == L`,
//! * on `k >= 2` edges: `front + back + (lengths of the k - 2 middle edges) == L`.
//!
//! All operations return a new `Position`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ordered_float::OrderedFloat;
use smallvec::SmallVec;

use crate::graph::{CoordinateAdapter, Coordinates, DirectedEdge, Edge, Node};
use crate::train::TrainParams;
use crate::{ReplayError, TOLERANCE};

pub type EdgeList = SmallVec<[DirectedEdge; 4]>;

#[derive(Clone, Debug)]
pub struct Position {
    length: f64,
    edges: EdgeList,
    front: f64,
    back: f64,
}

impl Position {
    /// Place a train on `edge` with its back at `entry`, heading for `exit`.
    pub fn init(train: &TrainParams, edge: &Arc<Edge>, entry: &Arc<Node>, exit: &Arc<Node>)
                -> Result<Position, ReplayError> {
        if !(train.length > 0.0) {
            return Err(ReplayError::InvalidArgument(
                    format!("train length must be positive, was {}", train.length)));
        }
        if entry == exit {
            return Err(ReplayError::InvalidArgument(
                    format!("entry and exit are the same node {}", entry.name)));
        }
        let directed = match DirectedEdge::from_entry(edge, entry) {
            Some(ref d) if d.exit() == exit => d.clone(),
            _ => return Err(ReplayError::InvalidArgument(
                    format!("nodes {} and {} are not the endpoints of edge {}",
                            entry.name, exit.name, edge.name))),
        };
        if train.length > edge.length {
            return Err(ReplayError::InvalidArgument(
                    format!("train of length {} does not fit on edge {} of length {}",
                            train.length, edge.name, edge.length)));
        }

        let mut edges = EdgeList::new();
        edges.push(directed);
        Ok(Position {
            length: train.length,
            edges,
            front: train.length,
            back: edge.length,
        })
    }

    pub fn front_edge(&self) -> &Arc<Edge> {
        &self.edges[0].edge
    }

    /// Progress of the front from the entry node of the front edge.
    pub fn front_distance(&self) -> f64 {
        self.front
    }

    pub fn back_edge(&self) -> &Arc<Edge> {
        &self.edges[self.edges.len() - 1].edge
    }

    /// Distance from the back to the exit node of the back edge.
    pub fn back_distance(&self) -> f64 {
        self.back
    }

    /// Distance from the front to the exit node of the front edge.
    pub fn front_remaining(&self) -> f64 {
        self.edges[0].length() - self.front
    }

    /// Occupied edges, front first.
    pub fn edges(&self) -> &[DirectedEdge] {
        &self.edges
    }

    pub fn train_length(&self) -> f64 {
        self.length
    }

    /// Length of track between the back and the front, measured along the
    /// occupied edges. Equal to the train length.
    pub fn span(&self) -> f64 {
        let n = self.edges.len();
        if n == 1 {
            self.front + self.back - self.edges[0].length()
        } else {
            let middle: f64 = self.edges[1..n - 1].iter().map(|e| e.length()).sum();
            self.front + self.back + middle
        }
    }

    /// Advance both ends by `delta` without crossing into another edge.
    pub fn move_by(&self, delta: f64) -> Result<Position, ReplayError> {
        if !(delta >= 0.0) {
            return Err(ReplayError::InvalidArgument(format!("cannot move by {}", delta)));
        }
        let room = self.room();
        if delta > room + TOLERANCE {
            return Err(ReplayError::IllegalState(
                    format!("moving {} crosses a node, the next one is {} ahead", delta, room)));
        }
        Ok(self.advance(delta.min(room)))
    }

    /// The front reaches the exit node of its edge and continues on `new_edge`.
    ///
    /// A front that is still short of the node is first brought up to it by
    /// moving the whole train.
    pub fn reach_front(&self, new_edge: &Arc<Edge>) -> Result<Position, ReplayError> {
        let remaining = self.front_remaining();
        if remaining > self.back + TOLERANCE {
            return Err(ReplayError::IllegalState(
                    format!("front cannot reach node {}, the back leaves edge {} first",
                            self.edges[0].exit().name, self.back_edge().name)));
        }
        self.advance(remaining).cross_front(new_edge)
    }

    /// The back leaves its edge; `new_back_edge` is the edge in front of it,
    /// and the train then moves on by `overflow`.
    pub fn leave_back(&self, new_back_edge: &Arc<Edge>, overflow: f64) -> Result<Position, ReplayError> {
        let n = self.edges.len();
        if n < 2 {
            return Err(ReplayError::IllegalState(
                    format!("back cannot leave edge {}, the front is on it", self.back_edge().name)));
        }
        if self.edges[n - 2].edge != *new_back_edge {
            return Err(ReplayError::InvalidArgument(
                    format!("edge {} does not follow back edge {}", new_back_edge.name, self.back_edge().name)));
        }
        if !(overflow >= 0.0) {
            return Err(ReplayError::InvalidArgument(format!("cannot move by {}", overflow)));
        }
        let remaining = self.back;
        if remaining > self.front_remaining() + TOLERANCE {
            return Err(ReplayError::IllegalState(
                    format!("back cannot leave edge {}, the front reaches node {} first",
                            self.back_edge().name, self.edges[0].exit().name)));
        }
        self.advance(remaining).drop_back().move_by(overflow)
    }

    /// Advance by `delta` for display between two recorded states.
    ///
    /// When the front hits a node it continues onto `lookahead`, or stops
    /// there if there is none. Rear edges are dropped as the back clears them.
    pub fn interpolation_move(&self, delta: f64, lookahead: Option<&Arc<Edge>>)
                              -> Result<Position, ReplayError> {
        if !(delta >= 0.0) {
            return Err(ReplayError::InvalidArgument(format!("cannot move by {}", delta)));
        }
        let mut lookahead = lookahead.filter(|e| *e != self.front_edge());
        let mut position = self.clone();
        let mut remaining = delta;
        loop {
            let step = remaining.min(position.room());
            position = position.advance(step);
            remaining -= step;
            if remaining <= TOLERANCE {
                break;
            }

            if position.back <= TOLERANCE && position.edges.len() > 1 {
                position = position.drop_back();
            } else if position.front_remaining() <= TOLERANCE {
                match lookahead.take() {
                    Some(edge) => position = position.cross_front(edge)?,
                    None => break,
                }
            } else {
                break;
            }
        }
        Ok(position)
    }

    /// Polyline from the front, through the nodes under the train, to the back.
    pub fn positions<A: CoordinateAdapter + ?Sized>(&self, adapter: &A) -> Vec<Coordinates> {
        let n = self.edges.len();
        let mut points = Vec::with_capacity(n + 1);
        points.push(adapter.project(&self.front_coordinates()));
        for edge in &self.edges[..n - 1] {
            points.push(adapter.project(&edge.entry().coordinates));
        }
        points.push(adapter.project(&self.back_coordinates()));
        points
    }

    pub fn front_coordinates(&self) -> Coordinates {
        self.edges[0].point_at(self.front)
    }

    pub fn back_coordinates(&self) -> Coordinates {
        let back_edge = &self.edges[self.edges.len() - 1];
        back_edge.point_at(back_edge.length() - self.back)
    }

    /// How far the train can move before one of its ends reaches a node.
    fn room(&self) -> f64 {
        self.front_remaining().min(self.back).max(0.0)
    }

    fn advance(&self, delta: f64) -> Position {
        Position {
            front: (self.front + delta).min(self.edges[0].length()),
            back: (self.back - delta).max(0.0),
            ..self.clone()
        }
    }

    // Front is at the exit node of its edge.
    fn cross_front(&self, new_edge: &Arc<Edge>) -> Result<Position, ReplayError> {
        let node = self.edges[0].exit();
        if new_edge == self.front_edge() {
            return Err(ReplayError::IllegalState(
                    format!("front cannot turn back onto edge {}", new_edge.name)));
        }
        let next = DirectedEdge::from_entry(new_edge, node).ok_or_else(|| ReplayError::IllegalState(
                format!("edge {} does not continue from node {}", new_edge.name, node.name)))?;

        let mut edges = EdgeList::new();
        edges.push(next);
        edges.extend(self.edges.iter().cloned());
        Ok(Position { edges, front: 0.0, ..self.clone() })
    }

    // Back is at the exit node of its edge.
    fn drop_back(&self) -> Position {
        let mut edges = self.edges.clone();
        edges.pop();
        let back = edges[edges.len() - 1].length();
        Position { edges, back, ..self.clone() }
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Position) -> bool {
        self.front == other.front && self.back == other.back && self.edges == other.edges
    }
}

impl Eq for Position {}

impl Hash for Position {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.edges.hash(state);
        OrderedFloat(self.front).hash(state);
        OrderedFloat(self.back).hash(state);
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let n = self.edges.len();
        write!(f, "[{}@{:.3}", self.edges[0].edge.name, self.front)?;
        for edge in &self.edges[1..] {
            write!(f, " {}", edge.edge.name)?;
        }
        if n == 1 {
            write!(f, " {}", self.edges[0].edge.name)?;
        }
        write!(f, "@{:.3}]", self.back)
    }
}
