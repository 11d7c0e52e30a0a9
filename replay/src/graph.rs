//! Track graph: nodes with coordinates and edges of fixed length.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::ReplayError;

pub type NodeId = usize;
pub type EdgeId = usize;

pub type NameMap = HashMap<String, usize>;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub fn new(x: f64, y: f64) -> Coordinates {
        Coordinates { x, y }
    }

    /// The point `fraction` of the way from `self` to `other`.
    pub fn lerp(&self, other: &Coordinates, fraction: f64) -> Coordinates {
        Coordinates {
            x: self.x + (other.x - self.x) * fraction,
            y: self.y + (other.y - self.y) * fraction,
        }
    }
}

#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub coordinates: Coordinates,
}

#[derive(Debug)]
pub struct Edge {
    pub id: EdgeId,
    pub name: String,
    pub length: f64,
    pub node_a: Arc<Node>,
    pub node_b: Arc<Node>,
}

// Nodes and edges are identified by their id.

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool { self.id == other.id }
}
impl Eq for Node {}
impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) { self.id.hash(state) }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Edge) -> bool { self.id == other.id }
}
impl Eq for Edge {}
impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) { self.id.hash(state) }
}

impl Edge {
    pub fn has_node(&self, node: &Node) -> bool {
        *self.node_a == *node || *self.node_b == *node
    }

    /// The endpoint opposite to `node`, if `node` is an endpoint.
    pub fn other_node(&self, node: &Node) -> Option<&Arc<Node>> {
        if *self.node_a == *node {
            Some(&self.node_b)
        } else if *self.node_b == *node {
            Some(&self.node_a)
        } else {
            None
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    AToB,
    BToA,
}

/// An edge together with the direction a train travels along it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DirectedEdge {
    pub edge: Arc<Edge>,
    pub direction: Direction,
}

impl DirectedEdge {
    /// Travel along `edge` starting from `entry`.
    pub fn from_entry(edge: &Arc<Edge>, entry: &Node) -> Option<DirectedEdge> {
        let direction = if *edge.node_a == *entry {
            Direction::AToB
        } else if *edge.node_b == *entry {
            Direction::BToA
        } else {
            return None;
        };
        Some(DirectedEdge { edge: edge.clone(), direction })
    }

    pub fn entry(&self) -> &Arc<Node> {
        match self.direction {
            Direction::AToB => &self.edge.node_a,
            Direction::BToA => &self.edge.node_b,
        }
    }

    pub fn exit(&self) -> &Arc<Node> {
        match self.direction {
            Direction::AToB => &self.edge.node_b,
            Direction::BToA => &self.edge.node_a,
        }
    }

    pub fn length(&self) -> f64 {
        self.edge.length
    }

    /// Coordinates of the point `progress` along the edge from its entry node.
    pub fn point_at(&self, progress: f64) -> Coordinates {
        let fraction = if self.edge.length > 0.0 { progress / self.edge.length } else { 0.0 };
        self.entry().coordinates.lerp(&self.exit().coordinates, fraction)
    }
}

/// Maps graph coordinates into the coordinate system of a consumer (a
/// canvas, a map projection, ...).
pub trait CoordinateAdapter {
    fn project(&self, c: &Coordinates) -> Coordinates;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct IdentityAdapter;

impl CoordinateAdapter for IdentityAdapter {
    fn project(&self, c: &Coordinates) -> Coordinates {
        *c
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ScaleAdapter {
    pub scale: f64,
    pub offset: Coordinates,
}

impl CoordinateAdapter for ScaleAdapter {
    fn project(&self, c: &Coordinates) -> Coordinates {
        Coordinates {
            x: c.x * self.scale + self.offset.x,
            y: c.y * self.scale + self.offset.y,
        }
    }
}

#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Arc<Node>>,
    edges: Vec<Arc<Edge>>,
    node_names: NameMap,
    edge_names: NameMap,
}

impl Graph {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_node(&mut self, name: &str, coordinates: Coordinates) -> Result<Arc<Node>, ReplayError> {
        if self.node_names.contains_key(name) {
            return Err(ReplayError::InvalidArgument(format!("node {} is already defined", name)));
        }
        let id = self.nodes.len();
        let node = Arc::new(Node { id, name: name.to_string(), coordinates });
        self.nodes.push(node.clone());
        self.node_names.insert(name.to_string(), id);
        Ok(node)
    }

    pub fn add_edge(&mut self, name: &str, a: &str, b: &str, length: f64) -> Result<Arc<Edge>, ReplayError> {
        if self.edge_names.contains_key(name) {
            return Err(ReplayError::InvalidArgument(format!("edge {} is already defined", name)));
        }
        if !(length > 0.0) || !length.is_finite() {
            return Err(ReplayError::InvalidArgument(format!("edge {} has invalid length {}", name, length)));
        }
        let lookup = |n: &str| self.node(n).cloned()
            .ok_or_else(|| ReplayError::InvalidArgument(format!("unknown node {}", n)));
        let (node_a, node_b) = (lookup(a)?, lookup(b)?);
        if node_a == node_b {
            return Err(ReplayError::InvalidArgument(format!("edge {} starts and ends in node {}", name, a)));
        }

        let id = self.edges.len();
        let edge = Arc::new(Edge { id, name: name.to_string(), length, node_a, node_b });
        self.edges.push(edge.clone());
        self.edge_names.insert(name.to_string(), id);
        Ok(edge)
    }

    pub fn node(&self, name: &str) -> Option<&Arc<Node>> {
        self.node_names.get(name).map(|&id| &self.nodes[id])
    }

    pub fn edge(&self, name: &str) -> Option<&Arc<Edge>> {
        self.edge_names.get(name).map(|&id| &self.edges[id])
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Arc<Edge>] {
        &self.edges
    }
}
