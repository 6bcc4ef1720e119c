//! Signal graph: correct-by-construction node/edge topology.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use crate::invariant_ppt::{assert_invariant, GRAPH_LEGALITY, GRAPH_REJECTS_INVALID};
use crate::node::NodeDefDyn;
use crate::param::AudioParam;
use std::sync::Arc;
use thiserror::Error;

/// Unique identifier for a node within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A directed connection between two nodes.
///
/// Connections follow the summed-input model: a node may feed any number of
/// destinations, and a node's input is the sample-wise sum of every source
/// connected to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Source node.
    pub from: NodeId,
    /// Destination node.
    pub to: NodeId,
}

/// Types of nodes in the audio graph.
#[non_exhaustive]
#[derive(Clone)]
pub enum NodeKind {
    /// Source emitting a constant sample value.
    ConstantSource {
        /// Emitted value.
        value: f32,
    },
    /// Sine wave oscillator.
    SineOsc {
        /// Frequency in Hz.
        freq: f32,
    },
    /// Multiplies its summed input by an automatable scalar.
    Gain {
        /// The gain parameter (1.0 = unity).
        gain: AudioParam,
    },
    /// Terminal node; the renderer copies its summed input to the output.
    Sink,
    /// External node implemented via the [`NodeDef`](crate::node::NodeDef)
    /// trait.
    External {
        /// The node definition.
        def: Arc<dyn NodeDefDyn>,
    },
}

impl std::fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::ConstantSource { value } => write!(f, "ConstantSource({})", value),
            NodeKind::SineOsc { freq } => write!(f, "SineOsc({} Hz)", freq),
            NodeKind::Gain { .. } => write!(f, "Gain"),
            NodeKind::Sink => write!(f, "Sink"),
            NodeKind::External { .. } => write!(f, "External"),
        }
    }
}

/// Errors raised while building or mutating the graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// Node does not exist in this graph.
    #[error("node does not exist in this graph")]
    InvalidNode,
    /// Adding the edge would create a cycle.
    #[error("connection would create a cycle")]
    CycleDetected,
    /// The two nodes are already connected.
    #[error("nodes are already connected")]
    AlreadyConnected,
    /// The two nodes are not connected.
    #[error("nodes are not connected")]
    NotConnected,
    /// A sink cannot be used as a connection source.
    #[error("sink nodes have no output to connect")]
    SinkHasNoOutput,
    /// A node handle was used with a context that did not create it.
    #[error("node handle belongs to a different context")]
    ContextMismatch,
    /// The node has no automatable parameter.
    #[error("node has no gain parameter")]
    NoSuchParam,
}

/// The signal graph: a DAG of nodes and summing edges.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// All nodes in the graph, indexed by [`NodeId`].
    pub nodes: Vec<NodeKind>,
    /// All edges connecting nodes.
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(kind);
        id
    }

    /// Add an edge, validating both endpoints and acyclicity.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        let from_kind = self.nodes.get(from.0).ok_or(GraphError::InvalidNode)?;
        if to.0 >= self.nodes.len() {
            return Err(GraphError::InvalidNode);
        }
        if matches!(from_kind, NodeKind::Sink) {
            return Err(GraphError::SinkHasNoOutput);
        }
        if self.edges.iter().any(|e| e.from == from && e.to == to) {
            return Err(GraphError::AlreadyConnected);
        }
        if self.would_create_cycle(from, to) {
            assert_invariant(
                GRAPH_REJECTS_INVALID,
                true,
                "cycle detected, rejecting",
                Some("add_edge"),
            );
            return Err(GraphError::CycleDetected);
        }

        self.edges.push(Edge { from, to });
        assert_invariant(
            GRAPH_LEGALITY,
            true,
            "edge added, graph remains a legal DAG",
            Some("add_edge"),
        );
        Ok(())
    }

    /// Remove the edge between two nodes.
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        if from.0 >= self.nodes.len() || to.0 >= self.nodes.len() {
            return Err(GraphError::InvalidNode);
        }
        let before = self.edges.len();
        self.edges.retain(|e| !(e.from == from && e.to == to));
        if self.edges.len() == before {
            return Err(GraphError::NotConnected);
        }
        Ok(())
    }

    /// Remove every edge leaving `from`. Not an error if there are none.
    pub fn remove_edges_from(&mut self, from: NodeId) -> Result<(), GraphError> {
        if from.0 >= self.nodes.len() {
            return Err(GraphError::InvalidNode);
        }
        self.edges.retain(|e| e.from != from);
        Ok(())
    }

    /// Borrow the gain parameter of a [`NodeKind::Gain`] node.
    pub fn gain(&self, id: NodeId) -> Result<&AudioParam, GraphError> {
        match self.nodes.get(id.0) {
            None => Err(GraphError::InvalidNode),
            Some(NodeKind::Gain { gain }) => Ok(gain),
            Some(_) => Err(GraphError::NoSuchParam),
        }
    }

    /// Mutably borrow the gain parameter of a [`NodeKind::Gain`] node.
    pub fn gain_mut(&mut self, id: NodeId) -> Result<&mut AudioParam, GraphError> {
        match self.nodes.get_mut(id.0) {
            None => Err(GraphError::InvalidNode),
            Some(NodeKind::Gain { gain }) => Ok(gain),
            Some(_) => Err(GraphError::NoSuchParam),
        }
    }

    fn would_create_cycle(&self, from: NodeId, to: NodeId) -> bool {
        // The new edge closes a cycle iff `to` can already reach `from`.
        let mut visited = vec![false; self.nodes.len()];
        self.reaches(to, from, &mut visited)
    }

    fn reaches(&self, current: NodeId, target: NodeId, visited: &mut [bool]) -> bool {
        if current == target {
            return true;
        }
        if visited[current.0] {
            return false;
        }
        visited[current.0] = true;
        for edge in &self.edges {
            if edge.from == current && self.reaches(edge.to, target, visited) {
                return true;
            }
        }
        false
    }
}
