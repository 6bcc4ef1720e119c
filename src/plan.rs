//! Plan module: compile the graph into a deterministic execution order.

use crate::graph::{Graph, NodeId};
use crate::invariant_ppt::{assert_invariant, PLAN_SOUNDNESS};
use thiserror::Error;

/// The compiled plan: execution order and per-node fan-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Topological execution order covering every node.
    pub order: Vec<NodeId>,
    /// For each node, the source nodes summed into its input.
    pub inputs: Vec<Vec<NodeId>>,
    /// Largest block the renderer processes at a time.
    pub block_size: usize,
}

/// Errors during plan compilation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The graph contains a cycle.
    #[error("graph contains a cycle")]
    CycleDetected,
}

impl Plan {
    /// Compile a plan from a graph. Deterministic: identical graphs yield
    /// identical plans.
    pub fn compile(graph: &Graph, block_size: usize) -> Result<Self, PlanError> {
        let order = topo_sort(graph)?;
        let mut inputs = vec![Vec::new(); graph.nodes.len()];
        for edge in &graph.edges {
            inputs[edge.to.0].push(edge.from);
        }
        assert_invariant(
            PLAN_SOUNDNESS,
            order.len() == graph.nodes.len(),
            "execution order covers every node exactly once",
            Some("compile"),
        );
        Ok(Self {
            order,
            inputs,
            block_size,
        })
    }
}

/// Kahn topological sort; ties broken by node id for determinism.
fn topo_sort(graph: &Graph) -> Result<Vec<NodeId>, PlanError> {
    let mut in_degree = vec![0usize; graph.nodes.len()];
    let mut adj: Vec<Vec<NodeId>> = vec![Vec::new(); graph.nodes.len()];

    for edge in &graph.edges {
        adj[edge.from.0].push(edge.to);
        in_degree[edge.to.0] += 1;
    }

    let mut queue = std::collections::VecDeque::new();
    for (i, &deg) in in_degree.iter().enumerate() {
        if deg == 0 {
            queue.push_back(NodeId(i));
        }
    }

    let mut order = Vec::with_capacity(graph.nodes.len());
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &neighbor in &adj[node.0] {
            in_degree[neighbor.0] -= 1;
            if in_degree[neighbor.0] == 0 {
                queue.push_back(neighbor);
            }
        }
    }

    if order.len() == graph.nodes.len() {
        Ok(order)
    } else {
        Err(PlanError::CycleDetected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, NodeKind};
    use crate::param::AudioParam;

    #[test]
    fn plan_respects_edges() {
        let mut graph = Graph::new();
        let src = graph.add_node(NodeKind::ConstantSource { value: 1.0 });
        let gain = graph.add_node(NodeKind::Gain {
            gain: AudioParam::new(0.5),
        });
        let sink = graph.add_node(NodeKind::Sink);
        graph.add_edge(src, gain).unwrap();
        graph.add_edge(gain, sink).unwrap();

        let plan = Plan::compile(&graph, 64).unwrap();
        let pos = |id: NodeId| plan.order.iter().position(|&n| n == id).unwrap();
        assert!(pos(src) < pos(gain));
        assert!(pos(gain) < pos(sink));
        assert_eq!(plan.inputs[sink.0], vec![gain]);
    }

    #[test]
    fn plan_stability() {
        let mut graph = Graph::new();
        let src = graph.add_node(NodeKind::ConstantSource { value: 1.0 });
        let sink = graph.add_node(NodeKind::Sink);
        graph.add_edge(src, sink).unwrap();

        let plan1 = Plan::compile(&graph, 64).unwrap();
        let plan2 = Plan::compile(&graph, 64).unwrap();
        assert_eq!(plan1, plan2);
    }

    #[test]
    fn plan_detects_cycle_in_raw_edges() {
        // The public graph API rejects cycles at add_edge time, so force one
        // through the raw edge list.
        let mut graph = Graph::new();
        let a = graph.add_node(NodeKind::Gain {
            gain: AudioParam::new(1.0),
        });
        let b = graph.add_node(NodeKind::Gain {
            gain: AudioParam::new(1.0),
        });
        graph.edges.push(Edge { from: a, to: b });
        graph.edges.push(Edge { from: b, to: a });
        assert_eq!(Plan::compile(&graph, 64), Err(PlanError::CycleDetected));
    }
}
