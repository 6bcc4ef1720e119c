//! Block executor for deterministic offline rendering.

// Keep this path lean: no invariant logging inside the per-sample loops.

use crate::graph::{Graph, NodeKind};
use crate::plan::{Plan, PlanError};
use std::any::Any;
use thiserror::Error;

/// Per-node mutable runtime state.
pub(crate) enum NodeState {
    Stateless,
    SineOsc { phase: f32 },
    External { state: Box<dyn Any + Send> },
}

impl NodeState {
    pub(crate) fn for_kind(kind: &NodeKind, sample_rate: f32) -> Self {
        match kind {
            NodeKind::SineOsc { .. } => NodeState::SineOsc { phase: 0.0 },
            NodeKind::External { def } => NodeState::External {
                state: def.init_state(sample_rate),
            },
            _ => NodeState::Stateless,
        }
    }
}

/// Errors surfaced while rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The graph could not be compiled into a plan.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// A block larger than the configured block size was requested.
    #[error("block of {got} frames exceeds the configured block size {max}")]
    BlockTooLarge {
        /// Requested frame count.
        got: usize,
        /// Configured block size.
        max: usize,
    },
    /// An external node reported a processing failure.
    #[error("external node failed: {0}")]
    Node(&'static str),
}

/// Process one block: walk the plan order, sum each node's inputs, evaluate
/// gain parameters sample-accurately against the absolute clock, and copy the
/// sink input into `out`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn process_block(
    graph: &Graph,
    plan: &Plan,
    states: &mut [NodeState],
    node_buffers: &mut [Vec<f32>],
    scratch: &mut Vec<f32>,
    sample_rate: f32,
    start_time: f64,
    out: &mut [f32],
) -> Result<(), RenderError> {
    let frames = out.len();
    if frames > plan.block_size {
        return Err(RenderError::BlockTooLarge {
            got: frames,
            max: plan.block_size,
        });
    }
    out.fill(0.0);

    for &node_id in &plan.order {
        // Sum every connected source into the scratch input buffer.
        scratch.clear();
        scratch.resize(frames, 0.0);
        for &src in &plan.inputs[node_id.0] {
            for (acc, &sample) in scratch.iter_mut().zip(&node_buffers[src.0]) {
                *acc += sample;
            }
        }

        match &graph.nodes[node_id.0] {
            NodeKind::ConstantSource { value } => {
                node_buffers[node_id.0][..frames].fill(*value);
            }
            NodeKind::SineOsc { freq } => {
                if let NodeState::SineOsc { phase } = &mut states[node_id.0] {
                    for sample in node_buffers[node_id.0][..frames].iter_mut() {
                        *sample = phase.sin();
                        *phase += 2.0 * std::f32::consts::PI * freq / sample_rate;
                    }
                }
            }
            NodeKind::Gain { gain } => {
                let output = &mut node_buffers[node_id.0];
                for (i, (o, &input)) in output[..frames].iter_mut().zip(scratch.iter()).enumerate()
                {
                    let t = start_time + i as f64 / sample_rate as f64;
                    *o = input * gain.value_at(t);
                }
            }
            NodeKind::Sink => {
                out.copy_from_slice(&scratch[..frames]);
            }
            NodeKind::External { def } => {
                if let NodeState::External { state } = &mut states[node_id.0] {
                    let output = &mut node_buffers[node_id.0];
                    output[..frames].fill(0.0);
                    def.process_block(
                        state.as_mut(),
                        &scratch[..frames],
                        &mut output[..frames],
                        sample_rate,
                    )
                    .map_err(RenderError::Node)?;
                }
            }
        }
    }
    Ok(())
}
