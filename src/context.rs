//! The audio context: node factory, sample clock, and offline renderer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use crate::graph::{Graph, GraphError, NodeId, NodeKind};
use crate::node::NodeDef;
use crate::param::AudioParam;
use crate::plan::Plan;
use crate::render::{self, NodeState, RenderError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default block size for offline rendering.
pub const DEFAULT_BLOCK_SIZE: usize = 64;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of an [`AudioContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

/// Handle to a node, stamped with the context that created it.
///
/// Handles are cheap to copy. Using a handle with a context other than the
/// one that created it fails with [`GraphError::ContextMismatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    context: ContextId,
    node: NodeId,
}

impl NodeHandle {
    /// The context this handle belongs to.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// The underlying graph node id.
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// The host side of the audio graph: owns the signal graph, per-node runtime
/// state, the sample clock, and a lazily compiled execution plan.
///
/// All rendering is offline and block-based. The clock advances only as
/// frames render; scheduling automation never blocks on it.
pub struct AudioContext {
    id: ContextId,
    graph: Graph,
    states: Vec<NodeState>,
    node_buffers: Vec<Vec<f32>>,
    scratch: Vec<f32>,
    /// Invalidated by every topology change, recompiled on demand.
    plan: Option<Plan>,
    destination: NodeHandle,
    sample_rate: f32,
    block_size: usize,
    frames_rendered: u64,
}

impl AudioContext {
    /// Create a context with the [`DEFAULT_BLOCK_SIZE`].
    pub fn new(sample_rate: f32) -> Self {
        Self::with_block_size(sample_rate, DEFAULT_BLOCK_SIZE)
    }

    /// Create a context rendering at most `block_size` frames per block.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is zero: rendering proceeds block by block, so
    /// an empty block could never make progress.
    pub fn with_block_size(sample_rate: f32, block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be at least one frame");
        let id = ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed));
        let mut ctx = Self {
            id,
            graph: Graph::new(),
            states: Vec::new(),
            node_buffers: Vec::new(),
            scratch: Vec::new(),
            plan: None,
            destination: NodeHandle {
                context: id,
                node: NodeId(0),
            },
            sample_rate,
            block_size,
            frames_rendered: 0,
        };
        ctx.destination = ctx.add_node(NodeKind::Sink);
        ctx
    }

    /// This context's unique id.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// The terminal sink every render reads from.
    pub fn destination(&self) -> NodeHandle {
        self.destination
    }

    /// Current clock position in seconds: frames rendered so far divided by
    /// the sample rate.
    pub fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    fn add_node(&mut self, kind: NodeKind) -> NodeHandle {
        self.states.push(NodeState::for_kind(&kind, self.sample_rate));
        self.node_buffers.push(vec![0.0; self.block_size]);
        let node = self.graph.add_node(kind);
        self.plan = None;
        NodeHandle {
            context: self.id,
            node,
        }
    }

    /// Add a constant-value source node.
    pub fn add_constant(&mut self, value: f32) -> NodeHandle {
        self.add_node(NodeKind::ConstantSource { value })
    }

    /// Add a sine oscillator node.
    pub fn add_sine(&mut self, freq: f32) -> NodeHandle {
        self.add_node(NodeKind::SineOsc { freq })
    }

    /// Add a gain node with the given initial gain.
    pub fn add_gain(&mut self, initial: f32) -> NodeHandle {
        self.add_node(NodeKind::Gain {
            gain: AudioParam::new(initial),
        })
    }

    /// Add an external node defined via [`NodeDef`].
    pub fn add_external<T: NodeDef>(&mut self, def: T) -> NodeHandle {
        self.add_node(NodeKind::External { def: Arc::new(def) })
    }

    fn check(&self, handle: NodeHandle) -> Result<NodeId, GraphError> {
        if handle.context != self.id {
            return Err(GraphError::ContextMismatch);
        }
        Ok(handle.node)
    }

    /// Connect `from` to `to`. The destination's input is the sum of all its
    /// connected sources.
    pub fn connect(&mut self, from: NodeHandle, to: NodeHandle) -> Result<(), GraphError> {
        let from = self.check(from)?;
        let to = self.check(to)?;
        self.graph.add_edge(from, to)?;
        self.plan = None;
        Ok(())
    }

    /// Remove the connection between `from` and `to`.
    pub fn disconnect(&mut self, from: NodeHandle, to: NodeHandle) -> Result<(), GraphError> {
        let from = self.check(from)?;
        let to = self.check(to)?;
        self.graph.remove_edge(from, to)?;
        self.plan = None;
        Ok(())
    }

    /// Remove every connection leaving `from`.
    pub fn disconnect_all(&mut self, from: NodeHandle) -> Result<(), GraphError> {
        let from = self.check(from)?;
        self.graph.remove_edges_from(from)?;
        self.plan = None;
        Ok(())
    }

    /// Immediately set a gain node's value, cancelling its automation.
    pub fn set_gain(&mut self, node: NodeHandle, value: f32) -> Result<(), GraphError> {
        let node = self.check(node)?;
        self.graph.gain_mut(node)?.set_value(value);
        Ok(())
    }

    /// Schedule an exponential approach on a gain node's parameter.
    ///
    /// Fire-and-forget: the ramp takes effect as frames render past
    /// `start_time`. Parameter changes never invalidate the compiled plan.
    pub fn set_target_at_time(
        &mut self,
        node: NodeHandle,
        target: f32,
        start_time: f64,
        time_constant: f64,
    ) -> Result<(), GraphError> {
        let node = self.check(node)?;
        self.graph
            .gain_mut(node)?
            .set_target_at_time(target, start_time, time_constant);
        Ok(())
    }

    /// Evaluate a gain node's parameter at an absolute time (test hook).
    pub fn gain_value_at(&self, node: NodeHandle, time: f64) -> Result<f32, GraphError> {
        let node = self.check(node)?;
        Ok(self.graph.gain(node)?.value_at(time))
    }

    /// Process one block of at most the configured block size, advancing the
    /// clock by `out.len()` frames.
    pub fn process_block(&mut self, out: &mut [f32]) -> Result<(), RenderError> {
        if self.plan.is_none() {
            self.plan = Some(Plan::compile(&self.graph, self.block_size)?);
        }
        let start_time = self.frames_rendered as f64 / self.sample_rate as f64;
        if let Some(plan) = &self.plan {
            render::process_block(
                &self.graph,
                plan,
                &mut self.states,
                &mut self.node_buffers,
                &mut self.scratch,
                self.sample_rate,
                start_time,
                out,
            )?;
        }
        self.frames_rendered += out.len() as u64;
        Ok(())
    }

    /// Render `frames` frames offline, chunked by the block size. The final
    /// block may be partial.
    pub fn render(&mut self, frames: usize) -> Result<Vec<f32>, RenderError> {
        let mut output = vec![0.0; frames];
        let mut offset = 0;
        while offset < frames {
            let end = (offset + self.block_size).min(frames);
            self.process_block(&mut output[offset..end])?;
            offset = end;
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_advances_with_rendering() {
        let mut ctx = AudioContext::with_block_size(1000.0, 32);
        assert_eq!(ctx.current_time(), 0.0);
        ctx.render(100).unwrap();
        assert!((ctx.current_time() - 0.1).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "block size must be at least one frame")]
    fn zero_block_size_is_rejected() {
        AudioContext::with_block_size(1000.0, 0);
    }

    #[test]
    fn smallest_block_size_still_renders() {
        let mut ctx = AudioContext::with_block_size(1000.0, 1);
        let src = ctx.add_constant(0.5);
        let dest = ctx.destination();
        ctx.connect(src, dest).unwrap();
        let out = ctx.render(3).unwrap();
        assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let mut a = AudioContext::new(48_000.0);
        let mut b = AudioContext::new(48_000.0);
        let src = a.add_constant(1.0);
        let dest = b.destination();
        assert_eq!(b.connect(src, dest), Err(GraphError::ContextMismatch));
        assert_eq!(b.set_gain(src, 0.5), Err(GraphError::ContextMismatch));
    }

    #[test]
    fn constant_reaches_destination() {
        let mut ctx = AudioContext::with_block_size(1000.0, 16);
        let src = ctx.add_constant(0.25);
        let dest = ctx.destination();
        ctx.connect(src, dest).unwrap();
        let out = ctx.render(20).unwrap();
        assert!(out.iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn disconnected_graph_renders_silence() {
        let mut ctx = AudioContext::new(48_000.0);
        let _src = ctx.add_constant(1.0);
        let out = ctx.render(64).unwrap();
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn topology_change_after_render_takes_effect() {
        let mut ctx = AudioContext::with_block_size(1000.0, 16);
        let src = ctx.add_constant(1.0);
        let dest = ctx.destination();
        ctx.connect(src, dest).unwrap();
        let first = ctx.render(16).unwrap();
        assert!(first.iter().all(|&s| (s - 1.0).abs() < 1e-6));

        ctx.disconnect(src, dest).unwrap();
        let second = ctx.render(16).unwrap();
        assert!(second.iter().all(|&s| s == 0.0));
    }
}
