//! Click-free switching between a bypass path and a processing sub-graph.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use crate::context::{AudioContext, ContextId, NodeHandle};
use crate::graph::GraphError;
use crate::invariant_ppt::{assert_invariant, GAINS_COMPLEMENTARY, SWITCH_TOPOLOGY};

/// Smoothing time constant for bypass transitions, in seconds.
///
/// Roughly 10 ms: long enough that toggling never clicks, short enough to
/// feel instantaneous.
pub const SMOOTHING_TIME_CONSTANT: f64 = 0.01;

/// Construction options for [`BypassSwitch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BypassSwitchOptions {
    /// Initial state; `true` routes the signal around the sub-graph.
    /// Defaults to `false`.
    pub active: bool,
}

/// Complementary gain targets derived from the one logical flag.
///
/// Both levels come from a single place so the pair can never drift out of
/// complement: they always sum to one.
fn gain_targets(active: bool) -> (f32, f32) {
    if active {
        (1.0, 0.0)
    } else {
        (0.0, 1.0)
    }
}

/// A composite node that routes its input either straight to its output
/// (active: bypass path) or through an externally supplied sub-graph
/// (inactive: processing path), crossfading between the two on toggle.
///
/// Topology after construction:
///
/// ```text
/// input ──┬── bypass gain ─────────────────────────────┐
///         └── sub-graph input gain   ··· sub-graph ··· ─┴── output gain
/// ```
///
/// The bypass path is fully pre-wired. The dotted section is the caller's:
/// splice a processing chain from [`sub_graph_input`](Self::sub_graph_input)
/// and terminate it at [`sub_graph_output`](Self::sub_graph_output). Nothing
/// is auto-connected between those two ports, and the sub-graph stays owned
/// by the caller.
///
/// The switch owns four gain stages created at construction and never
/// recreated; toggling only mutates parameter automation on two of them.
pub struct BypassSwitch {
    context: ContextId,
    input: NodeHandle,
    bypass_gain: NodeHandle,
    sub_graph_input: NodeHandle,
    output: NodeHandle,
    active: bool,
}

impl BypassSwitch {
    /// Create a switch inside `ctx` and pre-wire its bypass path.
    pub fn new(ctx: &mut AudioContext, options: BypassSwitchOptions) -> Result<Self, GraphError> {
        let active = options.active;
        let (bypass_level, chain_level) = gain_targets(active);

        let input = ctx.add_gain(1.0);
        let bypass_gain = ctx.add_gain(bypass_level);
        let sub_graph_input = ctx.add_gain(chain_level);
        let output = ctx.add_gain(1.0);

        ctx.connect(input, bypass_gain)?;
        ctx.connect(input, sub_graph_input)?;
        ctx.connect(bypass_gain, output)?;
        assert_invariant(
            SWITCH_TOPOLOGY,
            true,
            "bypass path pre-wired: input -> bypass gain -> output",
            Some("BypassSwitch::new"),
        );

        Ok(Self {
            context: ctx.id(),
            input,
            bypass_gain,
            sub_graph_input,
            output,
            active,
        })
    }

    /// The id of the context this switch was created in.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Current logical state. Reflects the most recent
    /// [`set_active`](Self::set_active) immediately, even while the signal
    /// transition is still ramping.
    pub fn active(&self) -> bool {
        self.active
    }

    /// Upstream port: connect your source into this.
    pub fn input(&self) -> NodeHandle {
        self.input
    }

    /// Sub-graph entry port: connect this into your processing chain.
    pub fn sub_graph_input(&self) -> NodeHandle {
        self.sub_graph_input
    }

    /// Sub-graph exit port: terminate your processing chain here. This is the
    /// switch's output stage itself.
    pub fn sub_graph_output(&self) -> NodeHandle {
        self.output
    }

    /// Toggle between bypassing (`true`) and processing (`false`), ramping
    /// both internal gains toward complementary targets with
    /// [`SMOOTHING_TIME_CONSTANT`] starting at the context's current time.
    ///
    /// The two ramps are scheduled back to back at the same start time; the
    /// host serializes automation on each parameter in scheduling order.
    /// Re-toggling before a ramp settles reschedules from the current
    /// mid-transition value. Whether pathological toggle timing can still
    /// produce an audible artifact is unverified; no extra guard exists
    /// beyond the time-constant approach itself.
    ///
    /// Fails with [`GraphError::ContextMismatch`] (leaving the state
    /// unchanged) if `ctx` is not the context the switch was created in.
    pub fn set_active(&mut self, ctx: &mut AudioContext, active: bool) -> Result<(), GraphError> {
        if ctx.id() != self.context {
            return Err(GraphError::ContextMismatch);
        }
        self.active = active;

        let (bypass_level, chain_level) = gain_targets(active);
        let now = ctx.current_time();
        ctx.set_target_at_time(self.bypass_gain, bypass_level, now, SMOOTHING_TIME_CONSTANT)?;
        ctx.set_target_at_time(
            self.sub_graph_input,
            chain_level,
            now,
            SMOOTHING_TIME_CONSTANT,
        )?;
        assert_invariant(
            GAINS_COMPLEMENTARY,
            (bypass_level + chain_level - 1.0).abs() < f32::EPSILON,
            "bypass and sub-graph gain targets sum to one",
            Some("set_active"),
        );
        Ok(())
    }

    /// Connect the switch's output to a downstream node. Pure delegation to
    /// the output stage; underlying errors propagate unchanged.
    pub fn connect(&self, ctx: &mut AudioContext, destination: NodeHandle) -> Result<(), GraphError> {
        ctx.connect(self.output, destination)
    }

    /// Disconnect the switch's output from a downstream node.
    pub fn disconnect(
        &self,
        ctx: &mut AudioContext,
        destination: NodeHandle,
    ) -> Result<(), GraphError> {
        ctx.disconnect(self.output, destination)
    }

    /// Disconnect the switch's output from everything downstream.
    pub fn disconnect_all(&self, ctx: &mut AudioContext) -> Result<(), GraphError> {
        ctx.disconnect_all(self.output)
    }
}
