//! sidestep: click-free bypass switching for deterministic audio graphs.
//!
//! The crate is built around one component, [`BypassSwitch`]: a composite
//! node that routes its input either straight to its output (bypass path) or
//! through a caller-supplied sub-graph (processing path), crossfading between
//! the two states with exponential time-constant ramps so toggling never
//! clicks.
//!
//! The switch runs inside a minimal offline host, [`AudioContext`]: a signal
//! graph of summing connections, automatable gain parameters, and a
//! deterministic block renderer with a sample clock.
//!
//! ```
//! use sidestep::{AudioContext, BypassSwitch, BypassSwitchOptions};
//!
//! let mut ctx = AudioContext::new(48_000.0);
//! let source = ctx.add_constant(1.0);
//! let mut switch = BypassSwitch::new(&mut ctx, BypassSwitchOptions::default()).unwrap();
//!
//! // Splice a processing chain between the switch's two sub-graph ports.
//! let effect = ctx.add_gain(0.5);
//! ctx.connect(source, switch.input()).unwrap();
//! ctx.connect(switch.sub_graph_input(), effect).unwrap();
//! ctx.connect(effect, switch.sub_graph_output()).unwrap();
//! let dest = ctx.destination();
//! switch.connect(&mut ctx, dest).unwrap();
//!
//! // Inactive: the signal flows through the sub-graph.
//! let rendered = ctx.render(64).unwrap();
//! assert!((rendered[0] - 0.5).abs() < 1e-6);
//!
//! // Active: the signal bypasses it, ramping over ~10 ms.
//! switch.set_active(&mut ctx, true).unwrap();
//! assert!(switch.active());
//! ```

pub mod context;
pub mod graph;
#[doc(hidden)]
pub mod invariant_ppt;
pub mod node;
pub mod param;
pub mod plan;
pub mod render;
pub mod switch;

pub use context::{AudioContext, ContextId, NodeHandle, DEFAULT_BLOCK_SIZE};
pub use graph::GraphError;
pub use node::NodeDef;
pub use param::AudioParam;
pub use render::RenderError;
pub use switch::{BypassSwitch, BypassSwitchOptions, SMOOTHING_TIME_CONSTANT};
