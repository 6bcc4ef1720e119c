//! Trait-based node definitions for external DSP nodes.

#![forbid(unsafe_code)]

use std::any::Any;

/// Object-safe node definition for external nodes.
pub trait NodeDefDyn: Send + Sync {
    fn init_state(&self, sample_rate: f32) -> Box<dyn Any + Send>;
    fn process_block(
        &self,
        state: &mut dyn Any,
        input: &[f32],
        output: &mut [f32],
        sample_rate: f32,
    ) -> Result<(), &'static str>;
}

/// Generic node definition; implement this for your DSP nodes.
///
/// External nodes are single-input single-output: `input` carries the
/// sample-wise sum of every connected source for the current block, and
/// `output` is zero-filled before the call.
pub trait NodeDef: Send + Sync + 'static {
    type State: Send + 'static;
    fn init_state(&self, sample_rate: f32) -> Self::State;
    fn process_block(
        &self,
        state: &mut Self::State,
        input: &[f32],
        output: &mut [f32],
        sample_rate: f32,
    ) -> Result<(), &'static str>;
}

impl<T: NodeDef> NodeDefDyn for T {
    fn init_state(&self, sample_rate: f32) -> Box<dyn Any + Send> {
        Box::new(<T as NodeDef>::init_state(self, sample_rate))
    }

    fn process_block(
        &self,
        state: &mut dyn Any,
        input: &[f32],
        output: &mut [f32],
        sample_rate: f32,
    ) -> Result<(), &'static str> {
        // Downcast to concrete state; a mismatch indicates a wiring bug in
        // runtime state initialization.
        if let Some(typed) = state.downcast_mut::<<T as NodeDef>::State>() {
            <T as NodeDef>::process_block(self, typed, input, output, sample_rate)
        } else {
            Err("state type mismatch in external node process_block")
        }
    }
}
