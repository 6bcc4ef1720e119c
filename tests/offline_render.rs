//! Offline rendering: determinism, chunking, clock, failure surfacing.

use sidestep::{AudioContext, NodeDef, RenderError};

fn sine_rig() -> AudioContext {
    let mut ctx = AudioContext::with_block_size(44_100.0, 64);
    let osc = ctx.add_sine(440.0);
    let dest = ctx.destination();
    ctx.connect(osc, dest).unwrap();
    ctx
}

#[test]
fn offline_render_determinism() {
    let mut a = sine_rig();
    let mut b = sine_rig();
    let out_a = a.render(256).unwrap();
    let out_b = b.render(256).unwrap();
    assert_eq!(out_a, out_b, "offline renders should be identical");
}

#[test]
fn offline_render_partial_block() {
    let mut ctx = sine_rig();
    // Frames not a multiple of the block size.
    let frames = 65;
    let output = ctx.render(frames).unwrap();
    assert_eq!(output.len(), frames);
    assert!(
        output.iter().any(|&x| x != 0.0),
        "should produce non-zero output"
    );
}

#[test]
fn oscillator_phase_is_continuous_across_blocks() {
    let mut chunked = sine_rig();
    let mut whole = sine_rig();
    let mut out = Vec::new();
    for _ in 0..4 {
        out.extend(chunked.render(32).unwrap());
    }
    assert_eq!(out, whole.render(128).unwrap());
}

#[test]
fn clock_counts_rendered_frames_only() {
    let mut ctx = AudioContext::with_block_size(1000.0, 32);
    assert_eq!(ctx.current_time(), 0.0);
    ctx.render(100).unwrap();
    assert!((ctx.current_time() - 0.1).abs() < 1e-12);
    // Scheduling and topology edits do not advance the clock.
    let gain = ctx.add_gain(1.0);
    ctx.set_target_at_time(gain, 0.0, 0.1, 0.01).unwrap();
    assert!((ctx.current_time() - 0.1).abs() < 1e-12);
}

#[test]
fn oversized_block_is_rejected() {
    let mut ctx = AudioContext::with_block_size(1000.0, 16);
    let mut out = vec![0.0; 17];
    assert_eq!(
        ctx.process_block(&mut out),
        Err(RenderError::BlockTooLarge { got: 17, max: 16 })
    );
}

struct Failing;

impl NodeDef for Failing {
    type State = ();

    fn init_state(&self, _sample_rate: f32) -> Self::State {}

    fn process_block(
        &self,
        _state: &mut Self::State,
        _input: &[f32],
        _output: &mut [f32],
        _sample_rate: f32,
    ) -> Result<(), &'static str> {
        Err("boom")
    }
}

#[test]
fn external_node_failures_surface() {
    let mut ctx = AudioContext::with_block_size(1000.0, 16);
    let bad = ctx.add_external(Failing);
    let dest = ctx.destination();
    ctx.connect(bad, dest).unwrap();
    assert_eq!(ctx.render(16), Err(RenderError::Node("boom")));
}
