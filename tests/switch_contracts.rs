//! Contract test: the full switch pipeline exercises every tracked invariant.

use sidestep::invariant_ppt::{
    contract_test, GAINS_COMPLEMENTARY, GRAPH_LEGALITY, GRAPH_REJECTS_INVALID, PLAN_SOUNDNESS,
    SWITCH_TOPOLOGY,
};
use sidestep::{AudioContext, BypassSwitch, BypassSwitchOptions, GraphError};

#[test]
fn switch_pipeline_enforces_all_invariants() {
    let mut ctx = AudioContext::with_block_size(1000.0, 25);
    let source = ctx.add_constant(1.0);
    let mut switch = BypassSwitch::new(&mut ctx, BypassSwitchOptions::default()).unwrap();
    let effect = ctx.add_gain(0.5);
    ctx.connect(source, switch.input()).unwrap();
    ctx.connect(switch.sub_graph_input(), effect).unwrap();
    ctx.connect(effect, switch.sub_graph_output()).unwrap();
    let dest = ctx.destination();
    switch.connect(&mut ctx, dest).unwrap();

    // Feed the sub-graph back into the switch input: rejected as a cycle.
    assert_eq!(
        ctx.connect(effect, switch.input()),
        Err(GraphError::CycleDetected)
    );

    switch.set_active(&mut ctx, true).unwrap();
    ctx.render(50).unwrap();

    contract_test(
        "bypass_switch_pipeline",
        &[
            GRAPH_LEGALITY,
            GRAPH_REJECTS_INVALID,
            PLAN_SOUNDNESS,
            SWITCH_TOPOLOGY,
            GAINS_COMPLEMENTARY,
        ],
    );
}
