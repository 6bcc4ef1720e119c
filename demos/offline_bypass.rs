use sidestep::{AudioContext, BypassSwitch, BypassSwitchOptions};

fn main() {
    // Constant source through a gain-0.5 sub-graph, toggled halfway through.
    let mut ctx = AudioContext::with_block_size(1000.0, 25);
    let source = ctx.add_constant(1.0);
    let mut switch = BypassSwitch::new(&mut ctx, BypassSwitchOptions::default()).unwrap();
    let effect = ctx.add_gain(0.5);

    ctx.connect(source, switch.input()).unwrap();
    ctx.connect(switch.sub_graph_input(), effect).unwrap();
    ctx.connect(effect, switch.sub_graph_output()).unwrap();
    let dest = ctx.destination();
    switch.connect(&mut ctx, dest).unwrap();

    let processing = ctx.render(50).unwrap();
    switch.set_active(&mut ctx, true).unwrap();
    let crossfade = ctx.render(50).unwrap();

    println!("processing path: {}", processing[0]);
    println!(
        "crossfade: {} -> {} -> {}",
        crossfade[0], crossfade[10], crossfade[49]
    );
}
