//! Renders a sine tone through a hard-clip sub-graph, toggling bypass every
//! quarter second, and writes the result to `soft_bypass.wav`.

use sidestep::{AudioContext, BypassSwitch, BypassSwitchOptions, NodeDef};

struct HardClip {
    threshold: f32,
}

impl NodeDef for HardClip {
    type State = ();

    fn init_state(&self, _sample_rate: f32) -> Self::State {}

    fn process_block(
        &self,
        _state: &mut Self::State,
        input: &[f32],
        output: &mut [f32],
        _sample_rate: f32,
    ) -> Result<(), &'static str> {
        for (o, &i) in output.iter_mut().zip(input) {
            *o = i.clamp(-self.threshold, self.threshold);
        }
        Ok(())
    }
}

fn main() {
    let sample_rate = 44_100.0;
    let mut ctx = AudioContext::new(sample_rate);
    let osc = ctx.add_sine(220.0);
    let mut switch = BypassSwitch::new(&mut ctx, BypassSwitchOptions::default()).unwrap();
    let clip = ctx.add_external(HardClip { threshold: 0.3 });

    ctx.connect(osc, switch.input()).unwrap();
    ctx.connect(switch.sub_graph_input(), clip).unwrap();
    ctx.connect(clip, switch.sub_graph_output()).unwrap();
    let dest = ctx.destination();
    switch.connect(&mut ctx, dest).unwrap();

    let toggle_frames = (sample_rate * 0.25) as usize;
    let mut samples = Vec::new();
    for toggle in 0..8 {
        samples.extend(ctx.render(toggle_frames).unwrap());
        switch.set_active(&mut ctx, toggle % 2 == 0).unwrap();
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create("soft_bypass.wav", spec).unwrap();
    for &s in &samples {
        writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();

    println!(
        "wrote soft_bypass.wav: {} samples, bypass toggled every {} frames",
        samples.len(),
        toggle_frames
    );
}
