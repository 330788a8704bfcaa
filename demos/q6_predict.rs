use mlp_kern::{fixed, qkern, Activation, NetConfig, NormalSampler, QPerceptron};

fn main() -> mlp_kern::Result<()> {
    // Fixed-point inference over Q1.6 cells: the whole network fits in one
    // byte per weight.
    let cfg = NetConfig {
        input_len: 8,
        hidden_len: 16,
        output_len: 4,
        batch_len: 1,
        rate: 0.05,
        hidden_activation: Activation::ReLU,
        output_activation: Activation::Sigmoid,
        hidden_weights: None,
        output_weights: None,
    };

    let mut sampler = NormalSampler::from_seed(42);
    let mut net = QPerceptron::new(&cfg, &mut sampler)?;

    let input: Vec<i8> = [0.4_f32, 0.8, 0.1, 0.66, 0.2, -0.3, 0.9, -0.1]
        .iter()
        .copied()
        .map(fixed::from_f32)
        .collect();

    let output = net.predict(&input).to_vec();
    let (class, max) = qkern::argmax(&output);

    print!("output:");
    for v in &output {
        print!(" {:.4}", fixed::to_f32(*v));
    }
    println!();
    println!("class {class} ({:.4})", fixed::to_f32(max));
    Ok(())
}
