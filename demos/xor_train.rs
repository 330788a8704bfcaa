use mlp_kern::{Activation, NetConfig, NormalSampler, Perceptron};

fn main() -> mlp_kern::Result<()> {
    // Classic XOR: 2 -> 8 -> 1, ReLU hidden, sigmoid output.
    let cfg = NetConfig {
        input_len: 2,
        hidden_len: 8,
        output_len: 1,
        batch_len: 1,
        rate: 0.5,
        hidden_activation: Activation::ReLU,
        output_activation: Activation::Sigmoid,
        hidden_weights: None,
        output_weights: None,
    };

    let mut sampler = NormalSampler::from_seed(0);
    let mut net = Perceptron::new(&cfg, &mut sampler)?;

    let samples: [([f32; 2], [f32; 1]); 4] = [
        ([0.0, 0.0], [0.0]),
        ([0.0, 1.0], [1.0]),
        ([1.0, 0.0], [1.0]),
        ([1.0, 1.0], [0.0]),
    ];

    for epoch in 0..2_000 {
        let mut error = 0.0;
        for (input, target) in &samples {
            net.predict(input);
            error += net.prediction_error(target);
            net.train_sgd(input, cfg.rate);
        }
        if epoch % 200 == 0 {
            println!("epoch {epoch}: error {:.6}", error / samples.len() as f64);
        }
    }

    for (input, _) in &samples {
        let y = net.predict(input)[0];
        println!("x={input:?} y={y:.4}");
    }
    Ok(())
}
