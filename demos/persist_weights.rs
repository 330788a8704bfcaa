use std::path::PathBuf;

use mlp_kern::{Activation, NetConfig, NormalSampler, Perceptron};

fn main() -> mlp_kern::Result<()> {
    // Weight files are created and He-initialized on the first run, then
    // mapped back unchanged on every later run: re-running this program
    // keeps improving the same model.
    let data = PathBuf::from("data");
    std::fs::create_dir_all(&data).expect("create data directory");

    let cfg = NetConfig {
        input_len: 4,
        hidden_len: 12,
        output_len: 2,
        batch_len: 1,
        rate: 0.1,
        hidden_activation: Activation::ReLU,
        output_activation: Activation::Sigmoid,
        hidden_weights: Some(data.join("hidden.w")),
        output_weights: Some(data.join("output.w")),
    };

    let mut sampler = NormalSampler::from_entropy();
    let mut net = Perceptron::new(&cfg, &mut sampler)?;

    let input = [0.9_f32, 0.1, 0.3, 0.5];
    let target = [0.0_f32, 1.0];

    net.predict(&input);
    println!("error before: {:.6}", net.prediction_error(&target));

    for _ in 0..100 {
        net.predict(&input);
        net.prediction_error(&target);
        net.train_sgd(&input, cfg.rate);
    }

    net.predict(&input);
    println!("error after:  {:.6}", net.prediction_error(&target));
    Ok(())
}
