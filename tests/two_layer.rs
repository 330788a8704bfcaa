//! End-to-end behavior of the assembled two-layer network, including the
//! float/fixed-point correspondence and weight persistence through a
//! training session.

use mlp_kern::{fixed, qkern, Activation, Mat, MatMut, NetConfig, NormalSampler, Perceptron};

fn toy_config() -> NetConfig {
    NetConfig {
        input_len: 5,
        hidden_len: 7,
        output_len: 3,
        batch_len: 1,
        rate: 0.1,
        hidden_activation: Activation::ReLU,
        output_activation: Activation::Sigmoid,
        hidden_weights: None,
        output_weights: None,
    }
}

#[test]
fn training_separates_two_inputs() {
    let cfg = toy_config();
    let mut net = Perceptron::new(&cfg, &mut NormalSampler::from_seed(0)).unwrap();

    let samples: [(&[f32], &[f32]); 2] = [
        (&[0.9, 0.1, 0.2, 0.1, 0.3], &[1.0, 0.0, 0.0]),
        (&[0.1, 0.2, 0.9, 0.8, 0.1], &[0.0, 0.0, 1.0]),
    ];

    for _ in 0..500 {
        for (input, target) in samples {
            net.predict(input);
            net.prediction_error(target);
            net.train_sgd(input, cfg.rate);
        }
    }

    for (input, target) in samples {
        let out = net.predict(input).to_vec();
        let want = target.iter().position(|&t| t == 1.0).unwrap();
        let got = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap()
            .0;
        assert_eq!(got, want, "out={out:?}");
    }
}

#[test]
fn fixed_point_forward_tracks_the_float_forward() {
    // One shared weight matrix, quantized for the fixed path. The Q kernel
    // halves the result, so compare against half the float output. Each
    // cell carries up to 1/64 of conversion error plus accumulation error.
    let w_f32: Vec<f32> = vec![
        0.3, 0.4, 0.199, 0.4, 0.2, //
        0.1, -0.8, 0.5, -0.2, 0.5, //
        0.5, -0.1, -0.5, 0.2, -0.5, //
    ];
    let w_q: Vec<i8> = w_f32.iter().copied().map(fixed::from_f32).collect();

    let x_f32 = [0.4_f32, 0.8, 0.1, 0.66, 0.2];
    let x_q: Vec<i8> = x_f32.iter().copied().map(fixed::from_f32).collect();

    let mut y_f32 = [0.0_f32; 3];
    mlp_kern::linear::trans(
        Mat::new(&w_f32, 5, 3),
        Mat::new(&x_f32, 1, 5),
        &mut MatMut::new(&mut y_f32, 1, 3),
    );

    let mut y_q = [0_i8; 3];
    qkern::linear(
        Mat::new(&w_q, 5, 3),
        Mat::new(&x_q, 1, 5),
        &mut MatMut::new(&mut y_q, 1, 3),
    );

    for (q, f) in y_q.iter().zip(&y_f32) {
        let got = fixed::to_f32(*q);
        let want = f / 2.0;
        // Five accumulated products, each within 1/64 of float, plus the
        // de-scaling truncation.
        assert!(
            (got - want).abs() <= 6.0 / 64.0,
            "got {got}, want {want}"
        );
    }
}

#[test]
fn weight_files_carry_training_progress_between_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = toy_config();
    cfg.hidden_weights = Some(dir.path().join("hidden.w"));
    cfg.output_weights = Some(dir.path().join("output.w"));

    let input = [0.9_f32, 0.1, 0.2, 0.1, 0.3];
    let target = [1.0_f32, 0.0, 0.0];

    // Session one: create, train, drop (unmap).
    let trained_error = {
        let mut net = Perceptron::new(&cfg, &mut NormalSampler::from_seed(0)).unwrap();
        assert!(net.hidden_weights().is_mapped());

        for _ in 0..300 {
            net.predict(&input);
            net.prediction_error(&target);
            net.train_sgd(&input, cfg.rate);
        }
        net.predict(&input);
        net.prediction_error(&target)
    };

    // Session two: the mapped weights come back trained; the first
    // prediction already matches the end of session one.
    let mut net = Perceptron::new(&cfg, &mut NormalSampler::from_seed(77)).unwrap();
    net.predict(&input);
    let resumed_error = net.prediction_error(&target);

    assert!(
        (resumed_error - trained_error).abs() < 1e-9,
        "trained={trained_error} resumed={resumed_error}"
    );
}

#[test]
fn frozen_prediction_never_touches_the_weights() {
    let cfg = toy_config();
    let mut net = Perceptron::new(&cfg, &mut NormalSampler::from_seed(6)).unwrap();

    let before_hidden = net.hidden_weights().as_slice().to_vec();
    let before_output = net.output_weights().as_slice().to_vec();

    let input = [0.4_f32, 0.8, 0.1, 0.66, 0.2];
    for _ in 0..10 {
        net.predict(&input);
        net.prediction_error(&[0.0, 1.0, 0.0]);
    }

    assert_eq!(net.hidden_weights().as_slice(), &before_hidden[..]);
    assert_eq!(net.output_weights().as_slice(), &before_output[..]);
}
