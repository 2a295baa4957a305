use grad_check::utils::SimpleRng;
use grad_check::{
    load_config, GradCheckConfig, GradientChecker, GradientReport, GradientSet, ParameterSet,
    Tensor,
};

// Small MLP on the XOR samples, checked against its own backprop.
const NUM_INPUTS: usize = 2;
const NUM_HIDDEN: usize = 4;
const NUM_OUTPUTS: usize = 1;
const SEED: u64 = 42;

// Sigmoid activation function.
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

// Sigmoid derivative assuming s = sigmoid(z).
fn sigmoid_derivative(s: f64) -> f64 {
    s * (1.0 - s)
}

// Per-sample activations, returned as the auxiliary value of the forward pass.
struct Activations {
    hidden: Vec<f64>,
    output: Vec<f64>,
}

// W1 (inputs x hidden), b1 (hidden), W2 (hidden x outputs), b2 (outputs).
fn initialize_parameters(rng: &mut SimpleRng) -> ParameterSet {
    ParameterSet::new()
        .with("W1", rng.xavier(NUM_INPUTS, NUM_HIDDEN))
        .with("b1", rng.uniform_tensor(&[NUM_HIDDEN], -0.1, 0.1))
        .with("W2", rng.xavier(NUM_HIDDEN, NUM_OUTPUTS))
        .with("b2", rng.uniform_tensor(&[NUM_OUTPUTS], -0.1, 0.1))
}

// Dense layer followed by sigmoid: out = sigmoid(x W + b).
fn dense_sigmoid(weights: &Tensor, biases: &Tensor, inputs: &[f64]) -> Vec<f64> {
    let cols = biases.len();
    let w = weights.as_slice();
    biases
        .as_slice()
        .iter()
        .enumerate()
        .map(|(j, &b)| {
            let z = inputs
                .iter()
                .enumerate()
                .fold(b, |acc, (i, &x)| acc + x * w[i * cols + j]);
            sigmoid(z)
        })
        .collect()
}

// Mean over samples of 0.5 * ||y - out||^2.
fn forward(
    inputs: &[[f64; NUM_INPUTS]],
    targets: &[[f64; NUM_OUTPUTS]],
    params: &ParameterSet,
) -> (f64, Vec<Activations>) {
    let mut cost = 0.0;
    let mut cache = Vec::with_capacity(inputs.len());

    for (x, t) in inputs.iter().zip(targets) {
        let hidden = dense_sigmoid(&params["W1"], &params["b1"], x);
        let output = dense_sigmoid(&params["W2"], &params["b2"], &hidden);
        cost += 0.5
            * output
                .iter()
                .zip(t)
                .map(|(o, y)| (o - y) * (o - y))
                .sum::<f64>();
        cache.push(Activations { hidden, output });
    }

    (cost / inputs.len() as f64, cache)
}

// Backprop for the cost above. With `inject_bug` the hidden bias gradient
// drops the sigmoid derivative, which the check must catch.
fn backward(
    inputs: &[[f64; NUM_INPUTS]],
    targets: &[[f64; NUM_OUTPUTS]],
    params: &ParameterSet,
    inject_bug: bool,
) -> GradientSet {
    let (_, cache) = forward(inputs, targets, params);
    let mut grads = params.zeros_like();
    let w2 = params["W2"].as_slice().to_vec();
    let scale = 1.0 / inputs.len() as f64;

    for ((x, t), act) in inputs.iter().zip(targets).zip(&cache) {
        let delta_output: Vec<f64> = act
            .output
            .iter()
            .zip(t)
            .map(|(&o, &y)| (o - y) * sigmoid_derivative(o))
            .collect();

        let back: Vec<f64> = (0..NUM_HIDDEN)
            .map(|i| {
                (0..NUM_OUTPUTS)
                    .map(|j| delta_output[j] * w2[i * NUM_OUTPUTS + j])
                    .sum::<f64>()
            })
            .collect();
        let delta_hidden: Vec<f64> = back
            .iter()
            .zip(&act.hidden)
            .map(|(&e, &h)| e * sigmoid_derivative(h))
            .collect();

        accumulate_outer(&mut grads, "W2", &act.hidden, &delta_output, scale);
        accumulate(&mut grads, "b2", &delta_output, scale);
        accumulate_outer(&mut grads, "W1", x, &delta_hidden, scale);
        if inject_bug {
            accumulate(&mut grads, "b1", &back, scale);
        } else {
            accumulate(&mut grads, "b1", &delta_hidden, scale);
        }
    }

    grads
}

fn accumulate(grads: &mut GradientSet, key: &str, delta: &[f64], scale: f64) {
    if let Some(g) = grads.get_mut(key) {
        for (slot, d) in g.as_mut_slice().iter_mut().zip(delta) {
            *slot += scale * d;
        }
    }
}

// grad[i][j] += scale * a[i] * delta[j]
fn accumulate_outer(grads: &mut GradientSet, key: &str, a: &[f64], delta: &[f64], scale: f64) {
    if let Some(g) = grads.get_mut(key) {
        let cols = delta.len();
        for (i, &ai) in a.iter().enumerate() {
            for (j, &dj) in delta.iter().enumerate() {
                g.as_mut_slice()[i * cols + j] += scale * ai * dj;
            }
        }
    }
}

// Optional config path as the first non-flag argument.
fn config_from_args(args: &[String]) -> grad_check::Result<GradCheckConfig> {
    match args.iter().skip(1).find(|a| !a.starts_with("--")) {
        Some(path) => load_config(path),
        None => Ok(GradCheckConfig::default()),
    }
}

fn run_check(config: GradCheckConfig, inject_bug: bool) -> grad_check::Result<GradientReport> {
    let inputs: [[f64; NUM_INPUTS]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
    let targets: [[f64; NUM_OUTPUTS]; 4] = [[0.0], [1.0], [1.0], [0.0]];

    let mut rng = SimpleRng::new(SEED);
    let mut params = initialize_parameters(&mut rng);
    let analytical = backward(&inputs, &targets, &params, inject_bug);

    GradientChecker::new(config).run(
        &mut params,
        |x: &[[f64; NUM_INPUTS]], y: &[[f64; NUM_OUTPUTS]], p: &ParameterSet| forward(x, y, p),
        &inputs[..],
        &targets[..],
        &analytical,
    )
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let inject_bug = args.iter().any(|a| a == "--inject-bug");

    let config = match config_from_args(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load config: {}", err);
            std::process::exit(2);
        }
    };

    match run_check(config, inject_bug) {
        Ok(report) if report.passed() => {}
        Ok(_) => std::process::exit(1),
        Err(err) => {
            eprintln!("Gradient check could not run: {}", err);
            std::process::exit(2);
        }
    }
}
