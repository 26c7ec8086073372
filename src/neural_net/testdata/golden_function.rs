/// Weight-agnostic network with 3 inputs, 6 neurons and 5 connections.
pub fn golden(x: &[f64; 3]) -> f64 {
    let w: f64 = 0.5;
    let n0 = x[0];
    let n1 = x[1];
    let s4 = 0.0_f64 + n0 * w + n1 * w;
    let n4 = (std::f64::consts::PI * s4).sin();
    let n2 = x[2];
    let s3 = 0.0_f64 + n4 * w + n2 * w;
    let n3 = ((s3 / 2.0).tanh() + 1.0) / 2.0;
    n3
}
