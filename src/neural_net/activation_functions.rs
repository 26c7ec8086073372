use rand::Rng;
use serde::{Deserialize, Serialize};


#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum ActivationFunction {
    Linear,     // f(x) = x
    Step,       // f(x) = if x > 0 { 1.0 } else { 0.0 }
    Sin,        // f(x) = sin(pi * x)
    Cos,        // f(x) = cos(pi * x)
    Gaussian,   // f(x) = exp(-x^2 / 2);                                         f(0) = 1.0
    Tanh,       // f(x) = tanh(x);                                            tanh(2) = 0.964027580075817
    Sigmoid,    // f(x) = (tanh(x / 2) + 1) / 2, i.e. the logistic function;     f(4) = 0.982013790037908
    Inverse,    // f(x) = -x
    Abs,        // f(x) = |x|
    ReLU,       // f(x) = if x > 0 { x } else { 0.0 }
    Squared,    // f(x) = x^2
}

impl ActivationFunction {
    pub const ALL: [ActivationFunction; 11] = [
        ActivationFunction::Linear,
        ActivationFunction::Step,
        ActivationFunction::Sin,
        ActivationFunction::Cos,
        ActivationFunction::Gaussian,
        ActivationFunction::Tanh,
        ActivationFunction::Sigmoid,
        ActivationFunction::Inverse,
        ActivationFunction::Abs,
        ActivationFunction::ReLU,
        ActivationFunction::Squared,
    ];

    pub fn linear(  x: f64) -> f64 { x }
    pub fn step(    x: f64) -> f64 { if x > 0.0 { 1.0 } else { 0.0 } }
    pub fn sin(     x: f64) -> f64 { (std::f64::consts::PI * x).sin() }
    pub fn cos(     x: f64) -> f64 { (std::f64::consts::PI * x).cos() }
    pub fn gaussian(x: f64) -> f64 { (-(x * x) / 2.0).exp() }
    pub fn tanh(    x: f64) -> f64 { x.tanh() }
    pub fn sigmoid( x: f64) -> f64 { ((x / 2.0).tanh() + 1.0) / 2.0 }
    pub fn inverse( x: f64) -> f64 { -x }
    pub fn abs(     x: f64) -> f64 { x.abs() }
    pub fn relu(    x: f64) -> f64 { if x > 0.0 { x } else { 0.0 } }
    pub fn squared( x: f64) -> f64 { x * x }

    pub fn apply(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Linear   => Self::linear(x),
            ActivationFunction::Step     => Self::step(x),
            ActivationFunction::Sin      => Self::sin(x),
            ActivationFunction::Cos      => Self::cos(x),
            ActivationFunction::Gaussian => Self::gaussian(x),
            ActivationFunction::Tanh     => Self::tanh(x),
            ActivationFunction::Sigmoid  => Self::sigmoid(x),
            ActivationFunction::Inverse  => Self::inverse(x),
            ActivationFunction::Abs      => Self::abs(x),
            ActivationFunction::ReLU     => Self::relu(x),
            ActivationFunction::Squared  => Self::squared(x),
        }
    }

    /// Rust source for `apply`, with `x` standing for an already-bound `f64`
    /// variable. The expression performs the same floating point operations
    /// in the same order as `apply`, so rendered code matches evaluation bit
    /// for bit.
    pub fn rust_expression(&self, x: &str) -> String {
        match self {
            ActivationFunction::Linear   => x.to_string(),
            ActivationFunction::Step     => format!("if {x} > 0.0 {{ 1.0 }} else {{ 0.0 }}"),
            ActivationFunction::Sin      => format!("(std::f64::consts::PI * {x}).sin()"),
            ActivationFunction::Cos      => format!("(std::f64::consts::PI * {x}).cos()"),
            ActivationFunction::Gaussian => format!("(-({x} * {x}) / 2.0).exp()"),
            ActivationFunction::Tanh     => format!("{x}.tanh()"),
            ActivationFunction::Sigmoid  => format!("(({x} / 2.0).tanh() + 1.0) / 2.0"),
            ActivationFunction::Inverse  => format!("-{x}"),
            ActivationFunction::Abs      => format!("{x}.abs()"),
            ActivationFunction::ReLU     => format!("if {x} > 0.0 {{ {x} }} else {{ 0.0 }}"),
            ActivationFunction::Squared  => format!("{x} * {x}"),
        }
    }

    pub fn choose_random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}



#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::ActivationFunction;

    #[test]
    fn test_funtions() {
        for (i, &x) in [-2.0, 1.0, 0.0, 123.456, -3.1415926, -0.000001, 4.0].iter().enumerate() {
            assert_eq!( x, ActivationFunction::linear( x));
            assert_eq!(-x, ActivationFunction::inverse(x));
            assert_eq!(x.abs(), ActivationFunction::abs(-x));
            assert_eq!(x * x, ActivationFunction::squared(-x));

            assert_eq!(x.abs(), ActivationFunction::relu( x.abs()));
            assert_eq!(0.0,     ActivationFunction::relu(-x.abs()));

            let sig = [0.1192, 0.7310, 0.5, 1.0, 0.0414, 0.5, 0.9820];
            assert!(almost_eq(sig[i],       ActivationFunction::sigmoid( x)));
            assert!(almost_eq(1.0 - sig[i], ActivationFunction::sigmoid(-x)));

            let tanh = [-0.9640, 0.7616, 0.0, 1.0, -0.9963, 0.0, 0.9993];
            assert!(almost_eq(tanh[i],  ActivationFunction::tanh( x)));
            assert!(almost_eq(-tanh[i], ActivationFunction::tanh(-x)));
        }
    }

    #[test]
    fn test_periodic_and_bumps() {
        assert_eq!(1.0, ActivationFunction::step(0.5));
        assert_eq!(0.0, ActivationFunction::step(0.0));
        assert_eq!(1.0, ActivationFunction::gaussian(0.0));
        assert!(almost_eq(0.6065, ActivationFunction::gaussian(1.0)));
        assert!(almost_eq(1.0, ActivationFunction::sin(0.5)));
        assert!(almost_eq(0.0, ActivationFunction::sin(1.0)));
        assert!(almost_eq(-1.0, ActivationFunction::cos(1.0)));
    }

    fn almost_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.0001
    }

    #[test]
    fn test_choose() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut found = [false; ActivationFunction::ALL.len()];
        for _ in 0..1000 {
            let chosen = ActivationFunction::choose_random(&mut rng);
            let i = ActivationFunction::ALL.iter().position(|&af| af == chosen).unwrap();
            found[i] = true;
        }
        assert!(found.iter().all(|&b| b));
    }

    #[test]
    fn test_expressions_name_their_argument() {
        for af in ActivationFunction::ALL {
            assert!(af.rust_expression("n3").contains("n3"), "{af:?}");
        }
    }
}
