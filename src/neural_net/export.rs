use std::fmt::Write;

use super::nets::Network;


impl Network {
    /// Renders the network as a standalone Rust function taking the input values and returning
    /// the output value, with the current shared weight baked in.
    ///
    /// Each neuron becomes one `let` binding, emitted in evaluation order, and every sum is
    /// written out left to right starting from `0.0`, exactly as `evaluate()` accumulates it, so
    /// the function returns the same `f64` as `evaluate()` for every input.
    pub fn rust_function(&self, name: &str) -> String {
        let name = sanitize_identifier(name);
        let mut src = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(src, "/// Weight-agnostic network with {} inputs, {} neurons and {} connections.",
            self.inputs(), self.len(), self.connection_count());
        let _ = writeln!(src, "pub fn {name}(x: &[f64; {}]) -> f64 {{", self.inputs());
        let _ = writeln!(src, "    let w: f64 = {:?};", self.weight());

        for index in self.evaluation_order() {
            if index < self.inputs() {
                let _ = writeln!(src, "    let n{index} = x[{index}];");
                continue;
            }
            let neuron = &self.nodes()[index];
            let terms: Vec<String> = neuron.input_neurons().iter().map(|i| format!(" + n{i} * w")).collect();
            let _ = writeln!(src, "    let s{index} = 0.0_f64{};", terms.concat());
            let _ = writeln!(src, "    let n{index} = {};", neuron.activation_function.rust_expression(&format!("s{index}")));
        }

        let _ = writeln!(src, "    n{}", self.output_node());
        src.push_str("}\n");
        src
    }
}

/// Maps anything that isn't a valid Rust identifier onto one.
fn sanitize_identifier(name: &str) -> String {
    let mut ident: String = name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}
