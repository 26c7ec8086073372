use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::neural_net::scoring::Pattern;


pub const GRID_WIDTH: usize = 3;
pub const GRID_HEIGHT: usize = 2;

// Four shapes, each a 2x3 grid, representing: up, down, left and right.
#[rustfmt::skip]
const UP: [f64; GRID_WIDTH * GRID_HEIGHT] = [
    0.0, 1.0, 0.0, //  o
    1.0, 1.0, 1.0, // ooo
];
#[rustfmt::skip]
const DOWN: [f64; GRID_WIDTH * GRID_HEIGHT] = [
    1.0, 1.0, 1.0, // ooo
    0.0, 1.0, 0.0, //  o
];
#[rustfmt::skip]
const LEFT: [f64; GRID_WIDTH * GRID_HEIGHT] = [
    1.0, 1.0, 1.0, // ooo
    0.0, 0.0, 1.0, //   o
];
#[rustfmt::skip]
const RIGHT: [f64; GRID_WIDTH * GRID_HEIGHT] = [
    1.0, 1.0, 1.0, // ooo
    0.1, 0.0, 0.0, // o
];

/// The up/down/left/right task; "up" comes first, so a single multiplier of `1.0` means
/// "recognise up".
pub fn up_down_left_right() -> Vec<Pattern> {
    vec![
        Pattern::new("up",    UP.to_vec()),
        Pattern::new("down",  DOWN.to_vec()),
        Pattern::new("left",  LEFT.to_vec()),
        Pattern::new("right", RIGHT.to_vec()),
    ]
}

/// Renders a pattern as rows of `o` (set) and `.` (unset) for logging.
pub fn render_grid(values: &[f64], width: usize) -> String {
    values.chunks(width.max(1))
        .map(|row| row.iter().map(|&v| if v > 0.5 { 'o' } else { '.' }).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}


/// Training data as stored on disk: named patterns plus their multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingFile {
    pub patterns: Vec<Pattern>,
    /// Either one multiplier per pattern, or a single one for the first pattern.
    #[serde(default = "default_multipliers")]
    pub multipliers: Vec<f64>,
}

fn default_multipliers() -> Vec<f64> {
    vec![1.0]
}

impl Default for TrainingFile {
    fn default() -> Self {
        Self {
            patterns: up_down_left_right(),
            multipliers: vec![1.0, -1.0, -1.0, -1.0],
        }
    }
}

impl TrainingFile {
    /// Deserializes training data from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> std::io::Result<TrainingFile> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes_are_distinct_grids() {
        let shapes = up_down_left_right();
        assert_eq!(shapes.len(), 4);
        assert!(shapes.iter().all(|p| p.values.len() == GRID_WIDTH * GRID_HEIGHT));
        for (i, a) in shapes.iter().enumerate() {
            for b in shapes[i + 1..].iter() {
                assert_ne!(a.values, b.values, "{} vs {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn test_render_grid() {
        assert_eq!(render_grid(&UP, GRID_WIDTH), ".o.\nooo");
        assert_eq!(render_grid(&LEFT, GRID_WIDTH), "ooo\n..o");
    }

    #[test]
    fn test_training_file_defaults() {
        let file: TrainingFile = serde_json::from_str(r#"{
            "patterns": [
                { "name": "a", "values": [1.0, 0.0] },
                { "name": "b", "values": [0.0, 1.0] }
            ]
        }"#).unwrap();
        assert_eq!(file.multipliers, vec![1.0]);
        assert_eq!(file.patterns[1].name, "b");
        assert_eq!(TrainingFile::default().patterns[0].name, "up");
    }
}
