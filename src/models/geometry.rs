//! Page geometry handed to the LaTeX `geometry` package.

use serde::{Deserialize, Serialize};

/// Default output width (inches)
pub const DEFAULT_WIDTH: f64 = 4.0;
/// Default output height (inches)
pub const DEFAULT_HEIGHT: f64 = 6.0;
/// Default margin (inches)
pub const DEFAULT_MARGIN: f64 = 0.2;

/// Output orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn is_landscape(self) -> bool {
        self == Orientation::Landscape
    }
}

/// Geometry options for the rewritten main file.
///
/// Options are kept in insertion order (`paperwidth`, `paperheight`,
/// `margin`) so the generated `\usepackage[...]{geometry}` line is stable.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySettings {
    options: Vec<(String, String)>,
    orientation: Orientation,
}

impl GeometrySettings {
    /// Build settings from sizes in inches.
    ///
    /// In landscape the width and height are swapped: the page is typeset
    /// portrait-shaped and rotated afterwards.
    pub fn new(width: f64, height: f64, margin: f64, orientation: Orientation) -> Self {
        let (width, height) = if orientation.is_landscape() {
            (height, width)
        } else {
            (width, height)
        };

        Self {
            options: vec![
                ("paperwidth".to_string(), inches(width)),
                ("paperheight".to_string(), inches(height)),
                ("margin".to_string(), inches(margin)),
            ],
            orientation,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_landscape(&self) -> bool {
        self.orientation.is_landscape()
    }

    /// Look up a single option value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Comma-joined `key=value` pairs, with `,landscape` appended when needed
    pub fn to_option_string(&self) -> String {
        let mut out = self
            .options
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");
        if self.is_landscape() {
            out.push_str(",landscape");
        }
        out
    }
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self::new(
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            DEFAULT_MARGIN,
            Orientation::Portrait,
        )
    }
}

fn inches(value: f64) -> String {
    format!("{}in", value)
}
