//! Categorical colours for node features.
//!
//! Up to ten categories get the Tableau-10 qualitative palette by position.
//! Larger sets sample the cubehelix "rainbow" ramp at `i / n`, so the hues
//! spread evenly however many categories there are.

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Above this many categories the ramp replaces the fixed palette.
pub const PALETTE_SIZE: usize = 10;

/// Tableau-10 qualitative palette.
pub const TABLEAU_10: [&str; PALETTE_SIZE] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f",
    "#edc949", "#af7aa1", "#ff9da7", "#9c755f", "#bab0ab",
];

/// Which of the two graph views a colour table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphView {
    Overview,
    Detail,
}

impl GraphView {
    pub const ALL: [GraphView; 2] = [GraphView::Overview, GraphView::Detail];

    pub fn as_str(self) -> &'static str {
        match self {
            GraphView::Overview => "overview",
            GraphView::Detail => "detail",
        }
    }
}

impl fmt::Display for GraphView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overview" => Ok(GraphView::Overview),
            "detail" => Ok(GraphView::Detail),
            other => Err(format!("unknown graph view '{}'", other)),
        }
    }
}

/// Category value → colour string.
pub type ColorMap = BTreeMap<String, String>;

/// Owns the colour tables of both views and the per-view selected scheme.
#[derive(Debug, Clone)]
pub struct CategoricalColorAssigner {
    tables: HashMap<GraphView, HashMap<String, ColorMap>>,
    schemes: HashMap<GraphView, String>,
}

impl CategoricalColorAssigner {
    /// `default_scheme` is the feature each view colours by initially.
    pub fn new(default_scheme: &str) -> Self {
        Self {
            tables: HashMap::new(),
            schemes: GraphView::ALL
                .iter()
                .map(|&v| (v, default_scheme.to_string()))
                .collect(),
        }
    }

    /// Both views start on the config's `default_color_scheme`.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.default_color_scheme)
    }

    /// Rebuild the colour map for (`view`, `feature`) from `values`,
    /// replacing whatever was there. Colours follow the order of `values`.
    pub fn assign<S: AsRef<str>>(
        &mut self,
        values: &[S],
        feature: &str,
        view: GraphView,
    ) -> &ColorMap {
        let count = values.len();
        let mapping: ColorMap = values
            .iter()
            .enumerate()
            .map(|(i, value)| (value.as_ref().to_string(), color_at(i, count)))
            .collect();

        let slot = self
            .tables
            .entry(view)
            .or_default()
            .entry(feature.to_string())
            .or_default();
        *slot = mapping;
        slot
    }

    pub fn colors(&self, view: GraphView, feature: &str) -> Option<&ColorMap> {
        self.tables.get(&view).and_then(|t| t.get(feature))
    }

    pub fn color_of(&self, view: GraphView, feature: &str, value: &str) -> Option<&str> {
        self.colors(view, feature)
            .and_then(|m| m.get(value))
            .map(String::as_str)
    }

    pub fn set_node_color_scheme(&mut self, view: GraphView, feature: &str) {
        self.schemes.insert(view, feature.to_string());
    }

    pub fn selected_color_scheme(&self, view: GraphView) -> &str {
        self.schemes.get(&view).map(String::as_str).unwrap_or_default()
    }

    /// Colour map of the feature currently selected for `view`, if assigned.
    pub fn selected_colors(&self, view: GraphView) -> Option<&ColorMap> {
        self.colors(view, self.selected_color_scheme(view))
    }
}

impl Default for CategoricalColorAssigner {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Colour for category `i` of `count`.
pub fn color_at(i: usize, count: usize) -> String {
    if count > PALETTE_SIZE {
        rainbow(i as f64 / count as f64)
    } else {
        TABLEAU_10[i % PALETTE_SIZE].to_string()
    }
}

/// Cyclical cubehelix rainbow at `t` (wrapped into [0, 1]), as `rgb(r, g, b)`.
pub fn rainbow(t: f64) -> String {
    let t = if (0.0..=1.0).contains(&t) { t } else { t - t.floor() };
    let ts = (t - 0.5).abs();
    let hue = 360.0 * t - 100.0;
    let saturation = 1.5 - 1.5 * ts;
    let lightness = 0.8 - 0.9 * ts;
    cubehelix_rgb(hue, saturation, lightness)
}

fn cubehelix_rgb(hue: f64, saturation: f64, lightness: f64) -> String {
    const A: f64 = -0.14861;
    const B: f64 = 1.78277;
    const C: f64 = -0.29227;
    const D: f64 = -0.90649;
    const E: f64 = 1.97294;

    let h = (hue + 120.0) * PI / 180.0;
    let amp = saturation * lightness * (1.0 - lightness);
    let (sin_h, cos_h) = h.sin_cos();

    let r = 255.0 * (lightness + amp * (A * cos_h + B * sin_h));
    let g = 255.0 * (lightness + amp * (C * cos_h + D * sin_h));
    let b = 255.0 * (lightness + amp * (E * cos_h));

    format!("rgb({}, {}, {})", channel(r), channel(g), channel(b))
}

fn channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
