//! Chart payloads carried by iterations

use serde::{Deserialize, Serialize};

/// Rendering style of an interactive chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    /// Line plot over ordered x values.
    Line,
    /// Bar chart, categorical x values allowed.
    Bar,
    /// Pie chart; x values label the slices.
    Pie,
    /// Scatter plot.
    Scatter,
}

/// One element of a chart data series.
///
/// Series mix numbers and category labels (e.g. a bar chart keyed by
/// `"height"`, `"width"`), so elements are numeric-or-string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartValue {
    /// Numeric data point.
    Number(f64),
    /// Category label.
    Text(String),
}

impl From<f64> for ChartValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ChartValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// An interactive chart: two equal-length data series plus labels.
///
/// `chart_name` must be unique within the owning iteration's chart list;
/// both constraints are enforced by the chart validator before any write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractiveChart {
    /// Name, unique within the owning iteration.
    pub chart_name: String,
    /// Rendering style.
    pub chart_type: ChartType,
    /// X series.
    pub x_data: Vec<ChartValue>,
    /// Y series, same length as `x_data`.
    pub y_data: Vec<ChartValue>,
    /// X axis label.
    #[serde(default)]
    pub x_label: String,
    /// Y axis label.
    #[serde(default)]
    pub y_label: String,
}

/// Input for an image chart: a name plus the source path to read.
///
/// The path itself is not persisted; only the encoded bytes are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageChartDraft {
    /// Chart name.
    pub name: String,
    /// Filesystem path of the source image.
    pub image_path: String,
}

/// A stored image chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageChart {
    /// Chart name.
    pub name: String,
    /// Reversible byte-to-text encoding of the source image.
    pub encoded_image: String,
}
