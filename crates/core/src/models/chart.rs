use serde::{Deserialize, Serialize};

/// A line chart description, independent of any charting library.
///
/// The core computes the series and colors; a frontend only draws them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineChart {
    /// Legend label, `None` hides the legend
    pub label: Option<String>,

    /// X-axis labels, one per value
    pub labels: Vec<String>,

    /// Y values
    pub values: Vec<f64>,

    /// Line color (CSS)
    pub border_color: String,

    /// Area fill color (CSS, usually translucent)
    pub fill_color: String,

    /// Whether the axes are drawn (sparklines hide them)
    pub show_axes: bool,
}

impl LineChart {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
