use crate::models::chart::LineChart;
use crate::models::portfolio::PortfolioHistory;

const GREEN: &str = "lightgreen";
const RED: &str = "red";
const GREEN_FILL: &str = "rgba(144,238,144,0.2)";
const RED_FILL: &str = "rgba(255,0,0,0.2)";
const PORTFOLIO_LINE: &str = "deepskyblue";
const PORTFOLIO_FILL: &str = "rgba(0,191,255,0.2)";

/// Block characters used for terminal sparklines, lowest to highest.
const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Generates chart-ready data sets.
///
/// The core computes the series and colors; the frontend only renders.
/// - 7-day sparkline per market row
/// - portfolio value over time
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// True when the series ended at or above where it started.
    /// An empty series counts as falling.
    pub fn is_rising(prices: &[f64]) -> bool {
        match (prices.first(), prices.last()) {
            (Some(first), Some(last)) => last >= first,
            _ => false,
        }
    }

    /// Sparkline for one coin: green if the last price is >= the first,
    /// red otherwise. No axes, no legend, index labels.
    pub fn sparkline(&self, prices: &[f64]) -> LineChart {
        let rising = Self::is_rising(prices);
        LineChart {
            label: None,
            labels: (0..prices.len()).map(|i| i.to_string()).collect(),
            values: prices.to_vec(),
            border_color: if rising { GREEN } else { RED }.to_string(),
            fill_color: if rising { GREEN_FILL } else { RED_FILL }.to_string(),
            show_axes: false,
        }
    }

    /// Portfolio value-over-time chart from the capped history.
    pub fn portfolio_chart(&self, history: &PortfolioHistory) -> LineChart {
        LineChart {
            label: Some("Portfolio Value".to_string()),
            labels: history
                .iter()
                .map(|p| p.time.format("%H:%M:%S").to_string())
                .collect(),
            values: history.iter().map(|p| p.total).collect(),
            border_color: PORTFOLIO_LINE.to_string(),
            fill_color: PORTFOLIO_FILL.to_string(),
            show_axes: true,
        }
    }

    /// Render a series as block characters, at most `width` wide.
    ///
    /// Longer series are downsampled by taking evenly spaced points; a flat
    /// series renders at mid height.
    pub fn text_sparkline(&self, prices: &[f64], width: usize) -> String {
        if prices.is_empty() || width == 0 {
            return String::new();
        }

        let sampled: Vec<f64> = if prices.len() <= width {
            prices.to_vec()
        } else {
            (0..width)
                .map(|i| prices[i * (prices.len() - 1) / (width - 1).max(1)])
                .collect()
        };

        let min = sampled.iter().copied().fold(f64::INFINITY, f64::min);
        let max = sampled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;

        sampled
            .iter()
            .map(|&p| {
                if span <= f64::EPSILON {
                    BARS[BARS.len() / 2]
                } else {
                    let idx = ((p - min) / span * (BARS.len() - 1) as f64).round() as usize;
                    BARS[idx.min(BARS.len() - 1)]
                }
            })
            .collect()
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}
