//! Chart model shared by the renderers.

/// Legend placement options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendMode {
    /// Overlay legend inside the plotting area (may overlap data).
    Inside,
    /// Separate legend panel on the right side.
    Right,
    /// Separate legend band at the top.
    Top,
    /// Separate legend band at the bottom.
    Bottom,
}

impl std::str::FromStr for LegendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inside" => Ok(LegendMode::Inside),
            "right" => Ok(LegendMode::Right),
            "top" => Ok(LegendMode::Top),
            "bottom" => Ok(LegendMode::Bottom),
            _ => Err(format!("unknown legend placement: {s}")),
        }
    }
}

/// Horizontal legend below the chart keeps labels close to the x-axis start.
pub const DEFAULT_LEGEND_MODE: LegendMode = LegendMode::Bottom;

/// How series are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    /// One bar per series inside each x category.
    GroupedBar,
    /// Lines split at missing values, isolated points as markers.
    Line,
}

/// Y-axis value semantics; drives scaling and the axis title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Currency,
    Count,
    /// Ratios in 0..=1, rendered as percentages.
    Percent,
    /// Index values anchored at 100; never scaled.
    Index,
}

/// One named series aligned with [`ChartData::x_labels`]. `None` is a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

impl ChartSeries {
    pub fn has_values(&self) -> bool {
        self.values.iter().any(|v| v.is_some())
    }
}

/// Everything a renderer needs: categorical x positions and aligned series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub format: ValueFormat,
    pub x_labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// Output options common to every plot function.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub locale: String,
    pub legend: LegendMode,
    /// Overrides the derived title when set.
    pub title: Option<String>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            width: 1200,
            height: 700,
            locale: "en".into(),
            legend: DEFAULT_LEGEND_MODE,
            title: None,
        }
    }
}
