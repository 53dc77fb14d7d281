use crate::core::model::Status;

pub const DEFAULT_INPUT: &str = "numbers.csv";
pub const DEFAULT_OUTPUT: &str = "pulse_report_styled_white.html";

pub const BRAND_NAME: &str = "Pulse XCap/MXI2";
pub const REPORT_TITLE: &str = "LP Pulse Survey";
pub const PLOTLY_SRC: &str = "https://cdn.plot.ly/plotly-2.30.0.min.js";

pub const MAX_TITLE_CHARS: usize = 52;
pub const CHART_HEIGHT: u32 = 320;
pub const PIE_HEIGHT: u32 = 340;

#[derive(Clone, Debug)]
pub struct Palette {
    pub accent: String,
    pub accent_dark: String,
    pub good: String,
    pub neutral: String,
    pub attention: String,
    /// Pie slice colors for scores 1..5, light to dark.
    pub score_ramp: [String; 5],
    pub no_data: String,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            accent: "#64748b".to_string(),
            accent_dark: "#c81f1f".to_string(),
            good: "#1a7f37".to_string(),
            neutral: "#8a8f98".to_string(),
            attention: "#d1242f".to_string(),
            score_ramp: ["#d1d5db", "#cbd5e1", "#94a3b8", "#64748b", "#475569"].map(String::from),
            no_data: "#e2e8f0".to_string(),
        }
    }
}

impl Palette {
    pub fn status_color(&self, status: Status) -> &str {
        match status {
            Status::Good => &self.good,
            Status::Neutral => &self.neutral,
            Status::Attention => &self.attention,
        }
    }
}

/// Everything the renderer needs besides the data itself.
#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub brand_name: String,
    pub report_title: String,
    pub palette: Palette,
    pub title_wrap_width: usize,
    pub chart_height: u32,
    pub pie_height: u32,
    pub plotly_src: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            brand_name: BRAND_NAME.to_string(),
            report_title: REPORT_TITLE.to_string(),
            palette: Palette::default(),
            title_wrap_width: MAX_TITLE_CHARS,
            chart_height: CHART_HEIGHT,
            pie_height: PIE_HEIGHT,
            plotly_src: PLOTLY_SRC.to_string(),
        }
    }
}
