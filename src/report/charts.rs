use crate::core::config::ReportConfig;
use crate::core::model::{QuestionSummary, ScoreHistogram};
use crate::report::html::escape_html;
use serde_json::{Value, json};

const FONT_FAMILY: &str = "Inter, system-ui, -apple-system, Segoe UI, Roboto, Arial";
const TEXT: &str = "#0f172a";
const TICK: &str = "#334155";
const AXIS_TITLE: &str = "#475569";
const GRID: &str = "rgba(15,23,42,0.08)";
const ZERO_LINE: &str = "rgba(15,23,42,0.10)";

/// A Plotly figure bound to the id of the `<div>` it is drawn into.
pub struct Chart {
    pub div_id: String,
    pub height: u32,
    pub data: Value,
    pub layout: Value,
}

impl Chart {
    pub fn to_html(&self) -> String {
        format!(
            "<div id=\"{id}\" class=\"plotly-chart\" style=\"height:{h}px;\"></div>\n<script>Plotly.newPlot(\"{id}\",{data},{layout},{{\"responsive\":true,\"displaylogo\":false}});</script>",
            id = self.div_id,
            h = self.height,
            data = script_json(&self.data),
            layout = script_json(&self.layout),
        )
    }
}

/// Serialized JSON that is safe inside a `<script>` element.
fn script_json(v: &Value) -> String {
    v.to_string().replace("</", "<\\/")
}

/// Greedy word wrap at `width` characters, lines joined with `<br>`.
/// Words longer than `width` stay whole on their own line.
pub fn wrap_title(title: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;
    for word in title.split_whitespace() {
        let word_len = word.chars().count();
        if line_len > 0 && line_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }
        if line_len > 0 {
            line.push(' ');
            line_len += 1;
        }
        line.push_str(word);
        line_len += word_len;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
        .iter()
        .map(|l| escape_html(l))
        .collect::<Vec<_>>()
        .join("<br>")
}

fn base_layout(title: String, height: u32) -> Value {
    json!({
        "title": { "text": title, "font": { "size": 14 } },
        "height": height,
        "paper_bgcolor": "rgba(0,0,0,0)",
        "plot_bgcolor": "rgba(255,255,255,0.0)",
        "font": { "family": FONT_FAMILY, "color": TEXT },
        "margin": { "l": 24, "r": 18, "t": 70, "b": 36 },
        "legend": { "font": { "color": TICK } },
    })
}

fn axis(title: &str) -> Value {
    json!({
        "title": { "text": title, "font": { "color": AXIS_TITLE } },
        "gridcolor": GRID,
        "zerolinecolor": ZERO_LINE,
        "tickfont": { "color": TICK },
    })
}

/// Response counts per score for one question, zero-filled over 1..5.
pub fn question_bar(idx: usize, q: &QuestionSummary, cfg: &ReportConfig) -> Chart {
    let (scores, counts): (Vec<u8>, Vec<u64>) = q.histogram.buckets().unzip();
    let data = json!([{
        "type": "bar",
        "x": scores,
        "y": counts,
        "text": counts,
        "textposition": "auto",
        "marker": {
            "color": cfg.palette.accent,
            "line": { "color": "rgba(15,23,42,0.15)", "width": 1 },
        },
        "textfont": { "color": TEXT },
        "hovertemplate": "Score=%{x}<br>Responses=%{y}<extra></extra>",
    }]);
    let mut layout = base_layout(wrap_title(&q.name, cfg.title_wrap_width), cfg.chart_height);
    let mut x = axis("Score (1–5)");
    x["dtick"] = json!(1);
    layout["xaxis"] = x;
    layout["yaxis"] = axis("Responses");
    Chart {
        div_id: format!("q-chart-{}", idx),
        height: cfg.chart_height,
        data,
        layout,
    }
}

/// Donut over the pooled histogram. Labels that do not fit inside a slice
/// are hidden rather than drawn outside with leader lines.
pub fn overall_pie(hist: &ScoreHistogram, cfg: &ReportConfig) -> Chart {
    let data = if hist.total() == 0 {
        json!([{
            "type": "pie",
            "labels": ["No data"],
            "values": [1],
            "hole": 0.45,
            "marker": {
                "colors": [cfg.palette.no_data],
                "line": { "color": "#ffffff", "width": 2 },
            },
            "textinfo": "label",
            "textposition": "inside",
        }])
    } else {
        let (labels, values): (Vec<String>, Vec<u64>) =
            hist.buckets().map(|(s, c)| (s.to_string(), c)).unzip();
        json!([{
            "type": "pie",
            "labels": labels,
            "values": values,
            "hole": 0.45,
            "sort": false,
            "marker": {
                "colors": cfg.palette.score_ramp,
                "line": { "color": "#ffffff", "width": 2 },
            },
            "textinfo": "percent+label",
            "textposition": "inside",
            "insidetextorientation": "radial",
            "textfont": { "size": 14 },
            "hovertemplate": "Score=%{label}<br>Count=%{value}<br>%{percent}<extra></extra>",
        }])
    };
    let title = if hist.total() == 0 {
        "Overall distribution (1–5)"
    } else {
        "Overall distribution of all answers (1–5)"
    };
    let mut layout = base_layout(title.to_string(), cfg.pie_height);
    layout["margin"] = json!({ "l": 12, "r": 12, "t": 70, "b": 12 });
    layout["legend"] = json!({ "orientation": "h", "y": -0.05, "font": { "color": TICK } });
    layout["showlegend"] = json!(true);
    layout["uniformtext"] = json!({ "minsize": 12, "mode": "hide" });
    Chart {
        div_id: "overall-pie".to_string(),
        height: cfg.pie_height,
        data,
        layout,
    }
}
