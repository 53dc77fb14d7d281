use crate::core::config::{Palette, ReportConfig};
use crate::core::model::{Extreme, QuestionSummary, ReportModel, Status};
use crate::report::charts;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use std::fmt::Write as FmtWrite;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Renders the report and writes it to `path`, replacing any existing file.
/// The document goes to a sibling temp file that is renamed over `path`, so
/// a failed write leaves the previous file untouched.
pub fn write(path: &Path, model: &ReportModel, cfg: &ReportConfig) -> Result<()> {
    let html = render(model, cfg, Local::now().naive_local())?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {} failed", dir.display()))?;
    let mut w = BufWriter::new(tmp);
    w.write_all(html.as_bytes())?;
    let tmp = w.into_inner().map_err(|e| e.into_error())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replace {} failed", path.display()))?;
    Ok(())
}

pub fn render(model: &ReportModel, cfg: &ReportConfig, generated: NaiveDateTime) -> Result<String> {
    let mut html = String::with_capacity(64 * 1024);
    let brand = escape_html(&cfg.brand_name);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\"/>")?;
    writeln!(
        html,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>"
    )?;
    writeln!(
        html,
        "<title>{} · {}</title>",
        brand,
        escape_html(&cfg.report_title)
    )?;
    writeln!(
        html,
        "<link rel=\"preconnect\" href=\"https://fonts.googleapis.com\">"
    )?;
    writeln!(
        html,
        "<link rel=\"preconnect\" href=\"https://fonts.gstatic.com\" crossorigin>"
    )?;
    writeln!(
        html,
        "<link href=\"https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700&display=swap\" rel=\"stylesheet\">"
    )?;
    writeln!(html, "<script src=\"{}\"></script>", cfg.plotly_src)?;
    write_style(&mut html, cfg)?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;

    writeln!(html, "<div class=\"nav\"><div class=\"nav-inner\">")?;
    writeln!(
        html,
        "<div class=\"brand\"><span class=\"brand-dot\"></span><span>{}</span></div>",
        brand
    )?;
    writeln!(html, "</div></div>")?;

    writeln!(html, "<div class=\"container\">")?;
    write_hero(&mut html, model, cfg, generated)?;

    writeln!(html, "<div class=\"grid\">")?;
    kpi_card(
        &mut html,
        "Overall mean (1–5)",
        &fmt_num(model.overall_mean),
        Some(Status::from_mean(model.overall_mean)),
        "Rule of thumb: ≥ 4.0 good, 3.0–3.99 neutral, &lt; 3.0 needs attention.",
        &cfg.palette,
    )?;
    extreme_card(&mut html, "Best question (mean)", model.best.as_ref(), cfg)?;
    extreme_card(&mut html, "Lowest question (mean)", model.worst.as_ref(), cfg)?;
    kpi_card(
        &mut html,
        "Total answers",
        &fmt_int(model.total_answers as u64),
        None,
        "Scored answers, 1–5 (excluding blanks).",
        &cfg.palette,
    )?;

    panel_open(&mut html, "Summary by question", "Mean / median / min / max")?;
    summary_table(&mut html, &model.questions)?;
    panel_close(&mut html)?;

    panel_open(&mut html, "Overall distribution", "All answers aggregated (1–5)")?;
    writeln!(
        html,
        "<div class=\"chart-card\" style=\"padding:10px 10px 0;border-radius:14px;\">"
    )?;
    writeln!(html, "{}", charts::overall_pie(&model.overall, cfg).to_html())?;
    writeln!(html, "</div>")?;
    panel_close(&mut html)?;

    panel_open(
        &mut html,
        "Distributions by question",
        "Counts by score (1–5). Titles are wrapped for readability.",
    )?;
    writeln!(html, "<div class=\"charts-grid\">")?;
    for (i, q) in model.questions.iter().enumerate() {
        writeln!(
            html,
            "<div class=\"chart-card\">{}</div>",
            charts::question_bar(i, q, cfg).to_html()
        )?;
    }
    writeln!(html, "</div>")?;
    panel_close(&mut html)?;

    comments_section(&mut html, &model.comments)?;

    writeln!(html, "</div>")?;
    writeln!(html, "<div class=\"footer\">Internal report · {}</div>", brand)?;
    writeln!(html, "</div>")?;
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;
    Ok(html)
}

fn write_style(out: &mut String, cfg: &ReportConfig) -> Result<()> {
    let p = &cfg.palette;
    writeln!(out, "<style>")?;
    writeln!(
        out,
        ":root{{--accent:{};--accent-dark:{};--good:{};--neutral:{};--bad:{};--bg:#f6f7fb;--panel:#ffffff;--border:rgba(15,23,42,0.10);--text:#0f172a;--muted:#475569;--shadow-soft:0 10px 28px rgba(15,23,42,0.08);--radius:18px;}}",
        p.accent, p.accent_dark, p.good, p.neutral, p.attention
    )?;
    writeln!(out, "*{{box-sizing:border-box;}}")?;
    writeln!(
        out,
        "body{{margin:0;font-family:Inter,system-ui,-apple-system,Segoe UI,Roboto,Arial;color:var(--text);background:radial-gradient(900px 450px at 20% 0%,rgba(255,45,45,0.10),transparent 60%),radial-gradient(900px 450px at 80% 0%,rgba(255,45,45,0.06),transparent 60%),linear-gradient(180deg,#ffffff 0%,var(--bg) 35%,var(--bg) 100%);min-height:100vh;}}"
    )?;
    writeln!(
        out,
        ".nav{{position:sticky;top:0;z-index:10;background:rgba(255,255,255,0.88);backdrop-filter:blur(10px);border-bottom:1px solid var(--border);}}"
    )?;
    writeln!(
        out,
        ".nav-inner{{max-width:1180px;margin:0 auto;padding:14px 18px;display:flex;align-items:center;gap:12px;}}"
    )?;
    writeln!(
        out,
        ".brand{{display:flex;align-items:center;gap:10px;font-weight:700;letter-spacing:0.2px;}}"
    )?;
    writeln!(
        out,
        ".brand-dot{{width:10px;height:10px;border-radius:999px;background:#ff2d2d;box-shadow:0 0 0 4px rgba(255,45,45,0.14);}}"
    )?;
    writeln!(
        out,
        ".container{{max-width:1180px;margin:0 auto;padding:26px 18px 46px;}}"
    )?;
    writeln!(
        out,
        ".hero{{border:1px solid var(--border);background:rgba(255,255,255,0.85);border-radius:calc(var(--radius) + 6px);padding:22px;box-shadow:var(--shadow-soft);}}"
    )?;
    writeln!(out, ".hero-title{{font-size:28px;font-weight:750;margin:0 0 6px;}}")?;
    writeln!(
        out,
        ".hero-sub{{margin:0;color:var(--muted);font-size:14px;line-height:1.5;}}"
    )?;
    writeln!(
        out,
        ".meta-row{{display:flex;flex-wrap:wrap;gap:10px;margin-top:14px;color:var(--muted);font-size:12px;}}"
    )?;
    writeln!(
        out,
        ".pill{{display:inline-flex;align-items:center;gap:8px;padding:7px 10px;border:1px solid var(--border);border-radius:999px;background:rgba(255,255,255,0.80);}}"
    )?;
    writeln!(
        out,
        ".pill .badge{{width:8px;height:8px;border-radius:999px;background:rgba(15,23,42,0.30);}}"
    )?;
    writeln!(
        out,
        ".grid{{display:grid;grid-template-columns:repeat(12,1fr);gap:14px;margin-top:16px;}}"
    )?;
    writeln!(
        out,
        ".kpi{{grid-column:span 3;border:1px solid var(--border);background:rgba(255,255,255,0.92);border-radius:var(--radius);padding:14px;box-shadow:var(--shadow-soft);}}"
    )?;
    writeln!(out, ".kpi .label{{color:var(--muted);font-size:12px;margin-bottom:10px;}}")?;
    writeln!(
        out,
        ".kpi .value{{font-size:28px;font-weight:750;letter-spacing:-0.4px;line-height:1.1;}}"
    )?;
    writeln!(
        out,
        ".kpi .hint{{margin-top:10px;color:var(--muted);font-size:12px;line-height:1.35;overflow-wrap:anywhere;}}"
    )?;
    writeln!(
        out,
        ".panel{{grid-column:span 12;border:1px solid var(--border);background:rgba(255,255,255,0.92);border-radius:var(--radius);box-shadow:var(--shadow-soft);overflow:hidden;}}"
    )?;
    writeln!(
        out,
        ".panel-header{{padding:14px;border-bottom:1px solid rgba(15,23,42,0.08);display:flex;justify-content:space-between;align-items:baseline;gap:12px;}}"
    )?;
    writeln!(out, ".panel-title{{font-weight:700;font-size:14px;}}")?;
    writeln!(out, ".panel-subtitle{{color:var(--muted);font-size:12px;}}")?;
    writeln!(out, ".panel-body{{padding:12px 12px 14px;}}")?;
    writeln!(out, ".table{{width:100%;border-collapse:collapse;font-size:13px;}}")?;
    writeln!(
        out,
        ".table th{{text-align:left;color:var(--muted);font-weight:600;padding:10px;border-bottom:1px solid var(--border);background:rgba(15,23,42,0.02);}}"
    )?;
    writeln!(
        out,
        ".table td{{padding:10px;border-bottom:1px solid rgba(15,23,42,0.06);color:rgba(15,23,42,0.92);vertical-align:top;}}"
    )?;
    writeln!(
        out,
        ".table td.q{{max-width:560px;white-space:normal;word-break:break-word;line-height:1.35;}}"
    )?;
    writeln!(out, ".table tr:hover td{{background:rgba(15,23,42,0.02);}}")?;
    writeln!(
        out,
        ".charts-grid,.comments-grid{{display:grid;grid-template-columns:repeat(2,minmax(0,1fr));gap:14px;}}"
    )?;
    writeln!(
        out,
        ".chart-card{{border:1px solid var(--border);background:rgba(255,255,255,0.98);border-radius:16px;padding:10px 10px 0;overflow:hidden;}}"
    )?;
    writeln!(
        out,
        ".comment{{border:1px solid var(--border);background:rgba(15,23,42,0.02);border-radius:14px;padding:12px;color:rgba(15,23,42,0.90);line-height:1.55;overflow-wrap:anywhere;}}"
    )?;
    writeln!(
        out,
        ".footer{{margin-top:18px;color:rgba(15,23,42,0.45);font-size:12px;text-align:center;}}"
    )?;
    writeln!(
        out,
        "@media (max-width:980px){{.kpi{{grid-column:span 6;}}.charts-grid,.comments-grid{{grid-template-columns:1fr;}}}}"
    )?;
    writeln!(out, "</style>")?;
    Ok(())
}

fn write_hero(
    out: &mut String,
    model: &ReportModel,
    cfg: &ReportConfig,
    generated: NaiveDateTime,
) -> Result<()> {
    let range = model
        .date_range
        .map(|r| {
            format!(
                "{} → {}",
                r.start.format("%Y-%m-%d"),
                r.end.format("%Y-%m-%d")
            )
        })
        .unwrap_or_else(|| "-".to_string());
    writeln!(out, "<div class=\"hero\">")?;
    writeln!(
        out,
        "<div class=\"hero-title\">{}</div>",
        escape_html(&cfg.report_title)
    )?;
    writeln!(
        out,
        "<p class=\"hero-sub\">A consolidated snapshot of sentiment and feedback. Built for quick scanning and executive review.</p>"
    )?;
    writeln!(out, "<div class=\"meta-row\">")?;
    pill(out, &format!("Generated: {}", generated.format("%Y-%m-%d %H:%M")))?;
    pill(out, &format!("Responses: {}", fmt_int(model.respondents as u64)))?;
    pill(out, &format!("Date range: {}", range))?;
    writeln!(out, "</div>")?;
    writeln!(out, "</div>")?;
    Ok(())
}

fn pill(out: &mut String, text: &str) -> Result<()> {
    writeln!(
        out,
        "<span class=\"pill\"><span class=\"badge\"></span>{}</span>",
        text
    )?;
    Ok(())
}

fn kpi_card(
    out: &mut String,
    label: &str,
    value: &str,
    status: Option<Status>,
    hint: &str,
    palette: &Palette,
) -> Result<()> {
    match status {
        Some(s) => writeln!(out, "<div class=\"kpi\" data-status=\"{}\">", s.as_str_lower())?,
        None => writeln!(out, "<div class=\"kpi\">")?,
    }
    writeln!(out, "<div class=\"label\">{}</div>", label)?;
    match status {
        Some(s) => writeln!(
            out,
            "<div class=\"value\" style=\"color:{};\">{}</div>",
            palette.status_color(s),
            value
        )?,
        None => writeln!(out, "<div class=\"value\">{}</div>", value)?,
    }
    writeln!(out, "<div class=\"hint\">{}</div>", hint)?;
    writeln!(out, "</div>")?;
    Ok(())
}

fn extreme_card(
    out: &mut String,
    label: &str,
    extreme: Option<&Extreme>,
    cfg: &ReportConfig,
) -> Result<()> {
    let mean = extreme.map(|e| e.mean);
    let name = extreme
        .map(|e| escape_html(&e.name))
        .unwrap_or_else(|| "-".to_string());
    kpi_card(
        out,
        label,
        &fmt_num(mean),
        Some(Status::from_mean(mean)),
        &name,
        &cfg.palette,
    )
}

fn panel_open(out: &mut String, title: &str, subtitle: &str) -> Result<()> {
    writeln!(out, "<section class=\"panel\">")?;
    writeln!(out, "<div class=\"panel-header\">")?;
    writeln!(out, "<div class=\"panel-title\">{}</div>", title)?;
    writeln!(out, "<div class=\"panel-subtitle\">{}</div>", subtitle)?;
    writeln!(out, "</div>")?;
    writeln!(out, "<div class=\"panel-body\">")?;
    Ok(())
}

fn panel_close(out: &mut String) -> Result<()> {
    writeln!(out, "</div>")?;
    writeln!(out, "</section>")?;
    Ok(())
}

fn summary_table(out: &mut String, questions: &[QuestionSummary]) -> Result<()> {
    // Highest mean first; unanswered questions sink to the bottom.
    let mut order: Vec<&QuestionSummary> = questions.iter().collect();
    order.sort_by(|a, b| match (a.mean, b.mean) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    writeln!(out, "<div class=\"table-wrap\">")?;
    writeln!(out, "<table class=\"table\">")?;
    writeln!(
        out,
        "<thead><tr><th>Question</th><th>Mean</th><th>Median</th><th>Min</th><th>Max</th></tr></thead>"
    )?;
    writeln!(out, "<tbody>")?;
    for q in order {
        writeln!(
            out,
            "<tr><td class=\"q\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&q.name),
            fmt_num(q.mean),
            fmt_num(q.median),
            fmt_num(q.min),
            fmt_num(q.max)
        )?;
    }
    writeln!(out, "</tbody>")?;
    writeln!(out, "</table>")?;
    writeln!(out, "</div>")?;
    Ok(())
}

fn comments_section(out: &mut String, comments: &[String]) -> Result<()> {
    if comments.is_empty() {
        return Ok(());
    }
    writeln!(out, "<section class=\"panel\" id=\"comments\">")?;
    writeln!(out, "<div class=\"panel-header\">")?;
    writeln!(out, "<div class=\"panel-title\">Open-ended comments</div>")?;
    writeln!(
        out,
        "<div class=\"panel-subtitle\">{} comment(s)</div>",
        comments.len()
    )?;
    writeln!(out, "</div>")?;
    writeln!(out, "<div class=\"panel-body comments-grid\">")?;
    for c in comments {
        writeln!(out, "<div class=\"comment\">“{}”</div>", escape_html(c))?;
    }
    panel_close(out)?;
    Ok(())
}

fn fmt_num(v: Option<f64>) -> String {
    match v {
        Some(x) => format!("{:.2}", x),
        None => "–".to_string(),
    }
}

fn fmt_int(v: u64) -> String {
    let s = v.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);
    let len = s.len();
    for (i, ch) in s.chars().enumerate() {
        if i != 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::build_model;
    use crate::core::model::{CommentColumn, QuestionColumn, ResponseTable};
    use chrono::NaiveDate;

    fn generated() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    fn model(questions: Vec<(&str, Vec<Option<f64>>)>, comments: Option<Vec<Option<&str>>>) -> ReportModel {
        let rows = questions.first().map(|q| q.1.len()).unwrap_or(0);
        let table = ResponseTable {
            rows,
            timestamp_name: "Timestamp".to_string(),
            timestamps: vec![None; rows],
            comments: comments.map(|c| CommentColumn {
                name: "Comments".to_string(),
                values: c.into_iter().map(|v| v.map(str::to_string)).collect(),
            }),
            questions: questions
                .into_iter()
                .map(|(name, values)| QuestionColumn {
                    name: name.to_string(),
                    values,
                })
                .collect(),
        };
        build_model(&table)
    }

    fn render_default(m: &ReportModel) -> String {
        render(m, &ReportConfig::default(), generated()).unwrap()
    }

    #[test]
    fn single_answer_report() {
        let html = render_default(&model(vec![("Q1", vec![Some(5.0)])], None));
        assert!(html.contains("<div class=\"value\" style=\"color:#1a7f37;\">5.00</div>"));
        assert!(html.contains("Generated: 2024-06-01 08:30"));
        assert!(html.contains("Responses: 1"));
        assert!(html.contains("Date range: -"));
        assert!(html.contains("https://cdn.plot.ly/plotly-2.30.0.min.js"));
        assert!(html.contains("Internal report · Pulse XCap/MXI2"));
        assert!(html.contains("<div class=\"hero-title\">LP Pulse Survey</div>"));
        assert!(html.contains("<title>Pulse XCap/MXI2 · LP Pulse Survey</title>"));
    }

    #[test]
    fn comments_section_omitted_when_blank() {
        let html = render_default(&model(
            vec![("Q1", vec![Some(3.0), Some(4.0)])],
            Some(vec![None, Some("   ")]),
        ));
        assert!(!html.contains("Open-ended comments"));
        assert!(!html.contains("class=\"comment\""));
    }

    #[test]
    fn one_block_per_comment() {
        let html = render_default(&model(
            vec![("Q1", vec![Some(3.0), Some(4.0), Some(2.0)])],
            Some(vec![Some("Loved it"), None, Some("<script>alert(1)</script>")]),
        ));
        assert!(html.contains("Open-ended comments"));
        assert!(html.contains("2 comment(s)"));
        assert_eq!(html.matches("<div class=\"comment\">").count(), 2);
        assert!(html.contains("“Loved it”"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn best_and_worst_cards() {
        let html = render_default(&model(
            vec![
                ("Q1", vec![Some(1.0), Some(1.0), Some(1.0)]),
                ("Q2", vec![Some(5.0), Some(5.0), Some(5.0)]),
            ],
            None,
        ));
        assert!(html.contains(
            "<div class=\"label\">Best question (mean)</div>\n<div class=\"value\" style=\"color:#1a7f37;\">5.00</div>\n<div class=\"hint\">Q2</div>"
        ));
        assert!(html.contains(
            "<div class=\"label\">Lowest question (mean)</div>\n<div class=\"value\" style=\"color:#d1242f;\">1.00</div>\n<div class=\"hint\">Q1</div>"
        ));
        // Six in-range answers, not six divided by five.
        assert!(html.contains("<div class=\"label\">Total answers</div>\n<div class=\"value\">6</div>"));
    }

    #[test]
    fn summary_table_sorted_by_mean() {
        let html = render_default(&model(
            vec![
                ("Low", vec![Some(2.0)]),
                ("Empty", vec![None]),
                ("High", vec![Some(4.5)]),
            ],
            None,
        ));
        let high = html.find("<td class=\"q\">High</td>").unwrap();
        let low = html.find("<td class=\"q\">Low</td>").unwrap();
        let empty = html.find("<td class=\"q\">Empty</td>").unwrap();
        assert!(high < low && low < empty);
        assert!(html.contains("<td class=\"q\">Empty</td><td>–</td>"));
    }

    #[test]
    fn one_bar_chart_per_question() {
        let html = render_default(&model(
            vec![
                ("A", vec![Some(1.0)]),
                ("B", vec![Some(2.0)]),
                ("C", vec![Some(3.0)]),
            ],
            None,
        ));
        assert_eq!(html.matches("class=\"plotly-chart\"").count(), 4);
        assert!(html.contains("id=\"q-chart-2\""));
        assert!(html.contains("id=\"overall-pie\""));
    }

    #[test]
    fn empty_model_renders() {
        let html = render_default(&model(Vec::new(), None));
        assert!(html.contains("Responses: 0"));
        assert!(html.contains("No data"));
        assert!(html.contains("<div class=\"hint\">-</div>"));
        assert!(html.contains("<div class=\"value\" style=\"color:#8a8f98;\">–</div>"));
    }

    #[test]
    fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        std::fs::write(&path, "stale").unwrap();
        write(&path, &model(vec![("Q1", vec![Some(4.0)])], None), &ReportConfig::default()).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(!html.contains("stale"));
    }

    #[test]
    fn failed_replace_leaves_no_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be replaced by the rendered file
        let path = dir.path().join("report.html");
        std::fs::create_dir(&path).unwrap();
        let m = model(vec![("Q1", vec![Some(4.0)])], None);
        assert!(write(&path, &m, &ReportConfig::default()).is_err());
        assert!(path.is_dir());
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn write_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("report.html");
        let m = model(vec![("Q1", vec![Some(4.0)])], None);
        assert!(write(&path, &m, &ReportConfig::default()).is_err());
    }

    #[test]
    fn escaping_and_grouping() {
        assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
        assert_eq!(fmt_int(1234567), "1,234,567");
        assert_eq!(fmt_int(12), "12");
        assert_eq!(fmt_num(Some(3.456)), "3.46");
    }
}
