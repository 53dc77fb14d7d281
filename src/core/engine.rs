use crate::core::config::{DEFAULT_INPUT, DEFAULT_OUTPUT, ReportConfig};
use crate::core::io;
use crate::core::metrics;
use crate::core::model::ReportModel;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub report: ReportConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            report: ReportConfig::default(),
        }
    }
}

pub struct RunOutput {
    pub model: ReportModel,
}

/// Loads the table and builds the report model. Nothing is written here.
pub fn run(cfg: &RunConfig) -> Result<RunOutput> {
    let t_load = Instant::now();
    let table = io::load(&cfg.input)
        .with_context(|| format!("failed to load survey export {}", cfg.input.display()))?;
    log_stage("load", t_load);

    if table.rows == 0 {
        warn!(input = %cfg.input.display(), "input has no respondents");
    }
    if table.questions.is_empty() {
        warn!(input = %cfg.input.display(), "no question columns found");
    }

    let t_agg = Instant::now();
    let model = metrics::build_model(&table);
    log_stage("aggregate", t_agg);
    if model.date_range.is_none() && table.rows > 0 {
        warn!(column = %table.timestamp_name, "no parseable timestamps, date range omitted");
    }
    debug!(
        respondents = model.respondents,
        questions = model.questions.len(),
        answers = model.total_answers,
        comments = model.comments.len(),
        "report model ready"
    );

    Ok(RunOutput { model })
}

pub fn log_stage(name: &str, t: Instant) {
    debug!(stage = name, time = %fmt_dur(t.elapsed()), "stage done");
}

fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}
