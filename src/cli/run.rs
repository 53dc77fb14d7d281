use crate::cli::args::Cli;
use crate::core::engine::{self, RunConfig, log_stage};
use crate::report;
use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::time::Instant;
use tracing::{Level, info};

pub fn entry() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run()
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<()> {
    let config = RunConfig::default();
    generate(&config)?;
    let saved = fs::canonicalize(&config.output).unwrap_or_else(|_| config.output.clone());
    println!("Saved: {}", saved.display());
    Ok(())
}

/// Full pipeline: load, aggregate, render, write.
pub fn generate(config: &RunConfig) -> Result<()> {
    let t0 = Instant::now();
    let output = engine::run(config)?;

    let t_html = Instant::now();
    report::html::write(&config.output, &output.model, &config.report)
        .with_context(|| format!("failed to write {}", config.output.display()))?;
    log_stage("html", t_html);

    let html_size = fs::metadata(&config.output).map(|m| m.len()).unwrap_or(0);
    info!(
        output = %config.output.display(),
        bytes = html_size,
        respondents = output.model.respondents,
        questions = output.model.questions.len(),
        "report written"
    );
    log_stage("total", t0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ReportConfig;
    use crate::core::error::LoadError;

    #[test]
    fn end_to_end_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("numbers.csv");
        fs::write(
            &input,
            "Timestamp,Onboarding was clear,Tools are adequate,Other comments (optional)\n\
             2024/02/01 09:15:00,5,2,Keep it up\n\
             2024/02/03 17:40:00,4,3,\n\
             2024/02/09 11:05:00,5,1,Need better laptops\n",
        )
        .unwrap();
        let config = RunConfig {
            input,
            output: dir.path().join("report.html"),
            report: ReportConfig::default(),
        };

        generate(&config).unwrap();

        let html = fs::read_to_string(&config.output).unwrap();
        assert!(html.contains("Date range: 2024-02-01 → 2024-02-09"));
        assert!(html.contains("Responses: 3"));
        assert!(html.contains("<div class=\"hint\">Onboarding was clear</div>"));
        assert!(html.contains("<div class=\"hint\">Tools are adequate</div>"));
        assert!(html.contains("2 comment(s)"));
        // 14 / 3 and 6 / 3 pooled: 20 / 6
        assert!(html.contains(">3.33</div>"));
    }

    #[test]
    fn missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            input: dir.path().join("absent.csv"),
            output: dir.path().join("report.html"),
            report: ReportConfig::default(),
        };
        let err = generate(&config).unwrap_err();
        let load_err = err
            .chain()
            .find_map(|e| e.downcast_ref::<LoadError>())
            .expect("LoadError in chain");
        assert!(matches!(load_err, LoadError::Io { .. }));
        assert!(!config.output.exists());
    }

    #[test]
    fn malformed_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("numbers.csv");
        fs::write(&input, "Timestamp,Q1\n2024-01-01,4,9,9\n").unwrap();
        let config = RunConfig {
            input,
            output: dir.path().join("report.html"),
            report: ReportConfig::default(),
        };
        assert!(generate(&config).is_err());
        assert!(!config.output.exists());
    }
}
