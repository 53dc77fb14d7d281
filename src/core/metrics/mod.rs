use crate::core::comments;
use crate::core::model::{
    DateRange, Extreme, QuestionColumn, QuestionSummary, ReportModel, ResponseTable,
    ScoreHistogram, median_of,
};

pub fn summarize_question(column: &QuestionColumn) -> QuestionSummary {
    let mut values: Vec<f64> = column.answered().collect();
    let answered = values.len();
    let histogram = ScoreHistogram::from_values(values.iter().copied());
    let (mean, min, max) = if values.is_empty() {
        (None, None, None)
    } else {
        let sum: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (Some(sum / answered as f64), Some(min), Some(max))
    };
    let median = median_of(&mut values);
    QuestionSummary {
        name: column.name.clone(),
        answered,
        mean,
        median,
        min,
        max,
        histogram,
    }
}

/// Mean over every non-missing answer of every question.
pub fn overall_mean(table: &ResponseTable) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in table.questions.iter().flat_map(|q| q.answered()) {
        sum += v;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

pub fn pooled_histogram(questions: &[QuestionSummary]) -> ScoreHistogram {
    let mut pooled = ScoreHistogram::default();
    for q in questions {
        pooled.merge(&q.histogram);
    }
    pooled
}

/// Highest and lowest mean; on ties the earlier question wins. Questions
/// without any answers are skipped.
pub fn best_and_worst(questions: &[QuestionSummary]) -> (Option<Extreme>, Option<Extreme>) {
    let mut best: Option<&QuestionSummary> = None;
    let mut worst: Option<&QuestionSummary> = None;
    for q in questions {
        let Some(mean) = q.mean else { continue };
        if best.and_then(|b| b.mean).is_none_or(|m| mean > m) {
            best = Some(q);
        }
        if worst.and_then(|w| w.mean).is_none_or(|m| mean < m) {
            worst = Some(q);
        }
    }
    let extreme = |q: &QuestionSummary| {
        q.mean.map(|mean| Extreme {
            name: q.name.clone(),
            mean,
        })
    };
    (best.and_then(extreme), worst.and_then(extreme))
}

pub fn date_range(table: &ResponseTable) -> Option<DateRange> {
    let mut parsed = table.timestamps.iter().flatten();
    let first = parsed.next()?;
    let (min, max) = parsed.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));
    Some(DateRange {
        start: min.date(),
        end: max.date(),
    })
}

pub fn build_model(table: &ResponseTable) -> ReportModel {
    let questions: Vec<QuestionSummary> = table.questions.iter().map(summarize_question).collect();
    let overall = pooled_histogram(&questions);
    // Same population as the pie: answers that round into 1..=5.
    let total_answers = overall.total() as usize;
    let (best, worst) = best_and_worst(&questions);
    ReportModel {
        respondents: table.rows,
        date_range: date_range(table),
        overall_mean: overall_mean(table),
        overall,
        total_answers,
        best,
        worst,
        comments: comments::extract(table),
        questions,
    }
}
