use chrono::{NaiveDate, NaiveDateTime};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Good,
    Neutral,
    Attention,
}

impl Status {
    /// Threshold rule for a 1..5 mean: `>= 4.0` good, `>= 3.0` neutral,
    /// otherwise attention. A missing mean is neutral.
    pub fn from_mean(mean: Option<f64>) -> Status {
        match mean {
            Some(m) if m >= 4.0 => Status::Good,
            Some(m) if m >= 3.0 => Status::Neutral,
            Some(m) if m.is_finite() => Status::Attention,
            _ => Status::Neutral,
        }
    }

    pub fn as_str_lower(self) -> &'static str {
        match self {
            Status::Good => "good",
            Status::Neutral => "neutral",
            Status::Attention => "attention",
        }
    }
}

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;
pub const SCORE_BUCKETS: usize = (MAX_SCORE - MIN_SCORE + 1) as usize;

pub struct QuestionColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl QuestionColumn {
    pub fn answered(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }
}

pub struct CommentColumn {
    pub name: String,
    pub values: Vec<Option<String>>,
}

/// One survey export held in memory. Every column vector has `rows` entries.
pub struct ResponseTable {
    pub rows: usize,
    pub timestamp_name: String,
    pub timestamps: Vec<Option<NaiveDateTime>>,
    pub comments: Option<CommentColumn>,
    pub questions: Vec<QuestionColumn>,
}

/// Counts of rounded scores in `1..=5`; buckets never seen stay at zero.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScoreHistogram {
    counts: [u64; SCORE_BUCKETS],
}

impl ScoreHistogram {
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut hist = ScoreHistogram::default();
        for v in values {
            hist.add(v);
        }
        hist
    }

    /// Rounds half to even; anything outside 1..=5 after rounding is ignored.
    pub fn add(&mut self, value: f64) {
        let rounded = value.round_ties_even();
        if rounded >= MIN_SCORE as f64 && rounded <= MAX_SCORE as f64 {
            self.counts[rounded as usize - MIN_SCORE as usize] += 1;
        }
    }

    pub fn merge(&mut self, other: &ScoreHistogram) {
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
    }

    pub fn count(&self, score: u8) -> u64 {
        if (MIN_SCORE..=MAX_SCORE).contains(&score) {
            self.counts[(score - MIN_SCORE) as usize]
        } else {
            0
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `(score, count)` pairs in ascending score order.
    pub fn buckets(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        (MIN_SCORE..=MAX_SCORE).map(move |s| (s, self.count(s)))
    }
}

pub struct QuestionSummary {
    pub name: String,
    pub answered: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub histogram: ScoreHistogram,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Extreme {
    pub name: String,
    pub mean: f64,
}

pub struct ReportModel {
    pub respondents: usize,
    pub date_range: Option<DateRange>,
    pub questions: Vec<QuestionSummary>,
    pub overall_mean: Option<f64>,
    pub overall: ScoreHistogram,
    pub total_answers: usize,
    pub best: Option<Extreme>,
    pub worst: Option<Extreme>,
    pub comments: Vec<String>,
}

pub fn median_of(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_thresholds() {
        assert_eq!(Status::from_mean(Some(4.0)), Status::Good);
        assert_eq!(Status::from_mean(Some(4.7)), Status::Good);
        assert_eq!(Status::from_mean(Some(3.0)), Status::Neutral);
        assert_eq!(Status::from_mean(Some(3.99)), Status::Neutral);
        assert_eq!(Status::from_mean(Some(2.99)), Status::Attention);
        assert_eq!(Status::from_mean(None), Status::Neutral);
        assert_eq!(Status::from_mean(Some(f64::NAN)), Status::Neutral);
        assert_eq!(Status::Attention.as_str_lower(), "attention");
    }

    #[test]
    fn histogram_rounds_half_to_even_and_clips() {
        let hist = ScoreHistogram::from_values([1.0, 2.5, 3.5, 4.4, 5.0, 0.2, 6.0, 5.4]);
        assert_eq!(hist.count(1), 1);
        assert_eq!(hist.count(2), 1);
        assert_eq!(hist.count(3), 0);
        assert_eq!(hist.count(4), 2);
        assert_eq!(hist.count(5), 2);
        assert_eq!(hist.total(), 6);
        assert_eq!(hist.count(0), 0);
        assert_eq!(hist.count(6), 0);
    }

    #[test]
    fn histogram_zero_fills_buckets() {
        let hist = ScoreHistogram::from_values([5.0, 5.0]);
        let buckets: Vec<(u8, u64)> = hist.buckets().collect();
        assert_eq!(buckets, vec![(1, 0), (2, 0), (3, 0), (4, 0), (5, 2)]);
    }

    #[test]
    fn median_odd_even_empty() {
        assert_eq!(median_of(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median_of(&mut [4.0, 1.0, 2.0, 5.0]), Some(3.0));
        assert_eq!(median_of(&mut []), None);
    }
}
