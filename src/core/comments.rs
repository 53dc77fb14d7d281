use crate::core::model::ResponseTable;
use tracing::debug;

/// Trimmed, non-blank comments in respondent order.
pub fn extract(table: &ResponseTable) -> Vec<String> {
    let Some(column) = &table.comments else {
        return Vec::new();
    };
    let comments: Vec<String> = column
        .values
        .iter()
        .flatten()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    debug!(
        column = %column.name,
        kept = comments.len(),
        blank = column.values.len() - comments.len(),
        "extracted comments"
    );
    comments
}
