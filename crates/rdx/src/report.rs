// ai
//! 🍽️ Reports: comfy tables for humans who want to see what happened.
//!
//! Two of them: a preview of an artifact (the first N rows, titles trimmed so
//! the terminal survives), and the one-glance summary printed after `run`.

use std::time::Duration;

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::common::{PostTable, created_utc_format};
use crate::pipelines::{Handoff, UploadOutcome};
use crate::progress::{format_duration, format_number};

const TITLE_WIDTH: usize = 60;

/// 📋 What one `run` did, start to finish.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub handoff: Handoff,
    pub outcome: UploadOutcome,
    pub elapsed: Duration,
}

/// 🔍 The first `max_rows` rows of an artifact, every column, header included.
pub fn preview_table(table: &PostTable, max_rows: usize) -> Table {
    let mut the_table = Table::new();
    the_table.load_preset(UTF8_FULL_CONDENSED);
    the_table.set_content_arrangement(ContentArrangement::Dynamic);
    the_table.set_header(table.columns().to_vec());

    for row in table.rows.iter().take(max_rows) {
        the_table.add_row(vec![
            Cell::new(&row.id),
            Cell::new(shorten(&row.title, TITLE_WIDTH)),
            Cell::new(row.score).set_alignment(CellAlignment::Right),
            Cell::new(row.num_comments).set_alignment(CellAlignment::Right),
            Cell::new(&row.author),
            Cell::new(
                row.created_utc
                    .as_ref()
                    .map(created_utc_format::render)
                    .unwrap_or_default(),
            ),
            Cell::new(&row.url),
            Cell::new(row.over_18),
            Cell::new(row.edited),
            Cell::new(row.spoiler),
            Cell::new(row.stickied),
        ]);
    }
    the_table
}

/// 📋 The after-action summary for a `run`.
pub fn run_report_table(report: &RunReport) -> Table {
    let mut the_table = Table::new();
    the_table.load_preset(UTF8_FULL_CONDENSED);
    the_table.set_content_arrangement(ContentArrangement::Dynamic);
    the_table.set_header(vec!["run", "value"]);

    let the_rows: Vec<(&str, String)> = vec![
        ("run id", report.handoff.run_id.to_string()),
        ("file", report.handoff.file_name.clone()),
        ("rows", format_number(report.handoff.row_count as u64)),
        ("artifact", report.handoff.artifact_path.display().to_string()),
        ("extract", report.handoff.status.to_string()),
        ("upload", report.outcome.to_string()),
        ("elapsed", format_duration(report.elapsed)),
    ];
    for (label, value) in the_rows {
        the_table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    the_table
}

fn shorten(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut the_short: String = text.chars().take(width.saturating_sub(1)).collect();
    the_short.push('…');
    the_short
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BucketState;
    use crate::common::NormalizedPost;
    use uuid::Uuid;

    fn a_post(id: &str, title: &str) -> NormalizedPost {
        NormalizedPost {
            id: id.to_string(),
            title: title.to_string(),
            score: 1_234,
            num_comments: 5,
            author: "None".to_string(),
            created_utc: None,
            url: String::new(),
            over_18: false,
            edited: true,
            spoiler: false,
            stickied: false,
        }
    }

    #[test]
    fn the_one_where_the_preview_knows_when_to_stop() {
        let the_table = PostTable::new(vec![a_post("p1", "first"), a_post("p2", "second")]);
        let the_render = preview_table(&the_table, 1).to_string();

        assert!(the_render.contains("num_comments"));
        assert!(the_render.contains("p1"));
        assert!(!the_render.contains("p2"));
    }

    #[test]
    fn the_one_where_long_titles_get_a_haircut() {
        let the_title = "x".repeat(200);
        assert_eq!(shorten(&the_title, 10).chars().count(), 10);
        assert!(shorten(&the_title, 10).ends_with('…'));
        assert_eq!(shorten("short", 10), "short");
    }

    #[test]
    fn the_one_where_the_report_tells_the_whole_story() {
        let the_report = RunReport {
            handoff: Handoff::succeeded(
                Uuid::nil(),
                "reddit_20240117",
                "out/reddit_20240117.csv",
                1_500,
            ),
            outcome: UploadOutcome::Uploaded {
                bucket: "lake".to_string(),
                key: "raw/reddit_20240117.csv".to_string(),
                bucket_state: Some(BucketState::Created),
            },
            elapsed: Duration::from_secs(75),
        };
        let the_render = run_report_table(&the_report).to_string();

        assert!(the_render.contains("1,500"));
        assert!(the_render.contains("succeeded"));
        assert!(the_render.contains("uploaded to lake/raw/reddit_20240117.csv"));
        assert!(the_render.contains("01:15"));
    }
}
