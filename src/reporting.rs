use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::stats::CycleStats;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const BLOCK_DELIMITER: &str = "---";

/// Renders one cycle as a log block:
///
/// ```text
/// Run started at: 2024-05-01 12:00:00
/// a.test has 50% availability percentage
/// ---
/// ```
pub fn format_report(started_at: NaiveDateTime, stats: &CycleStats) -> String {
    let mut block = String::new();
    let _ = writeln!(
        block,
        "Run started at: {}",
        started_at.format(TIMESTAMP_FORMAT)
    );
    for (domain, domain_stats) in stats.iter() {
        let _ = writeln!(
            block,
            "{} has {}% availability percentage",
            domain,
            domain_stats.availability_percent()
        );
    }
    block.push_str(BLOCK_DELIMITER);
    block.push('\n');
    block
}
