use crate::models::{DailyRecord, HistorySummary, TimelineEntry};

/// Days without a report count as a score of zero in the average.
pub fn build_history_summary(history: &[DailyRecord]) -> HistorySummary {
    let days_logged = history.len();
    let total: u32 = history
        .iter()
        .map(|record| record.report.as_ref().map_or(0, |report| u32::from(report.score)))
        .sum();
    let average_score = if days_logged == 0 {
        0
    } else {
        (f64::from(total) / days_logged as f64).round() as u32
    };

    let timeline = history
        .iter()
        .rev()
        .map(|record| TimelineEntry {
            date: record.date,
            weekday: weekday_name(record),
            score: record.report.as_ref().map(|report| report.score),
            summary: record.report.as_ref().map(|report| report.summary.clone()),
            tips: record
                .report
                .as_ref()
                .map(|report| report.tips.clone())
                .unwrap_or_default(),
        })
        .collect();

    HistorySummary {
        days_logged,
        average_score,
        timeline,
    }
}

fn weekday_name(record: &DailyRecord) -> String {
    record.date.format("%A").to_string()
}
