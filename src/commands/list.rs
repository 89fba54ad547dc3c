// ABOUTME: List command implementation.
// ABOUTME: Prints each running container with its current and latest digests.

use reimage::error::Result;
use reimage::output::{Output, OutputMode};
use reimage::runtime::BollardRuntime;
use reimage::types::ImageDigest;
use reimage::update::{StatusRow, survey};

const HEADERS: [&str; 4] = ["NAME", "CURRENT VERSION", "LATEST AVAILABLE", "STATUS"];

/// Show whether an update is available for each running container.
pub async fn list(runtime: &BollardRuntime, output: &Output) -> Result<()> {
    output.progress("Checking running containers...");
    let rows = survey(runtime).await?;

    if output.mode() == OutputMode::Json {
        for row in &rows {
            output.record(row);
        }
        return Ok(());
    }

    if rows.is_empty() {
        output.line("No running containers.");
        return Ok(());
    }

    for line in render_table(&rows) {
        output.line(&line);
    }
    Ok(())
}

fn short_digest(digest: Option<&ImageDigest>) -> String {
    digest.map_or_else(|| "-".to_string(), |d| d.short().to_string())
}

fn render_table(rows: &[StatusRow]) -> Vec<String> {
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            [
                row.name.to_string(),
                format!("{} ({})", row.image, short_digest(row.current.as_ref())),
                short_digest(row.latest.as_ref()),
                row.staleness.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let format_row = |row: [&str; 4]| {
        let mut line = String::new();
        for (i, (cell, width)) in row.iter().zip(widths).enumerate() {
            if i + 1 == row.len() {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{:<width$}  ", cell, width = width));
            }
        }
        line
    };

    let mut lines = Vec::with_capacity(cells.len() + 1);
    lines.push(format_row(HEADERS));
    for row in &cells {
        lines.push(format_row(row.each_ref().map(String::as_str)));
    }
    lines
}
