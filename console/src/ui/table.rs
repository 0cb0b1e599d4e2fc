//! Plain-text deployment table

use colored::Colorize;

use crate::models::deployment::Deployment;
use crate::streams::SessionState;
use crate::sync::store::Snapshot;

const HEADERS: [&str; 6] = ["NAME", "STATUS", "HEAD IP", "WORKERS", "CREATED", "ID"];

/// Render a snapshot, newest deployment first
pub fn render(snapshot: &Snapshot, color: bool) -> String {
    if snapshot.loading {
        return "Loading deployments...\n".to_string();
    }
    if snapshot.is_empty() {
        return "No deployments yet\n".to_string();
    }

    let mut rows: Vec<&Deployment> = snapshot.deployments.iter().collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let cells: Vec<[String; 6]> = rows.iter().map(|d| row_cells(d)).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = HEADERS
        .iter()
        .zip(widths.iter())
        .map(|(h, w)| format!("{:<w$}", h, w = *w))
        .collect();
    push_line(&mut out, &header);

    for (deployment, row) in rows.iter().zip(cells.iter()) {
        let padded: Vec<String> = row
            .iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(i, (cell, w))| {
                let cell = format!("{:<w$}", cell, w = *w);
                if color && i == 1 {
                    paint_status(deployment, &cell)
                } else {
                    cell
                }
            })
            .collect();
        push_line(&mut out, &padded);
    }

    let terminated = snapshot.terminated_count();
    if terminated > 0 {
        out.push_str(&format!(
            "\n{} terminated deployment(s); --clear-terminated removes them\n",
            terminated
        ));
    }
    out
}

/// One-line marker for a deployment's log session
pub fn session_marker(state: SessionState) -> &'static str {
    match state {
        SessionState::Open => "[streaming]",
        SessionState::Completed => "[complete]",
        SessionState::Closed => "[closed]",
    }
}

fn row_cells(deployment: &Deployment) -> [String; 6] {
    [
        deployment.name.clone(),
        deployment.status.to_string(),
        deployment
            .head_ip
            .clone()
            .unwrap_or_else(|| "N/A".to_string()),
        deployment.worker_count.to_string(),
        deployment
            .created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string()),
        deployment.id.clone(),
    ]
}

fn paint_status(deployment: &Deployment, cell: &str) -> String {
    match deployment.status.as_str() {
        "running" => cell.green().to_string(),
        "terminated" => cell.dimmed().to_string(),
        "failed" | "error" => cell.red().to_string(),
        _ => cell.yellow().to_string(),
    }
}

fn push_line(out: &mut String, cells: &[String]) {
    out.push_str(cells.join("  ").trim_end());
    out.push('\n');
}
