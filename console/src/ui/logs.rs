//! Log session panel

use crate::streams::SessionView;
use crate::ui::table::session_marker;

/// Render the last `tail` lines of a session under a one-line header
pub fn render_session(view: &SessionView, tail: usize) -> String {
    let mut out = format!(
        "== logs {} {} ==\n",
        view.deployment_id,
        session_marker(view.state)
    );

    let skip = view.lines.len().saturating_sub(tail);
    if skip > 0 {
        out.push_str(&format!("... {} earlier line(s)\n", skip));
    }
    for line in &view.lines[skip..] {
        out.push_str(line);
        out.push('\n');
    }

    if let Some(status) = &view.final_status {
        out.push_str(&format!("(finished: {})\n", status));
    }
    out
}
