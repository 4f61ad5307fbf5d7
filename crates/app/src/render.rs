//! Plain-text rendering of chapter progress for the terminal.

use std::fmt::Write as _;

use lifestory_core::progress::{ChapterView, NodeStatus, NodeView, ProgressOverview};

fn status_marker(node: &NodeView) -> &'static str {
    match (node.status, node.is_today) {
        (NodeStatus::Completed, _) => "[x]",
        (NodeStatus::Available, true) => "[>]",
        (NodeStatus::Available, false) => "[ ]",
        (NodeStatus::Locked, _) => "[-]",
    }
}

pub fn overview(overview: &ProgressOverview) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}/{} questions answered, {}/{} chapters open",
        overview.completed_questions,
        overview.total_questions,
        overview.unlocked_chapters,
        overview.total_chapters
    );
    if overview.today.is_empty() {
        let _ = writeln!(out, "Nothing to answer today.");
    } else {
        let ids: Vec<&str> = overview.today.iter().map(|id| id.as_str()).collect();
        let _ = writeln!(out, "Today: {}", ids.join(", "));
    }
    out
}

pub fn chapter(view: &ChapterView) -> String {
    let mut out = String::new();
    let state = if view.unlocked { "" } else { " (locked)" };
    let _ = writeln!(
        out,
        "{}{} {}/{} {}%",
        view.name,
        state,
        view.completed,
        view.total,
        view.percent_complete()
    );
    for node in view.visible_nodes() {
        let _ = writeln!(
            out,
            "  {} {:<16} {}",
            status_marker(node),
            node.question.id().as_str(),
            node.question.text()
        );
    }
    if view.visible.hidden > 0 {
        let _ = writeln!(out, "  ... {} more", view.visible.hidden);
    }
    out
}

pub fn progress(overview_data: &ProgressOverview, views: &[ChapterView]) -> String {
    let mut out = overview(overview_data);
    for view in views {
        out.push('\n');
        out.push_str(&chapter(view));
    }
    out
}
