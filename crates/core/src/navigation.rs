use serde::Serialize;
use std::fmt;

use crate::model::{ChapterName, QuestionId};
use crate::progress::{ChapterView, NodeStatus};

/// Why a click on a question did not navigate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ClickRejection {
    Locked {
        question_id: QuestionId,
        chapter: ChapterName,
    },
    UnknownQuestion {
        question_id: QuestionId,
    },
}

impl fmt::Display for ClickRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClickRejection::Locked { chapter, .. } => write!(
                f,
                "locked: finish the previous question(s) in {chapter} first"
            ),
            ClickRejection::UnknownQuestion { question_id } => {
                write!(f, "no question with id {question_id}")
            }
        }
    }
}

/// Outcome of clicking a node on the progress path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    /// Open the answer-recording view for this question.
    Navigate { question_id: QuestionId },
    /// Show a transient notice; stay where we are.
    Rejected(ClickRejection),
}

impl ClickOutcome {
    #[must_use]
    pub fn is_navigate(&self) -> bool {
        matches!(self, ClickOutcome::Navigate { .. })
    }
}

/// Resolves a click against freshly computed views.
///
/// Locked nodes reject; available and completed nodes navigate.
#[must_use]
pub fn resolve_click(views: &[ChapterView], question_id: &QuestionId) -> ClickOutcome {
    let found = views
        .iter()
        .find_map(|view| view.node(question_id).map(|node| (view, node)));

    match found {
        None => ClickOutcome::Rejected(ClickRejection::UnknownQuestion {
            question_id: question_id.clone(),
        }),
        Some((view, node)) => match node.status {
            NodeStatus::Locked => ClickOutcome::Rejected(ClickRejection::Locked {
                question_id: question_id.clone(),
                chapter: view.name.clone(),
            }),
            NodeStatus::Available | NodeStatus::Completed => ClickOutcome::Navigate {
                question_id: question_id.clone(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionDraft;
    use crate::progress::{ProgressSettings, compute_chapter_views, group_into_chapters};
    use std::collections::{BTreeMap, BTreeSet};

    fn views(completed: &[&str]) -> Vec<ChapterView> {
        let questions = (1..=6).map(|i| {
            QuestionDraft::new(format!("q{i}"), format!("Question {i}"))
                .in_chapter("Childhood")
                .with_order(i)
                .validate()
                .unwrap()
        });
        let completed: BTreeSet<QuestionId> = completed
            .iter()
            .map(|id| QuestionId::new(*id).unwrap())
            .collect();
        compute_chapter_views(
            &group_into_chapters(questions),
            &completed,
            &BTreeMap::new(),
            &ProgressSettings::default(),
        )
    }

    fn id(raw: &str) -> QuestionId {
        QuestionId::new(raw).unwrap()
    }

    #[test]
    fn available_node_navigates() {
        let outcome = resolve_click(&views(&[]), &id("q1"));
        assert_eq!(outcome, ClickOutcome::Navigate { question_id: id("q1") });
    }

    #[test]
    fn completed_node_navigates_for_re_recording() {
        assert!(resolve_click(&views(&["q1"]), &id("q1")).is_navigate());
    }

    #[test]
    fn locked_node_is_rejected_with_notice() {
        let outcome = resolve_click(&views(&[]), &id("q6"));
        let ClickOutcome::Rejected(rejection) = outcome else {
            panic!("expected rejection");
        };
        assert!(matches!(rejection, ClickRejection::Locked { .. }));
        assert!(rejection.to_string().starts_with("locked"));
    }

    #[test]
    fn unknown_node_is_rejected() {
        let outcome = resolve_click(&views(&[]), &id("nope"));
        assert_eq!(
            outcome,
            ClickOutcome::Rejected(ClickRejection::UnknownQuestion {
                question_id: id("nope")
            })
        );
    }
}
