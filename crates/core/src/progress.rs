//! Chapter unlock and progress windowing.
//!
//! Turns an ordered chapter list and the set of answered question ids into
//! per-chapter views: which questions are locked, which are available right
//! now, which are done, and which chapters are open at all.
//!
//! Everything here is a pure function of its arguments.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::model::{Chapter, ChapterName, Question, QuestionId};

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressSettingsError {
    #[error("unlock window must be > 0")]
    InvalidUnlockWindow,

    #[error("max visible available must be > 0")]
    InvalidMaxVisibleAvailable,

    #[error("next chapter threshold must be > 0")]
    InvalidNextChapterThreshold,
}

/// Deployment-time knobs for the unlock logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSettings {
    unlock_window: usize,
    max_visible_available: usize,
    next_chapter_threshold: usize,
}

impl ProgressSettings {
    pub const DEFAULT_UNLOCK_WINDOW: usize = 5;
    pub const DEFAULT_MAX_VISIBLE_AVAILABLE: usize = 5;
    pub const DEFAULT_NEXT_CHAPTER_THRESHOLD: usize = 5;

    /// # Errors
    ///
    /// Returns `ProgressSettingsError` if any value is zero.
    pub fn new(
        unlock_window: usize,
        max_visible_available: usize,
        next_chapter_threshold: usize,
    ) -> Result<Self, ProgressSettingsError> {
        if unlock_window == 0 {
            return Err(ProgressSettingsError::InvalidUnlockWindow);
        }
        if max_visible_available == 0 {
            return Err(ProgressSettingsError::InvalidMaxVisibleAvailable);
        }
        if next_chapter_threshold == 0 {
            return Err(ProgressSettingsError::InvalidNextChapterThreshold);
        }
        Ok(Self {
            unlock_window,
            max_visible_available,
            next_chapter_threshold,
        })
    }

    /// Max number of simultaneously available questions per chapter.
    #[must_use]
    pub fn unlock_window(&self) -> usize {
        self.unlock_window
    }

    /// Max number of questions surfaced in a chapter's "today" list.
    #[must_use]
    pub fn max_visible_available(&self) -> usize {
        self.max_visible_available
    }

    /// Completed questions in a chapter needed to open the next one.
    #[must_use]
    pub fn next_chapter_threshold(&self) -> usize {
        self.next_chapter_threshold
    }
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            unlock_window: Self::DEFAULT_UNLOCK_WINDOW,
            max_visible_available: Self::DEFAULT_MAX_VISIBLE_AVAILABLE,
            next_chapter_threshold: Self::DEFAULT_NEXT_CHAPTER_THRESHOLD,
        }
    }
}

//
// ─── VIEW TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Locked,
    Available,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub question: Question,
    pub index: usize,
    pub status: NodeStatus,
    pub is_today: bool,
}

/// Inclusive index range of the unlock window inside a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockWindow {
    pub start: usize,
    pub end: usize,
}

impl UnlockWindow {
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }
}

/// Progressive-disclosure split: `shown` leading nodes, `hidden` behind a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleWindow {
    pub shown: usize,
    pub hidden: usize,
}

impl VisibleWindow {
    fn new(shown: usize, total: usize) -> Self {
        let shown = shown.min(total);
        Self {
            shown,
            hidden: total - shown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterView {
    pub name: ChapterName,
    pub total: usize,
    /// Completed questions counted toward the threshold. Always 0 while locked.
    pub completed: usize,
    pub unlocked: bool,
    pub expanded: bool,
    pub nodes: Vec<NodeView>,
    pub window: Option<UnlockWindow>,
    pub today: Vec<QuestionId>,
    pub visible: VisibleWindow,
}

impl ChapterView {
    /// Nodes the UI should render before the "N more" affordance.
    #[must_use]
    pub fn visible_nodes(&self) -> &[NodeView] {
        self.nodes.get(..self.visible.shown).unwrap_or(&self.nodes)
    }

    #[must_use]
    pub fn node(&self, id: &QuestionId) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.question.id() == id)
    }

    #[must_use]
    pub fn available_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.status == NodeStatus::Available)
            .count()
    }

    /// Whether this chapter opens the one after it.
    #[must_use]
    pub fn is_cleared(&self, settings: &ProgressSettings) -> bool {
        self.completed >= settings.next_chapter_threshold()
    }

    /// Integer percentage for progress bars; 0 for an empty chapter.
    #[must_use]
    pub fn percent_complete(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        u8::try_from(self.completed.min(self.total) * 100 / self.total).unwrap_or(100)
    }
}

/// Whole-project roll-up used by status lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressOverview {
    pub total_questions: usize,
    pub completed_questions: usize,
    pub total_chapters: usize,
    pub unlocked_chapters: usize,
    pub today: Vec<QuestionId>,
}

//
// ─── GROUPING ──────────────────────────────────────────────────────────────────
//

/// Groups a flat catalog into ordered chapters.
///
/// Chapters follow `ChapterName` order; nodes inside a chapter follow
/// `order`, then id.
pub fn group_into_chapters(questions: impl IntoIterator<Item = Question>) -> Vec<Chapter> {
    let mut groups: BTreeMap<ChapterName, Vec<Question>> = BTreeMap::new();
    for question in questions {
        groups
            .entry(question.chapter().clone())
            .or_default()
            .push(question);
    }

    groups
        .into_iter()
        .map(|(name, mut nodes)| {
            nodes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
            Chapter { name, nodes }
        })
        .collect()
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Computes the lock state of every question, chapter by chapter.
///
/// The first chapter is always unlocked. Each later chapter is unlocked iff
/// the chapter before it has at least `next_chapter_threshold` completed
/// questions. Inside an unlocked chapter, the available questions form a
/// window of at most `unlock_window` nodes starting at the first unanswered
/// one. Nodes in a locked chapter are all locked and contribute nothing to
/// the threshold, even when answers exist for them.
///
/// `expanded` only affects [`ChapterView::visible`].
#[must_use]
pub fn compute_chapter_views(
    chapters: &[Chapter],
    completed: &BTreeSet<QuestionId>,
    expanded: &BTreeMap<ChapterName, bool>,
    settings: &ProgressSettings,
) -> Vec<ChapterView> {
    let mut views = Vec::with_capacity(chapters.len());
    let mut previous_cleared = true;

    for (position, chapter) in chapters.iter().enumerate() {
        let unlocked = position == 0 || previous_cleared;
        let is_expanded = expanded.get(&chapter.name).copied().unwrap_or(false);

        let view = if unlocked {
            unlocked_view(chapter, completed, is_expanded, settings)
        } else {
            locked_view(chapter, is_expanded, settings)
        };

        previous_cleared = view.is_cleared(settings);
        views.push(view);
    }

    views
}

fn unlocked_view(
    chapter: &Chapter,
    completed: &BTreeSet<QuestionId>,
    expanded: bool,
    settings: &ProgressSettings,
) -> ChapterView {
    let total = chapter.nodes.len();
    let is_done = |q: &Question| completed.contains(q.id());

    let completed_count = chapter.nodes.iter().filter(|q| is_done(q)).count();
    let first_incomplete = chapter.nodes.iter().position(|q| !is_done(q));

    // With everything answered the window collapses onto the last node.
    let window = total.checked_sub(1).map(|last| {
        let start = first_incomplete.unwrap_or(last);
        let end = last.min(start.saturating_add(settings.unlock_window().saturating_sub(1)));
        UnlockWindow { start, end }
    });

    let nodes: Vec<NodeView> = chapter
        .nodes
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let status = if is_done(question) {
                NodeStatus::Completed
            } else if window.is_some_and(|w| w.contains(index)) {
                NodeStatus::Available
            } else {
                NodeStatus::Locked
            };
            NodeView {
                question: question.clone(),
                index,
                status,
                is_today: status == NodeStatus::Available,
            }
        })
        .collect();

    let today = nodes
        .iter()
        .filter(|n| n.status == NodeStatus::Available)
        .take(settings.max_visible_available())
        .map(|n| n.question.id().clone())
        .collect();

    let shown = if expanded {
        total
    } else {
        match (first_incomplete, window) {
            (Some(first), Some(w)) => {
                (w.end + 1).max(first.saturating_add(settings.max_visible_available()))
            }
            _ => total,
        }
    };

    ChapterView {
        name: chapter.name.clone(),
        total,
        completed: completed_count,
        unlocked: true,
        expanded,
        nodes,
        window,
        today,
        visible: VisibleWindow::new(shown, total),
    }
}

fn locked_view(chapter: &Chapter, expanded: bool, settings: &ProgressSettings) -> ChapterView {
    let total = chapter.nodes.len();
    let nodes = chapter
        .nodes
        .iter()
        .enumerate()
        .map(|(index, question)| NodeView {
            question: question.clone(),
            index,
            status: NodeStatus::Locked,
            is_today: false,
        })
        .collect();

    let shown = if expanded {
        total
    } else {
        settings.max_visible_available()
    };

    ChapterView {
        name: chapter.name.clone(),
        total,
        completed: 0,
        unlocked: false,
        expanded,
        nodes,
        window: None,
        today: Vec::new(),
        visible: VisibleWindow::new(shown, total),
    }
}

/// Rolls chapter views up into project totals.
///
/// `today` is the concatenation of each chapter's today list, capped at
/// `max_visible_available`.
#[must_use]
pub fn summarize(views: &[ChapterView], settings: &ProgressSettings) -> ProgressOverview {
    ProgressOverview {
        total_questions: views.iter().map(|v| v.total).sum(),
        completed_questions: views.iter().map(|v| v.completed).sum(),
        total_chapters: views.len(),
        unlocked_chapters: views.iter().filter(|v| v.unlocked).count(),
        today: views
            .iter()
            .flat_map(|v| v.today.iter().cloned())
            .take(settings.max_visible_available())
            .collect(),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanonicalChapter, QuestionDraft};

    fn question(id: &str, chapter: &str, order: i64) -> Question {
        QuestionDraft::new(id, format!("Question {id}"))
            .in_chapter(chapter)
            .with_order(order)
            .validate()
            .unwrap()
    }

    /// Two canonical chapters of six questions each: `c1-1..=c1-6`, `c2-1..=c2-6`.
    fn two_chapters() -> Vec<Chapter> {
        let mut questions = Vec::new();
        for i in 1..=6 {
            questions.push(question(&format!("c1-{i}"), "Childhood", i));
            questions.push(question(&format!("c2-{i}"), "Elementary School", i));
        }
        group_into_chapters(questions)
    }

    fn ids(prefix: &str, range: std::ops::RangeInclusive<u32>) -> BTreeSet<QuestionId> {
        range
            .map(|i| QuestionId::new(format!("{prefix}-{i}")).unwrap())
            .collect()
    }

    fn statuses(view: &ChapterView) -> Vec<NodeStatus> {
        view.nodes.iter().map(|n| n.status).collect()
    }

    fn compute(chapters: &[Chapter], completed: &BTreeSet<QuestionId>) -> Vec<ChapterView> {
        compute_chapter_views(
            chapters,
            completed,
            &BTreeMap::new(),
            &ProgressSettings::default(),
        )
    }

    use NodeStatus::{Available as A, Completed as C, Locked as L};

    #[test]
    fn settings_reject_zero_values() {
        assert_eq!(
            ProgressSettings::new(0, 5, 5),
            Err(ProgressSettingsError::InvalidUnlockWindow)
        );
        assert_eq!(
            ProgressSettings::new(5, 0, 5),
            Err(ProgressSettingsError::InvalidMaxVisibleAvailable)
        );
        assert_eq!(
            ProgressSettings::new(5, 5, 0),
            Err(ProgressSettingsError::InvalidNextChapterThreshold)
        );
        assert_eq!(ProgressSettings::new(5, 5, 5), Ok(ProgressSettings::default()));
    }

    #[test]
    fn grouping_orders_chapters_and_nodes() {
        let chapters = group_into_chapters(vec![
            question("z", "Hobbies", 1),
            question("b", "Career", 2),
            question("a", "Career", 2),
            question("c", "Career", 1),
            question("d", "Childhood", 9),
            QuestionDraft::new("e", "No chapter").validate().unwrap(),
        ]);

        let names: Vec<&str> = chapters.iter().map(|c| c.name.label()).collect();
        assert_eq!(names, vec!["Childhood", "Career", "Hobbies", "Uncategorized"]);

        let career: Vec<&str> = chapters[1].nodes.iter().map(|q| q.id().as_str()).collect();
        assert_eq!(career, vec!["c", "a", "b"]);
    }

    #[test]
    fn empty_catalog_yields_no_views() {
        assert!(compute(&[], &BTreeSet::new()).is_empty());
        assert!(group_into_chapters(Vec::new()).is_empty());
    }

    #[test]
    fn fresh_project_opens_only_first_window() {
        let views = compute(&two_chapters(), &BTreeSet::new());

        assert!(views[0].unlocked);
        assert_eq!(statuses(&views[0]), vec![A, A, A, A, A, L]);
        assert_eq!(views[0].window, Some(UnlockWindow { start: 0, end: 4 }));
        assert_eq!(views[0].today, ids("c1", 1..=5).into_iter().collect::<Vec<_>>());

        assert!(!views[1].unlocked);
        assert_eq!(statuses(&views[1]), vec![L; 6]);
        assert!(views[1].today.is_empty());
    }

    #[test]
    fn reaching_threshold_unlocks_next_chapter() {
        let views = compute(&two_chapters(), &ids("c1", 1..=5));

        assert_eq!(statuses(&views[0]), vec![C, C, C, C, C, A]);
        assert_eq!(views[0].window, Some(UnlockWindow { start: 5, end: 5 }));
        assert_eq!(views[0].completed, 5);

        assert!(views[1].unlocked);
        assert_eq!(statuses(&views[1]), vec![A, A, A, A, A, L]);
    }

    #[test]
    fn below_threshold_keeps_next_chapter_locked() {
        let views = compute(&two_chapters(), &ids("c1", 1..=4));

        assert_eq!(statuses(&views[0]), vec![C, C, C, C, A, A]);
        assert!(!views[1].unlocked);
        assert_eq!(statuses(&views[1]), vec![L; 6]);
    }

    #[test]
    fn threshold_counts_answers_out_of_order() {
        // Questions 2..=6 answered, question 1 still open.
        let views = compute(&two_chapters(), &ids("c1", 2..=6));

        assert_eq!(statuses(&views[0]), vec![A, C, C, C, C, C]);
        assert!(views[1].unlocked);
    }

    #[test]
    fn answers_inside_locked_chapter_are_not_credited() {
        let mut completed = ids("c1", 1..=2);
        completed.extend(ids("c2", 1..=6));
        let views = compute(&two_chapters(), &completed);

        assert!(!views[1].unlocked);
        assert_eq!(views[1].completed, 0);
        assert_eq!(statuses(&views[1]), vec![L; 6]);
    }

    #[test]
    fn locked_chapter_breaks_the_chain() {
        let mut questions = Vec::new();
        for i in 1..=5 {
            questions.push(question(&format!("c1-{i}"), "Childhood", i));
            questions.push(question(&format!("c2-{i}"), "Elementary School", i));
            questions.push(question(&format!("c3-{i}"), "Teenage Years", i));
        }
        let chapters = group_into_chapters(questions);

        // Chapter 3 is fully answered but chapter 2 never opened.
        let mut completed = ids("c1", 1..=3);
        completed.extend(ids("c3", 1..=5));
        let views = compute(&chapters, &completed);

        assert_eq!(
            views.iter().map(|v| v.unlocked).collect::<Vec<_>>(),
            vec![true, false, false]
        );
    }

    #[test]
    fn fully_answered_chapter_anchors_window_on_last_node() {
        let views = compute(&two_chapters(), &ids("c1", 1..=6));

        assert_eq!(statuses(&views[0]), vec![C; 6]);
        assert_eq!(views[0].window, Some(UnlockWindow { start: 5, end: 5 }));
        assert!(views[0].today.is_empty());
        assert_eq!(views[0].visible, VisibleWindow { shown: 6, hidden: 0 });
        assert_eq!(views[0].percent_complete(), 100);
    }

    #[test]
    fn today_list_is_capped_separately_from_window() {
        let settings = ProgressSettings::new(5, 2, 5).unwrap();
        let views = compute_chapter_views(
            &two_chapters(),
            &BTreeSet::new(),
            &BTreeMap::new(),
            &settings,
        );

        assert_eq!(views[0].available_count(), 5);
        assert_eq!(views[0].today, ids("c1", 1..=2).into_iter().collect::<Vec<_>>());
        assert!(views[0].nodes.iter().filter(|n| n.is_today).count() == 5);
    }

    #[test]
    fn visible_window_reveals_past_the_unlock_window() {
        let mut questions = Vec::new();
        for i in 1..=12 {
            questions.push(question(&format!("c1-{i}"), "Childhood", i));
        }
        let chapters = group_into_chapters(questions);
        let settings = ProgressSettings::new(2, 5, 5).unwrap();

        let views = compute_chapter_views(
            &chapters,
            &ids("c1", 1..=3),
            &BTreeMap::new(),
            &settings,
        );
        // first incomplete = 3, window = 3..=4, shown = max(5, 3 + 5) = 8.
        assert_eq!(views[0].window, Some(UnlockWindow { start: 3, end: 4 }));
        assert_eq!(views[0].visible, VisibleWindow { shown: 8, hidden: 4 });
        assert_eq!(views[0].visible_nodes().len(), 8);

        let expanded = BTreeMap::from([(ChapterName::from(CanonicalChapter::Childhood), true)]);
        let views = compute_chapter_views(&chapters, &ids("c1", 1..=3), &expanded, &settings);
        assert!(views[0].expanded);
        assert_eq!(views[0].visible, VisibleWindow { shown: 12, hidden: 0 });
        // Expansion never changes lock state.
        assert_eq!(views[0].available_count(), 2);
    }

    #[test]
    fn locked_chapter_previews_leading_nodes() {
        let views = compute(&two_chapters(), &BTreeSet::new());
        assert_eq!(views[1].visible, VisibleWindow { shown: 5, hidden: 1 });
    }

    #[test]
    fn visible_nodes_tolerate_inconsistent_counts() {
        let mut view = compute(&two_chapters(), &BTreeSet::new()).remove(0);
        view.visible = VisibleWindow { shown: 40, hidden: 0 };
        assert_eq!(view.visible_nodes().len(), 6);

        let json = serde_json::to_string(&view).unwrap();
        let back: ChapterView = serde_json::from_str(&json).unwrap();
        assert_eq!(back.visible_nodes().len(), 6);
    }

    #[test]
    fn empty_chapter_has_no_window() {
        let chapters = vec![Chapter {
            name: ChapterName::uncategorized(),
            nodes: Vec::new(),
        }];
        let views = compute(&chapters, &BTreeSet::new());
        assert_eq!(views[0].window, None);
        assert_eq!(views[0].visible, VisibleWindow { shown: 0, hidden: 0 });
        assert_eq!(views[0].percent_complete(), 0);
    }

    #[test]
    fn compute_is_idempotent() {
        let chapters = two_chapters();
        let completed = ids("c1", 1..=5);
        assert_eq!(compute(&chapters, &completed), compute(&chapters, &completed));
    }

    fn completed_from_mask(chapters: &[Chapter], mask: u32) -> BTreeSet<QuestionId> {
        chapters
            .iter()
            .flat_map(|c| c.nodes.iter())
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, q)| q.id().clone())
            .collect()
    }

    #[test]
    fn window_invariants_hold_for_every_completed_set() {
        let chapters = two_chapters();
        let settings = ProgressSettings::default();

        for mask in 0..(1_u32 << 12) {
            let completed = completed_from_mask(&chapters, mask);
            for view in compute(&chapters, &completed) {
                assert!(view.available_count() <= settings.unlock_window());

                let Some(window) = view.window.filter(|_| view.unlocked) else {
                    assert!(view.nodes.iter().all(|n| n.status == L));
                    continue;
                };
                for node in &view.nodes {
                    let done = completed.contains(node.question.id());
                    assert_eq!(node.status == C, done);
                    if node.index < window.start {
                        assert_eq!(node.status, C);
                    }
                    if node.index > window.end {
                        assert_ne!(node.status, A);
                    }
                }
            }
        }
    }

    #[test]
    fn answering_more_never_relocks_anything() {
        let chapters = two_chapters();

        for mask in 0..(1_u32 << 12) {
            let before = compute(&chapters, &completed_from_mask(&chapters, mask));
            for bit in 0..12 {
                let extended = mask | (1 << bit);
                if extended == mask {
                    continue;
                }
                let after = compute(&chapters, &completed_from_mask(&chapters, extended));
                for (old, new) in before.iter().zip(&after) {
                    assert!(!old.unlocked || new.unlocked);
                    for (o, n) in old.nodes.iter().zip(&new.nodes) {
                        if o.status == A {
                            assert_ne!(n.status, L);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn summary_totals_views() {
        let chapters = two_chapters();
        let settings = ProgressSettings::default();
        let views = compute(&chapters, &ids("c1", 1..=5));
        let overview = summarize(&views, &settings);

        assert_eq!(overview.total_questions, 12);
        assert_eq!(overview.completed_questions, 5);
        assert_eq!(overview.unlocked_chapters, 2);
        assert_eq!(overview.total_chapters, 2);
        // c1-6 then the first four of chapter 2.
        assert_eq!(overview.today.len(), 5);
        assert_eq!(overview.today[0].as_str(), "c1-6");
        assert_eq!(overview.today[4].as_str(), "c2-4");
    }
}
