use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::question::Question;

/// Label used for questions that arrive without a chapter.
pub const UNCATEGORIZED: &str = "Uncategorized";

//
// ─── CANONICAL CHAPTERS ────────────────────────────────────────────────────────
//

/// The fixed, life-ordered list of chapters the catalog knows about.
///
/// Declaration order is the canonical order; `Ord` is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalChapter {
    Childhood,
    ElementarySchool,
    TeenageYears,
    YoungAdulthood,
    Career,
    LoveAndFamily,
    Midlife,
    LaterYears,
    Reflections,
}

impl CanonicalChapter {
    pub const ALL: [CanonicalChapter; 9] = [
        CanonicalChapter::Childhood,
        CanonicalChapter::ElementarySchool,
        CanonicalChapter::TeenageYears,
        CanonicalChapter::YoungAdulthood,
        CanonicalChapter::Career,
        CanonicalChapter::LoveAndFamily,
        CanonicalChapter::Midlife,
        CanonicalChapter::LaterYears,
        CanonicalChapter::Reflections,
    ];

    /// Display label, also the persisted form.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CanonicalChapter::Childhood => "Childhood",
            CanonicalChapter::ElementarySchool => "Elementary School",
            CanonicalChapter::TeenageYears => "Teenage Years",
            CanonicalChapter::YoungAdulthood => "Young Adulthood",
            CanonicalChapter::Career => "Career",
            CanonicalChapter::LoveAndFamily => "Love & Family",
            CanonicalChapter::Midlife => "Midlife",
            CanonicalChapter::LaterYears => "Later Years",
            CanonicalChapter::Reflections => "Reflections",
        }
    }

    /// Exact (case-insensitive) label lookup.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|chapter| chapter.label().eq_ignore_ascii_case(label))
    }
}

//
// ─── CHAPTER NAME ──────────────────────────────────────────────────────────────
//

/// Grouping key of a chapter.
///
/// Canonical chapters sort first in life order; every other label sorts
/// after them, alphabetically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ChapterName {
    Canonical(CanonicalChapter),
    Other(String),
}

impl ChapterName {
    /// Resolves a raw chapter label from a catalog row.
    ///
    /// Blank or missing labels, and any casing of [`UNCATEGORIZED`], become
    /// [`UNCATEGORIZED`]. A legacy list prefix such as `"3. "` is only dropped
    /// when what follows is a canonical label; the number itself never decides
    /// the order.
    #[must_use]
    pub fn parse(label: Option<&str>) -> Self {
        let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) else {
            return Self::uncategorized();
        };
        if label.eq_ignore_ascii_case(UNCATEGORIZED) {
            return Self::uncategorized();
        }

        if let Some(chapter) = CanonicalChapter::from_label(label) {
            return Self::Canonical(chapter);
        }
        if let Some(chapter) = strip_list_prefix(label).and_then(CanonicalChapter::from_label) {
            return Self::Canonical(chapter);
        }
        Self::Other(label.to_owned())
    }

    #[must_use]
    pub fn uncategorized() -> Self {
        Self::Other(UNCATEGORIZED.to_owned())
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            ChapterName::Canonical(chapter) => chapter.label(),
            ChapterName::Other(label) => label,
        }
    }
}

fn strip_list_prefix(label: &str) -> Option<&str> {
    let digits = label.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    label[digits..].strip_prefix('.').map(str::trim_start)
}

impl From<CanonicalChapter> for ChapterName {
    fn from(chapter: CanonicalChapter) -> Self {
        Self::Canonical(chapter)
    }
}

impl From<String> for ChapterName {
    fn from(label: String) -> Self {
        Self::parse(Some(&label))
    }
}

impl From<ChapterName> for String {
    fn from(name: ChapterName) -> Self {
        match name {
            ChapterName::Canonical(chapter) => chapter.label().to_owned(),
            ChapterName::Other(label) => label,
        }
    }
}

impl fmt::Display for ChapterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── CHAPTER ───────────────────────────────────────────────────────────────────
//

/// A named group of questions, nodes sorted by `order` then id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub name: ChapterName,
    pub nodes: Vec<Question>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
