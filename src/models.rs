//! Data models for collected links, extracted journals and their tallies.
//!
//! - [`Link`]: an article URL as scraped from a listing page
//! - [`Journal`]: the publication venue derived from an article page
//! - [`Outcome`] / [`LinkRecord`]: what the pipeline writes per processed link
//! - [`Failure`]: a link that could not be processed, with its error
//! - [`JournalCounts`]: the frequency table printed at the end of a run

use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// An article URL. Not validated and not deduplicated.
pub type Link = String;

/// Value written for a page without a recognisable publication venue.
pub const UNPUBLISHED: &str = "unpublished";

/// Value written for a link whose page could not be processed.
pub const FAILED: &str = "error";

/// Where a preprint ended up being published.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Journal {
    /// A journal name parsed from the article's citation element.
    Published(String),
    /// No citation element, or its text could not be parsed.
    Unpublished,
}

impl Journal {
    pub fn as_str(&self) -> &str {
        match self {
            Journal::Published(name) => name.as_str(),
            Journal::Unpublished => UNPUBLISHED,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Journal::Published(_))
    }
}

impl fmt::Display for Journal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of processing a single link in the extraction loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Journal(Journal),
    /// The page failed to load or be queried; holds the error message.
    Failed(String),
}

impl Outcome {
    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Journal(journal) => journal.as_str(),
            Outcome::Failed(_) => FAILED,
        }
    }
}

/// One line of the record file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub link: Link,
    pub outcome: Outcome,
}

impl LinkRecord {
    /// Render as `<link>\t<journal>\n`.
    pub fn to_line(&self) -> String {
        format!("{}\t{}\n", self.link, self.outcome.as_str())
    }
}

/// A link whose page could not be processed, kept for the JSON summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub link: Link,
    pub error: String,
}

/// Whether the `unpublished` fallback takes part in the frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountPolicy {
    pub count_unpublished: bool,
}

impl Default for CountPolicy {
    fn default() -> Self {
        Self {
            count_unpublished: true,
        }
    }
}

/// A row of the finalized frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalCount {
    pub journal: String,
    pub count: usize,
}

/// Journal frequency table built while records are produced.
///
/// Entries keep the order in which journals were first seen, so the
/// descending sort in [`JournalCounts::sorted`] breaks ties by first
/// occurrence.
#[derive(Debug, Default)]
pub struct JournalCounts {
    policy: CountPolicy,
    entries: Vec<JournalCount>,
    index: HashMap<String, usize>,
}

impl JournalCounts {
    pub fn new(policy: CountPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Count an outcome. Returns whether the table changed.
    pub fn record(&mut self, outcome: &Outcome) -> bool {
        let journal = match outcome {
            Outcome::Journal(journal) => journal,
            Outcome::Failed(_) => return false,
        };
        if !journal.is_published() && !self.policy.count_unpublished {
            return false;
        }
        let name = journal.as_str();
        if name.is_empty() {
            return false;
        }
        match self.index.get(name) {
            Some(&i) => self.entries[i].count += 1,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push(JournalCount {
                    journal: name.to_string(),
                    count: 1,
                });
            }
        }
        true
    }

    #[cfg(test)]
    pub fn get(&self, journal: &str) -> Option<usize> {
        self.index.get(journal).map(|&i| self.entries[i].count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows sorted by count, highest first.
    pub fn sorted(&self) -> Vec<JournalCount> {
        self.entries
            .iter()
            .cloned()
            .sorted_by(|a, b| b.count.cmp(&a.count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published(name: &str) -> Outcome {
        Outcome::Journal(Journal::Published(name.to_string()))
    }

    #[test]
    fn record_line_is_tab_separated() {
        let record = LinkRecord {
            link: "http://biorxiv.org/content/early/2017/01/01/123".to_string(),
            outcome: published("Cell"),
        };
        assert_eq!(
            record.to_line(),
            "http://biorxiv.org/content/early/2017/01/01/123\tCell\n"
        );

        let failed = LinkRecord {
            link: "x".to_string(),
            outcome: Outcome::Failed("navigation to x failed".to_string()),
        };
        assert_eq!(failed.to_line(), "x\terror\n");
    }

    #[test]
    fn unpublished_counted_by_default() {
        let mut counts = JournalCounts::new(CountPolicy::default());
        counts.record(&published("Cell"));
        counts.record(&Outcome::Journal(Journal::Unpublished));
        assert_eq!(counts.get("Cell"), Some(1));
        assert_eq!(counts.get(UNPUBLISHED), Some(1));
    }

    #[test]
    fn unpublished_skipped_when_policy_disabled() {
        let mut counts = JournalCounts::new(CountPolicy {
            count_unpublished: false,
        });
        assert!(!counts.record(&Outcome::Journal(Journal::Unpublished)));
        assert!(counts.record(&published("eLife")));
        assert_eq!(counts.get(UNPUBLISHED), None);
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn failures_and_empty_names_never_counted() {
        let mut counts = JournalCounts::new(CountPolicy::default());
        assert!(!counts.record(&Outcome::Failed("timeout".to_string())));
        assert!(!counts.record(&published("")));
        assert!(counts.is_empty());
    }

    #[test]
    fn sorted_descending_with_ties_in_first_seen_order() {
        let mut counts = JournalCounts::new(CountPolicy::default());
        for name in ["PLOS ONE", "Cell", "Nature", "Cell", "Nature", "Cell"] {
            counts.record(&published(name));
        }
        counts.record(&published("eLife"));

        let rows = counts.sorted();
        let names: Vec<_> = rows.iter().map(|r| r.journal.as_str()).collect();
        assert_eq!(names, ["Cell", "Nature", "PLOS ONE", "eLife"]);
        assert_eq!(rows[0].count, 3);
        assert_eq!(rows[1].count, 2);
    }
}
