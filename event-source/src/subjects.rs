//! Deduplicated subject lists.

use std::collections::HashSet;

/// An ordered set of broker subjects.
///
/// Subjects are compared by exact string match. The first occurrence of a
/// subject keeps its position, later duplicates are dropped, so the list
/// handed to the broker never contains the same subject twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectSet {
    subjects: Vec<String>,
}

impl SubjectSet {
    /// Build a set from any list of subjects, dropping duplicates.
    pub fn new<I, S>(subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let subjects = subjects
            .into_iter()
            .map(Into::into)
            .filter(|subject: &String| seen.insert(subject.clone()))
            .collect();

        Self { subjects }
    }

    /// Number of unique subjects.
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Whether `subject` is part of the set.
    pub fn contains(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }

    /// The subjects in first-seen order.
    pub fn as_slice(&self) -> &[String] {
        &self.subjects
    }

    /// Iterate over the subjects.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.subjects.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for SubjectSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a SubjectSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
