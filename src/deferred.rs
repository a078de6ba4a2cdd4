//! Folder-scoped attributes waiting for their records.
//!
//! A rule scoped to contained records (for example a sender written once
//! on a folder row) cannot be applied while the folder sheet is read: the
//! records of the folder come from a later sheet. The buffer keeps those
//! links per folder in the `Collecting` state and turns them into edges on
//! every contained record when a sheet boundary shows the records exist.
//! A flushed entry keeps its attributes until the run ends, so records
//! that a later sheet adds to the folder receive them at the next boundary.

use indexmap::{IndexMap, IndexSet};

use crate::graph::{Statement, Term};
use crate::hierarchy::{ContainmentTree, HierarchyLevel};
use crate::report::Issue;

/// Lifecycle of a folder's buffer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Collecting,
    Flushed,
}

/// A link waiting to be copied onto contained records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeferredAttribute {
    pub predicate: String,
    pub object: Term,
}

#[derive(Debug)]
struct Entry {
    level: HierarchyLevel,
    state: BufferState,
    attributes: IndexSet<DeferredAttribute>,
    /// Records that already hold every attribute.
    reached: IndexSet<String>,
}

/// Keyed buffer of deferred attributes.
#[derive(Debug, Default)]
pub struct DeferredBuffer {
    entries: IndexMap<String, Entry>,
}

impl DeferredBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an attribute for `folder`. A new attribute reopens a flushed
    /// entry and is owed to every record, including those already reached.
    pub fn register(&mut self, folder: &str, level: HierarchyLevel, attribute: DeferredAttribute) {
        let entry = self
            .entries
            .entry(folder.to_string())
            .or_insert_with(|| Entry {
                level,
                state: BufferState::Collecting,
                attributes: IndexSet::new(),
                reached: IndexSet::new(),
            });
        if entry.attributes.insert(attribute) {
            entry.reached.clear();
            entry.state = BufferState::Collecting;
        }
    }

    pub fn state(&self, folder: &str) -> Option<BufferState> {
        self.entries.get(folder).map(|e| e.state)
    }

    /// Number of attributes still waiting.
    pub fn pending(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.state == BufferState::Collecting)
            .map(|e| e.attributes.len())
            .sum()
    }

    /// Flush at the end of a sheet at level `completed`.
    ///
    /// Every entry above that level whose folder has record children not yet
    /// reached yields one statement per such child and attribute, then is
    /// `Flushed`. Entries without records keep collecting.
    pub fn flush(&mut self, completed: HierarchyLevel, tree: &ContainmentTree) -> Vec<Statement> {
        let mut out = Vec::new();
        for (folder, entry) in self.entries.iter_mut() {
            if entry.level >= completed {
                continue;
            }
            let records: Vec<&str> = tree
                .record_children(folder)
                .into_iter()
                .filter(|r| !entry.reached.contains(*r))
                .collect();
            if records.is_empty() {
                continue;
            }
            for record in &records {
                for attr in &entry.attributes {
                    out.push(Statement::new(*record, attr.predicate.clone(), attr.object.clone()));
                }
                entry.reached.insert(record.to_string());
            }
            tracing::debug!(
                folder = %folder,
                records = records.len(),
                attributes = entry.attributes.len(),
                "deferred attributes propagated"
            );
            entry.state = BufferState::Flushed;
        }
        out
    }

    /// End of run: every entry still collecting becomes an issue.
    pub fn drain_orphans(&mut self) -> Vec<Issue> {
        let mut issues = Vec::new();
        for (folder, entry) in self.entries.iter_mut() {
            if entry.state != BufferState::Collecting {
                continue;
            }
            issues.push(Issue::OrphanDeferredAttribute {
                folder: folder.clone(),
                predicates: entry.attributes.iter().map(|a| a.predicate.clone()).collect(),
                count: entry.attributes.len(),
            });
            entry.attributes.clear();
            entry.state = BufferState::Flushed;
        }
        issues
    }
}
