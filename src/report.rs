//! Non-fatal issues raised during a conversion run.
//!
//! Nothing in here aborts a run: every [`Issue`] is recovered locally by
//! the component that raised it, logged at warning level, and collected in
//! the [`RunReport`] handed back to the caller.

use miette::Diagnostic;
use thiserror::Error;

use crate::hierarchy::HierarchyLevel;

/// A recoverable problem found while converting.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum Issue {
    #[error("mapping sheet \"{sheet}\" has no matching instance sheet")]
    #[diagnostic(
        code(archive::run::sheet_not_found),
        help("The sheet was skipped. Instance sheets must share the mapping sheet's name.")
    )]
    SheetNotFound { sheet: String },

    #[error("mapping sheet \"{sheet}\" skipped: {reason}")]
    #[diagnostic(code(archive::run::mapping_sheet_skipped))]
    MappingSheetSkipped { sheet: String, reason: String },

    #[error("row {row} of sheet \"{sheet}\" has no subject value")]
    #[diagnostic(
        code(archive::run::missing_subject),
        help("Every rule on this row needs its `Column Subject` cell filled in.")
    )]
    MissingSubject { sheet: String, row: usize },

    #[error("unrecognized date \"{text}\" on <{subject}>, kept as a plain literal")]
    #[diagnostic(
        code(archive::run::malformed_date),
        help("Dates must be YYYY, YYYYMMDD, or a range of those joined by '-'.")
    )]
    MalformedDateLiteral { subject: String, text: String },

    #[error("geocoding lookup for \"{label}\" failed: {message}")]
    #[diagnostic(
        code(archive::run::lookup_failed),
        help(
            "The place was left without coordinates. Failed lookups are not \
             retried within a run; re-run the conversion to retry."
        )
    )]
    ExternalLookupFailure { label: String, message: String },

    #[error("{count} deferred attribute(s) for folder <{folder}> were never propagated")]
    #[diagnostic(
        code(archive::run::orphan_deferred),
        help(
            "No record referenced this folder as its structural parent, or the \
             document sheet was processed before the folder sheet."
        )
    )]
    OrphanDeferredAttribute {
        folder: String,
        predicates: Vec<String>,
        count: usize,
    },

    #[error("refused containment <{parent}> ({parent_level}) → <{child}> ({child_level})")]
    #[diagnostic(
        code(archive::run::level_inversion),
        help("A container must sit at a shallower hierarchy level than what it contains.")
    )]
    HierarchyLevelInversion {
        parent: String,
        child: String,
        parent_level: HierarchyLevel,
        child_level: HierarchyLevel,
    },

    #[error("internal invariant violated: {message}")]
    #[diagnostic(
        code(archive::run::invariant),
        help("The offending statement was dropped. Please report this as a bug.")
    )]
    InvariantViolation { message: String },
}

impl Issue {
    /// Short machine-readable tag, used for summaries.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SheetNotFound { .. } => "sheet_not_found",
            Self::MappingSheetSkipped { .. } => "mapping_sheet_skipped",
            Self::MissingSubject { .. } => "missing_subject",
            Self::MalformedDateLiteral { .. } => "malformed_date",
            Self::ExternalLookupFailure { .. } => "lookup_failed",
            Self::OrphanDeferredAttribute { .. } => "orphan_deferred",
            Self::HierarchyLevelInversion { .. } => "level_inversion",
            Self::InvariantViolation { .. } => "invariant",
        }
    }
}

/// Counters and issues collected over a run.
#[derive(Debug, Default, Clone)]
pub struct RunReport {
    issues: Vec<Issue>,
    /// Mapping sheets whose rows were processed.
    pub sheets_processed: usize,
    /// Instance rows visited.
    pub rows_read: usize,
    /// Rule applications that produced at least a subject.
    pub rules_applied: usize,
    /// Place entities left without geographic data.
    pub unresolved_places: usize,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue and log it.
    pub fn push(&mut self, issue: Issue) {
        tracing::warn!(kind = issue.tag(), "{issue}");
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Number of issues carrying the given tag.
    pub fn count(&self, tag: &str) -> usize {
        self.issues.iter().filter(|i| i.tag() == tag).count()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "sheets: {}, rows: {}, rule applications: {}, unresolved places: {}",
            self.sheets_processed, self.rows_read, self.rules_applied, self.unresolved_places
        )?;
        if self.issues.is_empty() {
            return write!(f, "no issues");
        }
        write!(f, "{} issue(s):", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  [{}] {issue}", issue.tag())?;
        }
        Ok(())
    }
}
