//! The mapping rule table.
//!
//! A mapping workbook has one sheet per hierarchy level. Each row of a
//! mapping sheet is a rule saying how one column of the matching instance
//! sheet becomes statements: which column holds the subject, which
//! predicate to use, and how to build the object. Rules are parsed once
//! into [`MappingRule`]s whose [`ObjectSpec`] carries exactly what the
//! materializer needs for that kind of object.

pub mod parse;

use crate::source::SourceRow;
use crate::vocab::Namespaces;

pub use parse::{parse_rule_table, REQUIRED_COLUMNS};

/// Category of object a rule constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Literal,
    UriReference,
    Place,
    Date,
    Identifier,
    Title,
    Appellation,
    Agent,
    StructuralReference,
}

impl ObjectKind {
    /// Parse the optional `Kind` column. Unknown names yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let key: String = text
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        Some(match key.as_str() {
            "literal" | "plainliteral" | "text" => Self::Literal,
            "uri" | "iri" | "urireference" | "reference" | "ref" => Self::UriReference,
            "place" | "luogo" => Self::Place,
            "date" | "data" => Self::Date,
            "identifier" | "id" => Self::Identifier,
            "title" | "titolo" => Self::Title,
            "appellation" | "name" => Self::Appellation,
            "agent" | "person" | "sender" => Self::Agent,
            "structural" | "structuralreference" | "parent" => Self::StructuralReference,
            _ => return None,
        })
    }

    /// Default kind for a rule without an explicit `Kind`.
    ///
    /// Decided by the predicate's local name first, then by the shape of
    /// the constant object.
    pub fn infer(predicate: &str, object: Option<&str>, object_column: Option<&str>) -> Self {
        if predicate == crate::vocab::rdf_type() {
            return Self::UriReference;
        }
        let local = local_name(predicate).to_lowercase();
        if INCLUSION_PREDICATES
            .iter()
            .any(|(p, _)| p.eq_ignore_ascii_case(&local))
        {
            return Self::StructuralReference;
        }
        let date_column = object_column
            .is_some_and(|c| c.trim().eq_ignore_ascii_case("estremi cronologici"));
        if date_column || local.contains("date") {
            return Self::Date;
        }
        if local.contains("location") || local.contains("place") {
            return Self::Place;
        }
        if local.contains("identifier") {
            return Self::Identifier;
        }
        if local.contains("title") {
            return Self::Title;
        }
        if local == "hasorhadname" || local.contains("appellation") {
            return Self::Appellation;
        }
        if ["sender", "creator", "author", "agent", "receiver", "addressee"]
            .iter()
            .any(|w| local.contains(w))
        {
            return Self::Agent;
        }
        match object {
            Some(o) if is_xsd_term(o) => Self::Literal,
            Some(o) if object_column.is_none() && crate::vocab::split_prefixed(o).is_some() => {
                Self::UriReference
            }
            Some(o) if object_column.is_none() && crate::uri::is_absolute_iri(o) => {
                Self::UriReference
            }
            _ => Self::Literal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Literal => "Literal",
            Self::UriReference => "URIReference",
            Self::Place => "Place",
            Self::Date => "Date",
            Self::Identifier => "Identifier",
            Self::Title => "Title",
            Self::Appellation => "Appellation",
            Self::Agent => "Agent",
            Self::StructuralReference => "StructuralReference",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RiC-O inclusion predicates paired with their inverse.
pub const INCLUSION_PREDICATES: &[(&str, &str)] = &[
    ("isOrWasIncludedIn", "includesOrIncluded"),
    ("includesOrIncluded", "isOrWasIncludedIn"),
    ("isDirectlyIncludedIn", "directlyIncludes"),
    ("directlyIncludes", "isDirectlyIncludedIn"),
    ("isIncludedIn", "includes"),
    ("includes", "isIncludedIn"),
];

/// Whether an inclusion predicate points from the child up to the parent.
pub fn is_upward_inclusion(local: &str) -> bool {
    matches!(local, "isOrWasIncludedIn" | "isDirectlyIncludedIn" | "isIncludedIn")
}

/// Local part of an IRI: whatever follows the last `#` or `/`.
pub fn local_name(iri: &str) -> &str {
    iri.rsplit(['#', '/']).next().unwrap_or(iri)
}

fn is_xsd_term(text: &str) -> bool {
    text.split_once(':')
        .is_some_and(|(p, l)| p.eq_ignore_ascii_case("xsd") && !l.is_empty())
}

/// Where a rule's value comes from: a column of the instance row, falling
/// back to a constant when the cell is empty or the column is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSpec {
    pub column: Option<String>,
    pub constant: Option<String>,
}

impl ValueSpec {
    pub fn resolve<'r>(&'r self, row: &'r SourceRow) -> Option<&'r str> {
        self.column
            .as_deref()
            .and_then(|c| row.get(c))
            .or(self.constant.as_deref())
    }
}

/// How a rule finds its subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSpec {
    /// Instance column holding the subject identifier.
    pub column: String,
    /// Fixed subject used when the instance sheet lacks `column`.
    pub template: Option<String>,
}

/// Object construction, one variant per specializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectSpec {
    Literal {
        value: ValueSpec,
        datatype: Option<String>,
    },
    Reference {
        value: ValueSpec,
    },
    Place {
        value: ValueSpec,
    },
    Date {
        value: ValueSpec,
    },
    Identifier {
        value: ValueSpec,
    },
    /// A box identifier, attached through an instantiation node.
    StorageIdentifier {
        value: ValueSpec,
    },
    Title {
        value: ValueSpec,
    },
    Appellation {
        value: ValueSpec,
    },
    Agent {
        value: ValueSpec,
    },
    Structural {
        value: ValueSpec,
        /// Inverse predicate IRI, emitted from the parent back to the child.
        inverse: Option<String>,
        /// Whether the rule's subject is the child (`isOrWasIncludedIn`).
        upward: bool,
    },
}

impl ObjectSpec {
    /// Object construction for a kind.
    pub fn for_kind(kind: ObjectKind, value: ValueSpec, predicate: &str, ns: &Namespaces) -> Self {
        match kind {
            ObjectKind::Literal => Self::Literal {
                value,
                datatype: None,
            },
            ObjectKind::UriReference => Self::Reference { value },
            ObjectKind::Place => Self::Place { value },
            ObjectKind::Date => Self::Date { value },
            ObjectKind::Identifier => Self::Identifier { value },
            ObjectKind::Title => Self::Title { value },
            ObjectKind::Appellation => Self::Appellation { value },
            ObjectKind::Agent => Self::Agent { value },
            ObjectKind::StructuralReference => {
                let local = local_name(predicate);
                let inverse = INCLUSION_PREDICATES
                    .iter()
                    .find(|(p, _)| *p == local)
                    .map(|(_, inv)| ns.rico(inv));
                Self::Structural {
                    value,
                    inverse,
                    upward: is_upward_inclusion(local) || !local.contains("nclude"),
                }
            }
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Literal { .. } => ObjectKind::Literal,
            Self::Reference { .. } => ObjectKind::UriReference,
            Self::Place { .. } => ObjectKind::Place,
            Self::Date { .. } => ObjectKind::Date,
            Self::Identifier { .. } | Self::StorageIdentifier { .. } => ObjectKind::Identifier,
            Self::Title { .. } => ObjectKind::Title,
            Self::Appellation { .. } => ObjectKind::Appellation,
            Self::Agent { .. } => ObjectKind::Agent,
            Self::Structural { .. } => ObjectKind::StructuralReference,
        }
    }

    pub fn value(&self) -> &ValueSpec {
        match self {
            Self::Literal { value, .. }
            | Self::Reference { value }
            | Self::Place { value }
            | Self::Date { value }
            | Self::Identifier { value }
            | Self::StorageIdentifier { value }
            | Self::Title { value }
            | Self::Appellation { value }
            | Self::Agent { value }
            | Self::Structural { value, .. } => value,
        }
    }
}

/// Which nodes receive a rule's links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleScope {
    /// The row's own subject.
    #[default]
    Subject,
    /// Every record contained in the row's subject, once the records have
    /// been read.
    ContainedRecords,
}

/// One parsed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRule {
    pub sheet: String,
    /// Row of the mapping sheet the rule came from.
    pub row: usize,
    pub subject: SubjectSpec,
    /// Predicate as written in the sheet.
    pub predicate_text: String,
    /// Expanded predicate IRI.
    pub predicate: String,
    pub object: ObjectSpec,
    pub scope: RuleScope,
}

impl MappingRule {
    pub fn kind(&self) -> ObjectKind {
        self.object.kind()
    }
}

impl std::fmt::Display for MappingRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.object.value();
        write!(
            f,
            "[{}] {} → {} {}",
            self.subject.column,
            self.predicate_text,
            self.kind(),
            value
                .column
                .as_deref()
                .map(|c| format!("[{c}]"))
                .or_else(|| value.constant.clone())
                .unwrap_or_default()
        )?;
        if self.scope == RuleScope::ContainedRecords {
            f.write_str(" (contained records)")?;
        }
        Ok(())
    }
}

/// Rules of one mapping sheet, in sheet order.
#[derive(Debug, Clone)]
pub struct RuleSheet {
    pub name: String,
    pub rules: Vec<MappingRule>,
}

/// The parsed rule table for a run.
#[derive(Debug, Clone)]
pub struct RuleTable {
    pub sheets: Vec<RuleSheet>,
    /// Mapping sheets that were not usable, with the reason.
    pub skipped: Vec<(String, String)>,
    pub namespaces: Namespaces,
}

impl RuleTable {
    pub fn rule_count(&self) -> usize {
        self.sheets.iter().map(|s| s.rules.len()).sum()
    }

    pub fn sheet(&self, name: &str) -> Option<&RuleSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}
