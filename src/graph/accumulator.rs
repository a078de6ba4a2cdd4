//! The write-once statement store for a run.
//!
//! Statements live in an `IndexSet`, so insertion is idempotent and the
//! output order is the order of first insertion. A secondary index maps each
//! subject to its statement positions. Entity nodes are registered under a
//! [`SemanticKey`]; the registry guarantees that one key maps to exactly one
//! IRI and one IRI to exactly one key.

use std::collections::HashMap;

use indexmap::IndexSet;
use oxigraph::model::NamedNodeRef;

use crate::error::GraphError;
use crate::uri::normalize_label;
use crate::vocab;

use super::{Statement, Term};

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Kind component of a semantic key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Place,
    Date,
    Identifier,
    StorageIdentifier,
    Instantiation,
    Title,
    Appellation,
    Agent,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Place => "place",
            Self::Date => "date",
            Self::Identifier => "identifier",
            Self::StorageIdentifier => "storage-identifier",
            Self::Instantiation => "instantiation",
            Self::Title => "title",
            Self::Appellation => "appellation",
            Self::Agent => "agent",
        }
    }
}

/// The deterministic tuple deciding node identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemanticKey {
    pub kind: EntityKind,
    /// Normalized label.
    pub label: String,
    /// Owning subject for per-record entities such as dates.
    pub scope: Option<String>,
}

impl SemanticKey {
    /// Key for an entity shared across the whole graph.
    pub fn new(kind: EntityKind, label: &str) -> Self {
        Self {
            kind,
            label: normalize_label(label),
            scope: None,
        }
    }

    /// Key for an entity owned by one subject.
    pub fn scoped(kind: EntityKind, label: &str, scope: &str) -> Self {
        Self {
            kind,
            label: normalize_label(label),
            scope: Some(scope.to_string()),
        }
    }
}

impl std::fmt::Display for SemanticKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:?}", self.kind.as_str(), self.label)?;
        if let Some(scope) = &self.scope {
            write!(f, "@<{scope}>")?;
        }
        Ok(())
    }
}

/// An entity node resolved through the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub iri: String,
    /// Whether this call registered the node.
    pub created: bool,
}

/// Insert-only statement store with entity deduplication.
#[derive(Debug)]
pub struct GraphAccumulator {
    statements: IndexSet<Statement>,
    by_subject: HashMap<String, Vec<usize>>,
    entities: HashMap<SemanticKey, String>,
    owners: HashMap<String, SemanticKey>,
    rdf_type: String,
}

impl GraphAccumulator {
    pub fn new() -> Self {
        Self {
            statements: IndexSet::new(),
            by_subject: HashMap::new(),
            entities: HashMap::new(),
            owners: HashMap::new(),
            rdf_type: vocab::rdf_type(),
        }
    }

    /// Insert a statement. Returns `Ok(false)` if it was already present.
    ///
    /// Every IRI position is validated, so an accepted statement is always
    /// serializable.
    pub fn insert(&mut self, statement: Statement) -> GraphResult<bool> {
        check_iri(&statement.subject)?;
        check_iri(&statement.predicate)?;
        match &statement.object {
            Term::Iri(iri) => check_iri(iri)?,
            Term::Literal {
                datatype: Some(dt), ..
            } => check_iri(dt)?,
            Term::Literal { .. } => {}
        }

        let subject = statement.subject.clone();
        let (idx, inserted) = self.statements.insert_full(statement);
        if inserted {
            self.by_subject.entry(subject).or_default().push(idx);
        }
        Ok(inserted)
    }

    /// Convenience wrapper around [`insert`](Self::insert).
    pub fn add(
        &mut self,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: Term,
    ) -> GraphResult<bool> {
        self.insert(Statement::new(subject, predicate, object))
    }

    pub fn contains(&self, statement: &Statement) -> bool {
        self.statements.contains(statement)
    }

    /// Number of statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// All statements in insertion order.
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    /// Statements with the given subject, in insertion order.
    pub fn about<'a>(&'a self, subject: &str) -> impl Iterator<Item = &'a Statement> + use<'a> {
        self.by_subject
            .get(subject)
            .into_iter()
            .flatten()
            .filter_map(|&idx| self.statements.get_index(idx))
    }

    /// Objects of `(subject, predicate, ?)`.
    pub fn objects<'a>(&'a self, subject: &str, predicate: &str) -> Vec<&'a Term> {
        self.about(subject)
            .filter(|s| s.predicate == predicate)
            .map(|s| &s.object)
            .collect()
    }

    /// Whether the subject has at least one value for the predicate.
    pub fn has(&self, subject: &str, predicate: &str) -> bool {
        self.about(subject).any(|s| s.predicate == predicate)
    }

    pub fn has_type(&self, subject: &str, class: &str) -> bool {
        self.about(subject)
            .any(|s| s.predicate == self.rdf_type && s.object.as_iri() == Some(class))
    }

    /// Subjects typed with `class`, in order of first typing.
    pub fn subjects_of_type(&self, class: &str) -> Vec<String> {
        self.statements
            .iter()
            .filter(|s| s.predicate == self.rdf_type && s.object.as_iri() == Some(class))
            .map(|s| s.subject.clone())
            .collect()
    }

    /// Look up the node registered for a key.
    pub fn entity(&self, key: &SemanticKey) -> Option<&str> {
        self.entities.get(key).map(String::as_str)
    }

    /// Register `iri` under `key`, or return the node already registered.
    ///
    /// Fails with [`GraphError::KeyCollision`] if the IRI already belongs
    /// to a different key.
    pub fn claim_entity(&mut self, key: SemanticKey, iri: String) -> GraphResult<EntityRef> {
        if let Some(existing) = self.entities.get(&key) {
            return Ok(EntityRef {
                iri: existing.clone(),
                created: false,
            });
        }
        if let Some(owner) = self.owners.get(&iri) {
            return Err(GraphError::KeyCollision {
                iri,
                existing: owner.to_string(),
                incoming: key.to_string(),
            });
        }
        check_iri(&iri)?;
        self.owners.insert(iri.clone(), key.clone());
        self.entities.insert(key, iri.clone());
        Ok(EntityRef { iri, created: true })
    }

    /// Number of registered entity nodes.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl Default for GraphAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

fn check_iri(iri: &str) -> GraphResult<()> {
    NamedNodeRef::new(iri)
        .map(|_| ())
        .map_err(|e| GraphError::InvalidIri {
            iri: iri.to_string(),
            message: e.to_string(),
        })
}
