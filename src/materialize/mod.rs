//! Entity materialization.
//!
//! [`Materializer::apply`] takes one rule and one instance row, resolves
//! the subject, and hands the object value to the specializer for the
//! rule's [`ObjectSpec`] variant. Specializers create or reuse entity
//! nodes and return the [`Link`]s that connect them to the subject; the
//! rule's scope then decides whether those links land on the subject now
//! or wait in the [`DeferredBuffer`](crate::deferred::DeferredBuffer) for
//! the subject's contained records.

mod agent;
mod date;
mod labeled;
mod place;
mod structural;

use crate::config::PipelineConfig;
use crate::deferred::{DeferredAttribute, DeferredBuffer};
use crate::graph::{EntityRef, GraphAccumulator, SemanticKey, Statement, Term};
use crate::hierarchy::{ContainmentTree, HierarchyLevel, SheetProfile, StructuralClass};
use crate::mapping::{MappingRule, ObjectSpec, RuleScope};
use crate::report::{Issue, RunReport};
use crate::source::SourceRow;
use crate::uri::{is_absolute_iri, safe_segment};
use crate::vocab::{self, Namespaces};

pub use agent::AgentKind;

/// Mutable state of a run, passed explicitly through every specializer.
#[derive(Debug, Default)]
pub struct RunContext {
    pub graph: GraphAccumulator,
    pub tree: ContainmentTree,
    pub deferred: DeferredBuffer,
    pub report: RunReport,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a statement. A rejected statement is reported and dropped.
    pub fn emit(&mut self, subject: &str, predicate: &str, object: Term) -> bool {
        self.emit_statement(Statement::new(subject, predicate, object))
    }

    pub fn emit_statement(&mut self, statement: Statement) -> bool {
        match self.graph.insert(statement) {
            Ok(added) => added,
            Err(e) => {
                self.report.push(Issue::InvariantViolation {
                    message: e.to_string(),
                });
                false
            }
        }
    }
}

/// An edge from the subject to an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub predicate: String,
    pub object: Term,
}

impl Link {
    pub fn new(predicate: impl Into<String>, object: Term) -> Self {
        Self {
            predicate: predicate.into(),
            object,
        }
    }
}

/// The row being processed and what is known about its sheet.
#[derive(Debug, Clone, Copy)]
pub struct RowScope<'r> {
    pub row: &'r SourceRow,
    pub profile: &'r SheetProfile,
    /// Header of the instance sheet.
    pub columns: &'r [String],
}

impl RowScope<'_> {
    fn sheet_has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(column.trim()))
    }
}

/// What applying a rule to a row produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No subject could be resolved for the row.
    MissingSubject,
    /// The subject resolved but the rule had no value for this row.
    NoValue { subject: String },
    Applied { subject: String, links: usize },
}

/// Turns rules and rows into statements.
#[derive(Debug)]
pub struct Materializer<'a> {
    ns: &'a Namespaces,
    config: &'a PipelineConfig,
    rdf_type: String,
    rdfs_label: String,
}

impl<'a> Materializer<'a> {
    pub fn new(ns: &'a Namespaces, config: &'a PipelineConfig) -> Self {
        Self {
            ns,
            config,
            rdf_type: vocab::rdf_type(),
            rdfs_label: vocab::rdfs_label(),
        }
    }

    pub fn namespaces(&self) -> &Namespaces {
        self.ns
    }

    /// IRI of a structural node: `{base}{RecordSet|Record}/{segment}`.
    pub fn structural_iri(&self, class: StructuralClass, id: &str) -> String {
        self.ns
            .base_iri(&format!("{}/{}", class.local_name(), safe_segment(id)))
    }

    /// Apply one rule to one row.
    pub fn apply(&self, ctx: &mut RunContext, rule: &MappingRule, scope: &RowScope<'_>) -> Outcome {
        let subject = match scope.row.get(&rule.subject.column) {
            Some(id) => {
                let iri = self.structural_iri(scope.profile.class, id);
                self.describe_structural(ctx, &iri, id, scope.profile);
                iri
            }
            None => match &rule.subject.template {
                Some(template) if !scope.sheet_has_column(&rule.subject.column) => {
                    self.ns.expand(template)
                }
                _ => return Outcome::MissingSubject,
            },
        };

        let Some(value) = rule.object.value().resolve(scope.row) else {
            return Outcome::NoValue { subject };
        };

        let links = self.dispatch(ctx, rule, scope, &subject, value);
        let count = links.len();
        let deferred = rule.scope == RuleScope::ContainedRecords
            && scope.profile.class == StructuralClass::RecordSet;
        for link in links {
            if deferred {
                ctx.deferred.register(
                    &subject,
                    scope.profile.level,
                    DeferredAttribute {
                        predicate: link.predicate,
                        object: link.object,
                    },
                );
            } else {
                ctx.emit(&subject, &link.predicate, link.object);
            }
        }
        ctx.report.rules_applied += 1;
        Outcome::Applied {
            subject,
            links: count,
        }
    }

    fn dispatch(
        &self,
        ctx: &mut RunContext,
        rule: &MappingRule,
        scope: &RowScope<'_>,
        subject: &str,
        value: &str,
    ) -> Vec<Link> {
        let predicate = rule.predicate.as_str();
        match &rule.object {
            ObjectSpec::Literal { datatype, .. } => {
                let object = match datatype {
                    Some(dt) => Term::typed(value, dt.as_str()),
                    None => Term::literal(value),
                };
                vec![Link::new(predicate, object)]
            }
            ObjectSpec::Reference { .. } => vec![Link::new(predicate, Term::iri(self.reference(value)))],
            ObjectSpec::Place { .. } => self.place_links(ctx, predicate, value),
            ObjectSpec::Date { .. } => self.date_links(ctx, subject, predicate, value),
            ObjectSpec::Identifier { .. } => {
                self.labeled_links(ctx, labeled::Labeled::Identifier, predicate, value)
            }
            ObjectSpec::StorageIdentifier { .. } => self.storage_links(ctx, subject, predicate, value),
            ObjectSpec::Title { .. } => self.labeled_links(ctx, labeled::Labeled::Title, predicate, value),
            ObjectSpec::Appellation { .. } => {
                self.labeled_links(ctx, labeled::Labeled::Appellation, predicate, value)
            }
            ObjectSpec::Agent { .. } => self.agent_links(ctx, scope, predicate, value),
            ObjectSpec::Structural {
                inverse, upward, ..
            } => self.structural_links(ctx, subject, predicate, inverse.as_deref(), *upward, value),
        }
    }

    /// Type, level and label of a structural subject.
    fn describe_structural(&self, ctx: &mut RunContext, iri: &str, id: &str, profile: &SheetProfile) {
        ctx.tree.declare(iri, profile.level);
        ctx.emit(iri, &self.rdf_type, Term::iri(self.ns.rico(profile.class.local_name())));
        ctx.emit(
            iri,
            &self.ns.base_iri("hierarchyLevel"),
            Term::literal(profile.level.as_str()),
        );
        ctx.emit(iri, &self.rdfs_label, Term::literal(id));
    }

    /// A constant or cell value used as a node reference.
    fn reference(&self, value: &str) -> String {
        if is_absolute_iri(value) || vocab::split_prefixed(value.trim()).is_some() {
            self.ns.expand(value)
        } else {
            self.ns.base_iri(&safe_segment(value))
        }
    }

    /// Resolve `key` to its node, creating it with `iri` when new.
    ///
    /// `describe` runs only for a newly created node. A key collision is
    /// reported and yields `None`.
    fn entity(
        &self,
        ctx: &mut RunContext,
        key: SemanticKey,
        iri: String,
        describe: impl FnOnce(&Self, &mut RunContext, &str),
    ) -> Option<String> {
        match ctx.graph.claim_entity(key, iri) {
            Ok(EntityRef { iri, created }) => {
                if created {
                    describe(self, ctx, &iri);
                }
                Some(iri)
            }
            Err(e) => {
                ctx.report.push(Issue::InvariantViolation {
                    message: e.to_string(),
                });
                None
            }
        }
    }

    /// `rdf:type` plus `rdfs:label` for an entity node.
    fn type_and_label(&self, ctx: &mut RunContext, iri: &str, class: &str, label: &str) {
        ctx.emit(iri, &self.rdf_type, Term::iri(self.ns.rico(class)));
        ctx.emit(iri, &self.rdfs_label, Term::literal(label));
    }
}

/// Display form of a label: trimmed with whitespace runs collapsed.
fn display_label(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a level sits at the leaf of the hierarchy.
fn is_leaf(level: HierarchyLevel) -> bool {
    level.class() == StructuralClass::Record
}
