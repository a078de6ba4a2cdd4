//! Schematic model of a rule table.
//!
//! Builds a graph with no instance data: one generic node per mapping
//! sheet, typed the way its rows would be, and one placeholder edge per
//! rule showing the shape the rule produces. Useful for reviewing a mapping
//! workbook before running it.

use crate::graph::{GraphAccumulator, GraphResult, Term};
use crate::hierarchy::{SheetPosition, SheetProfile};
use crate::mapping::{MappingRule, ObjectSpec, RuleScope, RuleTable, ValueSpec};
use crate::uri::safe_segment;
use crate::vocab::{self, Namespaces};

/// Build the structure model of `rules`.
pub fn structure_model(rules: &RuleTable) -> GraphResult<GraphAccumulator> {
    let ns = &rules.namespaces;
    let mut g = GraphAccumulator::new();
    let count = rules.sheets.len();

    for (index, sheet) in rules.sheets.iter().enumerate() {
        let profile = SheetProfile::resolve(&sheet.name, SheetPosition { index, count });
        let tag = generic_tag(&sheet.name);
        let node = ns.base_iri(&format!("structure/GENERIC_{tag}"));

        g.add(
            &node,
            vocab::rdfs_label(),
            Term::literal(format!("Generic representative of '{}'", sheet.name)),
        )?;
        g.add(&node, vocab::rdf_type(), Term::iri(ns.rico(profile.class.local_name())))?;
        g.add(&node, ns.base_iri("hierarchyLevel"), Term::literal(profile.level.as_str()))?;

        for rule in &sheet.rules {
            model_rule(&mut g, ns, &node, &tag, rule)?;
        }
    }

    tracing::info!(sheets = count, statements = g.len(), "structure model built");
    Ok(g)
}

fn generic_tag(text: &str) -> String {
    safe_segment(&text.trim().to_uppercase())
}

/// Human-readable origin of a rule value.
fn origin(value: &ValueSpec) -> String {
    match (&value.column, &value.constant) {
        (Some(column), _) => format!("column '{column}'"),
        (None, Some(constant)) => format!("constant '{constant}'"),
        (None, None) => "no value".to_string(),
    }
}

fn model_rule(
    g: &mut GraphAccumulator,
    ns: &Namespaces,
    node: &str,
    tag: &str,
    rule: &MappingRule,
) -> GraphResult<()> {
    let value = rule.object.value();
    let from = generic_tag(value.column.as_deref().or(value.constant.as_deref()).unwrap_or("value"));
    let example = |path: &str| ns.base_iri(&format!("{path}/EXAMPLE_FROM_{from}"));

    let object = match &rule.object {
        ObjectSpec::Literal { datatype, .. } => match datatype {
            Some(dt) => Term::typed(format!("Data from {}", origin(value)), dt.as_str()),
            None => Term::literal(format!("Data from {}", origin(value))),
        },
        ObjectSpec::Reference { .. } => match (&value.column, &value.constant) {
            (None, Some(constant)) => Term::iri(ns.expand(constant)),
            _ => Term::iri(example("structure")),
        },
        ObjectSpec::Place { .. } => typed_example(g, ns, example("place"), "Place")?,
        ObjectSpec::Date { .. } => {
            let date = example("date");
            g.add(&date, vocab::rdf_type(), Term::iri(ns.rico("Date")))?;
            g.add(&date, ns.rico("normalizedDateValue"), Term::literal("YYYY or YYYY-MM-DD"))?;
            g.add(&date, ns.rico("expressedDate"), Term::literal(format!("Value from {}", origin(value))))?;
            Term::iri(date)
        }
        ObjectSpec::Identifier { .. } => typed_example(g, ns, example("identifier"), "Identifier")?,
        ObjectSpec::StorageIdentifier { .. } => {
            let inst = ns.base_iri(&format!("structure/GENERIC_{tag}_INSTANTIATION"));
            let storage = example("storageid");
            let id_type = ns.base_iri("identifierType/storage");
            g.add(&inst, vocab::rdf_type(), Term::iri(ns.rico("Instantiation")))?;
            g.add(&inst, ns.rico("isOrWasInstantiationOf"), Term::iri(node))?;
            g.add(&inst, ns.rico("hasOrHadIdentifier"), Term::iri(storage.as_str()))?;
            g.add(&storage, vocab::rdf_type(), Term::iri(ns.rico("Identifier")))?;
            g.add(&storage, vocab::rdfs_label(), Term::literal(format!("Box number from {}", origin(value))))?;
            g.add(&storage, ns.rico("hasIdentifierType"), Term::iri(id_type.as_str()))?;
            g.add(&id_type, vocab::rdfs_label(), Term::literal("storage"))?;
            Term::iri(inst)
        }
        ObjectSpec::Title { .. } => typed_example(g, ns, example("title"), "Title")?,
        ObjectSpec::Appellation { .. } => typed_example(g, ns, example("appellation"), "Appellation")?,
        ObjectSpec::Agent { .. } => {
            let agent = example("agent");
            g.add(&agent, vocab::rdf_type(), Term::iri(ns.rico("Agent")))?;
            g.add(&agent, ns.rico("hasOrHadName"), Term::literal(format!("Name from {}", origin(value))))?;
            Term::iri(agent)
        }
        ObjectSpec::Structural { .. } => {
            Term::iri(ns.base_iri(&format!("structure/TARGET_ENTITY_FROM_{from}")))
        }
    };

    g.add(node, rule.predicate.as_str(), object)?;
    if rule.scope == RuleScope::ContainedRecords {
        g.add(
            node,
            vocab::rdfs_comment(),
            Term::literal(format!("{} is propagated to contained records", rule.predicate_text)),
        )?;
    }
    Ok(())
}

fn typed_example(g: &mut GraphAccumulator, ns: &Namespaces, iri: String, class: &str) -> GraphResult<Term> {
    g.add(&iri, vocab::rdf_type(), Term::iri(ns.rico(class)))?;
    Ok(Term::iri(iri))
}
