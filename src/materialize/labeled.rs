//! Identifier, title and appellation specializers, plus box identifiers
//! attached through an instantiation.

use crate::graph::{EntityKind, SemanticKey, Term};
use crate::uri::{safe_segment, title_suffix};

use super::{display_label, Link, Materializer, RunContext};

/// Labeled entity kinds sharing one construction shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Labeled {
    Identifier,
    Title,
    Appellation,
}

impl Labeled {
    fn entity_kind(self) -> EntityKind {
        match self {
            Self::Identifier => EntityKind::Identifier,
            Self::Title => EntityKind::Title,
            Self::Appellation => EntityKind::Appellation,
        }
    }

    fn class(self) -> &'static str {
        match self {
            Self::Identifier => "Identifier",
            Self::Title => "Title",
            Self::Appellation => "Appellation",
        }
    }

    /// Path of the node IRI below the base namespace.
    fn path(self, normalized: &str) -> String {
        match self {
            Self::Identifier => format!("identifier/{}", safe_segment(normalized)),
            Self::Title => format!("title/{}", title_suffix(normalized)),
            Self::Appellation => format!("appellation/{}", safe_segment(normalized)),
        }
    }
}

impl Materializer<'_> {
    pub(super) fn labeled_links(
        &self,
        ctx: &mut RunContext,
        kind: Labeled,
        predicate: &str,
        text: &str,
    ) -> Vec<Link> {
        let key = SemanticKey::new(kind.entity_kind(), text);
        let iri = self.ns.base_iri(&kind.path(&key.label));
        let label = display_label(text);
        self.entity(ctx, key, iri, |m, ctx, iri| {
            m.type_and_label(ctx, iri, kind.class(), &label);
            ctx.emit(iri, &m.ns.rico("textualValue"), Term::literal(label.as_str()));
        })
        .map(|iri| Link::new(predicate, Term::iri(iri)))
        .into_iter()
        .collect()
    }

    /// A box identifier: `{subject}_instantiation` is an instantiation of
    /// the subject and carries the storage identifier.
    pub(super) fn storage_links(
        &self,
        ctx: &mut RunContext,
        subject: &str,
        predicate: &str,
        text: &str,
    ) -> Vec<Link> {
        let key = SemanticKey::new(EntityKind::StorageIdentifier, text);
        let iri = self.ns.base_iri(&format!("storageid/{}", safe_segment(&key.label)));
        let label = display_label(text);
        let Some(storage) = self.entity(ctx, key, iri, |m, ctx, iri| {
            m.type_and_label(ctx, iri, "Identifier", &label);
            let id_type = m.ns.base_iri("identifierType/storage");
            ctx.emit(iri, &m.ns.rico("hasIdentifierType"), Term::iri(id_type.as_str()));
            m.type_and_label(ctx, &id_type, "IdentifierType", "storage");
        }) else {
            return Vec::new();
        };

        let key = SemanticKey::scoped(EntityKind::Instantiation, "instantiation", subject);
        let Some(inst) = self.entity(ctx, key, format!("{subject}_instantiation"), |m, ctx, iri| {
            ctx.emit(iri, &m.rdf_type, Term::iri(m.ns.rico("Instantiation")));
            ctx.emit(iri, &m.ns.rico("isOrWasInstantiationOf"), Term::iri(subject));
        }) else {
            return Vec::new();
        };
        ctx.emit(&inst, &self.ns.rico("hasOrHadIdentifier"), Term::iri(storage));
        vec![Link::new(predicate, Term::iri(inst))]
    }
}

#[cfg(test)]
mod tests {
    use super::Labeled;
    use crate::config::PipelineConfig;
    use crate::graph::Term;
    use crate::materialize::{Materializer, RunContext};
    use crate::vocab::{Namespaces, RICO};

    fn ns() -> Namespaces {
        Namespaces::new("http://example.org/", RICO)
    }

    #[test]
    fn titles_get_a_readable_suffix() {
        let ns = ns();
        let config = PipelineConfig::default();
        let m = Materializer::new(&ns, &config);
        let mut ctx = RunContext::new();
        let p = format!("{RICO}hasOrHadTitle");
        let out = m.labeled_links(&mut ctx, Labeled::Title, &p, "Lettere  al sindaco");
        assert_eq!(out[0].object, Term::iri("http://example.org/title/lettere_al_sindaco"));
        assert_eq!(
            ctx.graph.objects("http://example.org/title/lettere_al_sindaco", &format!("{RICO}textualValue")),
            vec![&Term::literal("Lettere al sindaco")]
        );
    }

    #[test]
    fn same_label_different_kind_is_a_different_node() {
        let ns = ns();
        let config = PipelineConfig::default();
        let m = Materializer::new(&ns, &config);
        let mut ctx = RunContext::new();
        let a = m.labeled_links(&mut ctx, Labeled::Identifier, "http://example.org/p", "A1");
        let b = m.labeled_links(&mut ctx, Labeled::Appellation, "http://example.org/p", "A1");
        assert_ne!(a[0].object, b[0].object);
        assert_eq!(ctx.graph.entity_count(), 2);
    }

    #[test]
    fn box_identifier_goes_through_an_instantiation() {
        let ns = ns();
        let config = PipelineConfig::default();
        let m = Materializer::new(&ns, &config);
        let mut ctx = RunContext::new();
        let subject = "http://example.org/RecordSet/F1";
        let p = format!("{RICO}hasOrHadInstantiation");
        let out = m.storage_links(&mut ctx, subject, &p, "12");
        let inst = format!("{subject}_instantiation");
        assert_eq!(out[0].object, Term::iri(&inst));
        assert_eq!(
            ctx.graph.objects(&inst, &format!("{RICO}hasOrHadIdentifier")),
            vec![&Term::iri("http://example.org/storageid/12")]
        );
        assert_eq!(
            ctx.graph.objects("http://example.org/storageid/12", &format!("{RICO}hasIdentifierType")),
            vec![&Term::iri("http://example.org/identifierType/storage")]
        );
        assert!(ctx.graph.has(&inst, &format!("{RICO}isOrWasInstantiationOf")));
    }
}
