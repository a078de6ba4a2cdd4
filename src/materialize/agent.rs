//! Agent specializer.
//!
//! Whether a new agent is a person or a corporate body is decided once,
//! when its node is created, from the container (box) number of the row:
//! at or above `corporate_threshold` it is a corporate body. Later rows
//! naming the same agent reuse the node and its kind.

use std::sync::LazyLock;

use regex::Regex;

use crate::graph::{EntityKind, SemanticKey, Term};
use crate::source::SourceRow;
use crate::uri::safe_segment;

use super::{display_label, is_leaf, Link, Materializer, RowScope, RunContext};

static AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:https?://viaf\.org/viaf/|viaf:)(?P<viaf>[0-9]+)|https?://www\.wikidata\.org/entity/(?P<wikidata>Q[0-9]+))/?$",
    )
    .expect("authority pattern is valid")
});

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"));

/// Kind of agent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Person,
    CorporateBody,
}

impl AgentKind {
    /// Classify from a container index against a threshold.
    pub fn classify(container: Option<u32>, threshold: u32) -> Self {
        match container {
            Some(n) if n >= threshold => Self::CorporateBody,
            _ => Self::Person,
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::CorporateBody => "CorporateBody",
        }
    }

    fn path(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::CorporateBody => "institution",
        }
    }
}

/// Canonical IRI of a recognised authority identifier.
///
/// `viaf:N`, `https://viaf.org/viaf/N/` and the like all give
/// `http://viaf.org/viaf/N`; Wikidata ids give
/// `http://www.wikidata.org/entity/QN`.
pub fn authority_iri(text: &str) -> Option<String> {
    let caps = AUTHORITY.captures(text.trim())?;
    if let Some(id) = caps.name("viaf") {
        return Some(format!("http://viaf.org/viaf/{}", id.as_str()));
    }
    caps.name("wikidata")
        .map(|id| format!("http://www.wikidata.org/entity/{}", id.as_str()))
}

impl Materializer<'_> {
    /// Number of the row's container, read from `container_column`.
    pub fn container_index(&self, row: &SourceRow) -> Option<u32> {
        let cell = row.get(&self.config.container_column)?;
        let digits = DIGITS.find(cell)?.as_str();
        match digits.parse() {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::debug!(cell = %cell, error = %e, "container number out of range");
                None
            }
        }
    }

    pub(super) fn agent_links(
        &self,
        ctx: &mut RunContext,
        scope: &RowScope<'_>,
        predicate: &str,
        text: &str,
    ) -> Vec<Link> {
        let kind = AgentKind::classify(
            self.container_index(scope.row),
            self.config.corporate_threshold,
        );
        let label = display_label(text);
        let authority = authority_iri(text);
        let (key, iri) = match &authority {
            Some(iri) => (SemanticKey::new(EntityKind::Agent, iri), iri.clone()),
            None => {
                let key = SemanticKey::new(EntityKind::Agent, text);
                let iri = self
                    .ns
                    .base_iri(&format!("{}/{}", kind.path(), safe_segment(&key.label)));
                (key, iri)
            }
        };
        let created = self.entity(ctx, key, iri, |m, ctx, iri| {
            tracing::debug!(agent = %label, kind = kind.class(), "agent created");
            m.type_and_label(ctx, iri, kind.class(), &label);
            ctx.emit(iri, &m.rdf_type, Term::iri(m.ns.rico("Agent")));
            if authority.is_none() {
                ctx.emit(iri, &m.ns.rico("hasOrHadName"), Term::literal(label.as_str()));
            }
        });
        let Some(agent) = created else {
            return Vec::new();
        };

        let mut links = vec![Link::new(predicate, Term::iri(agent.as_str()))];
        if is_leaf(scope.profile.level) && predicate == self.ns.rico("hasSender") {
            links.push(Link::new(self.ns.rico("isAssociatedWith"), Term::iri(agent)));
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::hierarchy::{SheetPosition, SheetProfile};
    use crate::vocab::{Namespaces, RICO};

    fn run(sheet: &str, rows: &[(&str, &str)]) -> (RunContext, Vec<Vec<Link>>) {
        run_with(sheet, "hasSender", rows)
    }

    fn run_with(
        sheet: &str,
        predicate: &str,
        rows: &[(&str, &str)],
    ) -> (RunContext, Vec<Vec<Link>>) {
        let ns = Namespaces::new("http://example.org/", RICO);
        let config = PipelineConfig::default();
        let m = Materializer::new(&ns, &config);
        let mut ctx = RunContext::new();
        let profile = SheetProfile::resolve(sheet, SheetPosition { index: 0, count: 5 });
        let columns = vec!["Busta".to_string(), "Mittente".to_string()];
        let p = format!("{RICO}{predicate}");
        let mut out = Vec::new();
        for (i, (busta, name)) in rows.iter().enumerate() {
            let row = SourceRow::new(sheet, i + 2, [("Busta", *busta), ("Mittente", *name)]);
            let scope = RowScope {
                row: &row,
                profile: &profile,
                columns: &columns,
            };
            out.push(m.agent_links(&mut ctx, &scope, &p, name));
        }
        (ctx, out)
    }

    #[test]
    fn threshold_boundary() {
        assert_eq!(AgentKind::classify(Some(11), 12), AgentKind::Person);
        assert_eq!(AgentKind::classify(Some(12), 12), AgentKind::CorporateBody);
        assert_eq!(AgentKind::classify(None, 12), AgentKind::Person);
    }

    #[test]
    fn container_number_decides_the_node_path() {
        let (_, out) = run("Fascicolo", &[("11", "Mario Rossi"), ("Busta 12", "Comune di Bologna")]);
        assert_eq!(out[0][0].object, Term::iri("http://example.org/person/mario_rossi"));
        assert_eq!(
            out[1][0].object,
            Term::iri("http://example.org/institution/comune_di_bologna")
        );
    }

    #[test]
    fn first_classification_wins() {
        let (ctx, out) = run("Fascicolo", &[("3", "Mario Rossi"), ("40", "mario rossi")]);
        assert_eq!(out[0][0].object, out[1][0].object);
        assert!(ctx.graph.has_type(
            "http://example.org/person/mario_rossi",
            &format!("{RICO}Person")
        ));
        assert!(ctx.graph.subjects_of_type(&format!("{RICO}CorporateBody")).is_empty());
    }

    #[test]
    fn document_rows_also_associate_the_sender() {
        let (_, out) = run("Documento", &[("1", "Mario Rossi")]);
        assert_eq!(out[0].len(), 2);
        assert_eq!(out[0][1].predicate, format!("{RICO}isAssociatedWith"));
        let (_, out) = run("Fascicolo", &[("1", "Mario Rossi")]);
        assert_eq!(out[0].len(), 1);
    }

    #[test]
    fn other_agent_predicates_get_no_association() {
        let (_, out) = run_with("Documento", "hasCreator", &[("1", "Mario Rossi")]);
        assert_eq!(out[0].len(), 1);
        assert_eq!(out[0][0].predicate, format!("{RICO}hasCreator"));
    }

    #[test]
    fn container_digits_must_be_ascii_and_fit() {
        let ns = Namespaces::new("http://example.org/", RICO);
        let config = PipelineConfig::default();
        let m = Materializer::new(&ns, &config);
        let index = |busta: &str| {
            m.container_index(&SourceRow::new("Fascicolo", 2, [("Busta", busta)]))
        };
        assert_eq!(index("Busta 12"), Some(12));
        assert_eq!(index("Busta \u{0661}\u{0662}"), None);
        assert_eq!(index("99999999999"), None);
        assert_eq!(index(""), None);
    }

    #[test]
    fn authority_identifiers_are_canonicalized() {
        assert_eq!(
            authority_iri("viaf:12345").as_deref(),
            Some("http://viaf.org/viaf/12345")
        );
        assert_eq!(
            authority_iri("https://viaf.org/viaf/12345/").as_deref(),
            Some("http://viaf.org/viaf/12345")
        );
        assert_eq!(
            authority_iri("https://www.wikidata.org/entity/Q42").as_deref(),
            Some("http://www.wikidata.org/entity/Q42")
        );
        assert!(authority_iri("Mario Rossi").is_none());
        assert!(authority_iri("viaf:12a").is_none());
    }

    #[test]
    fn authority_agents_share_one_node_and_get_a_kind() {
        let viaf = "http://viaf.org/viaf/12345";
        let (ctx, out) = run(
            "Documento",
            &[("12", "viaf:12345"), ("3", "http://viaf.org/viaf/12345/")],
        );
        assert_eq!(out[0][0].object, Term::iri(viaf));
        assert_eq!(out[1][0].object, Term::iri(viaf));
        assert_eq!(ctx.graph.entity_count(), 1);
        assert!(ctx.graph.has_type(viaf, &format!("{RICO}CorporateBody")));
        assert!(ctx.graph.has_type(viaf, &format!("{RICO}Agent")));
        assert!(!ctx.graph.has_type(viaf, &format!("{RICO}Person")));
    }
}
