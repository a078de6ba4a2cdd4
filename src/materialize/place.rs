//! Place specializer.
//!
//! Places are created bare: a type and a label. Coordinates and the
//! GeoNames link are added later by the enrichment pass.

use crate::graph::{EntityKind, SemanticKey, Term};
use crate::uri::{is_absolute_iri, safe_segment};

use super::{display_label, Link, Materializer, RunContext};

impl Materializer<'_> {
    pub(super) fn place_links(&self, ctx: &mut RunContext, predicate: &str, text: &str) -> Vec<Link> {
        if is_absolute_iri(text) || self.ns.is_known_prefixed(text) {
            return vec![Link::new(predicate, Term::iri(self.ns.expand(text)))];
        }
        let key = SemanticKey::new(EntityKind::Place, text);
        let iri = self.ns.base_iri(&format!("place/{}", safe_segment(&key.label)));
        let label = display_label(text);
        self.entity(ctx, key, iri, |m, ctx, iri| {
            m.type_and_label(ctx, iri, "Place", &label);
        })
        .map(|iri| Link::new(predicate, Term::iri(iri)))
        .into_iter()
        .collect()
    }
}
