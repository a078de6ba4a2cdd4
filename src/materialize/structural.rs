//! Structural references between hierarchy levels.
//!
//! The rule's column names the row's structural parent. The edge goes
//! through the [`ContainmentTree`](crate::hierarchy::ContainmentTree)
//! first; a refused edge is reported and never reaches the graph.

use crate::graph::Term;
use crate::hierarchy::StructuralClass;
use crate::uri::is_absolute_iri;

use super::{Link, Materializer, RunContext};

impl Materializer<'_> {
    pub(super) fn structural_links(
        &self,
        ctx: &mut RunContext,
        subject: &str,
        predicate: &str,
        inverse: Option<&str>,
        upward: bool,
        parent_id: &str,
    ) -> Vec<Link> {
        let parent = if is_absolute_iri(parent_id) {
            parent_id.trim().to_string()
        } else {
            self.structural_iri(StructuralClass::RecordSet, parent_id)
        };

        if let Err(issue) = ctx.tree.link(&parent, subject) {
            ctx.report.push(issue);
            return Vec::new();
        }

        if upward {
            if let Some(inv) = inverse {
                ctx.emit(&parent, inv, Term::iri(subject));
            }
            vec![Link::new(predicate, Term::iri(parent))]
        } else {
            ctx.emit(&parent, predicate, Term::iri(subject));
            inverse
                .map(|inv| Link::new(inv, Term::iri(parent)))
                .into_iter()
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PipelineConfig;
    use crate::graph::Term;
    use crate::hierarchy::HierarchyLevel;
    use crate::materialize::{Materializer, RunContext};
    use crate::vocab::{Namespaces, RICO};

    const F1: &str = "http://example.org/RecordSet/F1";
    const D1: &str = "http://example.org/Record/D1";

    fn rico(local: &str) -> String {
        format!("{RICO}{local}")
    }

    #[test]
    fn upward_inclusion_links_both_directions() {
        let ns = Namespaces::new("http://example.org/", RICO);
        let config = PipelineConfig::default();
        let m = Materializer::new(&ns, &config);
        let mut ctx = RunContext::new();
        ctx.tree.declare(D1, HierarchyLevel::Document);
        let inv = rico("includesOrIncluded");
        let out = m.structural_links(&mut ctx, D1, &rico("isOrWasIncludedIn"), Some(inv.as_str()), true, "F1");
        assert_eq!(out[0].object, Term::iri(F1));
        assert_eq!(ctx.graph.objects(F1, &inv), vec![&Term::iri(D1)]);
        assert_eq!(ctx.tree.parent_of(D1), Some(F1));
    }

    #[test]
    fn downward_inclusion_is_written_from_the_parent() {
        let ns = Namespaces::new("http://example.org/", RICO);
        let config = PipelineConfig::default();
        let m = Materializer::new(&ns, &config);
        let mut ctx = RunContext::new();
        ctx.tree.declare(D1, HierarchyLevel::Document);
        let inv = rico("isOrWasIncludedIn");
        let out = m.structural_links(&mut ctx, D1, &rico("includesOrIncluded"), Some(inv.as_str()), false, "F1");
        assert_eq!(out, vec![super::Link::new(inv, Term::iri(F1))]);
        assert_eq!(ctx.graph.objects(F1, &rico("includesOrIncluded")), vec![&Term::iri(D1)]);
    }

    #[test]
    fn inversions_are_reported_not_inserted() {
        let ns = Namespaces::new("http://example.org/", RICO);
        let config = PipelineConfig::default();
        let m = Materializer::new(&ns, &config);
        let mut ctx = RunContext::new();
        let series = "http://example.org/RecordSet/S1";
        ctx.tree.declare(series, HierarchyLevel::Series);
        ctx.tree.declare(F1, HierarchyLevel::Folder);
        let out = m.structural_links(&mut ctx, series, &rico("isOrWasIncludedIn"), None, true, "F1");
        assert!(out.is_empty());
        assert_eq!(ctx.report.count("level_inversion"), 1);
        assert!(ctx.graph.is_empty());
    }
}
