//! Date specializer.

use crate::date::{parse_date_expr, DateExpr, DateValue};
use crate::graph::{EntityKind, SemanticKey, Term};
use crate::report::Issue;
use crate::vocab;

use super::{Link, Materializer, RunContext};

impl Materializer<'_> {
    /// Date nodes for a cell, or the raw text when it is not a date.
    ///
    /// A single value links through `predicate`; a range links its two ends
    /// through `rico:hasBeginningDate` and `rico:hasEndDate`. Every node keeps
    /// the cell text as `rico:expressedDate`.
    pub(super) fn date_links(
        &self,
        ctx: &mut RunContext,
        subject: &str,
        predicate: &str,
        text: &str,
    ) -> Vec<Link> {
        let expressed = text.trim();
        match parse_date_expr(text) {
            Some(DateExpr::Single(value)) => self
                .date_node(ctx, subject, &value, expressed)
                .map(|iri| Link::new(predicate, Term::iri(iri)))
                .into_iter()
                .collect(),
            Some(DateExpr::Range { start, end }) => {
                let mut links = Vec::with_capacity(2);
                if let Some(iri) = self.date_node(ctx, subject, &start, expressed) {
                    links.push(Link::new(self.ns.rico("hasBeginningDate"), Term::iri(iri)));
                }
                if let Some(iri) = self.date_node(ctx, subject, &end, expressed) {
                    links.push(Link::new(self.ns.rico("hasEndDate"), Term::iri(iri)));
                }
                links
            }
            None => {
                ctx.report.push(Issue::MalformedDateLiteral {
                    subject: subject.to_string(),
                    text: text.to_string(),
                });
                vec![Link::new(predicate, Term::literal(expressed))]
            }
        }
    }

    /// `{subject}_{digits}`, scoped to the owning subject.
    fn date_node(
        &self,
        ctx: &mut RunContext,
        subject: &str,
        value: &DateValue,
        expressed: &str,
    ) -> Option<String> {
        let key = SemanticKey::scoped(EntityKind::Date, &value.raw, subject);
        let iri = format!("{subject}_{}", value.raw);
        self.entity(ctx, key, iri, |m, ctx, iri| {
            ctx.emit(iri, &m.rdf_type, Term::iri(m.ns.rico("Date")));
            ctx.emit(
                iri,
                &m.ns.rico("normalizedDateValue"),
                Term::typed(value.normalized.as_str(), vocab::xsd(value.precision.xsd_local())),
            );
            ctx.emit(
                iri,
                &m.ns.base_iri("datePrecision"),
                Term::literal(value.precision.as_str()),
            );
            ctx.emit(iri, &m.ns.rico("expressedDate"), Term::literal(expressed));
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PipelineConfig;
    use crate::graph::Term;
    use crate::materialize::{Materializer, RunContext};
    use crate::vocab::{self, Namespaces, RICO};

    const SUBJECT: &str = "http://example.org/Record/D1";

    fn links(text: &str) -> (RunContext, Vec<super::Link>) {
        let ns = Namespaces::new("http://example.org/", RICO);
        let config = PipelineConfig::default();
        let m = Materializer::new(&ns, &config);
        let mut ctx = RunContext::new();
        let predicate = format!("{RICO}isAssociatedWithDate");
        let out = m.date_links(&mut ctx, SUBJECT, &predicate, text);
        (ctx, out)
    }

    #[test]
    fn full_date_is_day_precision() {
        let (ctx, out) = links("19230405");
        assert_eq!(out.len(), 1);
        let node = format!("{SUBJECT}_19230405");
        assert_eq!(out[0].object, Term::iri(&node));
        assert_eq!(
            ctx.graph.objects(&node, &format!("{RICO}normalizedDateValue")),
            vec![&Term::typed("1923-04-05", vocab::xsd("date"))]
        );
        assert_eq!(
            ctx.graph.objects(&node, "http://example.org/datePrecision"),
            vec![&Term::literal("day")]
        );
    }

    #[test]
    fn year_is_year_precision() {
        let (ctx, out) = links("1923");
        let node = format!("{SUBJECT}_1923");
        assert_eq!(out[0].object, Term::iri(&node));
        assert_eq!(
            ctx.graph.objects(&node, &format!("{RICO}normalizedDateValue")),
            vec![&Term::typed("1923", vocab::xsd("gYear"))]
        );
    }

    #[test]
    fn ranges_link_both_ends() {
        let (_, out) = links("1923-1925");
        let predicates: Vec<String> = out.iter().map(|l| l.predicate.clone()).collect();
        assert_eq!(
            predicates,
            vec![format!("{RICO}hasBeginningDate"), format!("{RICO}hasEndDate")]
        );
        let (ctx, out) = links("19230405-19250101");
        assert_eq!(out.len(), 2);
        assert_eq!(
            ctx.graph.objects(&format!("{SUBJECT}_19250101"), "http://example.org/datePrecision"),
            vec![&Term::literal("day")]
        );
    }

    #[test]
    fn range_ends_keep_the_cell_text() {
        let (ctx, out) = links(" 1923 / 1925 ");
        assert_eq!(out.len(), 2);
        let expressed = format!("{RICO}expressedDate");
        for end in ["1923", "1925"] {
            assert_eq!(
                ctx.graph.objects(&format!("{SUBJECT}_{end}"), &expressed),
                vec![&Term::literal("1923 / 1925")]
            );
        }
    }

    #[test]
    fn malformed_text_stays_a_literal() {
        let (ctx, out) = links("circa 1920");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].object, Term::literal("circa 1920"));
        assert_eq!(ctx.report.count("malformed_date"), 1);
        assert!(ctx.graph.is_empty());
    }
}
