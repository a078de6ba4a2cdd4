//! The enrichment pass over place nodes.

use crate::graph::Term;
use crate::materialize::RunContext;
use crate::report::Issue;
use crate::vocab::{self, Namespaces, GEO, GN};

use super::{GeoRecord, GeoResolver, Lookup};

/// Counters for one enrichment pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentStats {
    /// Place nodes examined.
    pub scanned: usize,
    /// Places that already carried a GeoNames link.
    pub skipped: usize,
    pub resolved_local: usize,
    pub resolved_remote: usize,
    pub unresolved: usize,
    pub failed: usize,
}

impl std::fmt::Display for EnrichmentStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "places: {} scanned, {} already enriched, {} local, {} remote, {} unresolved, {} failed",
            self.scanned,
            self.skipped,
            self.resolved_local,
            self.resolved_remote,
            self.unresolved,
            self.failed
        )
    }
}

/// Resolve every `rico:Place` without an `owl:sameAs` and write the match.
///
/// Safe to run again: enriched places are skipped. Lookup failures are
/// reported on the context and leave the place bare.
pub fn enrich_places(ctx: &mut RunContext, ns: &Namespaces, resolver: &mut GeoResolver) -> EnrichmentStats {
    let same_as = vocab::owl_same_as();
    let label_predicate = vocab::rdfs_label();
    let mut stats = EnrichmentStats::default();

    for place in ctx.graph.subjects_of_type(&ns.rico("Place")) {
        stats.scanned += 1;
        if ctx.graph.has(&place, &same_as) {
            stats.skipped += 1;
            continue;
        }
        let label = ctx
            .graph
            .objects(&place, &label_predicate)
            .into_iter()
            .find_map(Term::as_literal)
            .map(str::to_string);
        let Some(label) = label else {
            stats.unresolved += 1;
            continue;
        };

        match resolver.resolve(&label) {
            Lookup::Reference(record) => {
                write_record(ctx, &place, &record);
                stats.resolved_local += 1;
            }
            Lookup::Remote(record) => {
                write_record(ctx, &place, &record);
                stats.resolved_remote += 1;
            }
            Lookup::Unresolved => {
                tracing::debug!(label = %label, "place left unresolved");
                stats.unresolved += 1;
            }
            Lookup::Failed(e) => {
                stats.failed += 1;
                ctx.report.push(Issue::ExternalLookupFailure {
                    label,
                    message: e.to_string(),
                });
            }
        }
    }

    ctx.report.unresolved_places = stats.unresolved + stats.failed;
    tracing::info!(
        scanned = stats.scanned,
        local = stats.resolved_local,
        remote = stats.resolved_remote,
        unresolved = stats.unresolved,
        failed = stats.failed,
        remote_calls = resolver.remote_calls(),
        "enrichment pass complete"
    );
    stats
}

fn write_record(ctx: &mut RunContext, place: &str, record: &GeoRecord) {
    let decimal = vocab::xsd("decimal");
    ctx.emit(place, &vocab::owl_same_as(), Term::iri(record.iri()));
    ctx.emit(
        place,
        &format!("{GEO}lat"),
        Term::typed(record.latitude.trim(), decimal.as_str()),
    );
    ctx.emit(
        place,
        &format!("{GEO}long"),
        Term::typed(record.longitude.trim(), decimal.as_str()),
    );
    if let Some(class) = &record.feature_class {
        ctx.emit(place, &format!("{GN}featureClass"), Term::iri(format!("{GN}{class}")));
        if let Some(code) = &record.feature_code {
            ctx.emit(
                place,
                &format!("{GN}featureCode"),
                Term::iri(format!("{GN}{class}.{code}")),
            );
        }
    }
}
