//! The conversion run.
//!
//! Stages, strictly in this order:
//! 1. every rule sheet, in table order: each row through each rule, then
//!    the deferred buffer is flushed for the completed sheet
//! 2. leftover deferred attributes are reported as orphans
//! 3. the enrichment pass, once, over the finished graph

use crate::config::PipelineConfig;
use crate::error::ArchiveResult;
use crate::geo::{enrich_places, EnrichmentStats, GeoResolver};
use crate::hierarchy::{SheetPosition, SheetProfile};
use crate::mapping::{MappingRule, RuleTable};
use crate::materialize::{Materializer, Outcome, RowScope, RunContext};
use crate::report::Issue;
use crate::source::RowSource;

/// Everything a run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub context: RunContext,
    /// `None` when enrichment was not requested.
    pub enrichment: Option<EnrichmentStats>,
}

/// Applies a rule table to instance sheets.
#[derive(Debug)]
pub struct Converter<'a> {
    config: &'a PipelineConfig,
    rules: &'a RuleTable,
}

impl<'a> Converter<'a> {
    pub fn new(config: &'a PipelineConfig, rules: &'a RuleTable) -> Self {
        Self { config, rules }
    }

    /// Full run into a fresh context; enrichment runs when a resolver is
    /// given.
    pub fn run(
        &self,
        source: &impl RowSource,
        resolver: Option<&mut GeoResolver>,
    ) -> ArchiveResult<RunOutput> {
        let mut ctx = RunContext::new();
        for (sheet, reason) in &self.rules.skipped {
            ctx.report.push(Issue::MappingSheetSkipped {
                sheet: sheet.clone(),
                reason: reason.clone(),
            });
        }
        self.materialize(source, &mut ctx)?;
        let enrichment =
            resolver.map(|r| enrich_places(&mut ctx, &self.rules.namespaces, r));
        Ok(RunOutput {
            context: ctx,
            enrichment,
        })
    }

    /// The main pass: every sheet, row and rule into `ctx`.
    ///
    /// Re-running over the same input and context adds no statements.
    pub fn materialize(&self, source: &impl RowSource, ctx: &mut RunContext) -> ArchiveResult<()> {
        let m = Materializer::new(&self.rules.namespaces, self.config);
        let count = self.rules.sheets.len();

        for (index, sheet) in self.rules.sheets.iter().enumerate() {
            let profile = SheetProfile::resolve(&sheet.name, SheetPosition { index, count });
            let Some(instance) = source.find_sheet(&sheet.name) else {
                ctx.report.push(Issue::SheetNotFound {
                    sheet: sheet.name.clone(),
                });
                continue;
            };
            let columns = source.columns(&instance)?;
            let rows = source.rows(&instance)?;

            let rules: Vec<&MappingRule> = sheet
                .rules
                .iter()
                .filter(|rule| {
                    let usable = rule.subject.template.is_some()
                        || columns
                            .iter()
                            .any(|c| c.eq_ignore_ascii_case(&rule.subject.column));
                    if !usable {
                        tracing::warn!(
                            sheet = %sheet.name,
                            column = %rule.subject.column,
                            rule = rule.row,
                            "subject column missing from instance sheet, rule ignored"
                        );
                    }
                    usable
                })
                .collect();
            if rules.is_empty() {
                ctx.report.push(Issue::MappingSheetSkipped {
                    sheet: sheet.name.clone(),
                    reason: "the instance sheet has none of the subject columns".into(),
                });
                continue;
            }

            tracing::info!(
                sheet = %sheet.name,
                level = %profile.level,
                class = profile.class.local_name(),
                rows = rows.len(),
                rules = rules.len(),
                "materializing sheet"
            );
            for row in rows {
                ctx.report.rows_read += 1;
                let scope = RowScope {
                    row,
                    profile: &profile,
                    columns,
                };
                let mut resolved = false;
                for rule in &rules {
                    if m.apply(ctx, rule, &scope) != Outcome::MissingSubject {
                        resolved = true;
                    }
                }
                if !resolved {
                    ctx.report.push(Issue::MissingSubject {
                        sheet: sheet.name.clone(),
                        row: row.index(),
                    });
                }
            }

            let propagated = ctx.deferred.flush(profile.level, &ctx.tree);
            let flushed = propagated.len();
            for statement in propagated {
                ctx.emit_statement(statement);
            }
            ctx.report.sheets_processed += 1;
            tracing::info!(
                sheet = %sheet.name,
                propagated = flushed,
                statements = ctx.graph.len(),
                "sheet done"
            );
        }

        for issue in ctx.deferred.drain_orphans() {
            ctx.report.push(issue);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Term;
    use crate::mapping::parse_rule_table;
    use crate::source::SheetSet;
    use crate::vocab::RICO;

    const HEADER: [&str; 6] = [
        "Subject",
        "Predicate",
        "Object",
        "Column Subject",
        "Column Object",
        "Kind",
    ];

    fn mapping() -> SheetSet {
        let mut m = SheetSet::new();
        m.add_sheet(
            "Fascicolo",
            &HEADER,
            &[&["", "rico:hasOrHadTitle", "", "Codice", "Titolo", ""]],
        );
        m.add_sheet(
            "Documento",
            &HEADER,
            &[&["", "rico:isOrWasIncludedIn", "", "Segnatura", "Fascicolo", ""]],
        );
        m
    }

    #[test]
    fn missing_instance_sheet_is_reported_and_skipped() {
        let config = PipelineConfig::default();
        let rules = parse_rule_table(&mapping(), &config).unwrap();
        let mut instances = SheetSet::new();
        instances.add_sheet("fascicolo", &["Codice", "Titolo"], &[&["F1", "Lettere"]]);
        let out = Converter::new(&config, &rules).run(&instances, None).unwrap();
        let report = &out.context.report;
        assert_eq!(report.count("sheet_not_found"), 1);
        assert_eq!(report.sheets_processed, 1);
        assert!(out.enrichment.is_none());
    }

    #[test]
    fn rows_without_subject_are_reported() {
        let config = PipelineConfig::default();
        let rules = parse_rule_table(&mapping(), &config).unwrap();
        let mut instances = SheetSet::new();
        instances.add_sheet("Fascicolo", &["Codice", "Titolo"], &[&["", "Senza codice"]]);
        instances.add_sheet("Documento", &["Segnatura", "Fascicolo"], &[]);
        let out = Converter::new(&config, &rules).run(&instances, None).unwrap();
        assert_eq!(out.context.report.count("missing_subject"), 1);
    }

    #[test]
    fn containment_follows_the_parent_column() {
        let config = PipelineConfig::default();
        let rules = parse_rule_table(&mapping(), &config).unwrap();
        let mut instances = SheetSet::new();
        instances.add_sheet("Fascicolo", &["Codice", "Titolo"], &[&["F1", "Lettere"]]);
        instances.add_sheet("Documento", &["Segnatura", "Fascicolo"], &[&["D1", "F1"]]);
        let out = Converter::new(&config, &rules).run(&instances, None).unwrap();
        let g = &out.context.graph;
        assert_eq!(
            g.objects("http://example.org/Record/D1", &format!("{RICO}isOrWasIncludedIn")),
            vec![&Term::iri("http://example.org/RecordSet/F1")]
        );
        assert_eq!(
            g.objects("http://example.org/RecordSet/F1", &format!("{RICO}includesOrIncluded")),
            vec![&Term::iri("http://example.org/Record/D1")]
        );
        assert!(out.context.report.is_clean());
    }

    #[test]
    fn instance_sheets_lacking_subject_columns_are_skipped() {
        let config = PipelineConfig::default();
        let rules = parse_rule_table(&mapping(), &config).unwrap();
        let mut instances = SheetSet::new();
        instances.add_sheet("Fascicolo", &["Altro"], &[&["x"]]);
        instances.add_sheet("Documento", &["Segnatura", "Fascicolo"], &[]);
        let out = Converter::new(&config, &rules).run(&instances, None).unwrap();
        assert_eq!(out.context.report.count("mapping_sheet_skipped"), 1);
        assert_eq!(out.context.report.count("missing_subject"), 0);
    }
}
