//! Parsing mapping sheets into a [`RuleTable`].

use crate::config::PipelineConfig;
use crate::error::{ArchiveResult, MappingError};
use crate::source::{RowSource, SourceRow};
use crate::vocab::{self, Namespaces, TEMP_PREFIX};

use super::{
    local_name, MappingRule, ObjectKind, ObjectSpec, RuleScope, RuleSheet, RuleTable, SubjectSpec,
    ValueSpec,
};

/// Columns every mapping sheet must have. `Kind` is optional.
pub const REQUIRED_COLUMNS: [&str; 5] =
    ["Subject", "Predicate", "Object", "Column Subject", "Column Object"];

/// Control predicates that select behaviour instead of naming an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    BoxIdentifier,
    Sender,
    PropagateSender,
    PropagateLocation,
    DateProcessing,
}

impl Control {
    fn from_local(local: &str) -> Option<Self> {
        Some(match local {
            "boxIdentifier" => Self::BoxIdentifier,
            "hasSender" => Self::Sender,
            "propagateSender" => Self::PropagateSender,
            "propagateLocation" => Self::PropagateLocation,
            "dateProcessing" => Self::DateProcessing,
            _ => return None,
        })
    }

    /// Ontology predicate the control predicate is rewritten to.
    fn predicate(self, ns: &Namespaces) -> String {
        ns.rico(match self {
            Self::BoxIdentifier => "hasOrHadInstantiation",
            Self::Sender | Self::PropagateSender => "hasSender",
            Self::PropagateLocation => "hasOrHadLocation",
            Self::DateProcessing => "isAssociatedWithDate",
        })
    }

    fn scope(self) -> RuleScope {
        match self {
            Self::PropagateSender | Self::PropagateLocation => RuleScope::ContainedRecords,
            _ => RuleScope::Subject,
        }
    }

    fn object(self, value: ValueSpec) -> ObjectSpec {
        match self {
            Self::BoxIdentifier => ObjectSpec::StorageIdentifier { value },
            Self::Sender | Self::PropagateSender => ObjectSpec::Agent { value },
            Self::PropagateLocation => ObjectSpec::Place { value },
            Self::DateProcessing => ObjectSpec::Date { value },
        }
    }
}

/// Parse every usable mapping sheet of `source`.
///
/// Sheets matching `skip_sheet_patterns` are ignored; sheets lacking the
/// required columns are recorded in [`RuleTable::skipped`]. Fails only if
/// no sheet yields a rule.
pub fn parse_rule_table(source: &impl RowSource, config: &PipelineConfig) -> ArchiveResult<RuleTable> {
    let mut namespaces = config.namespaces();
    let mut sheets = Vec::new();
    let mut skipped = Vec::new();

    for name in source.sheet_names() {
        if config.skips_sheet(&name) {
            tracing::debug!(sheet = %name, "mapping sheet excluded by pattern");
            continue;
        }
        if config.max_sheets.is_some_and(|max| sheets.len() >= max) {
            tracing::debug!(sheet = %name, "mapping sheet beyond max_sheets");
            continue;
        }

        let columns = source.columns(&name)?;
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|req| !columns.iter().any(|c| c.eq_ignore_ascii_case(req)))
            .map(|req| req.to_string())
            .collect();
        if !missing.is_empty() {
            let err = MappingError::MissingColumns {
                sheet: name.clone(),
                missing,
            };
            tracing::warn!(sheet = %name, "{err}");
            skipped.push((name, err.to_string()));
            continue;
        }

        let rows = source.rows(&name)?;
        for row in rows {
            for column in ["Predicate", "Object"] {
                if let Some(term) = row.get(column) {
                    namespaces.bind_prefix_of(term);
                }
            }
        }

        let rules: Vec<MappingRule> = rows
            .iter()
            .filter_map(|row| parse_rule(&name, row, &namespaces))
            .collect();
        if rules.is_empty() {
            skipped.push((name, "no usable rules".to_string()));
            continue;
        }
        tracing::info!(sheet = %name, rules = rules.len(), "mapping sheet parsed");
        sheets.push(RuleSheet { name, rules });
    }

    if sheets.is_empty() {
        return Err(MappingError::Empty.into());
    }
    Ok(RuleTable {
        sheets,
        skipped,
        namespaces,
    })
}

/// Parse one mapping row. Rows without a subject column or predicate
/// yield `None`.
pub fn parse_rule(sheet: &str, row: &SourceRow, ns: &Namespaces) -> Option<MappingRule> {
    let column = row.get("Column Subject")?;
    let predicate_text = row.get("Predicate")?;
    let subject = SubjectSpec {
        column: column.to_string(),
        template: row.get("Subject").map(str::to_string),
    };
    let object_text = row.get("Object");
    let object_column = row.get("Column Object");

    let (predicate, object, scope) = match vocab::split_prefixed(predicate_text) {
        Some((prefix, local)) if prefix == TEMP_PREFIX => {
            let Some(control) = Control::from_local(local) else {
                tracing::warn!(sheet, row = row.index(), predicate = predicate_text, "unknown control predicate, rule ignored");
                return None;
            };
            let value = ValueSpec {
                column: object_column.map(str::to_string),
                constant: object_text.map(str::to_string),
            };
            (control.predicate(ns), control.object(value), control.scope())
        }
        _ => {
            let predicate = ns.expand(predicate_text);
            let kind = match row.get("Kind") {
                Some(text) => ObjectKind::parse(text).unwrap_or_else(|| {
                    tracing::warn!(sheet, row = row.index(), kind = text, "unknown object kind, using Literal");
                    ObjectKind::Literal
                }),
                None => ObjectKind::infer(&predicate, object_text, object_column),
            };
            let object = build_object(kind, &predicate, object_text, object_column, ns);
            (predicate, object, RuleScope::Subject)
        }
    };

    Some(MappingRule {
        sheet: sheet.to_string(),
        row: row.index(),
        subject,
        predicate_text: predicate_text.to_string(),
        predicate,
        object,
        scope,
    })
}

fn build_object(
    kind: ObjectKind,
    predicate: &str,
    object_text: Option<&str>,
    object_column: Option<&str>,
    ns: &Namespaces,
) -> ObjectSpec {
    let xsd_local = object_text.and_then(|o| {
        o.split_once(':')
            .filter(|(p, l)| p.eq_ignore_ascii_case("xsd") && !l.is_empty())
            .map(|(_, l)| l)
    });

    if kind == ObjectKind::Literal {
        if let Some(local) = xsd_local {
            return match object_column {
                Some(column) => ObjectSpec::Literal {
                    value: ValueSpec {
                        column: Some(column.to_string()),
                        constant: None,
                    },
                    datatype: Some(vocab::xsd(local)),
                },
                None => ObjectSpec::Literal {
                    value: ValueSpec {
                        column: None,
                        constant: Some(local.to_string()),
                    },
                    datatype: None,
                },
            };
        }
    }

    let value = ValueSpec {
        column: object_column.map(str::to_string),
        constant: object_text.map(str::to_string),
    };
    tracing::trace!(predicate = local_name(predicate), %kind, "rule object");
    ObjectSpec::for_kind(kind, value, predicate, ns)
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn ns() -> Namespaces {
        Namespaces::new("http://example.org/", RICO)
    }

    fn rule(cells: [&str; 6]) -> Option<MappingRule> {
        let row = SourceRow::new("Fascicolo", 2, HEADER.iter().zip(cells.iter()).map(|(h, v)| (*h, *v)));
        parse_rule("Fascicolo", &row, &ns())
    }

    #[test]
    fn control_predicates_are_rewritten() {
        let r = rule(["", "temp:propagateSender", "", "Codice", "Mittente", ""]).unwrap();
        assert_eq!(r.predicate, format!("{RICO}hasSender"));
        assert_eq!(r.scope, RuleScope::ContainedRecords);
        assert_eq!(r.kind(), ObjectKind::Agent);

        let r = rule(["", "temp:boxIdentifier", "", "Codice", "Busta", ""]).unwrap();
        assert_eq!(r.predicate, format!("{RICO}hasOrHadInstantiation"));
        assert!(matches!(r.object, ObjectSpec::StorageIdentifier { .. }));

        let r = rule(["", "temp:dateProcessing", "", "Codice", "Data", ""]).unwrap();
        assert_eq!(r.predicate, format!("{RICO}isAssociatedWithDate"));
        assert_eq!(r.kind(), ObjectKind::Date);
    }

    #[test]
    fn unknown_control_predicates_are_ignored() {
        assert!(rule(["", "temp:mystery", "", "Codice", "X", ""]).is_none());
    }

    #[test]
    fn explicit_kind_overrides_inference() {
        let r = rule(["", "rico:note", "", "Codice", "Luogo", "Place"]).unwrap();
        assert_eq!(r.kind(), ObjectKind::Place);
        let r = rule(["", "rico:note", "", "Codice", "Luogo", "bogus"]).unwrap();
        assert_eq!(r.kind(), ObjectKind::Literal);
    }

    #[test]
    fn xsd_objects_become_typed_or_plain_literals() {
        let r = rule(["", "rico:recordResourceExtent", "xsd:integer", "Codice", "Carte", ""]).unwrap();
        match r.object {
            ObjectSpec::Literal { value, datatype } => {
                assert_eq!(value.column.as_deref(), Some("Carte"));
                assert_eq!(datatype, Some(vocab::xsd("integer")));
            }
            other => panic!("unexpected {other:?}"),
        }
        let r = rule(["", "rico:conditionsOfAccess", "xsd:open", "Codice", "", ""]).unwrap();
        match r.object {
            ObjectSpec::Literal { value, datatype } => {
                assert_eq!(value.constant.as_deref(), Some("open"));
                assert_eq!(datatype, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rows_without_subject_or_predicate_are_skipped() {
        assert!(rule(["", "rico:note", "", "", "Note", ""]).is_none());
        assert!(rule(["", "", "", "Codice", "Note", ""]).is_none());
    }

    #[test]
    fn table_skips_incomplete_and_excluded_sheets() {
        let mut source = SheetSet::new();
        source.add_sheet(
            "Serie",
            &HEADER,
            &[&["", "rico:hasOrHadTitle", "", "Codice", "Titolo", ""]],
        );
        source.add_sheet("Sottoserie", &["Subject", "Predicate"], &[&["x", "y"]]);
        source.add_sheet("Immagini", &HEADER, &[&["", "rico:note", "", "File", "Nota", ""]]);

        let table = parse_rule_table(&source, &PipelineConfig::default()).unwrap();
        assert_eq!(table.sheets.len(), 1);
        assert_eq!(table.rule_count(), 1);
        assert_eq!(table.skipped.len(), 1);
        assert_eq!(table.skipped[0].0, "Sottoserie");
        assert!(table.skipped[0].1.contains("Column Subject"));
    }

    #[test]
    fn unknown_prefixes_are_bound_under_the_base() {
        let mut source = SheetSet::new();
        source.add_sheet("Serie", &HEADER, &[&["", "ex:custom", "", "Codice", "Nota", ""]]);
        let table = parse_rule_table(&source, &PipelineConfig::default()).unwrap();
        assert!(table
            .namespaces
            .iter()
            .any(|(p, iri)| p == "ex" && iri == "http://example.org/ex#"));
        assert_eq!(table.sheets[0].rules[0].predicate, "http://example.org/ex#custom");
    }

    #[test]
    fn empty_table_is_an_error() {
        let source = SheetSet::new();
        assert!(parse_rule_table(&source, &PipelineConfig::default()).is_err());
    }

    #[test]
    fn max_sheets_caps_the_table() {
        let mut source = SheetSet::new();
        for name in ["Serie", "Sottoserie", "Fascicolo"] {
            source.add_sheet(name, &HEADER, &[&["", "rico:note", "", "Codice", "Nota", ""]]);
        }
        let config = PipelineConfig {
            max_sheets: Some(2),
            ..PipelineConfig::default()
        };
        let table = parse_rule_table(&source, &config).unwrap();
        assert_eq!(table.sheets.len(), 2);
    }
}
