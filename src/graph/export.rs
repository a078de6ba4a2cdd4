//! RDF output backed by oxigraph.
//!
//! Converts accumulated statements into `oxigraph` triples, serializes them
//! as Turtle or N-Triples in insertion order, and can load them into an
//! in-memory [`Store`] for SPARQL inspection.

use std::io::Write;
use std::str::FromStr;

use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::{GraphName, Literal, NamedNode, Quad, Triple};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;

use crate::error::ExportError;
use crate::vocab::Namespaces;

use super::{GraphAccumulator, Statement, Term};

/// Result type for export operations.
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Supported output syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RdfOutput {
    #[default]
    Turtle,
    NTriples,
}

impl RdfOutput {
    fn format(self) -> RdfFormat {
        match self {
            Self::Turtle => RdfFormat::Turtle,
            Self::NTriples => RdfFormat::NTriples,
        }
    }
}

impl FromStr for RdfOutput {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "turtle" | "ttl" => Ok(Self::Turtle),
            "ntriples" | "n-triples" | "nt" => Ok(Self::NTriples),
            other => Err(ExportError::UnknownFormat {
                format: other.to_string(),
            }),
        }
    }
}

fn named(iri: &str) -> ExportResult<NamedNode> {
    NamedNode::new(iri).map_err(|e| ExportError::Term {
        message: format!("<{iri}>: {e}"),
    })
}

/// Convert one statement into an oxigraph triple.
pub fn to_triple(statement: &Statement) -> ExportResult<Triple> {
    let subject = named(&statement.subject)?;
    let predicate = named(&statement.predicate)?;
    let triple = match &statement.object {
        Term::Iri(iri) => Triple::new(subject, predicate, named(iri)?),
        Term::Literal {
            value,
            datatype: None,
        } => Triple::new(subject, predicate, Literal::new_simple_literal(value)),
        Term::Literal {
            value,
            datatype: Some(dt),
        } => Triple::new(
            subject,
            predicate,
            Literal::new_typed_literal(value, named(dt)?),
        ),
    };
    Ok(triple)
}

/// Serialize the whole graph to `writer`, returning the writer.
///
/// Turtle output declares every prefix bound in `namespaces`.
pub fn write_graph<W: Write>(
    graph: &GraphAccumulator,
    namespaces: &Namespaces,
    output: RdfOutput,
    writer: W,
) -> ExportResult<W> {
    let mut serializer = RdfSerializer::from_format(output.format());
    if output == RdfOutput::Turtle {
        for (prefix, iri) in namespaces.iter() {
            serializer = serializer
                .with_prefix(prefix, iri)
                .map_err(|e| ExportError::Term {
                    message: format!("prefix {prefix}: <{iri}>: {e}"),
                })?;
        }
    }

    let mut out = serializer.for_writer(writer);
    for statement in graph.statements() {
        let triple = to_triple(statement)?;
        out.serialize_triple(&triple)
            .map_err(|source| ExportError::Io { source })?;
    }
    let writer = out.finish().map_err(|source| ExportError::Io { source })?;
    tracing::info!(statements = graph.len(), ?output, "graph serialized");
    Ok(writer)
}

/// In-memory SPARQL view over a finished graph.
pub struct GraphStore {
    store: Store,
}

impl GraphStore {
    /// Load every statement of the graph into a fresh store.
    pub fn from_graph(graph: &GraphAccumulator) -> ExportResult<Self> {
        let store = Store::new().map_err(|e| ExportError::Sparql {
            message: format!("failed to create oxigraph store: {e}"),
        })?;
        for statement in graph.statements() {
            let Triple {
                subject,
                predicate,
                object,
            } = to_triple(statement)?;
            let quad = Quad::new(subject, predicate, object, GraphName::DefaultGraph);
            store.insert(&quad).map_err(|e| ExportError::Sparql {
                message: format!("insert failed: {e}"),
            })?;
        }
        Ok(Self { store })
    }

    /// Execute a SPARQL SELECT query and return results as Vec of binding maps.
    pub fn query_select(&self, sparql: &str) -> ExportResult<Vec<Vec<(String, String)>>> {
        let results = self.store.query(sparql).map_err(|e| ExportError::Sparql {
            message: format!("SPARQL query failed: {e}"),
        })?;

        match results {
            QueryResults::Solutions(solutions) => {
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(|e| ExportError::Sparql {
                        message: format!("solution error: {e}"),
                    })?;
                    let row = solution
                        .iter()
                        .map(|(var, term)| (var.as_str().to_string(), term.to_string()))
                        .collect();
                    rows.push(row);
                }
                Ok(rows)
            }
            QueryResults::Boolean(b) => Ok(vec![vec![("result".to_string(), b.to_string())]]),
            QueryResults::Graph(_) => Err(ExportError::Sparql {
                message: "CONSTRUCT/DESCRIBE queries not supported via query_select".into(),
            }),
        }
    }

    /// Execute a SPARQL ASK query.
    pub fn query_ask(&self, sparql: &str) -> ExportResult<bool> {
        let results = self.store.query(sparql).map_err(|e| ExportError::Sparql {
            message: format!("SPARQL query failed: {e}"),
        })?;
        match results {
            QueryResults::Boolean(b) => Ok(b),
            _ => Err(ExportError::Sparql {
                message: "expected boolean result from ASK query".into(),
            }),
        }
    }

    /// Number of triples in the store.
    pub fn len(&self) -> ExportResult<usize> {
        self.store.len().map_err(|e| ExportError::Sparql {
            message: format!("count failed: {e}"),
        })
    }

    pub fn is_empty(&self) -> ExportResult<bool> {
        self.len().map(|n| n == 0)
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{self, RICO};

    fn sample() -> GraphAccumulator {
        let mut g = GraphAccumulator::new();
        g.add(
            "http://example.org/Record/D1",
            vocab::rdf_type(),
            Term::iri(format!("{RICO}Record")),
        )
        .unwrap();
        g.add(
            "http://example.org/Record/D1",
            vocab::rdfs_label(),
            Term::literal("D1"),
        )
        .unwrap();
        g.add(
            "http://example.org/Record/D1_1923",
            format!("{RICO}normalizedDateValue"),
            Term::typed("1923", vocab::xsd("gYear")),
        )
        .unwrap();
        g
    }

    #[test]
    fn format_names_parse() {
        assert_eq!("ttl".parse::<RdfOutput>().unwrap(), RdfOutput::Turtle);
        assert_eq!("N-Triples".parse::<RdfOutput>().unwrap(), RdfOutput::NTriples);
        assert!("rdfxml".parse::<RdfOutput>().is_err());
    }

    #[test]
    fn ntriples_output_has_one_line_per_statement() {
        let g = sample();
        let ns = Namespaces::new("http://example.org/", RICO);
        let bytes = write_graph(&g, &ns, RdfOutput::NTriples, Vec::new()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("\"1923\"^^<http://www.w3.org/2001/XMLSchema#gYear>"));
    }

    #[test]
    fn turtle_output_declares_prefixes() {
        let g = sample();
        let ns = Namespaces::new("http://example.org/", RICO);
        let bytes = write_graph(&g, &ns, RdfOutput::Turtle, Vec::new()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("@prefix rico:"));
        assert!(text.contains("rico:Record"));
    }

    #[test]
    fn store_answers_sparql() {
        let store = GraphStore::from_graph(&sample()).unwrap();
        assert_eq!(store.len().unwrap(), 3);
        let rows = store
            .query_select(&format!(
                "SELECT ?s WHERE {{ ?s a <{RICO}Record> }}"
            ))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(store
            .query_ask("ASK { <http://example.org/Record/D1> ?p \"D1\" }")
            .unwrap());
    }
}
