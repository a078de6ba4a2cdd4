// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # archive-rico
//!
//! Converts archival finding aids kept in spreadsheets into an RDF graph
//! described with the Records in Contexts ontology (RiC-O).
//!
//! ## Architecture
//!
//! - **Sources** (`source`): instance and mapping workbooks read as named sheets of rows
//! - **Rules** (`mapping`): the mapping workbook parsed into typed, per-sheet rules
//! - **Materialization** (`materialize`): rules applied row by row, minting deduplicated
//!   entity nodes into the run's graph accumulator (`graph`)
//! - **Hierarchy** (`hierarchy`, `deferred`): sheet levels, the containment tree and
//!   attributes propagated from folders to the records they contain
//! - **Enrichment** (`geo`): place nodes linked to GeoNames from a local dump or the web service
//! - **Export** (`graph::export`): Turtle / N-Triples serialization and SPARQL over the result
//!
//! ## Library usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! use archive_rico::config::PipelineConfig;
//! use archive_rico::graph::export::{write_graph, RdfOutput};
//! use archive_rico::mapping::parse_rule_table;
//! use archive_rico::pipeline::Converter;
//! use archive_rico::source::read_workbook;
//!
//! let config = PipelineConfig::default();
//! let rules = parse_rule_table(&read_workbook(Path::new("mapping.xlsx")).unwrap(), &config).unwrap();
//! let instances = read_workbook(Path::new("inventory.xlsx")).unwrap();
//! let out = Converter::new(&config, &rules).run(&instances, None).unwrap();
//! let stdout = std::io::stdout();
//! write_graph(&out.context.graph, &rules.namespaces, RdfOutput::Turtle, stdout.lock()).unwrap();
//! println!("{}", out.context.report);
//! ```

pub mod config;
pub mod date;
pub mod deferred;
pub mod error;
pub mod geo;
pub mod graph;
pub mod hierarchy;
pub mod mapping;
pub mod materialize;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod structure;
pub mod uri;
pub mod vocab;

pub use error::{ArchiveError, ArchiveResult};
pub use pipeline::{Converter, RunOutput};
pub use report::{Issue, RunReport};
