//! Rich diagnostic error types for the archive-rico converter.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains. These are the fatal
//! errors; recoverable outcomes of a run are collected as
//! [`Issue`](crate::report::Issue)s instead.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the converter.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum ArchiveError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Export(#[from] ExportError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file: {path}")]
    #[diagnostic(
        code(archive::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    #[diagnostic(
        code(archive::config::parse),
        help("Check the TOML syntax. Every field is optional; remove unknown keys.")
    )]
    Parse { path: String, message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(archive::config::invalid), help("{message}"))]
    Invalid { message: String },
}

// ---------------------------------------------------------------------------
// Row source errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    #[error("failed to open workbook {path}: {message}")]
    #[diagnostic(
        code(archive::source::open),
        help(
            "The workbook could not be read. Check that the file is a valid .xlsx \
             workbook and is not open with an exclusive lock."
        )
    )]
    Open { path: String, message: String },

    #[error("sheet not found: \"{sheet}\"")]
    #[diagnostic(
        code(archive::source::sheet_not_found),
        help("Sheet names are matched case-insensitively after trimming whitespace.")
    )]
    SheetNotFound { sheet: String },
}

// ---------------------------------------------------------------------------
// Mapping errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum MappingError {
    #[error("mapping sheet \"{sheet}\" is missing required columns: {}", missing.join(", "))]
    #[diagnostic(
        code(archive::mapping::missing_columns),
        help(
            "A mapping sheet needs the columns Subject, Predicate, Object, \
             Column Subject and Column Object. Kind is optional."
        )
    )]
    MissingColumns { sheet: String, missing: Vec<String> },

    #[error("mapping workbook contains no usable rule sheets")]
    #[diagnostic(
        code(archive::mapping::empty),
        help("Check the sheet names against `skip_sheet_patterns` and the required columns.")
    )]
    Empty,
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("invalid IRI <{iri}>: {message}")]
    #[diagnostic(
        code(archive::graph::invalid_iri),
        help(
            "A generated or configured IRI is not well-formed. Check `base_iri` and \
             any absolute IRIs written in the mapping sheets."
        )
    )]
    InvalidIri { iri: String, message: String },

    #[error("semantic key collision: <{iri}> is claimed by {existing} and {incoming}")]
    #[diagnostic(
        code(archive::graph::key_collision),
        help(
            "Two different semantic keys produced the same node IRI. The second \
             statement was dropped; this indicates a bug in IRI minting."
        )
    )]
    KeyCollision {
        iri: String,
        existing: String,
        incoming: String,
    },
}

// ---------------------------------------------------------------------------
// Geocoding errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GeoError {
    #[error("failed to read GeoNames reference dump {path}")]
    #[diagnostic(
        code(archive::geo::reference_io),
        help("Check the `geonames.reference_dump` path and its permissions.")
    )]
    ReferenceIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error looking up \"{label}\": {message}")]
    #[diagnostic(
        code(archive::geo::transport),
        help("The geocoding service could not be reached. The place stays unresolved.")
    )]
    Transport { label: String, message: String },

    #[error("geocoding service returned HTTP {status} for \"{label}\"")]
    #[diagnostic(
        code(archive::geo::status),
        help("Check the configured endpoint and that the account is enabled for web services.")
    )]
    Status { label: String, status: u16 },

    #[error("geocoding service rejected \"{label}\": {message}")]
    #[diagnostic(
        code(archive::geo::service),
        help("GeoNames reports quota and credential problems in a `status` object.")
    )]
    Service { label: String, message: String },

    #[error("malformed geocoding response for \"{label}\": {message}")]
    #[diagnostic(
        code(archive::geo::decode),
        help("The response body was not the expected JSON document.")
    )]
    Decode { label: String, message: String },
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ExportError {
    #[error("unknown output format: \"{format}\"")]
    #[diagnostic(
        code(archive::export::format),
        help("Supported formats are: turtle, ntriples.")
    )]
    UnknownFormat { format: String },

    #[error("RDF conversion failed: {message}")]
    #[diagnostic(
        code(archive::export::term),
        help("A statement could not be expressed as an RDF triple.")
    )]
    Term { message: String },

    #[error("RDF serialization failed: {source}")]
    #[diagnostic(
        code(archive::export::io),
        help("Check that the output path is writable and the disk is not full.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("SPARQL error: {message}")]
    #[diagnostic(
        code(archive::export::sparql),
        help("The in-memory store rejected the query. Check the query syntax.")
    )]
    Sparql { message: String },
}

/// Convenience alias for functions returning converter results.
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_error_converts_to_archive_error() {
        let err = SourceError::SheetNotFound {
            sheet: "Serie".into(),
        };
        let top: ArchiveError = err.into();
        assert!(matches!(
            top,
            ArchiveError::Source(SourceError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn missing_columns_lists_every_column() {
        let err = MappingError::MissingColumns {
            sheet: "Fascicolo".into(),
            missing: vec!["Predicate".into(), "Column Object".into()],
        };
        let msg = format!("{err}");
        assert!(msg.contains("Fascicolo"));
        assert!(msg.contains("Predicate, Column Object"));
    }

    #[test]
    fn geo_status_display_is_descriptive() {
        let err = GeoError::Status {
            label: "Bologna".into(),
            status: 503,
        };
        let msg = format!("{err}");
        assert!(msg.contains("503"));
        assert!(msg.contains("Bologna"));
    }
}
