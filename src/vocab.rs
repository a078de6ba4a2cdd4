//! Well-known vocabularies and prefixed-name resolution.
//!
//! The mapping sheets write terms as prefixed names (`rico:hasSender`),
//! bare names (`Fondo Rossi`) or absolute IRIs. [`Namespaces`] expands all
//! three forms. Unknown prefixes are bound to `{base}{prefix}#` the first
//! time they are seen so that the serialized graph carries them too.

use indexmap::IndexMap;

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const GEO: &str = "http://www.w3.org/2003/01/geo/wgs84_pos#";
pub const GN: &str = "https://www.geonames.org/ontology#";
pub const RICO: &str = "https://www.ica.org/standards/RiC/ontology#";

/// Prefix reserved for control predicates in the mapping sheets.
pub const TEMP_PREFIX: &str = "temp";

/// `rdf:type`.
pub fn rdf_type() -> String {
    format!("{RDF}type")
}

/// `rdfs:label`.
pub fn rdfs_label() -> String {
    format!("{RDFS}label")
}

pub fn rdfs_comment() -> String {
    format!("{RDFS}comment")
}

/// `owl:sameAs`.
pub fn owl_same_as() -> String {
    format!("{OWL}sameAs")
}

/// An XSD datatype IRI.
pub fn xsd(local: &str) -> String {
    format!("{XSD}{local}")
}

/// Prefix table plus the base namespace for minted nodes.
#[derive(Debug, Clone)]
pub struct Namespaces {
    base: String,
    rico: String,
    prefixes: IndexMap<String, String>,
}

impl Namespaces {
    /// Create the table with the standard prefixes bound.
    pub fn new(base: impl Into<String>, rico: impl Into<String>) -> Self {
        let base = base.into();
        let rico = rico.into();
        let mut prefixes = IndexMap::new();
        prefixes.insert("rdf".to_string(), RDF.to_string());
        prefixes.insert("rdfs".to_string(), RDFS.to_string());
        prefixes.insert("xsd".to_string(), XSD.to_string());
        prefixes.insert("owl".to_string(), OWL.to_string());
        prefixes.insert("rico".to_string(), rico.clone());
        prefixes.insert("geo".to_string(), GEO.to_string());
        prefixes.insert("gn".to_string(), GN.to_string());
        Self {
            base,
            rico,
            prefixes,
        }
    }

    /// The base namespace, always ending in `/` or `#`.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// An IRI in the base namespace.
    pub fn base_iri(&self, local: &str) -> String {
        format!("{}{local}", self.base)
    }

    /// An IRI in the RiC-O namespace.
    pub fn rico(&self, local: &str) -> String {
        format!("{}{local}", self.rico)
    }

    /// Bind the prefix of a prefixed name if it is not already known.
    ///
    /// `temp:` control predicates are never bound; they do not survive
    /// into the output graph.
    pub fn bind_prefix_of(&mut self, term: &str) {
        if let Some((prefix, _)) = split_prefixed(term) {
            if prefix == TEMP_PREFIX || self.prefixes.contains_key(prefix) {
                return;
            }
            let iri = format!("{}{prefix}#", self.base);
            tracing::debug!(prefix, %iri, "auto-binding namespace prefix");
            self.prefixes.insert(prefix.to_string(), iri);
        }
    }

    /// Expand a term into an absolute IRI.
    ///
    /// Absolute IRIs pass through, prefixed names resolve against the table
    /// (unknown prefixes fall back to `{base}{prefix}#`), and bare names
    /// become `{base}{name}` with spaces replaced by underscores.
    pub fn expand(&self, term: &str) -> String {
        let term = term.trim();
        if crate::uri::is_absolute_iri(term) {
            return term.to_string();
        }
        if let Some((prefix, local)) = split_prefixed(term) {
            return match self.prefixes.get(prefix) {
                Some(ns) => format!("{ns}{local}"),
                None => format!("{}{prefix}#{local}", self.base),
            };
        }
        format!("{}{}", self.base, term.replace(' ', "_"))
    }

    /// Whether the term is a prefixed name with a bound prefix.
    pub fn is_known_prefixed(&self, term: &str) -> bool {
        split_prefixed(term.trim()).is_some_and(|(p, _)| self.prefixes.contains_key(p))
    }

    /// Iterate `(prefix, namespace)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }
}

/// Split `prefix:local` when the prefix looks like an NCName.
///
/// Absolute IRIs and values such as `12:30` are not prefixed names.
pub fn split_prefixed(term: &str) -> Option<(&str, &str)> {
    if crate::uri::is_absolute_iri(term) {
        return None;
    }
    let (prefix, local) = term.split_once(':')?;
    let mut chars = prefix.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return None;
    }
    if local.contains(char::is_whitespace) {
        return None;
    }
    Some((prefix, local))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> Namespaces {
        Namespaces::new("http://example.org/", RICO)
    }

    #[test]
    fn expands_known_prefixes() {
        let ns = ns();
        assert_eq!(ns.expand("rico:hasSender"), format!("{RICO}hasSender"));
        assert_eq!(ns.expand("rdfs:label"), rdfs_label());
    }

    #[test]
    fn unknown_prefix_falls_back_to_base() {
        let ns = ns();
        assert_eq!(ns.expand("ex:thing"), "http://example.org/ex#thing");
    }

    #[test]
    fn bare_names_use_base_with_underscores() {
        let ns = ns();
        assert_eq!(ns.expand("Fondo Rossi"), "http://example.org/Fondo_Rossi");
    }

    #[test]
    fn absolute_iris_pass_through() {
        let ns = ns();
        assert_eq!(
            ns.expand("http://viaf.org/viaf/123"),
            "http://viaf.org/viaf/123"
        );
    }

    #[test]
    fn binding_is_idempotent_and_skips_temp() {
        let mut ns = ns();
        let before = ns.iter().count();
        ns.bind_prefix_of("ex:thing");
        ns.bind_prefix_of("ex:other");
        ns.bind_prefix_of("temp:hasSender");
        assert_eq!(ns.iter().count(), before + 1);
        assert!(ns.is_known_prefixed("ex:thing"));
        assert!(!ns.is_known_prefixed("temp:hasSender"));
    }

    #[test]
    fn split_rejects_non_names() {
        assert_eq!(split_prefixed("rico:Place"), Some(("rico", "Place")));
        assert_eq!(split_prefixed("12:30"), None);
        assert_eq!(split_prefixed("Note: see folder"), None);
        assert_eq!(split_prefixed("https://x.org/a"), None);
    }
}
