//! Place enrichment against GeoNames.
//!
//! - **[`reference`]**: a local GeoNames dump indexed by normalized label
//! - **[`client`]**: the remote search service behind [`GeocodeClient`]
//! - **[`cache`]**: [`GeoResolver`], the reference → cache → remote chain
//! - **[`enrich`]**: the pass that writes resolved data onto place nodes

pub mod cache;
pub mod client;
pub mod enrich;
pub mod reference;

pub use cache::{GeoResolver, Lookup};
pub use client::{GeoNamesClient, GeocodeClient};
pub use enrich::{enrich_places, EnrichmentStats};
pub use reference::ReferenceGazetteer;

/// The fields of a GeoNames entry that enrichment uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoRecord {
    pub geoname_id: u64,
    pub name: String,
    /// Decimal degrees as written by GeoNames.
    pub latitude: String,
    pub longitude: String,
    pub feature_class: Option<String>,
    pub feature_code: Option<String>,
}

impl GeoRecord {
    /// Canonical GeoNames IRI of the entry.
    pub fn iri(&self) -> String {
        format!("https://sws.geonames.org/{}/", self.geoname_id)
    }
}

/// Whether a coordinate string is a finite decimal number.
pub(crate) fn is_coordinate(text: &str) -> bool {
    text.trim().parse::<f64>().is_ok_and(f64::is_finite)
}
