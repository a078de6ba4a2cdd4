//! Remote geocoding.
//!
//! [`GeocodeClient`] is the narrow seam the resolver talks to; the
//! GeoNames `searchJSON` web service is the production implementation.
//! One call per label, no retries.

use std::time::Duration;

use serde::Deserialize;

use crate::config::GeoNamesConfig;
use crate::error::GeoError;

use super::{is_coordinate, GeoRecord};

/// A remote service resolving a free-text label to its best match.
pub trait GeocodeClient {
    /// `Ok(None)` when the service knows no match.
    fn search(&self, label: &str) -> Result<Option<GeoRecord>, GeoError>;
}

/// GeoNames `searchJSON` client over a blocking `ureq` agent.
pub struct GeoNamesClient {
    http: ureq::Agent,
    endpoint: String,
    username: String,
    country: Option<String>,
}

impl GeoNamesClient {
    pub fn new(endpoint: impl Into<String>, username: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: ureq::AgentBuilder::new().timeout(timeout).build(),
            endpoint: endpoint.into(),
            username: username.into(),
            country: None,
        }
    }

    /// Build from configuration; `None` when no username is configured.
    pub fn from_config(config: &GeoNamesConfig) -> Option<Self> {
        let username = config.username.as_deref().filter(|u| !u.trim().is_empty())?;
        let client = Self::new(
            config.endpoint.clone(),
            username,
            Duration::from_secs(config.timeout_secs),
        );
        Some(match &config.country {
            Some(country) => client.with_country(country.clone()),
            None => client,
        })
    }

    /// Restrict searches to one ISO-3166 country.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }
}

impl std::fmt::Debug for GeoNamesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoNamesClient")
            .field("endpoint", &self.endpoint)
            .field("country", &self.country)
            .finish_non_exhaustive()
    }
}

impl GeocodeClient for GeoNamesClient {
    fn search(&self, label: &str) -> Result<Option<GeoRecord>, GeoError> {
        let mut request = self
            .http
            .get(&self.endpoint)
            .query("q", label)
            .query("maxRows", "1")
            .query("username", &self.username);
        if let Some(country) = &self.country {
            request = request.query("country", country);
        }

        tracing::debug!(label, endpoint = %self.endpoint, "GeoNames search");
        match request.call() {
            Ok(response) => {
                let body = response.into_string().map_err(|e| GeoError::Decode {
                    label: label.to_string(),
                    message: e.to_string(),
                })?;
                parse_search_response(label, &body)
            }
            Err(ureq::Error::Status(status, _)) => Err(GeoError::Status {
                label: label.to_string(),
                status,
            }),
            Err(ureq::Error::Transport(transport)) => Err(GeoError::Transport {
                label: label.to_string(),
                message: transport.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    geonames: Vec<SearchHit>,
    status: Option<ServiceStatus>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "geonameId")]
    geoname_id: u64,
    #[serde(default)]
    name: String,
    lat: String,
    lng: String,
    fcl: Option<String>,
    fcode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceStatus {
    message: String,
    value: Option<i64>,
}

/// Decode a `searchJSON` body into its first match.
pub fn parse_search_response(label: &str, body: &str) -> Result<Option<GeoRecord>, GeoError> {
    let response: SearchResponse = serde_json::from_str(body).map_err(|e| GeoError::Decode {
        label: label.to_string(),
        message: e.to_string(),
    })?;

    if let Some(status) = response.status {
        return Err(GeoError::Service {
            label: label.to_string(),
            message: match status.value {
                Some(code) => format!("{} (code {code})", status.message),
                None => status.message,
            },
        });
    }

    let Some(hit) = response.geonames.into_iter().next() else {
        return Ok(None);
    };
    if !is_coordinate(&hit.lat) || !is_coordinate(&hit.lng) {
        return Err(GeoError::Decode {
            label: label.to_string(),
            message: format!("bad coordinates {:?}, {:?}", hit.lat, hit.lng),
        });
    }
    Ok(Some(GeoRecord {
        geoname_id: hit.geoname_id,
        name: hit.name,
        latitude: hit.lat,
        longitude: hit.lng,
        feature_class: hit.fcl.filter(|s| !s.is_empty()),
        feature_code: hit.fcode.filter(|s| !s.is_empty()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_hit_is_returned() {
        let body = r#"{"totalResultsCount":2,"geonames":[
            {"geonameId":3181928,"name":"Bologna","lat":"44.49381","lng":"11.33875","fcl":"P","fcode":"PPLA"},
            {"geonameId":1,"name":"Other","lat":"0","lng":"0"}]}"#;
        let record = parse_search_response("Bologna", body).unwrap().unwrap();
        assert_eq!(record.geoname_id, 3181928);
        assert_eq!(record.iri(), "https://sws.geonames.org/3181928/");
        assert_eq!(record.feature_code.as_deref(), Some("PPLA"));
    }

    #[test]
    fn empty_result_is_no_match() {
        let body = r#"{"totalResultsCount":0,"geonames":[]}"#;
        assert_eq!(parse_search_response("Atlantide", body).unwrap(), None);
    }

    #[test]
    fn service_status_is_an_error() {
        let body = r#"{"status":{"message":"user account not enabled","value":10}}"#;
        let err = parse_search_response("Bologna", body).unwrap_err();
        assert!(matches!(err, GeoError::Service { .. }));
        assert!(err.to_string().contains("not enabled"));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            parse_search_response("Bologna", "<html>"),
            Err(GeoError::Decode { .. })
        ));
        let body = r#"{"geonames":[{"geonameId":1,"lat":"north","lng":"0"}]}"#;
        assert!(matches!(
            parse_search_response("Bologna", body),
            Err(GeoError::Decode { .. })
        ));
    }

    #[test]
    fn client_requires_a_username() {
        let mut config = GeoNamesConfig::default();
        assert!(GeoNamesClient::from_config(&config).is_none());
        config.username = Some("archivist".into());
        config.country = Some("IT".into());
        let client = GeoNamesClient::from_config(&config).unwrap();
        assert_eq!(client.country.as_deref(), Some("IT"));
    }
}
