//! Label resolution with a fixed lookup order.
//!
//! 1. the local reference dataset,
//! 2. labels already resolved remotely during this process,
//! 3. labels already known to be unresolvable,
//! 4. the remote client, at most once per distinct label.
//!
//! Only successful remote lookups are written to the cache.

use std::collections::{HashMap, HashSet};

use crate::error::GeoError;
use crate::uri::normalize_label;

use super::{GeoRecord, GeocodeClient, ReferenceGazetteer};

/// Result of resolving one label.
#[derive(Debug)]
pub enum Lookup {
    /// Found in the reference dataset.
    Reference(GeoRecord),
    /// Found by the remote service, now or earlier in the run.
    Remote(GeoRecord),
    /// No source knows the label.
    Unresolved,
    /// The remote call failed. Later lookups of the label are `Unresolved`.
    Failed(GeoError),
}

/// Reference-then-remote resolver with a per-process cache.
#[derive(Default)]
pub struct GeoResolver {
    reference: Option<ReferenceGazetteer>,
    remote: Option<Box<dyn GeocodeClient>>,
    hits: HashMap<String, GeoRecord>,
    misses: HashSet<String>,
    remote_calls: usize,
}

impl GeoResolver {
    /// A resolver with no sources; every label is unresolved.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference(mut self, reference: ReferenceGazetteer) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_remote(mut self, client: Box<dyn GeocodeClient>) -> Self {
        self.remote = Some(client);
        self
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Remote calls made so far.
    pub fn remote_calls(&self) -> usize {
        self.remote_calls
    }

    pub fn resolve(&mut self, label: &str) -> Lookup {
        let key = normalize_label(label);
        if key.is_empty() {
            return Lookup::Unresolved;
        }
        if let Some(record) = self.reference.as_ref().and_then(|r| r.lookup(&key)) {
            return Lookup::Reference(record.clone());
        }
        if let Some(record) = self.hits.get(&key) {
            return Lookup::Remote(record.clone());
        }
        if self.misses.contains(&key) {
            return Lookup::Unresolved;
        }
        let Some(client) = &self.remote else {
            return Lookup::Unresolved;
        };

        self.remote_calls += 1;
        match client.search(label.trim()) {
            Ok(Some(record)) => {
                self.hits.insert(key, record.clone());
                Lookup::Remote(record)
            }
            Ok(None) => {
                self.misses.insert(key);
                Lookup::Unresolved
            }
            Err(e) => {
                self.misses.insert(key);
                Lookup::Failed(e)
            }
        }
    }
}

impl std::fmt::Debug for GeoResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoResolver")
            .field("reference", &self.reference.as_ref().map(|r| r.len()))
            .field("remote", &self.remote.is_some())
            .field("hits", &self.hits.len())
            .field("misses", &self.misses.len())
            .field("remote_calls", &self.remote_calls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Answers from a fixed table and records every label it is asked for.
    struct Stub {
        known: HashMap<String, GeoRecord>,
        fail: HashSet<String>,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl GeocodeClient for Stub {
        fn search(&self, label: &str) -> Result<Option<GeoRecord>, GeoError> {
            self.calls.borrow_mut().push(label.to_string());
            if self.fail.contains(label) {
                return Err(GeoError::Status {
                    label: label.to_string(),
                    status: 503,
                });
            }
            Ok(self.known.get(label).cloned())
        }
    }

    fn record(id: u64, name: &str) -> GeoRecord {
        GeoRecord {
            geoname_id: id,
            name: name.into(),
            latitude: "44.5".into(),
            longitude: "11.3".into(),
            feature_class: Some("P".into()),
            feature_code: Some("PPL".into()),
        }
    }

    fn resolver(calls: Rc<RefCell<Vec<String>>>) -> GeoResolver {
        let mut reference = ReferenceGazetteer::new();
        reference.insert(record(1, "Bologna"), vec!["Bologna".into()]);
        let stub = Stub {
            known: HashMap::from([("Imola".to_string(), record(2, "Imola"))]),
            fail: HashSet::from(["Faenza".to_string()]),
            calls,
        };
        GeoResolver::new()
            .with_reference(reference)
            .with_remote(Box::new(stub))
    }

    #[test]
    fn reference_is_consulted_before_remote() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut r = resolver(calls.clone());
        assert!(matches!(r.resolve("BOLOGNA"), Lookup::Reference(rec) if rec.geoname_id == 1));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn remote_is_called_once_per_label() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut r = resolver(calls.clone());
        assert!(matches!(r.resolve("Imola"), Lookup::Remote(_)));
        assert!(matches!(r.resolve(" imola "), Lookup::Remote(_)));
        assert!(matches!(r.resolve("Atlantide"), Lookup::Unresolved));
        assert!(matches!(r.resolve("Atlantide"), Lookup::Unresolved));
        assert_eq!(r.remote_calls(), 2);
        assert_eq!(*calls.borrow(), vec!["Imola".to_string(), "Atlantide".to_string()]);
    }

    #[test]
    fn failures_degrade_to_unresolved() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut r = resolver(calls);
        assert!(matches!(r.resolve("Faenza"), Lookup::Failed(GeoError::Status { status: 503, .. })));
        assert!(matches!(r.resolve("Faenza"), Lookup::Unresolved));
        assert_eq!(r.remote_calls(), 1);
    }

    #[test]
    fn no_sources_means_unresolved() {
        let mut r = GeoResolver::new();
        assert!(matches!(r.resolve("Bologna"), Lookup::Unresolved));
        assert_eq!(r.remote_calls(), 0);
    }
}
