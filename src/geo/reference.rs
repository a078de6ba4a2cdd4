//! Local GeoNames reference dataset.
//!
//! Reads the tab-separated `geoname` table of a GeoNames dump (for example
//! `IT.txt`). Each entry is indexed under its name, ASCII name and every
//! alternate name; when two entries share a label the first one wins.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::GeoError;
use crate::uri::normalize_label;

use super::{is_coordinate, GeoRecord};

/// Label index over a GeoNames dump.
#[derive(Debug, Default, Clone)]
pub struct ReferenceGazetteer {
    records: Vec<GeoRecord>,
    by_label: HashMap<String, usize>,
}

impl ReferenceGazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dump file.
    pub fn load(path: &Path) -> Result<Self, GeoError> {
        let file = std::fs::File::open(path).map_err(|source| GeoError::ReferenceIo {
            path: path.display().to_string(),
            source,
        })?;
        let gazetteer = Self::from_reader(BufReader::new(file)).map_err(|source| {
            GeoError::ReferenceIo {
                path: path.display().to_string(),
                source,
            }
        })?;
        tracing::info!(
            path = %path.display(),
            entries = gazetteer.len(),
            labels = gazetteer.by_label.len(),
            "GeoNames reference loaded"
        );
        Ok(gazetteer)
    }

    /// Read dump lines. Lines that do not parse are skipped.
    pub fn from_reader(reader: impl BufRead) -> std::io::Result<Self> {
        let mut gazetteer = Self::new();
        let mut skipped = 0usize;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(&line) {
                Some((record, labels)) => gazetteer.insert(record, labels),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(skipped, "unparseable GeoNames lines ignored");
        }
        Ok(gazetteer)
    }

    /// Add an entry under the given labels.
    pub fn insert(&mut self, record: GeoRecord, labels: Vec<String>) {
        let idx = self.records.len();
        self.records.push(record);
        for label in labels {
            let key = normalize_label(&label);
            if !key.is_empty() {
                self.by_label.entry(key).or_insert(idx);
            }
        }
    }

    /// Look up a label (normalized before matching).
    pub fn lookup(&self, label: &str) -> Option<&GeoRecord> {
        self.by_label
            .get(&normalize_label(label))
            .and_then(|&idx| self.records.get(idx))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse one `geoname` line into a record and its labels.
///
/// Columns: geonameid, name, asciiname, alternatenames, latitude,
/// longitude, feature class, feature code, then fields not used here.
pub fn parse_line(line: &str) -> Option<(GeoRecord, Vec<String>)> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 6 {
        return None;
    }
    let geoname_id = fields[0].trim().parse().ok()?;
    let name = fields[1].trim();
    let (latitude, longitude) = (fields[4].trim(), fields[5].trim());
    if name.is_empty() || !is_coordinate(latitude) || !is_coordinate(longitude) {
        return None;
    }
    let non_empty = |i: usize| {
        fields
            .get(i)
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
    };

    let mut labels = vec![name.to_string()];
    labels.extend(non_empty(2));
    if let Some(alternates) = non_empty(3) {
        labels.extend(
            alternates
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        );
    }

    Some((
        GeoRecord {
            geoname_id,
            name: name.to_string(),
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
            feature_class: non_empty(6),
            feature_code: non_empty(7),
        },
        labels,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
3181928\tBologna\tBologna\tBolonha,Bononia,Bolonia\t44.49381\t11.33875\tP\tPPLA\tIT
3176959\tFirenze\tFirenze\tFlorence,Florenz\t43.77925\t11.24626\tP\tPPLA\tIT
bad line
3169070\tRoma\tRoma\tRome\tnot-a-number\t12.51133\tP\tPPLC\tIT
";

    #[test]
    fn every_name_form_is_indexed() {
        let g = ReferenceGazetteer::from_reader(DUMP.as_bytes()).unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g.lookup("bologna").unwrap().geoname_id, 3181928);
        assert_eq!(g.lookup(" BONONIA ").unwrap().geoname_id, 3181928);
        assert_eq!(g.lookup("Florence").unwrap().name, "Firenze");
        assert!(g.lookup("Roma").is_none());
    }

    #[test]
    fn first_entry_wins_on_shared_labels() {
        let mut g = ReferenceGazetteer::from_reader(DUMP.as_bytes()).unwrap();
        let (record, labels) =
            parse_line("9999\tBologna\tBologna\t\t1.0\t2.0\tA\tADM3\tIT").unwrap();
        g.insert(record, labels);
        assert_eq!(g.lookup("Bologna").unwrap().geoname_id, 3181928);
    }

    #[test]
    fn feature_codes_are_optional() {
        let (record, labels) = parse_line("1\tX\t\t\t1.5\t2.5").unwrap();
        assert_eq!(record.feature_class, None);
        assert_eq!(labels, vec!["X".to_string()]);
    }

    #[test]
    fn missing_dump_is_an_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ReferenceGazetteer::load(&dir.path().join("IT.txt")).unwrap_err();
        assert!(matches!(err, GeoError::ReferenceIo { .. }));
    }

    #[test]
    fn load_reads_a_dump_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("IT.txt");
        std::fs::write(&path, DUMP).unwrap();
        let g = ReferenceGazetteer::load(&path).unwrap();
        assert_eq!(g.len(), 2);
    }
}
