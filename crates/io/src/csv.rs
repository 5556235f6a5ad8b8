// Static schedule text files (comma-separated, header row)

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use transit_recon::error::ReconError;
use transit_recon::model::{FieldValue, Row};

/// Reads schedule files into text rows keyed by header name.
///
/// Values are kept verbatim: no trimming, no type inference. A leading
/// UTF-8 byte order mark is dropped so the first column name stays clean.
#[derive(Debug, Clone, Copy)]
pub struct CsvLoader {
    delimiter: u8,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvLoader {
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn load(&self, path: &Path) -> Result<Vec<Row>, ReconError> {
        let label = path.display().to_string();
        let mut file = File::open(path).map_err(|e| ReconError::load(&label, e))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| ReconError::load(&label, e))?;
        self.parse(&content).map_err(|e| ReconError::load(&label, e))
    }

    pub fn parse(&self, content: &str) -> Result<Vec<Row>, String> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::None)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| e.to_string())?
            .iter()
            .map(str::to_string)
            .collect();
        let mut seen = HashSet::new();
        if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(format!("duplicate column '{dup}' in header"));
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| e.to_string())?;
            let row: Row = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), FieldValue::Text(v.to_string())))
                .collect();
            rows.push(row);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use transit_recon::model::row;

    #[test]
    fn parses_header_and_rows() {
        let rows = CsvLoader::default()
            .parse("stop_id,stop_name\nS1,Gare\nS2,\"Liberté, place\"\n")
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], row([("stop_id", "S1"), ("stop_name", "Gare")]));
        assert_eq!(rows[1]["stop_name"], FieldValue::from("Liberté, place"));
    }

    #[test]
    fn strips_bom_only() {
        let rows = CsvLoader::default()
            .parse("\u{feff}route_id,route_short_name\nA, A \n")
            .unwrap();
        assert_eq!(rows[0]["route_id"], FieldValue::from("A"));
        assert_eq!(rows[0]["route_short_name"], FieldValue::from(" A "));
    }

    #[test]
    fn empty_values_stay_empty_text() {
        let rows = CsvLoader::default().parse("a,b\n1,\n").unwrap();
        assert_eq!(rows[0]["b"], FieldValue::from(""));
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let rows = CsvLoader::default().parse("a,b\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn rejects_ragged_rows() {
        assert!(CsvLoader::default().parse("a,b\n1,2,3\n").is_err());
    }

    #[test]
    fn rejects_duplicate_headers() {
        let err = CsvLoader::default()
            .parse("stop_id,name,name\nS1,a,b\n")
            .unwrap_err();
        assert!(err.contains("duplicate column 'name'"), "{err}");

        let dir = tempdir().unwrap();
        let path = dir.path().join("stops.txt");
        fs::write(&path, "stop_id,name,name\nS1,a,b\n").unwrap();
        assert!(matches!(
            CsvLoader::default().load(&path),
            Err(ReconError::Load { .. })
        ));
    }

    #[test]
    fn load_maps_errors_to_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stops.txt");
        fs::write(&path, "a,b\n1\n").unwrap();
        match CsvLoader::default().load(&path).unwrap_err() {
            ReconError::Load { path: p, .. } => assert!(p.ends_with("stops.txt")),
            other => panic!("unexpected error: {other}"),
        }

        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            CsvLoader::default().load(&missing),
            Err(ReconError::Load { .. })
        ));
    }

    #[test]
    fn custom_delimiter() {
        let rows = CsvLoader::with_delimiter(b'\t').parse("a\tb\n1\t2\n").unwrap();
        assert_eq!(rows[0], row([("a", "1"), ("b", "2")]));
    }
}
