//! Bundled boundary dataset read from a GeoJSON file

use geozone_domain::geometry::FeatureCollection;
use geozone_domain::ports::{BoundaryDataset, DistrictRecord};
use geozone_domain::ResolveError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

const ENDPOINT: &str = "bundled-dataset";

/// `BoundaryDataset` backed by a GeoJSON FeatureCollection on disk
///
/// Features need a district name under `districtName` or `adm_nm`; the code is
/// read from `districtCode` or `adm_cd` when present. Features without a name
/// or geometry are skipped.
#[derive(Debug, Clone)]
pub struct GeoJsonFileDataset {
    path: PathBuf,
}

impl GeoJsonFileDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BoundaryDataset for GeoJsonFileDataset {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Vec<DistrictRecord>, ResolveError> {
        let text = std::fs::read_to_string(&self.path).map_err(|err| {
            warn!(error = %err, "Cannot read boundary dataset");
            ResolveError::config(format!(
                "boundary dataset {}: {}",
                self.path.display(),
                err
            ))
        })?;

        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|err| ResolveError::parse(ENDPOINT, format!("invalid JSON: {}", err)))?;
        let collection = FeatureCollection::from_value(value, ENDPOINT)?;

        let total = collection.features.len();
        let records: Vec<DistrictRecord> = collection
            .features
            .into_iter()
            .filter_map(|feature| {
                let district_name = feature.property_str(&["districtName", "adm_nm"])?;
                let district_code = feature.property_str(&["districtCode", "adm_cd"]);
                let geometry = feature.geometry?;
                Some(DistrictRecord {
                    district_name,
                    district_code,
                    geometry,
                })
            })
            .collect();

        if records.len() < total {
            debug!(skipped = total - records.len(), "Features without name or geometry skipped");
        }
        info!(districts = records.len(), "Boundary dataset read");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("geozone-{}-{}.geojson", name, std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reads_named_features() {
        let path = write_temp(
            "named",
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature",
                 "properties": {"adm_nm": "서울특별시 강남구 역삼1동", "adm_cd": 11230680},
                 "geometry": {"type": "Polygon", "coordinates": [[[127.03, 37.49], [127.04, 37.49], [127.04, 37.50]]]}},
                {"type": "Feature", "properties": {"adm_nm": "무명"}, "geometry": null},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[127.0, 37.0], [127.1, 37.0], [127.1, 37.1]]]}}
            ]}"#,
        );

        let records = GeoJsonFileDataset::new(&path).load().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].district_name, "서울특별시 강남구 역삼1동");
        assert_eq!(records[0].district_code.as_deref(), Some("11230680"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dataset = GeoJsonFileDataset::new("/nonexistent/geozone/boundaries.geojson");
        assert!(matches!(dataset.load(), Err(ResolveError::Config(_))));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let path = write_temp("malformed", "{ not json");
        let result = GeoJsonFileDataset::new(&path).load();
        fs::remove_file(&path).ok();

        assert!(matches!(result, Err(ResolveError::Parse { .. })));
    }
}
