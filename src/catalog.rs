//! Bicycle catalog data model and JSON persistence.
//!
//! The catalog is a flat JSON array of entries, loaded in full at startup and
//! written back in full at the end of a run. Field order is the declaration
//! order below and output is pretty-printed so re-runs diff cleanly.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One bicycle record with identifying metadata, build image lists and a
/// frame geometry table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub year: Option<i32>,
    pub price: f64,
    #[serde(default)]
    pub official_url: Option<String>,
    #[serde(default)]
    pub builds: Vec<Build>,
    #[serde(default)]
    pub geometry: Vec<GeometryRow>,
}

/// A single build variant. Image references are either absolute URLs or
/// filenames relative to the local image store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// One row of the frame geometry table. Stack and reach are millimeters,
/// angles are degrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryRow {
    pub size_label: String,
    pub stack: f64,
    pub reach: f64,
    #[serde(default)]
    pub top_tube_length: Option<f64>,
    #[serde(default)]
    pub seat_tube_angle: Option<f64>,
    #[serde(default)]
    pub head_tube_angle: Option<f64>,
}

/// True when an image reference points at a remote resource rather than the
/// local image store.
pub fn is_remote_reference(reference: &str) -> bool {
    let lc = reference.to_ascii_lowercase();
    lc.starts_with("http://") || lc.starts_with("https://")
}

impl CatalogEntry {
    /// The canonical display image: first element of the first build's image
    /// list.
    pub fn display_image(&self) -> Option<&str> {
        self.builds
            .first()
            .and_then(|b| b.images.first())
            .map(String::as_str)
    }

    /// Point every build at a freshly downloaded local file. Builds with an
    /// empty image list get a single-element list.
    pub fn set_display_image(&mut self, filename: &str) {
        for build in &mut self.builds {
            if let Some(first) = build.images.first_mut() {
                *first = filename.to_string();
            } else {
                build.images = vec![filename.to_string()];
            }
        }
        if self.builds.is_empty() {
            self.builds.push(Build {
                name: None,
                images: vec![filename.to_string()],
            });
        }
    }
}

/// Load the catalog. A missing or malformed file is a fatal error for the
/// whole run.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file {}", path.display()))?;
    let entries: Vec<CatalogEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("catalog file {} is not valid JSON", path.display()))?;
    Ok(entries)
}

/// Write the catalog back in full, pretty-printed.
pub fn save_catalog(path: &Path, entries: &[CatalogEntry]) -> Result<()> {
    let mut out = serde_json::to_string_pretty(entries).context("failed to serialize catalog")?;
    out.push('\n');
    std::fs::write(path, out)
        .with_context(|| format!("failed to write catalog file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> CatalogEntry {
        CatalogEntry {
            id: "b1".into(),
            brand: "Specialized".into(),
            model: "Tarmac SL8".into(),
            year: Some(2024),
            price: 12500.0,
            official_url: Some("https://www.specialized.com/tarmac".into()),
            builds: vec![Build {
                name: Some("S-Works".into()),
                images: vec!["https://cdn.example.com/tarmac.jpg".into()],
            }],
            geometry: vec![GeometryRow {
                size_label: "56".into(),
                stack: 555.0,
                reach: 395.0,
                top_tube_length: Some(562.0),
                seat_tube_angle: Some(73.5),
                head_tube_angle: Some(73.5),
            }],
        }
    }

    #[test]
    fn test_round_trip_preserves_entries() {
        let entries = vec![sample_entry()];
        let json = serde_json::to_string_pretty(&entries).unwrap();
        let back: Vec<CatalogEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].id, "b1");
        assert_eq!(back[0].geometry[0].size_label, "56");
        assert_eq!(back[0].geometry[0].top_tube_length, Some(562.0));
    }

    #[test]
    fn test_optional_geometry_fields_default_to_none() {
        let json = r#"[{
            "id": "b2", "brand": "Canyon", "model": "Aeroad CFR", "price": 8999.0,
            "builds": [{"images": ["aeroad.png"]}],
            "geometry": [{"size_label": "M", "stack": 555.0, "reach": 395.0}]
        }]"#;
        let back: Vec<CatalogEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(back[0].year, None);
        assert_eq!(back[0].geometry[0].head_tube_angle, None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bikes.json");
        save_catalog(&path, &[sample_entry()]).unwrap();
        let back = load_catalog(&path).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].display_image(), Some("https://cdn.example.com/tarmac.jpg"));
    }

    #[test]
    fn test_malformed_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bikes.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_catalog(&path).is_err());
        assert!(load_catalog(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_set_display_image_updates_every_build() {
        let mut entry = sample_entry();
        entry.builds.push(Build {
            name: Some("Expert".into()),
            images: vec![],
        });
        entry.set_display_image("b1.jpg");
        assert_eq!(entry.builds[0].images[0], "b1.jpg");
        assert_eq!(entry.builds[1].images, vec!["b1.jpg".to_string()]);
    }

    #[test]
    fn test_remote_reference_detection() {
        assert!(is_remote_reference("https://cdn.example.com/a.jpg"));
        assert!(is_remote_reference("HTTP://cdn.example.com/a.jpg"));
        assert!(!is_remote_reference("b1.jpg"));
    }
}
