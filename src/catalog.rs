use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Seed descriptor for one top-level category: display name, landing page
/// URL and main image URL. The seed list lives in a JSON file so the
/// catalog can be re-pointed without touching code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub url: String,
    pub img: String,
}

/// Category as scraped: remote URLs still in place, sub-items under the
/// `subespecialidades` key. This is the wire form the normalizer and the
/// downloader consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedCategory {
    pub name: String,
    pub url: String,
    pub img: String,
    pub subespecialidades: Vec<ScrapedSubItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedSubItem {
    pub name: String,
    pub url: String,
    pub img: String,
    pub caption: String,
}

/// Category after normalization: slug plus local `/{slug}/...` paths.
/// `url` and `caption` are gone, so a normalized file no longer parses as
/// `ScrapedCategory` — normalization is a one-shot transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub img: String,
    pub slug: String,
    pub items: Vec<SubItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubItem {
    pub name: String,
    pub img: String,
    pub slug: String,
    pub pdf: Option<String>,
}

pub fn load_seeds(path: &Path) -> Result<Vec<CategorySeed>> {
    load_json(path)
}

pub fn load_scraped(path: &Path) -> Result<Vec<ScrapedCategory>> {
    load_json(path)
}

pub fn load_normalized(path: &Path) -> Result<Vec<Category>> {
    load_json(path)
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Malformed JSON in {}", path.display()))
}

/// Write a catalog file: pretty-printed UTF-8, non-ASCII kept literal.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scraped() -> Vec<ScrapedCategory> {
        vec![ScrapedCategory {
            name: "Naturaleza".into(),
            url: "https://www.guiasmayores.com/naturaleza.html".into(),
            img: "https://www.guiasmayores.com/uploads/naturaleza_orig.png".into(),
            subespecialidades: vec![ScrapedSubItem {
                name: "Aves".into(),
                url: "https://www.guiasmayores.com/uploads/aves.pdf".into(),
                img: "https://www.guiasmayores.com/uploads/aves.png".into(),
                caption: "Aves".into(),
            }],
        }]
    }

    #[test]
    fn scraped_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("especialidades.json");
        save_json(&path, &sample_scraped()).unwrap();
        let loaded = load_scraped(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].subespecialidades[0].name, "Aves");
    }

    #[test]
    fn wire_key_is_subespecialidades() {
        let json = serde_json::to_value(sample_scraped()).unwrap();
        assert!(json[0].get("subespecialidades").is_some());
    }

    #[test]
    fn non_ascii_kept_literal() {
        let cats = vec![ScrapedCategory {
            name: "Artes Domésticas".into(),
            url: String::new(),
            img: String::new(),
            subespecialidades: vec![],
        }];
        let json = serde_json::to_string_pretty(&cats).unwrap();
        assert!(json.contains("Artes Domésticas"));
        assert!(!json.contains("\\u00e9"));
    }

    #[test]
    fn normalized_file_does_not_load_as_scraped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actualizado.json");
        let normalized = vec![Category {
            name: "Naturaleza".into(),
            img: "/naturaleza/naturaleza_orig.png".into(),
            slug: "naturaleza".into(),
            items: vec![],
        }];
        save_json(&path, &normalized).unwrap();
        // url/caption were dropped, so the scraped form no longer applies.
        assert!(load_scraped(&path).is_err());
        assert!(load_normalized(&path).is_ok());
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let err = load_scraped(Path::new("no-such-file.json")).unwrap_err();
        assert!(err.to_string().contains("no-such-file.json"));
    }

    #[test]
    fn subitem_pdf_serializes_as_null_when_absent() {
        let sub = SubItem {
            name: "Aves".into(),
            img: "/naturaleza/aves/aves.png".into(),
            slug: "aves".into(),
            pdf: None,
        };
        let json = serde_json::to_value(&sub).unwrap();
        assert!(json.get("pdf").unwrap().is_null());
    }
}
