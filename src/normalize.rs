use std::collections::HashSet;

use anyhow::{bail, Result};
use tracing::warn;

use crate::catalog::{Category, ScrapedCategory, ScrapedSubItem, SubItem};
use crate::slug::{filename_from_url, slugify};

/// Rewrite a scraped catalog into the canonical local-path form.
///
/// One-shot: the transient `url`/`caption` fields are consumed here, so
/// the output cannot be fed back through.
pub fn normalize(catalog: Vec<ScrapedCategory>) -> Result<Vec<Category>> {
    catalog.into_iter().map(normalize_category).collect()
}

fn normalize_category(category: ScrapedCategory) -> Result<Category> {
    let cat_slug = slugify(&category.name);
    if cat_slug.is_empty() {
        bail!("Category name {:?} yields an empty slug", category.name);
    }

    let img_name = filename_from_url(&category.img);
    let img = format!("/{cat_slug}/{img_name}");

    let mut seen_paths: HashSet<String> = HashSet::new();
    let mut items = Vec::with_capacity(category.subespecialidades.len());
    for sub in category.subespecialidades {
        let item = normalize_subitem(&cat_slug, sub)?;
        for path in [Some(&item.img), item.pdf.as_ref()].into_iter().flatten() {
            if !seen_paths.insert(path.clone()) {
                warn!("Duplicate file path {path}, the last download wins");
            }
        }
        items.push(item);
    }

    Ok(Category {
        name: category.name,
        img,
        slug: cat_slug,
        items,
    })
}

fn normalize_subitem(cat_slug: &str, sub: ScrapedSubItem) -> Result<SubItem> {
    let sub_slug = slugify(&sub.name);
    if sub_slug.is_empty() {
        bail!(
            "Sub-item name {:?} under {:?} yields an empty slug",
            sub.name,
            cat_slug
        );
    }

    // The link target doubles as the document reference; only a .pdf
    // filename produces a document path.
    let doc_name = filename_from_url(&sub.url);
    let pdf = doc_name
        .ends_with(".pdf")
        .then(|| format!("/{cat_slug}/{sub_slug}/{doc_name}"));

    let img_name = filename_from_url(&sub.img);
    let img = format!("/{cat_slug}/{sub_slug}/{img_name}");

    Ok(SubItem {
        name: sub.name,
        img,
        slug: sub_slug,
        pdf,
    })
}

// ── Tests ──
