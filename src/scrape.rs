use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::catalog::{CategorySeed, ScrapedCategory, ScrapedSubItem};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Scrape stats returned after completion.
pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Shared HTTP client for the scrape and download stages.
pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")
}

/// Scrape every seed category in order, pausing `delay` between pages.
///
/// A failed page (network error or bad HTTP status) yields an empty
/// sub-item list for that category; the rest of the catalog still builds.
pub async fn build_catalog(
    client: &reqwest::Client,
    seeds: Vec<CategorySeed>,
    delay: Duration,
) -> Result<(Vec<ScrapedCategory>, ScrapeStats)> {
    let total = seeds.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut catalog = Vec::with_capacity(total);
    let mut ok = 0usize;
    let mut errors = 0usize;

    for (i, seed) in seeds.into_iter().enumerate() {
        pb.set_message(seed.name.clone());
        let subitems = match scrape_subitems(client, &seed.url).await {
            Ok(subs) => {
                ok += 1;
                subs
            }
            Err(e) => {
                errors += 1;
                warn!("Failed to scrape {} ({}): {:#}", seed.name, seed.url, e);
                Vec::new()
            }
        };
        info!("{}: {} sub-items", seed.name, subitems.len());

        catalog.push(ScrapedCategory {
            name: seed.name,
            url: seed.url,
            img: seed.img,
            subespecialidades: subitems,
        });
        pb.inc(1);

        if i + 1 < total {
            tokio::time::sleep(delay).await;
        }
    }

    pb.finish_and_clear();
    Ok((catalog, ScrapeStats { total, ok, errors }))
}

/// Fetch one category page and extract its sub-item blocks.
pub async fn scrape_subitems(
    client: &reqwest::Client,
    page_url: &str,
) -> Result<Vec<ScrapedSubItem>> {
    let base = Url::parse(page_url).with_context(|| format!("Invalid category URL {page_url}"))?;
    let html = client
        .get(base.clone())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(extract_subitems(&html, &base))
}

/// Pull sub-items out of a category page.
///
/// The page body lives in `div#wsite-content`; each sub-item is a
/// bordered image block holding a link wrapped around an image. Blocks
/// missing either piece are skipped. A missing content container means
/// the page has no data, not that extraction failed.
pub fn extract_subitems(html: &str, base: &Url) -> Vec<ScrapedSubItem> {
    let content_sel = Selector::parse("div#wsite-content").unwrap();
    let block_sel = Selector::parse(r#"div[class*="wsite-image-border-none"]"#).unwrap();
    let link_sel = Selector::parse("a[href]").unwrap();
    let img_sel = Selector::parse("img").unwrap();
    let div_sel = Selector::parse("div").unwrap();

    let document = Html::parse_document(html);
    let Some(content) = document.select(&content_sel).next() else {
        debug!("No wsite-content container, treating page as empty");
        return Vec::new();
    };

    let mut subitems = Vec::new();
    for block in content.select(&block_sel) {
        let Some(link) = block.select(&link_sel).next() else {
            debug!("Skipping image block without a link");
            continue;
        };
        let Some(img) = link.select(&img_sel).next() else {
            debug!("Skipping image block without an inner image");
            continue;
        };

        let href = link.value().attr("href").unwrap_or_default();
        let Ok(target) = base.join(href) else {
            debug!("Skipping block with unresolvable href {href:?}");
            continue;
        };
        let src = img.value().attr("src").unwrap_or_default();
        let Ok(img_url) = base.join(src) else {
            debug!("Skipping block with unresolvable image src {src:?}");
            continue;
        };

        let name = img.value().attr("alt").unwrap_or_default().trim().to_string();
        let caption = block
            .select(&div_sel)
            .next()
            .map(|div| div.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| name.clone());

        subitems.push(ScrapedSubItem {
            name,
            url: target.to_string(),
            img: img_url.to_string(),
            caption,
        });
    }

    subitems
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(fixture: &str) -> Vec<ScrapedSubItem> {
        let html =
            std::fs::read_to_string(format!("tests/fixtures/{}.html", fixture)).unwrap();
        let base =
            Url::parse("https://www.guiasmayores.com/especialidades-ja---actividades-agropecuarias.html")
                .unwrap();
        extract_subitems(&html, &base)
    }

    #[test]
    fn extracts_blocks_in_page_order() {
        let subs = parse("actividades-agropecuarias");
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].name, "Agricultura de subsistencia");
        assert_eq!(subs[1].name, "Apicultura");
    }

    #[test]
    fn resolves_relative_urls_against_base() {
        let subs = parse("actividades-agropecuarias");
        assert_eq!(
            subs[0].url,
            "https://www.guiasmayores.com/uploads/1/1/3/1/1131412/agricultura_de_subsistencia.pdf"
        );
        assert_eq!(
            subs[0].img,
            "https://www.guiasmayores.com/uploads/1/1/3/1/1131412/agricultura-de-subsistencia_orig.png"
        );
    }

    #[test]
    fn absolute_urls_pass_through() {
        let subs = parse("actividades-agropecuarias");
        assert_eq!(
            subs[1].url,
            "https://www.guiasmayores.com/uploads/1/1/3/1/1131412/apicultura.pdf"
        );
    }

    #[test]
    fn caption_falls_back_to_name() {
        let subs = parse("actividades-agropecuarias");
        assert_eq!(subs[0].caption, "Agricultura de subsistencia");
        // Second block has an empty caption div.
        assert_eq!(subs[1].caption, "Apicultura");
    }

    #[test]
    fn blocks_without_link_or_image_are_skipped() {
        // The fixture holds four bordered blocks; two are defective.
        let subs = parse("actividades-agropecuarias");
        assert_eq!(subs.len(), 2);
        assert!(subs.iter().all(|s| !s.name.is_empty()));
    }

    #[test]
    fn missing_content_container_yields_empty() {
        let base = Url::parse("https://www.guiasmayores.com/x.html").unwrap();
        let subs = extract_subitems("<html><body><p>404</p></body></html>", &base);
        assert!(subs.is_empty());
    }
}
