use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::catalog::ScrapedCategory;
use crate::slug::{filename_from_url, slugify};

/// One file to fetch: remote URL and the local path it lands at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub url: String,
    pub dest: PathBuf,
}

/// Download stats returned after completion.
pub struct DownloadStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Turn a scraped catalog into the ordered list of files to fetch.
///
/// Category images always download into `{root}/{category-slug}/`.
/// With `with_items`, each sub-item additionally gets
/// `{root}/{category-slug}/{sub-slug}/` holding its image and, when the
/// link target is a .pdf, its document.
pub fn plan(
    catalog: &[ScrapedCategory],
    dest_root: &Path,
    with_items: bool,
) -> Result<Vec<DownloadJob>> {
    let mut jobs = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    let mut push = |jobs: &mut Vec<DownloadJob>, url: &str, dir: &Path| {
        let filename = filename_from_url(url);
        if filename.is_empty() {
            debug!("No filename in {url}, skipping");
            return;
        }
        let dest = dir.join(filename);
        if !seen.insert(dest.clone()) {
            warn!("Duplicate destination {}, the last download wins", dest.display());
        }
        jobs.push(DownloadJob {
            url: url.to_string(),
            dest,
        });
    };

    for category in catalog {
        let cat_slug = slugify(&category.name);
        if cat_slug.is_empty() {
            bail!("Category name {:?} yields an empty slug", category.name);
        }
        let cat_dir = dest_root.join(&cat_slug);

        if !category.img.is_empty() {
            push(&mut jobs, &category.img, &cat_dir);
        }

        if with_items {
            for sub in &category.subespecialidades {
                let sub_slug = slugify(&sub.name);
                if sub_slug.is_empty() {
                    bail!(
                        "Sub-item name {:?} under {:?} yields an empty slug",
                        sub.name,
                        cat_slug
                    );
                }
                let sub_dir = cat_dir.join(&sub_slug);
                if !sub.img.is_empty() {
                    push(&mut jobs, &sub.img, &sub_dir);
                }
                if filename_from_url(&sub.url).ends_with(".pdf") {
                    push(&mut jobs, &sub.url, &sub_dir);
                }
            }
        }
    }

    Ok(jobs)
}

/// Fetch every planned file in order, pausing `delay` between requests.
///
/// A failed download is logged with its URL and skipped; a partial file
/// may be left behind, matching the non-transactional write contract.
pub async fn run_downloads(
    client: &reqwest::Client,
    jobs: &[DownloadJob],
    delay: Duration,
) -> Result<DownloadStats> {
    let total = jobs.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut ok = 0usize;
    let mut errors = 0usize;

    for (i, job) in jobs.iter().enumerate() {
        match download_file(client, &job.url, &job.dest).await {
            Ok(()) => ok += 1,
            Err(e) => {
                errors += 1;
                warn!("Error downloading {}: {:#}", job.url, e);
            }
        }
        pb.inc(1);

        if i + 1 < total {
            tokio::time::sleep(delay).await;
        }
    }

    pb.finish_and_clear();
    Ok(DownloadStats { total, ok, errors })
}

/// Stream one file to disk in chunks, so large PDFs never sit in memory.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    if let Some(dir) = dest.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let response = client.get(url).send().await?.error_for_status()?;

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("Failed to create {}", dest.display()))?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;

    debug!("Saved {} to {}", url, dest.display());
    Ok(())
}

// ── Tests ──
