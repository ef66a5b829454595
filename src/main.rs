mod catalog;
mod download;
mod normalize;
mod scrape;
mod slug;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gm_scraper", about = "Guías Mayores specialties catalog scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every category page into the catalog JSON
    Scrape {
        /// Category descriptors (name, url, img) to scrape
        #[arg(long, default_value = "categories.json")]
        seed: PathBuf,
        /// Output file for the scraped catalog
        #[arg(short, long, default_value = "especialidades.json")]
        out: PathBuf,
        /// Pause between category pages, in milliseconds
        #[arg(long, default_value_t = 2000)]
        delay_ms: u64,
    },
    /// Rewrite a scraped catalog into slugs and local file paths
    Normalize {
        /// Scraped catalog to transform
        #[arg(short, long, default_value = "especialidades.json")]
        input: PathBuf,
        /// Output file for the normalized catalog
        #[arg(short, long, default_value = "especialidades_actualizado.json")]
        out: PathBuf,
    },
    /// Download referenced files into a directory tree of slugs
    Download {
        /// Scraped catalog (remote URLs) to download from
        #[arg(short, long, default_value = "especialidades.json")]
        input: PathBuf,
        /// Root directory for downloaded files
        #[arg(short, long, default_value = "files")]
        dest: PathBuf,
        /// Also download each sub-item's image and PDF
        #[arg(long)]
        with_items: bool,
        /// Pause between downloads, in milliseconds
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
    },
    /// Scrape + normalize (optionally + download) in one pipeline
    Run {
        #[arg(long, default_value = "categories.json")]
        seed: PathBuf,
        /// Where the intermediate scraped catalog is written
        #[arg(long, default_value = "especialidades.json")]
        scraped_out: PathBuf,
        /// Output file for the normalized catalog
        #[arg(short, long, default_value = "especialidades_actualizado.json")]
        out: PathBuf,
        #[arg(long, default_value_t = 2000)]
        delay_ms: u64,
        /// Also download the referenced files after normalizing
        #[arg(long)]
        download: bool,
        #[arg(long, default_value = "files")]
        dest: PathBuf,
        #[arg(long)]
        with_items: bool,
    },
    /// Show catalog statistics
    Stats {
        /// Catalog file, scraped or normalized form
        #[arg(short, long, default_value = "especialidades.json")]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scrape { seed, out, delay_ms } => run_scrape(&seed, &out, delay_ms).await,
        Commands::Normalize { input, out } => run_normalize(&input, &out),
        Commands::Download { input, dest, with_items, delay_ms } => {
            run_download(&input, &dest, with_items, delay_ms).await
        }
        Commands::Run { seed, scraped_out, out, delay_ms, download, dest, with_items } => {
            run_scrape(&seed, &scraped_out, delay_ms).await?;
            run_normalize(&scraped_out, &out)?;
            if download {
                run_download(&scraped_out, &dest, with_items, delay_ms).await?;
            }
            Ok(())
        }
        Commands::Stats { input } => run_stats(&input),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_scrape(seed: &PathBuf, out: &PathBuf, delay_ms: u64) -> anyhow::Result<()> {
    let seeds = catalog::load_seeds(seed)?;
    if seeds.is_empty() {
        println!("Seed list {} is empty, nothing to scrape.", seed.display());
        return Ok(());
    }
    println!("Scraping {} category pages...", seeds.len());

    let client = scrape::build_client()?;
    let (scraped, stats) =
        scrape::build_catalog(&client, seeds, Duration::from_millis(delay_ms)).await?;
    catalog::save_json(out, &scraped)?;

    let subitems: usize = scraped.iter().map(|c| c.subespecialidades.len()).sum();
    println!(
        "Done: {} categories ({} ok, {} errors), {} sub-items -> {}",
        stats.total,
        stats.ok,
        stats.errors,
        subitems,
        out.display()
    );
    Ok(())
}

fn run_normalize(input: &PathBuf, out: &PathBuf) -> anyhow::Result<()> {
    let scraped = catalog::load_scraped(input)?;
    println!("Normalizing {} categories...", scraped.len());

    let normalized = normalize::normalize(scraped)?;
    catalog::save_json(out, &normalized)?;

    let items: usize = normalized.iter().map(|c| c.items.len()).sum();
    let pdfs = normalized
        .iter()
        .flat_map(|c| &c.items)
        .filter(|i| i.pdf.is_some())
        .count();
    println!(
        "Done: {} categories, {} items ({} with PDF) -> {}",
        normalized.len(),
        items,
        pdfs,
        out.display()
    );
    Ok(())
}

async fn run_download(
    input: &PathBuf,
    dest: &PathBuf,
    with_items: bool,
    delay_ms: u64,
) -> anyhow::Result<()> {
    let scraped = catalog::load_scraped(input)?;
    let jobs = download::plan(&scraped, dest, with_items)?;
    if jobs.is_empty() {
        println!("Nothing to download.");
        return Ok(());
    }
    println!("Downloading {} files into {}...", jobs.len(), dest.display());

    let client = scrape::build_client()?;
    let stats = download::run_downloads(&client, &jobs, Duration::from_millis(delay_ms)).await?;
    println!(
        "Done: {} files ({} ok, {} errors).",
        stats.total, stats.ok, stats.errors
    );
    Ok(())
}

fn run_stats(input: &PathBuf) -> anyhow::Result<()> {
    // A catalog file is either still in scraped form or already normalized.
    if let Ok(scraped) = catalog::load_scraped(input) {
        let subitems: usize = scraped.iter().map(|c| c.subespecialidades.len()).sum();
        let pdfs = scraped
            .iter()
            .flat_map(|c| &c.subespecialidades)
            .filter(|s| s.url.ends_with(".pdf"))
            .count();

        println!("Form:       scraped");
        println!("Categories: {}", scraped.len());
        println!("Sub-items:  {}", subitems);
        println!("PDF links:  {}", pdfs);
        println!();
        println!("{:>3} | {:<40} | {:>9}", "#", "Category", "Sub-items");
        println!("{}", "-".repeat(60));
        for (i, c) in scraped.iter().enumerate() {
            println!(
                "{:>3} | {:<40} | {:>9}",
                i + 1,
                truncate(&c.name, 40),
                c.subespecialidades.len()
            );
        }
        return Ok(());
    }

    let normalized = catalog::load_normalized(input)?;
    let items: usize = normalized.iter().map(|c| c.items.len()).sum();
    let pdfs = normalized
        .iter()
        .flat_map(|c| &c.items)
        .filter(|i| i.pdf.is_some())
        .count();

    println!("Form:       normalized");
    println!("Categories: {}", normalized.len());
    println!("Items:      {}", items);
    println!("With PDF:   {}", pdfs);
    println!();
    println!("{:>3} | {:<30} | {:<30} | {:>5}", "#", "Category", "Slug", "Items");
    println!("{}", "-".repeat(78));
    for (i, c) in normalized.iter().enumerate() {
        println!(
            "{:>3} | {:<30} | {:<30} | {:>5}",
            i + 1,
            truncate(&c.name, 30),
            truncate(&c.slug, 30),
            c.items.len()
        );
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
