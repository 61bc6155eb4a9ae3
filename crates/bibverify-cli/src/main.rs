use std::path::PathBuf;

use anyhow::Context;
use bibverify_core::{
    AbstractFetcher, ChannelObserver, Config, EnrichOptions, PageAbstractFetcher, Verifier,
};
use clap::Parser;
use tokio_util::sync::CancellationToken;

mod output;

use output::ColorMode;

/// Verify the authenticity of references in a BibTeX file
#[derive(Parser, Debug)]
#[command(name = "bibverify", version, about, long_about = None)]
struct Args {
    /// Path to the .bib file to verify
    bibfile: PathBuf,

    /// Output report file
    #[arg(short, long, default_value = "verification_report.txt")]
    output: PathBuf,

    /// Also save results as JSON next to the report
    #[arg(short, long)]
    json: bool,

    /// Per-request timeout in seconds [env: BIBVERIFY_TIMEOUT] [default: 10]
    #[arg(long)]
    timeout: Option<u64>,

    /// Minimum delay between requests in seconds [env: BIBVERIFY_DELAY_MIN] [default: 1.0]
    #[arg(long)]
    delay_min: Option<f64>,

    /// Maximum delay between requests in seconds [env: BIBVERIFY_DELAY_MAX] [default: 3.0]
    #[arg(long)]
    delay_max: Option<f64>,

    /// Attempt to fetch abstracts (Crossref first, then the landing page with --use-browser)
    #[arg(long)]
    fetch_abstract: bool,

    /// Scrape the DOI/URL landing page for abstracts Crossref does not have
    #[arg(long)]
    use_browser: bool,

    /// Request a visible browser window (kept for compatibility; pages are fetched directly)
    #[arg(long)]
    show_browser: bool,

    /// Landing page timeout in milliseconds
    #[arg(long, default_value_t = 20_000)]
    browser_timeout_ms: u64,

    /// Search Crossref for alternatives to invalid references
    #[arg(long)]
    search_alternatives: bool,

    /// Output file for alternative references
    #[arg(long, default_value = "alternatives.bib")]
    alternatives_output: PathBuf,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn env_parse<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> anyhow::Result<Option<T>> {
    match env(name).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("invalid value for {name}: {raw:?}")),
        None => Ok(None),
    }
}

/// Resolve configuration: CLI flags > env vars > defaults.
fn resolve_config(args: &Args, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
    let defaults = Config::default();

    let timeout_secs = match args.timeout {
        Some(t) => t,
        None => env_parse(&env, "BIBVERIFY_TIMEOUT")?.unwrap_or(defaults.timeout_secs),
    };
    let delay_min_secs = match args.delay_min {
        Some(d) => d,
        None => env_parse(&env, "BIBVERIFY_DELAY_MIN")?.unwrap_or(defaults.delay_min_secs),
    };
    let delay_max_secs = match args.delay_max {
        Some(d) => d,
        None => env_parse(&env, "BIBVERIFY_DELAY_MAX")?.unwrap_or(defaults.delay_max_secs),
    };
    let crossref_mailto = env("CROSSREF_MAILTO").filter(|s| !s.trim().is_empty());

    let config = Config {
        timeout_secs,
        delay_min_secs,
        delay_max_secs,
        crossref_mailto,
        browser_timeout_ms: args.browser_timeout_ms,
        headless: !args.show_browser,
        ..defaults
    };
    config.validate()?;
    Ok(config)
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(args.verbose);

    if !args.bibfile.exists() {
        anyhow::bail!("File not found: {}", args.bibfile.display());
    }
    let config = resolve_config(&args, |name| std::env::var(name).ok())?;
    log::debug!("resolved configuration: {config:?}");
    let color = ColorMode(!args.no_color);
    let mut stdout = std::io::stdout();

    let references = bibverify_bib::parse_bib_file(&args.bibfile)
        .with_context(|| format!("reading {}", args.bibfile.display()))?;
    println!(
        "Found {} references in {}",
        references.len(),
        args.bibfile.display()
    );
    if references.is_empty() {
        println!("No references to check.");
        return Ok(());
    }

    let verifier = Verifier::new(config.clone())?;

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    let (observer, rx) = ChannelObserver::channel();
    let bar = output::progress_bar(references.len(), color);
    let drain = tokio::spawn(output::drain_events(rx, bar.clone()));

    let report = verifier
        .check_references(&references, &observer, &cancel)
        .await;
    let mut results = report.results;
    let cancelled = cancel.is_cancelled();

    if args.fetch_abstract && !cancelled {
        let page_fetcher = if args.use_browser {
            Some(PageAbstractFetcher::from_config(&config)?)
        } else {
            None
        };
        results = verifier
            .enrich_abstracts(
                results,
                page_fetcher.as_ref().map(|f| f as &dyn AbstractFetcher),
                &EnrichOptions::from_config(&config),
                &observer,
            )
            .await;
    }

    let alternatives = if args.search_alternatives && !cancel.is_cancelled() {
        verifier.discover_alternatives(&results, &observer).await
    } else {
        Vec::new()
    };

    drop(observer);
    drain.await.ok();
    bar.finish_and_clear();

    if cancelled {
        println!(
            "Interrupted: {} of {} references checked",
            results.len(),
            references.len()
        );
    }

    let generated_at = chrono::Local::now().naive_local();
    let paths =
        bibverify_reporting::write_report_files(&results, &args.output, args.json, generated_at)?;
    println!("Report saved to: {}", paths.text.display());
    if let Some(json) = &paths.json {
        println!("JSON results saved to: {}", json.display());
    }

    if args.search_alternatives {
        output::print_alternatives_summary(&mut stdout, &alternatives, color)?;
        if !alternatives.is_empty() {
            bibverify_reporting::write_alternatives_file(
                &alternatives,
                &args.alternatives_output,
                generated_at,
            )?;
            println!(
                "Alternative references saved to: {}",
                args.alternatives_output.display()
            );
        }
    }

    output::print_summary(&mut stdout, &results, color)?;
    Ok(())
}
