use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wikicheck::reference::{ReferenceSource, WikiClient};
use wikicheck::HarnessConfig;

#[derive(Parser)]
#[command(name = "wikicheck", version, about = "Compare Wikipedia API results with what a browser receives")]
struct Cli {
    /// MediaWiki API endpoint
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every parity scenario through a browser
    Run(RunArgs),
    /// Print search results, a page's title/URL/summary and a geosearch
    Suggest,
    /// Print the page id of a title
    PageId {
        #[arg(long, default_value = "Python (programming language)")]
        title: String,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Browser to provision: chrome or edge
    #[arg(long, default_value = "chrome")]
    browser: String,

    /// Run the scenarios against every supported browser (ignores --browser)
    #[arg(long)]
    all_browsers: bool,

    /// Browser executable to launch instead of the located one
    #[arg(long)]
    browser_path: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Element wait timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Minimum overlap fraction for list comparisons
    #[arg(long, default_value_t = 0.3)]
    overlap: f64,

    /// Where failure screenshots are written
    #[arg(long, default_value = ".")]
    screenshot_dir: PathBuf,
}

fn base_config(cli: &Cli) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    config
}

#[cfg(feature = "cdp")]
fn run(config: HarnessConfig, args: &RunArgs) -> anyhow::Result<bool> {
    use wikicheck::scenario;
    use wikicheck::{BrowserKind, Scenario};

    let config = HarnessConfig {
        headless: !args.headful,
        browser_path: args.browser_path.clone(),
        wait_timeout_ms: args.timeout_ms,
        overlap_threshold: args.overlap,
        screenshot_dir: args.screenshot_dir.clone(),
        ..config
    };
    config.validate()?;

    let kinds = if args.all_browsers {
        BrowserKind::ALL.to_vec()
    } else {
        vec![args.browser.parse::<BrowserKind>()?]
    };

    let client = WikiClient::new(&config)?;
    let scenarios = Scenario::defaults();
    let entries = scenario::run_matrix(&kinds, &client, &scenarios, &config);

    let mut all_passed = true;
    for (kind, run) in &entries {
        let run = match run {
            Ok(run) => run,
            Err(e) => {
                println!("{}: not provisioned: {}", kind, e);
                all_passed = false;
                continue;
            }
        };
        println!(
            "{}: {} passed, {} failed",
            run.browser,
            run.results.len() - run.failures(),
            run.failures()
        );
        for (scenario, result) in &run.results {
            match result {
                Ok(_) => println!("  PASSED {}", scenario),
                Err(e) => println!("  FAILED {}: {}", scenario, e),
            }
        }
        all_passed &= run.passed();
    }
    Ok(all_passed)
}

#[cfg(not(feature = "cdp"))]
fn run(_config: HarnessConfig, _args: &RunArgs) -> anyhow::Result<bool> {
    anyhow::bail!("wikicheck was built without the 'cdp' feature; no browser backend is available")
}

fn suggest_demo(config: &HarnessConfig) -> anyhow::Result<()> {
    let client = WikiClient::new(config)?;

    println!("Search results for 'Python':");
    for result in client.suggest("Python")? {
        println!("{}", result);
    }

    let page = client
        .page("Python (programming language)")
        .context("resolving 'Python (programming language)'")?;
    println!("Title: {}", page.title);
    println!("URL: {}", page.url);
    println!("Summary: {}", client.summary(&page.title)?);

    println!("Suggestions for 'pyth':");
    for suggestion in client.search_with_limit("pyth", 5)? {
        println!("{}", suggestion);
    }

    println!("Geosearch results:");
    for place in client.geosearch(40.712776, -74.005974)? {
        println!("{}", place);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = base_config(&cli);

    match &cli.command {
        Command::Run(args) => {
            if !run(config, args)? {
                std::process::exit(1);
            }
        }
        Command::Suggest => suggest_demo(&config)?,
        Command::PageId { title } => {
            let client = WikiClient::new(&config)?;
            let page_id = client.page_id(title)?;
            println!("The ID of the page '{}' is {}", title, page_id);
        }
    }
    Ok(())
}
