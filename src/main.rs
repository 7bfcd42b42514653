use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use proxy_quota::{
    proxy::{CheckerConfig, ProxyChecker, ProxyParser, Quota, ResolverConfig, TargetResolver},
    ConsoleReporter, Scheduler, SchedulerConfig,
};
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Probe HTTP proxies against a download link and stop once enough of them work
#[derive(Parser)]
#[command(name = "proxy-quota", version)]
#[command(about = "Probe HTTP proxies against a download link and stop once enough of them work")]
struct Cli {
    /// File containing proxies (IP:PORT, http://HOST:PORT, https://HOST:PORT)
    #[arg(short, long, default_value = "proxies.txt")]
    proxies: PathBuf,

    /// Mod page to scrape the download link from (prompted for if omitted)
    #[arg(short = 'u', long, conflicts_with = "target")]
    page_url: Option<String>,

    /// Probe this URL directly instead of scraping a page
    #[arg(long)]
    target: Option<String>,

    /// Number of working proxies wanted (prompted for if omitted)
    #[arg(short, long, allow_negative_numbers = true)]
    quota: Option<i64>,

    /// Number of concurrent probes
    #[arg(short = 'n', long, default_value = "100")]
    concurrency: usize,

    /// Timeout per probe in seconds
    #[arg(long, default_value = "8", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Print progress every N completed probes (0 to disable)
    #[arg(long, default_value = "50")]
    heartbeat: usize,

    /// Validate TLS certificates of the page and target
    #[arg(long)]
    strict_tls: bool,

    /// Save working proxies to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let console = Console { json: cli.json };

    let proxies = match ProxyParser::parse_file(&cli.proxies) {
        Ok(proxies) => proxies,
        Err(e) => {
            tracing::warn!("Error reading {:?}: {}", cli.proxies, e);
            Vec::new()
        }
    };
    if proxies.is_empty() {
        bail!("No HTTP proxies available in {:?}", cli.proxies);
    }
    console.status(format_args!(
        "Loaded {} HTTP proxies from {:?}.",
        proxies.len(),
        cli.proxies
    ));

    let target = match cli.target {
        Some(target) => target,
        None => {
            let page_url = match cli.page_url {
                Some(url) => url,
                None => console.prompt(
                    "Enter the mod page URL (e.g., https://geode-sdk.org/mods/geode.node-ids): ",
                )?,
            };
            if page_url.is_empty() {
                bail!("Invalid URL");
            }
            let resolver = TargetResolver::with_config(
                ResolverConfig::new().with_accept_invalid_certs(!cli.strict_tls),
            )?;
            let target = resolver.resolve(&page_url).await?;
            console.status(format_args!("Extracted download URL: {}", target));
            target
        }
    };

    let quota = match cli.quota {
        Some(n) => n,
        None => console.prompt("How many working proxies do you want? ")?
            .parse::<i64>()
            .map_err(|_| anyhow!("Invalid number"))?,
    };
    let quota = Quota::new(quota)?;

    let checker = ProxyChecker::with_config(
        CheckerConfig::new()
            .with_timeout(Duration::from_secs(cli.timeout))
            .with_accept_invalid_certs(!cli.strict_tls),
    );
    let scheduler = Scheduler::with_config(
        checker,
        SchedulerConfig::new()
            .with_pool_size(cli.concurrency)
            .with_heartbeat_every(cli.heartbeat),
    );

    console.status(format_args!("Starting..."));
    let mut reporter = if cli.json {
        ConsoleReporter::quiet()
    } else {
        ConsoleReporter::new()
    };
    let report = scheduler.run(proxies, &target, quota, &mut reporter).await?;

    if let Some(output_path) = cli.output {
        ProxyParser::save_to_file(&report.succeeded, &output_path)
            .with_context(|| format!("failed to write {:?}", output_path))?;
        console.status(format_args!(
            "Saved {} working proxies to {:?}",
            report.succeeded_count, output_path
        ));
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "proxy_quota=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Where user-facing status lines go. In JSON mode stdout carries only
/// the report, so everything else is written to stderr.
struct Console {
    json: bool,
}

impl Console {
    fn status(&self, message: fmt::Arguments<'_>) {
        if self.json {
            eprintln!("{}", message);
        } else {
            println!("{}", message);
        }
    }

    fn prompt(&self, message: &str) -> Result<String> {
        if self.json {
            eprint!("{}", message);
            io::stderr().flush()?;
        } else {
            print!("{}", message);
            io::stdout().flush()?;
        }
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}
