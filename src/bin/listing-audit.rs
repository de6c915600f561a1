//! listing-audit command line
//!
//! Runs one analysis against the listing open in a browser, or against a saved
//! page snapshot, and prints the result card.

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use listing_audit::scoring::DEFAULT_ENDPOINT;
use listing_audit::{
    BrowserSession, ConnectionOptions, DomTree, ExtractionProfile, HttpScoringClient, LaunchOptions, Orchestrator,
    PageAgent, PanelView, Phase, ScoringConfig, SnapshotAgent, TextExtractor,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "listing-audit")]
#[command(version)]
#[command(about = "Risk assessment for marketplace job listings", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract the listing, score it and print the result card
    Analyze {
        #[command(flatten)]
        page: PageArgs,

        /// Scoring service endpoint
        #[arg(long, value_name = "URL", env = "LISTING_AUDIT_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Scoring request timeout in seconds
        #[arg(long, value_name = "SECS", default_value = "60")]
        timeout: u64,

        /// Print the result card as HTML
        #[arg(long)]
        html: bool,
    },

    /// Extract the listing and print the data as JSON without scoring it
    Extract {
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Args)]
struct PageArgs {
    /// Read the page from a saved snapshot instead of a browser
    #[arg(long, value_name = "FILE", conflicts_with_all = ["url", "ws_endpoint", "headed"])]
    snapshot: Option<PathBuf>,

    /// Navigate to this URL before extracting
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// WebSocket endpoint of a running browser to attach to
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// Disable the Chrome sandbox
    #[arg(long)]
    no_sandbox: bool,

    /// Extraction profile (JSON)
    #[arg(long, value_name = "FILE", env = "LISTING_AUDIT_PROFILE")]
    profile: Option<PathBuf>,

    /// Save the captured page snapshot for offline replay
    #[arg(long, value_name = "FILE")]
    dump_snapshot: Option<PathBuf>,
}

enum PageSource {
    Snapshot(SnapshotAgent),
    Live(BrowserSession),
}

impl PageSource {
    fn open(args: &PageArgs) -> anyhow::Result<Self> {
        if let Some(path) = &args.snapshot {
            return Ok(PageSource::Snapshot(SnapshotAgent::from_file(path)?));
        }

        let session = match &args.ws_endpoint {
            Some(ws_url) => BrowserSession::connect(ConnectionOptions::new(ws_url.clone()))?,
            None => {
                let mut options = LaunchOptions::new().headless(!args.headed).sandbox(!args.no_sandbox);
                if let Some(path) = &args.chrome_path {
                    options = options.chrome_path(path);
                }
                if let Some(dir) = &args.user_data_dir {
                    options = options.user_data_dir(dir);
                }
                BrowserSession::launch(options)?
            }
        };

        if let Some(url) = &args.url {
            session.navigate(url)?;
        }

        Ok(PageSource::Live(session))
    }

    fn agent(&mut self) -> &mut dyn PageAgent {
        match self {
            PageSource::Snapshot(agent) => agent,
            PageSource::Live(session) => session,
        }
    }

    fn snapshot(&self) -> Option<&DomTree> {
        match self {
            PageSource::Snapshot(agent) => agent.page(),
            PageSource::Live(session) => session.last_snapshot(),
        }
    }

    fn dump(&self, path: Option<&PathBuf>) -> anyhow::Result<()> {
        let Some(path) = path else {
            return Ok(());
        };
        let Some(tree) = self.snapshot() else {
            log::warn!("No snapshot captured, nothing written to {}", path.display());
            return Ok(());
        };
        std::fs::write(path, tree.to_json()?).with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Snapshot saved to {}", path.display());
        Ok(())
    }
}

fn load_extractor(args: &PageArgs) -> anyhow::Result<TextExtractor> {
    let profile = match &args.profile {
        Some(path) => ExtractionProfile::from_file(path)?,
        None => ExtractionProfile::default(),
    };
    Ok(TextExtractor::new(&profile)?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Analyze {
            page,
            endpoint,
            timeout,
            html,
        } => {
            let mut extractor = load_extractor(&page)?;
            let scorer = HttpScoringClient::new(ScoringConfig::new(endpoint).timeout(Duration::from_secs(timeout)))?;
            let mut source = PageSource::open(&page)?;

            let mut orchestrator = Orchestrator::new().with_sink(|phase: Phase, view: &PanelView| {
                if phase != Phase::Rendered {
                    eprintln!("{}", view.status);
                }
            });
            let phase = orchestrator.run(source.agent(), &mut extractor, &scorer).await?;
            source.dump(page.dump_snapshot.as_ref())?;

            match (phase, &orchestrator.view().fragment) {
                (Phase::Rendered, Some(fragment)) => {
                    if html {
                        print!("{}", fragment.to_html());
                    } else {
                        print!("{}", fragment.to_text());
                    }
                }
                _ => {
                    if let Some(failure) = orchestrator.failure() {
                        log::debug!("Run failed: {:?}", failure);
                    }
                    bail!("{}", orchestrator.view().status);
                }
            }
        }
        Command::Extract { page } => {
            let mut extractor = load_extractor(&page)?;
            let mut source = PageSource::open(&page)?;

            let data = source
                .agent()
                .execute(&mut extractor)
                .await
                .context("Error: Please refresh the page.")?;
            source.dump(page.dump_snapshot.as_ref())?;

            println!("{}", serde_json::to_string_pretty(&data)?);
            if let Some(message) = data.error {
                bail!(message);
            }
        }
    }

    Ok(())
}
