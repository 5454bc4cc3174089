mod cli;
mod config_override;
pub mod render;
mod update_processor;
mod update_processor_with_human_output;
mod update_processor_with_json_output;

use anyhow::Context as _;
use futures::StreamExt;
use rentlens_core::AnalysisClient;
use rentlens_core::Conversation;
use rentlens_core::ListingClient;
use rentlens_core::ReportSession;
use rentlens_core::config::Config;
use rentlens_core::config::ConfigOverrides;
use rentlens_core::config::find_rentlens_home;
use rentlens_core::prompt::analysis_address;
use rentlens_core::view::ListingFilters;
use rentlens_core::view::ListingView;
use rentlens_protocol::ThreadId;
use tracing::debug;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use cli::Cli;
pub use cli::Command;
pub use cli::ListingsArgs;
pub use config_override::CliConfigOverrides;

use crate::update_processor::RunStatus;
use crate::update_processor::UpdateProcessor;
use crate::update_processor_with_human_output::UpdateProcessorWithHumanOutput;
use crate::update_processor_with_json_output::UpdateProcessorWithJsonOutput;

const DEFAULT_LOG_LEVEL: &str = "error";

pub async fn run_main(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        config_overrides,
        api_base,
        command,
    } = cli;

    load_dotenv();

    let _ = tracing_subscriber::fmt()
        // Fall back to the default filter if RUST_LOG is unset or invalid.
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_LEVEL))
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli_kv_overrides = config_overrides
        .parse_overrides()
        .map_err(|e| anyhow::anyhow!("Error parsing -c overrides: {e}"))?;
    let overrides = ConfigOverrides {
        api_base,
        ..Default::default()
    };
    let config = Config::load_with_cli_overrides(cli_kv_overrides, overrides)?;
    debug!("using api base {}", config.api_base);

    match command {
        Command::Listings(args) => run_listings(&config, args).await,
        Command::Property { id, json } => run_property(&config, &id, json).await,
        Command::Report { id, address, json } => run_report(&config, &id, address, json).await,
        Command::Chat {
            message,
            thread_id,
            json,
        } => run_chat(&config, &message, thread_id, json).await,
    }
}

/// Load env vars from `~/.rentlens/.env` and `$(pwd)/.env`.
fn load_dotenv() {
    if let Ok(rentlens_home) = find_rentlens_home() {
        dotenvy::from_path(rentlens_home.join(".env")).ok();
    }
    dotenvy::dotenv().ok();
}

async fn run_listings(config: &Config, args: ListingsArgs) -> anyhow::Result<()> {
    let client = ListingClient::new(config)?;
    let page_size = args.limit.unwrap_or(config.page_size);
    let mut view = ListingView::new(page_size);
    view.set_filters(ListingFilters {
        min_price: args.min_price,
        max_price: args.max_price,
        beds: args.beds,
        borough: args.borough,
    });
    view.go_to_page(args.skip / page_size.max(1));

    let properties = view.load(&client).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(properties)?);
        return Ok(());
    }
    if properties.is_empty() {
        eprintln!("No properties match these filters.");
        return Ok(());
    }
    for property in properties {
        println!("{}", render::listing_line(property));
    }
    if view.has_next_page() {
        let next = view.query().skip + page_size;
        eprintln!("More results: --skip {next}");
    }
    Ok(())
}

async fn run_property(config: &Config, id: &str, json: bool) -> anyhow::Result<()> {
    let client = ListingClient::new(config)?;
    let property = client.get(id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&property)?);
    } else {
        print!("{}", render::property_details(&property));
    }
    Ok(())
}

async fn run_report(
    config: &Config,
    id: &str,
    address: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let address = match address {
        Some(address) => address,
        None => {
            let property = ListingClient::new(config)?.get(id).await?;
            analysis_address(&property)
                .map(str::to_string)
                .with_context(|| format!("property {id} has no address; pass --address"))?
        }
    };
    info!("requesting transparency report for {address}");

    let mut session = ReportSession::new(AnalysisClient::new(config)?);
    let run = session.start_analysis(&address);
    drive(run, processor(json, true)).await
}

async fn run_chat(
    config: &Config,
    message: &str,
    thread_id: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let conversation = match thread_id {
        Some(id) => Conversation::with_thread_id(ThreadId::from(id)),
        None => Conversation::new(),
    };
    let mut session = ReportSession::with_conversation(AnalysisClient::new(config)?, conversation);
    let run = session.send(message);
    drive(run, processor(json, false)).await
}

fn processor(json: bool, show_report: bool) -> Box<dyn UpdateProcessor> {
    if json {
        Box::new(UpdateProcessorWithJsonOutput)
    } else {
        Box::new(UpdateProcessorWithHumanOutput::new(show_report))
    }
}

/// Feed every update of `run` to `processor`. Ctrl-C cancels the run.
async fn drive(
    mut run: rentlens_core::ReportRun<'_>,
    mut processor: Box<dyn UpdateProcessor>,
) -> anyhow::Result<()> {
    let token = run.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let mut status = RunStatus::Running;
    while let Some(update) = run.next().await {
        status = processor.process_update(update);
        if status != RunStatus::Running {
            break;
        }
    }
    ctrl_c.abort();

    match status {
        RunStatus::Finished => Ok(()),
        RunStatus::Failed => std::process::exit(1),
        RunStatus::Running => anyhow::bail!("analysis stream ended without a result"),
    }
}
