use clap::Parser;
use clap::Subcommand;

use crate::config_override::CliConfigOverrides;

/// Browse rental listings and stream AI transparency reports for them.
#[derive(Parser, Debug, Clone)]
#[command(name = "rentlens", version)]
pub struct Cli {
    #[clap(flatten)]
    pub config_overrides: CliConfigOverrides,

    /// Base URL of the backend API, e.g. `http://localhost:8000/api`.
    #[arg(long = "api-base", value_name = "URL", global = true)]
    pub api_base: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List properties, one page at a time.
    Listings(ListingsArgs),

    /// Show a single property.
    Property {
        id: String,

        /// Print the raw JSON record.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Stream a transparency report for a property.
    Report {
        id: String,

        /// Analyze this address instead of the one on the listing.
        #[arg(long)]
        address: Option<String>,

        /// Print the final report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Send one chat message, optionally continuing an earlier thread.
    Chat {
        message: String,

        #[arg(long = "thread-id", value_name = "ID")]
        thread_id: Option<String>,

        /// Print the reply as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct ListingsArgs {
    /// Number of listings to skip, rounded down to a page boundary.
    #[arg(long, default_value_t = 0)]
    pub skip: u32,

    /// Page size. Defaults to `page_size` from config.toml.
    #[arg(long)]
    pub limit: Option<u32>,

    #[arg(long = "min-price")]
    pub min_price: Option<u32>,

    #[arg(long = "max-price")]
    pub max_price: Option<u32>,

    #[arg(long)]
    pub beds: Option<u32>,

    #[arg(long)]
    pub borough: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
