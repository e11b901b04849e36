use clap::{Parser, Subcommand};
use lazy_static::lazy_static;
use neocare_common::Language;
use regex::Regex;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "neocare")]
#[command(about = "Vitals analysis, prescription scans and medicine delivery requests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze vitals images (files or folders)
    Analyze {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Instruction sent with the images
        #[arg(short, long)]
        prompt: Option<String>,

        /// Report language (en/hi/mr)
        #[arg(short, long)]
        lang: Option<Language>,

        /// Also scan subfolders
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// Show the last report again, optionally in another language
    Report {
        #[arg(short, long)]
        lang: Option<Language>,

        /// Saved analysis JSON instead of the last one
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Scan a prescription image and prepare an order
    Scan {
        #[arg(required = true)]
        image: PathBuf,
    },

    /// Compose and submit a delivery request from the last scan
    Order {
        #[arg(long)]
        name: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        address: String,

        #[arg(long)]
        pincode: String,

        #[arg(long, default_value = "")]
        landmark: String,

        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Change a quantity, e.g. `--qty 2:+1` or `--qty 1:-1`
        #[arg(long = "qty", value_name = "ID:DELTA", allow_hyphen_values = true)]
        quantities: Vec<QuantityChange>,

        /// Drop a line item by id
        #[arg(long = "remove", value_name = "ID")]
        removals: Vec<u32>,

        /// Send without a location without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// List stores near a location
    Stores {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Search radius in km (default from config)
        #[arg(long)]
        radius: Option<f64>,
    },

    /// Talk to the Dr.NEO assistant; without a message, show the conversation
    Chat {
        message: Option<String>,

        /// Start a new conversation
        #[arg(long)]
        clear: bool,
    },

    /// Show or edit the upload history
    History {
        /// Delete the entry at this position (1 = newest)
        #[arg(long)]
        remove: Option<usize>,

        #[arg(long)]
        clear: bool,
    },

    /// Show or edit settings
    Config {
        /// Host of the services, e.g. http://localhost:8085
        #[arg(long)]
        set_api_url: Option<String>,

        #[arg(long)]
        show: bool,
    },

    /// Store the session credential
    Login {
        #[arg(long)]
        user: String,

        #[arg(long)]
        token: String,
    },

    /// Forget the credential and every session-scoped value
    Logout,
}

/// `ID:DELTA` argument of `order --qty`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantityChange {
    pub id: u32,
    pub delta: i64,
}

lazy_static! {
    static ref QUANTITY_CHANGE: Regex = Regex::new(r"^\s*(\d+)\s*:\s*([+-]?\d+)\s*$").unwrap();
}

impl std::str::FromStr for QuantityChange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cap = QUANTITY_CHANGE
            .captures(s)
            .ok_or_else(|| format!("Invalid quantity change: {}. Use ID:DELTA, e.g. 2:+1", s))?;
        let id = cap[1].parse::<u32>().map_err(|e| e.to_string())?;
        let delta = cap[2].parse::<i64>().map_err(|e| e.to_string())?;
        Ok(Self { id, delta })
    }
}
