use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use room_outage_sim::config::SelectionFile;
use room_outage_sim::display::{print_report, write_report_files};
use room_outage_sim::parser::{load_bookings, load_rooms};
use room_outage_sim::simulate;
use room_outage_sim::web;

#[derive(Parser)]
#[command(name = "room-outage-sim")]
#[command(about = "Simulate the timetable impact of taking rooms or buildings out of service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output (ignored when RUST_LOG is set)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a removal simulation.
    Simulate {
        /// Booking table (CSV or Excel workbook)
        #[arg(long)]
        bookings: PathBuf,
        /// Room table with capacities (CSV or Excel workbook)
        #[arg(long)]
        rooms: PathBuf,
        /// Building to take out of service (repeatable)
        #[arg(long = "building")]
        buildings: Vec<String>,
        /// Individual room to take out of service (repeatable)
        #[arg(long = "room")]
        remove_rooms: Vec<String>,
        /// First unavailable day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Allow moving activities up to 7 days later
        #[arg(long)]
        allow_redistribution: bool,
        /// JSON selection file, merged with the flags above
        #[arg(long)]
        selection: Option<PathBuf>,
        /// Directory to write same_time.csv, shifted.csv and unplaceable.csv into
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// List the buildings and rooms that can be selected.
    Options {
        /// Room table with capacities (CSV or Excel workbook)
        #[arg(long)]
        rooms: PathBuf,
    },

    /// Serve the JSON API.
    Web {
        #[arg(long, env = "PORT", default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Simulate {
            bookings,
            rooms,
            buildings,
            remove_rooms,
            from,
            allow_redistribution,
            selection,
            output_dir,
        } => {
            let file = match selection {
                Some(path) => SelectionFile::from_path(&path)
                    .with_context(|| format!("loading selection {}", path.display()))?,
                None => SelectionFile::default(),
            };
            let selection = file.merge(
                buildings,
                remove_rooms,
                from,
                allow_redistribution,
                Local::now().date_naive(),
            );

            let registry = load_rooms(&rooms).context("loading room table")?;
            let bookings = load_bookings(&bookings).context("loading booking table")?;

            let report = simulate(&registry, &bookings, &selection);
            print_report(&report);

            if let Some(dir) = output_dir {
                write_report_files(&report, &dir)
                    .with_context(|| format!("writing results to {}", dir.display()))?;
                info!(dir = %dir.display(), "results written");
            }
        }
        Commands::Options { rooms } => {
            let registry = load_rooms(&rooms).context("loading room table")?;
            println!("Buildings:");
            for building in registry.buildings() {
                println!("  {}", building);
            }
            println!("Rooms:");
            for room in registry.room_ids() {
                println!("  {}", room);
            }
        }
        Commands::Web { port } => {
            println!("Access the API at http://localhost:{}", port);
            web::start_server(port).await?;
        }
    }

    Ok(())
}
