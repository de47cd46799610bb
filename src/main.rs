use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use class_scheduler::display::{export_schedule, print_readiness, print_schedule};
use class_scheduler::parser::load_records;
use class_scheduler::{web, RosterStore, Settings};

#[derive(Parser, Debug)]
#[command(name = "class-scheduler")]
#[command(about = "Assigns students and instructors to weekly class periods")]
#[command(version)]
struct Args {
    /// TOML file with allocation settings
    #[arg(short, long, global = true, env = "CLASS_SCHEDULER_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import both rosters from CSV and print the schedule
    Schedule {
        /// Student responses (CSV with an ID column and one column per period)
        #[arg(long)]
        students: PathBuf,

        /// Instructor responses (CSV)
        #[arg(long)]
        instructors: PathBuf,

        /// Write the schedule to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the admin HTTP API
    Web {
        #[arg(short, long, default_value = "8080", env = "CLASS_SCHEDULER_PORT")]
        port: u16,

        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: String,
    },
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(Settings::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "class_scheduler=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let settings = load_settings(args.settings.as_ref())?;

    match args.command {
        Command::Schedule {
            students,
            instructors,
            output,
        } => {
            let mut roster = RosterStore::new();
            let student_records = load_records(&students)
                .with_context(|| format!("Failed to import students from {}", students.display()))?;
            roster.replace_students(&student_records);
            let instructor_records = load_records(&instructors)
                .with_context(|| {
                    format!("Failed to import instructors from {}", instructors.display())
                })?;
            roster.replace_instructors(&instructor_records);

            print_readiness(&roster.readiness(&settings));

            let schedule = roster.allocate(&settings).context("Failed to generate schedule")?;
            print_schedule(&schedule);

            if let Some(output) = output {
                export_schedule(&schedule, &output)
                    .with_context(|| format!("Failed to export schedule to {}", output.display()))?;
                info!("Schedule saved to {}", output.display());
            }
        }
        Command::Web {
            port,
            admin_password,
        } => {
            web::start_server(port, settings, admin_password)
                .await
                .context("Server error")?;
        }
    }

    Ok(())
}
