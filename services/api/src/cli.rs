use crate::demo::{run_demo, run_purge, run_report, DemoArgs, PurgeArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use emotion_survey::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Emotion Survey",
    about = "Run the RFID emotion survey backend and its maintenance commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Export every session and answer as CSV
    Report(ReportArgs),
    /// Seed the demonstration sessions and print their diagnoses
    Demo(DemoArgs),
    /// Delete sessions older than the retention window
    Purge(PurgeArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON document holding sessions; in-memory when omitted
    #[arg(long)]
    pub(crate) data_file: Option<PathBuf>,
    /// Line-delimited tag-reader feed (device, FIFO or file)
    #[arg(long)]
    pub(crate) tag_feed: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args),
        Command::Demo(args) => run_demo(args),
        Command::Purge(args) => run_purge(args),
    }
}
