use crate::demo::{run_demo, run_eligibility, DemoArgs, EligibilityArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use scheme_assist::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Scheme Assist",
    about = "Register applicants, manage assistance schemes, and check eligibility",
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
    /// Seed a sample household and schemes, then print the eligible schemes
    Demo(DemoArgs),
    /// Evaluate an applicant snapshot against a list of schemes without a server
    Eligibility(EligibilityArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Eligibility(args) => run_eligibility(args),
    }
}
