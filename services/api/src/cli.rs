use crate::demo::{run_demo, run_forecast, DemoArgs, ForecastArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use fire_inspection::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Fire Inspection Compliance Engine",
    about = "Run the fire-safety inspection service or walk through it from the command line",
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
    /// Walk a seeded inspection through drafting, review, and violation follow-up
    Demo(DemoArgs),
    /// Forecast incidents, resource needs, and training from CSV history exports
    Forecast(ForecastArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Start with an empty store instead of the sample establishments and checklist
    #[arg(long)]
    pub(crate) no_seed: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Forecast(args) => run_forecast(args),
    }
}
