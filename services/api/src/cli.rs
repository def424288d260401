use crate::console::{
    run_application_list, run_lookups, run_selection, ApplicationListArgs, LookupArgs,
    SelectionArgs,
};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use civic_intake::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Civic Participation Intake",
    about = "Run and operate the Civic Participation Program application service",
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
    /// Print the active options of a reference table
    Lookups(LookupArgs),
    /// Administrator operations against submitted applications
    Applications {
        #[command(subcommand)]
        command: ApplicationsCommand,
    },
    /// Walk an application through the wizard and console against an in-memory backend
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ApplicationsCommand {
    /// List one page of applications
    List(ApplicationListArgs),
    /// Select up to N submitted applications
    Select(SelectionArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the backend REST API base URL
    #[arg(long)]
    pub(crate) backend_url: Option<String>,
    /// Serve from an in-memory backend instead of the REST API
    #[arg(long)]
    pub(crate) in_memory: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Lookups(args) => run_lookups(args).await,
        Command::Applications {
            command: ApplicationsCommand::List(args),
        } => run_application_list(args).await,
        Command::Applications {
            command: ApplicationsCommand::Select(args),
        } => run_selection(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
