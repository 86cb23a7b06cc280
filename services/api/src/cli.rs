use crate::server;
use crate::simulate::{print_questions, run_simulation, SimulateArgs};
use clap::{Args, Parser, Subcommand};
use scorecard::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Automation Scorecard",
    about = "Run the automation scorecard audit service or drive an audit from the command line",
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
    /// Print the question bank with option weights
    Questions,
    /// Answer the audit locally and print the scored result
    Simulate(SimulateArgs),
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
        Command::Questions => print_questions(),
        Command::Simulate(args) => run_simulation(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulate_collects_repeated_answers() {
        let cli = Cli::try_parse_from([
            "scorecard-api",
            "simulate",
            "--answer",
            "team=Solo Founder",
            "--answer",
            "tools=CRM (HubSpot, Salesforce)",
            "--submit",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Simulate(args)) => {
                assert_eq!(args.answers.len(), 2);
                assert_eq!(
                    args.answers[1],
                    ("tools".to_string(), "CRM (HubSpot, Salesforce)".to_string())
                );
                assert!(args.submit);
            }
            other => panic!("expected simulate, got {other:?}"),
        }
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["scorecard-api"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
