use clap::Parser;
use slack_history::Cli;

fn main() {
    let cli = Cli::parse();
    slack_history::init_logging(cli.verbose);

    if let Err(e) = slack_history::commands::run_export_history(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
