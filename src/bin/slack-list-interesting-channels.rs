//! Lists the public channels worth exporting
//!
//! Prints the name of every public channel with more members than
//! `--min-members`, one per line, so busy channels can be told apart from
//! one-off pairs before running a full export.

use clap::Parser;
use slack_history::ListInterestingCli;
use std::process;

fn main() {
    let cli = ListInterestingCli::parse();
    slack_history::init_logging(cli.verbose);

    if let Err(e) = slack_history::commands::run_list_interesting_channels(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
