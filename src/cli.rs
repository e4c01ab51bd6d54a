use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::settings::{SETTINGS_FILE, Settings};

#[derive(Parser, Debug)]
#[command(name = "slack-history")]
#[command(about = "Download the full history of the channels, private channels and direct messages you are in")]
pub struct Cli {
    /// An API token for a Slack user (defaults to $SLACK_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Only list conversations; don't fetch or write any history
    #[arg(long = "dryRun")]
    pub dry_run: bool,

    /// Don't fetch thread replies
    #[arg(long = "skipThreads")]
    pub skip_threads: bool,

    /// Skip fetching history for private channels
    #[arg(long = "skipPrivateChannels")]
    pub skip_private_channels: bool,

    /// Skip fetching history for public channels
    #[arg(long = "skipChannels")]
    pub skip_channels: bool,

    /// Skip fetching history for public and private channels
    #[arg(long = "skipAllChannels")]
    pub skip_all_channels: bool,

    /// Skip fetching history for direct messages
    #[arg(long = "skipDirectMessages")]
    pub skip_direct_messages: bool,

    /// Don't re-download conversations whose export file already exists
    #[arg(long = "skipExisting")]
    pub skip_existing: bool,

    /// Keep exporting other conversations when one fails
    #[arg(long = "continueOnError")]
    pub continue_on_error: bool,

    /// Directory receiving metadata.json and the per-conversation folders
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Messages requested per history page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Give up on a conversation after this many pages (0 = no limit)
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Settings file
    #[arg(long, default_value = SETTINGS_FILE)]
    pub config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Overrides file settings with whatever was given on the command line.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(ref output) = self.output {
            settings.export.output_dir = output.clone();
        }
        if let Some(page_size) = self.page_size {
            settings.export.page_size = page_size;
        }
        if let Some(max_pages) = self.max_pages {
            settings.export.max_pages = max_pages;
        }
        if self.skip_existing {
            settings.export.skip_existing = true;
        }
        if self.continue_on_error {
            settings.export.continue_on_error = true;
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "slack-list-interesting-channels")]
#[command(about = "List public channels with more than a few members")]
pub struct ListInterestingCli {
    /// An API token for a Slack user (defaults to $SLACK_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Accepted for compatibility; nothing is ever written
    #[arg(long = "dryRun")]
    pub dry_run: bool,

    /// Channels need strictly more members than this to be listed
    #[arg(long, default_value_t = 2)]
    pub min_members: u64,

    /// Settings file
    #[arg(long, default_value = SETTINGS_FILE)]
    pub config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
