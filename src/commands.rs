use tracing::{info, warn};

use crate::cli::{Cli, ListInterestingCli};
use crate::conversations::{self, ConversationRef, channel_info, listing_header, listing_line};
use crate::error::{AppError, Result};
use crate::export::{conversation_path, write_conversation, write_metadata};
use crate::paginate::{PageOptions, fetch_conversation};
use crate::settings::{ExportSettings, Settings};
use crate::slack::{ConversationKind, Identity, SlackApi, SlackClient};
use crate::users::UserDirectory;
use crate::load_token;

/// What one run should do, after merging the command line and settings file.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub dry_run: bool,
    pub skip_threads: bool,
    pub skip_channels: bool,
    pub skip_private_channels: bool,
    pub skip_direct_messages: bool,
    pub export: ExportSettings,
}

impl ExportOptions {
    pub fn new(cli: &Cli, export: ExportSettings) -> Self {
        Self {
            dry_run: cli.dry_run,
            skip_threads: cli.skip_threads,
            skip_channels: cli.skip_channels || cli.skip_all_channels,
            skip_private_channels: cli.skip_private_channels || cli.skip_all_channels,
            skip_direct_messages: cli.skip_direct_messages,
            export,
        }
    }

    /// Conversation kinds to list and export, in export order.
    pub fn kinds(&self) -> Vec<ConversationKind> {
        ConversationKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                ConversationKind::PublicChannel => !self.skip_channels,
                ConversationKind::PrivateChannel => !self.skip_private_channels,
                ConversationKind::DirectMessage => !self.skip_direct_messages,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub conversations: usize,
    pub messages: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn run_export_history(cli: Cli) -> Result<()> {
    let token = load_token(cli.token.clone())?;
    let mut settings = Settings::load(&cli.config)?;
    cli.apply_to(&mut settings);

    let client = SlackClient::new(token, &settings.api)?.with_max_pages(settings.export.max_pages());
    let options = ExportOptions::new(&cli, settings.export);

    let summary = export_history(&client, &options)?;

    if !options.dry_run {
        println!(
            "Export completed successfully! {} messages from {} conversations exported.",
            summary.messages, summary.conversations
        );
        if summary.skipped > 0 {
            println!("{} conversations already exported were skipped.", summary.skipped);
        }
    }
    Ok(())
}

pub fn run_list_interesting_channels(cli: ListInterestingCli) -> Result<()> {
    let token = load_token(cli.token.clone())?;
    let settings = Settings::load(&cli.config)?;
    let client = SlackClient::new(token, &settings.api)?.with_max_pages(settings.export.max_pages());

    for name in list_interesting_channels(&client, cli.min_members)? {
        println!("{}", name);
    }
    Ok(())
}

pub fn list_interesting_channels(api: &impl SlackApi, min_members: u64) -> Result<Vec<String>> {
    let channels = api.list_conversations(ConversationKind::PublicChannel)?;
    Ok(conversations::interesting_channels(&channels, min_members))
}

/// Authenticates, then lists and (unless dry-running) exports every selected conversation.
pub fn export_history(api: &impl SlackApi, options: &ExportOptions) -> Result<ExportSummary> {
    let identity = authenticate(api)?;

    let users = UserDirectory::fetch(api)?;
    println!("found {} users", users.len());

    if !options.dry_run {
        println!("writing metadata");
        let path = write_metadata(&options.export.output_dir, &identity.raw, &users)?;
        info!(path = %path.display(), "wrote metadata");
    }

    let mut summary = ExportSummary::default();

    for kind in options.kinds() {
        let conversations = conversations::enumerate(api, kind, &users)?;

        println!("\n{}", listing_header(kind));
        for conversation in &conversations {
            println!("{}", listing_line(conversation));
        }

        if options.dry_run {
            continue;
        }

        for conversation in &conversations {
            match export_conversation(api, &identity, conversation, options) {
                Ok(Some(count)) => {
                    summary.conversations += 1;
                    summary.messages += count;
                }
                Ok(None) => summary.skipped += 1,
                Err(e) if options.export.continue_on_error => {
                    warn!(
                        conversation = %conversation.display_name,
                        id = %conversation.id,
                        error = %e,
                        "export failed, continuing"
                    );
                    summary.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    if summary.failed > 0 {
        return Err(AppError::ExportIncomplete {
            failed: summary.failed,
        });
    }
    Ok(summary)
}

fn authenticate(api: &impl SlackApi) -> Result<Identity> {
    let identity = api.verify_identity()?;
    println!(
        "Successfully authenticated for team {} and user {}",
        identity.team, identity.user
    );
    Ok(identity)
}

/// Fetches and writes one conversation; `None` means it was already exported and skipped.
fn export_conversation(
    api: &impl SlackApi,
    identity: &Identity,
    conversation: &ConversationRef,
    options: &ExportOptions,
) -> Result<Option<usize>> {
    let path = conversation_path(&options.export.output_dir, conversation);

    if options.export.skip_existing && path.exists() {
        info!(path = %path.display(), "already exported, skipping");
        return Ok(None);
    }

    println!("{}", progress_line(conversation));

    let messages = fetch_conversation(
        api,
        &conversation.id,
        PageOptions::from(&options.export),
        !options.skip_threads,
    )?;
    let info = channel_info(api, conversation, &identity.user_id)?;

    println!("writing {} records to {}", messages.len(), path.display());
    write_conversation(&path, &info, &messages)?;

    Ok(Some(messages.len()))
}

fn progress_line(conversation: &ConversationRef) -> String {
    match conversation.kind {
        ConversationKind::PublicChannel => {
            format!("getting history for channel {}", conversation.display_name)
        }
        ConversationKind::PrivateChannel => format!(
            "getting history for private channel {} with id {}",
            conversation.display_name, conversation.id
        ),
        ConversationKind::DirectMessage => format!(
            "getting history for direct messages with {}",
            conversation.display_name
        ),
    }
}
