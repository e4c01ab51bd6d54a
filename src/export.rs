//! Writing export and metadata files.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;

use crate::conversations::ConversationRef;
use crate::slack::Message;
use crate::users::UserDirectory;
use crate::{AppError, Result};

pub const METADATA_FILE: &str = "metadata.json";

/// One conversation's export file.
#[derive(Debug, Serialize)]
pub struct ExportRecord<'a> {
    pub channel_info: &'a Value,
    pub messages: &'a [Message],
}

/// The run-level `metadata.json`.
#[derive(Debug, Serialize)]
pub struct MetadataRecord<'a> {
    pub auth_info: &'a Value,
    pub users: &'a UserDirectory,
}

pub fn write_metadata(output_dir: &Path, auth_info: &Value, users: &UserDirectory) -> Result<PathBuf> {
    let path = output_dir.join(METADATA_FILE);
    write_json(&path, &MetadataRecord { auth_info, users })?;
    Ok(path)
}

pub fn conversation_path(output_dir: &Path, conversation: &ConversationRef) -> PathBuf {
    output_dir
        .join(conversation.kind.dir_name())
        .join(format!("{}.json", sanitize_file_name(&conversation.display_name)))
}

pub fn write_conversation(path: &Path, channel_info: &Value, messages: &[Message]) -> Result<()> {
    write_json(
        path,
        &ExportRecord {
            channel_info,
            messages,
        },
    )
}

/// Replaces characters that are unsafe in file names on common filesystems.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match sanitized.as_str() {
        "" | "." | ".." => "_".repeat(sanitized.len().max(1)),
        _ => sanitized,
    }
}

/// Pretty-prints `data` with a 4-space indent into a temporary file next to
/// `path`, then renames it into place so readers never see a partial file.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let write_err = |source| AppError::WriteFile {
        path: path.display().to_string(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_err)?;

    let temp_file = NamedTempFile::new_in(parent).map_err(write_err)?;
    let mut writer = BufWriter::new(temp_file);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    data.serialize(&mut serializer)
        .map_err(|e| AppError::JsonSerialize(e.to_string()))?;
    writer.write_all(b"\n").map_err(write_err)?;

    let temp_file = writer.into_inner().map_err(|e| write_err(e.into_error()))?;
    temp_file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
