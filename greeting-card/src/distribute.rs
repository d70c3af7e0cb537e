//! Download and share.
//!
//! Each action consumes a freshly captured [`CardArtifact`]. Share failures
//! never propagate; they come back as a [`ShareOutcome`] carrying the alert
//! to show.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use greeting_core::metrics;

use crate::capture::CardArtifact;
use crate::error::DistributeError;

/// Alert when no share capability is available.
pub const SHARE_UNSUPPORTED_MESSAGE: &str =
    "Sharing is not supported on this device/browser. Please download the image instead!";

/// Alert when the share capability fails.
pub const SHARE_FAILED_MESSAGE: &str = "Could not share automatically. Please download the image.";

/// Sender named in the share title.
pub const DEFAULT_SENDER: &str = "Francis";

const FALLBACK_FILE_STEM: &str = "Friend";

/// Longest name stem, in bytes. Keeps the whole file name under the usual
/// 255-byte limit.
const MAX_FILE_STEM_BYTES: usize = 200;

/// `Christmas-Greeting-<name>.png`, with path-hostile characters replaced
/// and the name shortened to fit a file name.
#[must_use]
pub fn artifact_file_name(name: &str) -> String {
    format!("Christmas-Greeting-{}.png", sanitize_name(name))
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.trim_matches(|c| c == '_' || c == '.').is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        truncate_on_char_boundary(cleaned, MAX_FILE_STEM_BYTES)
    }
}

fn truncate_on_char_boundary(mut text: String, max_bytes: usize) -> String {
    if text.len() > max_bytes {
        let mut end = max_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

/// What gets handed to a share capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    /// Share sheet title.
    pub title: String,
    /// Caption.
    pub text: String,
    /// Attachment file name.
    pub file_name: String,
    /// Attachment MIME type.
    pub mime_type: String,
    /// Attachment bytes.
    pub bytes: Vec<u8>,
}

/// A native way of sharing a file.
#[async_trait]
pub trait ShareCapability: Send + Sync {
    /// Capability name, for logs.
    fn name(&self) -> &'static str;

    /// Share `payload`. One attempt.
    async fn share(&self, payload: &SharePayload) -> Result<(), DistributeError>;
}

/// Result of a share attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Handed off.
    Shared,
    /// No capability available.
    Unsupported,
    /// The capability failed.
    Failed,
}

impl ShareOutcome {
    /// Alert to show the user, if any.
    #[must_use]
    pub fn message(self) -> Option<&'static str> {
        match self {
            Self::Shared => None,
            Self::Unsupported => Some(SHARE_UNSUPPORTED_MESSAGE),
            Self::Failed => Some(SHARE_FAILED_MESSAGE),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Unsupported => "unsupported",
            Self::Failed => "failed",
        }
    }
}

/// Shares by running a program with the card's path as last argument.
///
/// The title and caption are passed in `SHARE_TITLE` and `SHARE_TEXT`.
#[derive(Debug, Clone)]
pub struct CommandShare {
    program: String,
    args: Vec<String>,
    staging_dir: PathBuf,
}

impl CommandShare {
    /// Run `program` with `args`.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            staging_dir: std::env::temp_dir().join("christmas-greeting"),
        }
    }

    /// Split a whitespace-separated command line. `None` when blank.
    #[must_use]
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(ToString::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    /// Stage attachments in `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }
}

#[async_trait]
impl ShareCapability for CommandShare {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn share(&self, payload: &SharePayload) -> Result<(), DistributeError> {
        tokio::fs::create_dir_all(&self.staging_dir).await?;
        let path = self.staging_dir.join(&payload.file_name);
        tokio::fs::write(&path, &payload.bytes).await?;

        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&path)
            .env("SHARE_TITLE", &payload.title)
            .env("SHARE_TEXT", &payload.text)
            .status()
            .await
            .map_err(|e| DistributeError::Share(format!("{}: {e}", self.program)))?;

        if status.success() {
            Ok(())
        } else {
            Err(DistributeError::Share(format!(
                "{} exited with {status}",
                self.program
            )))
        }
    }
}

/// Writes artifacts to disk and hands them to the share capability.
#[derive(Clone)]
pub struct ArtifactDistributor {
    out_dir: PathBuf,
    sender: String,
    capability: Option<Arc<dyn ShareCapability>>,
}

impl ArtifactDistributor {
    /// Distributor saving into `out_dir`, with no share capability.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            sender: DEFAULT_SENDER.to_string(),
            capability: None,
        }
    }

    /// Name the sender in the share title.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// Use `capability` for sharing.
    #[must_use]
    pub fn with_share(mut self, capability: Arc<dyn ShareCapability>) -> Self {
        self.capability = Some(capability);
        self
    }

    /// Download directory.
    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Save the artifact as `Christmas-Greeting-<name>.png`.
    ///
    /// # Errors
    ///
    /// Returns [`DistributeError::Io`] if the file cannot be written.
    #[tracing::instrument(name = "download_card", skip(self, artifact))]
    pub async fn download(
        &self,
        artifact: &CardArtifact,
        name: &str,
    ) -> Result<PathBuf, DistributeError> {
        tokio::fs::create_dir_all(&self.out_dir).await?;
        let path = self.out_dir.join(artifact_file_name(name));
        tokio::fs::write(&path, artifact.bytes()).await?;
        tracing::info!(path = %path.display(), "Card saved");
        Ok(path)
    }

    /// Payload shared for `name`.
    #[must_use]
    pub fn payload(&self, artifact: &CardArtifact, name: &str) -> SharePayload {
        SharePayload {
            title: format!("Merry Christmas from {}!", self.sender),
            text: format!("Here is a special holiday greeting for {name}! 🎄"),
            file_name: artifact_file_name(name),
            mime_type: artifact.mime_type().to_string(),
            bytes: artifact.bytes().to_vec(),
        }
    }

    /// Share the artifact. Never fails; see [`ShareOutcome::message`].
    #[tracing::instrument(name = "share_card", skip(self, artifact))]
    pub async fn share(&self, artifact: &CardArtifact, name: &str) -> ShareOutcome {
        let outcome = match self.capability.as_ref() {
            None => {
                tracing::info!("No share capability configured");
                ShareOutcome::Unsupported
            }
            Some(capability) => match capability.share(&self.payload(artifact, name)).await {
                Ok(()) => ShareOutcome::Shared,
                Err(e) => {
                    tracing::warn!(capability = capability.name(), "Share failed: {e}");
                    ShareOutcome::Failed
                }
            },
        };
        metrics::record_share(outcome.as_str());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_keeps_plain_names() {
        assert_eq!(artifact_file_name("Juan"), "Christmas-Greeting-Juan.png");
        assert_eq!(
            artifact_file_name("Mary Ann"),
            "Christmas-Greeting-Mary Ann.png"
        );
        assert_eq!(artifact_file_name("Zoë"), "Christmas-Greeting-Zoë.png");
    }

    #[test]
    fn test_file_name_strips_path_characters() {
        assert_eq!(
            artifact_file_name("../etc/passwd"),
            "Christmas-Greeting-.._etc_passwd.png"
        );
        assert_eq!(artifact_file_name("a:b*c?"), "Christmas-Greeting-a_b_c_.png");
        assert_eq!(artifact_file_name("line\nbreak"), "Christmas-Greeting-line_break.png");
    }

    #[test]
    fn test_file_name_fallback() {
        assert_eq!(artifact_file_name("//"), "Christmas-Greeting-Friend.png");
        assert_eq!(artifact_file_name("   "), "Christmas-Greeting-Friend.png");
    }

    #[test]
    fn test_file_name_caps_long_names() {
        let name = "x".repeat(250);
        let file_name = artifact_file_name(&name);
        assert_eq!(
            file_name,
            format!("Christmas-Greeting-{}.png", "x".repeat(MAX_FILE_STEM_BYTES))
        );
        assert!(file_name.len() <= 255);
    }

    #[test]
    fn test_file_name_truncates_on_char_boundary() {
        // 'ë' is two bytes, so byte 200 falls inside a character.
        let name = format!("a{}", "ë".repeat(150));
        let file_name = artifact_file_name(&name);
        let stem = file_name
            .strip_prefix("Christmas-Greeting-")
            .and_then(|f| f.strip_suffix(".png"))
            .expect("stem");
        assert_eq!(stem.len(), 199);
        assert!(stem.starts_with('a'));
        assert!(stem[1..].chars().all(|c| c == 'ë'));
    }

    #[test]
    fn test_parse_command() {
        assert!(CommandShare::parse("  ").is_none());
        let share = CommandShare::parse("xdg-open --wait").expect("command");
        assert_eq!(share.program, "xdg-open");
        assert_eq!(share.args, vec!["--wait".to_string()]);
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(ShareOutcome::Shared.message(), None);
        assert_eq!(
            ShareOutcome::Unsupported.message(),
            Some(SHARE_UNSUPPORTED_MESSAGE)
        );
        assert_eq!(ShareOutcome::Failed.message(), Some(SHARE_FAILED_MESSAGE));
    }
}
