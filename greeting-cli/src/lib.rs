//! # Christmas Greeting CLI
//!
//! Command-line front-end for the greeting generator.
//!
//! ## Usage
//!
//! ```bash
//! christmas-greeting generate Juan --relation Parents
//! christmas-greeting generate Deonna --share
//! christmas-greeting classify Deonna
//! christmas-greeting status
//! ```
//!
//! Credentials come from flags or the environment (`GEMINI_API_KEY`,
//! `SUPABASE_URL`, `SUPABASE_ANON_KEY`, each also read with a `VITE_`
//! prefix). Without a Gemini key the offline templates are used.
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Service configuration, card style and output settings
//! - `main` builds the services once and drives `GreetingFlow`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use greeting_card::CardStyle;
use greeting_core::prompt::Tone;
use greeting_core::{classify, suggested_relation, GreetingConfig, Pacing, Relation};

/// Command-line arguments for christmas-greeting.
#[derive(Debug, Clone, Parser)]
#[command(name = "christmas-greeting")]
#[command(about = "Personalized Christmas greetings rendered into shareable story cards")]
#[command(version)]
pub struct CliArgs {
    /// Gemini API key. Offline templates are used when absent.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini base URL
    #[arg(long, env = "GEMINI_BASE_URL", global = true)]
    pub gemini_base_url: Option<String>,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL", global = true)]
    pub supabase_url: Option<String>,

    /// Supabase anonymous key
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true, global = true)]
    pub supabase_anon_key: Option<String>,

    /// Record greetings to a local JSONL file in this directory
    #[arg(long, env = "GREETING_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Author named in the prompt
    #[arg(long, env = "GREETING_AUTHOR", global = true)]
    pub author: Option<String>,

    /// Name signed under the greeting
    #[arg(long, env = "GREETING_SIGNATURE", global = true)]
    pub signature: Option<String>,

    /// Nickname in the story footer
    #[arg(long, env = "GREETING_NICKNAME", global = true)]
    pub nickname: Option<String>,

    /// Avatar image for the card
    #[arg(long, env = "GREETING_AVATAR", global = true)]
    pub avatar: Option<PathBuf>,

    /// Directory the card is saved to
    #[arg(long, env = "GREETING_OUT_DIR", default_value = ".", global = true)]
    pub out_dir: PathBuf,

    /// Program used to share the card, e.g. `xdg-open`
    #[arg(long, env = "GREETING_SHARE_COMMAND", global = true)]
    pub share_command: Option<String>,

    /// Skip the minimum loading delays
    #[arg(long, global = true)]
    pub no_pacing: bool,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate a greeting and save it as a story card
    Generate {
        /// Recipient name
        name: String,

        /// Relationship to the recipient, e.g. "Best Friend"
        #[arg(long, short)]
        relation: Option<Relation>,

        /// Hand the card to the share command after saving it
        #[arg(long)]
        share: bool,
    },
    /// Show how a name and relation will be treated
    Classify {
        /// Recipient name
        name: String,

        /// Declared relationship
        #[arg(long, short)]
        relation: Option<Relation>,
    },
    /// Show the season and configured services
    Status,
}

/// Everything `main` needs to build the services.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Generation and persistence configuration.
    pub greeting: GreetingConfig,
    /// Card personalization. The avatar is loaded separately.
    pub style: CardStyle,
    /// Avatar image path.
    pub avatar: Option<PathBuf>,
    /// Download directory.
    pub out_dir: PathBuf,
    /// Share command line.
    pub share_command: Option<String>,
}

impl CliConfig {
    /// Sender named in the share title: the signature's first name.
    #[must_use]
    pub fn sender(&self) -> &str {
        self.style
            .signature
            .split_whitespace()
            .next()
            .unwrap_or(greeting_card::distribute::DEFAULT_SENDER)
    }
}

/// Legacy `VITE_`-prefixed variable, read when the primary one is unset.
fn vite_alias(value: Option<&String>, primary: &str) -> Option<String> {
    value
        .cloned()
        .or_else(|| std::env::var(format!("VITE_{primary}")).ok())
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        let mut greeting = GreetingConfig::new();
        greeting.gemini_api_key = vite_alias(args.gemini_api_key.as_ref(), "GEMINI_API_KEY");
        if let Some(url) = args.gemini_base_url.as_ref() {
            greeting.gemini_base_url.clone_from(url);
        }
        greeting.supabase_url = vite_alias(args.supabase_url.as_ref(), "SUPABASE_URL");
        greeting.supabase_anon_key =
            vite_alias(args.supabase_anon_key.as_ref(), "SUPABASE_ANON_KEY");
        greeting.data_dir.clone_from(&args.data_dir);
        if let Some(author) = args.author.as_ref() {
            greeting.author.clone_from(author);
        }
        if args.no_pacing {
            greeting.pacing = Pacing::immediate();
        }

        let mut style = CardStyle::default();
        if let Some(signature) = args.signature.as_ref() {
            style.signature.clone_from(signature);
        }
        if let Some(nickname) = args.nickname.as_ref() {
            style.nickname.clone_from(nickname);
        }

        Self {
            greeting,
            style,
            avatar: args.avatar.clone(),
            out_dir: args.out_dir.clone(),
            share_command: args.share_command.clone(),
        }
    }
}

/// Shown instead of the form once the season is over.
pub const SEASON_OVER_NOTICE: &str = "👋🎄 See you next Christmas!\n\
The holiday season has officially ended. I hope you had a wonderful Christmas and New Year!\n\
Missed your greeting? Message Francis directly! 📨";

/// Lines printed by the `classify` subcommand.
#[must_use]
pub fn classification_report(name: &str, relation: Relation) -> Vec<String> {
    let classification = classify(name, relation);
    let effective = classification.effective.label();
    let mut lines = vec![
        format!(
            "Effective relation: {}",
            if effective.is_empty() { "(none)" } else { effective }
        ),
        format!("Tone: {}", Tone::for_relation(classification.effective)),
    ];
    if let Some(suggested) = suggested_relation(name) {
        if suggested != relation {
            lines.push(format!("Suggested relation: {suggested}"));
        }
    }
    lines
}

/// Loading display line for a label.
#[must_use]
pub fn loading_line(index: usize, total: usize, label: &str) -> String {
    format!("[{}/{total}] {label}", index + 1)
}
