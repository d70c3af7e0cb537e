//! # Christmas Greeting
//!
//! Generates a personalized greeting and saves it as a story card.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use greeting_card::{
    ArtifactDistributor, Avatar, CommandShare, FlowError, GreetingFlow, ImageCapturer,
    SvgRasterizer,
};
use greeting_cli::{
    classification_report, loading_line, CliArgs, CliConfig, Command, SEASON_OVER_NOTICE,
};
use greeting_core::loading::DEFAULT_LABELS;
use greeting_core::{
    CutoffPolicy, Relation, Session, SessionError, SessionState, SystemClock,
    TextGenerator as _, GEMINI_MODEL,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,greeting_core=debug,greeting_card=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output. Logs go to stderr.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,greeting_core=debug,greeting_card=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = CliConfig::from(&args);

    match args.command {
        Command::Generate {
            name,
            relation,
            share,
        } => generate(&config, &name, relation.unwrap_or(Relation::Unspecified), share).await,
        Command::Classify { name, relation } => {
            print_classification(&name, relation.unwrap_or(Relation::Unspecified));
            Ok(())
        }
        Command::Status => status(&config),
    }
}

fn build_flow(config: &CliConfig) -> anyhow::Result<GreetingFlow> {
    let mut style = config.style.clone();
    if let Some(path) = config.avatar.as_ref() {
        match Avatar::from_path(path) {
            Ok(avatar) => style.avatar = Some(avatar),
            Err(e) => tracing::warn!("Ignoring avatar, drawing initials instead: {e}"),
        }
    }

    let orchestrator = config
        .greeting
        .orchestrator()
        .context("Failed to configure greeting services")?;

    let capturer = ImageCapturer::new(
        Arc::new(SvgRasterizer::new()),
        config.greeting.pacing.capture_settle,
    );

    let mut distributor = ArtifactDistributor::new(&config.out_dir).with_sender(config.sender());
    if let Some(command) = config.share_command.as_deref().and_then(CommandShare::parse) {
        distributor = distributor.with_share(Arc::new(command));
    }

    Ok(GreetingFlow::new(
        Session::default(),
        orchestrator,
        style,
        capturer,
        distributor,
    ))
}

async fn generate(
    config: &CliConfig,
    name: &str,
    relation: Relation,
    share: bool,
) -> anyhow::Result<()> {
    let flow = build_flow(config)?;
    if flow.state() == SessionState::Expired {
        println!("{SEASON_OVER_NOTICE}");
        return Ok(());
    }

    // Loading labels go to stderr so stdout carries only the greeting.
    let mut loading = flow.subscribe_loading();
    let display = tokio::spawn(async move {
        let mut shown = None;
        while loading.changed().await.is_ok() {
            let state = loading.borrow_and_update().clone();
            if state.active && shown != Some((state.run, state.index)) {
                shown = Some((state.run, state.index));
                eprintln!(
                    "{}",
                    loading_line(state.index, DEFAULT_LABELS.len(), &state.label)
                );
            }
        }
    });
    let submitted = flow.submit(name, relation).await;
    display.abort();

    let greeting = match submitted {
        Ok(greeting) => greeting,
        Err(FlowError::Session(SessionError::Expired)) => {
            println!("{SEASON_OVER_NOTICE}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!();
    println!("Dear {},", greeting.name);
    println!();
    println!("\"{}\"", greeting.message);
    println!();
    println!("Warmly,");
    println!("{}", config.style.signature);
    println!();

    let path = flow.download().await?;
    println!("Saved {}", path.display());

    if share {
        let outcome = flow.share().await?;
        match outcome.message() {
            None => println!("Shared!"),
            Some(alert) => eprintln!("{alert}"),
        }
    }

    Ok(())
}

fn print_classification(name: &str, relation: Relation) {
    for line in classification_report(name, relation) {
        println!("{line}");
    }
}

fn status(config: &CliConfig) -> anyhow::Result<()> {
    let policy = CutoffPolicy::season();
    println!("christmas-greeting {}", greeting_core::VERSION);
    println!("Season ends: {}", policy.cutoff());
    println!(
        "Season: {}",
        if policy.is_expired(&SystemClock) {
            "over"
        } else {
            "open"
        }
    );

    let generator = config
        .greeting
        .generator()
        .context("Failed to configure the generative service")?;
    match generator {
        Some(generator) => println!("Generator: {} ({GEMINI_MODEL})", generator.name()),
        None => println!("Generator: offline templates"),
    }

    println!(
        "Records: {}",
        config.greeting.store_name().unwrap_or("not recorded")
    );
    println!("Cards saved to: {}", config.out_dir.display());
    Ok(())
}
