//! gptplugin - let an LLM pick a plugin for your goal
//!
//! This is the main entry point for the gptplugin binary.

use anyhow::{Context, Result};
use clap::Parser;
use gptplugin::config::Config;
use gptplugin::logging::AuditLogger;
use gptplugin::{plugins, selection, DispatchError, Dispatcher, OpenAiClient, PluginRegistry};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

mod cli;

use cli::Args;

/// Exit code when the model found no suitable plugin
const EXIT_NO_PLUGIN: i32 = 2;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.debug);

    info!("Starting gptplugin v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        if let Some(dispatch) = e.downcast_ref::<DispatchError>() {
            if dispatch.is_no_valid_plugin() {
                eprintln!("no suitable plugin: {}", dispatch);
                std::process::exit(EXIT_NO_PLUGIN);
            }
        }

        error!("gptplugin failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = args.audit_log {
        config.logging.audit_log = Some(path);
    }
    config.validate().context("Invalid configuration")?;

    let mut registry = if config.plugins.case_insensitive_lookup {
        PluginRegistry::with_policy(gptplugin::MatchPolicy::CaseInsensitive)
    } else {
        PluginRegistry::new()
    };
    registry.register_many(plugins::builtin(&config.plugins)?);

    if args.list_plugins {
        for plugin in registry.enumerate() {
            println!("{}: {}", plugin.name(), plugin.description());
        }
        return Ok(());
    }

    let goal = args.goal.context("No goal given")?;

    if args.show_prompt {
        print!("{}", selection::compile(&goal, registry.enumerate()));
        return Ok(());
    }

    let llm = OpenAiClient::new(config.llm.clone())?;
    info!("Using model {}", llm.model());
    let dispatcher = Dispatcher::new(Arc::new(llm), registry);
    let mut audit = AuditLogger::new(config.logging.clone());

    let started = Instant::now();
    let mut selected = None;
    let outcome = dispatcher
        .handle_with(&goal, |context| {
            audit.log_selection(&goal, context.name(), &context.request);
            selected = Some(context.name().to_string());
        })
        .await;

    let answer = match (outcome, selected) {
        (Ok(answer), Some(plugin)) => {
            audit.log_result(&goal, &plugin, &answer, elapsed_ms(started));
            answer
        }
        (Ok(answer), None) => answer,
        (Err(e), _) => {
            audit.log_error(&goal, &e, elapsed_ms(started));
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&answer)?);
    Ok(())
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Initialize the logging/tracing subsystem
fn init_logging(debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
