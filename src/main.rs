//! TabMate - Entry Point
//!
//! Loads configuration, optionally starts an in-memory browser behind the
//! bridge, and runs a line-oriented command loop against one session.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use tabmate::bridge::{BridgeClient, BridgeService, BrowserTab, MemoryBrowser, TabControl};
use tabmate::core::config::{config, set_config, TabmateConfig};
use tabmate::core::error::Result;
use tabmate::core::types::TabId;
use tabmate::history::{complete, CommandOutcome};
use tabmate::interpreter::HttpInterpreter;
use tabmate::session::{Controller, SubmitOutcome};

/// Organize browser tabs with typed commands
#[derive(Parser, Debug)]
#[command(name = "tabmate")]
#[command(about = "Organize browser tabs with typed commands")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interpreter base URL, overrides config and environment
    #[arg(long)]
    interpreter_url: Option<String>,

    /// Seed an in-memory browser with sample tabs
    #[arg(long)]
    demo: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tabmate=info")),
        )
        .init();

    let args = Args::parse();

    let mut loaded = match &args.config {
        Some(path) => TabmateConfig::load(path)?,
        None => TabmateConfig::new(),
    }
    .with_env()?;
    if let Some(url) = args.interpreter_url {
        loaded.interpreter_url = url;
        loaded.validate()?;
    }
    if set_config(loaded).is_err() {
        tracing::warn!("Global config was already set");
    }
    let config = config();

    tracing::info!(interpreter = %config.interpreter_url, "TabMate starting...");

    let rt = Runtime::new()?;

    let bridge: Option<Arc<dyn TabControl>> = if args.demo {
        let _guard = rt.enter();
        let service = BridgeService::new(
            MemoryBrowser::new(demo_tabs()),
            config.allowed_origin_hosts.clone(),
        );
        let client: Arc<dyn TabControl> =
            Arc::new(BridgeClient::new(service.spawn(), config.bridge_origin.clone()));
        Some(client)
    } else {
        None
    };

    let interpreter = Arc::new(HttpInterpreter::from_config(config));
    let controller = Controller::from_config(config, interpreter, bridge);

    match rt.block_on(controller.refresh()) {
        Ok(count) => println!("Loaded {} tabs.", count),
        Err(e) => {
            tracing::warn!(error = %e, "Initial refresh failed");
            println!("Could not load tabs: {}", e);
        }
    }

    print_help();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        match input {
            "quit" | "q" => break,
            "help" | "?" => print_help(),
            "tabs" => display_tabs(&controller),
            "groups" => display_groups(&controller),
            "history" => display_history(&controller),
            "suggest" => display_suggestions(&controller),
            "voice" => {
                let on = controller.lock().toggle_voice();
                println!("Voice input {}", if on { "on" } else { "off" });
            }
            "refresh" => match rt.block_on(controller.refresh()) {
                Ok(count) => println!("Loaded {} tabs.", count),
                Err(e) => println!("Refresh failed: {}", e),
            },
            "close-selected" => report(rt.block_on(controller.close_selected())),
            _ => {
                if let Some(id) = input.strip_prefix("select ") {
                    match controller.lock().toggle_selection(&TabId::from(id.trim())) {
                        Ok(true) => println!("Selected {}", id.trim()),
                        Ok(false) => println!("Deselected {}", id.trim()),
                        Err(e) => println!("{}", e),
                    }
                } else if let Some(prefix) = input.strip_prefix("complete ") {
                    for example in complete(prefix) {
                        println!("  {}", example);
                    }
                } else {
                    report(rt.block_on(controller.submit(input)));
                }
            }
        }
    }

    println!("\nGoodbye!");
    Ok(())
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  tabs              - List open tabs");
    println!("  groups            - Show tabs by category");
    println!("  history           - Show recent commands");
    println!("  suggest           - Show smart suggestions");
    println!("  select <id>       - Toggle selection of a tab");
    println!("  close-selected    - Close all selected tabs");
    println!("  complete <text>   - Show matching example commands");
    println!("  refresh           - Reload and categorize tabs");
    println!("  voice             - Toggle voice input");
    println!("  quit / q          - Exit");
    println!("  <any text>        - Tab command, e.g. \"close all shopping tabs\"");
    println!();
}

fn report(result: Result<SubmitOutcome>) {
    match result {
        Ok(SubmitOutcome::Ignored) => {}
        Ok(SubmitOutcome::Applied(report)) => println!("Done: {}", report.summary()),
        Ok(SubmitOutcome::Replaced(count)) => println!("Done: {} tabs after update", count),
        Err(e) => println!("Command failed: {}", e),
    }
}

fn display_tabs(controller: &Controller) {
    let session = controller.lock();
    let selected = session.selection();
    for tab in session.tabs() {
        let mut marks = String::new();
        if selected.contains(&tab.id) {
            marks.push('*');
        }
        if tab.flags.duplicate {
            marks.push_str(" [dup]");
        }
        if tab.flags.distraction {
            marks.push_str(" [distraction]");
        }
        println!("  {:>4} {:<14} {}{}", tab.id.as_str(), tab.category, tab.title, marks);
    }
    println!("{} tabs", session.tabs().len());
}

fn display_groups(controller: &Controller) {
    let session = controller.lock();
    for group in session.groups() {
        println!("[{}] {} ({})", group.icon, group.category, group.tabs.len());
        for tab in group.tabs {
            println!("    {} {}", tab.id, tab.title);
        }
    }
}

fn display_history(controller: &Controller) {
    let session = controller.lock();
    for record in session.history().recent(5) {
        let outcome = match &record.outcome {
            CommandOutcome::Success(summary) => summary.clone(),
            CommandOutcome::Failure { kind, message } => format!("{}: {}", kind, message),
        };
        println!(
            "  {} {:<32} {}",
            record.timestamp.format("%H:%M:%S"),
            record.text,
            outcome
        );
    }
}

fn display_suggestions(controller: &Controller) {
    let session = controller.lock();
    let suggestions = session.suggestions();
    if suggestions.is_empty() {
        println!("Nothing to suggest.");
    }
    for suggestion in suggestions {
        println!("  {}  (\"{}\")", suggestion.message, suggestion.command);
    }
}

/// Sample tabs for the in-memory browser
fn demo_tabs() -> Vec<BrowserTab> {
    let sample = [
        ("GitHub - tabmate", "https://github.com/tabmate/tabmate"),
        ("std - Rust", "https://doc.rust-lang.org/std/"),
        ("Lo-fi beats", "https://www.youtube.com/watch?v=jfKfPfyJRdk"),
        ("Lo-fi beats", "https://www.youtube.com/watch?v=jfKfPfyJRdk"),
        ("Amazon.com: Keyboards", "https://www.amazon.com/s?k=keyboard"),
        ("Home / X", "https://x.com/home"),
        ("Attention Is All You Need", "https://arxiv.org/abs/1706.03762"),
        ("Hacker News", "https://news.ycombinator.com/"),
    ];
    sample
        .into_iter()
        .enumerate()
        .map(|(i, (title, url))| BrowserTab {
            id: TabId::from(i as u64 + 1),
            title: title.to_string(),
            url: url.to_string(),
            fav_icon_url: None,
        })
        .collect()
}
