//! Banking assistant chat widget
//!
//! Console host for the widget: boots it on an in-memory page, forwards
//! typed lines as input events and prints every rendered message.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use anyhow::Context;
use bank_chat_widget::api::HttpChatClient;
use bank_chat_widget::config::{Cli, Command, WidgetConfig};
use bank_chat_widget::page::markup::page_shell;
use bank_chat_widget::page::{Page, PageEvent};
use bank_chat_widget::widget::{ChatWidget, EventOutcome, boot};
use clap::Parser;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Suggestion buttons shown next to the chat.
const SUGGESTIONS: &[&str] = &[
    "Quel est le solde de mon compte ?",
    "J'ai perdu ma carte bancaire",
    "Comment faire un virement ?",
    "Quels sont vos horaires d'ouverture ?",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before clap reads env-backed flags
    let _ = dotenv();

    let cli = Cli::parse();

    // Initialize tracing (M-LOG-STRUCTURED); stdout is reserved for the transcript
    tracing_subscriber::registry()
        .with(
            cli.log_json
                .then(|| fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.log_json).then(|| fmt::layer().with_target(true).with_writer(std::io::stderr)),
        )
        .with(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();
    let config = WidgetConfig::from_cli(&cli).context("loading widget configuration")?;

    match cli.command.unwrap_or(Command::Chat) {
        Command::Page => {
            print!("{}", page_shell(&config, SUGGESTIONS));
            Ok(())
        }
        Command::Chat => run_console(config).await,
    }
}

async fn run_console(config: WidgetConfig) -> anyhow::Result<()> {
    let transport =
        Arc::new(HttpChatClient::from_config(&config.endpoint).context("invalid chat endpoint")?);

    info!(
        name: "console.started",
        endpoint = %transport.endpoint(),
        "Console session started"
    );

    let ids = config.elements.clone();
    let page = Page::standard(&ids).with_suggestions(&ids, SUGGESTIONS.iter().copied());
    let widget =
        boot(page.clone(), transport, config).context("page is missing the message list")?;

    widget.wait_for_welcome().await;
    let mut printed = print_new(&widget, 0);

    println!("Suggestions (:suggest <n>, then an empty line to send):");
    for (n, label) in SUGGESTIONS.iter().enumerate() {
        println!("  {n}. {label}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();

        if line == ":quit" {
            break;
        }

        if let Some(n) = line.strip_prefix(":suggest") {
            let target = format!("suggestion-{}", n.trim());
            match widget.handle_event(&PageEvent::click(target)).await {
                EventOutcome::SuggestionApplied => {
                    println!("> {}", page.value(&ids.input).unwrap_or_default());
                }
                _ => println!("no such suggestion: {}", n.trim()),
            }
            continue;
        }

        // An empty line sends whatever the input already holds
        if !line.is_empty() {
            page.set_value(&ids.input, line);
        }
        widget
            .handle_event(&PageEvent::key_press(&ids.input, "Enter"))
            .await;
        printed = print_new(&widget, printed);
    }

    info!(
        name: "console.finished",
        messages = widget.message_count(),
        "Console session finished"
    );
    Ok(())
}

/// Print messages rendered since `already`; returns the new count.
fn print_new(widget: &ChatWidget, already: usize) -> usize {
    let messages = widget.messages();
    for message in messages.iter().skip(already) {
        println!("{message}");
    }
    messages.len()
}
