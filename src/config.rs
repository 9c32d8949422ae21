//! Layered widget configuration.
//!
//! Priority, lowest first: built-in defaults, YAML file, `CHATW_` environment
//! variables, CLI flags (and the env vars clap maps onto them).

use std::time::Duration;

use clap::{Parser, Subcommand};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_CHAT_PATH: &str = "/api/chat";
pub const DEFAULT_WELCOME_DELAY_MS: u64 = 1000;

pub const DEFAULT_WELCOME: &str = "Bonjour ! Je suis votre assistant bancaire. Posez-moi vos questions sur vos comptes, cartes, transactions, etc.";
pub const DEFAULT_APOLOGY: &str = "Désolé, une erreur s'est produite. Veuillez réessayer.";
pub const DEFAULT_NOT_UNDERSTOOD: &str =
    "Je n'ai pas compris votre question, pouvez-vous reformuler ?";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE", global = true)]
    pub config: Option<String>,

    /// Base URL of the chat backend
    #[arg(long, env = "CHAT_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Delay before the greeting is shown, in milliseconds
    #[arg(long, global = true)]
    pub welcome_delay_ms: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Interactive console session against the chat backend (default)
    Chat,
    /// Print the HTML page shell carrying the widget's element ids
    Page,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub endpoint: EndpointConfig,
    pub elements: ElementIds,
    pub labels: Labels,
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    pub chat_path: String,
}

/// Element ids (and the suggestion class) the widget binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementIds {
    pub message_list: String,
    pub input: String,
    pub send_button: String,
    pub typing_indicator: String,
    pub suggestion_class: String,
}

/// Fixed user-facing strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    pub welcome: String,
    pub apology: String,
    pub not_understood: String,
    pub category: String,
    pub confidence: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    pub welcome_delay_ms: u64,
}

impl TimingConfig {
    #[must_use]
    pub fn welcome_delay(&self) -> Duration {
        Duration::from_millis(self.welcome_delay_ms)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
        }
    }
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            message_list: "chatMessages".to_string(),
            input: "userInput".to_string(),
            send_button: "sendButton".to_string(),
            typing_indicator: "typingIndicator".to_string(),
            suggestion_class: "suggestion-btn".to_string(),
        }
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            welcome: DEFAULT_WELCOME.to_string(),
            apology: DEFAULT_APOLOGY.to_string(),
            not_understood: DEFAULT_NOT_UNDERSTOOD.to_string(),
            category: "Catégorie".to_string(),
            confidence: "Niveau de confiance".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            welcome_delay_ms: DEFAULT_WELCOME_DELAY_MS,
        }
    }
}

impl WidgetConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("endpoint.base_url", defaults.endpoint.base_url)?
            .set_default("endpoint.chat_path", defaults.endpoint.chat_path)?
            .set_default("elements.message_list", defaults.elements.message_list)?
            .set_default("elements.input", defaults.elements.input)?
            .set_default("elements.send_button", defaults.elements.send_button)?
            .set_default(
                "elements.typing_indicator",
                defaults.elements.typing_indicator,
            )?
            .set_default(
                "elements.suggestion_class",
                defaults.elements.suggestion_class,
            )?
            .set_default("labels.welcome", defaults.labels.welcome)?
            .set_default("labels.apology", defaults.labels.apology)?
            .set_default("labels.not_understood", defaults.labels.not_understood)?
            .set_default("labels.category", defaults.labels.category)?
            .set_default("labels.confidence", defaults.labels.confidence)?
            .set_default("timing.welcome_delay_ms", defaults.timing.welcome_delay_ms)?;

        // 2. File: explicit path, else ./widget.{yaml,toml,json} when present
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("widget").required(false)),
        };

        // 3. Environment, e.g. CHATW_ENDPOINT__BASE_URL=http://bank.local
        builder = builder.add_source(
            Environment::with_prefix("CHATW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags
        if let Some(base_url) = &cli.base_url {
            builder = builder.set_override("endpoint.base_url", base_url.as_str())?;
        }
        if let Some(delay) = cli.welcome_delay_ms {
            builder = builder.set_override("timing.welcome_delay_ms", delay)?;
        }

        builder.build()?.try_deserialize()
    }
}
