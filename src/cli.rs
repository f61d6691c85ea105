use chat_push_relay::config::{AppConfig, ChatProviderConfig, PLACEHOLDER_API_SECRET};
use chat_push_relay::error::ConfigError;
use chat_push_relay::push::{RetryPolicy, load_vapid_config};
use chat_push_relay::types::push::{DEFAULT_ICON, NotificationAppearance};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_VAPID_SUBJECT: &str = "mailto:admin@example.com";

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve { addr: SocketAddr, config: AppConfig },
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::Init(args)) = cli.command {
        let code = run_init(args);
        return RunOutcome::Exit(code);
    }

    init_tracing(cli.log_format);
    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            return RunOutcome::Exit(2);
        }
    };

    RunOutcome::Serve {
        addr: cli.bind,
        config,
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "chat-push-relay",
    version,
    about = "Relays chat messages to browsers as Web Push notifications"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "CHAT_PUSH_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
    #[arg(long, env = "CHAT_PUSH_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "CHAT_PUSH_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "CHAT_PUSH_VAPID_SUBJECT", default_value = DEFAULT_VAPID_SUBJECT)]
    vapid_subject: String,
    #[arg(long, env = "CHAT_PUSH_API_SECRET", default_value = PLACEHOLDER_API_SECRET)]
    api_secret: String,
    #[arg(long, env = "CHAT_PUSH_VERIFY_WEBHOOK")]
    verify_webhook: bool,
    #[arg(
        long,
        env = "CHAT_PUSH_MAX_ATTEMPTS",
        default_value_t = 3,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_attempts: u32,
    #[arg(long, env = "CHAT_PUSH_INITIAL_BACKOFF_MS", default_value_t = 250)]
    initial_backoff_ms: u64,
    #[arg(long, env = "CHAT_PUSH_MAX_BACKOFF_MS", default_value_t = 2000)]
    max_backoff_ms: u64,
    #[arg(
        long,
        env = "CHAT_PUSH_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    push_timeout_ms: u64,
    #[arg(long, env = "CHAT_PUSH_NOTIFICATION_ICON", default_value = DEFAULT_ICON)]
    notification_icon: String,
    #[arg(long, env = "CHAT_PUSH_NOTIFICATION_BADGE")]
    notification_badge: Option<String>,
    #[arg(long, env = "CHAT_PUSH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).init(),
    }
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match chat_push_relay::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => (DEFAULT_VAPID_SUBJECT.to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("CHAT_PUSH_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("CHAT_PUSH_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("CHAT_PUSH_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace CHAT_PUSH_VAPID_SUBJECT with a contact URI you control.");
    }
    0
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    let vapid = load_vapid_config(
        cli.vapid_private_key.as_deref(),
        cli.vapid_public_key.as_deref(),
        &cli.vapid_subject,
    )?;

    let chat = ChatProviderConfig {
        api_secret: cli.api_secret.trim().to_string(),
        verify_signatures: cli.verify_webhook,
    };
    if chat.uses_placeholder_secret() {
        if chat.verify_signatures {
            return Err(ConfigError::PlaceholderApiSecret);
        }
        tracing::warn!("chat provider secret is a placeholder; set CHAT_PUSH_API_SECRET");
    }

    let retry = RetryPolicy {
        max_attempts: cli.max_attempts,
        initial_backoff: Duration::from_millis(cli.initial_backoff_ms),
        max_backoff: Duration::from_millis(cli.max_backoff_ms.max(cli.initial_backoff_ms)),
        attempt_timeout: Duration::from_millis(cli.push_timeout_ms),
    };

    let badge = cli
        .notification_badge
        .clone()
        .unwrap_or_else(|| cli.notification_icon.clone());
    let appearance = NotificationAppearance {
        icon: cli.notification_icon.clone(),
        badge,
    };

    Ok(AppConfig {
        vapid,
        chat,
        retry,
        appearance,
    })
}
