mod cli;

use chat_push_relay::error::ServeError;

#[tokio::main]
async fn main() {
    let (addr, config) = match cli::run() {
        cli::RunOutcome::Serve { addr, config } => (addr, config),
        cli::RunOutcome::Exit(code) => std::process::exit(code),
    };

    if let Err(err) = chat_push_relay::serve(addr, config).await {
        tracing::error!(error = %err, "relay stopped");
        let code = match err {
            ServeError::Config(_) => 2,
            ServeError::Io(_) => 1,
        };
        std::process::exit(code);
    }
}
