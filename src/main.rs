use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use chat_widget::chat;
use chat_widget::web_server::{self, ServerOptions};
use chat_widget::{ChatEndpointClient, ChatWidget, WidgetConfig};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    widget: WidgetConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the chat widget page on localhost.
    Serve {
        #[command(flatten)]
        server: ServerOptions,
    },
    /// Chat with the endpoint from the terminal.
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (CHAT_ENDPOINT_URL and friends)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g. RUST_LOG=info,chat_widget=debug).
    // Logs go to stderr so the terminal chat owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("chat-widget starting with command: {:?}", cli.command);

    match cli.command {
        Commands::Serve { server } => {
            let mut web_server_handle = tokio::spawn(web_server::start_web_server(cli.widget, server));

            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Ctrl-C received, shutting down...");
                    web_server_handle.abort();
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(Ok(())) => info!("Web server task completed unexpectedly."),
                        Ok(Err(e)) => {
                            error!("Web server failed: {:?}", e);
                            return Err(e);
                        }
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }
            info!("Shutdown complete.");
        }
        Commands::Chat => {
            let client = ChatEndpointClient::from_config(&cli.widget)
                .context("Failed to build chat endpoint client")?;
            let mut widget = ChatWidget::new(&cli.widget, client);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = tokio::io::stdout();
            chat::run_chat(&mut widget, stdin, &mut stdout)
                .await
                .context("Chat session failed")?;
        }
    }

    Ok(())
}
