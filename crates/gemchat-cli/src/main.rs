//! `gemchat`: a terminal chat shell with OTP sign-in and simulated replies.

mod app;
mod command;
mod helper;
mod logging;
mod render;

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use gemchat_application::{
    AuthService, ChatEvent, ChatService, CountryCatalog, LocalOtpService, ReplySimulator,
    lock_store, share,
};
use gemchat_core::state::StateRepository;
use gemchat_core::store::ChatStore;
use gemchat_infrastructure::{
    ConfigService, FileKeyValueStore, GemchatPaths, InMemoryStateRepository, JsonStateRepository,
    RestCountriesProvider,
};

use crate::app::{App, Flow};
use crate::command::Command;
use crate::helper::CliHelper;
use crate::render::Theme;

#[derive(Parser)]
#[command(name = "gemchat")]
#[command(about = "Chat shell with OTP sign-in and a simulated assistant", long_about = None)]
struct Cli {
    /// Directory holding config.toml and logs
    #[arg(long)]
    config_dir: Option<PathBuf>,
    /// Directory holding the persisted chat state
    #[arg(long)]
    state_dir: Option<PathBuf>,
    /// Keep state in memory only
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ===== Configuration =====
    let mut paths = GemchatPaths::resolve(cli.config_dir, cli.state_dir.clone())?;
    let config = ConfigService::new(paths.config_file()).get_config();
    if cli.state_dir.is_none() {
        if let Some(dir) = config.storage.state_dir.clone() {
            paths = paths.with_state_dir(dir);
        }
    }
    let _log_guard = logging::init(&paths.logs_dir(), &config.logging.level)?;
    info!(
        config_dir = %paths.config_dir().display(),
        state_dir = %paths.state_dir().display(),
        ephemeral = cli.ephemeral,
        "Starting gemchat"
    );

    // ===== Backend Initialization =====
    let repository: Arc<dyn StateRepository> = if cli.ephemeral {
        Arc::new(InMemoryStateRepository::new())
    } else {
        Arc::new(JsonStateRepository::new(
            FileKeyValueStore::new(paths.state_dir()),
            config.storage.key.clone(),
        ))
    };
    let store = share(ChatStore::load(repository));
    let chat = ChatService::new(store.clone(), ReplySimulator::new(config.reply.clone()));
    let otp_ttl = Duration::from_secs(config.otp.ttl_secs);
    let auth = AuthService::new(Arc::new(LocalOtpService::new(otp_ttl)), store.clone());

    // Fallback list until the remote one arrives.
    let countries = Arc::new(RwLock::new(CountryCatalog::fallback()));
    match RestCountriesProvider::new(&config.countries) {
        Ok(provider) => {
            let countries = Arc::clone(&countries);
            tokio::spawn(async move {
                let catalog = CountryCatalog::load(&provider).await;
                *countries.write().unwrap_or_else(PoisonError::into_inner) = catalog;
            });
        }
        Err(e) => warn!(error = %e, "Country provider unavailable"),
    }

    // Print assistant replies as they land.
    let mut events = chat.subscribe();
    let printer_store = store.clone();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ChatEvent::ReplyArrived { chat_id, message }) => {
                    let (theme, is_open) = {
                        let store = lock_store(&printer_store);
                        (
                            Theme::new(store.is_dark()),
                            store.selected_chat_id() == Some(chat_id.as_str()),
                        )
                    };
                    if is_open {
                        println!("\n{}", render::message_line(&message, theme));
                    } else {
                        println!("\n{}", theme.muted("New reply in another chatroom."));
                    }
                }
                Ok(ChatEvent::ReplyDiscarded { .. }) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Reply printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut app = App::new(chat, auth, countries, otp_ttl);

    // ===== REPL Setup =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== gemchat ===".bright_magenta().bold());
    if lock_store(&store).is_logged_in() {
        println!("{}", "Welcome back. Type /help for commands, 'quit' to exit.".bright_black());
    } else {
        println!(
            "{}",
            "Sign in with /login [dial] <phone>. Type /help for commands.".bright_black()
        );
    }
    println!();

    // ===== Main REPL Loop =====
    loop {
        match rl.readline(&app.prompt()) {
            Ok(line) => {
                let command = match Command::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{}", e.to_string().red());
                        continue;
                    }
                };
                let _ = rl.add_history_entry(line.trim());

                match app.execute(command) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(e) => println!("{}", e.to_string().red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}", format!("Input error: {:?}", e).red());
                break;
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    info!("gemchat stopped");
    Ok(())
}
