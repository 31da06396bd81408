//! REPL state and command dispatch.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use colored::Colorize;
use tracing::debug;

use gemchat_application::{
    AuthService, ChatService, CountdownHandle, CountryCatalog, OtpCountdown, lock_store,
};
use gemchat_core::chat::NewMessage;
use gemchat_core::country::DEFAULT_DIAL_PREFIX;
use gemchat_core::error::{ChatError, Result};
use gemchat_core::otp::{OtpChallenge, OtpVerification};
use gemchat_infrastructure::image_data_uri;

use crate::command::{COMMANDS, Command};
use crate::render::{self, Theme};

/// Messages shown per `/history` page.
pub const HISTORY_PAGE_SIZE: usize = 20;

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

struct PendingLogin {
    challenge_id: String,
    dial_prefix: String,
    phone: String,
    remaining: Arc<AtomicU64>,
    countdown: CountdownHandle,
}

pub struct App {
    chat: ChatService,
    auth: AuthService,
    countries: Arc<RwLock<CountryCatalog>>,
    otp_ttl: Duration,
    pending_login: Option<PendingLogin>,
}

impl App {
    pub fn new(
        chat: ChatService,
        auth: AuthService,
        countries: Arc<RwLock<CountryCatalog>>,
        otp_ttl: Duration,
    ) -> Self {
        Self {
            chat,
            auth,
            countries,
            otp_ttl,
            pending_login: None,
        }
    }

    pub fn theme(&self) -> Theme {
        Theme::new(lock_store(&self.chat.store()).is_dark())
    }

    /// Prompt showing the open room, or the login state.
    pub fn prompt(&self) -> String {
        if let Some(pending) = self.pending_login.as_ref().filter(|p| p.countdown.is_active()) {
            return format!("[code {}s] >> ", pending.remaining.load(Ordering::Relaxed));
        }
        let store = self.chat.store();
        let store = lock_store(&store);
        if !store.is_logged_in() {
            return "[signed out] >> ".to_string();
        }
        match store.selected_chatroom() {
            Some(room) => {
                let typing = if self.chat.pending_replies(&room.id) > 0 {
                    " …"
                } else {
                    ""
                };
                format!("[{}{}] >> ", room.title, typing)
            }
            None => "[no chat] >> ".to_string(),
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Flow> {
        if command.requires_session() && !self.auth.is_logged_in() {
            return Err(ChatError::validation(
                "Sign in first: /login [dial] <phone>",
            ));
        }
        debug!(?command, "Executing command");

        match command {
            Command::Login { dial_prefix, phone } => {
                self.login(dial_prefix, &phone)?;
            }
            Command::Verify { code } => self.verify(&code)?,
            Command::Resend => {
                let Some(pending) = self.pending_login.as_ref() else {
                    return Err(ChatError::validation("No code requested. Use /login first."));
                };
                let (dial_prefix, phone) = (pending.dial_prefix.clone(), pending.phone.clone());
                self.login(Some(dial_prefix), &phone)?;
            }
            Command::Logout => {
                self.pending_login = None;
                self.auth.logout();
                println!("{}", "Signed out.".bright_black());
            }
            Command::Rooms { query } => self.print_rooms(&query),
            Command::New { title } => {
                self.chat.create_chatroom(&title)?;
                self.after_switch();
            }
            Command::Open { target } => {
                let id = self.resolve_room(&target)?;
                self.chat.select_chat(&id)?;
                self.after_switch();
            }
            Command::Rename { title } => {
                let id = self.selected_room()?;
                self.chat.rename_chatroom(&id, &title)?;
                println!("{}", format!("Renamed to '{}'.", title.trim()).bright_black());
            }
            Command::Delete { target } => {
                let id = match target {
                    Some(target) => self.resolve_room(&target)?,
                    None => self.selected_room()?,
                };
                self.chat.delete_chatroom(&id)?;
                println!("{}", "Chatroom deleted.".bright_black());
                self.after_switch();
            }
            Command::History { page } => {
                for line in self.history_lines(page)? {
                    println!("{}", line);
                }
            }
            Command::Image { path, caption } => {
                let id = self.selected_room()?;
                let image = image_data_uri(Path::new(&path))?;
                let message = NewMessage::text(caption.unwrap_or_default()).with_image(image);
                let message = self.chat.send(&id, message)?;
                println!("{}", render::message_line(&message, self.theme()));
            }
            Command::Dark(dark) => {
                lock_store(&self.chat.store()).set_dark(dark);
                println!("{}", self.theme().accent(if dark { "Dark theme." } else { "Light theme." }));
            }
            Command::Sidebar => {
                let visible = {
                    let store = self.chat.store();
                    let mut store = lock_store(&store);
                    store.toggle_sidebar();
                    store.is_sidebar_visible()
                };
                let state = if visible { "shown" } else { "hidden" };
                println!("{}", format!("Room list {}.", state).bright_black());
            }
            Command::Countries => self.print_countries(),
            Command::Help => print_help(),
            Command::Quit => return Ok(Flow::Quit),
            Command::Say(text) => {
                let id = self.selected_room()?;
                let message = self.chat.send(&id, NewMessage::text(text))?;
                println!("{}", render::message_line(&message, self.theme()));
            }
        }
        Ok(Flow::Continue)
    }

    fn login(&mut self, dial_prefix: Option<String>, phone: &str) -> Result<OtpChallenge> {
        let dial_prefix = dial_prefix.unwrap_or_else(|| {
            self.countries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .default_country()
                .map(|c| c.dial_prefix.clone())
                .unwrap_or_else(|| DEFAULT_DIAL_PREFIX.to_string())
        });

        let challenge = self.auth.request_otp(&dial_prefix, phone)?;

        let ttl_secs = self.otp_ttl.as_secs();
        let remaining = Arc::new(AtomicU64::new(ttl_secs));
        let tick_remaining = Arc::clone(&remaining);
        let countdown = OtpCountdown::start(
            self.otp_ttl,
            move |left| tick_remaining.store(left, Ordering::Relaxed),
            || println!("\n{}", "Code expired. Request a new one with /resend.".yellow()),
        );

        println!(
            "{}",
            format!(
                "Code for {} {}: {} (valid {}s, demo only)",
                challenge.country_code, challenge.phone, challenge.code, ttl_secs
            )
            .bright_yellow()
        );
        println!("{}", "Enter it with /verify <code>.".bright_black());

        self.pending_login = Some(PendingLogin {
            challenge_id: challenge.id.clone(),
            dial_prefix,
            phone: challenge.phone.clone(),
            remaining,
            countdown,
        });
        Ok(challenge)
    }

    fn verify(&mut self, code: &str) -> Result<()> {
        let Some(pending) = self.pending_login.as_ref() else {
            return Err(ChatError::validation("No code requested. Use /login first."));
        };

        match self.auth.verify(&pending.challenge_id, code) {
            OtpVerification::Verified { .. } => {
                // Dropping the pending login cancels its countdown.
                self.pending_login = None;
                println!("{}", "Signed in.".bright_green());
                self.after_switch();
                Ok(())
            }
            OtpVerification::Mismatch => Err(ChatError::validation("Wrong code, try again.")),
            // The number stays pending so /resend can reuse it.
            OtpVerification::Expired | OtpVerification::UnknownChallenge => Err(
                ChatError::validation("Code expired. Request a new one with /resend."),
            ),
        }
    }

    fn selected_room(&self) -> Result<String> {
        lock_store(&self.chat.store())
            .selected_chat_id()
            .map(str::to_string)
            .ok_or_else(|| ChatError::validation("No chatroom open. Create one with /new <title>."))
    }

    /// Accepts a chatroom id or a 1-based index into the room list.
    fn resolve_room(&self, target: &str) -> Result<String> {
        let store = self.chat.store();
        let store = lock_store(&store);
        if let Some(room) = store.chatroom(target) {
            return Ok(room.id.clone());
        }
        target
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| store.chatrooms().get(i))
            .map(|room| room.id.clone())
            .ok_or_else(|| ChatError::not_found("Chatroom", target))
    }

    fn after_switch(&self) {
        let (sidebar, title) = {
            let store = self.chat.store();
            let store = lock_store(&store);
            (
                store.is_sidebar_visible(),
                store.selected_chatroom().map(|r| r.title.clone()),
            )
        };
        if sidebar {
            self.print_rooms("");
        }
        match title {
            Some(title) => println!("{}", self.theme().accent(&format!("# {}", title))),
            None => println!("{}", "No chatrooms. Create one with /new <title>.".bright_black()),
        }
    }

    fn print_rooms(&self, query: &str) {
        for line in self.room_lines(query) {
            println!("{}", line);
        }
    }

    /// Room list rows matching `query`. Numbers are positions in the full
    /// list, so they stay valid for `/open <index>`.
    fn room_lines(&self, query: &str) -> Vec<String> {
        let theme = self.theme();
        let store = self.chat.store();
        let store = lock_store(&store);
        let matches = store.search_chatrooms(query);
        if matches.is_empty() {
            let empty = if query.trim().is_empty() {
                "No chatrooms."
            } else {
                "No chatrooms found."
            };
            return vec![theme.muted(empty).to_string()];
        }
        let selected = store.selected_chat_id();
        matches
            .into_iter()
            .map(|(index, room)| {
                let is_selected = selected == Some(room.id.as_str());
                render::room_line(index, room, is_selected, theme)
            })
            .collect()
    }

    /// The newest `page * HISTORY_PAGE_SIZE` messages of the open room.
    fn history_lines(&self, page: usize) -> Result<Vec<String>> {
        let theme = self.theme();
        let store = self.chat.store();
        let store = lock_store(&store);
        let room = store
            .selected_chatroom()
            .ok_or_else(|| ChatError::validation("No chatroom open."))?;

        let mut lines = vec![theme.accent(&format!("# {}", room.title)).to_string()];
        let (messages, has_older) = room.recent_messages(page, HISTORY_PAGE_SIZE);
        if has_older {
            let hidden = room.messages.len() - messages.len();
            lines.push(
                theme
                    .muted(&format!("{} older messages, /history {} to see more", hidden, page + 1))
                    .to_string(),
            );
        }
        if room.messages.is_empty() {
            lines.push(theme.muted("Say hello to start the conversation.").to_string());
        }
        lines.extend(messages.iter().map(|message| render::message_line(message, theme)));
        if self.chat.pending_replies(&room.id) > 0 {
            lines.push(theme.muted("gemini is typing…").to_string());
        }
        Ok(lines)
    }

    fn print_countries(&self) {
        let catalog = self.countries.read().unwrap_or_else(PoisonError::into_inner);
        let default = catalog.default_country().map(|c| c.code.clone());
        for country in catalog.countries() {
            let is_default = default.as_deref() == Some(country.code.as_str());
            println!("{}", render::country_line(country, is_default));
        }
        if catalog.is_fallback() {
            println!("{}", "(offline list)".bright_black());
        }
    }
}

fn print_help() {
    for (name, usage) in COMMANDS {
        println!("  {} {}", name.bright_cyan(), usage.bright_black());
    }
    println!("  {}  {}", "quit".bright_cyan(), "leave".bright_black());
    println!("{}", "Anything else is sent to the open chatroom.".bright_black());
}
