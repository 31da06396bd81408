//! Terminal rendering of chatrooms and messages.

use chrono::{Local, TimeZone};
use colored::{ColoredString, Colorize};

use gemchat_core::chat::{Chatroom, Message, MessageRole};
use gemchat_core::country::Country;

/// Palette selected by the dark flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    dark: bool,
}

impl Theme {
    pub fn new(dark: bool) -> Self {
        Self { dark }
    }

    pub fn user(&self, text: &str) -> ColoredString {
        if self.dark {
            text.bright_green()
        } else {
            text.green()
        }
    }

    pub fn assistant(&self, text: &str) -> ColoredString {
        if self.dark {
            text.bright_blue()
        } else {
            text.blue()
        }
    }

    pub fn muted(&self, text: &str) -> ColoredString {
        text.bright_black()
    }

    pub fn accent(&self, text: &str) -> ColoredString {
        if self.dark {
            text.bright_magenta()
        } else {
            text.magenta()
        }
    }
}

/// `HH:MM` in local time; empty for timestamps chrono cannot represent.
pub fn clock_time(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

pub fn message_line(message: &Message, theme: Theme) -> String {
    let author = match message.role {
        MessageRole::User => "you",
        MessageRole::Assistant => "gemini",
    };
    let mut body = message.text.clone();
    if message.image.is_some() {
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str("[image]");
    }
    let header = format!("[{} {}]", clock_time(message.created_at), author);
    let colored_body = match message.role {
        MessageRole::User => theme.user(&body),
        MessageRole::Assistant => theme.assistant(&body),
    };
    format!("{} {}", theme.muted(&header), colored_body)
}

/// One row of the room list: index, marker for the open room, title and the
/// last message preview.
pub fn room_line(index: usize, room: &Chatroom, selected: bool, theme: Theme) -> String {
    let marker = if selected { "*" } else { " " };
    let preview = room
        .last_message()
        .map(|m| truncate(&m.text, 40))
        .unwrap_or_else(|| "no messages".to_string());
    format!(
        "{} {:>2}. {}  {}  {}",
        marker,
        index + 1,
        theme.accent(&room.title),
        theme.muted(&room.id),
        theme.muted(&preview)
    )
}

pub fn country_line(country: &Country, is_default: bool) -> String {
    let marker = if is_default { " (default)" } else { "" };
    format!("{:>6}  {}{}", country.dial_prefix, country.label, marker)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}…", head)
    }
}
