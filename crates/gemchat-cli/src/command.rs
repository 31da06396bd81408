//! REPL command parsing.

use thiserror::Error;

/// Slash commands with their usage, in help order.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/login", "[dial] <phone>   request a one-time code"),
    ("/verify", "<code>          confirm the code and sign in"),
    ("/resend", "                send a new code to the same number"),
    ("/logout", "                sign out (chats stay on this device)"),
    ("/rooms", "[query]          list chatrooms, filtered by title"),
    ("/new", "<title>            create and open a chatroom"),
    ("/open", "<id|index>        switch chatroom"),
    ("/rename", "<title>         rename the open chatroom"),
    ("/delete", "[id|index]      delete a chatroom (default: the open one)"),
    ("/history", "[page]         show the open chatroom, 20 messages per page"),
    ("/image", "<path> [caption] send an image to the open chatroom"),
    ("/dark", "on|off            switch theme"),
    ("/sidebar", "               toggle the room list after switching rooms"),
    ("/countries", "             list dial codes"),
    ("/help", "                  show this help"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login {
        dial_prefix: Option<String>,
        phone: String,
    },
    Verify {
        code: String,
    },
    Resend,
    Logout,
    /// Lists chatrooms whose title contains `query`; empty lists all.
    Rooms {
        query: String,
    },
    New {
        title: String,
    },
    Open {
        target: String,
    },
    Rename {
        title: String,
    },
    Delete {
        target: Option<String>,
    },
    History {
        page: usize,
    },
    Image {
        path: String,
        caption: Option<String>,
    },
    Dark(bool),
    Sidebar,
    Countries,
    Help,
    Quit,
    /// Plain text for the open chatroom.
    Say(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type /help for the list.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if line == "quit" || line == "exit" {
            return Ok(Some(Command::Quit));
        }
        if !line.starts_with('/') {
            return Ok(Some(Command::Say(line.to_string())));
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match name {
            "/login" => match args.as_slice() {
                [phone] => Command::Login {
                    dial_prefix: None,
                    phone: phone.to_string(),
                },
                [dial, phone] => Command::Login {
                    dial_prefix: Some(normalize_dial(dial)),
                    phone: phone.to_string(),
                },
                _ => return Err(CommandError::Usage("/login [dial] <phone>")),
            },
            "/verify" => match args.as_slice() {
                [code] => Command::Verify {
                    code: code.to_string(),
                },
                _ => return Err(CommandError::Usage("/verify <code>")),
            },
            "/resend" => Command::Resend,
            "/logout" => Command::Logout,
            "/rooms" => Command::Rooms {
                query: rest.to_string(),
            },
            "/new" if !rest.is_empty() => Command::New {
                title: rest.to_string(),
            },
            "/new" => return Err(CommandError::Usage("/new <title>")),
            "/open" => match args.as_slice() {
                [target] => Command::Open {
                    target: target.to_string(),
                },
                _ => return Err(CommandError::Usage("/open <id|index>")),
            },
            "/rename" if !rest.is_empty() => Command::Rename {
                title: rest.to_string(),
            },
            "/rename" => return Err(CommandError::Usage("/rename <title>")),
            "/delete" => match args.as_slice() {
                [] => Command::Delete { target: None },
                [target] => Command::Delete {
                    target: Some(target.to_string()),
                },
                _ => return Err(CommandError::Usage("/delete [id|index]")),
            },
            "/history" => match args.as_slice() {
                [] => Command::History { page: 1 },
                [page] => match page.parse::<usize>() {
                    Ok(page) if page > 0 => Command::History { page },
                    _ => return Err(CommandError::Usage("/history [page]")),
                },
                _ => return Err(CommandError::Usage("/history [page]")),
            },
            "/image" if rest.is_empty() => {
                return Err(CommandError::Usage("/image <path> [caption]"));
            }
            "/image" => match rest.split_once(char::is_whitespace) {
                Some((path, caption)) => Command::Image {
                    path: path.to_string(),
                    caption: Some(caption.trim().to_string()),
                },
                None => Command::Image {
                    path: rest.to_string(),
                    caption: None,
                },
            },
            "/dark" => match args.as_slice() {
                ["on"] => Command::Dark(true),
                ["off"] => Command::Dark(false),
                _ => return Err(CommandError::Usage("/dark on|off")),
            },
            "/sidebar" => Command::Sidebar,
            "/countries" => Command::Countries,
            "/help" => Command::Help,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }

    /// Whether the command needs a signed-in session.
    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            Command::Rooms { .. }
                | Command::New { .. }
                | Command::Open { .. }
                | Command::Rename { .. }
                | Command::Delete { .. }
                | Command::History { .. }
                | Command::Image { .. }
                | Command::Say(_)
        )
    }
}

fn normalize_dial(dial: &str) -> String {
    if dial.starts_with('+') {
        dial.to_string()
    } else {
        format!("+{}", dial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_plain_text() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(
            Command::parse("  hello there ").unwrap(),
            Some(Command::Say("hello there".to_string()))
        );
        assert_eq!(Command::parse("exit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_login_forms() {
        assert_eq!(
            Command::parse("/login 5551234567").unwrap(),
            Some(Command::Login {
                dial_prefix: None,
                phone: "5551234567".to_string()
            })
        );
        assert_eq!(
            Command::parse("/login 1 5551234567").unwrap(),
            Some(Command::Login {
                dial_prefix: Some("+1".to_string()),
                phone: "5551234567".to_string()
            })
        );
        assert!(matches!(Command::parse("/login"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_titles_keep_spaces() {
        assert_eq!(
            Command::parse("/new Trip   Planning").unwrap(),
            Some(Command::New {
                title: "Trip   Planning".to_string()
            })
        );
        assert!(matches!(Command::parse("/rename   "), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_dark_and_delete() {
        assert_eq!(Command::parse("/dark on").unwrap(), Some(Command::Dark(true)));
        assert!(Command::parse("/dark maybe").is_err());
        assert_eq!(
            Command::parse("/delete").unwrap(),
            Some(Command::Delete { target: None })
        );
        assert_eq!(
            Command::parse("/delete 2").unwrap(),
            Some(Command::Delete {
                target: Some("2".to_string())
            })
        );
    }

    #[test]
    fn test_rooms_query() {
        assert_eq!(
            Command::parse("/rooms").unwrap(),
            Some(Command::Rooms {
                query: String::new()
            })
        );
        assert_eq!(
            Command::parse("/rooms  trip plan ").unwrap(),
            Some(Command::Rooms {
                query: "trip plan".to_string()
            })
        );
    }

    #[test]
    fn test_history_page() {
        assert_eq!(
            Command::parse("/history").unwrap(),
            Some(Command::History { page: 1 })
        );
        assert_eq!(
            Command::parse("/history 3").unwrap(),
            Some(Command::History { page: 3 })
        );
        assert!(matches!(Command::parse("/history 0"), Err(CommandError::Usage(_))));
        assert!(matches!(Command::parse("/history two"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_image_with_and_without_caption() {
        assert_eq!(
            Command::parse("/image photos/cat.png").unwrap(),
            Some(Command::Image {
                path: "photos/cat.png".to_string(),
                caption: None
            })
        );
        assert_eq!(
            Command::parse("/image cat.png  look at  this ").unwrap(),
            Some(Command::Image {
                path: "cat.png".to_string(),
                caption: Some("look at  this".to_string())
            })
        );
        assert!(matches!(Command::parse("/image"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_resend_takes_no_arguments() {
        assert_eq!(Command::parse("/resend").unwrap(), Some(Command::Resend));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Command::parse("/teleport now"),
            Err(CommandError::Unknown("/teleport".to_string()))
        );
    }

    #[test]
    fn test_session_gate() {
        assert!(Command::Say("x".to_string()).requires_session());
        assert!(Command::History { page: 1 }.requires_session());
        assert!(
            Command::Image {
                path: "a.png".to_string(),
                caption: None
            }
            .requires_session()
        );
        assert!(!Command::Resend.requires_session());
        assert!(!Command::Help.requires_session());
        assert!(!Command::Dark(true).requires_session());
        assert!(!Command::Login {
            dial_prefix: None,
            phone: "1".to_string()
        }
        .requires_session());
    }

    #[test]
    fn test_every_listed_command_parses() {
        for (name, _) in COMMANDS {
            let result = Command::parse(name);
            assert!(
                !matches!(result, Err(CommandError::Unknown(_))),
                "{} is listed but unknown",
                name
            );
        }
    }
}
