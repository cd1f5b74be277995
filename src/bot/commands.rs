/// Parsed chat command. Parsing is an explicit tagged result: `None`
/// means no command matched and, by policy, no reply is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Link,
    SendNow {
        recipient: String,
        amount: String,
    },
    Schedule {
        recipient: String,
        amount: String,
        delay_minutes: u64,
    },
}

impl Command {
    pub fn parse(text: &str) -> Option<Command> {
        let mut parts = text.trim().split_whitespace();
        let head = parts.next()?;
        // "/start@some_bot" addresses this bot in a group chat
        let head = head.split('@').next().unwrap_or(head);

        match head {
            "/start" => Some(Command::Start),
            "/link" => Some(Command::Link),
            "/sendnow" => {
                let recipient = handle_arg(parts.next()?)?;
                let amount = amount_arg(parts.next()?)?;
                Some(Command::SendNow { recipient, amount })
            }
            "/schedule" => {
                let recipient = handle_arg(parts.next()?)?;
                let amount = amount_arg(parts.next()?)?;
                let delay_minutes = parts.next()?.parse::<u64>().ok()?;
                Some(Command::Schedule {
                    recipient,
                    amount,
                    delay_minutes,
                })
            }
            _ => None,
        }
    }
}

/// "@name" where name is a word ([A-Za-z0-9_]+)
fn handle_arg(token: &str) -> Option<String> {
    let name = token.strip_prefix('@')?;
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(name.to_string())
    } else {
        None
    }
}

/// Digits and dots only; exact numeric validation happens in the scheduler
fn amount_arg(token: &str) -> Option<String> {
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit() || c == '.') {
        Some(token.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/link"), Some(Command::Link));
        assert_eq!(Command::parse("  /link  "), Some(Command::Link));
        assert_eq!(Command::parse("/start@paybot"), Some(Command::Start));
    }

    #[test]
    fn parses_sendnow() {
        assert_eq!(
            Command::parse("/sendnow @bob 1.5"),
            Some(Command::SendNow {
                recipient: "bob".to_string(),
                amount: "1.5".to_string(),
            })
        );
    }

    #[test]
    fn parses_schedule() {
        assert_eq!(
            Command::parse("/schedule @bob_1 0.5 10"),
            Some(Command::Schedule {
                recipient: "bob_1".to_string(),
                amount: "0.5".to_string(),
                delay_minutes: 10,
            })
        );
    }

    #[test]
    fn malformed_patterns_do_not_match() {
        assert_eq!(Command::parse("/sendnow"), None);
        assert_eq!(Command::parse("/sendnow bob 1.5"), None);
        assert_eq!(Command::parse("/sendnow @bob"), None);
        assert_eq!(Command::parse("/sendnow @bob one"), None);
        assert_eq!(Command::parse("/schedule @bob 1.5"), None);
        assert_eq!(Command::parse("/schedule @bob 1.5 soon"), None);
        assert_eq!(Command::parse("/schedule @bob 1.5 -3"), None);
        assert_eq!(Command::parse("/unknown"), None);
        assert_eq!(Command::parse("hello"), None);
        assert_eq!(Command::parse(""), None);
    }
}
