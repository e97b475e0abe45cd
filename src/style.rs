use colored::Colorize;
use std::env;
use std::io::{self, IsTerminal};

use crate::model::{Message, MessageRole};

const INDENT: &str = "  ";

/// Light purple used for assistant replies (xterm colour 183).
const ASSISTANT_RGB: (u8, u8, u8) = (215, 175, 255);

/// Terminal styling for conversation output. A plain style leaves text untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    color: bool,
}

impl Style {
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn colored() -> Self {
        Self { color: true }
    }

    /// Colour only when stdout is a terminal and `NO_COLOR` is unset.
    pub fn detect() -> Self {
        let color = io::stdout().is_terminal() && env::var_os("NO_COLOR").is_none();
        colored::control::set_override(color);
        Self { color }
    }

    pub fn assistant(&self, text: &str) -> String {
        if !self.color || text.is_empty() {
            return text.to_string();
        }
        let (r, g, b) = ASSISTANT_RGB;
        text.truecolor(r, g, b).to_string()
    }

    /// One `history` entry: a numbered header, then the content. User
    /// content is indented, assistant content is coloured.
    pub fn history_entry(&self, index: usize, msg: &Message) -> String {
        let header = format!(
            "[{index}] {} - {}:",
            msg.created_at().format("%H:%M:%S"),
            msg.role().as_str().to_ascii_uppercase()
        );
        let body = match msg.role() {
            MessageRole::Assistant => self.assistant(msg.content()),
            MessageRole::User | MessageRole::System => msg
                .content()
                .lines()
                .map(|line| format!("{INDENT}{line}"))
                .collect::<Vec<_>>()
                .join("\n"),
        };
        format!("{header}\n{body}")
    }
}
