use std::io::{BufRead, Write};
use tracing::debug;

use crate::error::Error;
use crate::model::Conversation;
use crate::session::Session;
use crate::style::Style;
use crate::transport::Transport;

const HELP_TEXT: &str = "\
Available commands:
  help     - Show this help message
  history  - Show conversation history
  clear    - Clear conversation history
  exit     - Exit the program
  quit     - Exit the program

Simply type your message and press Enter to chat!
";

/// Session commands handled locally, never sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Exit,
    Help,
    History,
    Clear,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "exit" | "quit" => Some(Self::Exit),
            "help" => Some(Self::Help),
            "history" => Some(Self::History),
            "clear" => Some(Self::Clear),
            _ => None,
        }
    }
}

pub async fn run_repl<T, W, R>(
    session: &mut Session<T, W>,
    model: &str,
    mut input: R,
    debug: bool,
) -> Result<(), Error>
where
    T: Transport,
    W: Write,
    R: BufRead,
{
    let out = session.out();
    writeln!(out, "> YAAP - Yet Another AI Program")?;
    writeln!(out, "model: {model}")?;
    writeln!(out, "Type 'exit' or 'quit' to end the session")?;
    writeln!(out, "Type 'help' for available commands")?;
    writeln!(out, "{}", "-".repeat(50))?;

    loop {
        write!(session.out(), "> ")?;
        session.out().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(session.out(), "\nGoodbye!")?;
            break;
        }

        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }

        match ReplCommand::parse(prompt) {
            Some(ReplCommand::Exit) => break,
            Some(ReplCommand::Help) => {
                writeln!(session.out(), "{HELP_TEXT}")?;
                continue;
            }
            Some(ReplCommand::History) => {
                let history = format_history(session.conversation(), session.style());
                writeln!(session.out(), "{history}")?;
                continue;
            }
            Some(ReplCommand::Clear) => {
                session.clear();
                debug!("conversation cleared");
                writeln!(session.out(), "Conversation history cleared.\n")?;
                continue;
            }
            None => {}
        }

        match session.run_turn(prompt).await {
            Ok(_) => writeln!(session.out())?,
            Err(Error::Io(err)) => return Err(Error::Io(err)),
            Err(err) => writeln!(session.out(), "{}\n", err.report(debug))?,
        }
    }

    let summary = session.summary();
    writeln!(session.out(), "{summary}")?;
    session.out().flush()?;
    Ok(())
}

fn format_history(conversation: &Conversation, style: Style) -> String {
    let entries: Vec<String> = conversation
        .exchanged()
        .enumerate()
        .map(|(idx, msg)| style.history_entry(idx + 1, msg))
        .collect();

    if entries.is_empty() {
        return "(history is empty)\n".to_string();
    }
    entries.join("\n") + "\n"
}
