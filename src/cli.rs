use clap::Parser;

use crate::error::InputError;

/// Yet Another AI Program: chat with an OpenAI-compatible model from the terminal.
///
/// Run without arguments for an interactive session, or pass a question to
/// get a single streamed answer.
#[derive(Debug, Parser)]
#[command(name = "yaap", version)]
pub struct Cli {
    /// Print raw error detail and debug-level logs
    #[arg(long)]
    pub debug: bool,

    /// Fail instead of starting an interactive session when no query is given
    #[arg(long)]
    pub no_interactive: bool,

    /// Question to answer in one-shot mode; words are joined with spaces
    pub query: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    OneShot(String),
}

impl Cli {
    pub fn mode(&self) -> Result<Mode, InputError> {
        if self.query.is_empty() {
            return if self.no_interactive {
                Err(InputError::EmptyQuery)
            } else {
                Ok(Mode::Interactive)
            };
        }

        let query = self.query.join(" ");
        if query.trim().is_empty() {
            return Err(InputError::EmptyQuery);
        }
        Ok(Mode::OneShot(query))
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Mode};
    use crate::error::InputError;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("yaap").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn no_arguments_starts_interactive_mode() {
        let cli = parse(&[]);
        assert!(!cli.debug);
        assert_eq!(cli.mode(), Ok(Mode::Interactive));
    }

    #[test]
    fn positional_arguments_are_joined_into_one_query() {
        let cli = parse(&["what", "is", "2+2"]);
        assert_eq!(cli.mode(), Ok(Mode::OneShot("what is 2+2".to_string())));
    }

    #[test]
    fn debug_flag_is_accepted_in_either_mode() {
        assert!(parse(&["--debug"]).debug);
        let cli = parse(&["--debug", "hello", "there"]);
        assert!(cli.debug);
        assert_eq!(cli.mode(), Ok(Mode::OneShot("hello there".to_string())));
    }

    #[test]
    fn missing_query_without_interactive_fallback_is_an_input_error() {
        let cli = parse(&["--no-interactive"]);
        assert_eq!(cli.mode(), Err(InputError::EmptyQuery));
    }

    #[test]
    fn whitespace_only_query_is_an_input_error() {
        let cli = parse(&["  ", ""]);
        assert_eq!(cli.mode(), Err(InputError::EmptyQuery));
    }
}
