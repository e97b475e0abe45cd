use thiserror::Error;

use crate::transport::TransportError;

/// Problems with what the user asked for, detected before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("no query given; pass a question as arguments or run without arguments for interactive mode")]
    EmptyQuery,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Renders the error for the terminal, adding raw detail in debug mode.
    pub fn report(&self, debug: bool) -> String {
        let mut text = format!("error: {self}");
        if debug {
            if let Self::Transport(err) = self
                && let Some(detail) = err.detail()
            {
                text.push_str(&format!("\n  detail: {detail}"));
            }
            text.push_str(&format!("\n  debug: {self:?}"));
        }
        text
    }
}
