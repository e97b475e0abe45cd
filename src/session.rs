use chrono::{DateTime, Local};
use futures_util::StreamExt;
use std::io::{self, Write};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, InputError};
use crate::model::{Conversation, Message};
use crate::style::Style;
use crate::thinking::ThinkingFilter;
use crate::transport::{FragmentStream, Transport};

/// One long-lived conversation: the history, the transport that answers it
/// and the terminal the replies are echoed to.
pub struct Session<T, W> {
    transport: T,
    conversation: Conversation,
    out: W,
    stream: bool,
    strip_thinking: bool,
    style: Style,
    started_at: DateTime<Local>,
}

impl<T, W> Session<T, W> {
    pub fn new(transport: T, cfg: &Config, out: W) -> Self {
        Self {
            transport,
            conversation: Conversation::new(cfg.system_message()),
            out,
            stream: cfg.stream,
            strip_thinking: cfg.strip_thinking,
            style: Style::plain(),
            started_at: Local::now(),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn clear(&mut self) {
        self.conversation.clear();
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }

    #[cfg(test)]
    pub(crate) fn into_transport(self) -> T {
        self.transport
    }

    pub fn summary(&self) -> String {
        let elapsed = (Local::now() - self.started_at).num_seconds().max(0);
        format!(
            "Session summary: {}m {}s, {} messages exchanged",
            elapsed / 60,
            elapsed % 60,
            self.conversation.exchanged().count()
        )
    }
}

impl<T, W> Session<T, W>
where
    T: Transport,
    W: Write,
{
    /// Runs one turn: records the utterance, echoes the reply as it streams
    /// in and records the reply once it is complete.
    ///
    /// On failure the user message stays in the history and no assistant
    /// message is added. Text already echoed before a mid-stream failure is
    /// left on screen but not recorded.
    pub async fn run_turn(&mut self, input: &str) -> Result<String, Error> {
        if input.trim().is_empty() {
            return Err(InputError::EmptyQuery.into());
        }

        self.conversation.push(Message::user(input));
        debug!(
            message_count = self.conversation.len(),
            stream = self.stream,
            "starting turn"
        );

        let mut filter = ThinkingFilter::new(self.strip_thinking);
        let mut reply = String::new();
        let outcome = match self
            .transport
            .send(self.conversation.messages(), self.stream)
            .await
        {
            Ok(mut fragments) => {
                pump(&mut fragments, &mut filter, &mut self.out, self.style, &mut reply).await
            }
            Err(err) => Err(err.into()),
        };

        if let Err(err) = outcome {
            if !reply.is_empty() {
                writeln!(self.out)?;
                self.out.flush()?;
            }
            warn!(
                error = %err,
                partial_len = reply.len(),
                "turn abandoned"
            );
            return Err(err);
        }

        echo(&mut self.out, self.style, &filter.finish(), &mut reply)?;
        writeln!(self.out)?;
        self.out.flush()?;

        self.conversation.push(Message::assistant(reply.clone()));
        debug!(
            message_count = self.conversation.len(),
            reply_len = reply.len(),
            "turn complete"
        );
        Ok(reply)
    }
}

async fn pump<W: Write>(
    fragments: &mut FragmentStream<'_>,
    filter: &mut ThinkingFilter,
    out: &mut W,
    style: Style,
    reply: &mut String,
) -> Result<(), Error> {
    while let Some(fragment) = fragments.next().await {
        let visible = filter.push(&fragment?);
        echo(out, style, &visible, reply)?;
    }
    Ok(())
}

/// Writes one visible fragment. The recorded reply never carries styling.
fn echo<W: Write>(out: &mut W, style: Style, text: &str, reply: &mut String) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    out.write_all(style.assistant(text).as_bytes())?;
    out.flush()?;
    reply.push_str(text);
    Ok(())
}
