use std::cell::RefCell;
use std::collections::VecDeque;

use crate::config::{Config, Sampling};
use crate::model::{Message, MessageRole};
use crate::transport::{FragmentStream, Transport, TransportError, TransportFuture};

pub fn test_config() -> Config {
    Config {
        base_url: "http://localhost:11434/v1".to_string(),
        model: "test-model".to_string(),
        api_key: None,
        system_prompt: "You are a helpful assistant.".to_string(),
        timeout_secs: 30,
        sampling: Sampling::default(),
        stream: true,
        strip_thinking: false,
    }
}

/// What the scripted transport does on one call.
#[derive(Debug)]
pub enum Script {
    Reply(Vec<Result<String, TransportError>>),
    Refuse(TransportError),
}

impl Script {
    pub fn reply(fragments: &[&str]) -> Self {
        Self::Reply(fragments.iter().map(|f| Ok((*f).to_string())).collect())
    }
}

/// In-memory transport that replays scripts in order and records each call.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: RefCell<VecDeque<Script>>,
    calls: RefCell<Vec<Vec<(MessageRole, String)>>>,
    stream_flags: RefCell<Vec<bool>>,
}

impl ScriptedTransport {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: RefCell::new(scripts.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<(MessageRole, String)>> {
        self.calls.borrow().clone()
    }

    pub fn stream_flags(&self) -> Vec<bool> {
        self.stream_flags.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send<'a>(&'a self, messages: &'a [Message], stream: bool) -> TransportFuture<'a> {
        self.calls.borrow_mut().push(
            messages
                .iter()
                .map(|msg| (msg.role(), msg.content().to_string()))
                .collect(),
        );
        self.stream_flags.borrow_mut().push(stream);
        let script = self
            .scripts
            .borrow_mut()
            .pop_front()
            .expect("transport called more often than scripted");

        Box::pin(async move {
            match script {
                Script::Refuse(err) => Err(err),
                Script::Reply(items) => {
                    let fragments: FragmentStream<'a> = Box::pin(futures_util::stream::iter(items));
                    Ok(fragments)
                }
            }
        })
    }
}
