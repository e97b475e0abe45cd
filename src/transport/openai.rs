use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::errors::{TransportError, request_error};
use super::sse::ChatCompletionsSse;
use super::{FragmentStream, Transport, TransportFuture};
use crate::config::Config;
use crate::model::Message;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    temperature: f32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn chat_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), CHAT_COMPLETIONS_PATH)
}

fn to_wire_messages(messages: &[Message]) -> Vec<WireMessage<'_>> {
    messages
        .iter()
        .map(|msg| WireMessage {
            role: msg.role().as_str(),
            content: msg.content(),
        })
        .collect()
}

/// HTTP client for the chat API. The read timeout bounds silence between
/// streamed chunks without capping the length of a reply.
pub fn build_client(cfg: &Config) -> reqwest::Result<Client> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    Client::builder()
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
}

/// Transport for any server speaking the OpenAI Chat Completions protocol.
pub struct OpenAiTransport {
    client: Client,
    cfg: Config,
    url: String,
}

impl OpenAiTransport {
    pub fn new(client: Client, cfg: Config) -> Self {
        let url = chat_url(&cfg.base_url);
        Self { client, cfg, url }
    }

    async fn open(
        &self,
        messages: &[Message],
        stream: bool,
    ) -> Result<FragmentStream<'static>, TransportError> {
        let body = ChatCompletionRequest {
            model: &self.cfg.model,
            messages: to_wire_messages(messages),
            stream,
            temperature: self.cfg.sampling.temperature,
            top_p: self.cfg.sampling.top_p,
            frequency_penalty: self.cfg.sampling.frequency_penalty,
            presence_penalty: self.cfg.sampling.presence_penalty,
            max_tokens: self.cfg.sampling.max_tokens,
        };
        debug!(
            api_url = %self.url,
            model = %self.cfg.model,
            message_count = messages.len(),
            stream,
            "sending chat completion request"
        );

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(api_key) = &self.cfg.api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {api_key}"));
        }
        if stream {
            request = request.header(ACCEPT, "text/event-stream");
        } else {
            // Streamed replies may run longer than the timeout.
            request = request.timeout(Duration::from_secs(self.cfg.timeout_secs));
        }

        let response = request.send().await.map_err(|err| {
            warn!(
                api_url = %self.url,
                model = %self.cfg.model,
                error = %err,
                "chat completion request failed"
            );
            request_error(err, &self.url, self.cfg.timeout_secs)
        })?;

        let status = response.status();
        if !status.is_success() {
            let response_body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read response body>".to_string());
            warn!(
                api_url = %self.url,
                model = %self.cfg.model,
                status = %status,
                response_body_len = response_body.len(),
                "chat API returned non-success status"
            );
            return Err(TransportError::from_status(status, response_body));
        }

        if stream {
            return Ok(Box::pin(ChatCompletionsSse::new(response.bytes_stream())));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| TransportError::Malformed(format!("failed to parse reply: {err}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        debug!(
            model = %self.cfg.model,
            response_len = content.len(),
            "received chat completion reply"
        );
        Ok(Box::pin(futures_util::stream::iter([Ok::<_, TransportError>(content)])))
    }
}

impl Transport for OpenAiTransport {
    fn send<'a>(&'a self, messages: &'a [Message], stream: bool) -> TransportFuture<'a> {
        Box::pin(async move {
            let fragments: FragmentStream<'a> = self.open(messages, stream).await?;
            Ok(fragments)
        })
    }
}
