use std::env;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_SYSTEM_PROMPT: &str = "You are YAAP (Yet Another AI Program), a helpful AI assistant. \
     Be concise, friendly, and helpful in your responses.";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TOP_P: f32 = 1.0;
const DEFAULT_FREQUENCY_PENALTY: f32 = 0.0;
const DEFAULT_PRESENCE_PENALTY: f32 = 0.0;
const DEFAULT_STREAM: bool = true;
const DEFAULT_STRIP_THINKING: bool = true;

/// Sampling parameters forwarded verbatim to the chat completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens: Option<u32>,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            frequency_penalty: DEFAULT_FREQUENCY_PENALTY,
            presence_penalty: DEFAULT_PRESENCE_PENALTY,
            max_tokens: None,
        }
    }
}

/// Runtime configuration, loaded once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub system_prompt: String,
    pub timeout_secs: u64,
    pub sampling: Sampling,
    pub stream: bool,
    pub strip_thinking: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let sampling = Sampling {
            temperature: parse_f32(get_var("LLM_TEMPERATURE").as_deref(), DEFAULT_TEMPERATURE),
            top_p: parse_f32(get_var("LLM_TOP_P").as_deref(), DEFAULT_TOP_P),
            frequency_penalty: parse_f32(
                get_var("LLM_FREQUENCY_PENALTY").as_deref(),
                DEFAULT_FREQUENCY_PENALTY,
            ),
            presence_penalty: parse_f32(
                get_var("LLM_PRESENCE_PENALTY").as_deref(),
                DEFAULT_PRESENCE_PENALTY,
            ),
            max_tokens: parse_max_tokens(get_var("LLM_MAX_TOKENS").as_deref()),
        };

        Self {
            base_url: non_empty(get_var("LLM_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: non_empty(get_var("LLM_MODEL")).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: non_empty(get_var("LLM_API_KEY")),
            system_prompt: get_var("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            timeout_secs: parse_positive_u64(get_var("LLM_TIMEOUT").as_deref(), DEFAULT_TIMEOUT_SECS),
            sampling,
            stream: parse_bool(get_var("LLM_STREAM").as_deref(), DEFAULT_STREAM),
            strip_thinking: parse_bool(
                get_var("LLM_STRIP_THINKING").as_deref(),
                DEFAULT_STRIP_THINKING,
            ),
        }
    }

    /// The leading system message content, if one is configured.
    pub fn system_message(&self) -> Option<&str> {
        let prompt = self.system_prompt.trim();
        (!prompt.is_empty()).then_some(prompt)
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_max_tokens(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
}

fn parse_f32(raw: Option<&str>, default: f32) -> f32 {
    raw.and_then(|value| value.trim().parse::<f32>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}

fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{
        Config, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT, DEFAULT_TIMEOUT_SECS,
        Sampling, parse_bool, parse_f32, parse_max_tokens, parse_positive_u64,
    };

    fn config_from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        Config::from_env_with(|key| vars.get(key).cloned())
    }

    #[test]
    fn from_env_uses_defaults_when_vars_are_missing() {
        let cfg = config_from_pairs(&[]);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.sampling, Sampling::default());
        assert!(cfg.stream);
        assert!(cfg.strip_thinking);
    }

    #[test]
    fn from_env_reads_configured_values() {
        let cfg = config_from_pairs(&[
            ("LLM_BASE_URL", "http://localhost:11434/v1"),
            ("LLM_MODEL", "qwen3:4b"),
            ("LLM_API_KEY", "sk-test"),
            ("SYSTEM_PROMPT", "Be terse."),
            ("LLM_TIMEOUT", "90"),
            ("LLM_TEMPERATURE", "0.2"),
            ("LLM_TOP_P", "0.9"),
            ("LLM_FREQUENCY_PENALTY", "0.5"),
            ("LLM_PRESENCE_PENALTY", "-0.5"),
            ("LLM_MAX_TOKENS", "512"),
            ("LLM_STREAM", "off"),
            ("LLM_STRIP_THINKING", "no"),
        ]);

        assert_eq!(cfg.base_url, "http://localhost:11434/v1");
        assert_eq!(cfg.model, "qwen3:4b");
        assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.system_prompt, "Be terse.");
        assert_eq!(cfg.timeout_secs, 90);
        assert_eq!(
            cfg.sampling,
            Sampling {
                temperature: 0.2,
                top_p: 0.9,
                frequency_penalty: 0.5,
                presence_penalty: -0.5,
                max_tokens: Some(512),
            }
        );
        assert!(!cfg.stream);
        assert!(!cfg.strip_thinking);
    }

    #[test]
    fn blank_credentials_and_urls_are_treated_as_missing() {
        let cfg = config_from_pairs(&[
            ("LLM_API_KEY", "   "),
            ("LLM_BASE_URL", ""),
            ("LLM_MODEL", " "),
        ]);
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.model, DEFAULT_MODEL);
    }

    #[test]
    fn empty_system_prompt_disables_system_message() {
        let cfg = config_from_pairs(&[("SYSTEM_PROMPT", "  ")]);
        assert_eq!(cfg.system_message(), None);

        let cfg = config_from_pairs(&[]);
        assert_eq!(cfg.system_message(), Some(DEFAULT_SYSTEM_PROMPT));
    }

    #[test]
    fn parse_positive_u64_uses_default_for_missing_or_invalid_values() {
        assert_eq!(parse_positive_u64(None, 30), 30);
        assert_eq!(parse_positive_u64(Some(""), 30), 30);
        assert_eq!(parse_positive_u64(Some("not-a-number"), 30), 30);
        assert_eq!(parse_positive_u64(Some("0"), 30), 30);
        assert_eq!(parse_positive_u64(Some("  45  "), 30), 45);
    }

    #[test]
    fn parse_max_tokens_ignores_zero_and_garbage() {
        assert_eq!(parse_max_tokens(None), None);
        assert_eq!(parse_max_tokens(Some("0")), None);
        assert_eq!(parse_max_tokens(Some("lots")), None);
        assert_eq!(parse_max_tokens(Some(" 256 ")), Some(256));
    }

    #[test]
    fn parse_f32_rejects_non_finite_values() {
        assert_eq!(parse_f32(Some("NaN"), 0.7), 0.7);
        assert_eq!(parse_f32(Some("inf"), 0.7), 0.7);
        assert_eq!(parse_f32(Some("warm"), 0.7), 0.7);
        assert_eq!(parse_f32(Some("1.5"), 0.7), 1.5);
    }

    #[test]
    fn parse_bool_respects_truthy_and_falsy_values() {
        assert!(parse_bool(Some("true"), false));
        assert!(parse_bool(Some(" YES "), false));
        assert!(!parse_bool(Some("off"), true));
        assert!(!parse_bool(Some(" 0 "), true));
        assert!(parse_bool(Some("maybe"), true));
        assert!(!parse_bool(None, false));
    }
}
