//! Incremental removal of `<think>…</think>` reasoning blocks from a reply.

const OPEN_TAG: &str = "<think>";
const CLOSE_TAG: &str = "</think>";

/// Filters reasoning blocks out of streamed fragments.
///
/// Tags are matched case-insensitively, may nest, and may be split across
/// fragment boundaries. Text that could still turn into a tag is held back
/// until the next fragment (or [`ThinkingFilter::finish`]) settles it.
#[derive(Debug, Default)]
pub struct ThinkingFilter {
    enabled: bool,
    depth: usize,
    pending: String,
    emitted_text: bool,
}

impl ThinkingFilter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn push(&mut self, fragment: &str) -> String {
        if !self.enabled {
            return fragment.to_string();
        }

        self.pending.push_str(fragment);
        let mut visible = String::new();

        loop {
            let lower = self.pending.to_ascii_lowercase();

            if self.depth == 0 {
                if let Some(start) = lower.find(OPEN_TAG) {
                    visible.push_str(&self.pending[..start]);
                    self.pending.replace_range(..start + OPEN_TAG.len(), "");
                    self.depth = 1;
                    continue;
                }

                let split = self.pending.len() - partial_tag_len(&lower, &[OPEN_TAG]);
                visible.push_str(&self.pending[..split]);
                self.pending.replace_range(..split, "");
                break;
            }

            match (lower.find(OPEN_TAG), lower.find(CLOSE_TAG)) {
                (Some(open), close) if close.is_none_or(|close| open < close) => {
                    self.pending.replace_range(..open + OPEN_TAG.len(), "");
                    self.depth += 1;
                }
                (_, Some(close)) => {
                    self.pending.replace_range(..close + CLOSE_TAG.len(), "");
                    self.depth -= 1;
                }
                _ => {
                    let split =
                        self.pending.len() - partial_tag_len(&lower, &[OPEN_TAG, CLOSE_TAG]);
                    self.pending.replace_range(..split, "");
                    break;
                }
            }
        }

        self.emit(visible)
    }

    /// Flushes held-back text once the reply is complete. An unterminated
    /// reasoning block is dropped.
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        if self.depth > 0 {
            return String::new();
        }
        self.emit(rest)
    }

    fn emit(&mut self, text: String) -> String {
        if self.emitted_text || !self.enabled {
            return text;
        }
        let trimmed = text.trim_start();
        if !trimmed.is_empty() {
            self.emitted_text = true;
        }
        trimmed.to_string()
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of a tag.
fn partial_tag_len(text: &str, tags: &[&str]) -> usize {
    tags.iter()
        .flat_map(|tag| {
            (1..tag.len()).filter(move |&len| text.as_bytes().ends_with(&tag.as_bytes()[..len]))
        })
        .max()
        .unwrap_or(0)
}
