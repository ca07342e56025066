//! DeepSeek keyword extraction through Ollama.

use async_trait::async_trait;
use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

use super::KeywordExtractor;
use crate::artifact;
use crate::error::{PipelineError, PipelineResult};
use crate::llm::provider::{LlmProvider, LlmRequest};
use crate::types::TagSet;

/// Extracts object tags from a description with a reasoning text model.
pub struct DeepseekExtractor {
    provider: Box<dyn LlmProvider>,
    instruction: String,
    /// Where tag files go; `None` disables saving
    output_dir: Option<PathBuf>,
}

impl DeepseekExtractor {
    pub fn new(
        provider: Box<dyn LlmProvider>,
        instruction: &str,
        output_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            provider,
            instruction: instruction.to_string(),
            output_dir,
        }
    }
}

#[async_trait]
impl KeywordExtractor for DeepseekExtractor {
    fn name(&self) -> &str {
        "DEEPSEEK"
    }

    async fn extract(&self, description: &str) -> PipelineResult<TagSet> {
        let request = LlmRequest::extract_keywords(&self.instruction, description);
        let response = self.provider.generate(&request).await?;
        tracing::debug!(
            "DeepSeek answered in {}ms:\n{}",
            response.latency_ms,
            response.text
        );

        let tags = parse_keywords(&response.text)?;
        tracing::info!(
            "Extracted tags: {}",
            serde_json::to_string(&tags).unwrap_or_default()
        );

        if let Some(dir) = &self.output_dir {
            let path = artifact::write_unique_json(dir, "tags_deepseek", &tags)?;
            tracing::info!("Tags saved to: {:?}", path);
        }

        Ok(tags)
    }

    async fn release(&self) -> PipelineResult<()> {
        self.provider.unload().await
    }
}

/// Pull a tag set out of a model answer.
///
/// Reasoning blocks (`<think>…</think>`) and any prose or code fences around
/// the JSON are ignored. The JSON may be an object (keys kept, in order) or an
/// array (keys become `"0"`, `"1"`, …). Non-string and blank labels are
/// dropped; labels are trimmed.
pub fn parse_keywords(text: &str) -> PipelineResult<TagSet> {
    let answer = strip_reasoning(text);
    let json = json_span(&answer)
        .ok_or_else(|| PipelineError::KeywordParse(format!("no JSON in {:?}", answer.trim())))?;

    let mut de = serde_json::Deserializer::from_str(json);
    let LenientTags(entries) =
        LenientTags::deserialize(&mut de).map_err(|e| PipelineError::KeywordParse(e.to_string()))?;

    Ok(entries.into_iter().collect())
}

/// Remove every `<think>…</think>` block; an unclosed block runs to the end.
fn strip_reasoning(text: &str) -> String {
    const OPEN: &str = "<think>";
    const CLOSE: &str = "</think>";

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        match rest[start..].find(CLOSE) {
            Some(end) => rest = &rest[start + end + CLOSE.len()..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// The outermost `{…}` or `[…]` span, whichever opens first.
fn json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Ordered `(key, label)` pairs from a JSON object or array.
struct LenientTags(Vec<(String, String)>);

impl<'de> Deserialize<'de> for LenientTags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LenientVisitor;

        impl<'de> Visitor<'de> for LenientVisitor {
            type Value = LenientTags;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object or array of labels")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<LenientTags, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    if let Some(label) = label_of(&value) {
                        entries.push((key, label));
                    }
                }
                Ok(LenientTags(entries))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<LenientTags, A::Error> {
                let mut labels = Vec::new();
                while let Some(value) = access.next_element::<Value>()? {
                    if let Some(label) = label_of(&value) {
                        labels.push(label);
                    }
                }
                Ok(LenientTags(
                    labels
                        .into_iter()
                        .enumerate()
                        .map(|(i, label)| (i.to_string(), label))
                        .collect(),
                ))
            }
        }

        deserializer.deserialize_any(LenientVisitor)
    }
}

fn label_of(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
