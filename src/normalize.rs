//! Response normalization
//!
//! Turns a provider response into the `{text, sources}` pair the transcript
//! shows. Pure and deterministic.

use crate::llm::LlmResponse;
use serde::Serialize;

/// A web page the answer cites
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

/// Normalized assistant reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    pub sources: Vec<Source>,
}

impl Reply {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.sources.is_empty()
    }
}

/// Extract text and citation sources from a response.
///
/// `text` may be empty when the provider only asked for a tool call; callers
/// check for that before treating it as a failure. One source per web chunk,
/// provider order, duplicates kept; a missing title falls back to the uri.
pub fn normalize(response: &LlmResponse) -> Reply {
    let sources = response
        .grounding
        .iter()
        .flat_map(|meta| meta.chunks.iter())
        .filter_map(|chunk| chunk.web.as_ref())
        .map(|web| Source {
            uri: web.uri.clone(),
            title: web
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| web.uri.clone()),
        })
        .collect();

    Reply {
        text: response.text(),
        sources,
    }
}
