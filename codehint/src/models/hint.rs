//! Progressive hints and the parser for the model's hint payload.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::error::{CodehintError, Result};

/// Hint levels, from conceptual (1) to implementation detail (4).
pub const HINT_LEVELS: std::ops::RangeInclusive<u8> = 1..=4;

/// All four hint levels for one problem. Never partially populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintSet {
    levels: BTreeMap<u8, String>,
}

impl HintSet {
    /// Build from `level -> text`. Every level in [`HINT_LEVELS`] must be
    /// present with non-blank text; other levels are dropped.
    pub fn from_levels(mut levels: BTreeMap<u8, String>) -> Result<Self> {
        levels.retain(|level, _| HINT_LEVELS.contains(level));

        for level in HINT_LEVELS {
            match levels.get(&level) {
                None => {
                    return Err(CodehintError::MalformedModelOutput(format!(
                        "missing hint level {level}"
                    )))
                }
                Some(text) if text.trim().is_empty() => {
                    return Err(CodehintError::MalformedModelOutput(format!(
                        "hint level {level} is empty"
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(Self { levels })
    }

    pub fn get(&self, level: u8) -> Option<&str> {
        self.levels.get(&level).map(String::as_str)
    }
}

impl Serialize for HintSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.levels.len()))?;
        for (level, text) in &self.levels {
            map.serialize_entry(&level.to_string(), text)?;
        }
        map.end()
    }
}

/// Hint payload as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedHints {
    /// Title echoed by the model. Informational only; responses use the
    /// title from the request.
    pub problem_title: String,
    pub hints: HintSet,
}

#[derive(Debug, Deserialize)]
struct RawHintPayload {
    problem_title: String,
    hints: HashMap<String, String>,
}

fn code_fence() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\s*```\s*$").ok())
        .as_ref()
}

/// Remove one Markdown code fence wrapping the whole reply, if present.
pub fn strip_code_fence(raw: &str) -> &str {
    match code_fence()
        .and_then(|fence| fence.captures(raw))
        .and_then(|caps| caps.get(1))
    {
        Some(inner) => inner.as_str(),
        None => raw.trim(),
    }
}

/// Parse the model's raw hint reply into [`GeneratedHints`].
///
/// Any parse failure, missing level or blank hint fails the whole payload.
pub fn parse_hint_output(raw: &str) -> Result<GeneratedHints> {
    let body = strip_code_fence(raw);

    let payload: RawHintPayload = serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            response_len = raw.len(),
            response_preview = %raw.chars().take(100).collect::<String>(),
            error = %e,
            "Failed to parse hint JSON"
        );
        CodehintError::MalformedModelOutput(format!("hint reply is not the expected JSON: {e}"))
    })?;

    let mut levels = BTreeMap::new();
    for (key, text) in payload.hints {
        match key.trim().parse::<u8>() {
            Ok(level) => {
                levels.insert(level, text);
            }
            Err(_) => tracing::debug!(key = %key, "Ignoring non-numeric hint key"),
        }
    }

    Ok(GeneratedHints {
        problem_title: payload.problem_title,
        hints: HintSet::from_levels(levels)?,
    })
}
