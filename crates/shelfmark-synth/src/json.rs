use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::SynthesisError;

/// Parse a JSON object out of loosely formatted model output.
///
/// Tries, in order: the whole text, the first brace-balanced object (models
/// like to wrap JSON in markdown fences or prose), and that object with
/// trailing commas removed.
pub fn parse_llm_json_object<T: for<'de> Deserialize<'de>>(text: &str) -> Result<T, SynthesisError> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str(trimmed) {
        return Ok(v);
    }

    let candidate = first_object(trimmed)?;
    match serde_json::from_str(candidate) {
        Ok(v) => Ok(v),
        Err(first_err) => {
            let fixed = strip_trailing_commas(candidate);
            serde_json::from_str(&fixed)
                .map_err(|_| SynthesisError::NotJson(format!("invalid JSON: {first_err}")))
        }
    }
}

/// First complete `{...}` substring, balancing braces outside strings.
fn first_object(text: &str) -> Result<&str, SynthesisError> {
    let Some(start) = text.find('{') else {
        return Err(SynthesisError::NotJson("no '{' found".into()));
    };

    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escape = false;

    for (idx, ch) in text.char_indices().skip_while(|(i, _)| *i < start) {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[start..=idx]);
                }
            }
            _ => {}
        }
    }

    // Unbalanced: take up to the last brace for a useful parse error.
    match text.rfind('}') {
        Some(end) if end > start => Ok(&text[start..=end]),
        _ => Err(SynthesisError::NotJson("no '}' found".into())),
    }
}

fn strip_trailing_commas(text: &str) -> String {
    static TRAILING: OnceLock<Option<Regex>> = OnceLock::new();
    match TRAILING
        .get_or_init(|| Regex::new(r",\s*([}\]])").ok())
        .as_ref()
    {
        Some(re) => re.replace_all(text, "$1").into_owned(),
        None => text.to_string(),
    }
}
