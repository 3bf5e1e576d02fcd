//! TOML front matter between `+++` fences.
//!
//! ```text
//! +++
//! title = "Hello"
//! date = "2024-06-15"
//! +++
//! # Body
//! ```

use serde::Deserialize;
use thiserror::Error;

const FENCE: &str = "+++";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub draft: bool,
}

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("front matter is missing its closing `+++`")]
    Unclosed,

    #[error("invalid front matter")]
    Toml(#[from] toml::de::Error),
}

/// Split a page into front matter and body.
///
/// Pages without an opening fence have default front matter.
pub fn split(text: &str) -> Result<(FrontMatter, &str), FrontMatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = text
        .strip_prefix(FENCE)
        .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
    else {
        return Ok((FrontMatter::default(), text));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let meta = toml::from_str(&rest[..offset])?;
            return Ok((meta, &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unclosed)
}
