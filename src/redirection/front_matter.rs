//! Front matter extraction.
//!
//! A front matter block is the YAML between a leading `---` line and the
//! next `---` line. Whatever follows is the document body, which the
//! redirection loader ignores (it is free-form notes for operators).

use thiserror::Error;

const FENCE: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontMatterError {
    #[error("file does not start with a '---' front matter fence")]
    Missing,

    #[error("front matter is not closed by a '---' line")]
    Unterminated,
}

fn is_fence(line: &str) -> bool {
    line.trim_end() == FENCE
}

/// Split `content` into `(front_matter, body)`.
pub fn split(content: &str) -> Result<(&str, &str), FrontMatterError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut lines = content.split_inclusive('\n');
    let opening = lines.next().ok_or(FrontMatterError::Missing)?;
    if !is_fence(opening) {
        return Err(FrontMatterError::Missing);
    }

    let start = opening.len();
    let mut offset = start;
    for line in lines {
        if is_fence(line) {
            return Ok((&content[start..offset], &content[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated)
}
