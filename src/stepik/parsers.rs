#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::course::TaskFile;

/// A piece of a submission text marked up with placeholder tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `<placeholder>`
    Open,
    /// `</placeholder>`
    Close,
    /// Anything between tags.
    Text(String),
}

peg::parser! {
    /// grammar of old-style submissions, where answers are wrapped in
    /// `<placeholder>` tags.
    pub grammar parser() for str {
        /// matches the opening tag
        rule open() = "<placeholder>"

        /// matches the closing tag
        rule close() = "</placeholder>"

        /// matches text up to the next tag
        rule text() -> String
            = t:$((!(open() / close()) [_])+) { t.to_string() }

        /// matches a tag or a run of text
        rule segment() -> Segment
            = open() { Segment::Open }
            / close() { Segment::Close }
            / t:text() { Segment::Text(t) }

        /// splits a whole text into segments
        pub rule segments() -> Vec<Segment>
            = s:segment()* ![_] { s }
    }
}

/// A placeholder of the file has no matching tag pair in the text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("no placeholder tags for placeholder #{placeholder} in `{file}`")]
pub struct MissingTagError {
    /// Task file name.
    pub file:        String,
    /// 1-based placeholder index.
    pub placeholder: usize,
}

/// Segments of `text`.
fn split(text: &str) -> Vec<Segment> {
    // Every input matches: a lone `<` is plain text.
    parser::segments(text).unwrap_or_else(|_| vec![Segment::Text(text.to_string())])
}

/// `text` with every placeholder tag removed.
pub fn strip_tags(text: &str) -> String {
    split(text)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Text(t) => Some(t),
            _ => None,
        })
        .collect()
}

/// Sets the offset and length of each placeholder of `file` from the tag pairs
/// in `text`, matched in order.
///
/// Offsets count characters of the text with all tags stripped. Tags past the
/// last placeholder are ignored.
pub fn set_placeholders_from_tags(file: &mut TaskFile, text: &str) -> Result<(), MissingTagError> {
    let mut spans = Vec::with_capacity(file.placeholders.len());
    let mut position = 0;
    let mut open = None;

    for segment in split(text) {
        if spans.len() == file.placeholders.len() {
            break;
        }
        match segment {
            Segment::Text(t) => position += t.chars().count(),
            Segment::Open if open.is_none() => open = Some(position),
            Segment::Close => {
                if let Some(start) = open.take() {
                    spans.push((start, position - start));
                }
            }
            Segment::Open => {}
        }
    }

    if spans.len() < file.placeholders.len() {
        return Err(MissingTagError {
            file:        file.name.clone(),
            placeholder: spans.len() + 1,
        });
    }
    for (placeholder, (offset, length)) in file.placeholders.iter_mut().zip(spans) {
        placeholder.offset = offset;
        placeholder.length = length;
    }
    Ok(())
}
