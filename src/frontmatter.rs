//! Front-matter extraction and the typed [`FrontMatter`] record.
//!
//! A post document is split into a metadata block and a body by a fence
//! convention: a line containing only `---` at the very start of the file,
//! then a second such line. Everything after the second fence is body. A
//! document without the fence pair is treated as all body with empty
//! metadata.
//!
//! The metadata grammar is deliberately minimal and is *not* YAML: one
//! `key: value` pair per line, where the value is either a quoted string
//! (single or double quotes stripped), a `[a, "b", c]` bracketed array
//! (each element quote-stripped), or a bare scalar kept exactly as
//! written. There is no type coercion, no nested mappings, no block
//! scalars, and no comments; callers parse booleans and dates from the
//! string form themselves.

use crate::warn;

const FENCE: &str = "---";

/// A metadata value: a single scalar or a flat list of strings.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

/// A source document split into raw metadata entries and a body.
#[derive(Debug)]
pub struct Document {
    /// Metadata entries in file order. Keys are not deduplicated; the
    /// last occurrence of a key wins when building a [`FrontMatter`].
    pub metadata: Vec<(String, FieldValue)>,

    /// Everything after the closing fence (or the whole file when no
    /// fence pair was found).
    pub body: String,
}

/// Splits `input` into metadata and body and scans the metadata block.
/// Never fails: fence anomalies degrade to "whole document is body" with
/// a warning naming `file_name`.
pub fn parse_document(file_name: &str, input: &str) -> Document {
    match metadata_block(input) {
        Block::Absent => Document {
            metadata: Vec::new(),
            body: input.to_owned(),
        },
        Block::Unterminated => {
            warn!(
                "frontmatter";
                "{}: opening `---` fence has no closing fence; treating whole file as body",
                file_name
            );
            Document {
                metadata: Vec::new(),
                body: input.to_owned(),
            }
        }
        Block::Delimited { metadata, body } => Document {
            metadata: parse_metadata(file_name, metadata),
            body: body.to_owned(),
        },
    }
}

enum Block<'a> {
    /// The file does not start with a fence.
    Absent,

    /// An opening fence without a closing fence.
    Unterminated,

    /// A well-formed fence pair.
    Delimited { metadata: &'a str, body: &'a str },
}

fn metadata_block(input: &str) -> Block {
    let first_line_end = input.find('\n').map(|i| i + 1).unwrap_or_else(|| input.len());
    if input[..first_line_end].trim_end() != FENCE {
        return Block::Absent;
    }

    let rest = &input[first_line_end..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let end = offset + line.len();
        if line.trim_end() == FENCE {
            return Block::Delimited {
                metadata: &rest[..offset],
                body: &rest[end..],
            };
        }
        offset = end;
    }
    Block::Unterminated
}

fn parse_metadata(file_name: &str, block: &str) -> Vec<(String, FieldValue)> {
    let mut entries = Vec::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.find(':') {
            Some(i) => {
                let key = line[..i].trim();
                let value = line[i + 1..].trim();
                entries.push((key.to_owned(), parse_value(value)));
            }
            None => warn!(
                "frontmatter";
                "{}: skipping metadata line without `:`: `{}`",
                file_name, line
            ),
        }
    }
    entries
}

fn parse_value(value: &str) -> FieldValue {
    if value.len() >= 2 && value.starts_with('[') && value.ends_with(']') {
        let inner = value[1..value.len() - 1].trim();
        if inner.is_empty() {
            return FieldValue::List(Vec::new());
        }
        return FieldValue::List(
            inner
                .split(',')
                .map(|element| strip_quotes(element.trim()).to_owned())
                .collect(),
        );
    }
    FieldValue::Scalar(strip_quotes(value).to_owned())
}

fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// The recognized front-matter keys as a typed record. Built from a
/// [`Document`]; unrecognized keys are warned about and dropped rather
/// than passed through silently.
#[derive(Debug, Default, Clone)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub draft: Option<String>,

    /// The `type` key (e.g. `how-to`).
    pub kind: Option<String>,

    /// The `schema` key, a schema.org type name override.
    pub schema: Option<String>,

    /// FAQ entries, one `Question|Answer` string per element.
    pub faqs: Vec<String>,

    /// How-to steps, one `Name|Text` string per element.
    pub steps: Vec<String>,
}

impl FrontMatter {
    pub fn from_document(file_name: &str, document: &Document) -> FrontMatter {
        let mut front = FrontMatter::default();
        for (key, value) in &document.metadata {
            match key.as_str() {
                "title" => front.title = Some(scalar(file_name, key, value)),
                "description" => front.description = Some(scalar(file_name, key, value)),
                "date" => front.date = Some(scalar(file_name, key, value)),
                "author" => front.author = Some(scalar(file_name, key, value)),
                "category" => front.category = Some(scalar(file_name, key, value)),
                "image" => front.image = Some(scalar(file_name, key, value)),
                "draft" => front.draft = Some(scalar(file_name, key, value)),
                "type" => front.kind = Some(scalar(file_name, key, value)),
                "schema" => front.schema = Some(scalar(file_name, key, value)),
                "tags" => front.tags = list(value),
                "faqs" => front.faqs = list(value),
                "steps" => front.steps = list(value),
                other => warn!(
                    "frontmatter";
                    "{}: unrecognized key `{}`",
                    file_name, other
                ),
            }
        }
        front
    }

    /// Draft flag. Values are uncoerced strings, so only the literal
    /// `"true"` marks a draft.
    pub fn is_draft(&self) -> bool {
        self.draft.as_deref() == Some("true")
    }
}

fn scalar(file_name: &str, key: &str, value: &FieldValue) -> String {
    match value {
        FieldValue::Scalar(s) => s.clone(),
        FieldValue::List(items) => {
            warn!(
                "frontmatter";
                "{}: expected a scalar for `{}`, got an array; joining elements",
                file_name, key
            );
            items.join(", ")
        }
    }
}

// A bare scalar where a list is expected reads as a one-element list.
fn list(value: &FieldValue) -> Vec<String> {
    match value {
        FieldValue::Scalar(s) => vec![s.clone()],
        FieldValue::List(items) => items.clone(),
    }
}
