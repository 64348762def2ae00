//! Defines the [`Post`] model and the logic for reading source documents
//! from the posts directory into memory.
//!
//! A build reads every document once, excludes drafts before anything is
//! rendered, and sorts the survivors by date, most recent first. Posts
//! with missing or unparsable dates are pinned to 1970-01-01 so they sort
//! as the oldest.

use crate::config::Config;
use crate::frontmatter::{parse_document, FrontMatter};
use crate::{log, warn};
use chrono::NaiveDate;
use gtmpl::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs::{read_dir, File};
use std::io;
use std::io::Read;
use std::path::{Path, PathBuf};
use url::Url;

/// File extensions recognized as post sources.
const CONTENT_EXTENSIONS: &[&str] = &[".md", ".markdown", ".html"];

/// Characters in the derived excerpt when no description is given.
const EXCERPT_CHARS: usize = 160;

/// A source file read into memory, not yet parsed.
pub struct RawDocument {
    pub file_name: String,
    pub text: String,
}

/// A category label together with its canonical slug. The slug is what
/// the listing page and the filter buttons key on, so variants like
/// `AI & ML` and `ai-ml` collapse to the same filter.
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub name: String,
    pub slug: String,
}

impl Category {
    pub fn new(name: &str) -> Category {
        Category {
            name: name.to_owned(),
            slug: slug::slugify(name),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub name: String,
    pub text: String,
}

/// A non-draft post, ready to render.
pub struct Post {
    /// Derived from the source file stem; also the output directory name
    /// and the last segment of the canonical URL.
    pub slug: String,

    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub author: Option<String>,
    pub category: Option<Category>,
    pub tags: Vec<String>,
    pub image: Option<String>,

    /// The `type` front-matter key (e.g. `how-to`).
    pub kind: Option<String>,

    /// The `schema` front-matter key.
    pub schema: Option<String>,

    pub faqs: Vec<Faq>,
    pub steps: Vec<Step>,

    /// Raw Markdown/HTML body.
    pub body: String,

    pub reading_minutes: u32,

    /// Canonical URL, `{base_url}blog/{slug}/`.
    pub url: Url,

    /// Source file name, kept for warnings and error messages.
    pub source_file: String,
}

/// Reads every recognized document in `directory`, sorted by file name so
/// that date ties and collision reports are deterministic across
/// platforms.
pub fn read_documents(directory: &Path) -> Result<Vec<RawDocument>> {
    let entries = match read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::MissingPostsDirectory(directory.to_owned()));
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let mut documents = Vec::new();
    for result in entries {
        let entry = result?;
        let os_file_name = entry.file_name();
        let file_name = os_file_name.to_string_lossy();
        if content_stem(&file_name).is_none() || !entry.file_type()?.is_file() {
            continue;
        }
        let mut text = String::new();
        File::open(entry.path())?.read_to_string(&mut text)?;
        documents.push(RawDocument {
            file_name: file_name.into_owned(),
            text,
        });
    }
    documents.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(documents)
}

/// Builds [`Post`]s from raw documents: parses front matter, drops
/// drafts, rejects slug collisions, and sorts by date descending.
pub fn build_posts(config: &Config, documents: &[RawDocument]) -> Result<Vec<Post>> {
    let mut posts: Vec<Post> = Vec::new();
    let mut seen: HashMap<String, String> = HashMap::new();

    for document in documents {
        let parsed = parse_document(&document.file_name, &document.text);
        let front = FrontMatter::from_document(&document.file_name, &parsed);
        if front.is_draft() {
            log!("posts"; "skipping draft {}", document.file_name);
            continue;
        }

        let post = Post::build(config, &document.file_name, front, parsed.body);
        if let Some(first) = seen.get(&post.slug) {
            return Err(Error::SlugCollision {
                slug: post.slug.clone(),
                first: first.clone(),
                second: document.file_name.clone(),
            });
        }
        seen.insert(post.slug.clone(), document.file_name.clone());
        posts.push(post);
    }

    // stable sort: posts sharing a date keep file-name order
    posts.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(posts)
}

impl Post {
    fn build(config: &Config, file_name: &str, front: FrontMatter, body: String) -> Post {
        // content_stem is Some for every file read_documents admits
        let stem = content_stem(file_name).unwrap_or(file_name);
        let slug = slug::slugify(stem);

        let title = match front.title {
            Some(title) => title,
            None => {
                warn!("posts"; "{}: missing title; using slug", file_name);
                slug.clone()
            }
        };

        Post {
            url: config.post_url(&slug),
            title,
            description: front.description,
            date: parse_date(file_name, front.date.as_deref()),
            author: front.author,
            category: front.category.as_deref().map(Category::new),
            tags: front.tags,
            image: front.image,
            kind: front.kind,
            schema: front.schema,
            faqs: front
                .faqs
                .iter()
                .filter_map(|raw| split_pair(file_name, "faqs", raw))
                .map(|(question, answer)| Faq { question, answer })
                .collect(),
            steps: front
                .steps
                .iter()
                .filter_map(|raw| split_pair(file_name, "steps", raw))
                .map(|(name, text)| Step { name, text })
                .collect(),
            reading_minutes: reading_minutes(&body),
            body,
            slug,
            source_file: file_name.to_owned(),
        }
    }

    /// The front-matter description, or the first [`EXCERPT_CHARS`]
    /// characters of the markup-stripped body.
    pub fn excerpt(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => derived_excerpt(&self.body),
        }
    }

    /// Converts a [`Post`] into a template [`Value`] carrying the fields
    /// shared by post pages and index cards.
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("slug".to_owned(), Value::String(self.slug.clone()));
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert("description".to_owned(), Value::String(self.excerpt()));
        m.insert("excerpt".to_owned(), Value::String(self.excerpt()));
        m.insert("date".to_owned(), Value::String(long_date(self.date)));
        m.insert(
            "date_iso".to_owned(),
            Value::String(self.date.format("%Y-%m-%d").to_string()),
        );
        m.insert(
            "reading_time".to_owned(),
            Value::String(format!("{} min read", self.reading_minutes)),
        );
        m.insert("url".to_owned(), Value::String(self.url.to_string()));
        m.insert(
            "category".to_owned(),
            match &self.category {
                Some(category) => Value::String(category.name.clone()),
                None => Value::Nil,
            },
        );
        m.insert(
            "category_slug".to_owned(),
            Value::String(
                self.category
                    .as_ref()
                    .map(|c| c.slug.clone())
                    .unwrap_or_default(),
            ),
        );
        m.insert(
            "tags".to_owned(),
            Value::Array(
                self.tags
                    .iter()
                    .map(|tag| Value::String(tag.clone()))
                    .collect(),
            ),
        );
        Value::Object(m)
    }
}

/// `max(1, ceil(words / 200))` over a whitespace-tokenized word count.
/// Markup is counted as words; the observable reading times depend on it.
pub fn reading_minutes(body: &str) -> u32 {
    let words = body.split_whitespace().count() as u32;
    ((words + 199) / 200).max(1)
}

/// Formats a date the way post pages and index cards display it, e.g.
/// `January 16, 2025`.
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn content_stem(file_name: &str) -> Option<&str> {
    CONTENT_EXTENSIONS
        .iter()
        .find_map(|extension| file_name.strip_suffix(extension))
}

fn parse_date(file_name: &str, date: Option<&str>) -> NaiveDate {
    // 1970-01-01 is a valid date
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    match date {
        None => {
            warn!("posts"; "{}: missing date; sorting as oldest", file_name);
            epoch
        }
        Some(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                warn!("posts"; "{}: unparsable date `{}`; sorting as oldest", file_name, s);
                epoch
            }
        },
    }
}

fn split_pair(file_name: &str, key: &str, raw: &str) -> Option<(String, String)> {
    match raw.split_once('|') {
        Some((left, right)) => Some((left.trim().to_owned(), right.trim().to_owned())),
        None => {
            warn!(
                "posts";
                "{}: `{}` entry without a `|` separator: `{}`",
                file_name, key, raw
            );
            None
        }
    }
}

fn derived_excerpt(body: &str) -> String {
    let mut stripped = String::with_capacity(body.len());
    let mut in_tag = false;
    for c in body.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            '#' | '*' | '`' | '_' | '[' | ']' => {}
            _ => stripped.push(c),
        }
    }
    let flattened = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    flattened.chars().take(EXCERPT_CHARS).collect()
}

/// Represents the result of a post-reading operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading posts from the source directory.
#[derive(Debug)]
pub enum Error {
    /// Returned when the posts directory does not exist.
    MissingPostsDirectory(PathBuf),

    /// Returned when two source files normalize to the same slug.
    SlugCollision {
        slug: String,
        first: String,
        second: String,
    },

    /// Returned for other I/O errors.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingPostsDirectory(path) => {
                write!(f, "posts directory `{}` does not exist", path.display())
            }
            Error::SlugCollision {
                slug,
                first,
                second,
            } => write!(
                f,
                "`{}` and `{}` both normalize to slug `{}`",
                first, second, slug
            ),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingPostsDirectory(_) => None,
            Error::SlugCollision { .. } => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    /// Converts a [`io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for fallible I/O functions.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn document(file_name: &str, text: &str) -> RawDocument {
        RawDocument {
            file_name: file_name.to_owned(),
            text: text.to_owned(),
        }
    }

    #[test]
    fn test_reading_minutes_minimum_one() {
        assert_eq!(reading_minutes(""), 1);
        assert_eq!(reading_minutes("one two three"), 1);
    }

    #[test]
    fn test_reading_minutes_rounds_up() {
        let words = vec!["word"; 201].join(" ");
        assert_eq!(reading_minutes(&words), 2);
        let words = vec!["word"; 400].join(" ");
        assert_eq!(reading_minutes(&words), 2);
        let words = vec!["word"; 401].join(" ");
        assert_eq!(reading_minutes(&words), 3);
    }

    #[test]
    fn test_markup_counts_as_words() {
        // two markup tokens + one word
        assert_eq!(reading_minutes("<p> hello </p>"), 1);
        let tokens = vec!["<br>"; 250].join(" ");
        assert_eq!(reading_minutes(&tokens), 2);
    }

    #[test]
    fn test_slug_from_file_name() {
        let config = Config::example();
        let posts = build_posts(
            &config,
            &[document("Hello, World!.md", "---\ntitle: T\ndate: 2025-01-16\n---\nbody")],
        )
        .unwrap();
        assert_eq!(posts[0].slug, "hello-world");
        assert_eq!(
            posts[0].url.as_str(),
            "https://optiscale360.com/blog/hello-world/"
        );
    }

    #[test]
    fn test_drafts_are_excluded() {
        let config = Config::example();
        let posts = build_posts(
            &config,
            &[
                document("draft.md", "---\ntitle: D\ndraft: true\n---\nbody"),
                document("live.md", "---\ntitle: L\ndate: 2025-01-16\n---\nbody"),
            ],
        )
        .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "live");
    }

    #[test]
    fn test_sorted_most_recent_first() {
        let config = Config::example();
        let posts = build_posts(
            &config,
            &[
                document("a.md", "---\ntitle: A\ndate: 2024-01-01\n---\nbody"),
                document("b.md", "---\ntitle: B\ndate: 2025-06-15\n---\nbody"),
                document("c.md", "---\ntitle: C\ndate: 2023-12-31\n---\nbody"),
            ],
        )
        .unwrap();
        let dates: Vec<String> = posts
            .iter()
            .map(|p| p.date.format("%Y-%m-%d").to_string())
            .collect();
        assert_eq!(dates, vec!["2025-06-15", "2024-01-01", "2023-12-31"]);
    }

    #[test]
    fn test_unparsable_date_sorts_oldest() {
        let config = Config::example();
        let posts = build_posts(
            &config,
            &[
                document("bad.md", "---\ntitle: B\ndate: next tuesday\n---\nbody"),
                document("old.md", "---\ntitle: O\ndate: 2001-01-01\n---\nbody"),
            ],
        )
        .unwrap();
        assert_eq!(posts.last().unwrap().slug, "bad");
        assert_eq!(
            posts.last().unwrap().date,
            NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_slug_collision_fails_the_build() {
        let config = Config::example();
        let result = build_posts(
            &config,
            &[
                document("Hello World.md", "---\ntitle: A\n---\nbody"),
                document("hello-world.md", "---\ntitle: B\n---\nbody"),
            ],
        );
        match result {
            Err(Error::SlugCollision { slug, .. }) => assert_eq!(slug, "hello-world"),
            other => panic!("expected a slug collision, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_malformed_front_matter_degrades_to_body() {
        let config = Config::example();
        let posts = build_posts(
            &config,
            &[document("broken.md", "---\ntitle: never closed\nbody text here")],
        )
        .unwrap();
        assert_eq!(posts.len(), 1);
        // the whole file, fence included, became the body
        assert!(posts[0].body.starts_with("---"));
        assert_eq!(posts[0].title, "broken");
    }

    #[test]
    fn test_faq_and_step_pairs() {
        let config = Config::example();
        let posts = build_posts(
            &config,
            &[document(
                "howto.md",
                "---\ntitle: T\ntype: how-to\nfaqs: [\"Q1|A1\", \"no separator\"]\nsteps: [\"Audit|Crawl the site\"]\n---\nbody",
            )],
        )
        .unwrap();
        assert_eq!(
            posts[0].faqs,
            vec![Faq {
                question: "Q1".to_owned(),
                answer: "A1".to_owned()
            }]
        );
        assert_eq!(
            posts[0].steps,
            vec![Step {
                name: "Audit".to_owned(),
                text: "Crawl the site".to_owned()
            }]
        );
    }

    #[test]
    fn test_category_slug_is_canonical() {
        assert_eq!(Category::new("AI & ML").slug, "ai-ml");
        assert_eq!(Category::new("ai-ml").slug, "ai-ml");
        assert_eq!(Category::new("Technical SEO").slug, "technical-seo");
    }

    #[test]
    fn test_excerpt_prefers_description() {
        let config = Config::example();
        let posts = build_posts(
            &config,
            &[document(
                "a.md",
                "---\ntitle: T\ndescription: \"The summary.\"\n---\n# Heading\n\nBody text.",
            )],
        )
        .unwrap();
        assert_eq!(posts[0].excerpt(), "The summary.");
    }

    #[test]
    fn test_derived_excerpt_strips_markup() {
        let excerpt = derived_excerpt("## Heading\n\nSome **bold** text with <em>markup</em>.");
        assert_eq!(excerpt, "Heading Some bold text with markup.");
    }

    #[test]
    fn test_long_date_format() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        assert_eq!(long_date(date), "January 16, 2025");
        let date = NaiveDate::from_ymd_opt(2025, 6, 5).unwrap();
        assert_eq!(long_date(date), "June 5, 2025");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        match read_documents(Path::new("/nonexistent/posts")) {
            Err(Error::MissingPostsDirectory(path)) => {
                assert_eq!(path, PathBuf::from("/nonexistent/posts"))
            }
            _ => panic!("expected MissingPostsDirectory"),
        }
    }
}
