//! Responsible for templating and writing HTML pages to disk from
//! [`Post`] sources.
//!
//! Post pages land at `{output_dir}/{slug}/index.html` so the published
//! site serves clean `/blog/{slug}/` URLs; the listing page lands at
//! `{output_dir}/index.html`.

use crate::config::Config;
use crate::markdown;
use crate::post::Post;
use crate::schema;
use gtmpl::{Template, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io;

/// Writes post and index pages through the parsed templates.
pub struct Writer<'a> {
    /// The template for post pages.
    pub post_template: &'a Template,

    /// The template for the index page.
    pub index_template: &'a Template,

    pub config: &'a Config,
}

impl Writer<'_> {
    /// Templates one post page and writes it as
    /// `{output_dir}/{slug}/index.html`.
    pub fn write_post_page(&self, post: &Post) -> Result<()> {
        let dir = self.config.output_dir.join(&post.slug);
        std::fs::create_dir_all(&dir)?;
        let mut file = File::create(dir.join("index.html"))?;
        self.post_template.execute(
            &mut file,
            // object values always convert
            &gtmpl::Context::from(self.post_value(post)).unwrap(),
        )?;
        Ok(())
    }

    /// Templates the listing page and writes it as
    /// `{output_dir}/index.html`.
    pub fn write_index_page(&self, posts: &[Post]) -> Result<()> {
        let mut file = File::create(self.config.output_dir.join("index.html"))?;
        self.index_template.execute(
            &mut file,
            &gtmpl::Context::from(self.index_value(posts)).unwrap(),
        )?;
        Ok(())
    }

    fn site_fields(&self, m: &mut HashMap<String, Value>) {
        m.insert(
            "site_title".to_owned(),
            Value::String(self.config.site_title.clone()),
        );
        m.insert(
            "site_description".to_owned(),
            Value::String(self.config.site_description.clone()),
        );
        m.insert(
            "home_url".to_owned(),
            Value::String(self.config.base_url.to_string()),
        );
        m.insert(
            "blog_url".to_owned(),
            Value::String(self.config.blog_url().to_string()),
        );
        m.insert(
            "feed_url".to_owned(),
            Value::String(self.config.feed_url().to_string()),
        );
    }

    fn post_value(&self, post: &Post) -> Value {
        let mut value = post.to_value();
        if let Value::Object(m) = &mut value {
            self.site_fields(m);
            m.insert(
                "body".to_owned(),
                Value::String(markdown::to_html(&post.body)),
            );
            m.insert(
                "toc".to_owned(),
                match markdown::table_of_contents(&post.body) {
                    Some(toc) => Value::String(toc),
                    None => Value::Nil,
                },
            );
            m.insert(
                "json_ld".to_owned(),
                Value::String(schema::script_blocks(&schema::json_ld(post, self.config))),
            );

            let url = urlencoding::encode(post.url.as_str()).into_owned();
            let title = urlencoding::encode(&post.title).into_owned();
            m.insert(
                "share_x".to_owned(),
                Value::String(format!(
                    "https://twitter.com/intent/tweet?url={}&text={}",
                    url, title
                )),
            );
            m.insert(
                "share_linkedin".to_owned(),
                Value::String(format!(
                    "https://www.linkedin.com/sharing/share-offsite/?url={}",
                    url
                )),
            );
            m.insert(
                "share_facebook".to_owned(),
                Value::String(format!(
                    "https://www.facebook.com/sharer/sharer.php?u={}",
                    url
                )),
            );
        }
        value
    }

    fn index_value(&self, posts: &[Post]) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        self.site_fields(&mut m);
        m.insert(
            "posts".to_owned(),
            Value::Array(posts.iter().map(Post::to_value).collect()),
        );
        m.insert("categories".to_owned(), categories(posts));
        Value::Object(m)
    }
}

/// The distinct categories of `posts` in order of first appearance
/// (i.e. most recent post first), deduplicated by canonical slug.
fn categories(posts: &[Post]) -> Value {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut values = Vec::new();
    for post in posts {
        if let Some(category) = &post.category {
            if seen.insert(&category.slug) {
                let mut m: HashMap<String, Value> = HashMap::new();
                m.insert("name".to_owned(), Value::String(category.name.clone()));
                m.insert("slug".to_owned(), Value::String(category.slug.clone()));
                values.push(Value::Object(m));
            }
        }
    }
    Value::Array(values)
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`].
    /// This allows us to use the `?` operator for fallible template
    /// operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::{build_posts, RawDocument};

    fn fixture_posts(texts: &[(&str, &str)]) -> Vec<Post> {
        let config = Config::example();
        let documents: Vec<RawDocument> = texts
            .iter()
            .map(|(file_name, text)| RawDocument {
                file_name: (*file_name).to_owned(),
                text: (*text).to_owned(),
            })
            .collect();
        build_posts(&config, &documents).unwrap()
    }

    #[test]
    fn test_categories_deduplicate_by_slug() {
        let posts = fixture_posts(&[
            ("a.md", "---\ntitle: A\ndate: 2025-03-01\ncategory: AI & ML\n---\nbody"),
            ("b.md", "---\ntitle: B\ndate: 2025-02-01\ncategory: ai-ml\n---\nbody"),
            ("c.md", "---\ntitle: C\ndate: 2025-01-01\ncategory: Growth\n---\nbody"),
        ]);
        match categories(&posts) {
            Value::Array(values) => {
                assert_eq!(values.len(), 2);
                match &values[0] {
                    Value::Object(m) => {
                        // the most recent spelling wins the display name
                        assert_string(&m["name"], "AI & ML");
                        assert_string(&m["slug"], "ai-ml");
                    }
                    other => panic!("expected an object, got {:?}", other),
                }
            }
            other => panic!("expected an array, got {:?}", other),
        }
    }

    fn assert_string(value: &Value, wanted: &str) {
        match value {
            Value::String(s) => assert_eq!(s, wanted),
            other => panic!("expected string `{}`, got {:?}", wanted, other),
        }
    }

    #[test]
    fn test_post_value_fields() {
        let config = Config::example();
        let post_template = Template::default();
        let index_template = Template::default();
        let writer = Writer {
            post_template: &post_template,
            index_template: &index_template,
            config: &config,
        };
        let posts = fixture_posts(&[(
            "hello-world.md",
            "---\ntitle: Hello World\ndate: 2025-01-16\n---\n## Section\n\ntext",
        )]);

        match writer.post_value(&posts[0]) {
            Value::Object(m) => {
                assert_string(&m["date"], "January 16, 2025");
                assert_string(&m["reading_time"], "1 min read");
                match &m["body"] {
                    Value::String(body) => {
                        assert!(body.contains(r#"<h2 id="section">"#))
                    }
                    other => panic!("expected a string body, got {:?}", other),
                }
                match &m["toc"] {
                    Value::String(toc) => assert!(toc.contains("#section")),
                    other => panic!("expected a TOC, got {:?}", other),
                }
                match &m["share_x"] {
                    Value::String(share) => {
                        assert!(share.contains("url=https%3A%2F%2Foptiscale360.com%2Fblog%2Fhello-world%2F"));
                        assert!(share.contains("text=Hello%20World"));
                    }
                    other => panic!("expected a share link, got {:?}", other),
                }
            }
            other => panic!("expected an object, got {:?}", other),
        }
    }
}
