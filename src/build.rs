//! Exports the [`build_site`] function which stitches together the
//! high-level steps of building the output site: reading and modeling the
//! posts ([`crate::post`]), rendering post and index pages
//! ([`crate::write`]), and generating the RSS feed ([`crate::feed`]) and
//! the sitemap ([`crate::sitemap`]).

use crate::config::Config;
use crate::feed::{self, Error as FeedError};
use crate::post::{self, Error as PostError};
use crate::sitemap::{Error as SitemapError, Sitemap};
use crate::write::{Error as WriteError, Writer};
use crate::{log, warn};
use chrono::Utc;
use gtmpl::Template;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

const POST_TEMPLATE: &str = include_str!("../templates/post.html");
const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// Builds the site from a [`Config`] object. This calls into
/// [`post::build_posts`], [`Writer::write_post_page`],
/// [`feed::write_feed`], and [`Sitemap::write`] which do the
/// heavy-lifting.
pub fn build_site(config: &Config) -> Result<()> {
    let documents = post::read_documents(&config.posts_dir)?;
    let mut posts = post::build_posts(config, &documents)?;
    log!("posts"; "{} published posts", posts.len());

    let post_template = load_template(POST_TEMPLATE, &config.post_template)?;
    let index_template = load_template(INDEX_TEMPLATE, &config.index_template)?;

    // Blow away the old output directory so renamed or deleted posts
    // don't leave stale slug directories behind. The sitemap directory is
    // left alone; it may be the site root.
    rmdir(&config.output_dir)?;
    std::fs::create_dir_all(&config.output_dir)?;

    let writer = Writer {
        post_template: &post_template,
        index_template: &index_template,
        config,
    };

    // Render post pages first. A post whose templating fails is dropped
    // from the index, feed, and sitemap with a warning; it must not sink
    // the other posts. I/O failures stay fatal.
    let mut failed: Vec<String> = Vec::new();
    for post in &posts {
        match writer.write_post_page(post) {
            Ok(()) => {}
            Err(WriteError::Template(err)) => {
                warn!("render"; "skipping `{}`: {}", post.source_file, err);
                failed.push(post.slug.clone());
            }
            Err(WriteError::Io(err)) => {
                return Err(Error::Post {
                    slug: post.slug.clone(),
                    err: WriteError::Io(err),
                });
            }
        }
    }
    if !failed.is_empty() {
        posts.retain(|post| !failed.contains(&post.slug));
    }

    writer.write_index_page(&posts)?;
    log!("pages"; "wrote {} post pages and the index", posts.len());

    let feed_path = config.output_dir.join("feed.xml");
    feed::write_feed(config, &posts, File::create(&feed_path)?)?;
    log!("feed"; "{}", feed_path.display());

    let sitemap = Sitemap::new(config, &posts, Utc::now().naive_utc().date());
    let sitemap_path = sitemap.write(config)?;
    log!("sitemap"; "{}", sitemap_path.display());

    Ok(())
}

// Loads the template contents (an override file if configured, the
// embedded default otherwise) and parses them into a template.
fn load_template(embedded: &str, override_path: &Option<PathBuf>) -> Result<Template> {
    let contents = match override_path {
        Some(path) => {
            std::fs::read_to_string(path).map_err(|err| Error::OpenTemplateFile {
                path: path.to_owned(),
                err,
            })?
        }
        None => embedded.to_owned(),
    };

    let mut template = Template::default();
    template
        .parse(&contents)
        .map_err(|e| Error::ParseTemplate(e.to_string()))?;
    Ok(template)
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during post reading,
/// page writing, cleaning the output directory, template loading, feed
/// generation, sitemap writing, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors reading and modeling posts.
    Parse(PostError),

    /// Returned for errors writing the index page to disk as HTML.
    Write(WriteError),

    /// Returned for a fatal error writing one post page.
    Post { slug: String, err: WriteError },

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template override files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for errors writing the feed.
    Feed(FeedError),

    /// Returned for errors writing the sitemap.
    Sitemap(SitemapError),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Post { slug, err } => {
                write!(f, "writing post `{}`: {}", slug, err)
            }
            Error::Clean { path, err } => {
                write!(f, "cleaning directory `{}`: {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "opening template file `{}`: {}", path.display(), err)
            }
            Error::ParseTemplate(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
            Error::Sitemap(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Post { slug: _, err } => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Feed(err) => Some(err),
            Error::Sitemap(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<PostError> for Error {
    /// Converts [`PostError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: PostError) -> Error {
        Error::Parse(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

impl From<SitemapError> for Error {
    /// Converts [`SitemapError`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: SitemapError) -> Error {
        Error::Sitemap(err)
    }
}
