//! Support for creating the RSS 2.0 feed from a list of posts.

use crate::config::Config;
use crate::post::Post;
use chrono::{TimeZone, Utc};
use rss::validation::{Validate, ValidationError};
use rss::{Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use std::fmt;
use std::io::Write;

/// Creates the feed for a sorted list of [`Post`]s and writes it to a
/// [`std::io::Write`]. The channel is validated before writing and holds
/// at most `config.feed_max_items` items, the most recent ones.
pub fn write_feed<W: Write>(config: &Config, posts: &[Post], writer: W) -> Result<()> {
    let channel = channel(config, posts);
    channel.validate()?;
    channel.write_to(writer)?;
    Ok(())
}

fn channel(config: &Config, posts: &[Post]) -> Channel {
    // posts arrive most-recent-first, so taking the head takes the
    // newest items
    let items: Vec<Item> = posts
        .iter()
        .take(config.feed_max_items)
        .map(item)
        .collect();

    ChannelBuilder::default()
        .title(config.site_title.clone())
        .link(config.blog_url().to_string())
        .description(config.site_description.clone())
        .language("en-us".to_string())
        .generator("optiblog".to_string())
        .items(items)
        .build()
}

fn item(post: &Post) -> Item {
    let link = post.url.to_string();
    ItemBuilder::default()
        .title(post.title.clone())
        .link(link.clone())
        .guid(GuidBuilder::default().permalink(true).value(link).build())
        .description(post.excerpt())
        .pub_date(pub_date(post))
        .build()
}

fn pub_date(post: &Post) -> String {
    // midnight always exists
    let midnight = post.date.and_hms_opt(0, 0, 0).unwrap();
    Utc.from_utc_datetime(&midnight).to_rfc2822()
}

/// The result of a fallible feed operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating or writing the feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when the assembled channel is not valid RSS 2.0.
    Validation(ValidationError),

    /// Returned when serializing or writing the channel fails.
    Rss(rss::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Validation(err) => err.fmt(f),
            Error::Rss(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Validation(err) => Some(err),
            Error::Rss(err) => Some(err),
        }
    }
}

impl From<ValidationError> for Error {
    /// Converts [`ValidationError`]s into [`Error`]. This allows us to use
    /// the `?` operator in fallible feed operations.
    fn from(err: ValidationError) -> Error {
        Error::Validation(err)
    }
}

impl From<rss::Error> for Error {
    /// Converts [`rss::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: rss::Error) -> Error {
        Error::Rss(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::{build_posts, RawDocument};

    fn posts(count: usize) -> Vec<Post> {
        let config = Config::example();
        let documents: Vec<RawDocument> = (0..count)
            .map(|i| RawDocument {
                file_name: format!("post-{:02}.md", i),
                text: format!(
                    "---\ntitle: Post {i}\ndate: 2024-{:02}-{:02}\ndescription: Summary {i}\n---\nbody",
                    i / 28 + 1,
                    i % 28 + 1,
                    i = i
                ),
            })
            .collect();
        build_posts(&config, &documents).unwrap()
    }

    #[test]
    fn test_caps_at_max_items() {
        let config = Config::example();
        let channel = channel(&config, &posts(50));
        assert_eq!(channel.items().len(), 20);
    }

    #[test]
    fn test_keeps_the_most_recent() {
        let config = Config::example();
        let channel = channel(&config, &posts(50));
        // post 49 has the latest date
        assert_eq!(channel.items()[0].title(), Some("Post 49"));
        assert!(channel.items()[0]
            .pub_date()
            .unwrap()
            .contains("2024 00:00:00"));
    }

    #[test]
    fn test_item_fields() {
        let config = Config::example();
        let channel = channel(&config, &posts(1));
        let item = &channel.items()[0];
        assert_eq!(item.title(), Some("Post 0"));
        assert_eq!(
            item.link(),
            Some("https://optiscale360.com/blog/post-00/")
        );
        assert_eq!(item.description(), Some("Summary 0"));
        let guid = item.guid().unwrap();
        assert!(guid.is_permalink());
        assert_eq!(guid.value(), "https://optiscale360.com/blog/post-00/");
    }

    #[test]
    fn test_channel_validates_and_writes() {
        let config = Config::example();
        let mut buffer = Vec::new();
        write_feed(&config, &posts(3), &mut buffer).unwrap();
        let xml = String::from_utf8(buffer).unwrap();
        assert!(xml.contains("<rss"));
        assert_eq!(xml.matches("<item>").count(), 3);
    }
}
