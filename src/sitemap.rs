//! Sitemap generation.
//!
//! Enumerates the homepage, the configured static top-level pages, the
//! blog index, and every published post. `lastmod` is the build date and
//! is the only field allowed to differ between two builds of the same
//! input; posts carry a lower priority than the top-level pages.

use crate::config::Config;
use crate::post::Post;
use chrono::NaiveDate;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

/// XML namespace for sitemaps.
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// The sitemap as an ordered list of URL entries.
pub struct Sitemap {
    urls: Vec<UrlEntry>,
}

struct UrlEntry {
    loc: String,
    lastmod: String,
    changefreq: &'static str,
    priority: &'static str,
}

impl Sitemap {
    /// Assembles the entry list for a build dated `build_date`.
    pub fn new(config: &Config, posts: &[Post], build_date: NaiveDate) -> Sitemap {
        let lastmod = build_date.format("%Y-%m-%d").to_string();
        let mut urls = vec![UrlEntry {
            loc: config.base_url.to_string(),
            lastmod: lastmod.clone(),
            changefreq: "weekly",
            priority: "1.0",
        }];
        for page in &config.static_pages {
            urls.push(UrlEntry {
                loc: config.page_url(page).to_string(),
                lastmod: lastmod.clone(),
                changefreq: "monthly",
                priority: "0.8",
            });
        }
        urls.push(UrlEntry {
            loc: config.blog_url().to_string(),
            lastmod: lastmod.clone(),
            changefreq: "weekly",
            priority: "0.8",
        });
        for post in posts {
            urls.push(UrlEntry {
                loc: post.url.to_string(),
                lastmod: lastmod.clone(),
                changefreq: "monthly",
                priority: "0.6",
            });
        }
        Sitemap { urls }
    }

    /// Generates the sitemap XML document.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{}">"#, SITEMAP_NS));
        xml.push('\n');

        for entry in &self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod));
            xml.push_str(&format!(
                "    <changefreq>{}</changefreq>\n",
                entry.changefreq
            ));
            xml.push_str(&format!("    <priority>{}</priority>\n", entry.priority));
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Writes `sitemap.xml` into the configured sitemap directory and
    /// returns its path.
    pub fn write(&self, config: &Config) -> Result<PathBuf> {
        let path = config.sitemap_dir.join("sitemap.xml");
        fs::create_dir_all(&config.sitemap_dir).map_err(|err| Error {
            path: path.clone(),
            err,
        })?;
        fs::write(&path, self.to_xml()).map_err(|err| Error {
            path: path.clone(),
            err,
        })?;
        Ok(path)
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// The result of a fallible sitemap-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// An I/O error writing the sitemap, annotated with the target path.
#[derive(Debug)]
pub struct Error {
    pub path: PathBuf,
    pub err: io::Error,
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "writing sitemap `{}`: {}", self.path.display(), self.err)
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.err)
    }
}
