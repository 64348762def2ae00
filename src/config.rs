//! Project configuration, loaded from `optiblog.yaml`.
//!
//! [`Config::from_directory`] searches the given directory and its parents
//! for the project file, so the build can be invoked from anywhere inside
//! the project tree. All relative paths in the file are resolved against
//! the directory containing it.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

const CONFIG_FILE: &str = "optiblog.yaml";

#[derive(Deserialize)]
struct MaxItems(usize);
impl Default for MaxItems {
    fn default() -> Self {
        MaxItems(20)
    }
}

#[derive(Deserialize)]
struct SiteSection {
    title: String,

    #[serde(default)]
    description: String,

    base_url: Url,

    #[serde(default)]
    author: Option<String>,
}

#[derive(Deserialize)]
struct OrganizationSection {
    name: String,

    #[serde(default)]
    url: Option<Url>,

    #[serde(default)]
    logo: Option<String>,

    #[serde(default)]
    contact_email: Option<String>,
}

#[derive(Deserialize, Default)]
struct PathsSection {
    #[serde(default)]
    posts_dir: Option<PathBuf>,

    #[serde(default)]
    output_dir: Option<PathBuf>,

    #[serde(default)]
    sitemap_dir: Option<PathBuf>,

    #[serde(default)]
    static_pages: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
struct FeedSection {
    #[serde(default)]
    max_items: MaxItems,
}

#[derive(Deserialize, Default)]
struct ThemeSection {
    #[serde(default)]
    post_template: Option<PathBuf>,

    #[serde(default)]
    index_template: Option<PathBuf>,
}

#[derive(Deserialize)]
struct ProjectFile {
    site: SiteSection,

    #[serde(default)]
    organization: Option<OrganizationSection>,

    #[serde(default)]
    paths: PathsSection,

    #[serde(default)]
    feed: FeedSection,

    #[serde(default)]
    theme: ThemeSection,
}

/// Static agency metadata for the Organization JSON-LD object.
pub struct Organization {
    pub name: String,
    pub url: Url,
    pub logo: Option<String>,
    pub contact_email: Option<String>,
}

/// Resolved build configuration.
pub struct Config {
    pub site_title: String,
    pub site_description: String,

    /// Site root, always normalized with a trailing slash so that
    /// [`Url::join`] treats it as a directory.
    pub base_url: Url,

    pub author: Option<String>,
    pub organization: Organization,

    /// Directory of post source documents.
    pub posts_dir: PathBuf,

    /// Directory receiving post pages, the index page, and the feed.
    pub output_dir: PathBuf,

    /// Directory receiving `sitemap.xml`.
    pub sitemap_dir: PathBuf,

    /// Top-level page paths (relative to the site root) listed in the
    /// sitemap alongside the homepage and posts.
    pub static_pages: Vec<String>,

    pub feed_max_items: usize,

    /// Optional overrides for the embedded page templates.
    pub post_template: Option<PathBuf>,
    pub index_template: Option<PathBuf>,
}

impl Config {
    /// Searches `dir` and its parents for `optiblog.yaml`.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(anyhow!(
                    "could not find `{}` in any parent directory",
                    CONFIG_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let file = File::open(path)
            .map_err(|e| anyhow!("opening config file `{}`: {}", path.display(), e))?;
        let project: ProjectFile = serde_yaml::from_reader(file)
            .map_err(|e| anyhow!("parsing config file `{}`: {}", path.display(), e))?;
        let root = path
            .parent()
            .ok_or_else(|| anyhow!("config file `{}` has no parent directory", path.display()))?;

        let mut base_url = project.site.base_url;
        if !base_url.path().ends_with('/') {
            let with_slash = format!("{}/", base_url.path());
            base_url.set_path(&with_slash);
        }

        let organization = match project.organization {
            Some(org) => Organization {
                name: org.name,
                url: org.url.unwrap_or_else(|| base_url.clone()),
                logo: org.logo,
                contact_email: org.contact_email,
            },
            None => Organization {
                name: project.site.title.clone(),
                url: base_url.clone(),
                logo: None,
                contact_email: None,
            },
        };

        let paths = project.paths;
        Ok(Config {
            site_title: project.site.title,
            site_description: project.site.description,
            author: project.site.author,
            organization,
            posts_dir: root.join(paths.posts_dir.unwrap_or_else(|| PathBuf::from("posts"))),
            output_dir: match output_directory {
                Some(dir) => dir.to_owned(),
                None => root.join(paths.output_dir.unwrap_or_else(|| PathBuf::from("dist/blog"))),
            },
            sitemap_dir: root.join(paths.sitemap_dir.unwrap_or_else(|| PathBuf::from("dist"))),
            static_pages: paths.static_pages.unwrap_or_else(|| {
                vec![
                    "about".to_owned(),
                    "services".to_owned(),
                    "contact".to_owned(),
                ]
            }),
            feed_max_items: project.feed.max_items.0,
            post_template: project.theme.post_template.map(|p| root.join(p)),
            index_template: project.theme.index_template.map(|p| root.join(p)),
            base_url,
        })
    }

    /// URL of the blog index page.
    pub fn blog_url(&self) -> Url {
        // base_url always ends in `/`, so joining a relative segment
        // cannot fail
        self.base_url.join("blog/").unwrap()
    }

    /// Canonical URL for a post: `{base_url}blog/{slug}/`.
    pub fn post_url(&self, slug: &str) -> Url {
        // slugs only contain `[a-z0-9-]`
        self.blog_url().join(&format!("{}/", slug)).unwrap()
    }

    /// URL of the RSS feed.
    pub fn feed_url(&self) -> Url {
        self.blog_url().join("feed.xml").unwrap()
    }

    /// URL of a static top-level page: `{base_url}{page}/`.
    pub fn page_url(&self, page: &str) -> Url {
        self.base_url.join(&format!("{}/", page)).unwrap()
    }
}

#[cfg(test)]
impl Config {
    /// A fixture configuration for unit tests.
    pub fn example() -> Config {
        let base_url = Url::parse("https://optiscale360.com/").unwrap();
        Config {
            site_title: "OptiScale 360".to_owned(),
            site_description: "Growth engineering for digital agencies".to_owned(),
            author: Some("OptiScale 360 Team".to_owned()),
            organization: Organization {
                name: "OptiScale 360".to_owned(),
                url: base_url.clone(),
                logo: Some("https://optiscale360.com/assets/logo.png".to_owned()),
                contact_email: Some("hello@optiscale360.com".to_owned()),
            },
            posts_dir: PathBuf::from("posts"),
            output_dir: PathBuf::from("dist/blog"),
            sitemap_dir: PathBuf::from("dist"),
            static_pages: vec![
                "about".to_owned(),
                "services".to_owned(),
                "contact".to_owned(),
            ],
            feed_max_items: 20,
            post_template: None,
            index_template: None,
            base_url,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path) -> Result<PathBuf> {
        let path = dir.join(CONFIG_FILE);
        let mut file = File::create(&path)?;
        writeln!(
            file,
            "site:\n  title: OptiScale 360\n  base_url: https://optiscale360.com"
        )?;
        Ok(path)
    }

    #[test]
    fn test_minimal_project_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_config(dir.path())?;

        let config = Config::from_project_file(&path, None)?;
        assert_eq!(config.site_title, "OptiScale 360");
        // trailing slash is normalized onto the base URL
        assert_eq!(config.base_url.as_str(), "https://optiscale360.com/");
        assert_eq!(config.posts_dir, dir.path().join("posts"));
        assert_eq!(config.feed_max_items, 20);
        assert_eq!(
            config.post_url("hello-world").as_str(),
            "https://optiscale360.com/blog/hello-world/"
        );
        assert_eq!(
            config.feed_url().as_str(),
            "https://optiscale360.com/blog/feed.xml"
        );
        Ok(())
    }

    #[test]
    fn test_from_directory_searches_parents() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_config(dir.path())?;
        let nested = dir.path().join("posts/drafts");
        std::fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested, None)?;
        assert_eq!(config.site_title, "OptiScale 360");
        Ok(())
    }

    #[test]
    fn test_output_override() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_config(dir.path())?;

        let config = Config::from_project_file(&path, Some(Path::new("/tmp/out")))?;
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        Ok(())
    }
}
