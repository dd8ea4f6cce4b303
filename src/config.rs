//! Loads the project configuration from `tags.yaml`. The file is looked up in
//! the given directory and then in each of its parents.
//!
//! ```yaml
//! parent: /blog                      # required
//! items_scope: children              # or `descendants`
//! url_path: "{parent_url}tag/{tag}"
//! template: templates/tag.html       # default: bundled template
//! tags_field: tags
//! tags: [rust, yaml]                 # default: every tag in scope
//! ignore_missing: false
//! site_root: https://example.org/
//! cloud:
//!   lower: 1.0
//!   upper: 2.0
//!   scale: log                       # or `linear`
//!   groups: [small, medium, large]
//! ```

use crate::page;
use crate::tag::{self, UrlTemplate};
use crate::weight::TagWeight;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

const PROJECT_FILE: &str = "tags.yaml";

/// Which pages under the parent take part in tagging.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Direct children of the parent.
    Children,

    /// Every page below the parent.
    Descendants,
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Children
    }
}

/// The tag settings a [`crate::context::BuildContext`] works from.
#[derive(Clone, Debug, PartialEq)]
pub struct TagsConfig {
    /// Logical path of the page whose children are tagged, e.g. `/blog`.
    pub parent: String,
    pub items_scope: Scope,
    pub url_path: UrlTemplate,
    pub tags_field: String,

    /// Tags to generate pages for. `None` means every tag in scope.
    pub tags: Option<Vec<String>>,

    /// Whether looking up the URL of an unknown tag page yields an empty
    /// string instead of an error.
    pub ignore_missing: bool,
}

impl TagsConfig {
    pub fn new(parent: &str) -> TagsConfig {
        TagsConfig {
            parent: page::normalize_path(parent),
            items_scope: Scope::default(),
            url_path: UrlTemplate::default(),
            tags_field: default_tags_field(),
            tags: None,
            ignore_missing: false,
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Linear,
    Log,
}

/// Tag cloud settings. Templates can't call [`TagWeight`] methods with
/// arguments, so scores are precomputed from these.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Cloud {
    pub lower: f64,
    pub upper: f64,
    pub scale: Scale,
    pub groups: Vec<String>,
}

impl Default for Cloud {
    fn default() -> Self {
        Cloud {
            lower: 1.0,
            upper: 2.0,
            scale: Scale::Log,
            groups: Vec::new(),
        }
    }
}

impl Cloud {
    /// The weight's score on the configured scale, within `[lower, upper]`.
    pub fn score(&self, weight: &TagWeight) -> f64 {
        match self.scale {
            Scale::Linear => weight.linear(self.lower, self.upper),
            Scale::Log => weight.log(self.lower, self.upper),
        }
    }

    /// The weight's group on the configured scale, if any groups are set.
    pub fn group(&self, weight: &TagWeight) -> Option<&str> {
        let group = match self.scale {
            Scale::Linear => weight.lineargroup(&self.groups),
            Scale::Log => weight.loggroup(&self.groups),
        };
        group.map(|g| g.as_str())
    }
}

#[derive(Deserialize)]
struct Project {
    #[serde(default)]
    parent: Option<String>,

    #[serde(default)]
    items_scope: Scope,

    #[serde(default = "default_url_path")]
    url_path: String,

    #[serde(default)]
    template: Option<PathBuf>,

    #[serde(default = "default_tags_field")]
    tags_field: String,

    #[serde(default)]
    tags: Option<Vec<String>>,

    #[serde(default, deserialize_with = "bool_from_string")]
    ignore_missing: bool,

    #[serde(default)]
    site_root: Option<Url>,

    #[serde(default = "default_content_directory")]
    content_directory: PathBuf,

    #[serde(default)]
    cloud: Cloud,
}

fn default_url_path() -> String {
    UrlTemplate::DEFAULT.to_owned()
}

fn default_tags_field() -> String {
    String::from("tags")
}

fn default_content_directory() -> PathBuf {
    PathBuf::from("content")
}

/// Accepts YAML booleans as well as the strings `true`/`yes`/`1` and
/// `false`/`no`/`0`.
fn bool_from_string<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" | "" => Ok(false),
            other => Err(D::Error::custom(format!(
                "expected a boolean, found `{}`",
                other
            ))),
        },
    }
}

pub struct Config {
    pub tags: TagsConfig,
    pub cloud: Cloud,
    pub content_directory: PathBuf,

    /// The template for tag pages. `None` selects the bundled template.
    pub template: Option<PathBuf>,
    pub output_directory: PathBuf,

    /// The absolute URL of the site root, used to turn URL paths into links.
    pub site_root: Option<Url>,
}

impl Config {
    /// Finds `tags.yaml` in `dir` or the nearest parent directory and loads
    /// it. `output_directory` defaults to `build` next to the project file.
    pub fn from_directory(
        dir: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path, output_directory);
            }
            current = dir.parent();
        }
        Err(Error::NotFound(dir.to_owned()))
    }

    pub fn from_project_file(
        path: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file)?;
        let project_root = path.parent().unwrap_or_else(|| Path::new("."));
        Config::from_project(project, project_root, output_directory).map_err(
            |e| match e {
                Error::MissingParent(_) => Error::MissingParent(path.to_owned()),
                e => e,
            },
        )
    }

    /// Loads a configuration from YAML text, resolving relative paths
    /// against `project_root`.
    pub fn from_yaml(
        yaml: &str,
        project_root: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        let project: Project = serde_yaml::from_str(yaml)?;
        Config::from_project(project, project_root, output_directory)
    }

    fn from_project(
        project: Project,
        project_root: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        let parent = match project.parent {
            Some(parent) if !parent.trim().is_empty() => parent,
            _ => return Err(Error::MissingParent(project_root.join(PROJECT_FILE))),
        };
        Ok(Config {
            tags: TagsConfig {
                parent: page::normalize_path(&parent),
                items_scope: project.items_scope,
                url_path: UrlTemplate::parse(&project.url_path)?,
                tags_field: project.tags_field,
                tags: project.tags,
                ignore_missing: project.ignore_missing,
            },
            cloud: project.cloud,
            content_directory: project_root.join(project.content_directory),
            template: project.template.map(|t| project_root.join(t)),
            output_directory: match output_directory {
                Some(dir) => dir.to_owned(),
                None => project_root.join("build"),
            },
            site_root: project.site_root,
        })
    }
}

/// The result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the project configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no `tags.yaml` exists in the directory or its parents.
    NotFound(PathBuf),

    /// Returned when the project file can't be read.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid YAML for a project.
    Yaml(serde_yaml::Error),

    /// Returned when the required `parent` option is missing.
    MissingParent(PathBuf),

    /// Returned when the `url_path` option isn't a valid URL template.
    UrlTemplate(tag::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound(dir) => write!(
                f,
                "Could not find `{}` in `{}` or any parent directory",
                PROJECT_FILE,
                dir.display()
            ),
            Error::Io { path, err } => {
                write!(f, "Opening project file '{}': {}", path.display(), err)
            }
            Error::Yaml(err) => write!(f, "Loading configuration: {}", err),
            Error::MissingParent(path) => {
                write!(f, "Set the \"parent\" option in {}", path.display())
            }
            Error::UrlTemplate(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound(_) => None,
            Error::Io { path: _, err } => Some(err),
            Error::Yaml(err) => Some(err),
            Error::MissingParent(_) => None,
            Error::UrlTemplate(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts [`serde_yaml::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: serde_yaml::Error) -> Error {
        Error::Yaml(err)
    }
}

impl From<tag::Error> for Error {
    /// Converts [`tag::Error`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: tag::Error) -> Error {
        Error::UrlTemplate(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn load(yaml: &str) -> Result<Config> {
        Config::from_yaml(yaml, Path::new("/project"), None)
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = load("parent: blog/")?;
        assert_eq!(config.tags, TagsConfig::new("/blog"));
        assert_eq!(config.tags.tags_field, "tags");
        assert_eq!(config.tags.url_path.as_str(), "{parent_url}tag/{tag}");
        assert_eq!(config.cloud, Cloud::default());
        assert_eq!(config.content_directory, Path::new("/project/content"));
        assert_eq!(config.output_directory, Path::new("/project/build"));
        assert_eq!(config.template, None);
        assert_eq!(config.site_root, None);
        Ok(())
    }

    #[test]
    fn test_missing_parent_is_fatal() {
        assert!(matches!(load("tags_field: tags"), Err(Error::MissingParent(_))));
        assert!(matches!(load("parent: ''"), Err(Error::MissingParent(_))));
        assert!(matches!(load("{}"), Err(Error::MissingParent(_))));
    }

    #[test]
    fn test_bad_url_template() {
        assert!(matches!(
            load("parent: /blog\nurl_path: '{nope}'"),
            Err(Error::UrlTemplate(tag::Error::UnknownPlaceholder(_)))
        ));
    }

    #[test]
    fn test_full() -> Result<()> {
        let config = Config::from_yaml(
            "parent: /blog
items_scope: descendants
url_path: '/tags/{tag}'
template: theme/tag.html
tags_field: keywords
tags: [a, b]
ignore_missing: yes
site_root: https://example.org/
cloud:
  upper: 3.0
  scale: linear
  groups: [s, m, l]
",
            Path::new("/project"),
            Some(Path::new("/out")),
        )?;
        assert_eq!(config.tags.items_scope, Scope::Descendants);
        assert_eq!(config.tags.tags_field, "keywords");
        assert_eq!(config.tags.tags, Some(vec![String::from("a"), String::from("b")]));
        assert!(config.tags.ignore_missing);
        assert_eq!(config.template, Some(PathBuf::from("/project/theme/tag.html")));
        assert_eq!(config.output_directory, Path::new("/out"));
        assert_eq!(config.cloud.lower, 1.0);
        assert_eq!(config.cloud.upper, 3.0);
        assert_eq!(config.cloud.scale, Scale::Linear);
        assert_eq!(
            config.site_root.as_ref().map(|u| u.as_str()),
            Some("https://example.org/")
        );
        Ok(())
    }

    #[test]
    fn test_ignore_missing_flags() -> Result<()> {
        assert!(load("parent: /b\nignore_missing: true")?.tags.ignore_missing);
        assert!(load("parent: /b\nignore_missing: 'Yes'")?.tags.ignore_missing);
        assert!(!load("parent: /b\nignore_missing: 'no'")?.tags.ignore_missing);
        assert!(matches!(
            load("parent: /b\nignore_missing: maybe"),
            Err(Error::Yaml(_))
        ));
        Ok(())
    }

    #[test]
    fn test_cloud() {
        let cloud = Cloud {
            lower: 10.0,
            upper: 20.0,
            scale: Scale::Linear,
            groups: vec![String::from("s"), String::from("l")],
        };
        let weight = TagWeight::new(3, 1, 3);
        assert_eq!(cloud.score(&weight), 20.0);
        assert_eq!(cloud.group(&weight), Some("l"));
        assert_eq!(Cloud::default().group(&weight), None);
        assert_eq!(Cloud::default().score(&TagWeight::new(2, 1, 4)), 1.5);
    }

    #[test]
    fn test_from_directory_searches_parents() -> Result<()> {
        let demo = Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/demo");
        let config = Config::from_directory(&demo.join("content/blog"), None)?;
        assert_eq!(config.tags.parent, "/blog");
        assert_eq!(config.content_directory, demo.join("content"));
        assert_eq!(config.template, Some(demo.join("templates/tag.html")));
        Ok(())
    }
}
