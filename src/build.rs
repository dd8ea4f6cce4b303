//! Exports the [`build_site`] function which stitches together the high-level
//! steps of a build: parsing the content tree ([`crate::parser`]), counting
//! and weighing tags in a fresh [`BuildContext`], generating tag pages and
//! rendering them to disk ([`crate::write`]).

use crate::config::Config;
use crate::context::BuildContext;
use crate::parser::{Error as ParseError, Parser};
use crate::post::Posts;
use crate::tag::Error as TagError;
use crate::value::Links;
use crate::write::{Error as WriteError, Writer};
use gtmpl::Template;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The template used when the project doesn't name one.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/default.html");

/// What a build produced.
#[derive(Debug)]
pub struct Summary {
    /// The number of distinct tags in scope.
    pub tags: usize,

    /// The files written, one per tag page.
    pub written: Vec<PathBuf>,
}

/// Builds the tag pages for a [`Config`]. This calls into
/// [`Parser::parse_posts`], [`BuildContext::generate`] and
/// [`Writer::write_tag_pages`] which do the heavy-lifting.
pub fn build_site(config: &Config) -> Result<Summary> {
    let posts = Parser::new(&config.content_directory).parse_posts()?;
    build_posts(config, &posts)
}

/// Like [`build_site`], for posts that are already loaded.
pub fn build_posts(config: &Config, posts: &Posts) -> Result<Summary> {
    let template = match &config.template {
        Some(path) => parse_template(path)?,
        None => parse_template_str(DEFAULT_TEMPLATE)?,
    };

    let mut context = BuildContext::new(posts, &config.tags);
    let pages = context.generate()?;

    let writer = Writer {
        template: &template,
        output_directory: &config.output_directory,
        cloud: &config.cloud,
        links: Links::new(config.site_root.as_ref()),
    };
    let written = writer.write_tag_pages(&context, &pages)?;
    log::info!(
        "wrote {} tag pages to {}",
        written.len(),
        config.output_directory.display()
    );

    Ok(Summary {
        tags: context.tagcount().len(),
        written,
    })
}

// Loads the template file contents and parses them into a template.
fn parse_template(path: &Path) -> Result<Template> {
    use std::io::Read;
    let mut contents = String::new();
    File::open(path)
        .map_err(|e| Error::OpenTemplateFile {
            path: path.to_owned(),
            err: e,
        })?
        .read_to_string(&mut contents)?;
    parse_template_str(&contents)
}

fn parse_template_str(contents: &str) -> Result<Template> {
    let mut template = Template::default();
    template.parse(contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

type Result<T> = std::result::Result<T, Error>;

/// Why a build failed. Each step of [`build_site`] contributes a variant.
#[derive(Debug)]
pub enum Error {
    /// Loading the content tree failed.
    Parse(ParseError),

    /// Two tag pages claimed one URL, or a URL was missing.
    Tag(TagError),

    /// Rendering or writing a tag page failed.
    Write(WriteError),

    /// The configured template file couldn't be opened.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// The template isn't valid gtmpl.
    ParseTemplate(String),

    /// Reading the template file failed.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Tag(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Tag(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<TagError> for Error {
    fn from(err: TagError) -> Error {
        Error::Tag(err)
    }
}

impl From<WriteError> for Error {
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}
