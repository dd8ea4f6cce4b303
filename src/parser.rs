//! Defines the [`Parser`] and [`Error`] types: the logic for loading the
//! content tree from the file system into [`Posts`].
//!
//! A source file is Markdown with a YAML frontmatter block. Its logical path
//! comes from its location under the content directory:
//!
//! | Source file               | Page path      |
//! |---------------------------|----------------|
//! | `content/index.md`        | `/`            |
//! | `content/blog/index.md`   | `/blog`        |
//! | `content/blog/post1.md`   | `/blog/post1`  |

use std::{
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

use serde_yaml::{Mapping, Value};
use walkdir::WalkDir;

use crate::post::{Post, Posts};

const MARKDOWN_EXTENSION: &str = "md";
const INDEX_FILE: &str = "index.md";

/// Parses [`Post`] objects from the source files of a content directory.
pub struct Parser<'a> {
    /// The root of the content tree.
    content_directory: &'a Path,
}

impl<'a> Parser<'a> {
    pub fn new(content_directory: &'a Path) -> Parser<'a> {
        Parser { content_directory }
    }

    /// Walks the content directory and parses every Markdown file into a
    /// [`Post`]. Files must begin with a frontmatter block, e.g.:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// tags: [greet]
    /// ---
    /// Some *Markdown*.
    /// ```
    pub fn parse_posts(&self) -> Result<Posts> {
        let mut posts = Vec::new();
        for result in WalkDir::new(self.content_directory) {
            let entry = result?;
            let is_markdown = entry.path().extension().and_then(|e| e.to_str())
                == Some(MARKDOWN_EXTENSION);
            if entry.file_type().is_file() && is_markdown {
                // strip_prefix() should never fail; the walk starts at the
                // content directory.
                let relative_path = entry
                    .path()
                    .strip_prefix(self.content_directory)
                    .map_err(|_| InvalidFileNameError(entry.path().to_owned()))?;
                posts.push(self.parse_post(relative_path)?);
            }
        }
        log::debug!(
            "parsed {} posts from {}",
            posts.len(),
            self.content_directory.display()
        );
        Ok(Posts::new(posts))
    }

    /// Parses a single [`Post`] from a path relative to the content
    /// directory, annotating any error with that path.
    fn parse_post(&self, relative_path: &Path) -> Result<Post> {
        match self._parse_post(relative_path) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{:?}`", relative_path),
                Box::new(e),
            )),
        }
    }

    fn _parse_post(&self, relative_path: &Path) -> Result<Post> {
        use std::io::Read;
        let mut contents = String::new();
        File::open(self.content_directory.join(relative_path))?
            .read_to_string(&mut contents)?;

        let fields = parse_frontmatter(&contents)?;
        Ok(Post::new(&page_path(relative_path)?, fields))
    }
}

/// Extracts and deserializes the YAML frontmatter of a source file. An empty
/// frontmatter block yields an empty mapping.
pub fn parse_frontmatter(input: &str) -> Result<Mapping> {
    fn frontmatter_indices(input: &str) -> Result<(usize, usize)> {
        const FENCE: &str = "---";
        if !input.starts_with(FENCE) {
            return Err(Error::FrontmatterMissingStartFence);
        }
        match input[FENCE.len()..].find(FENCE) {
            None => Err(Error::FrontmatterMissingEndFence),
            Some(offset) => Ok((
                FENCE.len(),          // yaml_start
                FENCE.len() + offset, // yaml_stop
            )),
        }
    }

    let (yaml_start, yaml_stop) = frontmatter_indices(input)?;
    let yaml = &input[yaml_start..yaml_stop];
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(fields) => Ok(fields),
        Value::Null => Ok(Mapping::new()),
        _ => Err(Error::FrontmatterNotMapping),
    }
}

/// Converts a source path relative to the content directory into a logical
/// page path.
fn page_path(relative_path: &Path) -> Result<String> {
    let without_index = if relative_path.ends_with(INDEX_FILE) {
        relative_path.parent().unwrap_or_else(|| Path::new(""))
    } else {
        relative_path
    };
    let without_extension = if without_index == relative_path {
        without_index.with_extension("")
    } else {
        without_index.to_owned()
    };

    let mut path = String::new();
    for component in without_extension.components() {
        let component = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| InvalidFileNameError(relative_path.to_owned()))?;
        path.push('/');
        path.push_str(component);
    }
    if path.is_empty() {
        path.push('/');
    }
    Ok(path)
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// The result of loading pages from the content tree.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong loading a content tree.
#[derive(Debug)]
pub enum Error {
    /// The file doesn't open with a `---` line.
    FrontmatterMissingStartFence,

    /// The opening `---` has no closing `---`.
    FrontmatterMissingEndFence,

    /// Returned when the frontmatter is valid YAML but not a mapping.
    FrontmatterNotMapping,

    /// The frontmatter isn't valid YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Reading a source file failed.
    Io(std::io::Error),

    /// Listing the content tree failed.
    WalkDir(walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// Wraps another error with the file it came from.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::FrontmatterNotMapping => {
                write!(f, "Frontmatter must be a YAML mapping")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::FrontmatterNotMapping => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
