//! Defines the tag page types: [`TagPageId`] (the identity of a synthesized
//! page), [`UrlTemplate`] (how its URL is computed), [`Registry`] (the
//! URL ↔ page maps of one build) and [`TagPage`] itself.

use crate::context::BuildContext;
use crate::page::{ensure_slash, Site};
use slug::slugify;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;

/// Identifies the tag page for `tag` under the page at `parent_path`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagPageId {
    /// The logical path of the parent page, e.g. `/blog`.
    pub parent_path: String,

    /// The tag, verbatim.
    pub tag: String,
}

impl TagPageId {
    pub fn new(parent_path: &str, tag: &str) -> TagPageId {
        TagPageId {
            parent_path: parent_path.to_owned(),
            tag: tag.to_owned(),
        }
    }
}

impl fmt::Display for TagPageId {
    /// Displays the virtual path of the page, e.g. `/blog@tag/rust`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@tag/{}", self.parent_path, self.tag)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    ParentUrl,
    ParentPath,
    Tag,
}

/// A URL pattern for tag pages with `{parent_url}`, `{parent_path}` and
/// `{tag}` placeholders. `{{` and `}}` produce literal braces. The tag is
/// slugified before it is substituted, so `macOS` and `MacOS` share a page
/// and a tag can never add path segments of its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    /// The default pattern: the tag's directory under the parent's URL.
    pub const DEFAULT: &'static str = "{parent_url}tag/{tag}";

    pub fn parse(source: &str) -> Result<UrlTemplate> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => name.push(c),
                            None => {
                                return Err(Error::UnclosedPlaceholder(
                                    source.to_owned(),
                                ))
                            }
                        }
                    }
                    let segment = match name.trim() {
                        "parent_url" => Segment::ParentUrl,
                        "parent_path" => Segment::ParentPath,
                        "tag" => Segment::Tag,
                        _ => return Err(Error::UnknownPlaceholder(name)),
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(
                            &mut literal,
                        )));
                    }
                    segments.push(segment);
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(UrlTemplate {
            source: source.to_owned(),
            segments,
        })
    }

    /// Renders the URL path for a tag page whose parent lives at
    /// `parent_url`. The result always ends with a slash. Fails when the tag
    /// has nothing left after slugifying, or when the path would contain a
    /// `.` or `..` segment.
    pub fn render(&self, id: &TagPageId, parent_url: &str) -> Result<String> {
        let slug = slugify(&id.tag);
        let mut url = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => url.push_str(s),
                Segment::ParentUrl => url.push_str(parent_url),
                Segment::ParentPath => url.push_str(&id.parent_path),
                Segment::Tag => url.push_str(&slug),
            }
        }
        let url = ensure_slash(&url);
        let empty_tag = slug.is_empty() && self.segments.contains(&Segment::Tag);
        if empty_tag || url.split('/').any(|s| s == "." || s == "..") {
            return Err(Error::InvalidUrlPath {
                id: id.clone(),
                url_path: url,
            });
        }
        Ok(url)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for UrlTemplate {
    fn default() -> Self {
        UrlTemplate {
            source: UrlTemplate::DEFAULT.to_owned(),
            segments: vec![
                Segment::ParentUrl,
                Segment::Literal(String::from("tag/")),
                Segment::Tag,
            ],
        }
    }
}

/// Maps URL paths to tag pages and back for one build. Every page gets its
/// URL exactly once.
#[derive(Debug, Default)]
pub struct Registry {
    url_map: HashMap<String, TagPageId>,
    reverse_url_map: HashMap<TagPageId, String>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Assigns `url_path` (with a trailing slash added if needed) to the page
    /// `id` and returns the stored URL path.
    pub fn register(&mut self, id: TagPageId, url_path: &str) -> Result<&str> {
        let with_slash = ensure_slash(url_path);
        if let Some(existing) = self.reverse_url_map.get(&id) {
            return Err(Error::AlreadyRegistered {
                id,
                url_path: existing.clone(),
            });
        }
        if let Some(other) = self.url_map.get(&with_slash) {
            return Err(Error::UrlConflict {
                url_path: with_slash,
                first: other.clone(),
                second: id,
            });
        }
        log::debug!("registered {} at {}", id, with_slash);
        self.url_map.insert(with_slash.clone(), id.clone());
        Ok(self.reverse_url_map.entry(id).or_insert(with_slash).as_str())
    }

    /// The URL path assigned to `id`, if any.
    pub fn url_path(&self, id: &TagPageId) -> Option<&str> {
        self.reverse_url_map.get(id).map(|u| u.as_str())
    }

    /// The tag page served at `url_path`, if any. A missing trailing slash is
    /// tolerated.
    pub fn resolve(&self, url_path: &str) -> Option<&TagPageId> {
        self.url_map.get(&ensure_slash(url_path))
    }

    pub fn len(&self) -> usize {
        self.url_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.url_map.is_empty()
    }
}

/// A synthesized page listing the pages carrying one tag. Its items are
/// computed on first use and kept for the rest of the build.
pub struct TagPage<'s, P> {
    id: TagPageId,
    items: OnceCell<Vec<&'s P>>,
}

impl<'s, P> TagPage<'s, P> {
    pub fn new(id: TagPageId) -> TagPage<'s, P> {
        TagPage {
            id,
            items: OnceCell::new(),
        }
    }

    pub fn id(&self) -> &TagPageId {
        &self.id
    }

    pub fn tag(&self) -> &str {
        &self.id.tag
    }

    pub fn parent_path(&self) -> &str {
        &self.id.parent_path
    }

    /// The pages carrying this tag, in site order.
    pub fn items<S>(&self, context: &BuildContext<'s, S>) -> &[&'s P]
    where
        S: Site<Page = P>,
    {
        self.items.get_or_init(|| context.items_for(self.tag()))
    }

    /// The URL path registered for this page. When nothing was registered,
    /// this is an error unless the build ignores missing pages, in which case
    /// it is the empty string.
    pub fn url_path<'c, S>(&self, context: &'c BuildContext<'s, S>) -> Result<&'c str>
    where
        S: Site<Page = P>,
    {
        match context.registry().url_path(&self.id) {
            Some(url_path) => Ok(url_path),
            None if context.config().ignore_missing => Ok(""),
            None => Err(Error::Unregistered(self.id.clone())),
        }
    }
}

impl<P> fmt::Debug for TagPage<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TagPage")
            .field("id", &self.id)
            .field("items_loaded", &self.items.get().is_some())
            .finish()
    }
}

/// The result of a fallible tag page operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error computing or looking up tag page URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Returned when a URL template has a `{` without a matching `}`.
    UnclosedPlaceholder(String),

    /// Returned when a URL template names a placeholder that doesn't exist.
    UnknownPlaceholder(String),

    /// Returned when a page is registered a second time.
    AlreadyRegistered { id: TagPageId, url_path: String },

    /// Returned when two pages are registered at the same URL path.
    UrlConflict {
        url_path: String,
        first: TagPageId,
        second: TagPageId,
    },

    /// Returned when looking up the URL of a page that was never registered.
    Unregistered(TagPageId),

    /// Returned when a rendered URL path would leave the directory it was
    /// rendered for, or has no segment for the tag.
    InvalidUrlPath { id: TagPageId, url_path: String },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnclosedPlaceholder(template) => {
                write!(f, "unclosed placeholder in URL template `{}`", template)
            }
            Error::UnknownPlaceholder(name) => {
                write!(f, "unknown URL template placeholder `{{{}}}`", name)
            }
            Error::AlreadyRegistered { id, url_path } => {
                write!(f, "{} is already registered at `{}`", id, url_path)
            }
            Error::UrlConflict {
                url_path,
                first,
                second,
            } => write!(
                f,
                "{} and {} both want URL `{}`",
                first, second, url_path
            ),
            Error::Unregistered(id) => write!(f, "no URL registered for {}", id),
            Error::InvalidUrlPath { id, url_path } => {
                write!(f, "{} renders to unusable URL `{}`", id, url_path)
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(TagPageId::new("/blog", "rust").to_string(), "/blog@tag/rust");
    }

    #[test]
    fn test_url_template_default() -> Result<()> {
        let id = TagPageId::new("/blog", "tag1");
        assert_eq!(UrlTemplate::default().render(&id, "/blog/")?, "/blog/tag/tag1/");
        assert_eq!(UrlTemplate::parse(UrlTemplate::DEFAULT)?, UrlTemplate::default());
        Ok(())
    }

    #[test]
    fn test_url_template_custom() -> Result<()> {
        let id = TagPageId::new("/blog", "tag1");
        let template = UrlTemplate::parse("/tags/{ tag }.html")?;
        assert_eq!(template.render(&id, "/blog/")?, "/tags/tag1.html/");
        let template = UrlTemplate::parse("{parent_path}/{{{tag}}}")?;
        assert_eq!(template.render(&id, "/blog/")?, "/blog/{tag1}/");
        Ok(())
    }

    #[test]
    fn test_url_template_slugifies_tag() -> Result<()> {
        let template = UrlTemplate::default();
        let render = |tag: &str| template.render(&TagPageId::new("/blog", tag), "/blog/");
        assert_eq!(render("Rust Lang")?, "/blog/tag/rust-lang/");
        assert_eq!(render("../../../escaped")?, "/blog/tag/escaped/");
        assert_eq!(render("a/b")?, "/blog/tag/a-b/");
        Ok(())
    }

    #[test]
    fn test_url_template_rejects_unusable_paths() -> Result<()> {
        let id = TagPageId::new("/blog", "...");
        assert!(matches!(
            UrlTemplate::default().render(&id, "/blog/"),
            Err(Error::InvalidUrlPath { .. })
        ));

        let id = TagPageId::new("/blog", "tag1");
        let template = UrlTemplate::parse("{parent_url}../{tag}")?;
        assert_eq!(
            template.render(&id, "/blog/"),
            Err(Error::InvalidUrlPath {
                id: id.clone(),
                url_path: String::from("/blog/../tag1/"),
            })
        );

        // templates without the tag don't need a slug
        assert_eq!(
            UrlTemplate::parse("/all-tags")?.render(&TagPageId::new("/blog", "..."), "/blog/")?,
            "/all-tags/"
        );
        Ok(())
    }

    #[test]
    fn test_url_template_errors() {
        assert_eq!(
            UrlTemplate::parse("{parent_url}tag/{tag"),
            Err(Error::UnclosedPlaceholder(String::from("{parent_url}tag/{tag")))
        );
        assert_eq!(
            UrlTemplate::parse("{parent}/{tag}"),
            Err(Error::UnknownPlaceholder(String::from("parent")))
        );
    }

    #[test]
    fn test_registry() -> Result<()> {
        let mut registry = Registry::new();
        let id = TagPageId::new("/blog", "tag1");
        assert_eq!(registry.register(id.clone(), "/blog/tag/tag1")?, "/blog/tag/tag1/");
        assert_eq!(registry.url_path(&id), Some("/blog/tag/tag1/"));
        assert_eq!(registry.resolve("/blog/tag/tag1/"), Some(&id));
        assert_eq!(registry.resolve("/blog/tag/tag1"), Some(&id));
        assert_eq!(registry.resolve("/blog/tag/tag4/"), None);
        assert_eq!(registry.len(), 1);
        Ok(())
    }

    #[test]
    fn test_registry_assigns_once() -> Result<()> {
        let mut registry = Registry::new();
        let id = TagPageId::new("/blog", "tag1");
        registry.register(id.clone(), "/blog/tag/tag1/")?;
        assert!(matches!(
            registry.register(id.clone(), "/elsewhere/"),
            Err(Error::AlreadyRegistered { .. })
        ));
        assert!(matches!(
            registry.register(TagPageId::new("/blog", "tag2"), "/blog/tag/tag1"),
            Err(Error::UrlConflict { .. })
        ));
        assert_eq!(registry.url_path(&id), Some("/blog/tag/tag1/"));
        Ok(())
    }
}
