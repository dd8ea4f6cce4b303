//! Renders tag pages with a gtmpl template and writes them under the output
//! directory.

use crate::config::Cloud;
use crate::context::BuildContext;
use crate::page::Site;
use crate::tag::{self, TagPage, TagPageId};
use crate::value::{page_value, weight_value, Links};
use gtmpl::{Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Responsible for templating tag pages and writing them to disk.
pub struct Writer<'a> {
    /// The template for tag pages.
    pub template: &'a Template,

    /// The directory the site is written to. A tag page with URL path
    /// `/blog/tag/rust/` is written to
    /// `{output_directory}/blog/tag/rust/index.html`.
    pub output_directory: &'a Path,

    /// Settings for the precomputed tag cloud scores.
    pub cloud: &'a Cloud,

    /// Makes URL paths into links for templates.
    pub links: Links<'a>,
}

impl Writer<'_> {
    /// Renders a single [`TagPage`] to a string. The template sees:
    ///
    /// * `tag`: the tag
    /// * `url_path`, `url`: where the page lives
    /// * `items`: the tagged pages (`path`, `url_path`, `url`, `title`)
    /// * `weight`: the tag's weight (see [`weight_value`])
    /// * `tags`: every weighted tag, for a tag cloud (`tag`, `url`, `weight`)
    pub fn render<'s, S: Site>(
        &self,
        context: &BuildContext<'s, S>,
        page: &TagPage<'s, S::Page>,
    ) -> Result<String> {
        let url_path = page.url_path(context)?;

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("tag".to_owned(), Value::String(page.tag().to_owned()));
        m.insert("url_path".to_owned(), Value::String(url_path.to_owned()));
        m.insert("url".to_owned(), Value::String(self.links.link(url_path)?));
        m.insert(
            "items".to_owned(),
            Value::Array(
                page.items(context)
                    .iter()
                    .map(|item| page_value(*item, &self.links))
                    .collect::<std::result::Result<_, _>>()?,
            ),
        );
        m.insert(
            "weight".to_owned(),
            match context.tagweights().get(page.tag()) {
                Some(weight) => weight_value(weight, self.cloud),
                None => Value::Nil,
            },
        );
        m.insert("tags".to_owned(), self.cloud_value(context)?);

        let mut out: Vec<u8> = Vec::new();
        self.template
            .execute(&mut out, &gtmpl::Context::from(Value::Object(m))?)?;
        String::from_utf8(out).map_err(|e| Error::Template(e.to_string()))
    }

    /// Builds the `tags` list: every weighted tag with its link, if it has a
    /// page, and its weight.
    fn cloud_value<S: Site>(&self, context: &BuildContext<'_, S>) -> Result<Value> {
        let parent = &context.config().parent;
        let mut tags = Vec::with_capacity(context.tagweights().len());
        for (tag, weight) in context.tagweights() {
            let id = TagPageId::new(parent, tag);
            let mut m: HashMap<String, Value> = HashMap::new();
            m.insert("tag".to_owned(), Value::String(tag.clone()));
            m.insert(
                "url".to_owned(),
                match context.registry().url_path(&id) {
                    Some(url_path) => Value::String(self.links.link(url_path)?),
                    None => Value::Nil,
                },
            );
            m.insert("weight".to_owned(), weight_value(weight, self.cloud));
            tags.push(Value::Object(m));
        }
        Ok(Value::Array(tags))
    }

    /// Renders every page and writes it to disk. Returns the paths written.
    pub fn write_tag_pages<'s, S: Site>(
        &self,
        context: &BuildContext<'s, S>,
        pages: &[TagPage<'s, S::Page>],
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(pages.len());
        for page in pages {
            let file_path = self.output_path(page.url_path(context)?)?;
            if let Some(dir) = file_path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&file_path, self.render(context, page)?)?;
            log::debug!("wrote {} to {}", page.id(), file_path.display());
            written.push(file_path);
        }
        Ok(written)
    }

    /// The file a page with `url_path` is written to. Only plain path
    /// segments are accepted, so the file always lands inside
    /// `output_directory`.
    fn output_path(&self, url_path: &str) -> Result<PathBuf> {
        let relative = Path::new(url_path.trim_matches('/'));
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(Error::OutsideOutputDirectory(url_path.to_owned()));
        }
        Ok(self.output_directory.join(relative).join("index.html"))
    }
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error looking up a tag page's URL.
    Tag(tag::Error),

    /// An error making a link from a URL path.
    Url(url::ParseError),

    /// An error writing the output files.
    Io(io::Error),

    /// A URL path that would be written outside the output directory.
    OutsideOutputDirectory(String),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<tag::Error> for Error {
    fn from(err: tag::Error) -> Error {
        Error::Tag(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::Url(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Tag(err) => err.fmt(f),
            Error::Url(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::OutsideOutputDirectory(url_path) => {
                write!(f, "refusing to write `{}` outside the output directory", url_path)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Tag(err) => Some(err),
            Error::Url(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::OutsideOutputDirectory(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::TagsConfig;
    use crate::post::test::{blog, post};
    use crate::post::Posts;

    fn template(text: &str) -> Template {
        let mut template = Template::default();
        template.parse(text).unwrap();
        template
    }

    #[test]
    fn test_render() -> Result<()> {
        let posts = blog();
        let config = TagsConfig::new("/blog");
        let mut context = BuildContext::new(&posts, &config);
        let pages = context.generate()?;
        let cloud = Cloud::default();
        let template = template(
            "{{ .tag }}@{{ .url }}:{{ range .items }} {{ .title }}{{ end }} ({{ .weight.count }})",
        );
        let writer = Writer {
            template: &template,
            output_directory: Path::new("/unused"),
            cloud: &cloud,
            links: Links::new(None),
        };
        assert_eq!(
            writer.render(&context, &pages[0])?,
            "tag1@/blog/tag/tag1/: post1 post2 (2)"
        );
        assert_eq!(
            writer.render(&context, &pages[2])?,
            "tag3@/blog/tag/tag3/: post2 (1)"
        );
        Ok(())
    }

    #[test]
    fn test_render_cloud() -> Result<()> {
        let posts = blog();
        let config = TagsConfig::new("/blog");
        let mut context = BuildContext::new(&posts, &config);
        let pages = context.generate()?;
        let cloud = Cloud::default();
        let template =
            template("{{ range .tags }}{{ .tag }}={{ .weight.score }} {{ end }}");
        let writer = Writer {
            template: &template,
            output_directory: Path::new("/unused"),
            cloud: &cloud,
            links: Links::new(None),
        };
        assert_eq!(writer.render(&context, &pages[1])?, "tag1=2 tag2=1 tag3=1 ");
        Ok(())
    }

    #[test]
    fn test_write_tag_pages() -> Result<()> {
        let posts = blog();
        let config = TagsConfig::new("/blog");
        let mut context = BuildContext::new(&posts, &config);
        let pages = context.generate()?;
        let cloud = Cloud::default();
        let template = template("{{ .tag }}");
        let out = tempfile::tempdir()?;
        let writer = Writer {
            template: &template,
            output_directory: out.path(),
            cloud: &cloud,
            links: Links::new(None),
        };
        let written = writer.write_tag_pages(&context, &pages)?;
        assert_eq!(written.len(), 3);
        let path = out.path().join("blog/tag/tag2/index.html");
        assert_eq!(std::fs::read_to_string(path)?, "tag2");
        Ok(())
    }

    #[test]
    fn test_write_stays_in_output_directory() -> Result<()> {
        let posts = Posts::new(vec![
            post("/blog", ""),
            post("/blog/p", "tags: ['../../../escaped']"),
        ]);
        let config = TagsConfig::new("/blog");
        let mut context = BuildContext::new(&posts, &config);
        let pages = context.generate()?;
        let cloud = Cloud::default();
        let template = template("{{ .tag }}");
        let root = tempfile::tempdir()?;
        let out = root.path().join("out");
        let writer = Writer {
            template: &template,
            output_directory: &out,
            cloud: &cloud,
            links: Links::new(None),
        };
        let written = writer.write_tag_pages(&context, &pages)?;
        assert_eq!(written, vec![out.join("blog/tag/escaped/index.html")]);
        assert_eq!(std::fs::read_to_string(&written[0])?, "../../../escaped");
        assert!(!root.path().join("escaped").exists());
        Ok(())
    }

    #[test]
    fn test_output_path() -> Result<()> {
        let template = template("-");
        let cloud = Cloud::default();
        let writer = Writer {
            template: &template,
            output_directory: Path::new("/site"),
            cloud: &cloud,
            links: Links::new(None),
        };
        assert_eq!(
            writer.output_path("/blog/tag/rust/")?,
            Path::new("/site/blog/tag/rust/index.html")
        );
        assert_eq!(writer.output_path("/")?, Path::new("/site/index.html"));
        assert!(matches!(
            writer.output_path("/blog/tag/../../../escaped/"),
            Err(Error::OutsideOutputDirectory(_))
        ));
        Ok(())
    }
}
