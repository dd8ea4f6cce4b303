//! Conversions from pages and weights into [`Value`]s for templating.

use crate::config::Cloud;
use crate::page::Page;
use crate::weight::TagWeight;
use gtmpl_value::Value;
use std::collections::HashMap;
use url::{ParseError, Url};

/// Turns site-relative URL paths into links, absolute when a site root is
/// configured.
#[derive(Clone, Copy, Debug)]
pub struct Links<'a> {
    site_root: Option<&'a Url>,
}

impl<'a> Links<'a> {
    pub fn new(site_root: Option<&'a Url>) -> Links<'a> {
        Links { site_root }
    }

    pub fn link(&self, url_path: &str) -> Result<String, ParseError> {
        match self.site_root {
            Some(root) => Ok(root.join(url_path.trim_start_matches('/'))?.to_string()),
            None => Ok(url_path.to_owned()),
        }
    }
}

impl From<&TagWeight> for Value {
    /// Converts a [`TagWeight`] into an object with its `count`, `mincount`
    /// and `maxcount`.
    fn from(weight: &TagWeight) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("count".to_owned(), Value::from(weight.count() as u64));
        m.insert("mincount".to_owned(), Value::from(weight.mincount() as u64));
        m.insert("maxcount".to_owned(), Value::from(weight.maxcount() as u64));
        Value::Object(m)
    }
}

/// Converts a [`TagWeight`] into an object with its counts plus the scores
/// the `cloud` settings ask for: `linear`, `log`, `score` (on the configured
/// scale) and `group` (nil without groups).
pub fn weight_value(weight: &TagWeight, cloud: &Cloud) -> Value {
    let mut value = Value::from(weight);
    if let Value::Object(m) = &mut value {
        m.insert(
            "linear".to_owned(),
            Value::from(weight.linear(cloud.lower, cloud.upper)),
        );
        m.insert(
            "log".to_owned(),
            Value::from(weight.log(cloud.lower, cloud.upper)),
        );
        m.insert("score".to_owned(), Value::from(cloud.score(weight)));
        m.insert(
            "group".to_owned(),
            match cloud.group(weight) {
                Some(group) => Value::String(group.to_owned()),
                None => Value::Nil,
            },
        );
    }
    value
}

/// Converts a [`Page`] into an object with its `path`, `url_path`, `url` and
/// `title`.
pub fn page_value<P: Page + ?Sized>(page: &P, links: &Links) -> Result<Value, ParseError> {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("path".to_owned(), Value::String(page.path().to_owned()));
    m.insert("url_path".to_owned(), Value::String(page.url_path().to_owned()));
    m.insert("url".to_owned(), Value::String(links.link(page.url_path())?));
    m.insert("title".to_owned(), Value::String(page.title().to_owned()));
    Ok(Value::Object(m))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Scale;
    use crate::post::test::post;

    fn string<'v>(value: &'v Value, key: &str) -> Option<&'v str> {
        match value {
            Value::Object(m) => match m.get(key) {
                Some(Value::String(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    fn render(value: Value, template: &str) -> String {
        gtmpl::template(template, value).unwrap()
    }

    #[test]
    fn test_links() -> Result<(), ParseError> {
        let root = Url::parse("https://example.org/site/")?;
        assert_eq!(
            Links::new(Some(&root)).link("/blog/tag/a/")?,
            "https://example.org/site/blog/tag/a/"
        );
        assert_eq!(Links::new(None).link("/blog/tag/a/")?, "/blog/tag/a/");
        Ok(())
    }

    #[test]
    fn test_page_value() -> Result<(), ParseError> {
        let page = post("/blog/post1", "title: First");
        let value = page_value(&page, &Links::new(None))?;
        assert_eq!(string(&value, "title"), Some("First"));
        assert_eq!(string(&value, "url"), Some("/blog/post1/"));
        assert_eq!(string(&value, "path"), Some("/blog/post1"));
        Ok(())
    }

    #[test]
    fn test_weight_value() {
        let cloud = Cloud {
            lower: 1.0,
            upper: 2.0,
            scale: Scale::Linear,
            groups: vec!["s".to_owned(), "l".to_owned()],
        };
        let value = weight_value(&TagWeight::new(2, 1, 3), &cloud);
        assert_eq!(string(&value, "group"), Some("l"));
        assert_eq!(
            render(value, "{{ .count }}/{{ .mincount }}/{{ .maxcount }} {{ .linear }}"),
            "2/1/3 1.5"
        );

        let value = weight_value(&TagWeight::new(2, 1, 3), &Cloud::default());
        assert!(matches!(&value, Value::Object(m) if matches!(m.get("group"), Some(Value::Nil))));
    }
}
