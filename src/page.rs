//! Defines the [`Page`] and [`Site`] traits, the capabilities this crate
//! needs from a host site generator: enumerating the pages under a path and
//! reading a field from each page.

use serde_yaml::Value;

/// A content page as seen by the tag machinery.
pub trait Page {
    /// The page's logical path, e.g. `/blog/post1`. The root page is `/`.
    fn path(&self) -> &str;

    /// The page's URL path relative to the site root, always with a
    /// trailing slash, e.g. `/blog/post1/`.
    fn url_path(&self) -> &str;

    /// Looks up a field by name. Returns `None` when the page has no such
    /// field.
    fn lookup(&self, field: &str) -> Option<&Value>;

    /// The page's `title` field, falling back to the last segment of its
    /// path.
    fn title(&self) -> &str {
        match self.lookup("title") {
            Some(Value::String(title)) => title.as_str(),
            _ => self.path().rsplit('/').next().unwrap_or_default(),
        }
    }
}

/// A collection of [`Page`]s addressable by path.
pub trait Site {
    type Page: Page;

    /// Returns the page at `path`, if any.
    fn get(&self, path: &str) -> Option<&Self::Page>;

    /// Returns the direct children of `path` in site order.
    fn query(&self, path: &str) -> Vec<&Self::Page>;

    /// Returns every page below `path` (children, grandchildren, ...) in
    /// site order.
    fn descendants(&self, path: &str) -> Vec<&Self::Page>;
}

/// Returns the parent path of `path`, or `None` for the root.
///
/// ```
/// use tagweights::page::parent_path;
/// assert_eq!(parent_path("/blog/post1"), Some("/blog"));
/// assert_eq!(parent_path("/blog"), Some("/"));
/// assert_eq!(parent_path("/"), None);
/// ```
pub fn parent_path(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.trim_end_matches('/').rfind('/') {
        Some(0) => Some("/"),
        Some(i) => Some(&path[..i]),
        None => None,
    }
}

/// Returns true if `path` lies strictly below `ancestor`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    if path == ancestor {
        return false;
    }
    if ancestor == "/" {
        return path.starts_with('/');
    }
    path.starts_with(ancestor) && path[ancestor.len()..].starts_with('/')
}

/// Normalizes a logical path: leading slash, no trailing slash except for the
/// root itself.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::from("/")
    } else {
        format!("/{}", trimmed)
    }
}

/// Computes the default URL path for a logical path (`/blog` → `/blog/`).
pub fn url_path_for(path: &str) -> String {
    ensure_slash(path)
}

/// Appends a trailing slash to `s` unless it already has one.
pub fn ensure_slash(s: &str) -> String {
    if s.ends_with('/') {
        s.to_owned()
    } else {
        format!("{}/", s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("/blog/2021/post"), Some("/blog/2021"));
        assert_eq!(parent_path("/blog/"), Some("/"));
        assert_eq!(parent_path("blog"), None);
    }

    #[test]
    fn test_is_descendant() {
        assert!(is_descendant("/blog/post1", "/blog"));
        assert!(is_descendant("/blog/2021/post1", "/blog"));
        assert!(is_descendant("/blog", "/"));
        assert!(!is_descendant("/blog", "/blog"));
        assert!(!is_descendant("/blogroll", "/blog"));
        assert!(!is_descendant("/", "/"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("blog/"), "/blog");
        assert_eq!(normalize_path("/blog"), "/blog");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_url_path_for() {
        assert_eq!(url_path_for("/blog"), "/blog/");
        assert_eq!(url_path_for("/"), "/");
    }
}
