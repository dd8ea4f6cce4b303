//! Defines the [`Post`] type, the concrete [`Page`] parsed from a source file,
//! and [`Posts`], the in-memory [`Site`] holding them.

use crate::page::{self, Page, Site};
use serde_yaml::{Mapping, Value};

/// A content page parsed from a Markdown source file. Only the frontmatter is
/// kept; tag pages never need the body.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The logical path of the post, e.g. `/blog/post1`.
    pub path: String,

    /// The URL path of the post relative to the site root, e.g.
    /// `/blog/post1/`.
    pub url_path: String,

    /// The frontmatter fields of the post.
    pub fields: Mapping,
}

impl Post {
    /// Creates a post at `path` with the default URL path for that path.
    pub fn new(path: &str, fields: Mapping) -> Post {
        let path = page::normalize_path(path);
        Post {
            url_path: page::url_path_for(&path),
            path,
            fields,
        }
    }
}

impl Page for Post {
    fn path(&self) -> &str {
        &self.path
    }

    fn url_path(&self) -> &str {
        &self.url_path
    }

    fn lookup(&self, field: &str) -> Option<&Value> {
        self.fields.get(&Value::String(field.to_owned()))
    }
}

/// An in-memory [`Site`] made of [`Post`]s, ordered by path.
#[derive(Clone, Debug, Default)]
pub struct Posts {
    posts: Vec<Post>,
}

impl Posts {
    pub fn new(mut posts: Vec<Post>) -> Posts {
        posts.sort_by(|a, b| a.path.cmp(&b.path));
        Posts { posts }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter()
    }
}

impl Site for Posts {
    type Page = Post;

    fn get(&self, path: &str) -> Option<&Post> {
        let path = page::normalize_path(path);
        self.posts.iter().find(|p| p.path == path)
    }

    fn query(&self, path: &str) -> Vec<&Post> {
        let path = page::normalize_path(path);
        self.posts
            .iter()
            .filter(|p| page::parent_path(&p.path) == Some(path.as_str()))
            .collect()
    }

    fn descendants(&self, path: &str) -> Vec<&Post> {
        let path = page::normalize_path(path);
        self.posts
            .iter()
            .filter(|p| page::is_descendant(&p.path, &path))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Builds a post from a path and a YAML frontmatter snippet.
    pub fn post(path: &str, yaml: &str) -> Post {
        if yaml.trim().is_empty() {
            return Post::new(path, Mapping::new());
        }
        let fields = match serde_yaml::from_str::<Value>(yaml).unwrap() {
            Value::Mapping(m) => m,
            Value::Null => Mapping::new(),
            other => panic!("frontmatter must be a mapping: {:?}", other),
        };
        Post::new(path, fields)
    }

    /// The three-post blog used throughout the tests.
    pub fn blog() -> Posts {
        Posts::new(vec![
            post("/", "title: Home"),
            post("/blog", "title: Blog"),
            post("/blog/post1", "title: post1\ntags: [tag1, tag2]"),
            post("/blog/post2", "title: post2\ntags: [tag1, tag3]"),
            post("/blog/post3", "title: post3"),
        ])
    }

    #[test]
    fn test_query_children() {
        let posts = blog();
        let children: Vec<&str> =
            posts.query("/blog").iter().map(|p| p.path()).collect();
        assert_eq!(children, vec!["/blog/post1", "/blog/post2", "/blog/post3"]);

        let top: Vec<&str> = posts.query("/").iter().map(|p| p.path()).collect();
        assert_eq!(top, vec!["/blog"]);
    }

    #[test]
    fn test_descendants() {
        let posts = Posts::new(vec![
            post("/blog", ""),
            post("/blog/2021", ""),
            post("/blog/2021/post", "tags: x"),
            post("/blogroll", ""),
        ]);
        let paths: Vec<&str> =
            posts.descendants("/blog").iter().map(|p| p.path()).collect();
        assert_eq!(paths, vec!["/blog/2021", "/blog/2021/post"]);
    }

    #[test]
    fn test_title_fallback() {
        assert_eq!(post("/blog/post1", "title: First").title(), "First");
        assert_eq!(post("/blog/post1", "").title(), "post1");
    }

    #[test]
    fn test_get_normalizes() {
        let posts = blog();
        assert_eq!(posts.get("blog/").map(|p| p.url_path()), Some("/blog/"));
        assert!(posts.get("/missing").is_none());
    }
}
