//! Defines [`BuildContext`], the state of one build: the pages in scope, the
//! memoized tag counts and weights, and the [`Registry`] of tag page URLs.
//! Nothing here outlives the context; a new build gets a new context and
//! recomputes everything.

use crate::config::{Scope, TagsConfig};
use crate::count::{self, TagCount, TagField};
use crate::page::{self, Page, Site};
use crate::tag::{self, Registry, TagPage, TagPageId};
use crate::weight::TagWeights;
use std::cell::OnceCell;
use std::collections::BTreeSet;

pub struct BuildContext<'s, S: Site> {
    site: &'s S,
    config: &'s TagsConfig,
    pages: OnceCell<Vec<&'s S::Page>>,
    tagcount: OnceCell<TagCount>,
    tagweights: OnceCell<TagWeights>,
    registry: Registry,
}

impl<'s, S: Site> BuildContext<'s, S> {
    pub fn new(site: &'s S, config: &'s TagsConfig) -> BuildContext<'s, S> {
        BuildContext {
            site,
            config,
            pages: OnceCell::new(),
            tagcount: OnceCell::new(),
            tagweights: OnceCell::new(),
            registry: Registry::new(),
        }
    }

    pub fn site(&self) -> &'s S {
        self.site
    }

    pub fn config(&self) -> &'s TagsConfig {
        self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The pages under the configured parent that take part in tagging:
    /// its children, or its whole subtree for [`Scope::Descendants`].
    pub fn pages(&self) -> &[&'s S::Page] {
        self.pages.get_or_init(|| match self.config.items_scope {
            Scope::Children => self.site.query(&self.config.parent),
            Scope::Descendants => self.site.descendants(&self.config.parent),
        })
    }

    /// Counts the tags of [`BuildContext::pages`]. Computed once per context.
    pub fn tagcount(&self) -> &TagCount {
        self.tagcount.get_or_init(|| {
            count::count(self.pages().iter().copied(), &self.config.tags_field)
        })
    }

    /// Weighs the tags of [`BuildContext::pages`]. Computed once per context.
    pub fn tagweights(&self) -> &TagWeights {
        self.tagweights
            .get_or_init(|| TagWeights::from(self.tagcount()))
    }

    /// The tags that get a tag page: the configured list if there is one,
    /// otherwise every distinct tag in scope.
    pub fn all_tags(&self) -> BTreeSet<String> {
        match &self.config.tags {
            Some(tags) => tags.iter().cloned().collect(),
            None => self.tagcount().tags().map(|t| t.to_owned()).collect(),
        }
    }

    /// The pages in scope carrying `tag`, in site order.
    pub fn items_for(&self, tag: &str) -> Vec<&'s S::Page> {
        self.pages()
            .iter()
            .copied()
            .filter(|p| TagField::read(*p, &self.config.tags_field).contains(tag))
            .collect()
    }

    /// The URL path of the configured parent page. A parent missing from the
    /// site still gets the default URL for its path.
    pub fn parent_url_path(&self) -> String {
        match self.site.get(&self.config.parent) {
            Some(parent) => parent.url_path().to_owned(),
            None => {
                log::warn!(
                    "parent page `{}` not found; using its default URL",
                    self.config.parent
                );
                page::url_path_for(&self.config.parent)
            }
        }
    }

    /// Synthesizes a tag page for every tag and registers its URL.
    pub fn generate(&mut self) -> tag::Result<Vec<TagPage<'s, S::Page>>> {
        let parent_url = self.parent_url_path();
        let mut pages = Vec::new();
        for tag in self.all_tags() {
            let id = TagPageId::new(&self.config.parent, &tag);
            let url_path = self.config.url_path.render(&id, &parent_url)?;
            self.registry.register(id.clone(), &url_path)?;
            pages.push(TagPage::new(id));
        }
        log::info!(
            "generated {} tag pages under {}",
            pages.len(),
            self.config.parent
        );
        Ok(pages)
    }

    /// The tag page served at `url_path`, if one was generated.
    pub fn resolve_url(&self, url_path: &str) -> Option<TagPage<'s, S::Page>> {
        self.registry
            .resolve(url_path)
            .map(|id| TagPage::new(id.clone()))
    }

    /// Resolves a virtual path below a page: the parent page followed by a
    /// single tag names that tag's page. The page need not be registered.
    pub fn resolve_virtual_path(
        &self,
        node_path: &str,
        pieces: &[&str],
    ) -> Option<TagPage<'s, S::Page>> {
        if page::normalize_path(node_path) != self.config.parent {
            return None;
        }
        match pieces {
            [tag] if !tag.is_empty() => {
                Some(TagPage::new(TagPageId::new(&self.config.parent, tag)))
            }
            _ => None,
        }
    }
}
