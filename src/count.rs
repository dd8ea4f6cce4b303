//! Counting tag usage across a set of pages. The tag field of a page is
//! decoded once into a [`TagField`] and tallied into a [`TagCount`].

use crate::page::Page;
use serde_yaml::Value;
use std::collections::btree_map::{self, BTreeMap};
use std::iter::FromIterator;

/// The decoded contents of a page's tag field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagField {
    /// The field is missing, null or empty.
    Absent,

    /// The field holds a single tag.
    Scalar(String),

    /// The field holds a sequence of tags.
    Many(Vec<String>),
}

impl TagField {
    /// Decodes a raw field value. Never fails: values that can't be read as
    /// tags are dropped with a warning.
    pub fn decode(value: Option<&Value>) -> TagField {
        match value {
            None | Some(Value::Null) => TagField::Absent,
            Some(Value::Sequence(items)) => TagField::Many(
                items
                    .iter()
                    .filter_map(|item| {
                        let tag = scalar(item);
                        if tag.is_none() && !is_blank(item) {
                            log::warn!("ignoring non-scalar tag {:?}", item);
                        }
                        tag
                    })
                    .collect(),
            ),
            Some(value) => match scalar(value) {
                Some(tag) => TagField::Scalar(tag),
                None => {
                    if !is_blank(value) {
                        log::warn!("ignoring tag field {:?}", value);
                    }
                    TagField::Absent
                }
            },
        }
    }

    /// Reads `field` from `page` and decodes it.
    pub fn read<P: Page + ?Sized>(page: &P, field: &str) -> TagField {
        TagField::decode(page.lookup(field))
    }

    /// Iterates over the tags in the field.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        let tags: &[String] = match self {
            TagField::Absent => &[],
            TagField::Scalar(tag) => std::slice::from_ref(tag),
            TagField::Many(tags) => tags,
        };
        tags.iter().map(|t| t.as_str())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags().any(|t| t == tag)
    }
}

/// Reads a YAML scalar as a tag. Empty strings are not tags.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Maps each tag to the number of times it was observed. A tag that was never
/// observed has no entry; every count is at least one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagCount(BTreeMap<String, usize>);

impl TagCount {
    pub fn new() -> TagCount {
        TagCount::default()
    }

    /// Records one occurrence of `tag`.
    pub fn add(&mut self, tag: &str) {
        match self.0.get_mut(tag) {
            Some(n) => *n += 1,
            None => {
                self.0.insert(tag.to_owned(), 1);
            }
        }
    }

    pub fn get(&self, tag: &str) -> Option<usize> {
        self.0.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The sum of all counts.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// The smallest and largest counts, or `None` if no tag was observed.
    pub fn bounds(&self) -> Option<(usize, usize)> {
        let min = self.0.values().min()?;
        let max = self.0.values().max()?;
        Some((*min, *max))
    }

    /// Iterates over the distinct tags in lexical order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|t| t.as_str())
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, usize> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a TagCount {
    type Item = (&'a String, &'a usize);
    type IntoIter = btree_map::Iter<'a, String, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'t> FromIterator<&'t str> for TagCount {
    /// Tallies a stream of tag occurrences.
    fn from_iter<I: IntoIterator<Item = &'t str>>(iter: I) -> TagCount {
        let mut count = TagCount::new();
        for tag in iter {
            count.add(tag);
        }
        count
    }
}

/// Counts the tags held in `field` across `pages`. Pages without the field
/// are skipped. The caller decides which pages are relevant.
pub fn count<'a, P, I>(pages: I, field: &str) -> TagCount
where
    P: Page + 'a,
    I: IntoIterator<Item = &'a P>,
{
    let mut tagcount = TagCount::new();
    for page in pages {
        let tags = TagField::read(page, field);
        if let TagField::Absent = tags {
            log::debug!("{}: no `{}` field", page.path(), field);
            continue;
        }
        for tag in tags.tags() {
            tagcount.add(tag);
        }
    }
    tagcount
}
