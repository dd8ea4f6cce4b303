//! Defines [`TagWeight`], the popularity score of one tag relative to the
//! least- and most-used tags, and [`TagWeights`], the weights of every tag
//! from one counting pass.
//!
//! Scores interpolate a tag's count between the global minimum and maximum
//! counts, either linearly or over the logarithm of the counts. The base of
//! the logarithm cancels out in the ratio; base 2 is used so that
//! power-of-two ratios come out exact.

use crate::count::{self, TagCount};
use crate::page::Page;
use std::cmp::Ordering;
use std::collections::btree_map::{self, BTreeMap};
use std::hash::{Hash, Hasher};

/// The weight of a single tag. Constructed only for observed tags, so every
/// count is at least one and `mincount <= count <= maxcount`.
#[derive(Clone, Copy, Debug)]
pub struct TagWeight {
    count: usize,
    mincount: usize,
    maxcount: usize,
}

impl TagWeight {
    /// Creates the weight of a tag used `count` times in a pass whose least
    /// and most used tags were used `mincount` and `maxcount` times.
    ///
    /// # Panics
    ///
    /// Panics unless `1 <= mincount <= count <= maxcount`.
    pub fn new(count: usize, mincount: usize, maxcount: usize) -> TagWeight {
        assert!(
            1 <= mincount && mincount <= count && count <= maxcount,
            "invalid tag weight: {} not in [{}, {}]",
            count,
            mincount,
            maxcount
        );
        TagWeight {
            count,
            mincount,
            maxcount,
        }
    }

    /// The number of times this tag was used.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The count of the least used tag in the same pass.
    pub fn mincount(&self) -> usize {
        self.mincount
    }

    /// The count of the most used tag in the same pass.
    pub fn maxcount(&self) -> usize {
        self.maxcount
    }

    /// Maps the count onto `[lower, upper]` linearly: the least used tag gets
    /// `lower`, the most used tag gets `upper`. When every tag has the same
    /// count, every tag gets `lower`.
    pub fn linear(&self, lower: f64, upper: f64) -> f64 {
        if self.mincount == self.maxcount {
            return lower;
        }
        let t = (self.count - self.mincount) as f64
            / (self.maxcount - self.mincount) as f64;
        interpolate(lower, upper, t)
    }

    /// Like [`TagWeight::linear`], over the logarithm of the count.
    pub fn log(&self, lower: f64, upper: f64) -> f64 {
        if self.mincount == self.maxcount {
            return lower;
        }
        let min = self.mincount as f64;
        let t = (self.count as f64 / min).log2()
            / (self.maxcount as f64 / min).log2();
        interpolate(lower, upper, t)
    }

    /// Picks an element of `groups` by linear weight: the least used tag
    /// gets the first element, the most used tag the last. Returns `None` if
    /// `groups` is empty.
    pub fn lineargroup<'g, T>(&self, groups: &'g [T]) -> Option<&'g T> {
        let last = groups.len().checked_sub(1)?;
        pick(groups, self.linear(0.0, last as f64))
    }

    /// Like [`TagWeight::lineargroup`], by logarithmic weight.
    pub fn loggroup<'g, T>(&self, groups: &'g [T]) -> Option<&'g T> {
        let last = groups.len().checked_sub(1)?;
        pick(groups, self.log(0.0, last as f64))
    }
}

/// `lower + (upper - lower) * t`, exact at both ends.
fn interpolate(lower: f64, upper: f64, t: f64) -> f64 {
    if t >= 1.0 {
        upper
    } else {
        lower + (upper - lower) * t
    }
}

/// Rounds `score` to the nearest index, ties away from zero.
fn pick<T>(groups: &[T], score: f64) -> Option<&T> {
    let index = score.round().max(0.0) as usize;
    groups.get(index.min(groups.len().saturating_sub(1)))
}

// Weights compare and hash by count alone. Two weights from different passes
// with equal counts are equal even if their bounds differ.

impl PartialEq for TagWeight {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
    }
}
impl Eq for TagWeight {}

impl PartialOrd for TagWeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TagWeight {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count.cmp(&other.count)
    }
}

impl Hash for TagWeight {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.count.hash(state)
    }
}

/// The [`TagWeight`] of every tag from one counting pass. All weights share
/// the same bounds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagWeights(BTreeMap<String, TagWeight>);

impl TagWeights {
    pub fn get(&self, tag: &str) -> Option<&TagWeight> {
        self.0.get(tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over tags and their weights in lexical tag order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, TagWeight> {
        self.0.iter()
    }

    /// Maps each tag to the number of pages tagged with it.
    pub fn count(&self) -> BTreeMap<&str, usize> {
        self.map(|w| w.count())
    }

    /// Maps each tag to [`TagWeight::linear`].
    pub fn linear(&self, lower: f64, upper: f64) -> BTreeMap<&str, f64> {
        self.map(|w| w.linear(lower, upper))
    }

    /// Maps each tag to [`TagWeight::log`].
    pub fn log(&self, lower: f64, upper: f64) -> BTreeMap<&str, f64> {
        self.map(|w| w.log(lower, upper))
    }

    /// Maps each tag to [`TagWeight::lineargroup`]. Empty if `groups` is.
    pub fn lineargroup<'g, T>(&self, groups: &'g [T]) -> BTreeMap<&str, &'g T> {
        self.filter_map(|w| w.lineargroup(groups))
    }

    /// Maps each tag to [`TagWeight::loggroup`]. Empty if `groups` is.
    pub fn loggroup<'g, T>(&self, groups: &'g [T]) -> BTreeMap<&str, &'g T> {
        self.filter_map(|w| w.loggroup(groups))
    }

    fn map<V>(&self, f: impl Fn(&TagWeight) -> V) -> BTreeMap<&str, V> {
        self.0.iter().map(|(t, w)| (t.as_str(), f(w))).collect()
    }

    fn filter_map<V>(
        &self,
        f: impl Fn(&TagWeight) -> Option<V>,
    ) -> BTreeMap<&str, V> {
        self.0
            .iter()
            .filter_map(|(t, w)| Some((t.as_str(), f(w)?)))
            .collect()
    }
}

impl From<&TagCount> for TagWeights {
    /// Computes the bounds of `tagcount` once and builds one weight per tag.
    /// An empty count yields no weights.
    fn from(tagcount: &TagCount) -> TagWeights {
        match tagcount.bounds() {
            None => TagWeights::default(),
            Some((mincount, maxcount)) => TagWeights(
                tagcount
                    .iter()
                    .map(|(tag, &n)| {
                        (tag.clone(), TagWeight::new(n, mincount, maxcount))
                    })
                    .collect(),
            ),
        }
    }
}

impl<'a> IntoIterator for &'a TagWeights {
    type Item = (&'a String, &'a TagWeight);
    type IntoIter = btree_map::Iter<'a, String, TagWeight>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Counts the tags in `field` across `pages` and weighs them.
pub fn tagweights<'a, P, I>(pages: I, field: &str) -> TagWeights
where
    P: Page + 'a,
    I: IntoIterator<Item = &'a P>,
{
    TagWeights::from(&count::count(pages, field))
}
