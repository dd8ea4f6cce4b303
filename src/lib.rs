//! The library code for `tagweights`, tag pages and tag-cloud weights for a
//! static site. A build breaks down into three steps:
//!
//! 1. Loading the pages of the site ([`crate::parser`], [`crate::post`])
//! 2. Counting and weighing the tags under a configured parent page
//!    ([`crate::count`], [`crate::weight`])
//! 3. Generating one page per tag, registering its URL and rendering it
//!    ([`crate::tag`], [`crate::write`])
//!
//! The second step is the interesting one. Each tag's usage count is placed
//! between the counts of the least and most used tags, linearly or on a log
//! scale, and optionally bucketed into one of a list of groups (CSS classes,
//! font sizes, ...).
//!
//! All state lives in a [`crate::context::BuildContext`] which is created
//! fresh for each build. Hosts other than the bundled Markdown loader plug in
//! through the [`crate::page::Site`] and [`crate::page::Page`] traits.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod context;
pub mod count;
pub mod page;
pub mod parser;
pub mod post;
pub mod tag;
pub mod value;
pub mod weight;
pub mod write;

pub use count::{count, TagCount, TagField};
pub use weight::{tagweights, TagWeight, TagWeights};
