//! The library code for `postindex`, which produces the data files behind my
//! blog's search box and feed. Every run goes through the same three steps:
//!
//! 1. Collecting posts from source files on disk ([`crate::collect`] for the
//!    `index` command, [`crate::collection`] for the HTTP endpoints)
//! 2. Building a fuzzy-search index over their titles and descriptions
//!    ([`crate::index`])
//! 3. Serializing the metadata and index ([`crate::write`]) or the RSS feed
//!    ([`crate::feed`])
//!
//! The `index` command ([`crate::build`]) writes `post-metadata.json` and
//! `post-index.json` into the output directory. The `serve` command
//! ([`crate::serve`]) answers `/post-metadata.json`, `/post-index.json` and
//! `/rss.xml`, rebuilding the response on every request.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod collect;
pub mod collection;
pub mod config;
pub mod feed;
pub mod index;
pub mod post;
pub mod serve;
pub mod slugger;
pub mod write;
