//! Exports the [`build_index`] function which stitches together the steps of
//! the `index` command: collecting the posts ([`crate::collect`]), building the
//! search index ([`crate::index`]), and writing both to the output directory
//! ([`crate::write`]).

use crate::collect::{collect_posts, Error as CollectError};
use crate::config::Config;
use crate::index::SearchIndex;
use crate::post::to_metadata;
use crate::slugger::Slugger;
use crate::write::{write_outputs, Error as WriteError};
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// What a build produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSummary {
    /// The number of posts written to the metadata file.
    pub posts: usize,

    /// The directory the two files were written to.
    pub output_directory: PathBuf,
}

/// Builds `post-metadata.json` and `post-index.json` from a [`Config`]. The
/// output directory is only created once every post has been collected, so a
/// failed build leaves nothing behind.
pub fn build_index(config: &Config) -> Result<BuildSummary> {
    let (posts, _) = collect_posts(&config.posts_directory, Slugger::new())?;
    info!(
        posts = posts.len(),
        directory = %config.posts_directory.display(),
        "collected posts"
    );

    let metadata = to_metadata(&posts);
    let index = SearchIndex::build(&metadata);
    write_outputs(&config.output_directory, &metadata, &index)?;

    Ok(BuildSummary {
        posts: metadata.len(),
        output_directory: config.output_directory.clone(),
    })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building the index. Errors can be during collection or
/// writing.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors while collecting posts.
    Collect(CollectError),

    /// Returned for errors writing the output files.
    Write(WriteError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Collect(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Collect(err) => Some(err),
            Error::Write(err) => Some(err),
        }
    }
}

impl From<CollectError> for Error {
    /// Converts [`CollectError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: CollectError) -> Error {
        Error::Collect(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}
