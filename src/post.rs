//! Defines the [`PostRecord`] and [`PostMetadata`] types along with the logic
//! for parsing a post's frontmatter out of its source text. Collectors (see
//! [`crate::collect`] and [`crate::collection`]) decide how slugs are assigned
//! and which fields survive into the record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single blog post as produced by a collector. Records are immutable once
/// collected.
#[derive(Clone, Debug, PartialEq)]
pub struct PostRecord {
    /// The URL-safe identifier of the post. Unique within one build for the
    /// directory collector.
    pub slug: String,

    /// The title of the post.
    pub title: String,

    /// The short description shown in listings and the feed.
    pub description: String,

    /// The publish date, if the collector exposes one.
    pub pub_date: Option<DateTime<Utc>>,
}

/// The externally visible projection of a [`PostRecord`]. This is what ends up
/// in `post-metadata.json` and what the search index is built from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub slug: String,
    pub title: String,
    pub description: String,

    #[serde(
        rename = "pubDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pub_date: Option<DateTime<Utc>>,
}

impl From<&PostRecord> for PostMetadata {
    fn from(post: &PostRecord) -> PostMetadata {
        PostMetadata {
            slug: post.slug.clone(),
            title: post.title.clone(),
            description: post.description.clone(),
            pub_date: post.pub_date,
        }
    }
}

/// Projects a batch of records into metadata, preserving order.
pub fn to_metadata(posts: &[PostRecord]) -> Vec<PostMetadata> {
    posts.iter().map(PostMetadata::from).collect()
}

/// The frontmatter fields we care about. Anything else in the YAML block
/// (tags, hero images, drafts) is ignored.
#[derive(Deserialize, Clone, Debug)]
pub struct Frontmatter {
    /// The title of the post.
    pub title: String,

    /// The description of the post. Missing descriptions are treated as
    /// empty.
    #[serde(default)]
    pub description: String,

    /// The raw publish date. Only parsed by collectors that expose it (see
    /// [`Frontmatter::pub_date`]).
    #[serde(default, rename = "pubDate")]
    pub raw_pub_date: Option<String>,
}

impl Frontmatter {
    /// Parses the frontmatter block at the head of `input`. The input must be
    /// structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with a `title` and optionally `description` and
    ///    `pubDate`
    /// 3. Terminal frontmatter fence (`---`) on its own line
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// description: My first post
    /// pubDate: 2023-07-01
    /// ---
    /// # Hello
    /// ```
    pub fn parse(input: &str) -> Result<Frontmatter> {
        let (yaml_start, yaml_stop) = frontmatter_indices(input)?;
        Ok(serde_yaml::from_str(&input[yaml_start..yaml_stop])?)
    }

    /// Parses the `pubDate` field, if present.
    pub fn pub_date(&self) -> Result<Option<DateTime<Utc>>> {
        match &self.raw_pub_date {
            None => Ok(None),
            Some(raw) => parse_date(raw).map(Some),
        }
    }
}

// Returns the byte range of the YAML between the fences.
fn frontmatter_indices(input: &str) -> Result<(usize, usize)> {
    const FENCE: &str = "---";
    let offset = if input.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };
    let rest = &input[offset..];
    if !rest.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }

    let yaml_start = offset + FENCE.len();
    let mut cursor = yaml_start;
    for line in input[yaml_start..].split_inclusive('\n') {
        // The remainder of the opening fence line is not YAML.
        if cursor != yaml_start && line.trim_end() == FENCE {
            return Ok((yaml_start, cursor));
        }
        cursor += line.len();
    }
    Err(Error::FrontmatterMissingEndFence)
}

/// Parses the date formats seen in post frontmatter: RFC 3339 timestamps,
/// plain `YYYY-MM-DD` dates, and `Jul 08 2022` style dates. Plain dates are
/// taken to be midnight UTC.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date_time.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d", "%b %d %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(midnight.and_utc());
            }
        }
    }
    Err(Error::InvalidDate(raw.to_owned()))
}

/// Represents the result of a frontmatter-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a post's frontmatter.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when the starting fence was found but the terminal one was
    /// missing.
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML,
    /// including a missing `title`.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when `pubDate` isn't in any of the supported formats.
    InvalidDate(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::InvalidDate(raw) => write!(f, "invalid pubDate `{}`", raw),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidDate(_) => None,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}
