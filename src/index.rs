//! Builds the fuzzy-search index over post metadata.
//!
//! The serialized form follows the layout fuse.js uses for prebuilt indexes
//! (`{ keys, records }`), so the browser can hand `post-index.json` straight to
//! `Fuse.parseIndex`. Each record keeps, per indexed field, the raw value and a
//! field-length norm that down-weights long fields.
//!
//! [`SearchIndex::search`] runs queries against the index with the `nucleo`
//! matcher. The site's search box does its matching client-side; this is what
//! the tests and the command line use.

use crate::post::PostMetadata;
use nucleo::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo::{Config, Matcher, Utf32Str};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The metadata fields indexed for search, in key order.
pub const INDEXED_FIELDS: [&str; 2] = ["title", "description"];

/// The number of decimals kept for field norms.
const NORM_MANTISSA: i32 = 3;

/// A prebuilt search index. Always derived from a slice of [`PostMetadata`];
/// rebuilt from scratch rather than updated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchIndex {
    /// The indexed fields. Field values in [`IndexRecord`]s refer to keys by
    /// position.
    pub keys: Vec<IndexKey>,

    /// One record per post, in metadata order.
    pub records: Vec<IndexRecord>,
}

/// An indexed field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexKey {
    pub path: Vec<String>,
    pub id: String,

    /// This key's share of the total weight across all keys.
    pub weight: f64,

    pub src: String,

    /// Always `null`. Present so fuse.js recognizes the key.
    #[serde(rename = "getFn", default)]
    pub get_fn: Option<String>,
}

/// The indexed values of a single post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Position of the post in the metadata the index was built from.
    #[serde(rename = "i")]
    pub ref_index: usize,

    /// Field values keyed by key position. Blank fields are left out.
    #[serde(rename = "$")]
    pub fields: BTreeMap<usize, FieldValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(rename = "v")]
    pub value: String,

    #[serde(rename = "n")]
    pub norm: f64,
}

/// A post matching a query.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    /// Position of the post in the indexed metadata.
    pub ref_index: usize,
    pub score: f64,
}

impl SearchIndex {
    /// Builds an index over [`INDEXED_FIELDS`].
    pub fn build(posts: &[PostMetadata]) -> SearchIndex {
        SearchIndex::with_fields(&INDEXED_FIELDS, posts)
    }

    /// Builds an index over an explicit list of fields. Unknown field names
    /// produce a key with no values.
    pub fn with_fields(fields: &[&str], posts: &[PostMetadata]) -> SearchIndex {
        let weight = 1.0 / fields.len().max(1) as f64;
        let keys = fields
            .iter()
            .map(|field| IndexKey {
                path: vec![field.to_string()],
                id: field.to_string(),
                weight,
                src: field.to_string(),
                get_fn: None,
            })
            .collect();

        let records = posts
            .iter()
            .enumerate()
            .map(|(ref_index, post)| IndexRecord {
                ref_index,
                fields: fields
                    .iter()
                    .enumerate()
                    .filter_map(|(key_index, field)| {
                        let value = field_value(post, field)?;
                        if value.trim().is_empty() {
                            return None;
                        }
                        Some((
                            key_index,
                            FieldValue {
                                value: value.to_owned(),
                                norm: field_norm(value),
                            },
                        ))
                    })
                    .collect(),
            })
            .collect();

        SearchIndex { keys, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fuzzy-matches `query` against every indexed field. A record matches if
    /// any of its fields do; its score sums `weight * norm * match_score` over
    /// the matching fields. Hits are ordered best first, ties broken by
    /// position. Blank queries match nothing. Every character of the query is
    /// matched literally, so `!`, `^`, `$` and `'` carry no special meaning.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let pattern = Pattern::new(
            query,
            CaseMatching::Smart,
            Normalization::Smart,
            AtomKind::Fuzzy,
        );
        let mut matcher = Matcher::new(Config::DEFAULT);
        let mut buf = Vec::new();

        let mut hits: Vec<SearchHit> = self
            .records
            .iter()
            .filter_map(|record| {
                let mut score = 0.0;
                let mut matched = false;
                for (key_index, field) in &record.fields {
                    let haystack = Utf32Str::new(&field.value, &mut buf);
                    if let Some(field_score) = pattern.score(haystack, &mut matcher) {
                        let weight =
                            self.keys.get(*key_index).map_or(0.0, |k| k.weight);
                        score += weight * field.norm * f64::from(field_score);
                        matched = true;
                    }
                }
                matched.then(|| SearchHit {
                    ref_index: record.ref_index,
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.ref_index.cmp(&b.ref_index))
        });
        hits
    }
}

fn field_value<'a>(post: &'a PostMetadata, field: &str) -> Option<&'a str> {
    match field {
        "slug" => Some(&post.slug),
        "title" => Some(&post.title),
        "description" => Some(&post.description),
        _ => None,
    }
}

/// `1 / sqrt(tokens)`, rounded to [`NORM_MANTISSA`] decimals, where tokens are
/// runs of non-space characters.
fn field_norm(value: &str) -> f64 {
    let tokens = value.split(' ').filter(|t| !t.is_empty()).count().max(1);
    let scale = 10f64.powi(NORM_MANTISSA);
    ((1.0 / (tokens as f64).sqrt()) * scale).round() / scale
}
