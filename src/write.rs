//! Serializes post metadata and search indexes, either into JSON bodies for
//! the HTTP endpoints or into files in the output directory.

use crate::index::SearchIndex;
use crate::post::PostMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The file name of the serialized metadata array.
pub const METADATA_FILE_NAME: &str = "post-metadata.json";

/// The file name of the serialized search index.
pub const INDEX_FILE_NAME: &str = "post-index.json";

/// The combined body served by `/post-index.json` since version 2 of the
/// endpoint. Version 1 served the bare index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostIndexDocument {
    pub index: SearchIndex,
    pub metadata: Vec<PostMetadata>,
}

impl PostIndexDocument {
    /// The current version of the `/post-index.json` body.
    pub const VERSION: u32 = 2;

    /// Builds the index from `metadata` and bundles both together.
    pub fn new(metadata: Vec<PostMetadata>) -> PostIndexDocument {
        PostIndexDocument {
            index: SearchIndex::build(&metadata),
            metadata,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Serializes the metadata as a JSON array.
pub fn metadata_json(metadata: &[PostMetadata]) -> Result<String> {
    Ok(serde_json::to_string(metadata)?)
}

/// Serializes the bare index object.
pub fn index_json(index: &SearchIndex) -> Result<String> {
    Ok(serde_json::to_string(index)?)
}

/// Writes [`METADATA_FILE_NAME`] and then [`INDEX_FILE_NAME`] into
/// `output_directory`, creating the directory first if needed. The two writes
/// aren't atomic: if the second fails, the first file is left in place.
pub fn write_outputs(
    output_directory: &Path,
    metadata: &[PostMetadata],
    index: &SearchIndex,
) -> Result<()> {
    create_dir_all(output_directory).map_err(|err| Error::CreateDirectory {
        path: output_directory.to_owned(),
        err,
    })?;

    let metadata_path = output_directory.join(METADATA_FILE_NAME);
    write_file(&metadata_path, metadata_json(metadata)?)?;
    debug!(path = %metadata_path.display(), posts = metadata.len(), "wrote metadata");

    let index_path = output_directory.join(INDEX_FILE_NAME);
    write_file(&index_path, index_json(index)?)?;
    debug!(path = %index_path.display(), records = index.len(), "wrote index");
    Ok(())
}

fn write_file(path: &Path, contents: String) -> Result<()> {
    write(path, contents).map_err(|err| Error::WriteFile {
        path: path.to_owned(),
        err,
    })
}

/// The result of a fallible serialization operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error serializing or writing outputs.
#[derive(Debug)]
pub enum Error {
    /// Returned when the value can't be serialized to JSON.
    Json(serde_json::Error),

    /// Returned when the output directory can't be created.
    CreateDirectory { path: PathBuf, err: std::io::Error },

    /// Returned when an output file can't be written.
    WriteFile { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Json(err) => err.fmt(f),
            Error::CreateDirectory { path, err } => {
                write!(f, "Creating directory '{}': {}", path.display(), err)
            }
            Error::WriteFile { path, err } => {
                write!(f, "Writing file '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(err) => Some(err),
            Error::CreateDirectory { path: _, err } => Some(err),
            Error::WriteFile { path: _, err } => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator for serialization.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn metadata() -> Vec<PostMetadata> {
        vec![
            PostMetadata {
                slug: String::from("hello"),
                title: String::from("Hello"),
                description: String::from("World"),
                pub_date: Some(Utc.with_ymd_and_hms(2023, 7, 1, 0, 0, 0).unwrap()),
            },
            PostMetadata {
                slug: String::from("quotes"),
                title: String::from("\"Quoted\" title"),
                description: String::from("line\nbreak"),
                pub_date: None,
            },
        ]
    }

    #[test]
    fn test_metadata_round_trip() -> Result<()> {
        let metadata = metadata();
        let parsed: Vec<PostMetadata> =
            serde_json::from_str(&metadata_json(&metadata)?)?;
        assert_eq!(metadata, parsed);
        Ok(())
    }

    #[test]
    fn test_empty_metadata() -> Result<()> {
        assert_eq!("[]", metadata_json(&[])?);
        Ok(())
    }

    #[test]
    fn test_combined_document() -> Result<()> {
        let document = PostIndexDocument::new(metadata());
        let value: serde_json::Value = serde_json::from_str(&document.to_json()?)?;
        assert_eq!(2, value["metadata"].as_array().map_or(0, Vec::len));
        assert_eq!(2, value["index"]["records"].as_array().map_or(0, Vec::len));
        assert_eq!("2023-07-01T00:00:00Z", value["metadata"][0]["pubDate"]);

        let parsed: PostIndexDocument = serde_json::from_str(&document.to_json()?)?;
        assert_eq!(document, parsed);
        Ok(())
    }

    #[test]
    fn test_write_outputs_creates_directory() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("dist");
        let metadata = metadata();
        let index = SearchIndex::build(&metadata);

        write_outputs(&output, &metadata, &index)?;
        // rerunning over existing output is fine
        write_outputs(&output, &metadata, &index)?;

        let written: Vec<PostMetadata> = serde_json::from_str(
            &fs::read_to_string(output.join(METADATA_FILE_NAME)).unwrap(),
        )?;
        assert_eq!(metadata, written);
        let written: SearchIndex = serde_json::from_str(
            &fs::read_to_string(output.join(INDEX_FILE_NAME)).unwrap(),
        )?;
        assert_eq!(index, written);
        Ok(())
    }

    #[test]
    fn test_unwritable_output() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("dist");
        fs::write(&blocker, "a file, not a directory").unwrap();

        let result = write_outputs(&blocker, &[], &SearchIndex::build(&[]));
        assert!(matches!(result, Err(Error::CreateDirectory { .. })));
    }
}
