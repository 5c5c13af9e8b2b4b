//! The directory collector used by the `index` command. It reads every post
//! file directly inside the posts directory, parses its frontmatter, and slugs
//! its title with a [`Slugger`].
//!
//! Posts with broken frontmatter are logged and skipped so a single bad draft
//! can't take the whole index down. Bytes that aren't valid UTF-8 are replaced
//! with U+FFFD rather than rejected. I/O errors are still fatal.

use crate::post::{Frontmatter, PostRecord};
use crate::slugger::Slugger;
use std::fmt;
use std::fs::{read, read_dir};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions of the files treated as posts.
pub const POST_EXTENSIONS: [&str; 2] = ["md", "mdx"];

/// Reports whether `path` names a post source file.
pub fn is_post_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| POST_EXTENSIONS.contains(&ext))
}

/// Collects the posts in `dir` in file-name order. Slugs are derived from the
/// titles using `slugger`, which is handed back alongside the records. Publish
/// dates are not collected by this variant.
pub fn collect_posts(
    dir: &Path,
    mut slugger: Slugger,
) -> Result<(Vec<PostRecord>, Slugger)> {
    let mut posts = Vec::new();
    for path in post_files(dir)? {
        let bytes = read(&path).map_err(|err| Error::Read {
            path: path.clone(),
            err,
        })?;
        let contents = String::from_utf8_lossy(&bytes);
        match Frontmatter::parse(&contents) {
            Ok(frontmatter) => posts.push(PostRecord {
                slug: slugger.slug(&frontmatter.title),
                title: frontmatter.title,
                description: frontmatter.description,
                pub_date: None,
            }),
            Err(err) => warn!(
                path = %path.display(),
                error = %err,
                "skipping post with malformed frontmatter"
            ),
        }
    }
    Ok((posts, slugger))
}

// Lists the post files directly inside `dir`, sorted by file name.
fn post_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let list_err = |err: std::io::Error| Error::ListDirectory {
        path: dir.to_owned(),
        err,
    };

    let mut files = Vec::new();
    for result in read_dir(dir).map_err(list_err)? {
        let entry = result.map_err(list_err)?;
        let path = entry.path();
        if entry.file_type().map_err(list_err)?.is_file() && is_post_file(&path)
        {
            files.push(path);
        } else {
            debug!(path = %path.display(), "ignoring non-post entry");
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Represents the result of a collection operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error collecting posts from a directory.
#[derive(Debug)]
pub enum Error {
    /// Returned when the posts directory can't be listed.
    ListDirectory { path: PathBuf, err: std::io::Error },

    /// Returned when a post file can't be read.
    Read { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ListDirectory { path, err } => {
                write!(f, "Listing posts directory '{}': {}", path.display(), err)
            }
            Error::Read { path, err } => {
                write!(f, "Reading post '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ListDirectory { path: _, err } => Some(err),
            Error::Read { path: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    fn write_post(dir: &Path, name: &str, title: &str, description: &str) {
        fs::write(
            dir.join(name),
            format!(
                "---\ntitle: {}\ndescription: {}\npubDate: 2023-01-01\n---\nBody\n",
                title, description
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_duplicate_titles_in_enumeration_order() -> Result<()> {
        let dir = TempDir::new().unwrap();
        write_post(dir.path(), "a.md", "My Post", "first");
        write_post(dir.path(), "b.md", "My Post", "second");

        let (posts, _) = collect_posts(dir.path(), Slugger::new())?;
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(vec!["my-post", "my-post-1"], slugs);
        assert_eq!("first", posts[0].description);
        assert_eq!("second", posts[1].description);
        Ok(())
    }

    #[test]
    fn test_one_record_per_file() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let titles = ["Alpha", "Beta", "Gamma", "Delta!", "delta"];
        for (i, title) in titles.iter().enumerate() {
            write_post(dir.path(), &format!("{}.mdx", i), title, "d");
        }

        let (posts, slugger) = collect_posts(dir.path(), Slugger::new())?;
        assert_eq!(titles.len(), posts.len());
        let slugs: HashSet<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(titles.len(), slugs.len());
        assert_eq!(titles.len(), slugger.len());
        assert!(posts.iter().all(|p| p.pub_date.is_none()));
        Ok(())
    }

    #[test]
    fn test_skips_malformed_and_foreign_files() -> Result<()> {
        let dir = TempDir::new().unwrap();
        write_post(dir.path(), "good.md", "Good", "fine");
        fs::write(dir.path().join("bad.md"), "no frontmatter here").unwrap();
        fs::write(dir.path().join("untitled.md"), "---\ndescription: x\n---\n")
            .unwrap();
        fs::write(dir.path().join("notes.txt"), "---\ntitle: Notes\n---\n").unwrap();
        fs::create_dir(dir.path().join("nested.md")).unwrap();

        let (posts, _) = collect_posts(dir.path(), Slugger::new())?;
        assert_eq!(1, posts.len());
        assert_eq!("good", posts[0].slug);
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() -> Result<()> {
        let dir = TempDir::new().unwrap();
        write_post(dir.path(), "a.md", "Alpha", "fine");
        fs::write(
            dir.path().join("b.md"),
            b"---\ntitle: Caf\xe9\ndescription: latin-1\n---\n",
        )
        .unwrap();

        let (posts, _) = collect_posts(dir.path(), Slugger::new())?;
        assert_eq!(2, posts.len());
        assert_eq!("alpha", posts[0].slug);
        assert_eq!("Caf\u{fffd}", posts[1].title);
        assert_eq!("latin-1", posts[1].description);
        Ok(())
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = collect_posts(&dir.path().join("missing"), Slugger::new());
        assert!(matches!(result, Err(Error::ListDirectory { .. })));
    }
}
