//! The content collection loader used by the HTTP endpoints. Unlike the
//! directory collector in [`crate::collect`], it walks the posts directory
//! recursively, derives slugs from file paths rather than titles, keeps
//! publish dates, and refuses to load a collection containing a broken post.

use crate::collect::is_post_file;
use crate::post::{Error as ParseError, Frontmatter, PostRecord};
use std::fmt;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Loads every post under `dir`, ordered by path. The slug of
/// `dir/guides/Getting Started.md` is `guides/getting-started`.
pub fn load_collection(dir: &Path) -> Result<Vec<PostRecord>> {
    let mut posts = Vec::new();
    for result in WalkDir::new(dir).sort_by_file_name() {
        let entry = result?;
        if !entry.file_type().is_file() || !is_post_file(entry.path()) {
            continue;
        }

        // strip_prefix() shouldn't fail since `dir` is the walk root
        let relative_path =
            entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let contents = read_to_string(entry.path()).map_err(|err| Error::Read {
            path: entry.path().to_owned(),
            err,
        })?;
        posts.push(parse_entry(relative_path, &contents).map_err(|err| {
            Error::InvalidPost {
                path: entry.path().to_owned(),
                err,
            }
        })?);
    }
    Ok(posts)
}

fn parse_entry(
    relative_path: &Path,
    contents: &str,
) -> std::result::Result<PostRecord, ParseError> {
    let frontmatter = Frontmatter::parse(contents)?;
    Ok(PostRecord {
        slug: path_slug(relative_path),
        pub_date: frontmatter.pub_date()?,
        title: frontmatter.title,
        description: frontmatter.description,
    })
}

/// Slugifies each component of `relative_path`, minus the extension, and
/// joins them with `/`.
pub fn path_slug(relative_path: &Path) -> String {
    relative_path
        .with_extension("")
        .components()
        .map(|c| slug::slugify(c.as_os_str().to_string_lossy()))
        .collect::<Vec<String>>()
        .join("/")
}

/// Represents the result of loading a collection.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading the content collection.
#[derive(Debug)]
pub enum Error {
    /// Returned when walking the posts directory fails.
    WalkDir(walkdir::Error),

    /// Returned when a post file can't be read.
    Read { path: PathBuf, err: std::io::Error },

    /// Returned when a post's frontmatter can't be parsed.
    InvalidPost { path: PathBuf, err: ParseError },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::WalkDir(err) => err.fmt(f),
            Error::Read { path, err } => {
                write!(f, "Reading post '{}': {}", path.display(), err)
            }
            Error::InvalidPost { path, err } => {
                write!(f, "parsing post `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::WalkDir(err) => Some(err),
            Error::Read { path: _, err } => Some(err),
            Error::InvalidPost { path: _, err } => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator while walking the posts directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_collection() -> Result<()> {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("guides")).unwrap();
        fs::write(
            dir.path().join("hello.md"),
            "---\ntitle: Hello\ndescription: World\npubDate: Jul 08 2022\n---\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("guides").join("Getting Started.mdx"),
            "---\ntitle: Getting started\n---\n",
        )
        .unwrap();
        fs::write(dir.path().join("README.txt"), "not a post").unwrap();

        let posts = load_collection(dir.path())?;
        assert_eq!(2, posts.len());
        assert_eq!("guides/getting-started", posts[0].slug);
        assert_eq!(None, posts[0].pub_date);
        assert_eq!("hello", posts[1].slug);
        assert_eq!("World", posts[1].description);
        assert_eq!(
            Some(Utc.with_ymd_and_hms(2022, 7, 8, 0, 0, 0).unwrap()),
            posts[1].pub_date
        );
        Ok(())
    }

    #[test]
    fn test_duplicate_titles_keep_path_slugs() -> Result<()> {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.md"), "---\ntitle: Same\n---\n").unwrap();
        fs::write(dir.path().join("two.md"), "---\ntitle: Same\n---\n").unwrap();

        let slugs: Vec<String> = load_collection(dir.path())?
            .into_iter()
            .map(|p| p.slug)
            .collect();
        assert_eq!(vec!["one", "two"], slugs);
        Ok(())
    }

    #[test]
    fn test_broken_post_fails_the_load() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ok.md"), "---\ntitle: Ok\n---\n").unwrap();
        fs::write(
            dir.path().join("bad.md"),
            "---\ntitle: Bad\npubDate: someday\n---\n",
        )
        .unwrap();

        assert!(matches!(
            load_collection(dir.path()),
            Err(Error::InvalidPost { .. })
        ));
    }

    #[test]
    fn test_empty_collection() -> Result<()> {
        let dir = TempDir::new().unwrap();
        assert!(load_collection(dir.path())?.is_empty());
        Ok(())
    }
}
