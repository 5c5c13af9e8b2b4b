//! Loads the project configuration. Every setting has a default, so a blog
//! without a `postindex.yaml` builds from `src/content/posts` into `dist`.

use crate::feed::FeedConfig;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE_NAME: &str = "postindex.yaml";

const DEFAULT_SITE_URL: &str = "https://tuckerfritz.dev/";

#[derive(Deserialize, Default)]
#[serde(default)]
struct Project {
    posts_directory: Option<PathBuf>,
    output_directory: Option<PathBuf>,
    site: Site,
    serve: Serve,
}

#[derive(Deserialize)]
#[serde(default)]
struct Site {
    title: String,
    description: String,
    url: Option<Url>,
    language: String,
}

impl Default for Site {
    fn default() -> Self {
        Site {
            title: String::from("Tucker Fritz | Blog"),
            description: String::from("My journey learning Astro"),
            url: None,
            language: String::from("en-us"),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct Serve {
    address: SocketAddr,
}

impl Default for Serve {
    fn default() -> Self {
        Serve {
            address: SocketAddr::from(([127, 0, 0, 1], 4321)),
        }
    }
}

/// The resolved configuration. Paths are absolute when it comes from
/// [`Config::from_directory`].
#[derive(Clone, Debug)]
pub struct Config {
    /// The directory holding the post source files.
    pub posts_directory: PathBuf,

    /// The directory the `index` command writes into.
    pub output_directory: PathBuf,

    /// The channel-level settings for the RSS feed.
    pub feed: FeedConfig,

    /// The address the HTTP server listens on.
    pub address: SocketAddr,
}

impl Config {
    /// Looks for [`PROJECT_FILE_NAME`] in `dir` and then in each of its
    /// ancestors. Falls back to the defaults rooted at `dir` if no project
    /// file exists anywhere up the tree. A relative `dir` is taken relative to
    /// the working directory.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let base = std::env::current_dir().map_err(Error::CurrentDirectory)?;
        Config::from_directory_in(&base, dir)
    }

    // Resolves `dir` against `base` before walking up, since the ancestors of
    // a relative path like `.` stop at the path itself.
    fn from_directory_in(base: &Path, dir: &Path) -> Result<Config> {
        let dir: PathBuf = base.join(dir).components().collect();
        for ancestor in dir.ancestors() {
            let path = ancestor.join(PROJECT_FILE_NAME);
            if path.is_file() {
                return Config::from_project_file(&path);
            }
        }
        Ok(Config::resolve(Project::default(), &dir))
    }

    /// Loads the configuration from a specific project file. Relative paths
    /// are resolved against the file's directory.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project =
            serde_yaml::from_reader(file).map_err(|err| Error::Parse {
                path: path.to_owned(),
                err,
            })?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Config::resolve(project, root))
    }

    fn resolve(project: Project, root: &Path) -> Config {
        let posts_directory = project
            .posts_directory
            .unwrap_or_else(|| PathBuf::from("src/content/posts"));
        let output_directory = project
            .output_directory
            .unwrap_or_else(|| PathBuf::from("dist"));
        Config {
            posts_directory: root.join(posts_directory),
            output_directory: root.join(output_directory),
            feed: FeedConfig {
                title: project.site.title,
                description: project.site.description,
                site: project
                    .site
                    .url
                    .map_or_else(|| DEFAULT_SITE_URL.to_owned(), String::from),
                language: project.site.language,
            },
            address: project.serve.address,
        }
    }
}

/// The result of loading the configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading the configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when the working directory can't be determined.
    CurrentDirectory(std::io::Error),

    /// Returned when the project file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid.
    Parse { path: PathBuf, err: serde_yaml::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::CurrentDirectory(err) => {
                write!(f, "Reading working directory: {}", err)
            }
            Error::Open { path, err } => {
                write!(f, "Opening project file `{}`: {}", path.display(), err)
            }
            Error::Parse { path, err } => {
                write!(f, "Loading configuration `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::CurrentDirectory(err) => Some(err),
            Error::Open { path: _, err } => Some(err),
            Error::Parse { path: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_project_file() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let config = Config::from_directory(dir.path())?;
        assert_eq!(dir.path().join("src/content/posts"), config.posts_directory);
        assert_eq!(dir.path().join("dist"), config.output_directory);
        assert_eq!("https://tuckerfritz.dev/", config.feed.site);
        assert_eq!("en-us", config.feed.language);
        assert_eq!(4321, config.address.port());
        Ok(())
    }

    #[test]
    fn test_project_file_in_ancestor() -> Result<()> {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(PROJECT_FILE_NAME),
            "output_directory: public\nsite:\n  title: Notes\n  url: https://example.com/\nserve:\n  address: 0.0.0.0:8080\n",
        )
        .unwrap();
        let nested = dir.path().join("src").join("pages");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::from_directory(&nested)?;
        assert_eq!(dir.path().join("public"), config.output_directory);
        assert_eq!(dir.path().join("src/content/posts"), config.posts_directory);
        assert_eq!("Notes", config.feed.title);
        assert_eq!("My journey learning Astro", config.feed.description);
        assert_eq!("https://example.com/", config.feed.site);
        assert_eq!(8080, config.address.port());
        Ok(())
    }

    #[test]
    fn test_relative_directory_walks_up() -> Result<()> {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_FILE_NAME), "output_directory: public\n")
            .unwrap();
        let nested = dir.path().join("src").join("pages");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::from_directory_in(&nested, Path::new("."))?;
        assert_eq!(dir.path().join("public"), config.output_directory);

        let config = Config::from_directory_in(dir.path(), Path::new("src/pages"))?;
        assert_eq!(dir.path().join("public"), config.output_directory);
        Ok(())
    }

    #[test]
    fn test_relative_directory_defaults_are_absolute() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let config = Config::from_directory_in(dir.path(), Path::new("."))?;
        assert_eq!(dir.path().join("dist"), config.output_directory);
        assert!(config.posts_directory.is_absolute());
        Ok(())
    }

    #[test]
    fn test_invalid_project_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_FILE_NAME), "site: 42\n")
            .unwrap();
        assert!(matches!(
            Config::from_directory(dir.path()),
            Err(Error::Parse { .. })
        ));
    }
}
