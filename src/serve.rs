//! The HTTP server for the request-time endpoints. Every request reloads the
//! content collection and rebuilds whatever it serves; nothing is cached
//! between requests.
//!
//! | Path                  | Body                                          |
//! |-----------------------|-----------------------------------------------|
//! | `/post-metadata.json` | JSON array of post metadata                   |
//! | `/post-index.json`    | `{ "index": ..., "metadata": [...] }` (v2)    |
//! | `/rss.xml`            | RSS 2.0 feed                                  |

use crate::collection::load_collection;
use crate::config::Config;
use crate::feed::feed_xml;
use crate::post::{to_metadata, PostRecord};
use crate::write::{metadata_json, PostIndexDocument};
use std::fmt;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, error, info};

mod mime {
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
}

/// The header carrying the version of the `/post-index.json` body.
pub const INDEX_VERSION_HEADER: &str = "X-Post-Index-Version";

/// A response ready to be sent, independent of the HTTP library.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    fn new(
        status: u16,
        content_type: &'static str,
        body: impl Into<Vec<u8>>,
    ) -> Reply {
        Reply {
            status,
            content_type,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    fn with_header(
        mut self,
        name: &'static str,
        value: impl Into<String>,
    ) -> Reply {
        self.headers.push((name, value.into()));
        self
    }

    fn not_found() -> Reply {
        Reply::new(404, mime::PLAIN, "404 Not Found")
    }

    fn method_not_allowed() -> Reply {
        Reply::new(405, mime::PLAIN, "405 Method Not Allowed")
            .with_header("Allow", "GET, HEAD")
    }

    fn internal_error() -> Reply {
        Reply::new(500, mime::PLAIN, "500 Internal Server Error")
    }
}

/// Answers a single request. `HEAD` requests get the same reply as `GET`.
pub fn route(config: &Config, method: &Method, url: &str) -> Reply {
    if !matches!(method, Method::Get | Method::Head) {
        return Reply::method_not_allowed();
    }

    // query strings don't select anything
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let result = match path {
        "/post-metadata.json" => post_metadata(config),
        "/post-index.json" => post_index(config),
        "/rss.xml" => rss(config),
        _ => return Reply::not_found(),
    };

    result.unwrap_or_else(|err| {
        error!(path, error = %err, "request failed");
        Reply::internal_error()
    })
}

fn load(config: &Config) -> Result<Vec<PostRecord>> {
    Ok(load_collection(&config.posts_directory)?)
}

fn post_metadata(config: &Config) -> Result<Reply> {
    let metadata = to_metadata(&load(config)?);
    Ok(Reply::new(200, mime::JSON, metadata_json(&metadata)?))
}

fn post_index(config: &Config) -> Result<Reply> {
    let document = PostIndexDocument::new(to_metadata(&load(config)?));
    Ok(Reply::new(200, mime::JSON, document.to_json()?)
        .with_header(INDEX_VERSION_HEADER, PostIndexDocument::VERSION.to_string()))
}

fn rss(config: &Config) -> Result<Reply> {
    let posts = load(config)?;
    Ok(Reply::new(200, mime::XML, feed_xml(&config.feed, &posts)))
}

/// Binds [`Config::address`] and answers requests one at a time until the
/// process is stopped.
pub fn serve(config: &Config) -> Result<()> {
    let server = Server::http(config.address).map_err(Error::Bind)?;
    info!(address = %config.address, "serving");
    for request in server.incoming_requests() {
        if let Err(err) = respond(config, request) {
            error!(error = %err, "failed to send response");
        }
    }
    Ok(())
}

fn respond(config: &Config, request: Request) -> Result<()> {
    let reply = route(config, request.method(), request.url());
    debug!(
        method = %request.method(),
        url = request.url(),
        status = reply.status,
        "request"
    );

    let mut headers = vec![make_header("Content-Type", reply.content_type)?];
    for (name, value) in &reply.headers {
        headers.push(make_header(name, value)?);
    }

    // tiny_http leaves the body off for HEAD requests
    let length = reply.body.len();
    let response = Response::new(
        StatusCode(reply.status),
        headers,
        std::io::Cursor::new(reply.body),
        Some(length),
        None,
    );
    request.respond(response)?;
    Ok(())
}

fn make_header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|()| Error::InvalidHeader(name.to_owned()))
}

type Result<T> = std::result::Result<T, Error>;

/// Represents an error serving a request.
#[derive(Debug)]
pub enum Error {
    /// Returned when the server can't bind its address.
    Bind(Box<dyn std::error::Error + Send + Sync + 'static>),

    /// Returned when the content collection can't be loaded.
    Collection(crate::collection::Error),

    /// Returned when a body can't be serialized.
    Write(crate::write::Error),

    /// Returned when a header can't be built.
    InvalidHeader(String),

    /// Returned when the response can't be sent.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Bind(err) => write!(f, "Binding server: {}", err),
            Error::Collection(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::InvalidHeader(name) => write!(f, "invalid header `{}`", name),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Bind(err) => Some(err.as_ref()),
            Error::Collection(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::InvalidHeader(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<crate::collection::Error> for Error {
    fn from(err: crate::collection::Error) -> Error {
        Error::Collection(err)
    }
}

impl From<crate::write::Error> for Error {
    fn from(err: crate::write::Error) -> Error {
        Error::Write(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
