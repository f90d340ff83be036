// API client module: a small blocking HTTP client that talks to the
// gist API. Every call is one request/response exchange; listing is a
// chain of such exchanges, one per page, driven by the caller.

use crate::config::Config;
use crate::error::{GistError, Result};
use crate::model::{FileChanges, Gist, GistUpdate, NewGist};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Page size requested from the list endpoint (the API maximum).
const PER_PAGE: u32 = 100;

/// API client holding a reqwest blocking client with the auth headers
/// baked in, and the base URL of the gist API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Shape of the JSON error body returned by the API.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiClient {
    /// Build a client for `base_url` that authenticates with `token`.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("token {}", token))
            .map_err(|_| GistError::Config("token contains characters not allowed in a header".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(concat!("gist/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(GistError::Network)?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create an ApiClient from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_url, &config.token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lazily iterate over the authenticated user's gists, in the order
    /// the server returns them. Pages are only fetched as the iterator
    /// is advanced.
    pub fn list(&self) -> GistPages<'_> {
        GistPages {
            api: self,
            next_url: Some(format!("{}/gists?per_page={}", self.base_url, PER_PAGE)),
            buffer: Vec::new().into_iter(),
            fetched: HashSet::new(),
        }
    }

    /// Fetch a single gist. File content is left as sent by the server.
    pub fn gist(&self, id: &str) -> Result<Gist> {
        let url = format!("{}/gists/{}", self.base_url, id);
        debug!(%url, "fetching gist");
        let res = self.execute(self.client.get(&url), id)?;
        Ok(res.json()?)
    }

    /// Fetch a gist and decode every file's content to UTF-8 text.
    pub fn content(&self, id: &str) -> Result<Gist> {
        self.gist(id)?.decode()
    }

    /// Create a gist from the given files.
    pub fn create(&self, description: &str, public: bool, files: FileChanges) -> Result<Gist> {
        let url = format!("{}/gists", self.base_url);
        let body = NewGist {
            description: description.to_string(),
            public,
            files,
        };
        info!(files = body.files.len(), public, "creating gist");
        let res = self.execute(self.client.post(&url).json(&body), "gists")?;
        Ok(res.json()?)
    }

    /// Patch a gist's description and/or files.
    pub fn update(&self, id: &str, update: &GistUpdate) -> Result<Gist> {
        let url = format!("{}/gists/{}", self.base_url, id);
        info!(%id, files = update.files.len(), "updating gist");
        let res = self.execute(self.client.patch(&url).json(update), id)?;
        Ok(res.json()?)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let url = format!("{}/gists/{}", self.base_url, id);
        info!(%id, "deleting gist");
        self.execute(self.client.delete(&url), id)?;
        Ok(())
    }

    /// Fork someone else's gist into the authenticated account.
    pub fn fork(&self, id: &str) -> Result<Gist> {
        let url = format!("{}/gists/{}/forks", self.base_url, id);
        info!(%id, "forking gist");
        let res = self.execute(self.client.post(&url), id)?;
        Ok(res.json()?)
    }

    fn fetch_page(&self, url: &str) -> Result<(Vec<Gist>, Option<String>)> {
        debug!(%url, "fetching gist page");
        let res = self.execute(self.client.get(url), "gists")?;
        let next = res
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);
        let gists: Vec<Gist> = res.json()?;
        debug!(count = gists.len(), has_next = next.is_some(), "page received");
        Ok((gists, next))
    }

    /// Send a request and map non-success statuses onto `GistError`.
    /// `target` names what was asked for, for not-found reporting.
    fn execute(&self, req: RequestBuilder, target: &str) -> Result<Response> {
        let res = req.send()?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().unwrap_or_default();
        let message = error_message(status, &body);
        debug!(status = status.as_u16(), %message, "request failed");
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GistError::Auth {
                status: status.as_u16(),
                message,
            },
            StatusCode::NOT_FOUND => GistError::NotFound(target.to_string()),
            _ => GistError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

/// Iterator over the authenticated user's gists, following `Link`
/// headers page by page. After an error the iterator is exhausted, and
/// a `next` link to a page already fetched ends it.
pub struct GistPages<'a> {
    api: &'a ApiClient,
    next_url: Option<String>,
    buffer: std::vec::IntoIter<Gist>,
    fetched: HashSet<String>,
}

impl Iterator for GistPages<'_> {
    type Item = Result<Gist>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(gist) = self.buffer.next() {
                return Some(Ok(gist));
            }
            let url = self.next_url.take()?;
            let page = self.api.fetch_page(&url);
            self.fetched.insert(url);
            match page {
                Ok((gists, next)) => {
                    self.buffer = gists.into_iter();
                    self.next_url = next.filter(|n| !self.fetched.contains(n));
                    if self.next_url.is_none() {
                        debug!("no further pages");
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Extract the `rel="next"` target from a `Link` header such as
/// `<https://api.github.com/gists?page=2>; rel="next", <...>; rel="last"`.
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        if segments.any(|p| p.trim() == r#"rel="next""#) {
            target
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .map(str::to_string)
        } else {
            None
        }
    })
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }
    let body = body.trim();
    if body.is_empty() {
        status.canonical_reason().unwrap_or("no message").to_string()
    } else {
        body.to_string()
    }
}
