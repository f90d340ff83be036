// Library root
// -----------
// This crate exposes a small library surface for the `gist` CLI. The
// binary (`main.rs`) parses arguments and hands them to `cli`.
//
// Module responsibilities:
// - `api`: blocking HTTP calls against the gist API and status mapping.
// - `model`: gist/file shapes and the base64 content codec.
// - `config`: token and endpoint resolution from file and environment.
// - `cli`: argument definitions and per-command flows.
// - `ui`: text rendering and the small interactive helpers.
// - `editor`: running `$EDITOR` over a gist checked out to a temp dir.
// - `archive`: `.tar.gz` export of a gist.
pub mod api;
pub mod archive;
pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod model;
pub mod ui;

pub use api::ApiClient;
pub use config::Config;
pub use error::{GistError, Result};
pub use model::{Gist, GistFile};
