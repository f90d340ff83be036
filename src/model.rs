// Data shapes exchanged with the gist API, plus the base64 codec used
// for file content. Everything here is request-scoped: a `Gist` only
// lives for the duration of one command.

use crate::error::{GistError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// A gist as returned by the API. `files` keeps the order of the JSON
/// object the server sent, and filenames are unique because they are
/// the keys of that object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Gist {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default, deserialize_with = "files_in_order")]
    pub files: Vec<GistFile>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub git_pull_url: Option<String>,
}

/// One file of a gist. `content` is absent in list responses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GistFile {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl Gist {
    /// Replace every file's base64 content with the decoded text.
    pub fn decode(mut self) -> Result<Self> {
        for file in &mut self.files {
            if let Some(encoded) = file.content.take() {
                file.content = Some(decode_content(&file.filename, &encoded)?);
            }
        }
        Ok(self)
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn file(&self, name: &str) -> Option<&GistFile> {
        self.files.iter().find(|f| f.filename == name)
    }
}

impl GistFile {
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Encode text for upload.
pub fn encode_content(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode a base64 payload into UTF-8 text. The API may wrap long
/// payloads across lines, so ASCII whitespace is dropped first.
pub fn decode_content(filename: &str, encoded: &str) -> Result<String> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| GistError::Decode {
            file: filename.to_string(),
            reason: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|e| GistError::Decode {
        file: filename.to_string(),
        reason: e.to_string(),
    })
}

/// File-level changes for a create or update call. An entry with
/// `None` content removes that file from the gist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileChanges(Vec<(String, Option<String>)>);

impl FileChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the content of `name`.
    pub fn upsert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.set(name.into(), Some(content.into()));
    }

    pub fn remove(&mut self, name: impl Into<String>) {
        self.set(name.into(), None);
    }

    fn set(&mut self, name: String, content: Option<String>) {
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = content,
            None => self.0.push((name, content)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(n, c)| (n.as_str(), c.as_deref()))
    }
}

#[derive(Serialize)]
struct FilePayload {
    content: String,
}

impl Serialize for FileChanges {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, content) in &self.0 {
            match content {
                Some(text) => map.serialize_entry(
                    name,
                    &FilePayload {
                        content: encode_content(text),
                    },
                )?,
                None => map.serialize_entry(name, &Option::<FilePayload>::None)?,
            }
        }
        map.end()
    }
}

/// Body of `POST /gists`.
#[derive(Debug, Serialize)]
pub struct NewGist {
    pub description: String,
    pub public: bool,
    pub files: FileChanges,
}

/// Body of `PATCH /gists/{id}`. Omitted fields are left untouched.
#[derive(Debug, Default, Serialize)]
pub struct GistUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "FileChanges::is_empty")]
    pub files: FileChanges,
}

// The API documents ids as strings but older payloads (and test
// fixtures) use integers.
fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

fn files_in_order<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<GistFile>, D::Error> {
    let map = Option::<serde_json::Map<String, serde_json::Value>>::deserialize(deserializer)?;
    map.unwrap_or_default()
        .into_iter()
        .map(|(name, value)| {
            let mut file: GistFile = serde_json::from_value(value).map_err(<D::Error as de::Error>::custom)?;
            file.filename = name;
            Ok(file)
        })
        .collect()
}
