// Interactive editing: a gist's files are written into a scratch
// directory, the user's editor is run over them, and whatever changed is
// collected into a patch.

use crate::error::{GistError, Result};
use crate::model::{FileChanges, Gist};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::debug;

/// Pick the editor command: configured value, then `$EDITOR`, then `$VISUAL`.
pub fn resolve_editor(configured: Option<&str>) -> Result<String> {
    editor_from(configured, |key| std::env::var(key).ok())
}

fn editor_from(configured: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Result<String> {
    configured
        .map(str::to_string)
        .into_iter()
        .chain(env("EDITOR"))
        .chain(env("VISUAL"))
        .find(|e| !e.trim().is_empty())
        .ok_or_else(|| GistError::Editor("no editor found; set $EDITOR".into()))
}

/// Run `editor` on `paths` and wait for it to exit. The editor string
/// may carry its own arguments, e.g. `code --wait`.
pub fn run_editor(editor: &str, paths: &[PathBuf]) -> Result<()> {
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| GistError::Editor("empty editor command".into()))?;

    debug!(%editor, files = paths.len(), "launching editor");
    let status = Command::new(program)
        .args(parts)
        .args(paths)
        .status()
        .map_err(|e| GistError::Editor(format!("failed to launch '{}': {}", program, e)))?;

    if !status.success() {
        return Err(GistError::Editor(format!("'{}' exited with {}", editor, status)));
    }
    Ok(())
}

/// A gist checked out into a temporary directory for editing. The
/// directory is removed when the session is dropped.
pub struct EditSession {
    dir: TempDir,
    originals: Vec<(String, String)>,
}

impl EditSession {
    /// Write each file of a decoded gist into a fresh temp directory.
    pub fn new(gist: &Gist) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("gist-{}-", gist.id))
            .tempdir()?;

        let mut originals = Vec::with_capacity(gist.files.len());
        for file in &gist.files {
            let path = safe_join(dir.path(), &file.filename)?;
            fs::write(&path, file.text())?;
            originals.push((file.filename.clone(), file.text().to_string()));
        }
        Ok(EditSession { dir, originals })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Paths of the checked-out files, in gist order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.originals
            .iter()
            .map(|(name, _)| self.dir.path().join(name))
            .collect()
    }

    /// Compare the directory with what was written. Changed files are
    /// updated, files emptied or deleted by the user are removed, and
    /// new files dropped into the directory are added.
    pub fn changes(&self) -> Result<FileChanges> {
        let mut changes = FileChanges::new();
        let mut known = HashSet::new();

        for (name, original) in &self.originals {
            known.insert(name.as_str());
            let path = self.dir.path().join(name);
            let current = if path.exists() {
                fs::read_to_string(&path)?
            } else {
                String::new()
            };

            if current == *original {
                continue;
            }
            if current.is_empty() {
                changes.remove(name.as_str());
            } else {
                changes.upsert(name.as_str(), current);
            }
        }

        let mut added = Vec::new();
        for entry in fs::read_dir(self.dir.path())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if known.contains(name.as_str()) || name.starts_with('.') || name.ends_with('~') {
                continue;
            }
            let text = fs::read_to_string(entry.path())?;
            if !text.is_empty() {
                added.push((name, text));
            }
        }
        // read_dir order is platform-dependent
        added.sort();
        for (name, text) in added {
            changes.upsert(name, text);
        }

        Ok(changes)
    }
}

fn safe_join(dir: &Path, filename: &str) -> Result<PathBuf> {
    let plain = !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(&['/', '\\'][..]);
    if !plain {
        return Err(GistError::Editor(format!(
            "refusing to write file with unsafe name '{}'",
            filename
        )));
    }
    Ok(dir.join(filename))
}
