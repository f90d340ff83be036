// UI layer: line-oriented rendering of gists, plus the few interactive
// bits (delete confirmation via `dialoguer`, an `indicatif` spinner while
// uploading). Rendering writes into any `io::Write` so it can be captured.

use crate::model::{Gist, GistFile};
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

/// Whether to decorate output with terminal colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub color: bool,
}

impl Style {
    pub fn plain() -> Self {
        Style { color: false }
    }

    /// Color only when stdout is a terminal and `NO_COLOR` is unset.
    pub fn detect() -> Self {
        Style {
            color: io::stdout().is_tty() && std::env::var_os("NO_COLOR").is_none(),
        }
    }
}

/// `+` for public gists, `-` for secret ones.
pub fn visibility_marker(public: bool) -> &'static str {
    if public {
        "+"
    } else {
        "-"
    }
}

/// One `list` line: `<id> <+|-> <description>`.
pub fn write_list_line(out: &mut dyn Write, gist: &Gist, style: Style) -> io::Result<()> {
    let marker = visibility_marker(gist.public);
    let marker = match (style.color, gist.public) {
        (false, _) => marker.to_string(),
        (true, true) => marker.green().to_string(),
        (true, false) => marker.red().to_string(),
    };
    let line = format!("{} {} {}", gist.id, marker, gist.description());
    writeln!(out, "{}", line.trim_end())
}

/// Each file as a `<filename>:` header followed by its text. Files are
/// separated by a blank line.
pub fn write_content(out: &mut dyn Write, files: &[&GistFile], style: Style) -> io::Result<()> {
    for (i, file) in files.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        let header = format!("{}:", file.filename);
        if style.color {
            writeln!(out, "{}", header.bold())?;
        } else {
            writeln!(out, "{}", header)?;
        }
        let text = file.text();
        out.write_all(text.as_bytes())?;
        if !text.is_empty() && !text.ends_with('\n') {
            writeln!(out)?;
        }
    }
    Ok(())
}

pub fn write_info(out: &mut dyn Write, gist: &Gist) -> io::Result<()> {
    writeln!(out, "id: {}", gist.id)?;
    writeln!(out, "description: {}", gist.description())?;
    writeln!(out, "public: {}", gist.public)?;
    if let Some(url) = &gist.html_url {
        writeln!(out, "url: {}", url)?;
    }
    writeln!(out, "files:")?;
    for file in &gist.files {
        let mut details = Vec::new();
        if let Some(lang) = &file.language {
            details.push(lang.clone());
        }
        if let Some(size) = file.size {
            details.push(format!("{} bytes", size));
        }
        if details.is_empty() {
            writeln!(out, "  {}", file.filename)?;
        } else {
            writeln!(out, "  {} ({})", file.filename, details.join(", "))?;
        }
    }
    Ok(())
}

/// Ask a yes/no question on the terminal; defaults to "no".
pub fn confirm(prompt: &str) -> io::Result<bool> {
    Confirm::new().with_prompt(prompt).default(false).interact()
}

/// Spinner on stderr for a blocking network call. Hidden automatically
/// when stderr is not a terminal.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
