// Command-line surface: clap argument definitions and the dispatch of
// each subcommand onto the API client. Output goes to a caller-supplied
// writer so whole commands can be exercised in tests.

use crate::api::ApiClient;
use crate::archive;
use crate::config::Config;
use crate::editor::{self, EditSession};
use crate::error::GistError;
use crate::model::{FileChanges, GistFile, GistUpdate};
use crate::ui::{self, Style};
use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use crossterm::tty::IsTty;
use std::ffi::OsString;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use tempfile::NamedTempFile;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gist", version, about = "Command-line client for GitHub gists", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List your gists as `<id> <+|-> <description>`
    #[command(alias = "ls")]
    List,

    /// Print the decoded content of a gist's files
    Content {
        id: String,
        /// Only print this file
        filename: Option<String>,
    },

    /// List the filenames of a gist
    Files { id: String },

    /// Show a gist's metadata
    Info { id: String },

    /// Create a gist from files, or from stdin when no files are given
    Create {
        description: String,
        /// Make the gist public (gists are secret by default)
        #[arg(long)]
        public: bool,
        /// Name for the file read from stdin
        #[arg(long, value_name = "NAME", default_value = "gistfile1.txt")]
        filename: String,
        files: Vec<PathBuf>,
    },

    /// Edit a gist's files in $EDITOR and upload the changes
    Edit { id: String },

    /// Change a gist's description
    Description { id: String, text: String },

    /// Delete one or more gists
    #[command(alias = "rm")]
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Fork a gist into your account
    Fork { id: String },

    /// Download a gist as a .tar.gz archive
    Archive {
        id: String,
        /// Where to write the archive (default: <id>.tar.gz)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Clone a gist's git repository
    Clone { id: String, dir: Option<PathBuf> },

    /// Print the version
    Version,
}

/// Parse `argv` (without the program name) and run it against `config`.
pub fn run<I, T>(argv: I, config: &Config, out: &mut dyn Write) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args = std::iter::once(OsString::from("gist")).chain(argv.into_iter().map(Into::into));
    let cli = Cli::try_parse_from(args)?;
    execute(cli.command, config, out, Style::plain())
}

/// Entry used by the binary: loads the configuration named on the
/// command line (or the default one) unless the command needs none.
pub fn dispatch(cli: Cli, out: &mut dyn Write, style: Style) -> Result<()> {
    if let Command::Version = cli.command {
        return write_version(out);
    }
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    execute(cli.command, &config, out, style)
}

/// Run one command. A rejected token gets a hint about where the
/// token is configured.
pub fn execute(command: Command, config: &Config, out: &mut dyn Write, style: Style) -> Result<()> {
    run_command(command, config, out, style).map_err(|err| {
        let rejected = err.downcast_ref::<GistError>().is_some_and(GistError::is_auth);
        if rejected {
            err.context("the token was rejected; check `token` in the [gist] config section or GIST_TOKEN")
        } else {
            err
        }
    })
}

fn run_command(command: Command, config: &Config, out: &mut dyn Write, style: Style) -> Result<()> {
    let api = || ApiClient::from_config(config);

    match command {
        Command::List => list(&api()?, out, style),
        Command::Content { id, filename } => content(&api()?, &id, filename.as_deref(), out, style),
        Command::Files { id } => files(&api()?, &id, out),
        Command::Info { id } => {
            let gist = api()?.gist(&id)?;
            ui::write_info(out, &gist)?;
            Ok(())
        }
        Command::Create {
            description,
            public,
            filename,
            files,
        } => create(&api()?, &description, public, &filename, &files, out),
        Command::Edit { id } => edit(&api()?, config, &id, out),
        Command::Description { id, text } => {
            let update = GistUpdate {
                description: Some(text),
                ..Default::default()
            };
            api()?.update(&id, &update)?;
            writeln!(out, "updated {}", id)?;
            Ok(())
        }
        Command::Delete { ids, yes } => delete(&api()?, &ids, yes, out),
        Command::Fork { id } => {
            let gist = api()?.fork(&id)?;
            writeln!(out, "{}", gist.id)?;
            Ok(())
        }
        Command::Archive { id, output } => archive(&api()?, &id, output, out),
        Command::Clone { id, dir } => clone(&api()?, &id, dir.as_deref()),
        Command::Version => write_version(out),
    }
}

fn write_version(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "gist {}", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}

fn list(api: &ApiClient, out: &mut dyn Write, style: Style) -> Result<()> {
    let mut count = 0usize;
    for gist in api.list() {
        ui::write_list_line(out, &gist?, style)?;
        count += 1;
    }
    info!(count, "listed gists");
    Ok(())
}

fn content(
    api: &ApiClient,
    id: &str,
    filename: Option<&str>,
    out: &mut dyn Write,
    style: Style,
) -> Result<()> {
    let gist = api.content(id)?;
    let selected: Vec<&GistFile> = match filename {
        Some(name) => vec![gist
            .file(name)
            .with_context(|| format!("gist {} has no file named '{}'", id, name))?],
        None => gist.files.iter().collect(),
    };
    ui::write_content(out, &selected, style)?;
    Ok(())
}

fn files(api: &ApiClient, id: &str, out: &mut dyn Write) -> Result<()> {
    let gist = api.gist(id)?;
    for file in &gist.files {
        writeln!(out, "{}", file.filename)?;
    }
    Ok(())
}

fn create(
    api: &ApiClient,
    description: &str,
    public: bool,
    stdin_name: &str,
    paths: &[PathBuf],
    out: &mut dyn Write,
) -> Result<()> {
    let mut files = FileChanges::new();
    if paths.is_empty() {
        if io::stdin().is_tty() {
            bail!("no files given; pass file paths or pipe content on stdin");
        }
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("reading gist content from stdin")?;
        if text.is_empty() {
            bail!("nothing to upload: stdin was empty");
        }
        files.upsert(stdin_name, text);
    } else {
        for path in paths {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("'{}' has no usable file name", path.display()))?;
            if files.iter().any(|(existing, _)| existing == name) {
                bail!("more than one file is named '{}'", name);
            }
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            files.upsert(name, text);
        }
    }

    let spinner = ui::spinner("Creating gist...");
    let result = api.create(description, public, files);
    spinner.finish_and_clear();
    let gist = result?;

    writeln!(out, "{}", gist.html_url.as_deref().unwrap_or(&gist.id))?;
    Ok(())
}

fn edit(api: &ApiClient, config: &Config, id: &str, out: &mut dyn Write) -> Result<()> {
    let gist = api.content(id)?;
    let editor = editor::resolve_editor(config.editor.as_deref())?;
    let session = EditSession::new(&gist)?;
    editor::run_editor(&editor, &session.paths())?;

    let files = session.changes()?;
    if files.is_empty() {
        writeln!(out, "no changes")?;
        return Ok(());
    }

    let changed = files.len();
    let update = GistUpdate {
        description: None,
        files,
    };
    let spinner = ui::spinner("Updating gist...");
    let result = api.update(id, &update);
    spinner.finish_and_clear();
    result?;

    writeln!(out, "updated {} ({} file(s) changed)", id, changed)?;
    Ok(())
}

fn delete(api: &ApiClient, ids: &[String], yes: bool, out: &mut dyn Write) -> Result<()> {
    if !yes {
        if !io::stderr().is_tty() {
            bail!("refusing to delete without confirmation; pass --yes");
        }
        let prompt = match ids {
            [id] => format!("Delete gist {}?", id),
            _ => format!("Delete {} gists?", ids.len()),
        };
        if !ui::confirm(&prompt)? {
            writeln!(out, "aborted")?;
            return Ok(());
        }
    }
    for id in ids {
        api.delete(id)?;
        writeln!(out, "deleted {}", id)?;
    }
    Ok(())
}

fn archive(api: &ApiClient, id: &str, output: Option<PathBuf>, out: &mut dyn Write) -> Result<()> {
    let gist = api.content(id)?;
    let path = output.unwrap_or_else(|| PathBuf::from(archive::archive_name(&gist)));

    // Built beside the target and renamed into place only once complete.
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("creating temporary file in {}", parent.display()))?;
    let writer = archive::write_archive(BufWriter::new(tmp), &gist)?;
    let tmp = writer.into_inner().map_err(|e| e.into_error())?;
    tmp.persist(&path)
        .map_err(|e| e.error)
        .with_context(|| format!("writing {}", path.display()))?;

    writeln!(out, "{}", path.display())?;
    Ok(())
}

fn clone(api: &ApiClient, id: &str, dir: Option<&Path>) -> Result<()> {
    let gist = api.gist(id)?;
    let url = gist
        .git_pull_url
        .with_context(|| format!("gist {} has no git url", id))?;

    let mut cmd = process::Command::new("git");
    cmd.arg("clone").arg(&url);
    if let Some(dir) = dir {
        cmd.arg(dir);
    }
    info!(%url, "cloning gist");
    let status = cmd.status().context("failed to run git")?;
    if !status.success() {
        bail!("git clone exited with {}", status);
    }
    Ok(())
}
