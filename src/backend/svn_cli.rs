//! Backend driving the `svn` command-line client.
//!
//! Status comes from `svn status --verbose`, whose first seven columns are
//! fixed-width flags followed by revision, author and path fields.

use super::contract::{LogEntry, VersionControlBackend};
use crate::error::BackendError;
use crate::status::{NodeKind, StatusData, StatusEntry, VersionState};
use crate::types::{Revision, RevisionRange, StatusDepth};
use chrono::DateTime;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Warning code svn prints for a target it has no node for
const NODE_NOT_FOUND: &str = "W155010";
/// Warning/error codes svn prints when a property is not set
const PROPERTY_NOT_FOUND: [&str; 2] = ["W200017", "E200017"];

/// `svn` executable wrapper
pub struct SvnCommandBackend {
    binary: PathBuf,
}

impl Default for SvnCommandBackend {
    fn default() -> Self {
        Self::new("svn")
    }
}

impl SvnCommandBackend {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn output<I, S>(&self, args: I) -> Result<(String, Output), BackendError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect();
        let command_line = std::iter::once(self.binary.as_os_str())
            .chain(args.iter().map(|a| a.as_os_str()))
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        debug!(command = %command_line, "Running svn");

        let output = Command::new(&self.binary)
            .args(&args)
            .arg("--non-interactive")
            .output()
            .map_err(|e| {
                BackendError::Unavailable(format!(
                    "Failed to start {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;
        Ok((command_line, output))
    }

    /// Run and require a zero exit status
    fn run<I, S>(&self, args: I) -> Result<Vec<u8>, BackendError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (command_line, output) = self.output(args)?;
        if !output.status.success() {
            return Err(BackendError::command_failed(
                command_line,
                output.status.code(),
                &output.stderr,
            ));
        }
        Ok(output.stdout)
    }

    fn info_item(&self, path: &Path, item: &str) -> Result<Option<String>, BackendError> {
        let (_, output) = self.output([
            OsStr::new("info"),
            OsStr::new("--show-item"),
            OsStr::new(item),
            path.as_os_str(),
        ])?;
        if !output.status.success() {
            return Ok(None);
        }
        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!value.is_empty()).then_some(value))
    }

    /// Working-copy root containing `path` and that root's repository URL
    ///
    /// Falls back to the parent for targets svn has no node for.
    fn root_locator(&self, path: &Path) -> Result<Option<(PathBuf, String)>, BackendError> {
        for candidate in std::iter::once(path).chain(path.parent()) {
            if let Some(root) = self.info_item(candidate, "wc-root")? {
                let root = PathBuf::from(root);
                return Ok(self.info_item(&root, "url")?.map(|url| (root, url)));
            }
        }
        Ok(None)
    }
}

impl VersionControlBackend for SvnCommandBackend {
    fn query_status(
        &self,
        path: &Path,
        depth: StatusDepth,
    ) -> Result<Vec<StatusEntry>, BackendError> {
        let (command_line, output) = self.output([
            OsStr::new("status"),
            OsStr::new("--verbose"),
            OsStr::new("--depth"),
            OsStr::new(depth.as_arg()),
            path.as_os_str(),
        ])?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() && !stderr.contains(NODE_NOT_FOUND) {
            return Err(BackendError::command_failed(
                command_line,
                output.status.code(),
                &output.stderr,
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut entries = parse_status_output(&stdout, NodeKind::probe);
        if entries.iter().any(|entry| entry.data.state.is_versioned()) {
            if let Some((wc_root, root_url)) = self.root_locator(path)? {
                attach_uris(&mut entries, &wc_root, &root_url);
            }
        }
        Ok(entries)
    }

    fn add(&self, path: &Path) -> Result<(), BackendError> {
        self.run([
            OsStr::new("add"),
            OsStr::new("--depth"),
            OsStr::new("empty"),
            OsStr::new("--parents"),
            path.as_os_str(),
        ])
        .map(|_| ())
    }

    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<(), BackendError> {
        let mut args: Vec<&OsStr> = vec![
            OsStr::new("commit"),
            OsStr::new("--depth"),
            OsStr::new("empty"),
            OsStr::new("-m"),
            OsStr::new(message),
        ];
        args.extend(paths.iter().map(|p| p.as_os_str()));
        self.run(args).map(|_| ())
    }

    fn lock(&self, path: &Path, comment: &str) -> Result<(), BackendError> {
        self.run([
            OsStr::new("lock"),
            OsStr::new("-m"),
            OsStr::new(comment),
            path.as_os_str(),
        ])
        .map(|_| ())
    }

    fn unlock(&self, path: &Path) -> Result<(), BackendError> {
        self.run([OsStr::new("unlock"), path.as_os_str()])
            .map(|_| ())
    }

    fn revert(&self, path: &Path) -> Result<(), BackendError> {
        self.run([OsStr::new("revert"), path.as_os_str()])
            .map(|_| ())
    }

    fn update(&self, path: &Path) -> Result<(), BackendError> {
        self.run([OsStr::new("update"), path.as_os_str()])
            .map(|_| ())
    }

    fn update_to_revision(&self, path: &Path, revision: Revision) -> Result<(), BackendError> {
        let revision = revision.to_string();
        self.run([
            OsStr::new("update"),
            OsStr::new("-r"),
            OsStr::new(&revision),
            path.as_os_str(),
        ])
        .map(|_| ())
    }

    fn merge(&self, path: &Path, range: RevisionRange) -> Result<(), BackendError> {
        let range = range.to_string();
        self.run([
            OsStr::new("merge"),
            OsStr::new("-r"),
            OsStr::new(&range),
            path.as_os_str(),
            path.as_os_str(),
        ])
        .map(|_| ())
    }

    fn move_item(&self, from: &Path, to: &Path) -> Result<(), BackendError> {
        self.run([OsStr::new("move"), from.as_os_str(), to.as_os_str()])
            .map(|_| ())
    }

    fn set_remote_property(
        &self,
        uri: &str,
        name: &str,
        value: &str,
        message: &str,
    ) -> Result<(), BackendError> {
        self.run(["propset", name, value, uri, "-m", message])
            .map(|_| ())
    }

    fn get_remote_property(&self, uri: &str, name: &str) -> Result<Option<String>, BackendError> {
        let (command_line, output) = self.output(["propget", name, uri])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if PROPERTY_NOT_FOUND.iter().any(|code| stderr.contains(code)) {
                return Ok(None);
            }
            return Err(BackendError::command_failed(
                command_line,
                output.status.code(),
                &output.stderr,
            ));
        }
        let value = String::from_utf8_lossy(&output.stdout)
            .trim_end_matches(|c: char| c == '\r' || c == '\n')
            .to_string();
        Ok((!value.is_empty()).then_some(value))
    }

    fn resolve_uri(&self, path: &Path) -> Result<Option<String>, BackendError> {
        self.info_item(path, "url")
    }

    fn working_copy_root(&self, path: &Path) -> Result<Option<PathBuf>, BackendError> {
        Ok(self.info_item(path, "wc-root")?.map(PathBuf::from))
    }

    fn retrieve_content_at_revision(
        &self,
        uri: &str,
        revision: Revision,
    ) -> Result<Vec<u8>, BackendError> {
        let revision = revision.to_string();
        self.run(["cat", "-r", revision.as_str(), uri])
    }

    fn history(&self, path: &Path) -> Result<Vec<LogEntry>, BackendError> {
        let stdout = self.run([OsStr::new("log"), OsStr::new("-q"), path.as_os_str()])?;
        Ok(parse_log_output(&String::from_utf8_lossy(&stdout)))
    }
}

fn state_from_flag(flag: char) -> Option<VersionState> {
    let state = match flag {
        ' ' => VersionState::Normal,
        'A' => VersionState::Added,
        'C' => VersionState::Conflicted,
        'D' => VersionState::Deleted,
        'I' => VersionState::Ignored,
        'M' => VersionState::Modified,
        'R' => VersionState::Replaced,
        'X' => VersionState::External,
        '?' => VersionState::NotVersioned,
        '!' => VersionState::Missing,
        '~' => VersionState::Obstructed,
        _ => return None,
    };
    Some(state)
}

/// Parse `svn status --verbose` output
///
/// Lines that are not status rows (tree-conflict details, changelist headers,
/// conflict summaries, external banners) are skipped. `probe` supplies the node
/// kind, which the text format does not carry.
pub(crate) fn parse_status_output(
    stdout: &str,
    probe: impl Fn(&Path) -> NodeKind,
) -> Vec<StatusEntry> {
    stdout
        .lines()
        .filter_map(|line| parse_status_line(line, &probe))
        .collect()
}

fn parse_status_line(line: &str, probe: &impl Fn(&Path) -> NodeKind) -> Option<StatusEntry> {
    // Tree-conflict detail lines carry a `>` marker where the flags would be
    if line.trim_start().starts_with('>') {
        return None;
    }
    let flags: Vec<char> = line.chars().take(8).collect();
    if flags.len() < 8 || flags[7] != ' ' {
        return None;
    }
    let state = state_from_flag(flags[0])?;
    let locked = flags[5] == 'K';
    let rest: String = line.chars().skip(8).collect();
    let rest = rest.trim_start();

    let (revision, path) = match state {
        // No revision columns on these rows
        VersionState::NotVersioned | VersionState::Ignored | VersionState::External => {
            (None, rest.trim_end())
        }
        _ => {
            let working = rest.split_whitespace().next()?;
            if working != "-" && working.parse::<Revision>().is_err() {
                return None;
            }
            // Remaining text after the three fixed fields is the path, which may contain spaces.
            let after_working = rest[working.len()..].trim_start();
            let committed = after_working.split_whitespace().next()?;
            let after_committed = after_working[committed.len()..].trim_start();
            let author = after_committed.split_whitespace().next()?;
            let path = after_committed[author.len()..].trim();
            (working.parse::<Revision>().ok(), path)
        }
    };
    if path.is_empty() {
        return None;
    }

    let path = PathBuf::from(path);
    let kind = probe(&path);
    let mut data = StatusData::new(state, kind).with_lock(locked);
    data.revision = revision;
    Some(StatusEntry { path, data })
}

/// Fill in the repository URL of every versioned entry
///
/// Entries below an external definition belong to another repository location
/// and are left without one.
pub(crate) fn attach_uris(entries: &mut [StatusEntry], wc_root: &Path, root_url: &str) {
    let externals: Vec<PathBuf> = entries
        .iter()
        .filter(|entry| entry.data.state == VersionState::External)
        .map(|entry| entry.path.clone())
        .collect();
    for entry in entries.iter_mut() {
        if !entry.data.state.is_versioned()
            || externals.iter().any(|external| entry.path.starts_with(external))
        {
            continue;
        }
        entry.data.uri = uri_below(root_url, wc_root, &entry.path);
    }
}

/// Repository URL of `path` given the URL of the working-copy root above it
pub(crate) fn uri_below(root_url: &str, wc_root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(wc_root).ok()?;
    let mut uri = root_url.trim_end_matches('/').to_string();
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                uri.push('/');
                uri.push_str(&urlencoding::encode(&name.to_string_lossy()));
            }
            _ => return None,
        }
    }
    Some(uri)
}

/// Parse `svn log -q` output: `r12 | author | 2024-01-05 10:00:00 +0000 (Fri, 05 Jan 2024)`
pub(crate) fn parse_log_output(stdout: &str) -> Vec<LogEntry> {
    stdout
        .lines()
        .filter(|line| line.starts_with('r'))
        .filter_map(|line| {
            let mut parts = line.split(" | ");
            let revision = parts.next()?.trim_start_matches('r').parse().ok()?;
            let author = parts
                .next()
                .map(str::trim)
                .filter(|a| !a.is_empty() && *a != "(no author)")
                .map(str::to_string);
            let date = parts.next().and_then(|raw| {
                let stamp = raw.split(" (").next()?;
                DateTime::parse_from_str(stamp.trim(), "%Y-%m-%d %H:%M:%S %z").ok()
            });
            Some(LogEntry {
                revision,
                author,
                date,
            })
        })
        .collect()
}
