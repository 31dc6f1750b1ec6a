//! Persists a [`JobContext`] so later job steps can read it.
//!
//! [`EnvFileChannel`] appends entries to the runner's output and state files
//! using the heredoc form `name<<DELIM`, `value`, `DELIM`. The delimiter is
//! derived from the entry so values containing newlines survive intact.

use std::fs::OpenOptions;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{Context, eyre};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::context::JobContext;
use crate::error::{ChannelError, ChannelResult};
use crate::observability::LOG_TARGET;

const DELIMITER_PREFIX: &str = "ghadelimiter_";

/// Platform hook that hands outputs and state to later steps.
pub trait JobChannel {
    /// Persists every output and state entry of `context`.
    ///
    /// # Errors
    /// Returns an error when the platform cannot accept an entry.
    fn flush(&self, context: &JobContext) -> ChannelResult<()>;
}

/// Writes outputs and state to runner-provided environment files.
///
/// A missing file path degrades to logging the entries at info level.
#[derive(Debug, Clone, Default)]
pub struct EnvFileChannel {
    output_file: Option<Utf8PathBuf>,
    state_file: Option<Utf8PathBuf>,
}

impl EnvFileChannel {
    /// Creates a channel writing to the given files.
    #[must_use]
    pub const fn new(output_file: Option<Utf8PathBuf>, state_file: Option<Utf8PathBuf>) -> Self {
        Self {
            output_file,
            state_file,
        }
    }
}

impl JobChannel for EnvFileChannel {
    fn flush(&self, context: &JobContext) -> ChannelResult<()> {
        write_entries(self.output_file.as_deref(), "output", context.outputs())?;
        write_entries(self.state_file.as_deref(), "state", context.states())
    }
}

fn write_entries<'k, 'v>(
    file: Option<&Utf8Path>,
    kind: &str,
    entries: impl Iterator<Item = (&'k str, &'v str)>,
) -> ChannelResult<()> {
    let Some(path) = file else {
        for (name, value) in entries {
            info!(target: LOG_TARGET, kind, name, value, "no file configured for entry");
        }
        return Ok(());
    };

    let mut rendered = String::new();
    for (name, value) in entries {
        rendered.push_str(&format_entry(name, value)?);
    }
    if rendered.is_empty() {
        return Ok(());
    }

    let mut handle = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {kind} file {path}"))?;
    handle
        .write_all(rendered.as_bytes())
        .with_context(|| format!("failed to write {kind} file {path}"))?;
    Ok(())
}

/// Renders a single entry in the runner's heredoc format.
///
/// # Errors
/// Returns an error if the derived delimiter occurs in the name or value.
pub fn format_entry(name: &str, value: &str) -> ChannelResult<String> {
    let digest = Sha256::new()
        .chain_update(name.as_bytes())
        .chain_update([0_u8])
        .chain_update(value.as_bytes())
        .finalize();
    let delimiter = format!("{DELIMITER_PREFIX}{digest:x}");
    if name.contains(&delimiter) || value.contains(&delimiter) {
        return Err(ChannelError::from(eyre!(
            "unexpected input: delimiter {delimiter} occurs in entry {name}"
        )));
    }
    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CACHE_HIT_OUTPUT, PRIMARY_KEY_OUTPUT, StateKey};
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    fn parse_entries(content: &str) -> Vec<(String, String)> {
        let mut entries = Vec::new();
        let mut lines = content.lines();
        while let Some(header) = lines.next() {
            let (name, delimiter) = header.split_once("<<").expect("heredoc header");
            let mut value = Vec::new();
            for line in lines.by_ref() {
                if line == delimiter {
                    break;
                }
                value.push(line);
            }
            entries.push((name.to_owned(), value.join("\n")));
        }
        entries
    }

    #[rstest]
    fn entries_use_heredoc_format() {
        let rendered = format_entry("primary-key", "v1-abc").expect("render");
        let mut lines = rendered.lines();
        let header = lines.next().expect("header line");
        let (name, delimiter) = header.split_once("<<").expect("heredoc marker");
        assert_eq!(name, "primary-key");
        assert!(delimiter.starts_with(DELIMITER_PREFIX));
        assert_eq!(lines.next(), Some("v1-abc"));
        assert_eq!(lines.next(), Some(delimiter));
    }

    #[rstest]
    fn flush_appends_outputs_and_state() {
        let temp = tempdir().expect("tempdir");
        let root = Utf8Path::from_path(temp.path()).expect("utf8 path");
        let output = root.join("output");
        let state = root.join("state");
        fs::write(&output, "existing<<EOF\nkept\nEOF\n").expect("seed output");

        let mut ctx = JobContext::new();
        ctx.set_output(PRIMARY_KEY_OUTPUT, "v1-abc");
        ctx.set_output(CACHE_HIT_OUTPUT, true);
        ctx.save_state(StateKey::CacheKey, "v1-abc");

        EnvFileChannel::new(Some(output.clone()), Some(state.clone()))
            .flush(&ctx)
            .expect("flush");

        let outputs = parse_entries(&fs::read_to_string(&output).expect("read output"));
        assert_eq!(
            outputs,
            [
                ("existing".to_owned(), "kept".to_owned()),
                ("cache-hit".to_owned(), "true".to_owned()),
                ("primary-key".to_owned(), "v1-abc".to_owned()),
            ]
        );
        let states = parse_entries(&fs::read_to_string(&state).expect("read state"));
        assert_eq!(states, [("CACHE_KEY".to_owned(), "v1-abc".to_owned())]);
    }

    fn flush_fresh_context(channel: &dyn JobChannel, key: &str) -> ChannelResult<()> {
        let mut ctx = JobContext::new();
        ctx.save_state(StateKey::CacheKey, key);
        ctx.save_state(StateKey::CacheResult, key.to_uppercase());
        channel.flush(&ctx)
    }

    #[rstest]
    fn state_entries_flush_from_a_short_lived_context() {
        let temp = tempdir().expect("tempdir");
        let root = Utf8Path::from_path(temp.path()).expect("utf8 path");
        let state = root.join("state");
        let channel = EnvFileChannel::new(None, Some(state.clone()));

        flush_fresh_context(&channel, "v1-abc").expect("first flush");
        flush_fresh_context(&channel, "v1-def").expect("second flush");

        let states = parse_entries(&fs::read_to_string(&state).expect("read state"));
        assert_eq!(
            states,
            [
                ("CACHE_KEY".to_owned(), "v1-abc".to_owned()),
                ("CACHE_RESULT".to_owned(), "V1-ABC".to_owned()),
                ("CACHE_KEY".to_owned(), "v1-def".to_owned()),
                ("CACHE_RESULT".to_owned(), "V1-DEF".to_owned()),
            ]
        );
    }

    #[rstest]
    fn multi_line_values_survive() {
        let rendered = format_entry("note", "first\nsecond").expect("render");
        assert_eq!(
            parse_entries(&rendered),
            [("note".to_owned(), "first\nsecond".to_owned())]
        );
    }

    #[rstest]
    fn missing_files_only_log() {
        let mut ctx = JobContext::new();
        ctx.set_output(CACHE_HIT_OUTPUT, false);
        assert!(EnvFileChannel::default().flush(&ctx).is_ok());
    }

    #[rstest]
    fn unwritable_file_reports_error() {
        let temp = tempdir().expect("tempdir");
        let root = Utf8Path::from_path(temp.path()).expect("utf8 path");
        let output = root.join("missing-dir").join("output");
        let mut ctx = JobContext::new();
        ctx.set_output(CACHE_HIT_OUTPUT, false);

        let err = EnvFileChannel::new(Some(output), None)
            .flush(&ctx)
            .expect_err("parent directory is missing");
        assert!(err.to_string().contains("failed to open output file"));
    }
}
