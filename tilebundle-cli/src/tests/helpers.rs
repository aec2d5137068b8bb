//! Test helpers: scratch workspaces, zip fixtures and a file-writing tool double.

use super::*;
use camino::Utf8PathBuf;
use std::{cell::RefCell, fs, io::Cursor};
use tempfile::TempDir;
use tilebundle_core::test_support::ScriptedToolRunner;
use tilebundle_core::{ToolError, ToolInvocation, ToolOutput};
use zip::{ZipWriter, write::SimpleFileOptions};

pub(super) const OGRINFO_REPORT: &str =
    r#"{"layers":[{"name":"parks","geometryFields":[{"extent":[-0.5,51.2,0.3,51.7]}]}]}"#;

/// Bytes the fake `pmtiles` writes as its archive.
pub(super) const FAKE_ARCHIVE: &[u8] = b"PMTiles\x03";

pub(super) struct Workspace {
    _dir: TempDir,
    pub(super) root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn output_dir(&self) -> Utf8PathBuf {
        self.root.join("out")
    }

    pub(super) fn work_root(&self) -> Utf8PathBuf {
        self.root.join("work")
    }

    pub(super) fn leftover_scopes(&self) -> usize {
        fs::read_dir(self.work_root()).map_or(0, Iterator::count)
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    tilebundle_fs::write_file(path, contents).expect("write fixture");
}

pub(super) fn zip_bytes(entries: &[&str]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for name in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start entry");
        std::io::Write::write_all(&mut writer, name.as_bytes()).expect("write entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Replays scripted results and, like the real `pmtiles`, leaves an archive
/// at the output path when conversion succeeds.
pub(super) struct ArchiveWritingRunner<'a> {
    inner: &'a ScriptedToolRunner,
}

impl ToolRunner for ArchiveWritingRunner<'_> {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        let output = self.inner.run(invocation)?;
        if output.success()
            && invocation.program() == "pmtiles"
            && let Some(target) = invocation.arguments().last()
        {
            write_utf8(Utf8Path::new(target), FAKE_ARCHIVE);
        }
        Ok(output)
    }
}

/// Hands out runners backed by one [`ScriptedToolRunner`] and records the
/// timeouts requested.
#[derive(Debug, Default)]
pub(super) struct ScriptedRunnerBuilder {
    pub(super) runner: ScriptedToolRunner,
    pub(super) timeouts: RefCell<Vec<Option<Duration>>>,
}

impl ScriptedRunnerBuilder {
    pub(super) fn new(runner: ScriptedToolRunner) -> Self {
        Self {
            runner,
            timeouts: RefCell::new(Vec::new()),
        }
    }
}

impl RunnerBuilder for ScriptedRunnerBuilder {
    fn build(&self, timeout: Option<Duration>) -> Box<dyn ToolRunner + '_> {
        self.timeouts.borrow_mut().push(timeout);
        Box::new(ArchiveWritingRunner {
            inner: &self.runner,
        })
    }
}
