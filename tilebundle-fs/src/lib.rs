//! Shared filesystem helpers built on `cap-std` and `camino`.
#![forbid(unsafe_code)]

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io::{self, Read, Write};
use std::path::PathBuf;

/// Open a UTF-8 file path for reading using ambient authority.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Create (or truncate) a file, creating missing parent directories first.
pub fn create_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    ensure_parent_dir(path)?;
    let (dir, name) = open_dir_and_file(path)?;
    dir.create(name.as_str())
}

/// Write `contents` to `path`, replacing any existing file.
pub fn write_file(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let mut file = create_utf8_file(path)?;
    file.write_all(contents)?;
    file.flush()
}

/// Copy the file at `source` to `target`, returning the number of bytes copied.
pub fn copy_file(source: &Utf8Path, target: &Utf8Path) -> io::Result<u64> {
    let mut reader = open_utf8_file(source)?;
    let mut writer = create_utf8_file(target)?;
    let copied = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    Ok(copied)
}

/// Open the parent of `path` and return it with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let parent = if parent.as_str().is_empty() {
        Utf8Path::new(".")
    } else {
        parent
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Create the directory that will hold `path`.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    ensure_dir(parent)
}

/// Ensure `dir` and all of its ancestors exist.
pub fn ensure_dir(dir: &Utf8Path) -> io::Result<()> {
    if dir.as_str().is_empty() || dir == Utf8Path::new("/") {
        return Ok(());
    }

    let (anchor, rest) = anchor_and_rest(dir)?;
    if rest.as_str().is_empty() {
        return Ok(());
    }
    anchor.create_dir_all(&rest)
}

/// Return whether a path exists and is a regular file using capability-based IO.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Return whether a path exists and is a directory.
pub fn dir_is_dir(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_dir())
}

/// Read the whole file at `path`.
pub fn read_file(path: &Utf8Path) -> io::Result<Vec<u8>> {
    let mut file = open_utf8_file(path)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Convert a standard path into a UTF-8 path, rejecting non-UTF-8 names.
pub fn utf8_path(path: PathBuf) -> io::Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|original| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("non-UTF-8 path {}", original.display()),
        )
    })
}

/// Open the directory `path` is anchored at (drive prefix and root, or the
/// current directory) and return it with the remainder of `path`.
fn anchor_and_rest(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let is_anchor = |component: &Utf8Component<'_>| {
        matches!(component, Utf8Component::Prefix(_) | Utf8Component::RootDir)
    };
    let anchor: Utf8PathBuf = path.components().take_while(is_anchor).collect();
    let rest: Utf8PathBuf = path.components().skip_while(is_anchor).collect();
    let anchor = if anchor.as_str().is_empty() {
        Utf8PathBuf::from(".")
    } else {
        anchor
    };
    let dir = fs_utf8::Dir::open_ambient_dir(&anchor, ambient_authority())?;
    Ok((dir, rest))
}
