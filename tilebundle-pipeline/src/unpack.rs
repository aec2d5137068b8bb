//! Container extraction and representative-member selection.

use std::io::{self, BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use tilebundle_core::extension_of;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::PipelineError;

/// Extension preferred when choosing the member to route.
pub const PREFERRED_MEMBER_EXTENSION: &str = "shp";

/// Directory names that hold archiver metadata rather than data.
const METADATA_DIRS: &[&str] = &["__MACOSX"];

/// Files extracted from a container plus the member chosen to stand for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedContainer {
    /// Extraction directory.
    pub root: Utf8PathBuf,
    /// Every regular file, in traversal order.
    pub files: Vec<Utf8PathBuf>,
    /// Member used for probing and conversion.
    pub selected: Utf8PathBuf,
}

/// Extract `archive` into `target` and select the member to route.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyContainer`] when no regular file was
/// extracted, [`PipelineError::UnreadableContainer`] for corrupt archives and
/// [`PipelineError::UnsafeContainerEntry`] for entries that would land
/// outside `target` and [`PipelineError::ConflictingContainerEntry`] when an
/// entry cannot be written because another entry already occupies its path.
pub fn unpack_container(
    archive: &Utf8Path,
    target: &Utf8Path,
) -> Result<UnpackedContainer, PipelineError> {
    let extracted = extract_all(archive, target)?;
    let files = list_files(target)?;
    let selected = select_member(&files)
        .ok_or(PipelineError::EmptyContainer)?
        .to_path_buf();
    debug!(
        "unpacked {extracted} entries from {archive}; selected {selected} of {} files",
        files.len()
    );
    Ok(UnpackedContainer {
        root: target.to_path_buf(),
        files,
        selected,
    })
}

/// Choose the member that represents the container.
///
/// The first shapefile wins; otherwise the first file. Archiver metadata
/// (`__MACOSX/`, dot-files) is only chosen when nothing else exists.
#[must_use]
pub fn select_member(files: &[Utf8PathBuf]) -> Option<&Utf8Path> {
    let is_shapefile = |path: &&Utf8PathBuf| {
        path.file_name()
            .is_some_and(|name| extension_of(name) == PREFERRED_MEMBER_EXTENSION)
    };
    let data = || files.iter().filter(|path| !is_metadata(path));
    data()
        .find(is_shapefile)
        .or_else(|| data().next())
        .or_else(|| files.first())
        .map(Utf8PathBuf::as_path)
}

fn is_metadata(path: &Utf8Path) -> bool {
    let hidden = path.file_name().is_some_and(|name| name.starts_with('.'));
    hidden
        || path
            .components()
            .any(|component| METADATA_DIRS.contains(&component.as_str()))
}

fn extract_all(archive: &Utf8Path, target: &Utf8Path) -> Result<usize, PipelineError> {
    let file =
        tilebundle_fs::open_utf8_file(archive).map_err(|source| PipelineError::OpenContainer {
            path: archive.to_path_buf(),
            source,
        })?;
    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|source| {
        PipelineError::UnreadableContainer {
            path: archive.to_path_buf(),
            source,
        }
    })?;
    tilebundle_fs::ensure_dir(target).map_err(|source| PipelineError::ExtractEntry {
        entry: String::new(),
        path: target.to_path_buf(),
        source,
    })?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|source| PipelineError::UnreadableContainer {
                path: archive.to_path_buf(),
                source,
            })?;
        let name = entry.name().to_owned();
        let Some(relative) = entry.enclosed_name().map(|path| path.to_path_buf()) else {
            return Err(PipelineError::UnsafeContainerEntry { entry: name });
        };
        let destination = tilebundle_fs::utf8_path(relative)
            .map(|relative| target.join(relative))
            .map_err(|source| PipelineError::ExtractEntry {
                entry: name.clone(),
                path: target.to_path_buf(),
                source,
            })?;
        // The extraction directory exists by now, so a failed write means the
        // container's own layout is inconsistent.
        let extract_error = |source: io::Error| PipelineError::ConflictingContainerEntry {
            entry: name.clone(),
            path: destination.clone(),
            source,
        };

        if entry.is_dir() {
            tilebundle_fs::ensure_dir(&destination).map_err(extract_error)?;
            continue;
        }
        let mut output = tilebundle_fs::create_utf8_file(&destination).map_err(extract_error)?;
        io::copy(&mut entry, &mut output).map_err(extract_error)?;
        output.flush().map_err(extract_error)?;
    }
    Ok(zip.len())
}

fn list_files(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, PipelineError> {
    let scan_error = |source| PipelineError::ScanContainer {
        path: root.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(scan_error)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let path = tilebundle_fs::utf8_path(path.clone()).map_err(|source| {
            PipelineError::ExtractEntry {
                entry: path.display().to_string(),
                path: root.to_path_buf(),
                source,
            }
        })?;
        files.push(path);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    struct Workspace {
        _dir: TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn workspace() -> Workspace {
        let dir = TempDir::new().expect("tempdir");
        let root = tilebundle_fs::utf8_path(dir.path().to_path_buf()).expect("utf-8 tempdir");
        Workspace { _dir: dir, root }
    }

    fn write_zip(path: &Utf8Path, entries: &[(&str, &str)]) {
        let file = fs::File::create(path).expect("create zip");
        let mut writer = ZipWriter::new(file);
        for (name, contents) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .expect("add directory");
            } else {
                writer
                    .start_file(*name, SimpleFileOptions::default())
                    .expect("start entry");
                writer.write_all(contents.as_bytes()).expect("write entry");
            }
        }
        writer.finish().expect("finish zip");
    }

    #[rstest]
    fn prefers_the_shapefile(workspace: Workspace) {
        let archive = workspace.root.join("city.shp.zip");
        write_zip(
            &archive,
            &[
                ("city.dbf", "dbf"),
                ("city.prj", "prj"),
                ("city.shp", "shp"),
                ("city.shx", "shx"),
            ],
        );
        let target = workspace.root.join("unzipped");

        let unpacked = unpack_container(&archive, &target).expect("unpack");
        assert_eq!(unpacked.root, target);
        assert_eq!(unpacked.selected, target.join("city.shp"));
        assert_eq!(unpacked.files.len(), 4);
        assert_eq!(
            fs::read_to_string(&unpacked.selected).expect("read member"),
            "shp"
        );
    }

    #[rstest]
    fn falls_back_to_first_file_in_name_order(workspace: Workspace) {
        let archive = workspace.root.join("bundle.zip");
        write_zip(
            &archive,
            &[("zeta.gpkg", "z"), ("nested/", ""), ("nested/alpha.csv", "a")],
        );
        let target = workspace.root.join("unzipped");

        let unpacked = unpack_container(&archive, &target).expect("unpack");
        assert_eq!(unpacked.selected, target.join("nested/alpha.csv"));
    }

    #[rstest]
    fn finds_shapefiles_in_subdirectories(workspace: Workspace) {
        let archive = workspace.root.join("deep.zip");
        write_zip(
            &archive,
            &[("a.txt", "readme"), ("data/roads/ROADS.SHP", "shp")],
        );
        let target = workspace.root.join("unzipped");

        let unpacked = unpack_container(&archive, &target).expect("unpack");
        assert_eq!(unpacked.selected, target.join("data/roads/ROADS.SHP"));
    }

    #[rstest]
    fn skips_archiver_metadata(workspace: Workspace) {
        let archive = workspace.root.join("mac.zip");
        write_zip(
            &archive,
            &[("__MACOSX/._parks.shp", "junk"), ("parks.shp", "shp")],
        );
        let target = workspace.root.join("unzipped");

        let unpacked = unpack_container(&archive, &target).expect("unpack");
        assert_eq!(unpacked.selected, target.join("parks.shp"));
    }

    #[rstest]
    fn empty_archives_are_rejected(workspace: Workspace) {
        let archive = workspace.root.join("empty.zip");
        write_zip(&archive, &[("only-a-dir/", "")]);

        let err = unpack_container(&archive, &workspace.root.join("unzipped"))
            .expect_err("empty container should fail");
        assert!(matches!(err, PipelineError::EmptyContainer), "{err:?}");
        assert!(err.is_input_error());
    }

    #[rstest]
    fn corrupt_archives_are_input_errors(workspace: Workspace) {
        let archive = workspace.root.join("broken.zip");
        fs::write(&archive, "definitely not a zip").expect("write junk");

        let err = unpack_container(&archive, &workspace.root.join("unzipped"))
            .expect_err("corrupt container should fail");
        assert!(
            matches!(err, PipelineError::UnreadableContainer { .. }),
            "{err:?}"
        );
        assert!(err.is_input_error());
    }

    #[rstest]
    fn traversal_entries_are_rejected(workspace: Workspace) {
        let archive = workspace.root.join("evil.zip");
        write_zip(&archive, &[("../escape.shp", "x")]);
        let target = workspace.root.join("unzipped");

        let err = unpack_container(&archive, &target).expect_err("traversal should fail");
        assert!(
            matches!(err, PipelineError::UnsafeContainerEntry { .. }),
            "{err:?}"
        );
        assert!(!workspace.root.join("escape.shp").exists());
    }

    #[rstest]
    #[case::file_then_directory(&[("a", "file"), ("a/b.shp", "shp")])]
    #[case::directory_then_file(&[("a/b.shp", "shp"), ("a", "file")])]
    #[case::entry_resolves_to_the_target(&[("x/..", "file")])]
    fn conflicting_entries_are_input_errors(
        workspace: Workspace,
        #[case] entries: &[(&str, &str)],
    ) {
        let archive = workspace.root.join("clash.zip");
        write_zip(&archive, entries);

        let err = unpack_container(&archive, &workspace.root.join("unzipped"))
            .expect_err("conflicting entries should fail");
        assert!(
            matches!(err, PipelineError::ConflictingContainerEntry { .. }),
            "{err:?}"
        );
        assert!(err.is_input_error());
    }

    #[rstest]
    #[case(&["b.txt", "a.shp"], Some("a.shp"))]
    #[case(&["b.txt", "a.csv"], Some("b.txt"))]
    #[case(&[".hidden", "data.csv"], Some("data.csv"))]
    #[case(&[".hidden"], Some(".hidden"))]
    #[case(&[], None)]
    fn member_selection_policy(#[case] names: &[&str], #[case] expected: Option<&str>) {
        let files: Vec<Utf8PathBuf> = names.iter().map(|name| Utf8PathBuf::from(*name)).collect();
        assert_eq!(select_member(&files), expected.map(Utf8Path::new));
    }
}
