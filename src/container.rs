/*!
 * Container store: zip archive extraction and repackaging.
 *
 * A run extracts the input archive into its own temporary working area and
 * records the archive manifest (entry order, directory flags, compression,
 * unix mode). Repackaging replays that manifest over the current contents
 * of the working area, so entries the pipeline never touched keep their
 * bytes and their position in the archive.
 */

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::{NamedTempFile, TempDir};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::ContainerError;

/// ODF requires this entry first and uncompressed
pub const MIMETYPE_ENTRY: &str = "mimetype";

const WORKING_AREA_PREFIX: &str = "yadtwai-";

/// One entry of the source archive, as recorded at extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    /// Entry name with `/` separators
    pub name: String,
    pub is_dir: bool,
    pub compression: CompressionMethod,
    pub unix_mode: Option<u32>,
}

/// An extracted archive, owned by exactly one run
#[derive(Debug)]
pub struct WorkingArea {
    dir: TempDir,
    entries: Vec<ArchiveEntry>,
    source: PathBuf,
}

impl WorkingArea {
    /// Root directory of the extracted files
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Archive the area was extracted from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Manifest in original archive order
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// File path of a part inside the working area
    pub fn part_path(&self, name: &str) -> PathBuf {
        name.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.dir.path().to_path_buf(), |path, segment| path.join(segment))
    }

    /// Whether the archive held a file entry with this name
    pub fn has_part(&self, name: &str) -> bool {
        self.entries.iter().any(|e| !e.is_dir && e.name == name)
    }

    /// Names of all file entries, in archive order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter(|e| !e.is_dir).map(|e| e.name.as_str())
    }

    pub fn read_part(&self, name: &str) -> Result<Vec<u8>, ContainerError> {
        if !self.has_part(name) {
            return Err(ContainerError::MissingPart(name.to_string()));
        }
        let path = self.part_path(name);
        fs::read(&path).map_err(|e| ContainerError::Unreadable {
            path,
            reason: e.to_string(),
        })
    }

    pub fn write_part(&self, name: &str, bytes: &[u8]) -> Result<(), ContainerError> {
        let path = self.part_path(name);
        fs::write(&path, bytes).map_err(|e| write_failed(&path, e))
    }
}

fn unreadable(path: &Path, reason: impl ToString) -> ContainerError {
    ContainerError::Unreadable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn write_failed(path: &Path, reason: impl ToString) -> ContainerError {
    ContainerError::WriteFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Extracts archives into isolated working areas and rebuilds them
#[derive(Debug, Clone, Default)]
pub struct ContainerStore {
    // @field: Parent directory for working areas, system temp dir when None
    working_root: Option<PathBuf>,
}

impl ContainerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_root(working_root: Option<PathBuf>) -> Self {
        Self { working_root }
    }

    /// Unpack `archive_path` into a freshly created, uniquely named directory
    pub fn extract(&self, archive_path: &Path) -> Result<WorkingArea, ContainerError> {
        let file = File::open(archive_path).map_err(|e| unreadable(archive_path, e))?;
        let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| unreadable(archive_path, e))?;

        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKING_AREA_PREFIX);
        let dir = match &self.working_root {
            Some(root) => {
                fs::create_dir_all(root).map_err(|e| write_failed(root, e))?;
                builder.tempdir_in(root).map_err(|e| write_failed(root, e))?
            }
            None => builder.tempdir().map_err(|e| write_failed(&std::env::temp_dir(), e))?,
        };
        debug!("Extracting {:?} into {:?}", archive_path, dir.path());

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| unreadable(archive_path, e))?;
            let name = entry.name().to_string();

            let relative = entry
                .enclosed_name()
                .ok_or_else(|| unreadable(archive_path, format!("entry '{}' escapes the archive root", name)))?;
            if entry.encrypted() {
                return Err(unreadable(archive_path, format!("entry '{}' is encrypted", name)));
            }

            let target = dir.path().join(relative);
            if entry.is_dir() {
                fs::create_dir_all(&target).map_err(|e| write_failed(&target, e))?;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| write_failed(parent, e))?;
                }
                let mut out = File::create(&target).map_err(|e| write_failed(&target, e))?;
                io::copy(&mut entry, &mut out).map_err(|e| unreadable(archive_path, format!("entry '{}': {}", name, e)))?;
            }

            entries.push(ArchiveEntry {
                name,
                is_dir: entry.is_dir(),
                compression: entry.compression(),
                unix_mode: entry.unix_mode(),
            });
        }

        Ok(WorkingArea {
            dir,
            entries,
            source: archive_path.to_path_buf(),
        })
    }

    /// Build a new archive at `output_path` from the working area,
    /// replacing any existing file only once the archive is complete
    pub fn repackage(&self, area: &WorkingArea, output_path: &Path) -> Result<(), ContainerError> {
        let output_dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&output_dir).map_err(|e| write_failed(&output_dir, e))?;

        let mut staged = NamedTempFile::new_in(&output_dir).map_err(|e| write_failed(&output_dir, e))?;
        {
            let mut writer = ZipWriter::new(staged.as_file_mut());
            let mut written = HashSet::new();

            let ordered = area
                .entries
                .iter()
                .filter(|e| e.name == MIMETYPE_ENTRY)
                .chain(area.entries.iter().filter(|e| e.name != MIMETYPE_ENTRY));

            for entry in ordered {
                if !written.insert(entry.name.clone()) {
                    continue;
                }
                let options = entry_options(entry);
                if entry.is_dir {
                    writer
                        .add_directory(entry.name.trim_end_matches('/'), options)
                        .map_err(|e| write_failed(output_path, e))?;
                    continue;
                }

                let path = area.part_path(&entry.name);
                if !path.is_file() {
                    debug!("Entry '{}' was removed from the working area, skipping", entry.name);
                    continue;
                }
                append_file(&mut writer, &entry.name, &path, options, output_path)?;
            }

            for extra in extra_files(area.path(), &written)? {
                let path = area.part_path(&extra);
                let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
                append_file(&mut writer, &extra, &path, options, output_path)?;
            }

            writer.finish().map_err(|e| write_failed(output_path, e))?;
        }

        staged
            .as_file()
            .sync_all()
            .map_err(|e| write_failed(output_path, e))?;
        staged
            .persist(output_path)
            .map_err(|e| write_failed(output_path, e.error))?;
        debug!("Repackaged {:?} into {:?}", area.source, output_path);
        Ok(())
    }

    /// Remove the working area; failures are logged, never raised
    pub fn cleanup(&self, area: WorkingArea) {
        let path = area.path().to_path_buf();
        match area.dir.close() {
            Ok(()) => debug!("Removed working area {:?}", path),
            Err(e) => warn!("Failed to remove working area {:?}: {}", path, e),
        }
    }
}

fn entry_options(entry: &ArchiveEntry) -> SimpleFileOptions {
    // Only stored and deflated are available for writing
    let compression = if entry.name == MIMETYPE_ENTRY || entry.compression == CompressionMethod::Stored {
        CompressionMethod::Stored
    } else {
        CompressionMethod::Deflated
    };
    let options = SimpleFileOptions::default().compression_method(compression);
    match entry.unix_mode {
        Some(mode) => options.unix_permissions(mode),
        None => options,
    }
}

fn append_file<W: Write + io::Seek>(
    writer: &mut ZipWriter<W>,
    name: &str,
    path: &Path,
    options: SimpleFileOptions,
    output_path: &Path,
) -> Result<(), ContainerError> {
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut file| file.read_to_end(&mut bytes))
        .map_err(|e| unreadable(path, e))?;
    writer
        .start_file(name, options)
        .map_err(|e| write_failed(output_path, e))?;
    writer.write_all(&bytes).map_err(|e| write_failed(output_path, e))
}

/// Files present in the working area but absent from the manifest, in path order
fn extra_files(root: &Path, known: &HashSet<String>) -> Result<Vec<String>, ContainerError> {
    let mut extras = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| unreadable(root, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if !known.contains(&name) {
            extras.push(name);
        }
    }
    Ok(extras)
}
