use std::collections::BTreeMap;
use std::fs::{self, File, Metadata};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::Utc;
use log::{debug, info, warn};
use tar::{Builder, EntryType, Header, HeaderMode};

use crate::context::{ArchiveOp, ArchivePlan};
use crate::error::{PayloadError, Result};
use crate::util::compress::MaybeGz;
use crate::util::file::PathExt;

/// A finished build-context archive, readable once from the start.
///
/// Backed by an anonymous temporary file that disappears on drop. Build a new
/// one to upload again.
pub struct ContextArchive {
    file: File,
    len: u64,
    entries: usize,
}

impl ContextArchive {
    /// Byte length, for `Content-Length`.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of tar entries written.
    pub fn entries(&self) -> usize {
        self.entries
    }
}

impl Read for ContextArchive {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl std::fmt::Debug for ContextArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextArchive")
            .field("len", &self.len)
            .field("entries", &self.entries)
            .finish()
    }
}

impl ArchivePlan {
    /// Writes the archive of `root` into `writer` entry by entry and returns
    /// the number of entries. On error the writer holds a truncated archive
    /// and must be discarded.
    pub fn write_to<W: Write>(&self, root: &Path, writer: W) -> Result<usize> {
        if !root.is_dir() {
            return Err(PayloadError::ContextNotFound(root.to_path_buf()));
        }
        let overrides = self.overrides()?;
        let mut walker = Walker {
            builder: Builder::new(MaybeGz::new(writer, self.gzip)),
            root,
            plan: self,
            overrides: &overrides,
            entries: 0,
        };
        walker.walk(root)?;
        let mtime = Utc::now().timestamp().max(0) as u64;
        for (path, content) in &overrides {
            walker.append_override(path, content, mtime)?;
        }
        let entries = walker.entries;
        let sink = walker.builder.into_inner().map_err(|e| PayloadError::archive_io(root, e))?;
        sink.finish().map_err(|e| PayloadError::archive_io(root, e))?;
        Ok(entries)
    }

    /// Builds the whole archive into a temporary spool file. Nothing is
    /// returned unless every entry was written.
    pub fn spool(&self, root: &Path) -> Result<ContextArchive> {
        let mut file = tempfile::tempfile()?;
        let entries = self.write_to(root, &mut file)?;
        file.seek(SeekFrom::Start(0))?;
        let len = file.metadata()?.len();
        info!("build context {:?} archived: {} entries, {} bytes", root, entries, len);
        Ok(ContextArchive { file, len, entries })
    }

    /// Override entries by cleaned path; a later override of the same path
    /// replaces an earlier one.
    fn overrides(&self) -> Result<BTreeMap<String, Bytes>> {
        let mut overrides = BTreeMap::new();
        for op in &self.ops {
            if let ArchiveOp::Override { path, content } = op {
                let clean = crate::util::file::posix(Path::new(path)).filter(|p| !p.is_empty()).ok_or_else(|| {
                    PayloadError::archive_io(path, io::Error::new(ErrorKind::InvalidInput, "override path leaves the context"))
                })?;
                overrides.insert(clean, content.clone());
            }
        }
        Ok(overrides)
    }
}

struct Walker<'a, W: Write> {
    builder: Builder<MaybeGz<W>>,
    root: &'a Path,
    plan: &'a ArchivePlan,
    overrides: &'a BTreeMap<String, Bytes>,
    entries: usize,
}

impl<'a, W: Write> Walker<'a, W> {
    fn walk(&mut self, dir: &Path) -> Result<()> {
        let mut children = fs::read_dir(dir)
            .and_then(|read_dir| read_dir.map(|entry| entry.map(|entry| entry.path())).collect::<io::Result<Vec<PathBuf>>>())
            .map_err(|e| PayloadError::archive_io(dir, e))?;
        children.sort();
        for path in children {
            let relative = path.relative_posix(self.root).ok_or_else(|| {
                PayloadError::archive_io(&path, io::Error::new(ErrorKind::InvalidData, "path is not valid UTF-8"))
            })?;
            if self.plan.is_excluded(&relative) {
                debug!("exclude '{}'", relative);
                continue;
            }
            let metadata = fs::symlink_metadata(&path).map_err(|e| PayloadError::archive_io(&path, e))?;
            let file_type = metadata.file_type();
            if file_type.is_dir() {
                self.append_dir(&path, &relative, &metadata)?;
                self.walk(&path)?;
            } else if self.overrides.contains_key(&relative) {
                debug!("'{}' replaced by override", relative);
            } else if file_type.is_symlink() {
                self.append_symlink(&path, &relative, &metadata)?;
            } else if file_type.is_file() {
                self.append_file(&path, &relative, &metadata)?;
            } else {
                warn!("skip special file '{}'", relative);
            }
        }
        Ok(())
    }

    fn append_dir(&mut self, path: &Path, relative: &str, metadata: &Metadata) -> Result<()> {
        let mut header = owned_header(metadata);
        header.set_size(0);
        self.builder
            .append_data(&mut header, relative, io::empty())
            .map_err(|e| PayloadError::archive_io(path, e))?;
        self.entries += 1;
        Ok(())
    }

    fn append_symlink(&mut self, path: &Path, relative: &str, metadata: &Metadata) -> Result<()> {
        let target = fs::read_link(path).map_err(|e| PayloadError::archive_io(path, e))?;
        let mut header = owned_header(metadata);
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        self.builder
            .append_link(&mut header, relative, &target)
            .map_err(|e| PayloadError::archive_io(path, e))?;
        self.entries += 1;
        Ok(())
    }

    fn append_file(&mut self, path: &Path, relative: &str, metadata: &Metadata) -> Result<()> {
        let mut file = File::open(path).map_err(|e| PayloadError::archive_io(path, e))?;
        let mut header = owned_header(metadata);
        self.builder
            .append_data(&mut header, relative, &mut file)
            .map_err(|e| PayloadError::archive_io(path, e))?;
        self.entries += 1;
        Ok(())
    }

    fn append_override(&mut self, relative: &str, content: &Bytes, mtime: u64) -> Result<()> {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_mode(0o644);
        header.set_size(content.len() as u64);
        header.set_mtime(mtime);
        header.set_uid(0);
        header.set_gid(0);
        self.builder
            .append_data(&mut header, relative, content.as_ref())
            .map_err(|e| PayloadError::archive_io(self.root.join(relative), e))?;
        self.entries += 1;
        Ok(())
    }
}

/// Header carrying mode, size and mtime of `metadata`, owned by root.
fn owned_header(metadata: &Metadata) -> Header {
    let mut header = Header::new_gnu();
    header.set_metadata_in_mode(metadata, HeaderMode::Complete);
    header.set_uid(0);
    header.set_gid(0);
    // empty owner names cannot fail on a gnu header
    let _ = header.set_username("");
    let _ = header.set_groupname("");
    header
}
