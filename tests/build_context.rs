use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use podwire::{create_tar, prepare_dockerignore, BuildContext, ContextArchive, PayloadError};

struct Entry {
    kind: EntryType,
    mode: u32,
    uid: u64,
    content: Vec<u8>,
    link: Option<String>,
}

fn entries<R: Read>(reader: R) -> anyhow::Result<HashMap<String, Entry>> {
    let mut archive = Archive::new(reader);
    let mut entries = HashMap::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.to_string_lossy().trim_end_matches('/').to_string();
        let header = entry.header();
        let kind = header.entry_type();
        let mode = header.mode()?;
        let uid = header.uid()?;
        let link = entry.link_name()?.map(|link| link.to_string_lossy().to_string());
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        entries.insert(path, Entry { kind, mode, uid, content, link });
    }
    Ok(entries)
}

fn read_archive(archive: ContextArchive) -> anyhow::Result<HashMap<String, Entry>> {
    entries(archive)
}

fn write(root: &Path, relative: &str, content: &str) -> anyhow::Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

#[test]
fn ignored_directory_is_left_out() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "a.txt", "a")?;
    write(dir.path(), "b/c.txt", "c")?;
    write(dir.path(), ".dockerignore", "b/\n")?;

    let ignore = prepare_dockerignore(dir.path())?;
    let entries = read_archive(create_tar(dir.path(), Some(&ignore), None)?)?;
    assert!(entries.contains_key("a.txt"));
    assert!(!entries.contains_key("b"));
    assert!(!entries.contains_key("b/c.txt"));
    assert!(entries.contains_key(".dockerignore"));
    Ok(())
}

#[test]
fn everything_without_ignore_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "a.txt", "alpha")?;
    write(dir.path(), "b/c.txt", "gamma")?;

    let ignore = prepare_dockerignore(dir.path())?;
    assert!(ignore.is_empty());
    let archive = create_tar(dir.path(), Some(&ignore), None)?;
    assert_eq!(archive.entries(), 3);
    let entries = read_archive(archive)?;
    assert_eq!(entries["a.txt"].content, b"alpha");
    assert_eq!(entries["b/c.txt"].content, b"gamma");
    assert_eq!(entries["b"].kind, EntryType::Directory);
    assert_eq!(entries["a.txt"].uid, 0);
    Ok(())
}

#[test]
fn negation_re_includes_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "README.md", "readme")?;
    write(dir.path(), "CHANGES.md", "changes")?;
    write(dir.path(), "docs/guide.md", "guide")?;
    write(dir.path(), ".containerignore", "*.md\n!README.md\n")?;
    // .containerignore wins over .dockerignore
    write(dir.path(), ".dockerignore", "docs\n")?;

    let ignore = prepare_dockerignore(dir.path())?;
    let entries = read_archive(create_tar(dir.path(), Some(&ignore), None)?)?;
    assert!(entries.contains_key("README.md"));
    assert!(!entries.contains_key("CHANGES.md"));
    assert!(entries.contains_key("docs/guide.md"));
    Ok(())
}

#[test]
fn overrides_replace_and_add() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "Dockerfile", "FROM fedora\n")?;
    write(dir.path(), "app.py", "print('hi')\n")?;

    let overrides = BTreeMap::from([
        ("Dockerfile".to_string(), Bytes::from_static(b"FROM scratch\n")),
        ("./extra/config.json".to_string(), Bytes::from_static(b"{}")),
    ]);
    let entries = read_archive(create_tar(dir.path(), None, Some(&overrides))?)?;
    assert_eq!(entries["Dockerfile"].content, b"FROM scratch\n");
    assert_eq!(entries["extra/config.json"].content, b"{}");
    assert_eq!(entries["extra/config.json"].mode, 0o644);
    assert_eq!(entries["app.py"].content, b"print('hi')\n");
    Ok(())
}

#[test]
fn override_outside_context_is_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let overrides = BTreeMap::from([("../escape".to_string(), Bytes::from_static(b"x"))]);
    let err = create_tar(dir.path(), None, Some(&overrides)).unwrap_err();
    assert!(matches!(err, PayloadError::ArchiveIo { .. }));
    Ok(())
}

#[test]
fn missing_root_is_context_not_found() {
    let err = create_tar(Path::new("/definitely/not/a/context"), None, None).unwrap_err();
    assert!(matches!(err, PayloadError::ContextNotFound(_)));
}

#[test]
fn file_root_is_context_not_found() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "file", "x")?;
    let err = create_tar(&dir.path().join("file"), None, None).unwrap_err();
    assert!(matches!(err, PayloadError::ContextNotFound(_)));
    Ok(())
}

#[cfg(unix)]
#[test]
fn modes_and_symlinks_are_kept() -> anyhow::Result<()> {
    use std::os::unix::fs::{symlink, PermissionsExt};

    let dir = tempfile::tempdir()?;
    write(dir.path(), "run.sh", "#!/bin/sh\n")?;
    fs::set_permissions(dir.path().join("run.sh"), fs::Permissions::from_mode(0o755))?;
    symlink("run.sh", dir.path().join("start"))?;

    let entries = read_archive(create_tar(dir.path(), None, None)?)?;
    assert_eq!(entries["run.sh"].mode & 0o777, 0o755);
    let link = &entries["start"];
    assert_eq!(link.kind, EntryType::Symlink);
    assert_eq!(link.link.as_deref(), Some("run.sh"));
    assert!(link.content.is_empty());
    Ok(())
}

#[cfg(unix)]
#[test]
fn unreadable_file_aborts_archive() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir()?;
    write(dir.path(), "secret", "x")?;
    fs::set_permissions(dir.path().join("secret"), fs::Permissions::from_mode(0o000))?;
    // root can read anything, nothing to check then
    if fs::File::open(dir.path().join("secret")).is_ok() {
        return Ok(());
    }
    let err = create_tar(dir.path(), None, None).unwrap_err();
    assert!(matches!(err, PayloadError::ArchiveIo { .. }));
    Ok(())
}

#[test]
fn build_context_synthesizes_dockerfile() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "app.py", "print('hi')\n")?;

    let (archive, dockerfile) = BuildContext::new(dir.path())
        .dockerfile_content("FROM python:3\nCOPY app.py /\n")
        .ignore_content("*.pyc\n")
        .archive()?;
    assert_eq!(dockerfile, "Dockerfile");
    let entries = read_archive(archive)?;
    assert_eq!(entries["Dockerfile"].content, b"FROM python:3\nCOPY app.py /\n");
    assert_eq!(entries[".dockerignore"].content, b"*.pyc\n");
    assert!(entries.contains_key("app.py"));
    Ok(())
}

#[test]
fn build_context_ships_ignored_dockerfile() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "Containerfile", "FROM scratch\n")?;
    write(dir.path(), ".dockerignore", "Containerfile\n")?;

    let (archive, dockerfile) = BuildContext::new(dir.path()).archive()?;
    assert_eq!(dockerfile, "Containerfile");
    let entries = read_archive(archive)?;
    assert_eq!(entries["Containerfile"].content, b"FROM scratch\n");
    Ok(())
}

#[test]
fn build_context_ships_dockerfile_under_ignored_dir() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "build/Dockerfile", "FROM alpine\n")?;
    write(dir.path(), "build/cache.bin", "junk")?;
    write(dir.path(), "app.py", "")?;
    write(dir.path(), ".dockerignore", "build\n")?;

    let (archive, dockerfile) = BuildContext::new(dir.path()).dockerfile("build/Dockerfile").archive()?;
    assert_eq!(dockerfile, "build/Dockerfile");
    let entries = read_archive(archive)?;
    assert_eq!(entries["build/Dockerfile"].content, b"FROM alpine\n");
    assert!(!entries.contains_key("build/cache.bin"));
    assert!(entries.contains_key("app.py"));
    Ok(())
}

#[test]
fn build_context_without_dockerfile() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "app.py", "")?;
    let err = BuildContext::new(dir.path()).archive().unwrap_err();
    assert!(matches!(err, PayloadError::ContextNotFound(_)));
    Ok(())
}

#[test]
fn gzip_archive() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "Dockerfile", "FROM scratch\n")?;

    let (archive, _) = BuildContext::new(dir.path()).gzip(true).archive()?;
    assert!(!archive.is_empty());
    let entries = entries(GzDecoder::new(archive))?;
    assert_eq!(entries["Dockerfile"].content, b"FROM scratch\n");
    Ok(())
}
