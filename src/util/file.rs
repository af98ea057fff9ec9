use std::path::{Component, Path, PathBuf};

/// Posix form of a relative path, `None` if it leaves its base or is not
/// valid UTF-8.
pub fn posix(path: &Path) -> Option<String> {
    let mut parts = Vec::<&str>::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(parts.join("/"))
}

pub trait PathExt {
    /// Posix path of `self` relative to `root`.
    fn relative_posix(&self, root: &Path) -> Option<String>;

    fn is_within(&self, root: &Path) -> bool;
}

impl PathExt for Path {
    fn relative_posix(&self, root: &Path) -> Option<String> {
        self.strip_prefix(root).ok().and_then(posix)
    }

    fn is_within(&self, root: &Path) -> bool {
        self.starts_with(root)
    }
}

impl PathExt for PathBuf {
    fn relative_posix(&self, root: &Path) -> Option<String> {
        self.as_path().relative_posix(root)
    }

    fn is_within(&self, root: &Path) -> bool {
        self.as_path().is_within(root)
    }
}
