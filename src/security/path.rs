use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components lexically, without touching the
/// filesystem. Unlike `canonicalize()` this works for paths that do not
/// exist yet, which is what we want when rejecting a request up front.
fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                Some(Component::ParentDir) | None => parts.push(component),
                _ => {
                    parts.pop();
                }
            },
            _ => parts.push(component),
        }
    }

    let mut out = PathBuf::new();
    for part in &parts {
        out.push(part.as_os_str());
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Resolve a requested file name against an allowed root directory.
///
/// The request may be a bare name or a relative path; it must land inside
/// `root` after both lexical normalization and, when the file exists,
/// symlink resolution. Anything else is rejected with a reason. Absolute
/// requests are only accepted if they already point inside the root.
pub fn resolve_within(root: &Path, requested: &str) -> Result<PathBuf, String> {
    let requested_path = Path::new(requested);
    let joined = if requested_path.is_absolute() {
        requested_path.to_path_buf()
    } else {
        root.join(requested_path)
    };

    let root_normalized = normalize_path(root);
    let joined_normalized = normalize_path(&joined);

    if !joined_normalized.starts_with(&root_normalized) {
        return Err(format!(
            "'{}' resolves outside the allowed directory '{}'",
            requested,
            root.display()
        ));
    }

    // A symlink inside the root can still point out of it; compare the
    // canonical forms when the target exists.
    if let Ok(canonical) = std::fs::canonicalize(&joined_normalized) {
        let canonical_root =
            std::fs::canonicalize(&root_normalized).unwrap_or_else(|_| root_normalized.clone());
        if !canonical.starts_with(&canonical_root) {
            return Err(format!(
                "'{}' is a link that escapes the allowed directory '{}'",
                requested,
                root.display()
            ));
        }
        return Ok(canonical);
    }

    Ok(joined_normalized)
}
