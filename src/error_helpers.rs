//! Error helper functions for creating actionable error messages

use anyhow::Context;
use std::fs;
use std::io;
use std::path::Path;

/// Check if an IO error is a permission denied error
pub fn is_permission_denied(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}

/// Check if an IO error is a "not found" error
pub fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

/// Create an enhanced error message for file permission issues
pub fn permission_error(path: &Path, operation: &str) -> String {
    format!(
        "Permission denied when {} '{}'\n\n\
         Possible fixes:\n\
         1. Check file permissions: ls -l '{}'\n\
         2. Ensure write access with: chmod u+w '{}'\n\
         3. For backup failures: pass --backup-dir to use another location",
        operation,
        path.display(),
        path.display(),
        path.display()
    )
}

/// Create an enhanced error message for file not found issues
pub fn not_found_error(path: &Path, context: &str) -> String {
    format!(
        "File not found: '{}'\n\n\
         Context: {}\n\n\
         Possible fixes:\n\
         1. Run excise from the project root, or pass the file explicitly\n\
         2. Set [target] file in ~/.excise/config.toml\n\
         3. Use an absolute path if the relative path is ambiguous",
        path.display(),
        context,
    )
}

/// Create an enhanced error message for files that are not valid UTF-8
pub fn encoding_error(path: &Path) -> String {
    format!(
        "File is not valid UTF-8: '{}'\n\n\
         excise only rewrites text files. Convert the file first, e.g.:\n\
         iconv -f LATIN1 -t UTF-8 '{}' -o '{}.utf8'",
        path.display(),
        path.display(),
        path.display()
    )
}

/// Read a whole file as UTF-8, turning the common failures into the
/// messages above.
pub fn read_text(path: &Path, context: &str) -> anyhow::Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if is_not_found(&e) => Err(anyhow::anyhow!(not_found_error(path, context))),
        Err(e) if is_permission_denied(&e) => {
            Err(anyhow::anyhow!(permission_error(path, "reading")))
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            Err(anyhow::anyhow!(encoding_error(path)))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read file: {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_is_permission_denied() {
        let perm_err = io::Error::new(ErrorKind::PermissionDenied, "access denied");
        assert!(is_permission_denied(&perm_err));

        let not_found_err = io::Error::new(ErrorKind::NotFound, "not found");
        assert!(!is_permission_denied(&not_found_err));
    }

    #[test]
    fn test_is_not_found() {
        let not_found_err = io::Error::new(ErrorKind::NotFound, "not found");
        assert!(is_not_found(&not_found_err));

        let perm_err = io::Error::new(ErrorKind::PermissionDenied, "access denied");
        assert!(!is_not_found(&perm_err));
    }

    #[test]
    fn test_permission_error_formatting() {
        let path = Path::new("/tmp/screen.tsx");
        let msg = permission_error(path, "writing");
        assert!(msg.contains("Permission denied"));
        assert!(msg.contains("writing"));
        assert!(msg.contains("/tmp/screen.tsx"));
        assert!(msg.contains("Possible fixes"));
    }

    #[test]
    fn test_read_text_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.tsx");

        let err = read_text(&path, "loading target").unwrap_err().to_string();
        assert!(err.contains("File not found"));
        assert!(err.contains("loading target"));
    }

    #[test]
    fn test_read_text_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("latin1.tsx");
        fs::write(&path, [0x63, 0xf3, 0x64, 0x69, 0x67, 0x6f]).unwrap();

        let err = read_text(&path, "loading target").unwrap_err().to_string();
        assert!(err.contains("not valid UTF-8"));
    }
}
