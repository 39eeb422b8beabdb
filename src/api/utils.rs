use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::types::attachment::Attachment;
use crate::errors::{ChatError, ChatResult};

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?:^|\s)@(\S+)").expect("valid file reference pattern"))
}

/// Paths referenced as `@path` in a prompt, in order of appearance.
pub fn find_file_references(prompt: &str) -> Vec<&str> {
    reference_pattern()
        .captures_iter(prompt)
        .filter_map(|captures| captures.get(1))
        .map(|path| path.as_str())
        .collect()
}

/// MIME type for a file, judged by its extension.
pub fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("py") => "text/x-python",
        Some("js") => "text/javascript",
        Some("ts") => "text/typescript",
        Some("jsx") => "text/jsx",
        Some("tsx") => "text/tsx",
        Some("json") => "application/json",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("xml") => "text/xml",
        Some("yaml") | Some("yml") => "text/yaml",
        Some("sh") => "text/x-shellscript",
        Some("bat") => "text/x-batch",
        Some("rs") => "text/x-rust",
        Some("toml") => "application/toml",
        _ => "text/plain",
    }
}

fn resolve_path(reference: &str, cwd: &Path) -> Option<PathBuf> {
    let path = Path::new(reference);
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    resolved.is_file().then_some(resolved)
}

/// Turn every `@path` in `prompt` into an attachment.
///
/// Relative paths resolve against `cwd`. Fails before anything is sent if
/// any reference cannot be read as UTF-8 text.
pub fn attachments_from_prompt(prompt: &str, cwd: &Path) -> ChatResult<Vec<Attachment>> {
    let mut attachments = Vec::new();
    let mut missing = Vec::new();

    for reference in find_file_references(prompt) {
        let Some(path) = resolve_path(reference, cwd) else {
            missing.push(reference.to_string());
            continue;
        };

        match fs::read_to_string(&path) {
            Ok(content) => {
                attachments.push(Attachment::user_file(reference, mime_type(&path), content));
            }
            Err(e) => {
                tracing::warn!("could not read {}: {}", path.display(), e);
                missing.push(reference.to_string());
            }
        }
    }

    if !missing.is_empty() {
        return Err(ChatError::FilesNotFound(missing));
    }
    Ok(attachments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_find_file_references() {
        assert_eq!(
            find_file_references("@notes.md compare with @src/main.rs please"),
            vec!["notes.md", "src/main.rs"]
        );
        assert!(find_file_references("mail me at user@example.com").is_empty());
        assert!(find_file_references("no references").is_empty());
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type(Path::new("a.py")), "text/x-python");
        assert_eq!(mime_type(Path::new("A.JSON")), "application/json");
        assert_eq!(mime_type(Path::new("config.yml")), "text/yaml");
        assert_eq!(mime_type(Path::new("Makefile")), "text/plain");
        assert_eq!(mime_type(Path::new("x.unknownext")), "text/plain");
    }

    #[test]
    fn test_attachments_from_prompt() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("src"))?;
        fs::write(dir.path().join("src/lib.rs"), "pub fn it() {}\n")?;
        let absolute = dir.path().join("notes.md");
        fs::write(&absolute, "# Notes")?;

        let prompt = format!("review @src/lib.rs against @{}", absolute.display());
        let attachments = attachments_from_prompt(&prompt, dir.path())?;

        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].file_name, "src/lib.rs");
        assert_eq!(attachments[0].file_type, "text/x-rust");
        assert_eq!(attachments[0].file_size, 15);
        assert_eq!(attachments[0].extracted_content, "pub fn it() {}\n");
        assert_eq!(attachments[0].origin, "user_upload");
        assert_eq!(attachments[0].kind, "file");
        assert_eq!(attachments[1].file_type, "text/markdown");
        Ok(())
    }

    #[test]
    fn test_missing_files_are_all_reported() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("present.txt"), "here")?;

        let err = attachments_from_prompt("@present.txt @gone.txt @also/gone.rs", dir.path())
            .unwrap_err();
        match err {
            ChatError::FilesNotFound(paths) => {
                assert_eq!(paths, vec!["gone.txt", "also/gone.rs"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn test_binary_file_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("image.png"), [0x89, 0x50, 0xff, 0xfe])?;
        assert!(attachments_from_prompt("@image.png", dir.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_prompt_without_references() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(attachments_from_prompt("just text", dir.path())?.is_empty());
        Ok(())
    }
}
