// src/utils.rs
use anyhow::{Context, Result};
use std::path::Path;

/// Join list fields into one cell for flat exports
pub fn join_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Truncate to at most `max_chars` characters, marking the cut with an ellipsis
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Ensure the directory that will hold `path` exists
pub async fn ensure_parent_directory(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_list_skips_blank_items() {
        let items = vec![
            "Rust".to_string(),
            "  ".to_string(),
            " SQL ".to_string(),
        ];
        assert_eq!(join_list(&items), "Rust; SQL");
        assert_eq!(join_list(&[]), "");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("héllo wörld", 6), "héllo…");
        assert_eq!(truncate_chars("héllo wörld", 6).chars().count(), 6);
    }

    #[tokio::test]
    async fn test_ensure_parent_directory_accepts_bare_file_name() {
        assert!(ensure_parent_directory(Path::new("export.csv")).await.is_ok());
    }
}
