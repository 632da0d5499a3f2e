//! Archive entry naming: extension resolution, sanitization, and collision suffixes.

use std::collections::HashSet;
use std::path::{Component, Path};

use crate::api::FileDescriptor;

/// Resolves the archive entry name for a descriptor.
///
/// The extension is appended only when the display name does not already end
/// with it (case-insensitive), then the result is sanitized.
#[must_use]
pub fn resolve_entry_name(descriptor: &FileDescriptor) -> String {
    let name = descriptor.display_name.as_str();
    let extension = descriptor
        .extension
        .as_deref()
        .map(|ext| ext.trim_start_matches('.'))
        .unwrap_or_default();

    if extension.is_empty() || has_extension(name, extension) {
        sanitize_filename(name)
    } else {
        sanitize_filename(&format!("{name}.{extension}"))
    }
}

fn has_extension(name: &str, extension: &str) -> bool {
    let suffix = format!(".{}", extension.to_lowercase());
    name.to_lowercase().ends_with(&suffix)
}

/// Sanitizes a name for use as a single archive entry.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Picks a name not yet present in `taken`, suffixing duplicates.
///
/// Example with `suffix_start = 2`: `file.pdf`, then `file_2.pdf`, `file_3.pdf`, ...
pub(crate) fn unique_entry_name(taken: &HashSet<String>, name: &str, suffix_start: usize) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    };

    (suffix_start..)
        .map(|i| format!("{stem}_{i}{ext}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}
