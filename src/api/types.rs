//! File metadata types returned by the workspace API.

use serde::{Deserialize, Serialize};

/// Metadata identifying one remote file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Opaque file id used to build the download URL.
    #[serde(rename = "uid")]
    pub id: String,
    /// Human-readable name as shown in the workspace.
    #[serde(rename = "name")]
    pub display_name: String,
    /// File extension without a leading dot, when known.
    #[serde(default)]
    pub extension: Option<String>,
}

impl FileDescriptor {
    /// Creates a descriptor.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        extension: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            extension: extension.map(str::to_string),
        }
    }
}

/// Project (and optional folder) whose files are listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileScope {
    pub project_id: String,
    pub folder_id: Option<String>,
}

impl FileScope {
    /// Scope covering every file in a project.
    pub fn project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            folder_id: None,
        }
    }

    /// Narrows the scope to a single folder.
    #[must_use]
    pub fn with_folder(mut self, folder_id: Option<String>) -> Self {
        self.folder_id = folder_id;
        self
    }
}

/// Ordered file listing for a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileListing {
    pub files: Vec<FileDescriptor>,
    /// Total count reported by the server, if any.
    pub total: Option<u64>,
}

impl FileListing {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_descriptor_deserializes_api_field_names() {
        let json = r#"{"uid":"f1","name":"Budget","extension":"xlsx"}"#;
        let descriptor: FileDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor, FileDescriptor::new("f1", "Budget", Some("xlsx")));
    }

    #[test]
    fn test_file_descriptor_extension_optional() {
        let json = r#"{"uid":"f2","name":"README"}"#;
        let descriptor: FileDescriptor = serde_json::from_str(json).unwrap();
        assert!(descriptor.extension.is_none());

        let json = r#"{"uid":"f3","name":"README","extension":null}"#;
        let descriptor: FileDescriptor = serde_json::from_str(json).unwrap();
        assert!(descriptor.extension.is_none());
    }

    #[test]
    fn test_file_scope_with_folder() {
        let scope = FileScope::project("p1").with_folder(Some("f9".to_string()));
        assert_eq!(scope.project_id, "p1");
        assert_eq!(scope.folder_id.as_deref(), Some("f9"));
    }
}
