//! Remote state of one solution file

/// A solution file as it currently exists in the remote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Repository-relative path
    pub path: String,
    /// Decoded file bytes
    pub content: Vec<u8>,
    /// Blob revision; absent for a file that does not exist yet
    pub revision: Option<String>,
}

impl RemoteFile {
    /// Whether the remote bytes already equal `content`.
    pub fn has_content(&self, content: &[u8]) -> bool {
        self.content == content
    }
}
