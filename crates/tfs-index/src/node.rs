use serde::{Deserialize, Serialize};
use tfs_types::{FileKind, Timestamp};

/// One entry of a snapshot: a directory with children, or a leaf file.
///
/// Every node carries its path relative to the snapshot root
/// (slash-separated, empty for the root itself).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DirectoryNode {
    Directory(DirEntry),
    File(FileEntry),
}

/// A directory and its children, sorted by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub modified: Timestamp,
    pub children: Vec<DirectoryNode>,
    /// `true` when a depth bound stopped the walk above a non-empty
    /// directory, so `children` is incomplete.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

/// A leaf entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub modified: Timestamp,
    pub kind: FileKind,
    /// The entry is a symbolic link; `size` is that of the link itself.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub symlink: bool,
}

impl DirectoryNode {
    pub fn name(&self) -> &str {
        match self {
            Self::Directory(d) => &d.name,
            Self::File(f) => &f.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Directory(d) => &d.path,
            Self::File(f) => &f.path,
        }
    }

    pub fn modified(&self) -> Timestamp {
        match self {
            Self::Directory(d) => d.modified,
            Self::File(f) => f.modified,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    /// Children of a directory; empty for files.
    pub fn children(&self) -> &[DirectoryNode] {
        match self {
            Self::Directory(d) => &d.children,
            Self::File(_) => &[],
        }
    }

    /// Look up a descendant by path relative to this node.
    pub fn find(&self, relative: &str) -> Option<&DirectoryNode> {
        let mut node = self;
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            node = node.children().iter().find(|c| c.name() == segment)?;
        }
        Some(node)
    }

    /// Sum of file sizes in this subtree.
    pub fn total_size(&self) -> u64 {
        match self {
            Self::File(f) => f.size,
            Self::Directory(d) => d.children.iter().map(Self::total_size).sum(),
        }
    }

    /// Number of files in this subtree.
    pub fn file_count(&self) -> usize {
        self.files().len()
    }

    /// All files in this subtree, in walk order.
    pub fn files(&self) -> Vec<&FileEntry> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::File(f) => out.push(f),
                // Reversed so that popping visits children in name order.
                Self::Directory(d) => stack.extend(d.children.iter().rev()),
            }
        }
        out
    }
}
