use prost_types::{FileDescriptorProto, FileDescriptorSet};
use std::collections::HashMap;

/// Decoded file descriptors keyed by file name.
///
/// Files are kept in insertion order. The resolver inserts a file only after its dependencies,
/// so for acyclic graphs that order is dependency-first.
#[derive(Debug, Clone, Default)]
pub struct FragmentRegistry {
    files: Vec<FileDescriptorProto>,
    index: HashMap<String, usize>,
}

impl FragmentRegistry {
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FileDescriptorProto> {
        self.index.get(name).map(|&i| &self.files[i])
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name())
    }

    /// Inserts `file` under its own name unless that name is already taken.
    ///
    /// Returns whether the file was inserted.
    pub(crate) fn insert(&mut self, file: FileDescriptorProto) -> bool {
        if self.contains(file.name()) {
            return false;
        }

        self.index.insert(file.name().to_string(), self.files.len());
        self.files.push(file);
        true
    }

    /// Finds the first `(file, dependency)` pair whose dependency is not registered.
    pub fn unresolved_dependency(&self) -> Option<(&str, &str)> {
        self.files.iter().find_map(|file| {
            file.dependency
                .iter()
                .find(|dep| !self.contains(dep))
                .map(|dep| (file.name(), dep.as_str()))
        })
    }

    pub fn into_file_descriptor_set(self) -> FileDescriptorSet {
        FileDescriptorSet { file: self.files }
    }
}
