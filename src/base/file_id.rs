//! Workspace-local identifiers for files, projects and archives.

use std::fmt;

macro_rules! workspace_id {
    ($(#[$meta:meta])* $name:ident, $display:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(pub u32);

        impl $name {
            /// Create an id from a raw index.
            #[inline]
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// Get the raw index.
            #[inline]
            pub const fn index(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($display, "#{}"), self.0)
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(id: u32) -> Self {
                Self(id)
            }
        }
    };
}

workspace_id!(
    /// A source file inside some project.
    ///
    /// Ids are never reused within a workspace: deleting a file and creating
    /// it again yields a new id, so stale handles cannot alias fresh files.
    FileId,
    "file"
);

workspace_id!(
    /// A Java project in the workspace.
    ProjectId,
    "project"
);

workspace_id!(
    /// A registered archive (compiled library) shared by any number of projects.
    ArchiveId,
    "archive"
);

/// Hands out fresh ids of all three kinds.
#[derive(Clone, Debug, Default)]
pub struct IdAllocator {
    next_file: u32,
    next_project: u32,
    next_archive: u32,
}

impl IdAllocator {
    pub fn file(&mut self) -> FileId {
        let id = FileId::new(self.next_file);
        self.next_file += 1;
        id
    }

    pub fn project(&mut self) -> ProjectId {
        let id = ProjectId::new(self.next_project);
        self.next_project += 1;
        id
    }

    pub fn archive(&mut self) -> ArchiveId {
        let id = ArchiveId::new(self.next_archive);
        self.next_archive += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_never_reuses_ids() {
        let mut ids = IdAllocator::default();
        let a = ids.file();
        let b = ids.file();
        assert_ne!(a, b);
        assert_eq!(ids.project(), ProjectId::new(0));
        assert_eq!(ids.project(), ProjectId::new(1));
        assert_eq!(ids.archive(), ArchiveId::new(0));
    }

    #[test]
    fn test_id_formatting() {
        assert_eq!(format!("{:?}", FileId::new(3)), "FileId(3)");
        assert_eq!(format!("{}", ProjectId::new(7)), "project#7");
    }

    #[test]
    fn test_id_size() {
        assert_eq!(std::mem::size_of::<FileId>(), 4);
        assert_eq!(std::mem::size_of::<ArchiveId>(), 4);
    }
}
