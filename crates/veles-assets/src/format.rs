//! Format revision gates.
//!
//! Every optional or width-changing field in the container is keyed on the
//! format number stored in the header. Each predicate here names one branch.

use std::fmt;

/// Highest format revision whose header uses 32-bit size fields.
pub const MAX_SUPPORTED_FORMAT: u32 = 21;

/// Serialized file format revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FormatVersion(pub u32);

impl FormatVersion {
    /// Raw format number.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this reader can lay out the revision.
    #[inline]
    pub const fn is_supported(self) -> bool {
        self.0 <= MAX_SUPPORTED_FORMAT
    }

    /// A u32 probe after the fixed header selects the header byte order.
    #[inline]
    pub const fn has_endian_probe(self) -> bool {
        self.0 >= 9
    }

    /// Type trees use the flat node array plus string buffer encoding.
    #[inline]
    pub const fn has_flat_type_trees(self) -> bool {
        self.0 == 10 || self.0 >= 12
    }

    /// Flat type tree nodes carry a trailing 64-bit reference type hash.
    #[inline]
    pub const fn has_ref_type_hash(self) -> bool {
        self.0 >= 19
    }

    /// Size of one flat type tree node record.
    #[inline]
    pub const fn type_tree_node_size(self) -> usize {
        if self.has_ref_type_hash() {
            32
        } else {
            24
        }
    }

    /// Type metadata starts with a has-type-trees flag and stores hashes.
    #[inline]
    pub const fn has_type_hashes(self) -> bool {
        self.0 >= 13
    }

    /// Type entries carry a script type index.
    #[inline]
    pub const fn has_script_type_index(self) -> bool {
        self.0 >= 17
    }

    /// Each type tree is followed by a dependency list.
    #[inline]
    pub const fn has_type_dependencies(self) -> bool {
        self.0 >= 21
    }

    /// Scripted types (32-byte hash) are those with a negative class ID
    /// before format 16 and class 114 (MonoBehaviour) from format 16 on.
    #[inline]
    pub const fn has_script_hash(self, class_id: i32) -> bool {
        if self.0 < 16 {
            class_id < 0
        } else {
            class_id == 114
        }
    }

    /// A u32 flag selects 64-bit object identifiers.
    #[inline]
    pub const fn has_long_object_ids_flag(self) -> bool {
        self.0 >= 7 && self.0 < 14
    }

    /// Object identifiers are always 64-bit and 4-byte aligned.
    #[inline]
    pub const fn has_aligned_path_ids(self) -> bool {
        self.0 >= 14
    }

    /// Object entries store an inline 16-bit class ID.
    #[inline]
    pub const fn has_inline_class_id(self) -> bool {
        self.0 < 16
    }

    /// Object entries store a 16-bit destroyed flag.
    #[inline]
    pub const fn has_destroyed_flag(self) -> bool {
        self.0 < 16
    }

    /// Object entries store a one-byte stripped marker.
    #[inline]
    pub const fn has_stripped_byte(self) -> bool {
        self.0 == 15 || self.0 == 16
    }

    /// A script type table follows the object table.
    #[inline]
    pub const fn has_script_types(self) -> bool {
        self.0 >= 11
    }

    /// An external reference table follows.
    #[inline]
    pub const fn has_externals(self) -> bool {
        self.0 >= 6
    }

    /// External reference records carry a GUID and reference type.
    #[inline]
    pub const fn has_external_guid(self) -> bool {
        self.0 >= 5
    }
}

impl From<u32> for FormatVersion {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
