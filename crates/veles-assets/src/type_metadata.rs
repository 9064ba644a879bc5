//! Declared type catalogue of one assets file.

use veles_common::EndianReader;

use crate::type_tree::TypeTreeNode;
use crate::{read_count, FormatVersion, FxHashMap, Result};

/// Class and script identifiers of one declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClassInfo {
    pub class_id: i32,
    /// Script type index for scripted types, derived as `-1 - index`.
    /// Equal to `class_id` before format 17.
    pub script_id: i32,
}

/// Content hash stored for a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TypeHash {
    /// Hash of the type layout.
    Type([u8; 16]),
    /// Scripted type: script hash followed by type layout hash.
    Script { script: [u8; 16], type_hash: [u8; 16] },
}

impl TypeHash {
    /// The layout hash, present for every declared type.
    pub fn type_hash(&self) -> &[u8; 16] {
        match self {
            Self::Type(hash) | Self::Script { type_hash: hash, .. } => hash,
        }
    }

    /// Raw on-disk byte length.
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Type(_) => 16,
            Self::Script { .. } => 32,
        }
    }
}

/// Types declared by an assets file.
#[derive(Debug, Clone, Default)]
pub struct TypeMetaData {
    has_type_trees: bool,
    classes: Vec<ClassInfo>,
    hashes: FxHashMap<i32, TypeHash>,
    type_trees: FxHashMap<i32, TypeTreeNode>,
}

impl TypeMetaData {
    /// Parse the type table starting at the reader's position.
    pub fn read(format: FormatVersion, reader: &mut EndianReader<'_>) -> Result<Self> {
        let mut meta = Self::default();

        if format.has_type_hashes() {
            meta.has_type_trees = reader.read_bool()?;
            let type_count = read_count(reader, "type")?;
            meta.classes.reserve(type_count.min(4096));

            for _ in 0..type_count {
                let class_id = reader.read_i32()?;
                let script_id = if format.has_script_type_index() {
                    let _stripped = reader.read_u8()?;
                    -1 - reader.read_i16()? as i32
                } else {
                    class_id
                };
                meta.classes.push(ClassInfo {
                    class_id,
                    script_id,
                });

                let hash = if format.has_script_hash(class_id) {
                    TypeHash::Script {
                        script: reader.read_array()?,
                        type_hash: reader.read_array()?,
                    }
                } else {
                    TypeHash::Type(reader.read_array()?)
                };
                meta.hashes.insert(class_id, hash);

                if meta.has_type_trees {
                    let tree = TypeTreeNode::read(format, reader)?;
                    meta.type_trees.insert(class_id, tree);

                    if format.has_type_dependencies() {
                        let dependency_count = read_count(reader, "type dependency")?;
                        reader.read_bytes(dependency_count * 4)?;
                    }
                }
            }
        } else {
            meta.has_type_trees = true;
            let field_count = read_count(reader, "type")?;
            for _ in 0..field_count {
                let class_id = reader.read_i32()?;
                let tree = TypeTreeNode::read(format, reader)?;
                meta.type_trees.insert(class_id, tree);
            }
        }

        Ok(meta)
    }

    /// Whether type trees were embedded in the file.
    pub fn has_type_trees(&self) -> bool {
        self.has_type_trees
    }

    /// Declared types in table order. Object entries index into this list
    /// by type ID from format 16 on.
    pub fn classes(&self) -> &[ClassInfo] {
        &self.classes
    }

    /// Class info for a type index.
    pub fn class_for_type(&self, type_id: i32) -> Option<&ClassInfo> {
        usize::try_from(type_id).ok().and_then(|i| self.classes.get(i))
    }

    /// Content hash for a class. Later declarations shadow earlier ones.
    pub fn hash(&self, class_id: i32) -> Option<&TypeHash> {
        self.hashes.get(&class_id)
    }

    /// Type tree for a class, if trees were embedded.
    pub fn type_tree(&self, class_id: i32) -> Option<&TypeTreeNode> {
        self.type_trees.get(&class_id)
    }

    /// All embedded type trees keyed by class ID.
    pub fn type_trees(&self) -> impl Iterator<Item = (i32, &TypeTreeNode)> + '_ {
        self.type_trees.iter().map(|(id, tree)| (*id, tree))
    }
}
