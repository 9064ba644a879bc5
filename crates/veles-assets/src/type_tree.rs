//! Type tree decoding.
//!
//! A type tree describes the field layout of one serialized type. Two wire
//! encodings exist:
//!
//! - **Flat** (format 10 and 12+): a node count and string buffer size, then
//!   fixed-size node records tagged with their depth, then the string buffer.
//! - **Recursive** (older formats): each node inline, followed by its
//!   children.
//!
//! Both decode into the same [`TypeTreeNode`] shape.

use std::fmt::Write as _;

use veles_common::EndianReader;
use zerocopy::byteorder::little_endian::{I16, I32, U16};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::strings::common_string;
use crate::{read_count, Error, FormatVersion, Result};

/// Metadata flag marking a field whose value is followed by 4-byte alignment.
pub const ALIGN_BYTES_FLAG: i32 = 0x4000;

/// One node of a type tree. The root node is the type itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TypeTreeNode {
    pub version: i32,
    pub is_array: bool,
    pub size: i32,
    pub index: i32,
    pub flags: i32,
    pub type_name: String,
    pub name: String,
    /// Only present in flat trees from format 19 on.
    pub ref_type_hash: Option<u64>,
    pub children: Vec<TypeTreeNode>,
}

/// A flat node record as stored on disk, minus the optional trailing hash.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
struct NodeRecord {
    version: I16,
    depth: u8,
    is_array: u8,
    type_offset: U16,
    type_is_common: U16,
    name_offset: U16,
    name_is_common: U16,
    size: I32,
    index: I32,
    flags: I32,
}

impl TypeTreeNode {
    /// Decode one type tree using the encoding `format` selects.
    pub fn read(format: FormatVersion, reader: &mut EndianReader<'_>) -> Result<Self> {
        if format.has_flat_type_trees() {
            Self::read_flat(format, reader)
        } else {
            Self::read_recursive(reader)
        }
    }

    /// Decode a flat (depth-tagged) type tree.
    pub fn read_flat(format: FormatVersion, reader: &mut EndianReader<'_>) -> Result<Self> {
        let node_count = read_count(reader, "type tree node")?;
        let string_buffer_size = read_count(reader, "type tree string buffer")?;

        let node_size = format.type_tree_node_size();
        let strings_start = reader.position().saturating_add(node_size.saturating_mul(node_count));
        let strings = reader.peek_bytes_at(strings_start, string_buffer_size)?;

        let mut stack: Vec<TypeTreeNode> = vec![TypeTreeNode::default()];

        for _ in 0..node_count {
            let record: NodeRecord = reader.read_struct()?;
            let ref_type_hash = if format.has_ref_type_hash() {
                Some(reader.read_u64()?)
            } else {
                None
            };

            let node = TypeTreeNode {
                version: record.version.get() as i32,
                is_array: record.is_array != 0,
                size: record.size.get(),
                index: record.index.get(),
                flags: record.flags.get(),
                type_name: resolve_string(
                    strings,
                    record.type_offset.get(),
                    record.type_is_common.get(),
                )?,
                name: resolve_string(strings, record.name_offset.get(), record.name_is_common.get())?,
                ref_type_hash,
                children: Vec::new(),
            };

            let depth = record.depth as usize;
            if depth == 0 {
                collapse_to(&mut stack, 1);
                let children = std::mem::take(&mut stack[0].children);
                stack[0] = TypeTreeNode { children, ..node };
            } else {
                collapse_to(&mut stack, depth);
                stack.push(node);
            }
        }

        reader.advance(string_buffer_size);

        collapse_to(&mut stack, 1);
        Ok(stack.pop().unwrap_or_default())
    }

    /// Decode a recursive (node-by-node) type tree.
    pub fn read_recursive(reader: &mut EndianReader<'_>) -> Result<Self> {
        let type_name = reader.read_cstring()?.to_owned();
        let name = reader.read_cstring()?.to_owned();
        let size = reader.read_i32()?;
        let index = reader.read_i32()?;
        let is_array = reader.read_bool()?;
        let version = reader.read_i32()?;
        let flags = reader.read_i32()?;

        let child_count = read_count(reader, "type tree child")?;
        let mut children = Vec::with_capacity(child_count.min(1024));
        for _ in 0..child_count {
            children.push(Self::read_recursive(reader)?);
        }

        Ok(Self {
            version,
            is_array,
            size,
            index,
            flags,
            type_name,
            name,
            ref_type_hash: None,
            children,
        })
    }

    /// Whether the serialized value is followed by 4-byte alignment.
    #[inline]
    pub fn requires_align(&self) -> bool {
        self.flags & ALIGN_BYTES_FLAG != 0
    }

    /// Find a direct child by field name.
    pub fn child(&self, name: &str) -> Option<&TypeTreeNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Depth-first, pre-order walk yielding each node with its depth.
    pub fn iter(&self) -> TypeTreeIter<'_> {
        TypeTreeIter {
            stack: vec![(0, self)],
        }
    }

    /// Total number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Indented text dump, one `type name // size` line per node.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (depth, node) in self.iter() {
            let _ = writeln!(
                out,
                "{:indent$}{} {} // size {}{}",
                "",
                node.type_name,
                node.name,
                node.size,
                if node.requires_align() { ", aligned" } else { "" },
                indent = depth * 2
            );
        }
        out
    }
}

/// Iterator returned by [`TypeTreeNode::iter`].
#[derive(Debug)]
pub struct TypeTreeIter<'a> {
    stack: Vec<(usize, &'a TypeTreeNode)>,
}

impl<'a> Iterator for TypeTreeIter<'a> {
    type Item = (usize, &'a TypeTreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

/// Pop ancestors until `len` remain, attaching each popped node to its parent.
fn collapse_to(stack: &mut Vec<TypeTreeNode>, len: usize) {
    while stack.len() > len.max(1) {
        if let Some(node) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
            }
        }
    }
}

fn resolve_string(strings: &[u8], offset: u16, is_common: u16) -> Result<String> {
    if is_common != 0 {
        return Ok(common_string(offset)
            .map(str::to_owned)
            .unwrap_or_else(|| offset.to_string()));
    }

    let tail = strings
        .get(offset as usize..)
        .filter(|tail| !tail.is_empty())
        .ok_or(Error::StringOffsetOutOfBounds {
            offset,
            size: strings.len(),
        })?;
    let end = memchr::memchr(0, tail).unwrap_or(tail.len());
    Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use veles_common::EndianWriter;

    use super::*;

    /// Field description used to synthesise both encodings in tests.
    pub(crate) struct Field {
        pub type_name: &'static str,
        pub name: &'static str,
        pub size: i32,
        pub flags: i32,
        pub children: Vec<Field>,
    }

    pub(crate) fn field(type_name: &'static str, name: &'static str, size: i32) -> Field {
        Field {
            type_name,
            name,
            size,
            flags: 0,
            children: Vec::new(),
        }
    }

    pub(crate) fn sample_tree() -> Field {
        Field {
            type_name: "MyBehaviour",
            name: "Base",
            size: -1,
            flags: 0,
            children: vec![
                field("int", "m_Health", 4),
                Field {
                    type_name: "Vector3f",
                    name: "m_Offset",
                    size: 12,
                    flags: 0,
                    children: vec![
                        field("float", "x", 4),
                        field("float", "y", 4),
                        field("float", "z", 4),
                    ],
                },
                Field {
                    flags: ALIGN_BYTES_FLAG,
                    ..field("bool", "m_Enabled", 1)
                },
            ],
        }
    }

    fn flatten<'f>(field: &'f Field, depth: u8, out: &mut Vec<(u8, &'f Field)>) {
        out.push((depth, field));
        for child in &field.children {
            flatten(child, depth + 1, out);
        }
    }

    /// Encode `root` in the flat layout. Names found in the builtin table are
    /// written as common references, everything else goes to the local buffer.
    pub(crate) fn write_flat(root: &Field, format: FormatVersion, w: &mut EndianWriter<Cursor<Vec<u8>>>) {
        let mut nodes = Vec::new();
        flatten(root, 0, &mut nodes);

        let mut local = Vec::<u8>::new();
        let mut string_ref = |s: &str| -> (u16, u16) {
            if let Some(&(offset, _)) = crate::strings::COMMON_STRINGS.iter().find(|(_, v)| *v == s) {
                return (offset, 1);
            }
            let offset = local.len() as u16;
            local.extend_from_slice(s.as_bytes());
            local.push(0);
            (offset, 0)
        };

        let mut records = Vec::new();
        for (i, (depth, node)) in nodes.iter().enumerate() {
            let (type_offset, type_common) = string_ref(node.type_name);
            let (name_offset, name_common) = string_ref(node.name);
            records.push((i, *depth, type_offset, type_common, name_offset, name_common));
        }

        w.write_i32(nodes.len() as i32).unwrap();
        w.write_i32(local.len() as i32).unwrap();
        for (i, depth, type_offset, type_common, name_offset, name_common) in records {
            let node = nodes[i].1;
            w.write_i16(1).unwrap();
            w.write_u8(depth).unwrap();
            w.write_bool(false).unwrap();
            w.write_u16(type_offset).unwrap();
            w.write_u16(type_common).unwrap();
            w.write_u16(name_offset).unwrap();
            w.write_u16(name_common).unwrap();
            w.write_i32(node.size).unwrap();
            w.write_i32(i as i32).unwrap();
            w.write_i32(node.flags).unwrap();
            if format.has_ref_type_hash() {
                w.write_u64(0xDEAD_BEEF_0000_0000 | i as u64).unwrap();
            }
        }
        w.write_bytes(&local).unwrap();
    }

    pub(crate) fn write_recursive(field: &Field, index: &mut i32, w: &mut EndianWriter<Cursor<Vec<u8>>>) {
        w.write_cstring(field.type_name).unwrap();
        w.write_cstring(field.name).unwrap();
        w.write_i32(field.size).unwrap();
        w.write_i32(*index).unwrap();
        w.write_bool(false).unwrap();
        w.write_i32(1).unwrap();
        w.write_i32(field.flags).unwrap();
        w.write_i32(field.children.len() as i32).unwrap();
        *index += 1;
        for child in &field.children {
            write_recursive(child, index, w);
        }
    }

    fn encode_flat(format: u32) -> Vec<u8> {
        let mut w = EndianWriter::new(Cursor::new(Vec::new()));
        write_flat(&sample_tree(), FormatVersion(format), &mut w);
        w.write_u32(0xCAFEBABE).unwrap();
        w.into_inner().into_inner()
    }

    fn encode_recursive() -> Vec<u8> {
        let mut w = EndianWriter::new(Cursor::new(Vec::new()));
        write_recursive(&sample_tree(), &mut 0, &mut w);
        w.write_u32(0xCAFEBABE).unwrap();
        w.into_inner().into_inner()
    }

    #[test]
    fn test_flat_tree_shape() {
        let bytes = encode_flat(17);
        let mut reader = EndianReader::new(&bytes);
        let root = TypeTreeNode::read(FormatVersion(17), &mut reader).unwrap();

        assert_eq!(root.type_name, "MyBehaviour");
        assert_eq!(root.name, "Base");
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[0].type_name, "int");
        assert_eq!(root.children[0].name, "m_Health");
        assert_eq!(root.children[1].children.len(), 3);
        assert_eq!(root.children[1].children[2].name, "z");
        assert!(root.children[2].requires_align());
        assert_eq!(root.ref_type_hash, None);

        // Cursor lands right after the string buffer.
        assert_eq!(reader.read_u32().unwrap(), 0xCAFEBABE);
    }

    #[test]
    fn test_flat_tree_reads_ref_type_hash() {
        let bytes = encode_flat(19);
        let mut reader = EndianReader::new(&bytes);
        let root = TypeTreeNode::read(FormatVersion(19), &mut reader).unwrap();

        assert_eq!(root.ref_type_hash, Some(0xDEAD_BEEF_0000_0000));
        assert_eq!(root.children[1].ref_type_hash, Some(0xDEAD_BEEF_0000_0002));
        assert_eq!(reader.read_u32().unwrap(), 0xCAFEBABE);
    }

    #[test]
    fn test_recursive_tree_shape() {
        let bytes = encode_recursive();
        let mut reader = EndianReader::new(&bytes);
        let root = TypeTreeNode::read(FormatVersion(9), &mut reader).unwrap();

        assert_eq!(root.node_count(), 7);
        assert_eq!(root.child("m_Offset").map(|n| n.size), Some(12));
        assert_eq!(reader.read_u32().unwrap(), 0xCAFEBABE);
    }

    #[test]
    fn test_encodings_decode_to_same_tree() {
        let flat_bytes = encode_flat(15);
        let recursive_bytes = encode_recursive();

        let flat = TypeTreeNode::read(FormatVersion(15), &mut EndianReader::new(&flat_bytes)).unwrap();
        let recursive =
            TypeTreeNode::read(FormatVersion(11), &mut EndianReader::new(&recursive_bytes)).unwrap();

        assert_eq!(flat, recursive);
    }

    #[test]
    fn test_unknown_common_string_falls_back_to_number() {
        assert_eq!(resolve_string(&[], 3, 1).unwrap(), "3");
        assert_eq!(resolve_string(&[], 161, 1).unwrap(), "float");
    }

    #[test]
    fn test_local_string_out_of_bounds() {
        assert!(matches!(
            resolve_string(b"ab\0", 3, 0),
            Err(Error::StringOffsetOutOfBounds { offset: 3, size: 3 })
        ));
    }

    #[test]
    fn test_flat_node_count_past_end() {
        // Huge node count with an empty string buffer.
        let mut bytes = 0x0100_0000i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&0i32.to_le_bytes());

        assert!(matches!(
            TypeTreeNode::read(FormatVersion(17), &mut EndianReader::new(&bytes)),
            Err(Error::Common(veles_common::Error::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn test_iter_is_preorder_with_depth() {
        let bytes = encode_recursive();
        let root = TypeTreeNode::read_recursive(&mut EndianReader::new(&bytes)).unwrap();

        let names: Vec<(usize, &str)> = root.iter().map(|(d, n)| (d, n.name.as_str())).collect();
        assert_eq!(
            names,
            vec![
                (0, "Base"),
                (1, "m_Health"),
                (1, "m_Offset"),
                (2, "x"),
                (2, "y"),
                (2, "z"),
                (1, "m_Enabled"),
            ]
        );
        assert!(root.dump().contains("    float z // size 4"));
    }
}
