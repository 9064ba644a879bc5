//! Synthetic assets files for tests.

use std::io::{Cursor, SeekFrom};

use veles_common::{Endian, EndianWriter};

use crate::type_tree::tests::{sample_tree, write_flat, write_recursive};
use crate::{FormatVersion, ScriptType, FILE_SIZE_OFFSET};

pub(crate) struct TestObject {
    pub path_id: i64,
    /// Index into the declared type list.
    pub type_id: i32,
    /// Stored inline before format 16.
    pub class_id: u16,
    pub destroyed: bool,
    pub data: Vec<u8>,
}

impl TestObject {
    pub fn new(path_id: i64, type_id: i32, class_id: u16, data: Vec<u8>) -> Self {
        Self {
            path_id,
            type_id,
            class_id,
            destroyed: false,
            data,
        }
    }
}

pub(crate) struct TestContainer {
    pub format: u32,
    pub version: &'static str,
    pub platform: i32,
    pub big_endian_header: bool,
    pub long_object_ids: bool,
    /// Declared class IDs; objects refer to them by position.
    pub types: Vec<i32>,
    /// Embed the sample tree for every declared type.
    pub type_trees: bool,
    pub objects: Vec<TestObject>,
    pub script_types: Vec<ScriptType>,
    pub references: Vec<String>,
}

impl TestContainer {
    pub fn new(format: u32, objects: Vec<TestObject>) -> Self {
        Self {
            format,
            version: "2019.4.16f1",
            platform: 19,
            big_endian_header: false,
            long_object_ids: false,
            types: vec![1, 114],
            type_trees: false,
            objects,
            script_types: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Lay out the file: header, metadata, then the data region starting on
    /// a 16-byte boundary with every payload followed by four zero bytes.
    pub fn build(&self) -> Vec<u8> {
        let format = FormatVersion(self.format);
        let mut w = EndianWriter::with_endian(Cursor::new(Vec::new()), Endian::Big);

        // metadata size, file size, format, data offset
        w.write_bytes(&[0; 16]).unwrap();
        w.seek(SeekFrom::Start(8)).unwrap();
        w.write_u32(self.format).unwrap();
        w.seek(SeekFrom::End(0)).unwrap();

        let tail_endian = if format.has_endian_probe() {
            w.write_u32(u32::from(self.big_endian_header)).unwrap();
            if self.big_endian_header {
                Endian::Big
            } else {
                Endian::Little
            }
        } else {
            Endian::Big
        };
        w.set_endian(tail_endian);
        w.write_cstring(self.version).unwrap();
        w.write_i32(self.platform).unwrap();
        w.set_endian(Endian::Little);

        let metadata_start = w.position().unwrap();
        self.write_type_metadata(format, &mut w);

        if format.has_long_object_ids_flag() {
            w.write_i32(i32::from(self.long_object_ids)).unwrap();
        }

        w.write_i32(self.objects.len() as i32).unwrap();
        let mut offset_fields = Vec::new();
        for object in &self.objects {
            self.write_path_id(format, object.path_id, &mut w);
            offset_fields.push(w.position().unwrap());
            w.write_u32(0).unwrap();
            w.write_u32(object.data.len() as u32).unwrap();
            w.write_i32(object.type_id).unwrap();
            if format.has_inline_class_id() {
                w.write_u16(object.class_id).unwrap();
            }
            if format.has_destroyed_flag() {
                w.write_u16(u16::from(object.destroyed)).unwrap();
            }
            if format.has_stripped_byte() {
                w.write_u8(0).unwrap();
            }
        }

        if format.has_script_types() {
            w.write_i32(self.script_types.len() as i32).unwrap();
            for script in &self.script_types {
                w.write_i32(script.index).unwrap();
                self.write_path_id(format, script.path_id, &mut w);
            }
        }

        if format.has_externals() {
            w.write_i32(self.references.len() as i32).unwrap();
            for path in &self.references {
                w.write_cstring("").unwrap();
                if format.has_external_guid() {
                    w.write_bytes(&[0; 16]).unwrap();
                    w.write_i32(0).unwrap();
                }
                w.write_cstring(path).unwrap();
            }
        }

        let metadata_size = w.position().unwrap() - metadata_start;
        w.align(16).unwrap();
        let data_offset = w.position().unwrap();

        let mut placements = Vec::new();
        for object in &self.objects {
            placements.push(w.position().unwrap() - data_offset);
            w.write_bytes(&object.data).unwrap();
            w.write_bytes(&[0; 4]).unwrap();
        }
        let file_size = w.position().unwrap();

        for (field, offset) in offset_fields.into_iter().zip(placements) {
            w.seek(SeekFrom::Start(field)).unwrap();
            w.write_u32(offset as u32).unwrap();
        }

        w.set_endian(Endian::Big);
        w.seek(SeekFrom::Start(0)).unwrap();
        w.write_u32(metadata_size as u32).unwrap();
        w.seek(SeekFrom::Start(FILE_SIZE_OFFSET)).unwrap();
        w.write_u32(file_size as u32).unwrap();
        w.seek(SeekFrom::Start(12)).unwrap();
        w.write_u32(data_offset as u32).unwrap();

        w.into_inner().into_inner()
    }

    fn write_type_metadata(&self, format: FormatVersion, w: &mut EndianWriter<Cursor<Vec<u8>>>) {
        let tree = sample_tree();

        if !format.has_type_hashes() {
            let count = if self.type_trees { self.types.len() } else { 0 };
            w.write_i32(count as i32).unwrap();
            for &class_id in self.types.iter().take(count) {
                w.write_i32(class_id).unwrap();
                if format.has_flat_type_trees() {
                    write_flat(&tree, format, w);
                } else {
                    write_recursive(&tree, &mut 0, w);
                }
            }
            return;
        }

        w.write_bool(self.type_trees).unwrap();
        w.write_i32(self.types.len() as i32).unwrap();
        for &class_id in &self.types {
            w.write_i32(class_id).unwrap();
            if format.has_script_type_index() {
                w.write_u8(0).unwrap();
                w.write_i16(if class_id == 114 { 0 } else { -1 }).unwrap();
            }
            let hash_len = if format.has_script_hash(class_id) { 32 } else { 16 };
            w.write_bytes(&[0xA5; 32][..hash_len]).unwrap();

            if self.type_trees {
                write_flat(&tree, format, w);
                if format.has_type_dependencies() {
                    w.write_i32(0).unwrap();
                }
            }
        }
    }

    fn write_path_id(&self, format: FormatVersion, path_id: i64, w: &mut EndianWriter<Cursor<Vec<u8>>>) {
        if format.has_aligned_path_ids() {
            w.align(4).unwrap();
            w.write_i64(path_id).unwrap();
        } else if self.long_object_ids {
            w.write_i64(path_id).unwrap();
        } else {
            w.write_i32(path_id as i32).unwrap();
        }
    }
}
