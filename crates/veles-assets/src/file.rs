//! Assets file parsing and rewriting.

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, SeekFrom, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::{debug, instrument, trace, warn};
use veles_common::{padding_for, Endian, EndianReader, EndianWriter};

use crate::header::FILE_SIZE_OFFSET;
use crate::{
    read_count, AssetHandle, AssetInfo, AssetReference, AssetsHeader, Error, FormatVersion,
    FxHashMap, Result, ScriptType, TypeMetaData,
};

/// Padding written after every object payload on save.
const OBJECT_TRAILER: [u8; 4] = [0; 4];

/// Bytes backing an open file.
enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => mmap,
            Self::Owned(bytes) => bytes,
        }
    }
}

/// Everything parsed from the bytes before the data region.
struct Tables {
    header: AssetsHeader,
    type_metadata: TypeMetaData,
    long_object_ids: bool,
    objects_table_offset: usize,
    objects: Vec<AssetInfo>,
    index: FxHashMap<i64, usize>,
    script_types: Vec<ScriptType>,
    references: Vec<AssetReference>,
}

/// A Unity serialized assets file.
///
/// The header, type metadata and object table are parsed eagerly on open.
/// Object payloads stay in the backing buffer and are borrowed through
/// [`AssetHandle`]s. Modified payloads are staged with
/// [`replace_asset`](Self::replace_asset) and written out by a full rewrite.
///
/// # Example
///
/// ```no_run
/// use veles_assets::AssetsFile;
///
/// let mut file = AssetsFile::open("level0")?;
/// println!("{} objects, format {}", file.len(), file.format());
///
/// let first = file.objects().next().map(|o| o.path_id());
/// if let Some(path_id) = first {
///     file.replace_asset(path_id, vec![0u8; 8]);
///     file.save("level0.patched")?;
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct AssetsFile {
    backing: Backing,
    source: Option<PathBuf>,
    header: AssetsHeader,
    type_metadata: TypeMetaData,
    long_object_ids: bool,
    objects_table_offset: usize,
    /// Every table entry in on-disk order, duplicates included.
    objects: Vec<AssetInfo>,
    /// Path ID to position in `objects`; the last duplicate wins.
    index: FxHashMap<i64, usize>,
    script_types: Vec<ScriptType>,
    references: Vec<AssetReference>,
    replacements: FxHashMap<i64, Vec<u8>>,
}

impl AssetsFile {
    /// Memory-map and parse an assets file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        Self::from_backing(Backing::Mapped(mmap), Some(path.to_path_buf()))
    }

    /// Parse an assets file held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_backing(Backing::Owned(data), None)
    }

    fn from_backing(backing: Backing, source: Option<PathBuf>) -> Result<Self> {
        let tables = parse_tables(&backing)?;

        Ok(Self {
            backing,
            source,
            header: tables.header,
            type_metadata: tables.type_metadata,
            long_object_ids: tables.long_object_ids,
            objects_table_offset: tables.objects_table_offset,
            objects: tables.objects,
            index: tables.index,
            script_types: tables.script_types,
            references: tables.references,
            replacements: FxHashMap::default(),
        })
    }

    /// Parsed header.
    #[inline]
    pub fn header(&self) -> &AssetsHeader {
        &self.header
    }

    /// Format revision.
    #[inline]
    pub fn format(&self) -> FormatVersion {
        self.header.format
    }

    /// Unity version string from the header.
    #[inline]
    pub fn version(&self) -> &str {
        &self.header.version
    }

    /// Target platform identifier.
    #[inline]
    pub fn platform(&self) -> i32 {
        self.header.platform
    }

    /// Declared type table.
    #[inline]
    pub fn type_metadata(&self) -> &TypeMetaData {
        &self.type_metadata
    }

    /// Whether object identifiers are 64-bit.
    #[inline]
    pub fn long_object_ids(&self) -> bool {
        self.long_object_ids || self.format().has_aligned_path_ids()
    }

    /// Path the file was opened from, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Raw bytes of the whole file.
    pub fn as_bytes(&self) -> &[u8] {
        &self.backing
    }

    /// Number of object table entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the object table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Check whether an object with this path ID exists.
    pub fn contains(&self, path_id: i64) -> bool {
        self.index.contains_key(&path_id)
    }

    /// Object table entries in on-disk order.
    pub fn infos(&self) -> &[AssetInfo] {
        &self.objects
    }

    /// Iterate objects in on-disk order.
    pub fn objects(&self) -> impl Iterator<Item = AssetHandle<'_>> + '_ {
        self.objects.iter().map(move |info| AssetHandle::new(self, info))
    }

    /// Iterate objects of one class.
    pub fn objects_of_class(&self, class_id: i32) -> impl Iterator<Item = AssetHandle<'_>> + '_ {
        self.objects().filter(move |o| o.class_id() == class_id)
    }

    /// Look up an object by path ID.
    pub fn get(&self, path_id: i64) -> Option<AssetHandle<'_>> {
        self.index
            .get(&path_id)
            .map(|&i| AssetHandle::new(self, &self.objects[i]))
    }

    /// Look up an object by path ID, failing if absent.
    pub fn asset(&self, path_id: i64) -> Result<AssetHandle<'_>> {
        self.get(path_id).ok_or(Error::AssetNotFound(path_id))
    }

    /// Script type table (format 11+).
    pub fn script_types(&self) -> &[ScriptType] {
        &self.script_types
    }

    /// External file references (format 6+).
    pub fn references(&self) -> &[AssetReference] {
        &self.references
    }

    /// Stored payload of an object. Ranges were bounds-checked on parse.
    pub(crate) fn object_bytes(&self, info: &AssetInfo) -> &[u8] {
        let base = self.header.data_offset as usize;
        let range = info.data_range();
        &self.backing[base + range.start..base + range.end]
    }

    pub(crate) fn bytes_from_object(&self, info: &AssetInfo) -> &[u8] {
        let base = self.header.data_offset as usize;
        &self.backing[base + info.data_offset as usize..]
    }

    /// Stage a full replacement payload for an object.
    ///
    /// The new length becomes the object's size on the next save. Returns the
    /// previously staged payload, if any.
    pub fn replace_asset(&mut self, path_id: i64, data: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.replacements.insert(path_id, data.into())
    }

    /// Staged replacement for an object.
    pub fn replacement(&self, path_id: i64) -> Option<&[u8]> {
        self.replacements.get(&path_id).map(Vec::as_slice)
    }

    /// Whether any replacement is staged.
    pub fn has_replacements(&self) -> bool {
        !self.replacements.is_empty()
    }

    /// Drop all staged replacements.
    pub fn clear_replacements(&mut self) {
        self.replacements.clear();
    }

    /// Rewrite the file with staged replacements applied to `path`.
    ///
    /// Not crash-atomic: write to a side path and rename when that matters.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(source) = &self.source {
            if path.exists() && path.canonicalize()? == source.canonicalize()? {
                return Err(Error::SaveOverSource(path.display().to_string()));
            }
        }

        let mut out = self.write_to(BufWriter::new(File::create(path)?))?;
        out.flush()?;
        Ok(())
    }

    /// Rewrite the file with staged replacements applied into a byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let capacity = self.backing.len() + self.replacements.values().map(Vec::len).sum::<usize>();
        let cursor = self.write_to(Cursor::new(Vec::with_capacity(capacity)))?;
        Ok(cursor.into_inner())
    }

    /// Rewrite into `sink` from stream offset 0. The sink must be empty;
    /// nothing past the rewritten length is truncated.
    #[instrument(skip_all, fields(objects = self.objects.len(), replacements = self.replacements.len()))]
    fn write_to<W: Write + Seek>(&self, sink: W) -> Result<W> {
        for path_id in self.replacements.keys() {
            if !self.index.contains_key(path_id) {
                warn!(path_id, "staged replacement for unknown object is ignored");
            }
        }

        let mut w = EndianWriter::new(sink);
        w.seek(SeekFrom::Start(0))?;

        let data_offset = self.header.data_offset as usize;
        w.write_bytes(&self.backing[..data_offset])?;

        let mut layout = Vec::with_capacity(self.objects.len());
        let mut position = data_offset as u64;

        for info in &self.objects {
            let payload = match self.replacements.get(&info.path_id) {
                Some(bytes) => bytes.as_slice(),
                None => self.object_bytes(info),
            };

            let offset = to_u32(position - data_offset as u64)?;
            let size = to_u32(payload.len() as u64)?;
            trace!(path_id = info.path_id, offset, size, "writing object");

            w.write_bytes(payload)?;
            w.write_bytes(&OBJECT_TRAILER)?;
            position += payload.len() as u64 + OBJECT_TRAILER.len() as u64;

            layout.push((offset, size));
        }

        let total_size = to_u32(position)?;
        self.patch_object_table(&mut w, &layout)?;

        w.seek(SeekFrom::Start(FILE_SIZE_OFFSET))?;
        w.set_endian(Endian::Big);
        w.write_u32(total_size)?;

        debug!(total_size, "rewrote assets file");
        Ok(w.into_inner())
    }

    /// Overwrite the offset and size of every object table entry, walking the
    /// table with the same field layout the parser used.
    fn patch_object_table<W: Write + Seek>(
        &self,
        w: &mut EndianWriter<W>,
        layout: &[(u32, u32)],
    ) -> Result<()> {
        let format = self.format();
        let mut position = self.objects_table_offset;

        for &(offset, size) in layout {
            position += path_id_skip(format, self.long_object_ids, position);
            w.seek(SeekFrom::Start(position as u64))?;
            w.write_u32(offset)?;
            w.write_u32(size)?;
            position += object_entry_tail_size(format);
        }

        Ok(())
    }
}

impl std::fmt::Debug for AssetsFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetsFile")
            .field("source", &self.source)
            .field("header", &self.header)
            .field("objects", &self.objects.len())
            .field("replacements", &self.replacements.len())
            .finish()
    }
}

#[instrument(skip_all)]
fn parse_tables(data: &[u8]) -> Result<Tables> {
    let mut reader = EndianReader::new(data);

    let header = AssetsHeader::read(&mut reader)?;
    let format = header.format;
    let data_offset = header.data_offset as usize;
    reader.peek_bytes_at(0, data_offset)?;

    let type_metadata = TypeMetaData::read(format, &mut reader)?;

    let long_object_ids = if format.has_long_object_ids_flag() {
        reader.read_i32()? != 0
    } else {
        false
    };

    let object_count = read_count(&mut reader, "object")?;
    let objects_table_offset = reader.position();
    let data_available = data.len() - data_offset;

    let mut objects = Vec::with_capacity(object_count.min(1 << 16));
    let mut index = FxHashMap::default();

    for _ in 0..object_count {
        let path_id = read_path_id(format, long_object_ids, &mut reader)?;
        let data_offset = reader.read_u32()?;
        let size = reader.read_u32()?;
        let type_id = reader.read_i32()?;

        let class_id = if format.has_inline_class_id() {
            reader.read_u16()? as i32
        } else {
            type_metadata
                .class_for_type(type_id)
                .map(|c| c.class_id)
                .ok_or(Error::UnknownTypeIndex {
                    path_id,
                    type_id,
                    count: type_metadata.classes().len(),
                })?
        };

        let is_destroyed = format.has_destroyed_flag() && reader.read_u16()? != 0;
        let stripped = if format.has_stripped_byte() {
            Some(reader.read_u8()?)
        } else {
            None
        };

        let info = AssetInfo {
            path_id,
            data_offset,
            size,
            type_id,
            class_id,
            is_destroyed,
            stripped,
        };

        if info.data_range().end > data_available {
            return Err(Error::ObjectOutOfBounds {
                path_id,
                offset: data_offset,
                size,
                available: data_available,
            });
        }

        if let Some(previous) = index.insert(path_id, objects.len()) {
            warn!(
                path_id,
                previous_entry = previous,
                entry = objects.len(),
                "duplicate path ID in object table, later entry shadows earlier one"
            );
        }
        objects.push(info);
    }

    let mut script_types = Vec::new();
    if format.has_script_types() {
        let count = read_count(&mut reader, "script type")?;
        script_types.reserve(count.min(1 << 16));
        for _ in 0..count {
            let index = reader.read_i32()?;
            let path_id = read_path_id(format, long_object_ids, &mut reader)?;
            script_types.push(ScriptType { index, path_id });
        }
    }

    let mut references = Vec::new();
    if format.has_externals() {
        let count = read_count(&mut reader, "external reference")?;
        references.reserve(count.min(1 << 16));
        for _ in 0..count {
            references.push(AssetReference::read(format, &mut reader)?);
        }
    }

    debug!(
        format = format.get(),
        version = %header.version,
        objects = objects.len(),
        script_types = script_types.len(),
        references = references.len(),
        "parsed assets file tables"
    );

    Ok(Tables {
        header,
        type_metadata,
        long_object_ids,
        objects_table_offset,
        objects,
        index,
        script_types,
        references,
    })
}

/// Bytes between `position` and the end of an object identifier, including
/// any alignment padding in front of it.
fn path_id_skip(format: FormatVersion, long_object_ids: bool, position: usize) -> usize {
    if format.has_aligned_path_ids() {
        padding_for(position, 4) + 8
    } else if long_object_ids {
        8
    } else {
        4
    }
}

/// Bytes of an object entry after the identifier: offset, size, type ID and
/// the format-dependent trailing fields.
fn object_entry_tail_size(format: FormatVersion) -> usize {
    let mut size = 4 + 4 + 4;
    if format.has_inline_class_id() {
        size += 2;
    }
    if format.has_destroyed_flag() {
        size += 2;
    }
    if format.has_stripped_byte() {
        size += 1;
    }
    size
}

fn read_path_id(format: FormatVersion, long_object_ids: bool, reader: &mut EndianReader<'_>) -> Result<i64> {
    if format.has_aligned_path_ids() {
        reader.align(4);
        Ok(reader.read_i64()?)
    } else if long_object_ids {
        Ok(reader.read_i64()?)
    } else {
        Ok(reader.read_i32()? as i64)
    }
}

fn to_u32(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::FileTooLarge(value))
}
