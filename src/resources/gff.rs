//! Binary labeled-field records (GFF V3.2 / V3.3).
//!
//! A GFF file is a flat set of tables: structs reference fields, fields carry
//! a type, a label and either an inline value or an offset into the field
//! data block. Struct 0 is the top-level struct of every record.

use crate::{
    error::LoadError,
    resources::{ResourceProvider, ResourceType, load_resource},
};

/// Type tag of placeable templates.
pub const UTP_ID: [u8; 4] = *b"UTP ";

const HEADER_SIZE: usize = std::mem::size_of::<GffHeader>();
const LABEL_SIZE: usize = 16;
const VERSIONS: [[u8; 4]; 2] = [*b"V3.2", *b"V3.3"];

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GffHeader {
    file_type: [u8; 4],
    version: [u8; 4],
    struct_offset: u32,
    struct_count: u32,
    field_offset: u32,
    field_count: u32,
    label_offset: u32,
    label_count: u32,
    field_data_offset: u32,
    field_data_size: u32,
    field_indices_offset: u32,
    field_indices_size: u32,
    list_indices_offset: u32,
    list_indices_size: u32,
}

impl GffHeader {
    fn to_native(self) -> Self {
        Self {
            struct_offset: u32::from_le(self.struct_offset),
            struct_count: u32::from_le(self.struct_count),
            field_offset: u32::from_le(self.field_offset),
            field_count: u32::from_le(self.field_count),
            label_offset: u32::from_le(self.label_offset),
            label_count: u32::from_le(self.label_count),
            field_data_offset: u32::from_le(self.field_data_offset),
            field_data_size: u32::from_le(self.field_data_size),
            field_indices_offset: u32::from_le(self.field_indices_offset),
            field_indices_size: u32::from_le(self.field_indices_size),
            list_indices_offset: u32::from_le(self.list_indices_offset),
            list_indices_size: u32::from_le(self.list_indices_size),
            ..self
        }
    }
}

/// One 12-byte entry of the struct or field array: `(type/id, data, count/label)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct RawEntry {
    a: u32,
    b: u32,
    c: u32,
}

/// Localized string: a talk table reference plus inline substrings.
#[derive(Clone, Debug, PartialEq)]
pub struct LocString {
    pub str_ref: u32,
    pub strings: Vec<(u32, String)>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Byte(u8),
    Char(i8),
    Word(u16),
    Short(i16),
    DWord(u32),
    Int(i32),
    DWord64(u64),
    Int64(i64),
    Float(f32),
    Double(f64),
    ExoString(String),
    ResRef(String),
    LocString(LocString),
    Void(Vec<u8>),
    /// Index of a struct within the same record.
    Struct(usize),
    /// Indices of structs within the same record.
    List(Vec<usize>),
    Orientation([f32; 4]),
    Vector([f32; 3]),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    label: String,
    value: FieldValue,
}

impl Field {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Read any integer field as unsigned. Signed values are reinterpreted.
    pub fn as_uint(&self) -> Result<u64, LoadError> {
        match self.value {
            FieldValue::Byte(v) => Ok(v as u64),
            FieldValue::Char(v) => Ok(v as i64 as u64),
            FieldValue::Word(v) => Ok(v as u64),
            FieldValue::Short(v) => Ok(v as i64 as u64),
            FieldValue::DWord(v) => Ok(v as u64),
            FieldValue::Int(v) => Ok(v as i64 as u64),
            FieldValue::DWord64(v) => Ok(v),
            FieldValue::Int64(v) => Ok(v as u64),
            _ => Err(LoadError::FieldType {
                field: self.label.clone(),
                expected: "unsigned integer",
            }),
        }
    }
}

/// A parsed GFF record.
#[derive(Clone, Debug)]
pub struct Gff {
    file_type: [u8; 4],
    structs: Vec<GffStruct>,
    fields: Vec<Field>,
}

#[derive(Clone, Debug)]
struct GffStruct {
    id: u32,
    fields: Vec<usize>,
}

impl Gff {
    /// Parse `bytes` as a GFF whose type tag must equal `expected_id`.
    ///
    /// `name` is only used for error messages.
    pub fn parse(name: &str, bytes: &[u8], expected_id: [u8; 4]) -> Result<Self, LoadError> {
        let reader = Reader { name, bytes };
        let header: GffHeader =
            bytemuck::pod_read_unaligned::<GffHeader>(reader.slice(0, HEADER_SIZE)?).to_native();

        if header.file_type != expected_id {
            return Err(LoadError::FormatMismatch {
                name: name.to_string(),
                expected: tag_to_string(&expected_id),
                found: tag_to_string(&header.file_type),
            });
        }
        if !VERSIONS.contains(&header.version) {
            return Err(LoadError::FormatMismatch {
                name: name.to_string(),
                expected: "V3.2".to_string(),
                found: tag_to_string(&header.version),
            });
        }

        let labels = (0..header.label_count as usize)
            .map(|i| -> Result<String, LoadError> {
                let raw = reader.slice(header.label_offset as usize + i * LABEL_SIZE, LABEL_SIZE)?;
                let end = raw.iter().position(|&b| b == 0).unwrap_or(LABEL_SIZE);
                Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
            })
            .collect::<Result<Vec<_>, LoadError>>()?;

        let sections = Sections {
            reader,
            field_data: reader.slice(
                header.field_data_offset as usize,
                header.field_data_size as usize,
            )?,
            field_indices: reader.slice(
                header.field_indices_offset as usize,
                header.field_indices_size as usize,
            )?,
            list_indices: reader.slice(
                header.list_indices_offset as usize,
                header.list_indices_size as usize,
            )?,
        };

        let fields = (0..header.field_count as usize)
            .map(|i| -> Result<Field, LoadError> {
                let entry = reader.entry(header.field_offset as usize, i)?;
                let label = labels.get(entry.b as usize).cloned().ok_or_else(|| {
                    LoadError::malformed(name, format!("field {i} has label index {}", entry.b))
                })?;
                let value = sections.value(entry.a, entry.c)?;
                Ok(Field { label, value })
            })
            .collect::<Result<Vec<_>, LoadError>>()?;

        let structs = (0..header.struct_count as usize)
            .map(|i| -> Result<GffStruct, LoadError> {
                let entry = reader.entry(header.struct_offset as usize, i)?;
                let indices = match entry.c {
                    0 => Vec::new(),
                    1 => vec![entry.b as usize],
                    count => sections.field_indices(entry.b as usize, count as usize)?,
                };
                if let Some(bad) = indices.iter().find(|&&idx| idx >= fields.len()) {
                    return Err(LoadError::malformed(
                        name,
                        format!("struct {i} references missing field {bad}"),
                    ));
                }
                Ok(GffStruct {
                    id: entry.a,
                    fields: indices,
                })
            })
            .collect::<Result<Vec<_>, LoadError>>()?;

        if structs.is_empty() {
            return Err(LoadError::malformed(name, "no top-level struct"));
        }

        Ok(Self {
            file_type: header.file_type,
            structs,
            fields,
        })
    }

    pub fn file_type(&self) -> [u8; 4] {
        self.file_type
    }

    pub fn struct_count(&self) -> usize {
        self.structs.len()
    }

    /// The struct id stored alongside struct `index`.
    pub fn struct_id(&self, index: usize) -> Option<u32> {
        self.structs.get(index).map(|s| s.id)
    }

    /// Fields of the top-level struct, in file order.
    pub fn top_level(&self) -> impl Iterator<Item = &Field> + '_ {
        self.struct_fields(0).into_iter().flatten()
    }

    /// Fields of struct `index`, in file order.
    pub fn struct_fields(&self, index: usize) -> Option<impl Iterator<Item = &Field> + '_> {
        self.structs
            .get(index)
            .map(|s| s.fields.iter().map(|&idx| &self.fields[idx]))
    }
}

/// Load the record `name` of type `kind` and check its GFF type tag.
pub fn load_gff(
    resources: &dyn ResourceProvider,
    name: &str,
    kind: ResourceType,
    id: [u8; 4],
) -> Result<Gff, LoadError> {
    let data = load_resource(resources, name, kind)?;
    Gff::parse(name, &data, id)
}

fn tag_to_string(tag: &[u8; 4]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

#[derive(Clone, Copy)]
struct Reader<'a> {
    name: &'a str,
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], LoadError> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or_else(|| {
                LoadError::malformed(
                    self.name,
                    format!("{len} bytes at offset {offset} exceed {} bytes", self.bytes.len()),
                )
            })
    }

    fn entry(&self, table_offset: usize, index: usize) -> Result<RawEntry, LoadError> {
        const SIZE: usize = std::mem::size_of::<RawEntry>();
        let raw: RawEntry = bytemuck::pod_read_unaligned(self.slice(table_offset + index * SIZE, SIZE)?);
        Ok(RawEntry {
            a: u32::from_le(raw.a),
            b: u32::from_le(raw.b),
            c: u32::from_le(raw.c),
        })
    }
}

struct Sections<'a> {
    reader: Reader<'a>,
    field_data: &'a [u8],
    field_indices: &'a [u8],
    list_indices: &'a [u8],
}

impl<'a> Sections<'a> {
    fn section(&self, bytes: &'a [u8]) -> Reader<'a> {
        Reader {
            name: self.reader.name,
            bytes,
        }
    }

    fn data<const N: usize>(&self, offset: u32) -> Result<[u8; N], LoadError> {
        let raw = self.section(self.field_data).slice(offset as usize, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(raw);
        Ok(out)
    }

    fn u32_at(reader: Reader<'a>, offset: usize) -> Result<u32, LoadError> {
        let raw = reader.slice(offset, 4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn field_indices(&self, offset: usize, count: usize) -> Result<Vec<usize>, LoadError> {
        let reader = self.section(self.field_indices);
        reader.slice(offset, count.saturating_mul(4))?;
        (0..count)
            .map(|i| Self::u32_at(reader, offset + i * 4).map(|v| v as usize))
            .collect()
    }

    fn sized_bytes(&self, offset: usize) -> Result<&'a [u8], LoadError> {
        let reader = self.section(self.field_data);
        let len = Self::u32_at(reader, offset)? as usize;
        reader.slice(offset + 4, len)
    }

    fn floats<const N: usize>(&self, offset: u32) -> Result<[f32; N], LoadError> {
        let reader = self.section(self.field_data);
        let mut out = [0f32; N];
        for (i, value) in out.iter_mut().enumerate() {
            *value = f32::from_bits(Self::u32_at(reader, offset as usize + i * 4)?);
        }
        Ok(out)
    }

    fn value(&self, kind: u32, data: u32) -> Result<FieldValue, LoadError> {
        let inline = data.to_le_bytes();
        let value = match kind {
            0 => FieldValue::Byte(inline[0]),
            1 => FieldValue::Char(inline[0] as i8),
            2 => FieldValue::Word(u16::from_le_bytes([inline[0], inline[1]])),
            3 => FieldValue::Short(i16::from_le_bytes([inline[0], inline[1]])),
            4 => FieldValue::DWord(data),
            5 => FieldValue::Int(data as i32),
            6 => FieldValue::DWord64(u64::from_le_bytes(self.data(data)?)),
            7 => FieldValue::Int64(i64::from_le_bytes(self.data(data)?)),
            8 => FieldValue::Float(f32::from_bits(data)),
            9 => FieldValue::Double(f64::from_le_bytes(self.data(data)?)),
            10 => FieldValue::ExoString(
                String::from_utf8_lossy(self.sized_bytes(data as usize)?).into_owned(),
            ),
            11 => {
                let reader = self.section(self.field_data);
                let len = reader.slice(data as usize, 1)?[0] as usize;
                let raw = reader.slice(data as usize + 1, len)?;
                FieldValue::ResRef(String::from_utf8_lossy(raw).into_owned())
            }
            12 => FieldValue::LocString(self.loc_string(data as usize)?),
            13 => FieldValue::Void(self.sized_bytes(data as usize)?.to_vec()),
            14 => FieldValue::Struct(data as usize),
            15 => {
                let reader = self.section(self.list_indices);
                let count = Self::u32_at(reader, data as usize)? as usize;
                reader.slice(data as usize + 4, count.saturating_mul(4))?;
                let structs = (0..count)
                    .map(|i| Self::u32_at(reader, data as usize + 4 + i * 4).map(|v| v as usize))
                    .collect::<Result<Vec<_>, _>>()?;
                FieldValue::List(structs)
            }
            16 => FieldValue::Orientation(self.floats(data)?),
            17 => FieldValue::Vector(self.floats(data)?),
            other => {
                return Err(LoadError::malformed(
                    self.reader.name,
                    format!("unknown field type {other}"),
                ));
            }
        };
        Ok(value)
    }

    fn loc_string(&self, offset: usize) -> Result<LocString, LoadError> {
        let reader = self.section(self.field_data);
        // Layout: total size, string ref, substring count, then (id, length, bytes)*.
        let str_ref = Self::u32_at(reader, offset + 4)?;
        let count = Self::u32_at(reader, offset + 8)? as usize;
        // Sized by the entries actually present, not by `count`.
        let mut strings = Vec::new();
        let mut cursor = offset + 12;
        for _ in 0..count {
            let id = Self::u32_at(reader, cursor)?;
            let len = Self::u32_at(reader, cursor + 4)? as usize;
            let raw = reader.slice(cursor + 8, len)?;
            strings.push((id, String::from_utf8_lossy(raw).into_owned()));
            cursor += 8 + len;
        }
        Ok(LocString { str_ref, strings })
    }
}
