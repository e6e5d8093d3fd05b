//! Level 5 MAT-file element decoding.
//!
//! A level 5 file is a 128-byte header followed by tagged data elements. Each
//! top-level element is either a `miMATRIX` or a zlib-compressed `miCOMPRESSED`
//! wrapping exactly one `miMATRIX`.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::FluxError;

const HEADER_LEN: usize = 128;
const HEADER_TEXT_LEN: usize = 116;
const VERSION_5: u16 = 0x0100;
const VERSION_73: u16 = 0x0200;

const MI_INT8: u32 = 1;
const MI_UINT8: u32 = 2;
const MI_INT16: u32 = 3;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_SINGLE: u32 = 7;
const MI_DOUBLE: u32 = 9;
const MI_INT64: u32 = 12;
const MI_UINT64: u32 = 13;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;
const MI_UTF8: u32 = 16;
const MI_UTF16: u32 = 17;
const MI_UTF32: u32 = 18;

const TAG_LEN: usize = 8;
const MAX_EMPTY_STRUCT_ELEMENTS: usize = 1 << 20;

const FLAG_COMPLEX: u32 = 0x0800;
const FLAG_LOGICAL: u32 = 0x0200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// MATLAB array class as stored in the array flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericClass {
    Double,
    Single,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Logical,
}

impl NumericClass {
    fn from_class_code(code: u32) -> Option<Self> {
        match code {
            6 => Some(NumericClass::Double),
            7 => Some(NumericClass::Single),
            8 => Some(NumericClass::Int8),
            9 => Some(NumericClass::Uint8),
            10 => Some(NumericClass::Int16),
            11 => Some(NumericClass::Uint16),
            12 => Some(NumericClass::Int32),
            13 => Some(NumericClass::Uint32),
            14 => Some(NumericClass::Int64),
            15 => Some(NumericClass::Uint64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NumericClass::Double => "double",
            NumericClass::Single => "single",
            NumericClass::Int8 => "int8",
            NumericClass::Uint8 => "uint8",
            NumericClass::Int16 => "int16",
            NumericClass::Uint16 => "uint16",
            NumericClass::Int32 => "int32",
            NumericClass::Uint32 => "uint32",
            NumericClass::Int64 => "int64",
            NumericClass::Uint64 => "uint64",
            NumericClass::Logical => "logical",
        }
    }
}

const MX_CELL: u32 = 1;
const MX_STRUCT: u32 = 2;
const MX_OBJECT: u32 = 3;
const MX_CHAR: u32 = 4;
const MX_SPARSE: u32 = 5;

/// An array exactly as stored, before squeezing. `dims` are MATLAB dimensions and
/// all element data is in column-major order.
#[derive(Debug, Clone, PartialEq)]
pub enum RawArray {
    Numeric {
        class: NumericClass,
        dims: Vec<usize>,
        data: Vec<f64>,
    },
    Char {
        dims: Vec<usize>,
        chars: Vec<char>,
    },
    Cell {
        dims: Vec<usize>,
        items: Vec<RawArray>,
    },
    Struct {
        dims: Vec<usize>,
        fields: Vec<String>,
        /// One entry per struct element, each holding one value per field.
        elements: Vec<Vec<RawArray>>,
    },
}

impl RawArray {
    fn empty() -> Self {
        RawArray::Numeric {
            class: NumericClass::Double,
            dims: vec![0, 0],
            data: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawVariable {
    pub name: String,
    pub array: RawArray,
}

#[derive(Debug, Clone)]
pub struct Header {
    pub description: String,
    pub endian: Endian,
}

pub fn read_header(bytes: &[u8]) -> Result<Header, FluxError> {
    if bytes.len() < HEADER_LEN {
        return Err(FluxError::NotMatFile(format!(
            "file is {} bytes, shorter than the 128-byte header",
            bytes.len()
        )));
    }
    let description = String::from_utf8_lossy(&bytes[..HEADER_TEXT_LEN])
        .trim_end_matches(['\0', ' '])
        .to_string();
    let endian = match &bytes[126..128] {
        b"IM" => Endian::Little,
        b"MI" => Endian::Big,
        _ => {
            return if description.starts_with("MATLAB") {
                Err(FluxError::NotMatFile("bad endian indicator".to_string()))
            } else {
                Err(FluxError::UnsupportedMatVersion(
                    "level 4 or unknown layout".to_string(),
                ))
            };
        }
    };
    let version = match endian {
        Endian::Little => u16::from_le_bytes([bytes[124], bytes[125]]),
        Endian::Big => u16::from_be_bytes([bytes[124], bytes[125]]),
    };
    match version {
        VERSION_5 => Ok(Header {
            description,
            endian,
        }),
        VERSION_73 => Err(FluxError::UnsupportedMatVersion(
            "7.3 (HDF5-based)".to_string(),
        )),
        other => Err(FluxError::UnsupportedMatVersion(format!("0x{other:04x}"))),
    }
}

/// Decodes every top-level variable of a level 5 file, in file order.
pub fn read_variables(bytes: &[u8]) -> Result<(Header, Vec<RawVariable>), FluxError> {
    let header = read_header(bytes)?;
    let mut reader = ByteReader::new(&bytes[HEADER_LEN..], header.endian);
    let mut variables = Vec::new();

    while reader.remaining() >= 8 {
        let (mdtype, data) = reader.top_level_element()?;
        match mdtype {
            MI_MATRIX => variables.push(parse_matrix(data, header.endian)?),
            MI_COMPRESSED => {
                let mut inflated = Vec::new();
                ZlibDecoder::new(data)
                    .read_to_end(&mut inflated)
                    .map_err(|err| FluxError::MalformedMat(format!("zlib: {err}")))?;
                let mut inner = ByteReader::new(&inflated, header.endian);
                let (inner_type, inner_data) = inner.element()?;
                if inner_type != MI_MATRIX {
                    return Err(FluxError::MalformedMat(format!(
                        "compressed element holds type {inner_type}, expected miMATRIX"
                    )));
                }
                variables.push(parse_matrix(inner_data, header.endian)?);
            }
            other => {
                return Err(FluxError::MalformedMat(format!(
                    "unexpected top-level element type {other}"
                )));
            }
        }
    }

    Ok((header, variables))
}

fn parse_matrix(data: &[u8], endian: Endian) -> Result<RawVariable, FluxError> {
    if data.is_empty() {
        return Ok(RawVariable {
            name: String::new(),
            array: RawArray::empty(),
        });
    }

    let mut reader = ByteReader::new(data, endian);

    let (flags_type, flags) = reader.element()?;
    if flags_type != MI_UINT32 || flags.len() < 8 {
        return Err(FluxError::MalformedMat("missing array flags".to_string()));
    }
    let flags_word = reader.u32_at(flags, 0);
    let class_code = flags_word & 0xff;

    let (dims_type, dims_bytes) = reader.element()?;
    if dims_type != MI_INT32 {
        return Err(FluxError::MalformedMat(format!(
            "dimensions stored as type {dims_type}, expected miINT32"
        )));
    }
    let dims = decode_numeric(MI_INT32, dims_bytes, endian)?
        .into_iter()
        .map(|dim| {
            if dim < 0.0 {
                Err(FluxError::MalformedMat(format!("negative dimension {dim}")))
            } else {
                Ok(dim as usize)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    let count = element_count(&dims)?;

    let (_, name_bytes) = reader.element()?;
    let name = ascii_string(name_bytes);

    let array = match class_code {
        MX_CELL => {
            reader.expect_nested(count, 1, &name)?;
            let items = (0..count)
                .map(|_| reader.matrix_element(endian).map(|var| var.array))
                .collect::<Result<Vec<_>, _>>()?;
            RawArray::Cell { dims, items }
        }
        MX_STRUCT | MX_OBJECT => {
            if class_code == MX_OBJECT {
                reader.element()?;
            }
            let (_, len_bytes) = reader.element()?;
            let field_len = decode_numeric(MI_INT32, len_bytes, endian)?
                .first()
                .copied()
                .unwrap_or(0.0) as usize;
            let (_, names_bytes) = reader.element()?;
            let fields: Vec<String> = if field_len == 0 {
                Vec::new()
            } else {
                names_bytes.chunks(field_len).map(ascii_string).collect()
            };
            if fields.is_empty() {
                // Field-less elements occupy no bytes, so the file cannot bound them.
                if count > MAX_EMPTY_STRUCT_ELEMENTS {
                    return Err(FluxError::MalformedMat(format!(
                        "{name}: {count} elements in a struct without fields"
                    )));
                }
            } else {
                reader.expect_nested(count, fields.len(), &name)?;
            }
            let mut elements = Vec::new();
            for _ in 0..count {
                let values = fields
                    .iter()
                    .map(|_| reader.matrix_element(endian).map(|var| var.array))
                    .collect::<Result<Vec<_>, _>>()?;
                elements.push(values);
            }
            RawArray::Struct {
                dims,
                fields,
                elements,
            }
        }
        MX_CHAR => {
            let chars = if count == 0 {
                Vec::new()
            } else {
                let (char_type, char_bytes) = reader.element()?;
                decode_chars(char_type, char_bytes, endian)?
            };
            RawArray::Char { dims, chars }
        }
        MX_SPARSE => {
            return Err(FluxError::UnsupportedMatClass(format!(
                "sparse array {name}"
            )));
        }
        code => {
            let class = NumericClass::from_class_code(code).ok_or_else(|| {
                FluxError::UnsupportedMatClass(format!("class code {code} for {name}"))
            })?;
            if flags_word & FLAG_COMPLEX != 0 {
                return Err(FluxError::UnsupportedMatClass(format!(
                    "complex array {name}"
                )));
            }
            let class = if flags_word & FLAG_LOGICAL != 0 {
                NumericClass::Logical
            } else {
                class
            };
            let data = if count == 0 {
                Vec::new()
            } else {
                let (real_type, real_bytes) = reader.element()?;
                decode_numeric(real_type, real_bytes, endian)?
            };
            if data.len() != count {
                return Err(FluxError::MalformedMat(format!(
                    "{name}: {} values for dimensions {dims:?}",
                    data.len()
                )));
            }
            RawArray::Numeric { class, dims, data }
        }
    };

    Ok(RawVariable { name, array })
}

fn element_count(dims: &[usize]) -> Result<usize, FluxError> {
    dims.iter()
        .try_fold(1usize, |acc, dim| acc.checked_mul(*dim))
        .ok_or_else(|| FluxError::MalformedMat(format!("dimensions {dims:?} overflow")))
}

fn ascii_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|byte| **byte != 0)
        .map(|byte| *byte as char)
        .collect()
}

fn decode_numeric(mdtype: u32, bytes: &[u8], endian: Endian) -> Result<Vec<f64>, FluxError> {
    macro_rules! decode {
        ($ty:ty, $size:expr) => {
            bytes
                .chunks_exact($size)
                .map(|chunk| {
                    let mut raw = [0u8; $size];
                    raw.copy_from_slice(chunk);
                    match endian {
                        Endian::Little => <$ty>::from_le_bytes(raw) as f64,
                        Endian::Big => <$ty>::from_be_bytes(raw) as f64,
                    }
                })
                .collect()
        };
    }

    let values: Vec<f64> = match mdtype {
        MI_INT8 => bytes.iter().map(|b| *b as i8 as f64).collect(),
        MI_UINT8 | MI_UTF8 => bytes.iter().map(|b| *b as f64).collect(),
        MI_INT16 => decode!(i16, 2),
        MI_UINT16 | MI_UTF16 => decode!(u16, 2),
        MI_INT32 => decode!(i32, 4),
        MI_UINT32 | MI_UTF32 => decode!(u32, 4),
        MI_SINGLE => decode!(f32, 4),
        MI_DOUBLE => decode!(f64, 8),
        MI_INT64 => decode!(i64, 8),
        MI_UINT64 => decode!(u64, 8),
        other => {
            return Err(FluxError::MalformedMat(format!(
                "data type {other} cannot hold numeric values"
            )));
        }
    };
    Ok(values)
}

fn decode_chars(mdtype: u32, bytes: &[u8], endian: Endian) -> Result<Vec<char>, FluxError> {
    match mdtype {
        MI_UTF8 => Ok(String::from_utf8_lossy(bytes).chars().collect()),
        MI_INT8 | MI_UINT8 => Ok(bytes.iter().map(|b| *b as char).collect()),
        MI_UINT16 | MI_UTF16 => {
            let units = decode_numeric(MI_UINT16, bytes, endian)?
                .into_iter()
                .map(|unit| unit as u16);
            Ok(char::decode_utf16(units)
                .map(|ch| ch.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect())
        }
        MI_UINT32 | MI_UTF32 => Ok(decode_numeric(MI_UINT32, bytes, endian)?
            .into_iter()
            .map(|code| char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()),
        other => Err(FluxError::MalformedMat(format!(
            "data type {other} cannot hold characters"
        ))),
    }
}

struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8], endian: Endian) -> Self {
        Self {
            buf,
            pos: 0,
            endian,
        }
    }

    fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], FluxError> {
        if self.remaining() < len {
            return Err(FluxError::MalformedMat(format!(
                "element of {len} bytes runs past the end of its container"
            )));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u32_at(&self, bytes: &[u8], offset: usize) -> u32 {
        let raw = [
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ];
        match self.endian {
            Endian::Little => u32::from_le_bytes(raw),
            Endian::Big => u32::from_be_bytes(raw),
        }
    }

    fn read_u32(&mut self) -> Result<u32, FluxError> {
        let bytes = self.take(4)?;
        Ok(self.u32_at(bytes, 0))
    }

    /// Reads one tagged element, honouring the small-element form and 8-byte padding.
    fn element(&mut self) -> Result<(u32, &'a [u8]), FluxError> {
        let first = self.read_u32()?;
        if first >> 16 != 0 {
            let mdtype = first & 0xffff;
            let len = (first >> 16) as usize;
            if len > 4 {
                return Err(FluxError::MalformedMat(format!(
                    "small element claims {len} bytes"
                )));
            }
            let payload = self.take(4)?;
            return Ok((mdtype, &payload[..len]));
        }
        let len = self.read_u32()? as usize;
        let data = self.take(len)?;
        let padding = (8 - len % 8) % 8;
        self.pos = (self.pos + padding).min(self.buf.len());
        Ok((first, data))
    }

    /// Top-level elements are laid out back to back with no trailing padding.
    fn top_level_element(&mut self) -> Result<(u32, &'a [u8]), FluxError> {
        let mdtype = self.read_u32()?;
        let len = self.read_u32()? as usize;
        let data = self.take(len)?;
        Ok((mdtype, data))
    }

    /// Every nested value starts with its own tag, so `elements * per_element` values
    /// need at least that many tags in what is left of the container.
    fn expect_nested(&self, elements: usize, per_element: usize, name: &str) -> Result<(), FluxError> {
        let needed = elements
            .checked_mul(per_element)
            .and_then(|values| values.checked_mul(TAG_LEN));
        match needed {
            Some(needed) if needed <= self.remaining() => Ok(()),
            _ => Err(FluxError::MalformedMat(format!(
                "{name}: {elements} elements do not fit in {} remaining bytes",
                self.remaining()
            ))),
        }
    }

    fn matrix_element(&mut self, endian: Endian) -> Result<RawVariable, FluxError> {
        let (mdtype, data) = self.element()?;
        if mdtype != MI_MATRIX {
            return Err(FluxError::MalformedMat(format!(
                "expected nested miMATRIX, found type {mdtype}"
            )));
        }
        parse_matrix(data, endian)
    }
}
