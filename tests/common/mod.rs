//! Builders for small level 5 MAT files used as test fixtures.
#![allow(dead_code)]

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;

pub const MI_INT8: u32 = 1;
pub const MI_INT32: u32 = 5;
pub const MI_UINT16: u32 = 4;
pub const MI_UINT32: u32 = 6;
pub const MI_DOUBLE: u32 = 9;
pub const MI_MATRIX: u32 = 14;
pub const MI_COMPRESSED: u32 = 15;
pub const MI_UTF8: u32 = 16;
pub const MI_UTF32: u32 = 18;

pub const MX_CELL: u32 = 1;
pub const MX_STRUCT: u32 = 2;
pub const MX_OBJECT: u32 = 3;
pub const MX_CHAR: u32 = 4;
pub const MX_SPARSE: u32 = 5;
pub const MX_DOUBLE: u32 = 6;

const FLAG_COMPLEX: u32 = 0x0800;
const FIELD_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Little,
    Big,
}

impl Order {
    fn u32(self, value: u32) -> [u8; 4] {
        match self {
            Order::Little => value.to_le_bytes(),
            Order::Big => value.to_be_bytes(),
        }
    }

    fn i32(self, value: i32) -> [u8; 4] {
        match self {
            Order::Little => value.to_le_bytes(),
            Order::Big => value.to_be_bytes(),
        }
    }

    fn f64(self, value: f64) -> [u8; 8] {
        match self {
            Order::Little => value.to_le_bytes(),
            Order::Big => value.to_be_bytes(),
        }
    }

    fn u16(self, value: u16) -> [u8; 2] {
        match self {
            Order::Little => value.to_le_bytes(),
            Order::Big => value.to_be_bytes(),
        }
    }
}

pub fn element_in(order: Order, mdtype: u32, data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(data.len() + 16);
    bytes.extend_from_slice(&order.u32(mdtype));
    bytes.extend_from_slice(&order.u32(data.len() as u32));
    bytes.extend_from_slice(data);
    while bytes.len() % 8 != 0 {
        bytes.push(0);
    }
    bytes
}

pub fn element(mdtype: u32, data: &[u8]) -> Vec<u8> {
    element_in(Order::Little, mdtype, data)
}

/// A matrix element with raw `dims`, which may be larger than `body` can hold.
pub fn matrix_in(order: Order, name: &str, flags: u32, dims: &[i32], body: &[u8]) -> Vec<u8> {
    let mut flag_bytes = Vec::new();
    flag_bytes.extend_from_slice(&order.u32(flags));
    flag_bytes.extend_from_slice(&order.u32(0));

    let dims: Vec<u8> = dims.iter().flat_map(|dim| order.i32(*dim)).collect();

    let mut content = element_in(order, MI_UINT32, &flag_bytes);
    content.extend(element_in(order, MI_INT32, &dims));
    content.extend(element_in(order, MI_INT8, name.as_bytes()));
    content.extend_from_slice(body);
    element_in(order, MI_MATRIX, &content)
}

fn matrix(name: &str, class: u32, dims: &[usize], body: &[u8]) -> Vec<u8> {
    let dims: Vec<i32> = dims.iter().map(|dim| *dim as i32).collect();
    matrix_in(Order::Little, name, class, &dims, body)
}

fn column_major(order: Order, rows: usize, cols: usize, row_major: &[f64]) -> Vec<u8> {
    assert_eq!(row_major.len(), rows * cols);
    let mut data = Vec::with_capacity(row_major.len() * 8);
    for col in 0..cols {
        for row in 0..rows {
            data.extend_from_slice(&order.f64(row_major[row * cols + col]));
        }
    }
    data
}

/// A double matrix given in row-major order, stored column-major as MATLAB does.
pub fn double_matrix_in(
    order: Order,
    name: &str,
    rows: usize,
    cols: usize,
    row_major: &[f64],
) -> Vec<u8> {
    let data = column_major(order, rows, cols, row_major);
    matrix_in(
        order,
        name,
        MX_DOUBLE,
        &[rows as i32, cols as i32],
        &element_in(order, MI_DOUBLE, &data),
    )
}

pub fn double_matrix(name: &str, rows: usize, cols: usize, row_major: &[f64]) -> Vec<u8> {
    double_matrix_in(Order::Little, name, rows, cols, row_major)
}

/// A complex double row vector; the imaginary part follows the real part.
pub fn complex_row(name: &str, real: &[f64], imag: &[f64]) -> Vec<u8> {
    let encode = |values: &[f64]| -> Vec<u8> {
        values.iter().flat_map(|value| value.to_le_bytes()).collect()
    };
    let mut body = element(MI_DOUBLE, &encode(real));
    body.extend(element(MI_DOUBLE, &encode(imag)));
    matrix(name, MX_DOUBLE | FLAG_COMPLEX, &[1, real.len()], &body)
}

/// A sparse matrix header; the decoder rejects it before reading the index arrays.
pub fn sparse(name: &str, rows: usize, cols: usize) -> Vec<u8> {
    let body = element(MI_INT32, &0i32.to_le_bytes());
    matrix(name, MX_SPARSE, &[rows, cols], &body)
}

pub fn scalar(name: &str, value: f64) -> Vec<u8> {
    double_matrix(name, 1, 1, &[value])
}

pub fn text_in(order: Order, name: &str, value: &str) -> Vec<u8> {
    let units: Vec<u8> = value
        .encode_utf16()
        .flat_map(|unit| order.u16(unit))
        .collect();
    matrix_in(
        order,
        name,
        MX_CHAR,
        &[1, value.encode_utf16().count() as i32],
        &element_in(order, MI_UINT16, &units),
    )
}

pub fn text(name: &str, value: &str) -> Vec<u8> {
    text_in(Order::Little, name, value)
}

/// A 1-row char array whose characters are stored as `miUTF8`.
pub fn utf8_text(name: &str, value: &str) -> Vec<u8> {
    matrix(
        name,
        MX_CHAR,
        &[1, value.chars().count()],
        &element(MI_UTF8, value.as_bytes()),
    )
}

/// A 1-row char array whose characters are stored as `miUTF32`.
pub fn utf32_text(name: &str, value: &str) -> Vec<u8> {
    let points: Vec<u8> = value
        .chars()
        .flat_map(|ch| (ch as u32).to_le_bytes())
        .collect();
    matrix(
        name,
        MX_CHAR,
        &[1, value.chars().count()],
        &element(MI_UTF32, &points),
    )
}

fn field_names(fields: &[&str]) -> Vec<u8> {
    let mut body = element(MI_INT32, &(FIELD_LEN as i32).to_le_bytes());
    let mut names = Vec::with_capacity(fields.len() * FIELD_LEN);
    for field in fields {
        let mut padded = field.as_bytes().to_vec();
        padded.resize(FIELD_LEN, 0);
        names.extend(padded);
    }
    body.extend(element(MI_INT8, &names));
    body
}

fn field_values(fields: &[&str], elements: &[Vec<Vec<u8>>]) -> Vec<u8> {
    let mut body = Vec::new();
    for values in elements {
        assert_eq!(values.len(), fields.len());
        for value in values {
            body.extend_from_slice(value);
        }
    }
    body
}

/// A struct array; every element supplies one nested matrix (with an empty name) per field.
pub fn struct_array(name: &str, fields: &[&str], elements: &[Vec<Vec<u8>>]) -> Vec<u8> {
    let mut body = field_names(fields);
    body.extend(field_values(fields, elements));
    matrix(name, MX_STRUCT, &[1, elements.len()], &body)
}

/// A struct array with arbitrary claimed dimensions and no fields.
pub fn fieldless_struct(name: &str, dims: &[i32]) -> Vec<u8> {
    matrix_in(Order::Little, name, MX_STRUCT, dims, &field_names(&[]))
}

/// A 1x1 MATLAB object: a struct preceded by its class name.
pub fn object(name: &str, class_name: &str, fields: &[&str], values: Vec<Vec<u8>>) -> Vec<u8> {
    let mut body = element(MI_INT8, class_name.as_bytes());
    body.extend(field_names(fields));
    body.extend(field_values(fields, &[values]));
    matrix(name, MX_OBJECT, &[1, 1], &body)
}

pub fn cell(name: &str, items: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = items.iter().flatten().copied().collect();
    matrix(name, MX_CELL, &[1, items.len()], &body)
}

pub fn compressed(matrix_element: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(matrix_element).unwrap();
    let deflated = encoder.finish().unwrap();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&MI_COMPRESSED.to_le_bytes());
    bytes.extend_from_slice(&(deflated.len() as u32).to_le_bytes());
    bytes.extend(deflated);
    bytes
}

pub fn mat_file_in(order: Order, variables: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = b"MATLAB 5.0 MAT-file, Platform: GLNXA64, Created on: test fixture".to_vec();
    bytes.resize(116, b' ');
    bytes.extend_from_slice(&[0u8; 8]);
    bytes.extend_from_slice(&order.u16(0x0100));
    bytes.extend_from_slice(match order {
        Order::Little => b"IM",
        Order::Big => b"MI",
    });
    for variable in variables {
        bytes.extend_from_slice(variable);
    }
    bytes
}

pub fn mat_file(variables: &[Vec<u8>]) -> Vec<u8> {
    mat_file_in(Order::Little, variables)
}

/// A level 4 file: a 20-byte matrix header with no 128-byte text header.
pub fn level4_file() -> Vec<u8> {
    let mut bytes = Vec::new();
    // type 0 (little-endian double, full matrix), 1 row, 1 column, no imaginary part, name "x\0"
    for word in [0i32, 1, 1, 0, 2] {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    bytes.extend_from_slice(b"x\0");
    bytes.extend_from_slice(&3.0f64.to_le_bytes());
    bytes.resize(160, 0);
    bytes
}
