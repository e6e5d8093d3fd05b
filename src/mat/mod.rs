//! MATLAB `.mat` loading into plain nested values.
//!
//! Arrays come back squeezed (unit axes dropped, 1x1 becomes a scalar), char
//! arrays become strings, 1x1 structs become ordered field maps, and struct or
//! cell arrays become lists. The conversion recurses through every level.

pub mod reader;

use std::path::Path;

use indexmap::IndexMap;
use ndarray::{ArrayD, IxDyn, ShapeBuilder};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use crate::error::FluxError;

pub use reader::{Endian, NumericClass, RawArray};

#[derive(Debug, Clone, PartialEq)]
pub struct MatArray {
    pub class: NumericClass,
    /// Dimensions as stored in the file, before squeezing.
    pub dims: Vec<usize>,
    pub data: ArrayD<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatValue {
    Array(MatArray),
    Text(String),
    Struct(IndexMap<String, MatValue>),
    List(Vec<MatValue>),
}

impl MatValue {
    pub fn from_raw(raw: RawArray) -> Result<Self, FluxError> {
        match raw {
            RawArray::Numeric { class, dims, data } => {
                let shape = squeeze_dims(&dims);
                let data = ArrayD::from_shape_vec(IxDyn(&shape).f(), data)
                    .map_err(|err| FluxError::MalformedMat(err.to_string()))?;
                Ok(MatValue::Array(MatArray { class, dims, data }))
            }
            RawArray::Char { dims, chars } => Ok(char_value(&dims, chars)),
            RawArray::Cell { items, .. } => Ok(MatValue::List(
                items
                    .into_iter()
                    .map(MatValue::from_raw)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            RawArray::Struct {
                dims,
                fields,
                elements,
            } => {
                let mut converted = elements
                    .into_iter()
                    .map(|values| struct_value(&fields, values))
                    .collect::<Result<Vec<_>, _>>()?;
                if dims.iter().all(|dim| *dim == 1) && converted.len() == 1 {
                    Ok(converted.remove(0))
                } else {
                    Ok(MatValue::List(converted))
                }
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MatValue::Array(array) => array.class.as_str(),
            MatValue::Text(_) => "char",
            MatValue::Struct(_) => "struct",
            MatValue::List(_) => "list",
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            MatValue::Array(array) => array.data.shape().to_vec(),
            MatValue::Text(text) => vec![text.chars().count()],
            MatValue::Struct(_) => Vec::new(),
            MatValue::List(items) => vec![items.len()],
        }
    }

    pub fn as_mat_array(&self) -> Option<&MatArray> {
        match self {
            MatValue::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayD<f64>> {
        match self {
            MatValue::Array(array) => Some(&array.data),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MatValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&MatValue> {
        match self {
            MatValue::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Follows a dotted path of struct fields and list indices, e.g. `sol.y.0`.
    pub fn lookup(&self, path: &str) -> Option<&MatValue> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |value, segment| match value {
                MatValue::Struct(fields) => fields.get(segment),
                MatValue::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            MatValue::Array(array) => match array.data.ndim() {
                0 => array
                    .data
                    .iter()
                    .next()
                    .map(|value| json!(value))
                    .unwrap_or(JsonValue::Null),
                1 => json!(array.data.iter().copied().collect::<Vec<f64>>()),
                _ => json!({
                    "class": array.class.as_str(),
                    "shape": array.data.shape(),
                    "data": array.data.iter().copied().collect::<Vec<f64>>(),
                }),
            },
            MatValue::Text(text) => json!(text),
            MatValue::Struct(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
            MatValue::List(items) => JsonValue::Array(items.iter().map(MatValue::to_json).collect()),
        }
    }
}

fn squeeze_dims(dims: &[usize]) -> Vec<usize> {
    dims.iter().copied().filter(|dim| *dim != 1).collect()
}

fn char_value(dims: &[usize], chars: Vec<char>) -> MatValue {
    let rows = dims.first().copied().unwrap_or(0);
    let count = dims
        .iter()
        .try_fold(1usize, |acc, dim| acc.checked_mul(*dim));
    if rows <= 1 || count != Some(chars.len()) {
        return MatValue::Text(chars.into_iter().collect());
    }
    let cols = chars.len() / rows;
    MatValue::List(
        (0..rows)
            .map(|row| MatValue::Text((0..cols).map(|col| chars[row + rows * col]).collect()))
            .collect(),
    )
}

fn struct_value(fields: &[String], values: Vec<RawArray>) -> Result<MatValue, FluxError> {
    let mut map = IndexMap::with_capacity(fields.len());
    for (name, raw) in fields.iter().zip(values) {
        map.insert(name.clone(), MatValue::from_raw(raw)?);
    }
    Ok(MatValue::Struct(map))
}

#[derive(Debug, Clone, Serialize)]
pub struct VariableSummary {
    pub name: String,
    pub kind: String,
    pub shape: Vec<usize>,
}

/// The variables of one `.mat` file, in file order.
#[derive(Debug, Clone)]
pub struct MatFile {
    description: String,
    variables: IndexMap<String, MatValue>,
}

impl MatFile {
    pub fn open(path: &Path) -> Result<Self, FluxError> {
        let bytes = std::fs::read(path)
            .map_err(|err| FluxError::Filesystem(format!("read {}: {err}", path.display())))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FluxError> {
        let (header, raw) = reader::read_variables(bytes)?;
        let mut variables = IndexMap::with_capacity(raw.len());
        for variable in raw {
            variables.insert(variable.name, MatValue::from_raw(variable.array)?);
        }
        Ok(Self {
            description: header.description,
            variables,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn get(&self, name: &str) -> Option<&MatValue> {
        self.variables.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// A numeric variable, or an error naming what was found instead.
    pub fn numeric(&self, name: &str, origin: &str) -> Result<&ArrayD<f64>, FluxError> {
        self.array(name, origin).map(|array| &array.data)
    }

    /// Like [`MatFile::numeric`], keeping the unsqueezed file dimensions.
    pub fn array(&self, name: &str, origin: &str) -> Result<&MatArray, FluxError> {
        let value = self.get(name).ok_or_else(|| FluxError::MissingVariable {
            path: origin.to_string(),
            name: name.to_string(),
        })?;
        value.as_mat_array().ok_or_else(|| FluxError::UnexpectedShape {
            name: name.to_string(),
            shape: value.shape(),
            message: format!("expected a numeric array, found {}", value.kind()),
        })
    }

    pub fn describe(&self) -> Vec<VariableSummary> {
        self.variables
            .iter()
            .map(|(name, value)| VariableSummary {
                name: name.clone(),
                kind: value.kind().to_string(),
                shape: value.shape(),
            })
            .collect()
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.variables
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}
