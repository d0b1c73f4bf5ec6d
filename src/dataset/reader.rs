//! Typed reads over the `netcdf` crate's `Variable` and `Attribute` API.
//!
//! Numeric variables of any integer or float type are widened to `f64`;
//! `_FillValue` and `missing_value` become NaN. Text comes from `NC_CHAR`
//! variables (one row per leading index) or string attributes.

use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::{AttributeValue, Variable};

use super::DecodeError;

/// Element count implied by the variable's dimensions, `None` on overflow.
pub(crate) fn element_count(var: &Variable<'_>) -> Option<usize> {
    var.dimensions()
        .iter()
        .try_fold(1usize, |acc, dim| acc.checked_mul(dim.len()))
}

fn widen<T: Into<f64>>(values: Vec<T>) -> Vec<f64> {
    values.into_iter().map(Into::into).collect()
}

fn read_f64(var: &Variable<'_>, name: &'static str) -> Result<Vec<f64>, DecodeError> {
    let values = match var.vartype() {
        NcVariableType::Float(FloatType::F64) => var.get_values::<f64, _>(..)?,
        NcVariableType::Float(FloatType::F32) => widen(var.get_values::<f32, _>(..)?),
        NcVariableType::Int(IntType::I8) => widen(var.get_values::<i8, _>(..)?),
        NcVariableType::Int(IntType::U8) => widen(var.get_values::<u8, _>(..)?),
        NcVariableType::Int(IntType::I16) => widen(var.get_values::<i16, _>(..)?),
        NcVariableType::Int(IntType::U16) => widen(var.get_values::<u16, _>(..)?),
        NcVariableType::Int(IntType::I32) => widen(var.get_values::<i32, _>(..)?),
        NcVariableType::Int(IntType::U32) => widen(var.get_values::<u32, _>(..)?),
        NcVariableType::Int(IntType::I64) => var
            .get_values::<i64, _>(..)?
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        NcVariableType::Int(IntType::U64) => var
            .get_values::<u64, _>(..)?
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        other => {
            return Err(DecodeError::UnsupportedType {
                name,
                found: format!("{other:?}"),
            })
        }
    };
    Ok(values)
}

/// Read a numeric variable, masking `_FillValue` / `missing_value` to NaN.
pub(crate) fn read_masked(var: &Variable<'_>, name: &'static str) -> Result<Vec<f64>, DecodeError> {
    let mut values = read_f64(var, name)?;
    for attr in ["_FillValue", "missing_value"] {
        let fill = var
            .attribute(attr)
            .and_then(|a| a.value().ok())
            .and_then(|v| first_f64(&v));
        if let Some(fill) = fill {
            values
                .iter_mut()
                .filter(|v| **v == fill)
                .for_each(|v| *v = f64::NAN);
        }
    }
    Ok(values)
}

/// Rows of a 2-D `NC_CHAR` variable, trimmed. `None` for any other type.
pub(crate) fn read_char_rows(var: &Variable<'_>) -> Option<Vec<String>> {
    if !matches!(var.vartype(), NcVariableType::Char) {
        return None;
    }
    let width = var.dimensions().last()?.len();
    let raw = var.get_raw_values(..).ok()?;
    Some(split_rows(&raw, width))
}

pub(crate) fn split_rows(raw: &[u8], width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    raw.chunks(width).map(trim_text).collect()
}

fn trim_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

/// First element of a numeric attribute.
pub(crate) fn first_f64(value: &AttributeValue) -> Option<f64> {
    match value {
        AttributeValue::Uchar(v) => Some(f64::from(*v)),
        AttributeValue::Uchars(v) => v.first().map(|x| f64::from(*x)),
        AttributeValue::Schar(v) => Some(f64::from(*v)),
        AttributeValue::Schars(v) => v.first().map(|x| f64::from(*x)),
        AttributeValue::Ushort(v) => Some(f64::from(*v)),
        AttributeValue::Ushorts(v) => v.first().map(|x| f64::from(*x)),
        AttributeValue::Short(v) => Some(f64::from(*v)),
        AttributeValue::Shorts(v) => v.first().map(|x| f64::from(*x)),
        AttributeValue::Uint(v) => Some(f64::from(*v)),
        AttributeValue::Uints(v) => v.first().map(|x| f64::from(*x)),
        AttributeValue::Int(v) => Some(f64::from(*v)),
        AttributeValue::Ints(v) => v.first().map(|x| f64::from(*x)),
        AttributeValue::Ulonglong(v) => Some(*v as f64),
        AttributeValue::Ulonglongs(v) => v.first().map(|x| *x as f64),
        AttributeValue::Longlong(v) => Some(*v as f64),
        AttributeValue::Longlongs(v) => v.first().map(|x| *x as f64),
        AttributeValue::Float(v) => Some(f64::from(*v)),
        AttributeValue::Floats(v) => v.first().map(|x| f64::from(*x)),
        AttributeValue::Double(v) => Some(*v),
        AttributeValue::Doubles(v) => v.first().copied(),
        _ => None,
    }
}

/// Text of a string attribute, trimmed of padding.
pub(crate) fn text(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::Str(s) => Some(trim_text(s.as_bytes())),
        AttributeValue::Strs(v) => v.first().map(|s| trim_text(s.as_bytes())),
        _ => None,
    }
}
