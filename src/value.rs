//! Type erased parameter values and their payload encoding.

use crate::raw::ParamType;
use core::ops::{Index, IndexMut};

/// A three component float vector, e.g. an offset or a gain triple.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vector3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3f {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Bounds checked component access, out of range reads as 0.
    pub fn get(&self, i: usize) -> f32 {
        match i {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => 0.0,
        }
    }

    /// Bounds checked component access, out of range writes are discarded.
    pub fn set(&mut self, i: usize, v: f32) {
        match i {
            0 => self.x = v,
            1 => self.y = v,
            2 => self.z = v,
            _ => {}
        }
    }
}

impl Index<usize> for Vector3f {
    type Output = f32;

    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vector3f index out of range: {i}"),
        }
    }
}

impl IndexMut<usize> for Vector3f {
    fn index_mut(&mut self, i: usize) -> &mut f32 {
        match i {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("Vector3f index out of range: {i}"),
        }
    }
}

/// The current value of any storable parameter.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamValue {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Float(f32),
    Vector3f(Vector3f),
}

impl ParamValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Int8(_) => ParamType::Int8,
            ParamValue::Int16(_) => ParamType::Int16,
            ParamValue::Int32(_) => ParamType::Int32,
            ParamValue::Float(_) => ParamType::Float,
            ParamValue::Vector3f(_) => ParamType::Vector3f,
        }
    }

    /// Vectors have no single float representation and yield NaN.
    pub fn cast_to_float(&self) -> f32 {
        match *self {
            ParamValue::Int8(v) => f32::from(v),
            ParamValue::Int16(v) => f32::from(v),
            ParamValue::Int32(v) => v as f32,
            ParamValue::Float(v) => v,
            ParamValue::Vector3f(_) => f32::NAN,
        }
    }

    /// Little endian payload as stored after the record header. Returns the number of bytes used.
    pub(crate) fn encode(&self, buf: &mut [u8]) -> usize {
        match *self {
            ParamValue::Int8(v) => {
                buf[0] = v.cast_unsigned();
                1
            }
            ParamValue::Int16(v) => {
                buf[..2].copy_from_slice(&v.to_le_bytes());
                2
            }
            ParamValue::Int32(v) => {
                buf[..4].copy_from_slice(&v.to_le_bytes());
                4
            }
            ParamValue::Float(v) => {
                buf[..4].copy_from_slice(&v.to_le_bytes());
                4
            }
            ParamValue::Vector3f(v) => {
                buf[..4].copy_from_slice(&v.x.to_le_bytes());
                buf[4..8].copy_from_slice(&v.y.to_le_bytes());
                buf[8..12].copy_from_slice(&v.z.to_le_bytes());
                12
            }
        }
    }

    /// Decodes a payload of `type_`. `None` if the type carries no payload or `raw` is too short.
    pub(crate) fn decode(type_: ParamType, raw: &[u8]) -> Option<Self> {
        if raw.len() < type_.size() {
            return None;
        }
        let word = |at: usize| [raw[at], raw[at + 1], raw[at + 2], raw[at + 3]];
        match type_ {
            ParamType::Int8 => Some(ParamValue::Int8(raw[0].cast_signed())),
            ParamType::Int16 => Some(ParamValue::Int16(i16::from_le_bytes([raw[0], raw[1]]))),
            ParamType::Int32 => Some(ParamValue::Int32(i32::from_le_bytes(word(0)))),
            ParamType::Float => Some(ParamValue::Float(f32::from_le_bytes(word(0)))),
            ParamType::Vector3f => Some(ParamValue::Vector3f(Vector3f::new(
                f32::from_le_bytes(word(0)),
                f32::from_le_bytes(word(4)),
                f32::from_le_bytes(word(8)),
            ))),
            ParamType::None | ParamType::Group => None,
        }
    }
}
