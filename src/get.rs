//! The `Get<T>` trait and its implementation in this module allows providing a single generic,
//! overloaded function `get<T>()` for all supported parameter types.

use crate::error::Error;
use crate::platform::{Notify, Platform};
use crate::raw::ParamType;
use crate::value::{ParamValue, Vector3f};
use crate::ParamStore;
use core::any::Any;

pub trait Get<T> {
    fn get(&self, root: &dyn Any, name: &str) -> Result<T, Error>;
}

impl<T, G: Get<T>> Get<T> for &G {
    fn get(&self, root: &dyn Any, name: &str) -> Result<T, Error> {
        (**self).get(root, name)
    }
}

impl<T, G: Get<T>> Get<T> for &mut G {
    fn get(&self, root: &dyn Any, name: &str) -> Result<T, Error> {
        (**self).get(root, name)
    }
}

impl<T: Platform, N: Notify> ParamStore<T, N> {
    pub(crate) fn get_by_name(&self, root: &dyn Any, name: &str) -> Result<ParamValue, Error> {
        let (token, _) = self.find_any(root, name).ok_or(Error::NotFound)?;
        self.value(root, token)
    }
}

impl<T: Platform, N: Notify> Get<i8> for ParamStore<T, N> {
    fn get(&self, root: &dyn Any, name: &str) -> Result<i8, Error> {
        match self.get_by_name(root, name)? {
            ParamValue::Int8(v) => Ok(v),
            other => Err(Error::TypeMismatch(other.param_type())),
        }
    }
}

impl<T: Platform, N: Notify> Get<i16> for ParamStore<T, N> {
    fn get(&self, root: &dyn Any, name: &str) -> Result<i16, Error> {
        match self.get_by_name(root, name)? {
            ParamValue::Int16(v) => Ok(v),
            other => Err(Error::TypeMismatch(other.param_type())),
        }
    }
}

impl<T: Platform, N: Notify> Get<i32> for ParamStore<T, N> {
    fn get(&self, root: &dyn Any, name: &str) -> Result<i32, Error> {
        match self.get_by_name(root, name)? {
            ParamValue::Int32(v) => Ok(v),
            other => Err(Error::TypeMismatch(other.param_type())),
        }
    }
}

/// Any scalar or vector component, cast to a float.
impl<T: Platform, N: Notify> Get<f32> for ParamStore<T, N> {
    fn get(&self, root: &dyn Any, name: &str) -> Result<f32, Error> {
        match self.get_by_name(root, name)? {
            ParamValue::Vector3f(_) => Err(Error::TypeMismatch(ParamType::Vector3f)),
            other => Ok(other.cast_to_float()),
        }
    }
}

impl<T: Platform, N: Notify> Get<Vector3f> for ParamStore<T, N> {
    fn get(&self, root: &dyn Any, name: &str) -> Result<Vector3f, Error> {
        match self.get_by_name(root, name)? {
            ParamValue::Vector3f(v) => Ok(v),
            other => Err(Error::TypeMismatch(other.param_type())),
        }
    }
}
