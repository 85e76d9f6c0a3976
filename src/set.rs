use crate::error::Error;
use crate::info::SlotMut;
use crate::platform::{Notify, Platform};
use crate::raw::ParamType;
use crate::resolve::Resolver;
use crate::value::{ParamValue, Vector3f};
use crate::ParamStore;
use core::any::Any;

pub trait Set<T> {
    fn set(&mut self, root: &mut dyn Any, name: &str, value: T) -> Result<(), Error>;
}

impl<T, S: Set<T>> Set<T> for &mut S {
    fn set(&mut self, root: &mut dyn Any, name: &str, value: T) -> Result<(), Error> {
        (*self).set(root, name, value)
    }
}

impl<T: Platform, N: Notify> ParamStore<T, N> {
    /// Assigns a value of exactly the declared type.
    pub(crate) fn set_value_by_name(
        &mut self,
        root: &mut dyn Any,
        name: &str,
        value: ParamValue,
    ) -> Result<(), Error> {
        let (token, type_) = self.find_any(root, name).ok_or(Error::NotFound)?;
        if type_ != value.param_type() || token.idx() != 0 {
            return Err(Error::TypeMismatch(type_));
        }
        let resolver = Resolver::new(self.vars);
        let path = resolver.path_of(token).ok_or(Error::NotFound)?;
        match resolver.slot_mut(root, &path) {
            Some(SlotMut::Param(param)) => {
                if param.set_value(value) {
                    Ok(())
                } else {
                    Err(Error::TypeMismatch(param.param_type()))
                }
            }
            Some(SlotMut::Group(_)) => Err(Error::TypeMismatch(ParamType::Group)),
            None => Err(Error::NotFound),
        }
    }

    /// Assigns a float to any scalar or vector component.
    pub(crate) fn set_float_by_name(
        &mut self,
        root: &mut dyn Any,
        name: &str,
        value: f32,
    ) -> Result<(), Error> {
        let (token, type_) = self.find_any(root, name).ok_or(Error::NotFound)?;
        if !type_.is_scalar() {
            return Err(Error::TypeMismatch(type_));
        }
        let resolver = Resolver::new(self.vars);
        let path = resolver.path_of(token).ok_or(Error::NotFound)?;
        match resolver.slot_mut(root, &path) {
            Some(SlotMut::Param(param)) => {
                match token.idx() {
                    0 => param.set_float(value),
                    idx => param.set_component(usize::from(idx - 1), value),
                }
                Ok(())
            }
            Some(SlotMut::Group(_)) => Err(Error::TypeMismatch(ParamType::Group)),
            None => Err(Error::NotFound),
        }
    }
}

impl<T: Platform, N: Notify> Set<i8> for ParamStore<T, N> {
    fn set(&mut self, root: &mut dyn Any, name: &str, value: i8) -> Result<(), Error> {
        self.set_value_by_name(root, name, ParamValue::Int8(value))
    }
}

impl<T: Platform, N: Notify> Set<i16> for ParamStore<T, N> {
    fn set(&mut self, root: &mut dyn Any, name: &str, value: i16) -> Result<(), Error> {
        self.set_value_by_name(root, name, ParamValue::Int16(value))
    }
}

impl<T: Platform, N: Notify> Set<i32> for ParamStore<T, N> {
    fn set(&mut self, root: &mut dyn Any, name: &str, value: i32) -> Result<(), Error> {
        self.set_value_by_name(root, name, ParamValue::Int32(value))
    }
}

/// Converted to the declared type of any scalar or vector component, see
/// [`Param::set_float`](crate::Param::set_float).
impl<T: Platform, N: Notify> Set<f32> for ParamStore<T, N> {
    fn set(&mut self, root: &mut dyn Any, name: &str, value: f32) -> Result<(), Error> {
        self.set_float_by_name(root, name, value)
    }
}

impl<T: Platform, N: Notify> Set<Vector3f> for ParamStore<T, N> {
    fn set(&mut self, root: &mut dyn Any, name: &str, value: Vector3f) -> Result<(), Error> {
        self.set_value_by_name(root, name, ParamValue::Vector3f(value))
    }
}
