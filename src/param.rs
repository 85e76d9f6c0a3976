//! Typed parameter wrappers embedded directly into the structures that own them.
//!
//! A structure declares its parameters as fields of these types and describes them once in a
//! static table (see [`GroupInfo`](crate::GroupInfo)). The wrappers behave like their value in
//! most places:
//!
//! ```
//! use ap_param::{Float, Int16};
//!
//! let mut gain = Float::new(0.5);
//! let mut mode = Int16::new(1);
//! mode |= 4;
//! assert_eq!(*gain * 2.0, 1.0);
//! assert_eq!(*mode, 5);
//! gain.set(0.25);
//! assert_eq!(gain.cast_to_float(), 0.25);
//! ```

use crate::error::Error;
use crate::platform::{Notify, Platform};
use crate::raw::ParamType;
use crate::token::Token;
use crate::value::{ParamValue, Vector3f};
use crate::ParamStore;
use core::ops::{AddAssign, BitAndAssign, BitOrAssign, Deref, SubAssign};

/// Object safe view of a parameter slot, used by the engine to read and write values of any type.
pub trait Param {
    fn param_type(&self) -> ParamType;

    fn value(&self) -> ParamValue;

    /// Assigns `value` if it has the same type as the parameter. Returns whether it was assigned.
    fn set_value(&mut self, value: ParamValue) -> bool;

    /// Assigns a float, converting it to the parameter type. Integers are truncated after a 0.01
    /// bias away from zero, values that don't fit are silently ignored.
    fn set_float(&mut self, value: f32);

    fn cast_to_float(&self) -> f32 {
        self.value().cast_to_float()
    }

    /// Component `idx` of an aggregate value. Scalars have no components.
    fn component(&self, _idx: usize) -> Option<f32> {
        None
    }

    fn set_component(&mut self, _idx: usize, _value: f32) {}
}

/// The type tag of a wrapper type, used by the declaration macros.
pub trait ParamKind {
    const TYPE: ParamType;
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for i8 {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
}

/// Numeric types that can be stored as a scalar parameter.
pub trait ScalarType: sealed::Sealed + Copy + PartialEq + PartialOrd + 'static {
    const TYPE: ParamType;

    fn into_value(self) -> ParamValue;

    fn from_value(value: ParamValue) -> Option<Self>;

    fn to_float(self) -> f32;

    /// `None` if `value` is out of range for the type.
    fn from_float(value: f32) -> Option<Self>;
}

/// Nudges a float away from zero before truncation so that values like 2.9999 end up as 3.
#[inline(always)]
fn round_for_int(value: f32, min: f32, max: f32) -> Option<f32> {
    let value = if value < 0.0 { value - 0.01 } else { value + 0.01 };
    if value.is_nan() || value < min - 0.5 || value > max + 0.5 {
        return None;
    }
    Some(value)
}

macro_rules! impl_scalar_int {
    ($t:ty, $variant:ident) => {
        impl ScalarType for $t {
            const TYPE: ParamType = ParamType::$variant;

            fn into_value(self) -> ParamValue {
                ParamValue::$variant(self)
            }

            fn from_value(value: ParamValue) -> Option<Self> {
                match value {
                    ParamValue::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn to_float(self) -> f32 {
                self as f32
            }

            fn from_float(value: f32) -> Option<Self> {
                round_for_int(value, <$t>::MIN as f32, <$t>::MAX as f32).map(|v| v as $t)
            }
        }
    };
}

impl_scalar_int!(i8, Int8);
impl_scalar_int!(i16, Int16);
impl_scalar_int!(i32, Int32);

impl ScalarType for f32 {
    const TYPE: ParamType = ParamType::Float;

    fn into_value(self) -> ParamValue {
        ParamValue::Float(self)
    }

    fn from_value(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::Float(v) => Some(v),
            _ => None,
        }
    }

    fn to_float(self) -> f32 {
        self
    }

    fn from_float(value: f32) -> Option<Self> {
        Some(value)
    }
}

/// A numeric parameter.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Scalar<T>(T);

pub type Int8 = Scalar<i8>;
pub type Int16 = Scalar<i16>;
pub type Int32 = Scalar<i32>;
pub type Float = Scalar<f32>;

impl<T: ScalarType> Scalar<T> {
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    pub fn get(&self) -> T {
        self.0
    }

    pub fn set(&mut self, value: T) {
        self.0 = value;
    }

    pub fn cast_to_float(&self) -> f32 {
        self.0.to_float()
    }

    /// Set the value and tell the ground station.
    pub fn set_and_notify<P: Platform, N: Notify>(
        &mut self,
        value: T,
        store: &mut ParamStore<P, N>,
        token: Token,
    ) {
        self.set(value);
        store.notify_param(token, self);
    }

    /// Set the value and write it to the storage. Setting the value it already has forces the
    /// write even if it equals the default.
    pub fn set_and_save<P: Platform, N: Notify>(
        &mut self,
        value: T,
        store: &mut ParamStore<P, N>,
        token: Token,
    ) -> Result<(), Error> {
        let force = self.0 == value;
        self.set(value);
        store.save_param(token, self, force)
    }

    /// Like [`Self::set_and_save`] but skips the storage scan entirely if the value didn't change.
    /// Only use this if the value wasn't `set()` separately before, otherwise the storage is never
    /// updated.
    pub fn set_and_save_ifchanged<P: Platform, N: Notify>(
        &mut self,
        value: T,
        store: &mut ParamStore<P, N>,
        token: Token,
    ) -> Result<(), Error> {
        if self.0 == value {
            return Ok(());
        }
        self.set(value);
        store.save_param(token, self, true)
    }

    /// Set the value unless the parameter is configured in the storage or the defaults text.
    pub fn set_default<P: Platform, N: Notify>(
        &mut self,
        value: T,
        store: &mut ParamStore<P, N>,
        token: Token,
    ) -> Result<(), Error> {
        if !store.configured(token)? {
            self.set(value);
        }
        Ok(())
    }
}

impl<T: ScalarType> ParamKind for Scalar<T> {
    const TYPE: ParamType = T::TYPE;
}

impl<T: ScalarType> Param for Scalar<T> {
    fn param_type(&self) -> ParamType {
        T::TYPE
    }

    fn value(&self) -> ParamValue {
        self.0.into_value()
    }

    fn set_value(&mut self, value: ParamValue) -> bool {
        match T::from_value(value) {
            Some(v) => {
                self.0 = v;
                true
            }
            None => false,
        }
    }

    fn set_float(&mut self, value: f32) {
        if let Some(v) = T::from_float(value) {
            self.0 = v;
        }
    }

    fn cast_to_float(&self) -> f32 {
        self.0.to_float()
    }
}

impl<T> Deref for Scalar<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ScalarType> From<T> for Scalar<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T: AddAssign> AddAssign<T> for Scalar<T> {
    fn add_assign(&mut self, rhs: T) {
        self.0 += rhs;
    }
}

impl<T: SubAssign> SubAssign<T> for Scalar<T> {
    fn sub_assign(&mut self, rhs: T) {
        self.0 -= rhs;
    }
}

impl<T: BitOrAssign> BitOrAssign<T> for Scalar<T> {
    fn bitor_assign(&mut self, rhs: T) {
        self.0 |= rhs;
    }
}

impl<T: BitAndAssign> BitAndAssign<T> for Scalar<T> {
    fn bitand_assign(&mut self, rhs: T) {
        self.0 &= rhs;
    }
}

/// A non-numeric parameter of fixed size.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[repr(transparent)]
pub struct Value<T>(T);

pub type Vector3 = Value<Vector3f>;

impl<T: Copy + PartialEq> Value<T> {
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    pub fn get(&self) -> T {
        self.0
    }

    pub fn set(&mut self, value: T) {
        self.0 = value;
    }
}

impl Value<Vector3f> {
    /// Set the value and write it to the storage. A changed value forces the write even if it
    /// equals the default.
    pub fn set_and_save<P: Platform, N: Notify>(
        &mut self,
        value: Vector3f,
        store: &mut ParamStore<P, N>,
        token: Token,
    ) -> Result<(), Error> {
        let force = self.0 != value;
        self.set(value);
        store.save_param(token, self, force)
    }
}

impl ParamKind for Value<Vector3f> {
    const TYPE: ParamType = ParamType::Vector3f;
}

impl Param for Value<Vector3f> {
    fn param_type(&self) -> ParamType {
        ParamType::Vector3f
    }

    fn value(&self) -> ParamValue {
        ParamValue::Vector3f(self.0)
    }

    fn set_value(&mut self, value: ParamValue) -> bool {
        match value {
            ParamValue::Vector3f(v) => {
                self.0 = v;
                true
            }
            _ => false,
        }
    }

    fn set_float(&mut self, value: f32) {
        self.0 = Vector3f::splat(value);
    }

    fn component(&self, idx: usize) -> Option<f32> {
        (idx < 3).then(|| self.0.get(idx))
    }

    fn set_component(&mut self, idx: usize, value: f32) {
        self.0.set(idx, value);
    }
}

impl<T> Deref for Value<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Copy + PartialEq> From<T> for Value<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

/// A fixed length sequence of values with bounds checked access. It is not a parameter and has
/// no record of its own.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Array<T, const N: usize>([T; N]);

impl<T: Copy + Default, const N: usize> Array<T, N> {
    pub const fn new(values: [T; N]) -> Self {
        Self(values)
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Out of range indices read as the default value of `T`.
    pub fn get(&self, i: usize) -> T {
        self.0.get(i).copied().unwrap_or_default()
    }

    /// Out of range indices are discarded.
    pub fn set(&mut self, i: usize, value: T) {
        if let Some(slot) = self.0.get_mut(i) {
            *slot = value;
        }
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T: Copy + Default, const N: usize> Default for Array<T, N> {
    fn default() -> Self {
        Self([T::default(); N])
    }
}

impl<T, const N: usize> Deref for Array<T, N> {
    type Target = [T; N];

    fn deref(&self) -> &[T; N] {
        &self.0
    }
}
