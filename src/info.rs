//! Static description of every storable parameter.
//!
//! Owning structures describe their parameter fields in a `&'static [GroupInfo]` table, the
//! vehicle describes its top level objects in a `&'static [Info]` registry. Instead of raw byte
//! offsets each entry carries an [`Access`] pair of functions projecting the owning object onto
//! the field, generated by the macros in this module:
//!
//! ```
//! use ap_param::{Float, Int16, Info, GroupInfo, ParamGroup, group_info, var_group, var_info};
//!
//! #[derive(Default)]
//! struct Rotor {
//!     mode: Int16,
//!     setpoint: Float,
//! }
//!
//! impl ParamGroup for Rotor {
//!     const VAR_INFO: &'static [GroupInfo] = &[
//!         group_info!("MODE", 1, Rotor, mode: Int16, 1),
//!         group_info!("SETP", 2, Rotor, setpoint: Float, 70.0),
//!     ];
//! }
//!
//! #[derive(Default)]
//! struct Vehicle {
//!     format_version: Int16,
//!     rotor: Rotor,
//! }
//!
//! static VAR_INFO: &[Info] = &[
//!     var_info!("FORMAT_VERSION", 0, Vehicle, format_version: Int16, 12),
//!     var_group!("RSC", 1, Vehicle, rotor: Rotor),
//! ];
//! # assert_eq!(VAR_INFO.len(), 2);
//! ```

use crate::param::Param;
use crate::raw::ParamType;
use core::any::Any;

bitflags::bitflags! {
    /// Flags of a [`GroupInfo`] entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u8 {
        /// A sub-group embedded as a member of the owning structure instead of being one of its
        /// bases. It has no storage slot of its own.
        const NESTED_OFFSET = 0b001;
        /// A sub-group allocated separately and reached through an optional pointer. It is
        /// absent while the pointer is empty.
        const POINTER = 0b010;
        /// An enable switch. While it reads as zero the following entries of the same table are
        /// invisible.
        const ENABLE = 0b100;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Flags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Flags({=u8:#x})", self.bits())
    }
}

/// A parameter field or a sub-group resolved against its owning object.
pub enum Slot<'a> {
    Param(&'a dyn Param),
    Group(&'a dyn Any),
}

pub enum SlotMut<'a> {
    Param(&'a mut dyn Param),
    Group(&'a mut dyn Any),
}

/// Projects an owning object onto one of its fields. Both functions return `None` if the object
/// has an unexpected type or if the field is an empty pointer.
#[derive(Copy, Clone)]
pub struct Access {
    pub get: fn(&dyn Any) -> Option<Slot<'_>>,
    pub get_mut: fn(&mut dyn Any) -> Option<SlotMut<'_>>,
}

/// Either the compiled-in default of a value or the child table of a group.
#[derive(Copy, Clone)]
pub enum VarDef {
    Value(f32),
    /// The value defaults to zero.
    NoDefault,
    Group(&'static [GroupInfo]),
}

impl VarDef {
    /// The compiled-in default of a value, zero if there is none.
    pub fn default_value(&self) -> f32 {
        match *self {
            VarDef::Value(v) => v,
            VarDef::NoDefault | VarDef::Group(_) => 0.0,
        }
    }

    pub fn group(&self) -> Option<&'static [GroupInfo]> {
        match *self {
            VarDef::Group(table) => Some(table),
            _ => None,
        }
    }
}

/// An entry of a group table.
#[derive(Copy, Clone)]
pub struct GroupInfo {
    pub type_: ParamType,
    /// Identifier within the group, 1..=63. It becomes one digit of the
    /// [`GroupElement`](crate::GroupElement) and must never change once released.
    pub idx: u8,
    pub name: &'static str,
    pub access: Access,
    pub def: VarDef,
    pub flags: Flags,
}

/// An entry of the top level registry.
#[derive(Copy, Clone)]
pub struct Info {
    pub type_: ParamType,
    pub name: &'static str,
    /// Globally unique 9 bit key. It identifies the parameter on the storage and must never
    /// change once released.
    pub key: u16,
    /// Projects the vehicle (the root object) onto the entry.
    pub access: Access,
    pub def: VarDef,
}

/// A structure holding parameters.
pub trait ParamGroup: Any {
    const VAR_INFO: &'static [GroupInfo];
}

/// Holds the one-shot remapping of a parameter that moved. See
/// [`ParamStore::convert_old_parameters`](crate::ParamStore::convert_old_parameters).
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConversionInfo {
    pub old_key: u16,
    pub old_group_element: crate::token::GroupElement,
    pub type_: ParamType,
    pub new_name: &'static str,
}

#[doc(hidden)]
#[macro_export]
macro_rules! __param_access {
    ($owner:ty, $field:ident : $ty:ty) => {{
        fn get(object: &dyn ::core::any::Any) -> Option<$crate::Slot<'_>> {
            let owner = object.downcast_ref::<$owner>()?;
            let param: &$ty = &owner.$field;
            Some($crate::Slot::Param(param))
        }
        fn get_mut(object: &mut dyn ::core::any::Any) -> Option<$crate::SlotMut<'_>> {
            let owner = object.downcast_mut::<$owner>()?;
            let param: &mut $ty = &mut owner.$field;
            Some($crate::SlotMut::Param(param))
        }
        $crate::Access { get, get_mut }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __group_access {
    ($owner:ty, $field:ident : $ty:ty) => {{
        fn get(object: &dyn ::core::any::Any) -> Option<$crate::Slot<'_>> {
            let owner = object.downcast_ref::<$owner>()?;
            let group: &$ty = &owner.$field;
            Some($crate::Slot::Group(group))
        }
        fn get_mut(object: &mut dyn ::core::any::Any) -> Option<$crate::SlotMut<'_>> {
            let owner = object.downcast_mut::<$owner>()?;
            let group: &mut $ty = &mut owner.$field;
            Some($crate::SlotMut::Group(group))
        }
        $crate::Access { get, get_mut }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __pointer_access {
    ($owner:ty, $field:ident : $ty:ty) => {{
        fn get(object: &dyn ::core::any::Any) -> Option<$crate::Slot<'_>> {
            let owner = object.downcast_ref::<$owner>()?;
            let group: &$ty = owner.$field.as_deref()?;
            Some($crate::Slot::Group(group))
        }
        fn get_mut(object: &mut dyn ::core::any::Any) -> Option<$crate::SlotMut<'_>> {
            let owner = object.downcast_mut::<$owner>()?;
            let group: &mut $ty = owner.$field.as_deref_mut()?;
            Some($crate::SlotMut::Group(group))
        }
        $crate::Access { get, get_mut }
    }};
}

/// Declares a value entry of a group table: name, idx, owning type, `field: WrapperType`,
/// default and optional [`Flags`].
#[macro_export]
macro_rules! group_info {
    ($name:expr, $idx:expr, $owner:ty, $field:ident : $ty:ty, $def:expr) => {
        $crate::group_info!($name, $idx, $owner, $field: $ty, $def, $crate::Flags::empty())
    };
    ($name:expr, $idx:expr, $owner:ty, $field:ident : $ty:ty, $def:expr, $flags:expr) => {
        $crate::GroupInfo {
            type_: <$ty as $crate::ParamKind>::TYPE,
            idx: $idx,
            name: $name,
            access: $crate::__param_access!($owner, $field: $ty),
            def: $crate::VarDef::Value($def as f32),
            flags: $flags,
        }
    };
}

/// Declares a sub-group embedded as a member (`field: GroupType`) of the owning structure.
#[macro_export]
macro_rules! subgroup_info {
    ($name:expr, $idx:expr, $owner:ty, $field:ident : $ty:ty) => {
        $crate::GroupInfo {
            type_: $crate::ParamType::Group,
            idx: $idx,
            name: $name,
            access: $crate::__group_access!($owner, $field: $ty),
            def: $crate::VarDef::Group(<$ty as $crate::ParamGroup>::VAR_INFO),
            flags: $crate::Flags::NESTED_OFFSET,
        }
    };
}

/// Declares the parameters of a base structure (`field: BaseType`) as part of the owning
/// structure. The nesting has no name, so the parameters of the base appear directly under the
/// name of the owner.
#[macro_export]
macro_rules! nested_group_info {
    ($idx:expr, $owner:ty, $field:ident : $ty:ty) => {
        $crate::GroupInfo {
            type_: $crate::ParamType::Group,
            idx: $idx,
            name: "",
            access: $crate::__group_access!($owner, $field: $ty),
            def: $crate::VarDef::Group(<$ty as $crate::ParamGroup>::VAR_INFO),
            flags: $crate::Flags::empty(),
        }
    };
}

/// Declares a sub-group reached through an `Option<Box<GroupType>>` member. It is skipped while
/// the option is empty.
#[macro_export]
macro_rules! subgroup_ptr {
    ($name:expr, $idx:expr, $owner:ty, $field:ident : $ty:ty) => {
        $crate::GroupInfo {
            type_: $crate::ParamType::Group,
            idx: $idx,
            name: $name,
            access: $crate::__pointer_access!($owner, $field: $ty),
            def: $crate::VarDef::Group(<$ty as $crate::ParamGroup>::VAR_INFO),
            flags: $crate::Flags::POINTER,
        }
    };
}

/// Declares a top level value: name, key, root type, `field: WrapperType` and default.
#[macro_export]
macro_rules! var_info {
    ($name:expr, $key:expr, $root:ty, $field:ident : $ty:ty, $def:expr) => {
        $crate::Info {
            type_: <$ty as $crate::ParamKind>::TYPE,
            name: $name,
            key: $key,
            access: $crate::__param_access!($root, $field: $ty),
            def: $crate::VarDef::Value($def as f32),
        }
    };
}

/// Declares a top level object holding a group of parameters.
#[macro_export]
macro_rules! var_group {
    ($name:expr, $key:expr, $root:ty, $field:ident : $ty:ty) => {
        $crate::Info {
            type_: $crate::ParamType::Group,
            name: $name,
            key: $key,
            access: $crate::__group_access!($root, $field: $ty),
            def: $crate::VarDef::Group(<$ty as $crate::ParamGroup>::VAR_INFO),
        }
    };
}

/// Declares a top level object reached through an `Option<Box<GroupType>>` member of the root.
#[macro_export]
macro_rules! var_group_ptr {
    ($name:expr, $key:expr, $root:ty, $field:ident : $ty:ty) => {
        $crate::Info {
            type_: $crate::ParamType::Group,
            name: $name,
            key: $key,
            access: $crate::__pointer_access!($root, $field: $ty),
            def: $crate::VarDef::Group(<$ty as $crate::ParamGroup>::VAR_INFO),
        }
    };
}
