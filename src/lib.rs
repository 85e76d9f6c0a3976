//! Schema driven parameter registry persisted to a small byte addressable storage.
//!
//! Parameters live as typed fields ([`Int8`], [`Int16`], [`Int32`], [`Float`], [`Vector3`])
//! inside ordinary structures. Static tables ([`Info`], [`GroupInfo`]) describe them: a stable
//! 9 bit key per top level object and a 6 bit index per nesting level. The [`ParamStore`]
//! persists the values as a list of packed records behind a 4 byte format header and looks
//! them up by [`Token`] or by their joined name.
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

pub mod error;
mod check;
mod convert;
mod defaults;
mod get;
mod info;
mod internal;
mod iter;
mod param;
pub mod platform;
mod raw;
mod resolve;
mod set;
mod show;
mod token;
mod value;

extern crate alloc;

pub use defaults::{set_object_value, setup_object_defaults};
pub use error::Error;
pub use get::Get;
pub use info::{Access, ConversionInfo, Flags, GroupInfo, Info, ParamGroup, Slot, SlotMut, VarDef};
pub use param::{
    Array, Float, Int8, Int16, Int32, Param, ParamKind, Scalar, ScalarType, Value, Vector3,
};
pub use platform::{Notify, Platform};
pub use raw::ParamType;
pub use set::Set;
pub use token::{GroupElement, MAX_GROUP_DEPTH, MAX_GROUP_INDEX, Token};
pub use value::{ParamValue, Vector3f};

use crate::defaults::Override;
use crate::iter::Walker;
use crate::raw::{EEPROM_HEADER_SIZE, PARAM_HEADER_SIZE};
use crate::resolve::{Path, Resolver};
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

/// Longest parameter name including all group prefixes and separators.
pub const MAX_NAME_SIZE: usize = 16;

/// A formatted parameter name, silently truncated to [`MAX_NAME_SIZE`] bytes.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name {
    buf: [u8; MAX_NAME_SIZE],
    len: u8,
}

impl Name {
    pub const fn empty() -> Self {
        Self {
            buf: [0; MAX_NAME_SIZE],
            len: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        // only whole characters are ever copied in
        core::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    pub const fn len(&self) -> usize {
        self.len as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Name {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str())
    }
}

/// The ParamStore owns the storage region and the registry. Parameter values are not held by
/// the store: every operation touching values takes the root object (the vehicle) that the
/// registry describes, so the firmware keeps using its fields directly.
pub struct ParamStore<T: Platform, N: Notify = ()> {
    pub(crate) hal: T,
    pub(crate) base_address: usize,
    pub(crate) size: usize,
    pub(crate) vars: &'static [Info],
    pub(crate) notify: N,
    pub(crate) initialised: bool,

    // set by load_defaults
    pub(crate) overrides: Vec<Override>,
}

impl<T: Platform> ParamStore<T, ()> {
    /// Checks the registry and opens the storage region `[offset, offset + size)` of `hal`.
    ///
    /// A region without the expected format header, e.g. a blank device or one written by an
    /// incompatible firmware, is erased and reinitialised. All previously stored values are lost
    /// in that case.
    pub fn new(
        vars: &'static [Info],
        offset: usize,
        size: usize,
        hal: T,
    ) -> Result<ParamStore<T, ()>, Error> {
        Self::new_with_notify(vars, offset, size, hal, ())
    }
}

impl<T: Platform, N: Notify> ParamStore<T, N> {
    /// Like [`ParamStore::new`] but reports saved parameters to `notify`.
    pub fn new_with_notify(
        vars: &'static [Info],
        offset: usize,
        size: usize,
        hal: T,
        notify: N,
    ) -> Result<ParamStore<T, N>, Error> {
        let capacity = hal.capacity();
        if offset >= capacity {
            return Err(Error::InvalidStorageOffset);
        }
        if size < EEPROM_HEADER_SIZE + PARAM_HEADER_SIZE || size > capacity - offset {
            return Err(Error::InvalidStorageSize);
        }
        if offset + size > u32::MAX as usize {
            return Err(Error::InvalidStorageOffset);
        }

        check::check_var_info(vars)?;

        let mut store = Self {
            hal,
            base_address: offset,
            size,
            vars,
            notify,
            initialised: false,
            overrides: Vec::new(),
        };
        store.setup()?;
        Ok(store)
    }

    /// True once the storage holds a valid format header.
    pub fn initialised(&self) -> bool {
        self.initialised
    }

    pub fn vars(&self) -> &'static [Info] {
        self.vars
    }

    /// Get a parameter value by its full name.
    ///
    /// Supported types are i8, i16, i32, Vector3f (which must match the declared type) and f32
    /// (which accepts any scalar and vector components).
    pub fn get<R>(&self, root: &dyn Any, name: &str) -> Result<R, Error>
    where
        ParamStore<T, N>: Get<R>,
    {
        Get::get(self, root, name)
    }

    /// Set a parameter value by its full name. The storage is not touched, see
    /// [`ParamStore::set_and_save`].
    pub fn set<R>(&mut self, root: &mut dyn Any, name: &str, value: R) -> Result<(), Error>
    where
        ParamStore<T, N>: Set<R>,
    {
        Set::set(self, root, name, value)
    }

    /// Set a parameter value by its full name and write it to the storage.
    pub fn set_and_save<R>(&mut self, root: &mut dyn Any, name: &str, value: R) -> Result<(), Error>
    where
        ParamStore<T, N>: Set<R>,
    {
        Set::set(self, root, name, value)?;
        let (token, _) = self.find_any(root, name).ok_or(Error::NotFound)?;
        self.save(root, token, true)
    }

    /// Position of the first parameter, `None` if nothing is reachable.
    pub fn first(&self, root: &dyn Any) -> Option<(Token, ParamType)> {
        let walker = Walker::visible(self.vars);
        walker
            .first(root)
            .map(|(path, idx)| self.position(&walker, &path, idx))
    }

    /// Position following `token` in depth first order: groups before their children, vectors
    /// before their components. `None` once the tree is exhausted or if `token` doesn't resolve.
    pub fn next(&self, root: &dyn Any, token: Token) -> Option<(Token, ParamType)> {
        let walker = Walker::visible(self.vars);
        let path = Resolver::new(self.vars).path_of(token)?;
        walker
            .next(root, path, token.idx())
            .map(|(path, idx)| self.position(&walker, &path, idx))
    }

    /// Like [`ParamStore::next`] but skips groups and whole vectors.
    pub fn next_scalar(&self, root: &dyn Any, token: Token) -> Option<(Token, ParamType)> {
        let walker = Walker::visible(self.vars);
        let path = Resolver::new(self.vars).path_of(token)?;
        walker
            .next_scalar(root, path, token.idx())
            .map(|(path, idx)| self.position(&walker, &path, idx))
    }

    /// Position of the first scalar.
    pub fn first_scalar(&self, root: &dyn Any) -> Option<(Token, ParamType)> {
        let walker = Walker::visible(self.vars);
        let (path, idx) = walker.first(root)?;
        if walker.type_at(&path, idx).is_scalar() {
            return Some(self.position(&walker, &path, idx));
        }
        walker
            .next_scalar(root, path, idx)
            .map(|(path, idx)| self.position(&walker, &path, idx))
    }

    /// Iterates all visible positions, see [`ParamStore::next`].
    pub fn iter<'a>(&self, root: &'a dyn Any) -> Params<'a> {
        Params {
            walker: Walker::visible(self.vars),
            resolver: Resolver::new(self.vars),
            root,
            cursor: Cursor::BeforeFirst,
            scalars_only: false,
        }
    }

    /// Iterates all visible scalars and vector components, see [`ParamStore::next_scalar`].
    pub fn iter_scalars<'a>(&self, root: &'a dyn Any) -> Params<'a> {
        Params {
            scalars_only: true,
            ..self.iter(root)
        }
    }

    /// Finds a visible parameter by its full name. Vector components are found by their `_X`,
    /// `_Y` or `_Z` suffixed name.
    pub fn find(&self, root: &dyn Any, name: &str) -> Option<(Token, ParamType)> {
        self.find_with(Walker::visible(self.vars), root, name)
    }

    /// Like [`ParamStore::find`] but also finds parameters hidden by an enable switch. Used when
    /// a value is addressed by name: setting, reading, conversion and defaults text.
    pub(crate) fn find_any(&self, root: &dyn Any, name: &str) -> Option<(Token, ParamType)> {
        self.find_with(Walker::all(self.vars), root, name)
    }

    fn find_with(&self, walker: Walker, root: &dyn Any, name: &str) -> Option<(Token, ParamType)> {
        if name.is_empty() || name.len() > MAX_NAME_SIZE {
            return None;
        }
        let resolver = Resolver::new(self.vars);
        let mut buf = [0u8; MAX_NAME_SIZE];
        let mut cursor = walker.first(root);
        while let Some((path, idx)) = cursor {
            let len = resolver.copy_name(&path, idx, &mut buf);
            if &buf[..len] == name.as_bytes() {
                return Some(self.position(&walker, &path, idx));
            }
            cursor = walker.next(root, path, idx);
        }
        None
    }

    /// Token of the registered field `param` refers to, hidden or not. This is how code holding
    /// a field obtains the token for the [`Scalar::set_and_save`] family.
    pub fn find_by_param(&self, root: &dyn Any, param: &dyn Param) -> Option<Token> {
        let resolver = Resolver::new(self.vars);
        let walker = Walker::all(self.vars);
        let mut cursor = walker.first(root);
        while let Some((path, idx)) = cursor {
            if idx == 0 {
                if let Some(Slot::Param(field)) = resolver.slot(root, &path) {
                    if core::ptr::addr_eq(field, param) {
                        return Some(resolver.token(&path, 0));
                    }
                }
            }
            cursor = walker.next(root, path, idx);
        }
        None
    }

    /// The `n`th scalar in [`ParamStore::next_scalar`] order, counting from zero.
    pub fn find_by_index(&self, root: &dyn Any, n: usize) -> Option<(Token, ParamType)> {
        self.iter_scalars(root).nth(n)
    }

    /// The top level object registered as `name`, e.g. to downcast a group.
    pub fn find_object<'a>(&self, root: &'a dyn Any, name: &str) -> Option<&'a dyn Any> {
        let info = self.vars.iter().find(|info| info.name == name)?;
        match (info.access.get)(root)? {
            Slot::Group(object) => Some(object),
            Slot::Param(_) => None,
        }
    }

    /// Writes the full name of `token` into `buf`, truncating silently. Returns the number of
    /// bytes written, 0 if the token doesn't resolve.
    pub fn copy_name(&self, token: Token, buf: &mut [u8]) -> usize {
        let resolver = Resolver::new(self.vars);
        match resolver.path_of(token) {
            Some(path) => resolver.copy_name(&path, token.idx(), buf),
            None => 0,
        }
    }

    /// The full name of `token`, empty if the token doesn't resolve.
    pub fn name(&self, token: Token) -> Name {
        let mut name = Name::empty();
        name.len = self.copy_name(token, &mut name.buf) as u8;
        name
    }

    /// The current value of a position. Vector components read as floats.
    pub fn value(&self, root: &dyn Any, token: Token) -> Result<ParamValue, Error> {
        let resolver = Resolver::new(self.vars);
        let path = resolver.path_of(token).ok_or(Error::NotFound)?;
        match resolver.slot(root, &path) {
            Some(Slot::Param(param)) => match token.idx() {
                0 => Ok(param.value()),
                idx => param
                    .component(usize::from(idx - 1))
                    .map(ParamValue::Float)
                    .ok_or(Error::TypeMismatch(param.param_type())),
            },
            Some(Slot::Group(_)) => Err(Error::TypeMismatch(ParamType::Group)),
            None => Err(Error::NotFound),
        }
    }

    pub(crate) fn position(&self, walker: &Walker, path: &Path, idx: u8) -> (Token, ParamType) {
        (
            Resolver::new(self.vars).token(path, idx),
            walker.type_at(path, idx),
        )
    }
}

#[derive(Copy, Clone)]
enum Cursor {
    BeforeFirst,
    At(Path, u8),
    Exhausted,
}

/// Iterator over parameter positions, created by [`ParamStore::iter`] and
/// [`ParamStore::iter_scalars`].
pub struct Params<'a> {
    walker: Walker,
    resolver: Resolver,
    root: &'a dyn Any,
    cursor: Cursor,
    scalars_only: bool,
}

impl Iterator for Params<'_> {
    type Item = (Token, ParamType);

    fn next(&mut self) -> Option<Self::Item> {
        let next = match self.cursor {
            Cursor::BeforeFirst => {
                let first = self.walker.first(self.root);
                match first {
                    Some((path, idx))
                        if self.scalars_only && !self.walker.type_at(&path, idx).is_scalar() =>
                    {
                        self.walker.next_scalar(self.root, path, idx)
                    }
                    first => first,
                }
            }
            Cursor::At(path, idx) if self.scalars_only => {
                self.walker.next_scalar(self.root, path, idx)
            }
            Cursor::At(path, idx) => self.walker.next(self.root, path, idx),
            Cursor::Exhausted => None,
        };

        match next {
            Some((path, idx)) => {
                self.cursor = Cursor::At(path, idx);
                Some((
                    self.resolver.token(&path, idx),
                    self.walker.type_at(&path, idx),
                ))
            }
            None => {
                self.cursor = Cursor::Exhausted;
                None
            }
        }
    }
}
