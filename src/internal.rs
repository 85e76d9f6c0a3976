use crate::error::Error;
use crate::info::{Slot, SlotMut};
use crate::iter::Walker;
use crate::param::Param;
use crate::platform::{ChunkedOps, Notify, Platform};
use crate::raw::{
    EEPROM_HEADER_SIZE, EepromHeader, MAX_PAYLOAD_SIZE, PARAM_HEADER_SIZE, ParamHeader, ParamType,
    read_header, write_check,
};
use crate::resolve::{Path, Resolver};
use crate::token::Token;
use crate::value::ParamValue;
use crate::{MAX_NAME_SIZE, ParamStore};
use core::any::Any;
#[cfg(feature = "defmt")]
use defmt::trace;
#[cfg(feature = "defmt")]
use defmt::warn;

/// Result of a linear scan over the records.
#[derive(Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "debug-logs", derive(Debug))]
pub(crate) enum ScanResult {
    /// Offset of the matching record header, relative to the region.
    Found(usize),
    /// Offset of the sentinel, i.e. where a new record would be appended.
    End(usize),
    /// The records run past the end of the region without a sentinel.
    Overrun,
}

/// Float values closer than this (relative) to their default are not worth a record.
const DEFAULT_TOLERANCE: f32 = 0.0001;

impl<T: Platform, N: Notify> ParamStore<T, N> {
    pub(crate) fn read_at(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), Error> {
        self.hal
            .read((self.base_address + offset) as u32, buf)
            .map_err(|_| Error::StorageError)
    }

    pub(crate) fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), Error> {
        #[cfg(feature = "debug-logs")]
        println!("  internal: write_at: 0x{offset:0>4x}[{}]", bytes.len());

        self.hal
            .write((self.base_address + offset) as u32, bytes)
            .map_err(|_| Error::StorageError)
    }

    /// Validates the format header and erases the region if it doesn't match.
    pub(crate) fn setup(&mut self) -> Result<(), Error> {
        let mut raw = [0u8; EEPROM_HEADER_SIZE];
        self.read_at(0, &mut raw)?;
        let header = EepromHeader::from_bytes(raw);

        if !header.is_current() {
            #[cfg(feature = "defmt")]
            warn!(
                "setup: unexpected header {=[u8]:#04x}, erasing",
                &raw[..]
            );

            #[cfg(feature = "debug-logs")]
            println!("  internal: setup: unexpected header {header:?}, erasing");

            self.erase_all()?;
        }

        self.initialised = true;
        Ok(())
    }

    /// Zero-fills the region and writes a fresh format header followed by the sentinel. Every
    /// stored value is lost.
    pub fn erase_all(&mut self) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        trace!("erase_all: @{:#06x}[{}]", self.base_address, self.size);

        self.hal
            .fill(self.base_address as u32, self.size, 0)
            .map_err(|_| Error::StorageError)?;
        self.write_at(EEPROM_HEADER_SIZE, &ParamHeader::sentinel().to_bytes())?;
        self.write_at(0, &EepromHeader::current().to_bytes())?;
        Ok(())
    }

    /// Walks the records from the start of the region until either `target` or the sentinel
    /// is found.
    pub(crate) fn scan(&mut self, target: &ParamHeader) -> Result<ScanResult, Error> {
        let mut offset = EEPROM_HEADER_SIZE;
        while offset + PARAM_HEADER_SIZE <= self.size {
            let header = read_header(&mut self.hal, (self.base_address + offset) as u32)?;
            if header.key == target.key
                && header.type_ == target.type_
                && header.group_element == target.group_element
            {
                return Ok(ScanResult::Found(offset));
            }
            if header.is_sentinel() {
                return Ok(ScanResult::End(offset));
            }
            offset += header.record_size();
        }

        #[cfg(feature = "defmt")]
        warn!("scan: no sentinel before the end of the region");

        Ok(ScanResult::Overrun)
    }

    /// Saves the value of the parameter at `token`. Tokens of vector components save the whole
    /// vector.
    ///
    /// Unless `force` is set nothing is written if there is no record yet and the value equals
    /// its default.
    pub fn save(&mut self, root: &dyn Any, token: Token, force: bool) -> Result<(), Error> {
        let resolver = Resolver::new(self.vars);
        let path = resolver.path_of(token).ok_or(Error::NotFound)?;
        match resolver.slot(root, &path) {
            Some(Slot::Param(param)) => self.save_param(token, param, force),
            Some(Slot::Group(_)) => Err(Error::TypeMismatch(ParamType::Group)),
            None => Err(Error::NotFound),
        }
    }

    /// Saves `param` as the value of `token`. Used by the wrappers, which know their own
    /// token.
    pub fn save_param(
        &mut self,
        token: Token,
        param: &dyn Param,
        force: bool,
    ) -> Result<(), Error> {
        let token = token.with_idx(0);
        let resolver = Resolver::new(self.vars);
        let path = resolver.path_of(token).ok_or(Error::NotFound)?;
        let header = resolver
            .header(&path)
            .ok_or(Error::TypeMismatch(ParamType::Group))?;
        let type_ = param.param_type();
        if type_ as u8 != header.type_ {
            return Err(Error::TypeMismatch(type_));
        }

        let value = param.value();
        let mut payload = [0u8; MAX_PAYLOAD_SIZE];
        let len = value.encode(&mut payload);

        match self.scan(&header)? {
            ScanResult::Found(offset) => {
                #[cfg(feature = "defmt")]
                trace!("save: {} @{:#06x}", token, offset);

                write_check(
                    &mut self.hal,
                    (self.base_address + offset + PARAM_HEADER_SIZE) as u32,
                    &payload[..len],
                )?;
            }
            ScanResult::Overrun => return Err(Error::StorageFull),
            ScanResult::End(offset) => {
                if !force && type_.is_scalar() && self.equals_default(&path, token, &value) {
                    #[cfg(feature = "debug-logs")]
                    println!("  internal: save: {token:?} equals its default, not stored");

                    self.notify(token, type_, &value);
                    return Ok(());
                }

                // room for the record and the sentinel following it
                if offset + header.record_size() + PARAM_HEADER_SIZE > self.size {
                    #[cfg(feature = "defmt")]
                    warn!("save: storage full, {} not stored", token);

                    return Err(Error::StorageFull);
                }

                #[cfg(feature = "defmt")]
                trace!("save: {} appended @{:#06x}", token, offset);

                self.write_at(
                    offset + header.record_size(),
                    &ParamHeader::sentinel().to_bytes(),
                )?;
                self.write_at(offset + PARAM_HEADER_SIZE, &payload[..len])?;
                self.write_at(offset, &header.to_bytes())?;
            }
        }

        self.notify(token, type_, &value);
        Ok(())
    }

    fn equals_default(&self, path: &Path, token: Token, value: &ParamValue) -> bool {
        let v1 = value.cast_to_float();
        let v2 = self.default_of(path, token);
        if v1 == v2 {
            return true;
        }
        value.param_type() != ParamType::Int32 && (v1 - v2).abs() < DEFAULT_TOLERANCE * v1.abs()
    }

    /// Loads the stored value of `token` into its field. On [`Error::NotFound`] the field keeps
    /// its current value.
    pub fn load(&mut self, root: &mut dyn Any, token: Token) -> Result<(), Error> {
        let path = Resolver::new(self.vars)
            .path_of(token.with_idx(0))
            .ok_or(Error::NotFound)?;
        self.load_path(root, &path)
    }

    pub(crate) fn load_path(&mut self, root: &mut dyn Any, path: &Path) -> Result<(), Error> {
        let resolver = Resolver::new(self.vars);
        let header = resolver
            .header(path)
            .ok_or(Error::TypeMismatch(ParamType::Group))?;

        let ScanResult::Found(offset) = self.scan(&header)? else {
            return Err(Error::NotFound);
        };

        let mut payload = [0u8; MAX_PAYLOAD_SIZE];
        let len = header.payload_size();
        self.read_at(offset + PARAM_HEADER_SIZE, &mut payload[..len])?;

        let type_ = resolver
            .entry(path)
            .map_or(ParamType::None, |entry| entry.type_());
        let value = ParamValue::decode(type_, &payload[..len]).ok_or(Error::TypeMismatch(type_))?;

        match resolver.slot_mut(root, path) {
            Some(SlotMut::Param(param)) => {
                #[cfg(feature = "defmt")]
                trace!("load: {} = {}", resolver.token(path, 0), value);

                if param.set_value(value) {
                    Ok(())
                } else {
                    Err(Error::TypeMismatch(type_))
                }
            }
            Some(SlotMut::Group(_)) => Err(Error::TypeMismatch(ParamType::Group)),
            None => Err(Error::NotFound),
        }
    }

    /// Loads every reachable parameter, including the ones hidden by an enable switch.
    /// Parameters without a record keep their value. Returns the first error after trying all
    /// of them.
    pub fn load_all(&mut self, root: &mut dyn Any) -> Result<(), Error> {
        let walker = Walker::all(self.vars);
        let resolver = Resolver::new(self.vars);
        let mut result = Ok(());

        let mut cursor = walker.first(root);
        while let Some((path, idx)) = cursor {
            let storable = resolver
                .entry(&path)
                .is_some_and(|entry| entry.type_().is_storable());
            if idx == 0 && storable {
                if let Err(e) = self.load_path(root, &path) {
                    #[cfg(feature = "debug-logs")]
                    println!("  internal: load_all: {:?}: {e:?}", resolver.token(&path, 0));

                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
            cursor = walker.next(root, path, idx);
        }

        result
    }

    /// Loads every field below the group `token`, e.g. after a pointer group was allocated.
    /// Fields without a record keep their value. Returns the number of fields loaded.
    pub fn load_object(&mut self, root: &mut dyn Any, token: Token) -> Result<usize, Error> {
        let walker = Walker::all(self.vars);
        let resolver = Resolver::new(self.vars);
        let group = resolver.path_of(token.with_idx(0)).ok_or(Error::NotFound)?;
        let type_ = resolver
            .entry(&group)
            .map_or(ParamType::None, |entry| entry.type_());
        if type_ != ParamType::Group {
            return Err(Error::TypeMismatch(type_));
        }
        if resolver.slot(root, &group).is_none() {
            return Err(Error::NotFound);
        }

        let mut loaded = 0;
        let mut cursor = walker.next(root, group, 0);
        while let Some((path, idx)) = cursor {
            if !group.contains(&path) {
                break;
            }
            let storable = resolver
                .entry(&path)
                .is_some_and(|entry| entry.type_().is_storable());
            if idx == 0 && storable {
                match self.load_path(root, &path) {
                    Ok(()) => loaded += 1,
                    Err(Error::NotFound) => {}
                    Err(e) => return Err(e),
                }
            }
            cursor = walker.next(root, path, idx);
        }

        #[cfg(feature = "defmt")]
        trace!("load_object: {} fields below {}", loaded, token);

        Ok(loaded)
    }

    /// True if a record for `token` exists on the storage.
    pub fn configured_in_storage(&mut self, token: Token) -> Result<bool, Error> {
        let resolver = Resolver::new(self.vars);
        let path = resolver.path_of(token.with_idx(0)).ok_or(Error::NotFound)?;
        let header = resolver
            .header(&path)
            .ok_or(Error::TypeMismatch(ParamType::Group))?;
        Ok(matches!(self.scan(&header)?, ScanResult::Found(_)))
    }

    /// True if the parameter was set by the storage or by the defaults text.
    pub fn configured(&mut self, token: Token) -> Result<bool, Error> {
        if self.configured_in_defaults_file(token) {
            return Ok(true);
        }
        self.configured_in_storage(token)
    }

    /// Sets the defaults, including overrides, of all top level values.
    pub fn setup_sketch_defaults(&self, root: &mut dyn Any) {
        let resolver = Resolver::new(self.vars);
        for vindex in 0..self.vars.len() {
            let path = Path::top(vindex);
            if !self.vars[vindex].type_.is_storable() {
                continue;
            }
            let token = resolver.token(&path, 0);
            let default = self.default_of(&path, token);
            if let Some(SlotMut::Param(param)) = resolver.slot_mut(root, &path) {
                param.set_float(default);
                self.apply_component_overrides(token, param);
            }
        }
    }

    /// Reports the current value of `param` to the notification sink without saving it.
    pub fn notify_param(&mut self, token: Token, param: &dyn Param) {
        match token.idx() {
            0 => self.notify(token, param.param_type(), &param.value()),
            idx => {
                if let Some(v) = param.component(usize::from(idx - 1)) {
                    self.notify(token, ParamType::Float, &ParamValue::Float(v));
                }
            }
        }
    }

    fn notify(&mut self, token: Token, type_: ParamType, value: &ParamValue) {
        let mut buf = [0u8; MAX_NAME_SIZE];
        let len = self.copy_name(token, &mut buf);
        let name = core::str::from_utf8(&buf[..len]).unwrap_or_default();
        self.notify.notify(name, type_, value);
    }
}
