//! Carries stored values over to parameters that moved to a new key or group position.

use crate::ParamStore;
use crate::error::Error;
use crate::info::{ConversionInfo, SlotMut};
use crate::internal::ScanResult;
use crate::platform::{Notify, Platform};
use crate::raw::{MAX_PAYLOAD_SIZE, PARAM_HEADER_SIZE, ParamHeader};
use crate::resolve::Resolver;
use crate::value::ParamValue;
use core::any::Any;
#[cfg(feature = "defmt")]
use defmt::{trace, warn};

impl<T: Platform, N: Notify> ParamStore<T, N> {
    /// Looks up each old record of `table` and, if it exists, assigns its value to the parameter
    /// now named `new_name` and saves it there. The old record stays on the storage unreachable.
    ///
    /// Running the conversion again rewrites the same values and changes nothing. Returns the
    /// number of converted parameters.
    pub fn convert_old_parameters(
        &mut self,
        root: &mut dyn Any,
        table: &[ConversionInfo],
    ) -> usize {
        let mut converted = 0;
        for info in table {
            match self.convert_old_parameter(root, info) {
                Ok(()) => converted += 1,
                Err(Error::NotFound) => {}
                Err(_e) => {
                    #[cfg(feature = "defmt")]
                    warn!("convert: {=str} failed: {}", info.new_name, _e);

                    #[cfg(feature = "debug-logs")]
                    println!("  convert: {} failed: {_e:?}", info.new_name);
                }
            }
        }
        converted
    }

    /// Converts a single parameter, see [`ParamStore::convert_old_parameters`]. Fails with
    /// [`Error::NotFound`] if there is no old record or no parameter named `new_name`.
    pub fn convert_old_parameter(
        &mut self,
        root: &mut dyn Any,
        info: &ConversionInfo,
    ) -> Result<(), Error> {
        let header = ParamHeader::new(info.old_key, info.type_, info.old_group_element);
        let ScanResult::Found(offset) = self.scan(&header)? else {
            return Err(Error::NotFound);
        };

        let mut payload = [0u8; MAX_PAYLOAD_SIZE];
        let len = info.type_.size();
        self.read_at(offset + PARAM_HEADER_SIZE, &mut payload[..len])?;
        let old_value =
            ParamValue::decode(info.type_, &payload[..len]).ok_or(Error::TypeMismatch(info.type_))?;

        let (token, new_type) = self.find_any(root, info.new_name).ok_or(Error::NotFound)?;
        if token.idx() != 0 {
            return Err(Error::TypeMismatch(new_type));
        }

        let resolver = Resolver::new(self.vars);
        let path = resolver.path_of(token).ok_or(Error::NotFound)?;
        let Some(SlotMut::Param(param)) = resolver.slot_mut(root, &path) else {
            return Err(Error::NotFound);
        };

        if new_type == info.type_ {
            param.set_value(old_value);
        } else if new_type.is_scalar() && info.type_.is_scalar() {
            param.set_float(old_value.cast_to_float());
        } else {
            return Err(Error::TypeMismatch(info.type_));
        }

        #[cfg(feature = "defmt")]
        trace!("convert: {} -> {=str}", header.key, info.new_name);

        self.save(root, token, true)
    }
}
