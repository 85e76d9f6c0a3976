//! Defaults supplied at runtime, e.g. from a defaults file on the SD card or a board specific
//! table. They take precedence over the compiled-in defaults but never over a stored record.
//!
//! The text format is one parameter per line, name and value separated by whitespace, `,` or
//! `=`. Everything after a `#` is a comment.

use crate::MAX_NAME_SIZE;
use crate::ParamStore;
use crate::info::{GroupInfo, SlotMut};
use crate::param::Param;
use crate::platform::{Notify, Platform};
use crate::resolve::{Path, Resolver};
use crate::token::Token;
use core::any::Any;
#[cfg(feature = "defmt")]
use defmt::{trace, warn};

#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct Override {
    pub(crate) token: Token,
    pub(crate) value: f32,
}

/// Splits a defaults line into name and value. `None` for blank lines, comments and lines that
/// don't parse.
pub(crate) fn parse_param_line(line: &str) -> Option<(&str, f32)> {
    let line = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };
    let mut parts = line
        .split(|c: char| c.is_ascii_whitespace() || c == ',' || c == '=')
        .filter(|part| !part.is_empty());
    let name = parts.next()?;
    let value = parts.next()?.parse::<f32>().ok()?;
    if name.len() > MAX_NAME_SIZE {
        return None;
    }
    Some((name, value))
}

/// Sets the compiled-in defaults of all values described by `table` on `object`. Usually called
/// from the constructor of a structure holding parameters.
pub fn setup_object_defaults(object: &mut dyn Any, table: &'static [GroupInfo]) {
    for ginfo in table {
        if !ginfo.type_.is_storable() {
            continue;
        }
        if let Some(SlotMut::Param(param)) = (ginfo.access.get_mut)(object) {
            param.set_float(ginfo.def.default_value());
        }
    }
}

/// Sets the value named `name` of `object` if it is a scalar. Returns whether it was found.
pub fn set_object_value(
    object: &mut dyn Any,
    table: &'static [GroupInfo],
    name: &str,
    value: f32,
) -> bool {
    let Some(ginfo) = table
        .iter()
        .find(|ginfo| ginfo.name == name && ginfo.type_.is_scalar())
    else {
        return false;
    };
    match (ginfo.access.get_mut)(object) {
        Some(SlotMut::Param(param)) => {
            param.set_float(value);
            true
        }
        _ => false,
    }
}

impl<T: Platform, N: Notify> ParamStore<T, N> {
    /// The default of `token`: its override if there is one, else the compiled-in default, else
    /// zero.
    pub fn get_default(&self, token: Token) -> f32 {
        match Resolver::new(self.vars).path_of(token) {
            Some(path) => self.default_of(&path, token),
            None => 0.0,
        }
    }

    pub(crate) fn default_of(&self, path: &Path, token: Token) -> f32 {
        if let Some(v) = self.override_of(token) {
            return v;
        }
        Resolver::new(self.vars)
            .entry(path)
            .map_or(0.0, |entry| entry.def().default_value())
    }

    fn override_of(&self, token: Token) -> Option<f32> {
        self.overrides
            .iter()
            .find(|o| o.token == token)
            .map(|o| o.value)
    }

    /// True if the defaults text set `token`.
    pub fn configured_in_defaults_file(&self, token: Token) -> bool {
        self.override_of(token).is_some()
    }

    /// Number of overrides currently in effect.
    pub fn num_overrides(&self) -> usize {
        self.overrides.len()
    }

    pub(crate) fn apply_component_overrides(&self, token: Token, param: &mut dyn Param) {
        for idx in 1..=3u8 {
            if let Some(v) = self.override_of(token.with_idx(idx)) {
                param.set_component(usize::from(idx - 1), v);
            }
        }
    }

    /// Replaces the overrides with the ones in `text` and assigns them to the parameters.
    /// Lines that don't parse or name an unknown parameter are skipped. Returns the number of
    /// parameters set.
    pub fn load_defaults(&mut self, root: &mut dyn Any, text: &str) -> usize {
        self.overrides.clear();
        let resolver = Resolver::new(self.vars);
        let mut count = 0;

        for line in text.lines() {
            let Some((name, value)) = parse_param_line(line) else {
                continue;
            };
            let Some((token, type_)) = self.find_any(root, name) else {
                #[cfg(feature = "defmt")]
                warn!("load_defaults: unknown parameter {=str}", name);

                #[cfg(feature = "debug-logs")]
                println!("  defaults: unknown parameter {name}");
                continue;
            };
            if !type_.is_scalar() {
                continue;
            }
            let Some(path) = resolver.path_of(token) else {
                continue;
            };
            let Some(SlotMut::Param(param)) = resolver.slot_mut(root, &path) else {
                continue;
            };

            match token.idx() {
                0 => param.set_float(value),
                idx => param.set_component(usize::from(idx - 1), value),
            }

            match self.overrides.iter_mut().find(|o| o.token == token) {
                Some(existing) => existing.value = value,
                None => self.overrides.push(Override { token, value }),
            }
            count += 1;
        }

        #[cfg(feature = "defmt")]
        trace!("load_defaults: {} overrides", count);

        count
    }
}
