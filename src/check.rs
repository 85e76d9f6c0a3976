//! Consistency check of the registry, run once when the store is created. A registry that
//! fails it would silently corrupt the storage, so it is treated as a firmware bug.

use crate::MAX_NAME_SIZE;
use crate::error::Error;
use crate::info::{GroupInfo, Info, VarDef};
use crate::raw::{ParamType, SENTINEL_KEY};
use crate::token::{MAX_GROUP_DEPTH, MAX_GROUP_INDEX};
#[cfg(feature = "defmt")]
use defmt::warn;

/// The whole registry has to fit into the storage. Exceeding it is not fatal since only values
/// that differ from their defaults are stored.
const MAX_TOTAL_SIZE: usize = 16 * 1024;

pub(crate) fn check_var_info(vars: &'static [Info]) -> Result<(), Error> {
    let mut total_size = 0;

    for (i, info) in vars.iter().enumerate() {
        let key = info.key;
        if key >= SENTINEL_KEY {
            return Err(Error::InvalidRegistry(key));
        }
        if vars[..i].iter().any(|other| other.key == key) {
            return Err(Error::InvalidRegistry(key));
        }

        match (info.type_, info.def) {
            (ParamType::None, _) => return Err(Error::InvalidRegistry(key)),
            (ParamType::Group, VarDef::Group(table)) => {
                total_size += check_group(key, table, name_len(0, info.name), 0)?;
            }
            (ParamType::Group, _) | (_, VarDef::Group(_)) => {
                return Err(Error::InvalidRegistry(key));
            }
            (type_, _) => {
                if value_name_len(type_, info.name.len()) > MAX_NAME_SIZE {
                    return Err(Error::InvalidRegistry(key));
                }
                total_size += type_.size();
            }
        }
    }

    if total_size > MAX_TOTAL_SIZE {
        #[cfg(feature = "defmt")]
        warn!("check_var_info: registry needs {} bytes", total_size);
    }

    Ok(())
}

/// Length of `name` appended to a prefix of `prefix_len` bytes.
fn name_len(prefix_len: usize, name: &str) -> usize {
    match (prefix_len, name.len()) {
        (p, 0) => p,
        (0, n) => n,
        (p, n) => p + 1 + n,
    }
}

/// Vector components carry an extra `_X` suffix.
fn value_name_len(type_: ParamType, len: usize) -> usize {
    if type_ == ParamType::Vector3f {
        len + 2
    } else {
        len
    }
}

/// Checks one group table and returns the payload size of all its values.
fn check_group(
    key: u16,
    table: &'static [GroupInfo],
    prefix_len: usize,
    depth: usize,
) -> Result<usize, Error> {
    if depth >= MAX_GROUP_DEPTH {
        return Err(Error::InvalidRegistry(key));
    }
    let mut size = 0;

    for (i, ginfo) in table.iter().enumerate() {
        if ginfo.idx == 0 || ginfo.idx > MAX_GROUP_INDEX {
            return Err(Error::InvalidRegistry(key));
        }
        if table[..i].iter().any(|other| other.idx == ginfo.idx) {
            return Err(Error::InvalidRegistry(key));
        }

        let len = name_len(prefix_len, ginfo.name);
        match (ginfo.type_, ginfo.def) {
            (ParamType::None, _) => return Err(Error::InvalidRegistry(key)),
            (ParamType::Group, VarDef::Group(child)) => {
                size += check_group(key, child, len, depth + 1)?;
            }
            (ParamType::Group, _) | (_, VarDef::Group(_)) => {
                return Err(Error::InvalidRegistry(key));
            }
            (type_, _) => {
                if value_name_len(type_, len) > MAX_NAME_SIZE {
                    return Err(Error::InvalidRegistry(key));
                }
                size += type_.size();
            }
        }
    }

    Ok(size)
}
