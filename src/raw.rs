use crate::error::Error;
use crate::platform::Platform;
use crate::token::{GROUP_BITS, GroupElement};
use core::fmt::{Debug, Formatter};
#[cfg(feature = "defmt")]
use defmt::trace;

pub(crate) const EEPROM_MAGIC: [u8; 2] = [0x50, 0x41];
pub(crate) const EEPROM_REVISION: u8 = 6;
pub(crate) const EEPROM_HEADER_SIZE: usize = 4;
pub(crate) const PARAM_HEADER_SIZE: usize = 4;

pub(crate) const SENTINEL_KEY: u16 = 0x1FF;
pub(crate) const SENTINEL_TYPE: u8 = 0x1F;
pub(crate) const SENTINEL_GROUP: u32 = 0xFF;

/// Largest payload of a single record, used to size stack buffers.
pub(crate) const MAX_PAYLOAD_SIZE: usize = 12;

const KEY_LOW_BITS: u32 = 8;
const TYPE_BITS: u32 = 5;
const KEY_HIGH_SHIFT: u32 = KEY_LOW_BITS + TYPE_BITS;
const GROUP_SHIFT: u32 = KEY_HIGH_SHIFT + 1;

#[derive(strum::FromRepr, strum::Display, Debug, Eq, PartialEq, PartialOrd, Ord, Copy, Clone)]
#[repr(u8)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamType {
    None = 0,
    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    Float = 4,
    Vector3f = 5,
    Group = 6,
}

impl ParamType {
    /// Number of payload bytes stored after the record header.
    pub const fn size(self) -> usize {
        match self {
            ParamType::None | ParamType::Group => 0,
            ParamType::Int8 => 1,
            ParamType::Int16 => 2,
            ParamType::Int32 | ParamType::Float => 4,
            ParamType::Vector3f => 12,
        }
    }

    /// Int8, Int16, Int32 and Float are scalars. Vectors are values but not scalars.
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            ParamType::Int8 | ParamType::Int16 | ParamType::Int32 | ParamType::Float
        )
    }

    /// Types that own a record on the storage.
    pub const fn is_storable(self) -> bool {
        self.is_scalar() || matches!(self, ParamType::Vector3f)
    }

    /// Payload size for a raw type tag read from the storage. Unknown tags carry no payload.
    pub(crate) fn size_of_raw(type_: u8) -> usize {
        ParamType::from_repr(type_).map_or(0, ParamType::size)
    }
}

/// Placed at the head of the storage to indicate that it is formatted for parameters.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct EepromHeader {
    pub(crate) magic: [u8; 2],
    pub(crate) revision: u8,
    pub(crate) spare: u8,
}

impl EepromHeader {
    pub(crate) const fn current() -> Self {
        Self {
            magic: EEPROM_MAGIC,
            revision: EEPROM_REVISION,
            spare: 0,
        }
    }

    pub(crate) fn to_bytes(self) -> [u8; EEPROM_HEADER_SIZE] {
        [self.magic[0], self.magic[1], self.revision, self.spare]
    }

    pub(crate) fn from_bytes(raw: [u8; EEPROM_HEADER_SIZE]) -> Self {
        Self {
            magic: [raw[0], raw[1]],
            revision: raw[2],
            spare: raw[3],
        }
    }

    /// The spare byte is not part of the format check.
    pub(crate) fn is_current(&self) -> bool {
        self.magic == EEPROM_MAGIC && self.revision == EEPROM_REVISION
    }
}

/// Prepended to every value on the storage.
///
/// Packed into a little endian `u32`, lowest bit first:
///
/// | bits  | field                                   |
/// |-------|-----------------------------------------|
/// | 0-7   | key, lower 8 bits                       |
/// | 8-12  | type                                    |
/// | 13    | key, 9th bit                            |
/// | 14-31 | group_element, three 6 bit digits       |
///
/// The key is split to stay binary compatible with the older 8 bit key layout.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) struct ParamHeader {
    pub(crate) key: u16,
    pub(crate) type_: u8,
    pub(crate) group_element: u32,
}

impl ParamHeader {
    pub(crate) fn new(key: u16, type_: ParamType, group_element: GroupElement) -> Self {
        Self {
            key: key & SENTINEL_KEY,
            type_: type_ as u8,
            group_element: group_element.raw(),
        }
    }

    pub(crate) const fn sentinel() -> Self {
        Self {
            key: SENTINEL_KEY,
            type_: SENTINEL_TYPE,
            group_element: SENTINEL_GROUP,
        }
    }

    pub(crate) fn to_bytes(self) -> [u8; PARAM_HEADER_SIZE] {
        let key = u32::from(self.key);
        let word = (key & 0xFF)
            | (u32::from(self.type_) & u32::from(SENTINEL_TYPE)) << KEY_LOW_BITS
            | ((key >> KEY_LOW_BITS) & 1) << KEY_HIGH_SHIFT
            | (self.group_element & ((1 << GROUP_BITS) - 1)) << GROUP_SHIFT;
        word.to_le_bytes()
    }

    pub(crate) fn from_bytes(raw: [u8; PARAM_HEADER_SIZE]) -> Self {
        let word = u32::from_le_bytes(raw);
        let key_low = word & 0xFF;
        let key_high = (word >> KEY_HIGH_SHIFT) & 1;
        Self {
            key: (key_low | key_high << KEY_LOW_BITS) as u16,
            type_: ((word >> KEY_LOW_BITS) & u32::from(SENTINEL_TYPE)) as u8,
            group_element: word >> GROUP_SHIFT,
        }
    }

    /// Either an all-ones key or an all-ones type terminates the record list. Freshly erased
    /// EEPROM cells read as 0xFF and therefore also look like a sentinel.
    pub(crate) fn is_sentinel(&self) -> bool {
        self.key == SENTINEL_KEY || self.type_ == SENTINEL_TYPE
    }

    pub(crate) fn payload_size(&self) -> usize {
        ParamType::size_of_raw(self.type_)
    }

    /// Header plus payload.
    pub(crate) fn record_size(&self) -> usize {
        PARAM_HEADER_SIZE + self.payload_size()
    }
}

impl Debug for ParamHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let key = self.key;
        let group_element = self.group_element;
        match ParamType::from_repr(self.type_) {
            Some(type_) => f.write_fmt(format_args!(
                "ParamHeader {{ key: {key:>3}, type: {type_:<8}, group_element: 0x{group_element:0>5x} }}"
            )),
            None => f.write_fmt(format_args!(
                "ParamHeader {{ key: {key:>3}, type: 0x{:0>2x}, group_element: 0x{group_element:0>5x} }}",
                self.type_
            )),
        }
    }
}

pub(crate) fn read_header<T: Platform>(hal: &mut T, offset: u32) -> Result<ParamHeader, Error> {
    let mut buf = [0u8; PARAM_HEADER_SIZE];
    hal.read(offset, &mut buf).map_err(|_| Error::StorageError)?;
    Ok(ParamHeader::from_bytes(buf))
}

/// Writes `bytes` only if the storage doesn't already hold them. This is the only thing
/// protecting the storage from wearing out by repeated saves of the same value.
///
/// Returns whether a write happened.
pub(crate) fn write_check<T: Platform>(
    hal: &mut T,
    offset: u32,
    bytes: &[u8],
) -> Result<bool, Error> {
    let mut current = [0u8; MAX_PAYLOAD_SIZE];
    let mut done = 0;
    let mut differs = false;
    while done < bytes.len() {
        let n = (bytes.len() - done).min(MAX_PAYLOAD_SIZE);
        hal.read(offset + done as u32, &mut current[..n])
            .map_err(|_| Error::StorageError)?;
        if current[..n] != bytes[done..done + n] {
            differs = true;
            break;
        }
        done += n;
    }

    if !differs {
        return Ok(false);
    }

    #[cfg(feature = "defmt")]
    trace!("write_check @{:#06x}: [{}]", offset, bytes.len());

    hal.write(offset, bytes).map_err(|_| Error::StorageError)?;
    Ok(true)
}
