use core::fmt::{Debug, Formatter};

/// Number of bits per nesting level of a [`GroupElement`].
pub const GROUP_LEVEL_SHIFT: u32 = 6;
/// Width of a [`GroupElement`].
pub const GROUP_BITS: u32 = 18;
/// Groups can be nested three levels deep.
pub const MAX_GROUP_DEPTH: usize = (GROUP_BITS / GROUP_LEVEL_SHIFT) as usize;
/// Largest child index of a group. Zero marks an unused level.
pub const MAX_GROUP_INDEX: u8 = (1 << GROUP_LEVEL_SHIFT) - 1;
/// Width of a top level key.
pub const KEY_BITS: u32 = 9;
/// Width of the array index of a [`Token`].
pub const IDX_BITS: u32 = 5;

const KEY_MASK: u32 = (1 << KEY_BITS) - 1;
const IDX_MASK: u32 = (1 << IDX_BITS) - 1;
const GROUP_MASK: u32 = (1 << GROUP_BITS) - 1;
const DIGIT_MASK: u32 = (1 << GROUP_LEVEL_SHIFT) - 1;

/// Position of a parameter within the nested groups of its top level entry: three 6-bit digits,
/// the lowest digit being the outermost level. Each digit is the `idx` of the child chosen at that
/// level, 0 meaning the level is not used.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GroupElement(u32);

impl GroupElement {
    /// A top level parameter or a top level group itself.
    pub const ROOT: GroupElement = GroupElement(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw & GROUP_MASK)
    }

    /// Builds an address from the child indices, outermost first. Missing levels are 0.
    pub const fn from_digits(digits: &[u8]) -> Self {
        let mut raw = 0u32;
        let mut level = 0;
        while level < digits.len() && level < MAX_GROUP_DEPTH {
            raw |= (digits[level] as u32 & DIGIT_MASK) << (level as u32 * GROUP_LEVEL_SHIFT);
            level += 1;
        }
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The child index chosen at `level`, 0 if the level is unused.
    pub const fn digit(self, level: usize) -> u8 {
        if level >= MAX_GROUP_DEPTH {
            return 0;
        }
        ((self.0 >> (level as u32 * GROUP_LEVEL_SHIFT)) & DIGIT_MASK) as u8
    }

    pub const fn digits(self) -> [u8; MAX_GROUP_DEPTH] {
        [self.digit(0), self.digit(1), self.digit(2)]
    }

    /// Returns a copy with `idx` placed at `level`, or `None` if the level or the index are out of
    /// range.
    pub const fn with_digit(self, level: usize, idx: u8) -> Option<Self> {
        if level >= MAX_GROUP_DEPTH || idx > MAX_GROUP_INDEX {
            return None;
        }
        let shift = level as u32 * GROUP_LEVEL_SHIFT;
        Some(Self((self.0 & !(DIGIT_MASK << shift)) | ((idx as u32) << shift)))
    }

    /// Number of leading levels in use.
    pub const fn depth(self) -> usize {
        let mut depth = 0;
        while depth < MAX_GROUP_DEPTH && self.digit(depth) != 0 {
            depth += 1;
        }
        depth
    }
}

impl Debug for GroupElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let [a, b, c] = self.digits();
        f.write_fmt(format_args!("GroupElement({a}.{b}.{c})"))
    }
}

/// A resumable cursor over the parameter tree.
///
/// Packed into 32 bits: 9 bit top level key, 5 bit array index, 18 bit [`GroupElement`]. Two
/// tokens are equal if and only if they name the same parameter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Token(u32);

impl Token {
    pub const fn new(key: u16, idx: u8, group_element: GroupElement) -> Self {
        Self(
            (key as u32 & KEY_MASK)
                | (idx as u32 & IDX_MASK) << KEY_BITS
                | (group_element.0 & GROUP_MASK) << (KEY_BITS + IDX_BITS),
        )
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn key(self) -> u16 {
        (self.0 & KEY_MASK) as u16
    }

    /// Array index. For vectors, 0 names the whole vector and 1..=3 name its components.
    pub const fn idx(self) -> u8 {
        ((self.0 >> KEY_BITS) & IDX_MASK) as u8
    }

    pub const fn group_element(self) -> GroupElement {
        GroupElement(self.0 >> (KEY_BITS + IDX_BITS))
    }

    pub const fn with_idx(self, idx: u8) -> Self {
        Self::new(self.key(), idx, self.group_element())
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let key = self.key();
        let idx = self.idx();
        let [a, b, c] = self.group_element().digits();
        f.write_fmt(format_args!("Token({key}:{a}.{b}.{c}[{idx}])"))
    }
}
