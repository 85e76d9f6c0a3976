//! Resolves tokens to registry entries and to the live objects.

use crate::info::{Flags, GroupInfo, Info, Slot, SlotMut, VarDef};
use crate::raw::{ParamHeader, ParamType};
use crate::token::{GROUP_LEVEL_SHIFT, GroupElement, MAX_GROUP_DEPTH, Token};
use core::any::Any;

/// Separates the names of nested entries.
pub(crate) const NAME_SEPARATOR: u8 = b'_';

/// Position of an entry in the registry: the top level entry and the position within the child
/// table for every nesting level.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct Path {
    pub(crate) vindex: usize,
    pub(crate) positions: [usize; MAX_GROUP_DEPTH],
    pub(crate) depth: usize,
}

impl Path {
    pub(crate) const fn top(vindex: usize) -> Self {
        Self {
            vindex,
            positions: [0; MAX_GROUP_DEPTH],
            depth: 0,
        }
    }

    pub(crate) fn push(&self, position: usize) -> Option<Self> {
        if self.depth >= MAX_GROUP_DEPTH {
            return None;
        }
        let mut path = *self;
        path.positions[path.depth] = position;
        path.depth += 1;
        Some(path)
    }

    /// The enclosing group. The parent of a top level entry is itself.
    pub(crate) fn parent(&self) -> Self {
        let mut path = *self;
        if path.depth > 0 {
            path.depth -= 1;
            path.positions[path.depth] = 0;
        }
        path
    }

    /// True if `other` lies below this path.
    pub(crate) fn contains(&self, other: &Path) -> bool {
        other.vindex == self.vindex
            && other.depth > self.depth
            && other.positions[..self.depth] == self.positions[..self.depth]
    }
}

/// The descriptor found at a [`Path`].
#[derive(Copy, Clone)]
pub(crate) enum Entry {
    Top(&'static Info),
    Child(&'static GroupInfo),
}

impl Entry {
    pub(crate) fn type_(&self) -> ParamType {
        match self {
            Entry::Top(info) => info.type_,
            Entry::Child(ginfo) => ginfo.type_,
        }
    }

    pub(crate) fn def(&self) -> VarDef {
        match self {
            Entry::Top(info) => info.def,
            Entry::Child(ginfo) => ginfo.def,
        }
    }

    /// The child table if this is a group.
    pub(crate) fn table(&self) -> Option<&'static [GroupInfo]> {
        if self.type_() != ParamType::Group {
            return None;
        }
        self.def().group()
    }
}

#[derive(Copy, Clone)]
pub(crate) struct Resolver {
    pub(crate) vars: &'static [Info],
}

impl Resolver {
    pub(crate) const fn new(vars: &'static [Info]) -> Self {
        Self { vars }
    }

    pub(crate) fn info_by_key(&self, key: u16) -> Option<usize> {
        self.vars.iter().position(|info| info.key == key)
    }

    pub(crate) fn entry(&self, path: &Path) -> Option<Entry> {
        let info = self.vars.get(path.vindex)?;
        let mut entry = Entry::Top(info);
        for &position in &path.positions[..path.depth] {
            entry = Entry::Child(entry.table()?.get(position)?);
        }
        Some(entry)
    }

    /// Decodes the group element of a token into a path. Fails for unknown keys, digits without a
    /// matching child, digits beyond a value entry and array indices on non-vector entries.
    pub(crate) fn path_of(&self, token: Token) -> Option<Path> {
        let mut path = Path::top(self.info_by_key(token.key())?);
        let group_element = token.group_element();
        let mut entry = Entry::Top(&self.vars[path.vindex]);

        for level in 0..MAX_GROUP_DEPTH {
            let digit = group_element.digit(level);
            if digit == 0 {
                // all deeper levels have to be unused as well
                if group_element.raw() >> (level as u32 * GROUP_LEVEL_SHIFT) != 0 {
                    return None;
                }
                break;
            }
            let table = entry.table()?;
            let position = table.iter().position(|ginfo| ginfo.idx == digit)?;
            entry = Entry::Child(&table[position]);
            path = path.push(position)?;
        }

        match token.idx() {
            0 => Some(path),
            1..=3 if entry.type_() == ParamType::Vector3f => Some(path),
            _ => None,
        }
    }

    pub(crate) fn group_element(&self, path: &Path) -> GroupElement {
        let mut group_element = GroupElement::ROOT;
        let mut table = self.vars[path.vindex].def.group();
        for (level, &position) in path.positions[..path.depth].iter().enumerate() {
            let Some(ginfo) = table.and_then(|t| t.get(position)) else {
                break;
            };
            group_element = group_element
                .with_digit(level, ginfo.idx)
                .unwrap_or(group_element);
            table = ginfo.def.group();
        }
        group_element
    }

    pub(crate) fn token(&self, path: &Path, idx: u8) -> Token {
        Token::new(self.vars[path.vindex].key, idx, self.group_element(path))
    }

    /// The storage header of a value entry. `None` for groups.
    pub(crate) fn header(&self, path: &Path) -> Option<ParamHeader> {
        let type_ = self.entry(path)?.type_();
        if !type_.is_storable() {
            return None;
        }
        Some(ParamHeader::new(
            self.vars[path.vindex].key,
            type_,
            self.group_element(path),
        ))
    }

    /// Follows the accessors from the root object down to the entry at `path`. Fails if any
    /// pointer on the way is empty.
    pub(crate) fn slot<'a>(&self, root: &'a dyn Any, path: &Path) -> Option<Slot<'a>> {
        let info = self.vars.get(path.vindex)?;
        let mut slot = (info.access.get)(root)?;
        let mut table = info.def.group();
        for &position in &path.positions[..path.depth] {
            let Slot::Group(object) = slot else {
                return None;
            };
            let ginfo = table?.get(position)?;
            slot = (ginfo.access.get)(object)?;
            table = ginfo.def.group();
        }
        Some(slot)
    }

    pub(crate) fn slot_mut<'a>(&self, root: &'a mut dyn Any, path: &Path) -> Option<SlotMut<'a>> {
        let info = self.vars.get(path.vindex)?;
        let mut slot = (info.access.get_mut)(root)?;
        let mut table = info.def.group();
        for &position in &path.positions[..path.depth] {
            let SlotMut::Group(object) = slot else {
                return None;
            };
            let ginfo = table?.get(position)?;
            slot = (ginfo.access.get_mut)(object)?;
            table = ginfo.def.group();
        }
        Some(slot)
    }

    /// Entries of `table` at or beyond the returned position are hidden by a disabled enable
    /// switch.
    pub(crate) fn enable_limit(table: &'static [GroupInfo], object: &dyn Any) -> usize {
        for (position, ginfo) in table.iter().enumerate() {
            if !ginfo.flags.contains(Flags::ENABLE) {
                continue;
            }
            if let Some(Slot::Param(param)) = (ginfo.access.get)(object) {
                if param.cast_to_float() == 0.0 {
                    return position + 1;
                }
            }
        }
        table.len()
    }

    /// Writes the full name of the entry into `buf`, truncating silently if it doesn't fit.
    /// Vector components (`idx` 1..=3) get an `_X`, `_Y` or `_Z` suffix. Returns the number of
    /// bytes written.
    pub(crate) fn copy_name(&self, path: &Path, idx: u8, buf: &mut [u8]) -> usize {
        let mut writer = NameWriter { buf, len: 0 };
        let info = &self.vars[path.vindex];
        writer.push_part(info.name);

        let mut table = info.def.group();
        for &position in &path.positions[..path.depth] {
            let Some(ginfo) = table.and_then(|t| t.get(position)) else {
                break;
            };
            writer.push_part(ginfo.name);
            table = ginfo.def.group();
        }

        if idx > 0 {
            writer.push_bytes(&[NAME_SEPARATOR, b'X' + (idx - 1)]);
        }
        writer.len
    }
}

struct NameWriter<'b> {
    buf: &'b mut [u8],
    len: usize,
}

impl NameWriter<'_> {
    /// Appends a name component, preceded by the separator unless it is the first. Nameless
    /// nestings add nothing.
    fn push_part(&mut self, part: &str) {
        if part.is_empty() {
            return;
        }
        if self.len > 0 {
            self.push_bytes(&[NAME_SEPARATOR]);
        }
        // never cut a character in half
        let room = self.buf.len() - self.len;
        let mut end = part.len().min(room);
        while !part.is_char_boundary(end) {
            end -= 1;
        }
        self.push_bytes(&part.as_bytes()[..end]);
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        let n = bytes.len().min(self.buf.len() - self.len);
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
    }
}
