//! Depth first traversal of the parameter tree.
//!
//! A position is a [`Path`] plus the vector component index. Groups are visited before their
//! children, vectors before their three components. Empty pointers are skipped together with
//! everything below them.

use crate::info::{Info, Slot};
use crate::raw::ParamType;
use crate::resolve::{Path, Resolver};
use core::any::Any;

#[derive(Copy, Clone)]
pub(crate) struct Walker {
    resolver: Resolver,
    /// Hide the entries behind a disabled enable switch.
    gated: bool,
}

impl Walker {
    /// Walks what a user sees: entries behind disabled enable switches are hidden.
    pub(crate) const fn visible(vars: &'static [Info]) -> Self {
        Self {
            resolver: Resolver::new(vars),
            gated: true,
        }
    }

    /// Walks every resolvable entry, used for loading and resetting values.
    pub(crate) const fn all(vars: &'static [Info]) -> Self {
        Self {
            resolver: Resolver::new(vars),
            gated: false,
        }
    }

    pub(crate) fn first(&self, root: &dyn Any) -> Option<(Path, u8)> {
        self.first_top(root, 0).map(|path| (path, 0))
    }

    pub(crate) fn next(&self, root: &dyn Any, path: Path, idx: u8) -> Option<(Path, u8)> {
        let entry = self.resolver.entry(&path)?;
        match entry.type_() {
            ParamType::Vector3f if idx < 3 => return Some((path, idx + 1)),
            ParamType::Group => {
                if let Some(child) = self.first_child(root, &path, 0) {
                    return Some((child, 0));
                }
            }
            _ => {}
        }
        self.next_sibling(root, path).map(|path| (path, 0))
    }

    /// Like [`Self::next`] but only stops at positions holding a single number: scalars and
    /// vector components.
    pub(crate) fn next_scalar(&self, root: &dyn Any, path: Path, idx: u8) -> Option<(Path, u8)> {
        let mut cursor = self.next(root, path, idx);
        while let Some((path, idx)) = cursor {
            if self.type_at(&path, idx).is_scalar() {
                return Some((path, idx));
            }
            cursor = self.next(root, path, idx);
        }
        None
    }

    /// The type of a position. Vector components are floats.
    pub(crate) fn type_at(&self, path: &Path, idx: u8) -> ParamType {
        match self.resolver.entry(path).map(|entry| entry.type_()) {
            Some(ParamType::Vector3f) if idx > 0 => ParamType::Float,
            Some(type_) => type_,
            None => ParamType::None,
        }
    }

    fn first_top(&self, root: &dyn Any, start: usize) -> Option<Path> {
        let vars = self.resolver.vars;
        (start..vars.len())
            .find(|&vindex| (vars[vindex].access.get)(root).is_some())
            .map(Path::top)
    }

    fn first_child(&self, root: &dyn Any, parent: &Path, start: usize) -> Option<Path> {
        let table = self.resolver.entry(parent)?.table()?;
        let Some(Slot::Group(object)) = self.resolver.slot(root, parent) else {
            return None;
        };
        let limit = if self.gated {
            Resolver::enable_limit(table, object)
        } else {
            table.len()
        };
        let position =
            (start..limit).find(|&position| (table[position].access.get)(object).is_some())?;
        parent.push(position)
    }

    fn next_sibling(&self, root: &dyn Any, mut path: Path) -> Option<Path> {
        loop {
            if path.depth == 0 {
                return self.first_top(root, path.vindex + 1);
            }
            let position = path.positions[path.depth - 1];
            let parent = path.parent();
            if let Some(sibling) = self.first_child(root, &parent, position + 1) {
                return Some(sibling);
            }
            path = parent;
        }
    }
}
