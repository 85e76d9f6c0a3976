use crate::ParamStore;
use crate::iter::Walker;
use crate::platform::{Notify, Platform};
use crate::resolve::Resolver;
use crate::token::Token;
use crate::value::ParamValue;
use crate::MAX_NAME_SIZE;
use core::any::Any;
use core::fmt::{self, Write};

impl<T: Platform, N: Notify> ParamStore<T, N> {
    /// Writes one `NAME: value` line for every visible scalar and vector component. With
    /// `show_keys` each line is prefixed with the key and the group element of the parameter.
    pub fn show_all<W: Write>(&self, root: &dyn Any, out: &mut W, show_keys: bool) -> fmt::Result {
        let walker = Walker::visible(self.vars);
        let resolver = Resolver::new(self.vars);

        let mut cursor = walker.first(root);
        if let Some((path, idx)) = cursor {
            if !walker.type_at(&path, idx).is_scalar() {
                cursor = walker.next_scalar(root, path, idx);
            }
        }

        while let Some((path, idx)) = cursor {
            let token = resolver.token(&path, idx);
            if show_keys {
                write!(
                    out,
                    "Key {}:{} ",
                    token.key(),
                    token.group_element().raw()
                )?;
            }
            self.show(root, token, out)?;
            cursor = walker.next_scalar(root, path, idx);
        }
        Ok(())
    }

    /// Writes the `NAME: value` line of a single parameter. Parameters that don't resolve are
    /// skipped.
    pub fn show<W: Write>(&self, root: &dyn Any, token: Token, out: &mut W) -> fmt::Result {
        let mut buf = [0u8; MAX_NAME_SIZE];
        let len = self.copy_name(token, &mut buf);
        let name = core::str::from_utf8(&buf[..len]).unwrap_or_default();

        match self.value(root, token) {
            Ok(ParamValue::Int8(v)) => writeln!(out, "{name}: {v}"),
            Ok(ParamValue::Int16(v)) => writeln!(out, "{name}: {v}"),
            Ok(ParamValue::Int32(v)) => writeln!(out, "{name}: {v}"),
            Ok(ParamValue::Float(v)) => writeln!(out, "{name}: {v}"),
            Ok(ParamValue::Vector3f(v)) => writeln!(out, "{name}: {} {} {}", v.x, v.y, v.z),
            Err(_) => Ok(()),
        }
    }
}
