use crate::raw::ParamType;
use crate::value::ParamValue;
use embedded_storage::Storage;

/// Any byte addressable storage (EEPROM, FRAM, emulated EEPROM on flash) can back the
/// parameter store. See `tests/common.rs` for an example implementation.
pub trait Platform: Storage {}

impl<T: Storage> Platform for T {}

/// Receives a message whenever a parameter was explicitly saved or set-and-notified. This is
/// usually the ground station link.
pub trait Notify {
    fn notify(&mut self, name: &str, type_: ParamType, value: &ParamValue);
}

/// Discards all notifications.
impl Notify for () {
    fn notify(&mut self, _name: &str, _type: ParamType, _value: &ParamValue) {}
}

impl<N: Notify> Notify for &mut N {
    fn notify(&mut self, name: &str, type_: ParamType, value: &ParamValue) {
        (*self).notify(name, type_, value)
    }
}

/// Size of the stack buffer used for writes that are not bound to a single record.
const CHUNK_SIZE: usize = 32;

pub(crate) trait ChunkedOps: Platform {
    fn fill(&mut self, offset: u32, len: usize, value: u8) -> Result<(), Self::Error> {
        let buf = [value; CHUNK_SIZE];
        let mut done = 0;
        while done < len {
            let n = (len - done).min(CHUNK_SIZE);
            self.write(offset + done as u32, &buf[..n])?;
            done += n;
        }
        Ok(())
    }
}

impl<T: Platform> ChunkedOps for T {}
