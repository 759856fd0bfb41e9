//! Byte-level wire codec (component A of the client-side pipeline).
//!
//! A bounded cursor over a byte buffer, with big-endian fixed-width
//! primitives, 4-/8-byte alignment bookkeeping, and the variable-length
//! encodings (`varchar`, `varbit`, `set`) used by every other component.

mod composite;
mod cursor;
mod varlen;

pub use composite::{Btid, Hfid, Lsa, Monetary, Oid, NULL_OID};
pub use cursor::{InputBuffer, OutputBuffer};
pub use varlen::{get_varbit, get_varchar, put_varbit, put_varchar, Datetime, SetHeader};

use common::err::client_error::ClientError;
use common::err::CResult;

/// A value that knows how to write itself into a bounded [`OutputBuffer`].
pub trait Encode {
    fn encode(&self, buf: &mut OutputBuffer) -> CResult<()>;
}

/// A value that knows how to read itself out of a bounded [`InputBuffer`].
pub trait Decode: Sized {
    fn decode(buf: &mut InputBuffer) -> CResult<Self>;
}

pub(crate) fn overflow() -> ClientError {
    ClientError::BufferOverflow
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrip_i32() {
        let mut out = OutputBuffer::with_capacity(4);
        out.put_i32(42).unwrap();
        let mut input = InputBuffer::new(out.as_slice());
        assert_eq!(input.get_i32().unwrap(), 42);
    }
}
