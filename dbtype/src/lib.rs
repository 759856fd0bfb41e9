//! Canonical in-memory/on-disk value representation (components B+C of
//! the client-side pipeline): one type-id enumeration, an immutable
//! domain descriptor, a tagged-union value container, and the 14
//! descriptor operations of §4.2 dispatched by `match domain.type_id()`.

pub mod compare;
pub mod descriptor;
pub mod domain;
pub mod layout;
pub mod numeric;
pub mod type_id;
pub mod value;

pub use compare::CmpResult;
pub use domain::{Codeset, Domain};
pub use type_id::{TypeId, FLOATING_PRECISION};
pub use value::{SetRef, SetRepr, Value, ValueData};
