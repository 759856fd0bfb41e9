use std::cell::RefCell;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use wire::{Datetime, Monetary, Oid};

use common::err::CResult;

use crate::domain::Domain;

/// A set/multiset/sequence/vobj reference: either a materialised vector
/// of element Values, or a still-packed on-disk image the writer may
/// copy through verbatim (§4.2's "write may bypass materialisation").
/// `Rc` gives shared ownership with a reference count; single-threaded
/// by construction, matching §5's session-confined workspace model.
#[derive(Debug, Clone)]
pub enum SetRepr {
    Materialized(Rc<RefCell<Vec<Value>>>),
    Packed(Rc<Vec<u8>>),
}

#[derive(Debug, Clone)]
pub struct SetRef {
    pub repr: SetRepr,
}

impl SetRef {
    pub fn materialized(elements: Vec<Value>) -> Self {
        Self {
            repr: SetRepr::Materialized(Rc::new(RefCell::new(elements))),
        }
    }

    pub fn packed(bytes: Vec<u8>) -> Self {
        Self {
            repr: SetRepr::Packed(Rc::new(bytes)),
        }
    }
}

/// The discriminated data union a [`Value`] carries. Variants map onto
/// the type-id families of §3; `Value::is_null` governs whether this
/// union may be observed at all (variable-length types may still own
/// an allocated-but-empty buffer per the NULL invariant).
#[derive(Debug)]
pub enum ValueData {
    None,
    Short(i16),
    Integer(i32),
    Bigint(i64),
    Float(f32),
    Double(f64),
    Numeric(BigDecimal),
    Date(i32),
    Time(i32),
    Timestamp(i32),
    Datetime(Datetime),
    Monetary(Monetary),
    Bytes(Vec<u8>),
    Bits(Vec<bool>),
    Oid(Oid),
    Elo(Vec<u8>),
    Set(SetRef),
    MidxKey(Vec<Value>),
    Pointer(u64),
    Error(i32),
    Substructure(Vec<u8>),
    Variable(Vec<u8>),
    ResultSet(i32),
}

/// Hand-written rather than derived: deriving `Clone` here would
/// require `Value: Clone` (for the `MidxKey` variant's `Vec<Value>`),
/// and `Value` deliberately does not implement `Clone` (see below).
/// `Set`'s clone shares the underlying `Rc` (an intentional shallow
/// reference-count bump, matching the set reference semantics of
/// §4.2); everything else, including `MidxKey`'s nested columns, is
/// copied through `clone_value` so no two `Value`s ever alias a `Vec`.
impl Clone for ValueData {
    fn clone(&self) -> Self {
        match self {
            ValueData::None => ValueData::None,
            ValueData::Short(v) => ValueData::Short(*v),
            ValueData::Integer(v) => ValueData::Integer(*v),
            ValueData::Bigint(v) => ValueData::Bigint(*v),
            ValueData::Float(v) => ValueData::Float(*v),
            ValueData::Double(v) => ValueData::Double(*v),
            ValueData::Numeric(v) => ValueData::Numeric(v.clone()),
            ValueData::Date(v) => ValueData::Date(*v),
            ValueData::Time(v) => ValueData::Time(*v),
            ValueData::Timestamp(v) => ValueData::Timestamp(*v),
            ValueData::Datetime(v) => ValueData::Datetime(*v),
            ValueData::Monetary(v) => ValueData::Monetary(*v),
            ValueData::Bytes(v) => ValueData::Bytes(v.clone()),
            ValueData::Bits(v) => ValueData::Bits(v.clone()),
            ValueData::Oid(v) => ValueData::Oid(*v),
            ValueData::Elo(v) => ValueData::Elo(v.clone()),
            ValueData::Set(v) => ValueData::Set(v.clone()),
            ValueData::MidxKey(cols) => ValueData::MidxKey(cols.iter().map(clone_value).collect()),
            ValueData::Pointer(v) => ValueData::Pointer(*v),
            ValueData::Error(v) => ValueData::Error(*v),
            ValueData::Substructure(v) => ValueData::Substructure(v.clone()),
            ValueData::Variable(v) => ValueData::Variable(v.clone()),
            ValueData::ResultSet(v) => ValueData::ResultSet(*v),
        }
    }
}

/// Internal deep-copy helper. Not exposed as `impl Clone for Value`:
/// the absence of a public `Clone` impl is what forces every external
/// caller through [`Value::set_val`]-style assignment instead of an
/// accidental shallow copy (§4.3).
fn clone_value(v: &Value) -> Value {
    Value {
        domain: v.domain.clone(),
        data: v.data.clone(),
        is_null: v.is_null,
        needs_clear: v.needs_clear,
    }
}

/// Domain plus a discriminated data union, a null flag, and an
/// ownership flag. `Clone` is intentionally **not** derived: the only
/// sanctioned way to duplicate a `Value` is [`Value::set_val`] with
/// `copy = true`, so a shallow clone of an owned variable-length
/// payload can never happen by accident (§4.3).
#[derive(Debug)]
pub struct Value {
    domain: Domain,
    data: ValueData,
    is_null: bool,
    needs_clear: bool,
}

impl Value {
    pub fn new(domain: Domain, data: ValueData, needs_clear: bool) -> Self {
        Self {
            domain,
            data,
            is_null: false,
            needs_clear,
        }
    }

    /// `make_value`: a null Value of the given domain's logical null
    /// state.
    pub fn make_value(domain: Domain) -> Self {
        Self {
            domain,
            data: ValueData::None,
            is_null: true,
            needs_clear: false,
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn data(&self) -> &ValueData {
        &self.data
    }

    pub fn is_null(&self) -> bool {
        self.is_null
    }

    pub fn needs_clear(&self) -> bool {
        self.needs_clear
    }

    pub fn set_non_null(&mut self, data: ValueData, needs_clear: bool) {
        self.data = data;
        self.is_null = false;
        self.needs_clear = needs_clear;
    }

    /// Assignment with an explicit deep-copy flag — the only sanctioned
    /// way to duplicate a `Value` (§4.3).
    pub fn set_val(&mut self, src: &Value, copy: bool) -> CResult<()> {
        crate::descriptor::setval(self, src, copy)
    }

    /// `free_value`: release any owned heap payload and return the
    /// Value to its null state. Idempotent — calling twice on a Value
    /// with `needs_clear = false` is a no-op, matching the invariant
    /// that the release routine runs at most once per owned buffer.
    pub fn clear(&mut self) {
        if self.needs_clear {
            self.data = ValueData::None;
            self.needs_clear = false;
        }
        self.is_null = true;
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::type_id::TypeId;

    #[test]
    fn make_value_starts_null() {
        let v = Value::make_value(Domain::fixed(TypeId::Integer));
        assert!(v.is_null());
        assert!(!v.needs_clear());
    }

    #[test]
    fn clear_is_idempotent() {
        let mut v = Value::new(
            Domain::fixed(TypeId::VarChar),
            ValueData::Bytes(b"hi".to_vec()),
            true,
        );
        v.clear();
        assert!(v.is_null());
        assert!(!v.needs_clear());
        v.clear();
        assert!(v.is_null());
    }
}
