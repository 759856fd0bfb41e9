use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The closed type-id enumeration of §3: every domain and value carries
/// exactly one of these. Discriminants are the wire tag used by
/// `Domain`'s packed-domain encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum TypeId {
    Null = 0,
    Short = 1,
    Integer = 2,
    Bigint = 3,
    Float = 4,
    Double = 5,
    Numeric = 6,
    Date = 7,
    Time = 8,
    Timestamp = 9,
    Datetime = 10,
    Monetary = 11,
    Character = 12,
    VarChar = 13,
    NChar = 14,
    VarNChar = 15,
    Bit = 16,
    VarBit = 17,
    Object = 18,
    Oid = 19,
    Elo = 20,
    Set = 21,
    Multiset = 22,
    Sequence = 23,
    MidxKey = 24,
    Vobj = 25,
    Pointer = 26,
    Error = 27,
    Substructure = 28,
    Variable = 29,
    ResultSet = 30,
}

/// Sentinel precision meaning "derive from the value's byte length",
/// used by floating-precision character types.
pub const FLOATING_PRECISION: i32 = -1;

impl TypeId {
    pub fn is_fixed_width(self) -> bool {
        matches!(
            self,
            TypeId::Short
                | TypeId::Integer
                | TypeId::Bigint
                | TypeId::Float
                | TypeId::Double
                | TypeId::Date
                | TypeId::Time
                | TypeId::Timestamp
                | TypeId::Datetime
                | TypeId::Monetary
                | TypeId::Oid
        )
    }

    pub fn is_character(self) -> bool {
        matches!(
            self,
            TypeId::Character
                | TypeId::VarChar
                | TypeId::NChar
                | TypeId::VarNChar
                | TypeId::Bit
                | TypeId::VarBit
        )
    }

    pub fn is_set_family(self) -> bool {
        matches!(self, TypeId::Set | TypeId::Multiset | TypeId::Sequence | TypeId::Vobj)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_through_wire_tag() {
        let tag: u8 = TypeId::Monetary.into();
        assert_eq!(TypeId::try_from(tag).unwrap(), TypeId::Monetary);
    }
}
