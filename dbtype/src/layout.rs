use crate::type_id::TypeId;

/// Fixed on-disk byte widths, supplemented from
/// `original_source/object_primitive.c`'s constant table rather than
/// re-derived per call. `None` means the type is variable-length and its
/// width must be asked of the domain/value instead.
pub fn fixed_disk_width(type_id: TypeId) -> Option<usize> {
    match type_id {
        TypeId::Short => Some(2),
        TypeId::Integer => Some(4),
        TypeId::Bigint => Some(8),
        TypeId::Float => Some(4),
        TypeId::Double => Some(8),
        TypeId::Date => Some(4),
        TypeId::Time => Some(4),
        TypeId::Timestamp => Some(4),
        TypeId::Datetime => Some(8),
        // `wire::Monetary::encode` writes align8 + f64 (8 bytes) + i16 (2
        // bytes) + align8-pad, which from an 8-byte-aligned start produces
        // 16 bytes on the wire, not the bare sizeof(f64)+sizeof(i16)=10.
        TypeId::Monetary => Some(16),
        // original_source/object_primitive.c packs OID as an 8-byte
        // (pageid, volume, slot) disk triple; this implementation keeps
        // the wire-level (volume, page, slot) triple (wire::Oid::WIDTH,
        // 12 bytes) as the single representation end-to-end instead of
        // introducing a second packed disk form.
        TypeId::Oid => Some(wire::Oid::WIDTH),
        TypeId::Object => Some(wire::Oid::WIDTH),
        TypeId::Pointer => Some(8),
        TypeId::Error => Some(4),
        TypeId::ResultSet => Some(4),
        _ => None,
    }
}

/// Packed-decimal on-disk width for `Numeric(p, _)`: one sign byte plus
/// two BCD digits per byte.
pub fn numeric_disk_width(precision: u8) -> usize {
    1 + (precision as usize + 1) / 2
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn matches_supplemented_constant_table() {
        assert_eq!(fixed_disk_width(TypeId::Short), Some(2));
        assert_eq!(fixed_disk_width(TypeId::Integer), Some(4));
        assert_eq!(fixed_disk_width(TypeId::Bigint), Some(8));
        assert_eq!(fixed_disk_width(TypeId::Float), Some(4));
        assert_eq!(fixed_disk_width(TypeId::Double), Some(8));
        assert_eq!(fixed_disk_width(TypeId::Date), Some(4));
        assert_eq!(fixed_disk_width(TypeId::Time), Some(4));
        assert_eq!(fixed_disk_width(TypeId::Timestamp), Some(4));
        assert_eq!(fixed_disk_width(TypeId::Datetime), Some(8));
        assert_eq!(fixed_disk_width(TypeId::Monetary), Some(16));
        assert_eq!(fixed_disk_width(TypeId::Oid), Some(wire::Oid::WIDTH));
        assert_eq!(fixed_disk_width(TypeId::VarChar), None);
    }

    #[test]
    fn numeric_width_packs_two_digits_per_byte() {
        assert_eq!(numeric_disk_width(1), 2);
        assert_eq!(numeric_disk_width(4), 3);
        assert_eq!(numeric_disk_width(5), 4);
    }
}
