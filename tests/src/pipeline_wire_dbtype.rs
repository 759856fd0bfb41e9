//! S1 (integer round-trip), S2 (varchar 4-byte alignment), and S4
//! (MidxKey comparison) driven through `wire` and `dbtype` together,
//! the way a real value would cross the boundary between the two
//! components rather than through either crate's own unit tests.

#[cfg(test)]
mod pipeline_wire_dbtype {
    use dbtype::{CmpResult, Domain, TypeId, Value, ValueData};
    use wire::{InputBuffer, OutputBuffer};

    fn roundtrip(domain: Domain, value: Value) -> Value {
        let mut buf = OutputBuffer::with_capacity(256);
        dbtype::descriptor::writeval(&value, &mut buf).unwrap();
        let mut input = InputBuffer::new(buf.as_slice());
        dbtype::descriptor::readval(&domain, &mut input, -1).unwrap()
    }

    #[test]
    fn s1_integer_value_round_trips_through_the_wire_codec() {
        let domain = Domain::fixed(TypeId::Integer);
        let value = Value::new(domain.clone(), ValueData::Integer(-7), false);
        let back = roundtrip(domain, value);
        assert_eq!(back.data().clone(), ValueData::Integer(-7));
        assert!(!back.is_null());
    }

    #[test]
    fn s2_varchar_value_lands_on_a_4_byte_boundary() {
        let domain = Domain::fixed(TypeId::VarChar);
        let value = Value::new(domain.clone(), ValueData::Bytes(b"cubrid".to_vec()), true);

        let mut buf = OutputBuffer::with_capacity(64);
        dbtype::descriptor::writeval(&value, &mut buf).unwrap();
        assert_eq!(buf.len() % 4, 0, "varchar encoding must align to 4 bytes");

        let mut input = InputBuffer::new(buf.as_slice());
        let back = dbtype::descriptor::readval(&domain, &mut input, -1).unwrap();
        match back.data() {
            ValueData::Bytes(bytes) => assert_eq!(bytes, b"cubrid"),
            other => panic!("expected Bytes, got {:?}", other),
        }
    }

    #[test]
    fn s4_midxkey_compare_stops_at_first_unequal_column() {
        let col_domains = vec![Domain::fixed(TypeId::Integer), Domain::fixed(TypeId::Integer)];
        let domain = Domain::fixed(TypeId::MidxKey).with_setdomain(col_domains.clone());

        let a = Value::new(
            domain.clone(),
            ValueData::MidxKey(vec![
                Value::new(col_domains[0].clone(), ValueData::Integer(1), false),
                Value::new(col_domains[1].clone(), ValueData::Integer(5), false),
            ]),
            true,
        );
        let b = Value::new(
            domain.clone(),
            ValueData::MidxKey(vec![
                Value::new(col_domains[0].clone(), ValueData::Integer(1), false),
                Value::new(col_domains[1].clone(), ValueData::Integer(9), false),
            ]),
            true,
        );

        let mut start_col = 0;
        let result = dbtype::descriptor::cmpval(&a, &b, &domain, false, false, false, &mut start_col).unwrap();
        assert_eq!(result, CmpResult::Less);
        assert_eq!(start_col, 1, "comparison should stop at the first differing column");
    }

    #[test]
    fn s4_midxkey_compare_honours_descending_columns() {
        let col_domains = vec![Domain::fixed(TypeId::Integer).descending()];
        let domain = Domain::fixed(TypeId::MidxKey).with_setdomain(col_domains.clone());

        let a = Value::new(
            domain.clone(),
            ValueData::MidxKey(vec![Value::new(col_domains[0].clone(), ValueData::Integer(1), false)]),
            true,
        );
        let b = Value::new(
            domain.clone(),
            ValueData::MidxKey(vec![Value::new(col_domains[0].clone(), ValueData::Integer(2), false)]),
            true,
        );

        let mut start_col = 0;
        let result = dbtype::descriptor::cmpval(&a, &b, &domain, false, false, false, &mut start_col).unwrap();
        assert_eq!(result, CmpResult::Greater, "descending column inverts the raw ordering");
    }
}
