//! The uniform descriptor contract of §4.2, dispatched as one
//! `match domain.type_id()` per entry point rather than a vtable per
//! type (DESIGN NOTES §9): each operation below is a free function
//! grouping the behavior a `TypeDescriptor` would otherwise own.

use bigdecimal::BigDecimal;
use std::str::FromStr;

use common::err::client_error::ClientError;
use common::err::CResult;
use wire::{Datetime, Decode, Encode, InputBuffer, Monetary, Oid, OutputBuffer};

use crate::compare::{null_short_circuit, CmpResult};
use crate::domain::Domain;
use crate::layout::{fixed_disk_width, numeric_disk_width};
use crate::numeric::{pack_decimal, unpack_decimal};
use crate::type_id::TypeId;
use crate::value::{SetRef, SetRepr, Value, ValueData};

/// The in-memory representation of a type instance. This implementation
/// unifies the "memory region" and "on-disk image" the original
/// contract distinguishes: without raw-pointer aliasing, a plain owned
/// byte buffer serves both roles, so `Mem` is simply the writeval'd
/// disk image for fixed-width types and the owned payload bytes for
/// variable-length ones.
pub type Mem = Vec<u8>;

fn char_pad_byte(domain: &Domain) -> u8 {
    match domain.type_id {
        TypeId::Character | TypeId::VarChar => 0x20,
        TypeId::NChar | TypeId::VarNChar => 0x20,
        TypeId::Bit | TypeId::VarBit => 0x00,
        _ => 0x00,
    }
}

/// `initmem(mem)`: initialise a raw memory region to the logical null
/// state for this domain.
pub fn initmem(domain: &Domain) -> CResult<Mem> {
    let width = lengthmem_for_domain(domain, false)?;
    Ok(vec![char_pad_byte(domain); width])
}

fn lengthmem_for_domain(domain: &Domain, disk: bool) -> CResult<usize> {
    if let Some(width) = fixed_disk_width(domain.type_id) {
        return Ok(width);
    }
    match domain.type_id {
        TypeId::Numeric => Ok(numeric_disk_width(domain.precision.max(0) as u8)),
        TypeId::Character | TypeId::NChar => Ok(domain.precision.max(0) as usize),
        TypeId::Bit => Ok(((domain.precision.max(0) as usize) + 7) / 8),
        // Variable-length types have no fixed mem width; callers must
        // use `lengthval` against an actual Value instead.
        _ => {
            let _ = disk;
            Err(ClientError::InvalidArgument(format!(
                "{:?} has no fixed-width memory representation",
                domain.type_id
            )))
        }
    }
}

/// `setmem(mem, domain, value)`: copy `value` into `mem` under `domain`.
pub fn setmem(mem: &mut Mem, domain: &Domain, value: &Value) -> CResult<()> {
    let mut buf = OutputBuffer::with_capacity(lengthval(value, true)?.max(64));
    writeval(value, &mut buf)?;
    let bytes = buf.as_slice();

    if domain.type_id.is_character() {
        let capacity = lengthmem_for_domain(domain, false)?;
        if bytes.len() > capacity && fixed_disk_width(domain.type_id).is_none() && domain.type_id != TypeId::VarChar
        {
            return Err(ClientError::DomainConflict(format!(
                "{:?} value of {} bytes exceeds declared precision {}",
                domain.type_id,
                bytes.len(),
                domain.precision
            )));
        }
    }

    mem.clear();
    mem.extend_from_slice(bytes);
    Ok(())
}

/// `getmem(mem, domain, value, copy)`: extract a Value from `mem`.
/// `copy` is honored by always materialising an owned buffer here —
/// Rust's borrow checker makes a genuinely aliasing "view" variant
/// unsound to expose across this API, so both paths return an owned
/// `Value`; only `needs_clear` differs, matching the ownership
/// bookkeeping the contract cares about.
pub fn getmem(mem: &Mem, domain: &Domain, copy: bool) -> CResult<Value> {
    let mut input = InputBuffer::new(mem);
    let mut value = readval(domain, &mut input, mem.len() as i32)?;
    if !copy {
        value.set_non_null(value.data().clone(), false);
    }
    Ok(value)
}

/// `lengthmem(mem, domain, disk)`: byte size of this instance in memory
/// or on disk. For this implementation the two coincide.
pub fn lengthmem(mem: &Mem, _domain: &Domain, _disk: bool) -> CResult<usize> {
    Ok(mem.len())
}

/// `lengthval(value, disk)`: byte size of `value`'s disk image.
pub fn lengthval(value: &Value, disk: bool) -> CResult<usize> {
    if value.is_null() {
        return Ok(0);
    }
    if let Some(width) = fixed_disk_width(value.domain().type_id) {
        return Ok(width);
    }
    match value.data() {
        ValueData::Numeric(_) => Ok(numeric_disk_width(value.domain().precision.max(0) as u8)),
        ValueData::Bytes(b) => Ok(varlen_disk_width(b.len(), disk)),
        ValueData::Bits(b) => Ok(varlen_disk_width((b.len() + 7) / 8, disk)),
        ValueData::Set(_) | ValueData::MidxKey(_) | ValueData::Elo(_) | ValueData::Substructure(_)
        | ValueData::Variable(_) => {
            let mut buf = OutputBuffer::with_capacity(4096);
            writeval(value, &mut buf)?;
            Ok(buf.len())
        }
        ValueData::None => Ok(0),
        _ => Ok(0),
    }
}

fn varlen_disk_width(payload_len: usize, disk: bool) -> usize {
    if !disk {
        return payload_len;
    }
    let prefix = if payload_len < 255 { 1 } else { 5 };
    let raw = prefix + payload_len + 1;
    (raw + 3) / 4 * 4
}

/// `writemem(mem, buf)`: marshal a memory-resident instance to a codec
/// buffer. Since `Mem` already holds the disk image in this
/// implementation, this is a verbatim copy.
pub fn writemem(mem: &Mem, buf: &mut OutputBuffer) -> CResult<()> {
    buf.put_bytes(mem)
}

/// `readmem(domain, buf)`: marshal a memory-resident instance out of a
/// codec buffer.
pub fn readmem(domain: &Domain, buf: &mut InputBuffer) -> CResult<Mem> {
    let width = lengthmem_for_domain(domain, true).unwrap_or(buf.remaining());
    Ok(buf.get_bytes(width)?.to_vec())
}

/// `writeval(value, buf)`: marshal a Value to a codec buffer.
pub fn writeval(value: &Value, buf: &mut OutputBuffer) -> CResult<()> {
    if value.is_null() {
        return Ok(());
    }
    match value.data() {
        ValueData::Short(v) => buf.put_i16(*v),
        ValueData::Integer(v) => buf.put_i32(*v),
        ValueData::Bigint(v) => buf.put_i64(*v),
        ValueData::Float(v) => buf.put_f32(*v),
        ValueData::Double(v) => buf.put_f64(*v),
        ValueData::Numeric(v) => {
            let packed = pack_decimal(v, value.domain().precision.max(0) as u8)?;
            buf.put_bytes(&packed)
        }
        ValueData::Date(v) | ValueData::Time(v) | ValueData::Timestamp(v) => buf.put_i32(*v),
        ValueData::Datetime(dt) => dt.encode(buf),
        ValueData::Monetary(m) => m.encode(buf),
        ValueData::Bytes(bytes) => {
            if matches!(value.domain().type_id, TypeId::Character | TypeId::NChar) {
                let width = value.domain().precision.max(0) as usize;
                if bytes.len() > width {
                    return Err(ClientError::DomainConflict(format!(
                        "{:?} value of {} bytes exceeds declared precision {}",
                        value.domain().type_id,
                        bytes.len(),
                        width
                    )));
                }
                let pad = char_pad_byte(value.domain());
                let mut padded = bytes.clone();
                padded.resize(width, pad);
                buf.put_bytes(&padded)
            } else {
                wire::put_varchar(buf, bytes)
            }
        }
        ValueData::Bits(bits) => {
            if value.domain().type_id == TypeId::Bit {
                let width_bytes = ((value.domain().precision.max(0) as usize) + 7) / 8;
                if bits.len() > width_bytes * 8 {
                    return Err(ClientError::DomainConflict(format!(
                        "Bit value of {} bits exceeds declared precision {}",
                        bits.len(),
                        value.domain().precision
                    )));
                }
                let mut packed = vec![0u8; width_bytes];
                for (i, bit) in bits.iter().enumerate() {
                    if *bit {
                        packed[i / 8] |= 0x80 >> (i % 8);
                    }
                }
                buf.put_bytes(&packed)
            } else {
                wire::put_varbit(buf, bits)
            }
        }
        ValueData::Oid(oid) => oid.encode(buf),
        ValueData::Elo(bytes) | ValueData::Substructure(bytes) | ValueData::Variable(bytes) => {
            wire::put_varchar(buf, bytes)
        }
        ValueData::Set(set_ref) => write_set(set_ref, buf),
        ValueData::MidxKey(columns) => write_midxkey(columns, buf),
        ValueData::Pointer(p) => buf.put_u64(*p),
        ValueData::Error(code) => buf.put_i32(*code),
        ValueData::ResultSet(handle) => buf.put_i32(*handle),
        ValueData::None => Ok(()),
    }
}

/// `readval(domain, buf, size_hint)`: marshal a Value out of a codec
/// buffer. `size_hint < 0` derives the length from the stream itself,
/// `0` yields the null Value, and a positive hint names the consumed
/// area length explicitly.
pub fn readval(domain: &Domain, buf: &mut InputBuffer, size_hint: i32) -> CResult<Value> {
    if size_hint == 0 {
        return Ok(Value::make_value(domain.clone()));
    }
    let data = match domain.type_id {
        TypeId::Short => ValueData::Short(buf.get_i16()?),
        TypeId::Integer => ValueData::Integer(buf.get_i32()?),
        TypeId::Bigint => ValueData::Bigint(buf.get_i64()?),
        TypeId::Float => ValueData::Float(buf.get_f32()?),
        TypeId::Double => ValueData::Double(buf.get_f64()?),
        TypeId::Numeric => {
            let width = numeric_disk_width(domain.precision.max(0) as u8);
            let bytes = buf.get_bytes(width)?;
            ValueData::Numeric(unpack_decimal(bytes, domain.precision.max(0) as u8, domain.scale)?)
        }
        TypeId::Date => ValueData::Date(buf.get_i32()?),
        TypeId::Time => ValueData::Time(buf.get_i32()?),
        TypeId::Timestamp => ValueData::Timestamp(buf.get_i32()?),
        TypeId::Datetime => ValueData::Datetime(Datetime::decode(buf)?),
        TypeId::Monetary => ValueData::Monetary(Monetary::decode(buf)?),
        TypeId::Character | TypeId::NChar => {
            let width = domain.precision.max(0) as usize;
            let bytes = buf.get_bytes(width)?;
            let pad = char_pad_byte(domain);
            let trimmed_len = bytes.iter().rposition(|b| *b != pad).map(|i| i + 1).unwrap_or(0);
            ValueData::Bytes(bytes[..trimmed_len].to_vec())
        }
        TypeId::VarChar | TypeId::VarNChar => ValueData::Bytes(wire::get_varchar(buf)?.to_vec()),
        TypeId::Bit => {
            let width_bytes = ((domain.precision.max(0) as usize) + 7) / 8;
            let bytes = buf.get_bytes(width_bytes)?;
            let mut bits = Vec::with_capacity(domain.precision.max(0) as usize);
            for i in 0..domain.precision.max(0) as usize {
                bits.push(bytes[i / 8] & (0x80 >> (i % 8)) != 0);
            }
            ValueData::Bits(bits)
        }
        TypeId::VarBit => ValueData::Bits(wire::get_varbit(buf)?),
        TypeId::Oid | TypeId::Object => ValueData::Oid(Oid::decode(buf)?),
        TypeId::Elo | TypeId::Substructure | TypeId::Variable => {
            ValueData::Bytes(wire::get_varchar(buf)?.to_vec())
        }
        TypeId::Set | TypeId::Multiset | TypeId::Sequence | TypeId::Vobj => read_set(domain, buf)?,
        TypeId::MidxKey => read_midxkey(domain, buf)?,
        TypeId::Pointer => ValueData::Pointer(buf.get_u64()?),
        TypeId::Error => ValueData::Error(buf.get_i32()?),
        TypeId::ResultSet => ValueData::ResultSet(buf.get_i32()?),
        TypeId::Null => ValueData::None,
    };
    let needs_clear = matches!(
        data,
        ValueData::Bytes(_) | ValueData::Bits(_) | ValueData::Set(_) | ValueData::MidxKey(_)
    );
    Ok(Value::new(domain.clone(), data, needs_clear))
}

/// `freemem(mem)`: release any owned heap referenced from `mem`. `Vec`
/// frees itself on drop; this still honors the explicit-release
/// contract so call sites that must run it eagerly (e.g. before
/// reusing a scratch buffer) have somewhere to call.
pub fn freemem(mem: &mut Mem) {
    mem.clear();
    mem.shrink_to_fit();
}

/// `initval(domain)`: initialise a Value to the null state of the
/// parameterised domain.
pub fn initval(domain: &Domain) -> Value {
    Value::make_value(domain.clone())
}

/// `setval(dst, src, copy)`: assignment with explicit deep-copy flag.
pub fn setval(dst: &mut Value, src: &Value, copy: bool) -> CResult<()> {
    if src.is_null() {
        dst.clear();
        return Ok(());
    }
    let data = if copy { deep_clone(src.data()) } else { src.data().clone() };
    dst.set_non_null(data, copy && owns_heap(src.data()));
    Ok(())
}

fn owns_heap(data: &ValueData) -> bool {
    matches!(
        data,
        ValueData::Bytes(_) | ValueData::Bits(_) | ValueData::Set(_) | ValueData::MidxKey(_)
    )
}

fn deep_clone(data: &ValueData) -> ValueData {
    match data {
        ValueData::Set(set_ref) => match &set_ref.repr {
            SetRepr::Materialized(elements) => {
                let cloned: Vec<Value> = elements
                    .borrow()
                    .iter()
                    .map(|v| {
                        let mut out = initval(v.domain());
                        let _ = setval(&mut out, v, true);
                        out
                    })
                    .collect();
                ValueData::Set(SetRef::materialized(cloned))
            }
            SetRepr::Packed(bytes) => ValueData::Set(SetRef::packed(bytes.as_ref().clone())),
        },
        ValueData::MidxKey(columns) => {
            let cloned = columns
                .iter()
                .map(|v| {
                    let mut out = initval(v.domain());
                    let _ = setval(&mut out, v, true);
                    out
                })
                .collect();
            ValueData::MidxKey(cloned)
        }
        other => other.clone(),
    }
}

fn write_set(set_ref: &SetRef, buf: &mut OutputBuffer) -> CResult<()> {
    match &set_ref.repr {
        SetRepr::Packed(bytes) => buf.put_bytes(bytes),
        SetRepr::Materialized(elements) => {
            let borrowed = elements.borrow();
            let mut encoded = Vec::with_capacity(borrowed.len());
            for el in borrowed.iter() {
                if el.is_null() {
                    encoded.push(None);
                } else {
                    let mut element_buf = OutputBuffer::with_capacity(lengthval(el, true)?.max(16));
                    writeval(el, &mut element_buf)?;
                    encoded.push(Some(element_buf.into_vec()));
                }
            }
            let header = wire::SetHeader::default();
            header.encode(buf, &encoded, true)
        }
    }
}

fn read_set(domain: &Domain, buf: &mut InputBuffer) -> CResult<ValueData> {
    let element_domain = domain
        .setdomain
        .first()
        .cloned()
        .unwrap_or_else(|| Domain::fixed(TypeId::Integer));
    let (_, bound, rest) = wire::SetHeader::decode(buf, true)?;
    let mut cursor = InputBuffer::new(rest);
    let mut elements = Vec::with_capacity(bound.len());
    for present in bound {
        if present {
            elements.push(readval(&element_domain, &mut cursor, -1)?);
        } else {
            elements.push(Value::make_value(element_domain.clone()));
        }
    }
    Ok(ValueData::Set(SetRef::materialized(elements)))
}

fn write_midxkey(columns: &[Value], buf: &mut OutputBuffer) -> CResult<()> {
    let bound_bytes = (columns.len() + 7) / 8;
    let mut bitmap = vec![0u8; bound_bytes];
    for (i, col) in columns.iter().enumerate() {
        if !col.is_null() {
            bitmap[i / 8] |= 0x80 >> (i % 8);
        }
    }
    buf.put_i32(columns.len() as i32)?;
    buf.put_bytes(&bitmap)?;
    buf.align4()?;
    for col in columns {
        writeval(col, buf)?;
    }
    Ok(())
}

fn read_midxkey(domain: &Domain, buf: &mut InputBuffer) -> CResult<ValueData> {
    let ncols = buf.get_i32()?.max(0) as usize;
    let bound_bytes = (ncols + 7) / 8;
    let bitmap = buf.get_bytes(bound_bytes)?;
    buf.align4()?;
    let mut columns = Vec::with_capacity(ncols);
    for i in 0..ncols {
        let present = bitmap[i / 8] & (0x80 >> (i % 8)) != 0;
        let col_domain = domain.setdomain.get(i).cloned().unwrap_or_else(|| Domain::fixed(TypeId::Integer));
        if present {
            columns.push(readval(&col_domain, buf, -1)?);
        } else {
            columns.push(Value::make_value(col_domain));
        }
    }
    Ok(ValueData::MidxKey(columns))
}

/// `cmpdisk(a, b, domain, reverse, coerce, total_order, start_col)`:
/// compare two on-disk representations by decoding and deferring to
/// [`cmpval`]. `coerce` is accepted for contract symmetry; this
/// implementation only coerces Numeric-vs-integer pairs (§4.2 notes
/// implicit promotion is permitted, not mandatory elsewhere).
pub fn cmpdisk(
    a: &[u8],
    b: &[u8],
    domain: &Domain,
    reverse: bool,
    coerce: bool,
    total_order: bool,
    start_col: &mut i32,
) -> CResult<CmpResult> {
    let mut ia = InputBuffer::new(a);
    let mut ib = InputBuffer::new(b);
    let va = readval(domain, &mut ia, -1)?;
    let vb = readval(domain, &mut ib, -1)?;
    cmpval(&va, &vb, domain, reverse, coerce, total_order, start_col)
}

/// `cmpval(a, b, domain, reverse, coerce, total_order, start_col)`.
pub fn cmpval(
    a: &Value,
    b: &Value,
    domain: &Domain,
    reverse: bool,
    coerce: bool,
    total_order: bool,
    start_col: &mut i32,
) -> CResult<CmpResult> {
    if domain.type_id == TypeId::MidxKey {
        return cmp_midxkey(a, b, domain, reverse, total_order, start_col);
    }

    if let Some(result) = null_short_circuit(a.is_null(), b.is_null(), total_order) {
        return Ok(result.apply_direction(reverse, domain.is_desc));
    }

    let raw = match (a.data(), b.data()) {
        (ValueData::Short(x), ValueData::Short(y)) => CmpResult::from_ordering(x.cmp(y)),
        (ValueData::Integer(x), ValueData::Integer(y)) => CmpResult::from_ordering(x.cmp(y)),
        (ValueData::Bigint(x), ValueData::Bigint(y)) => CmpResult::from_ordering(x.cmp(y)),
        (ValueData::Float(x), ValueData::Float(y)) => {
            CmpResult::from_ordering(x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal))
        }
        (ValueData::Double(x), ValueData::Double(y)) => {
            CmpResult::from_ordering(x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal))
        }
        (ValueData::Numeric(x), ValueData::Numeric(y)) => CmpResult::from_ordering(x.cmp(y)),
        (ValueData::Integer(x), ValueData::Numeric(y)) if coerce => {
            let lhs = BigDecimal::from_str(&x.to_string()).unwrap_or_default();
            CmpResult::from_ordering(lhs.cmp(y))
        }
        (ValueData::Date(x), ValueData::Date(y))
        | (ValueData::Time(x), ValueData::Time(y))
        | (ValueData::Timestamp(x), ValueData::Timestamp(y)) => CmpResult::from_ordering(x.cmp(y)),
        (ValueData::Datetime(x), ValueData::Datetime(y)) => CmpResult::from_ordering(
            (x.year, x.month, x.day, x.time_of_day_seconds, x.millisecond).cmp(&(
                y.year,
                y.month,
                y.day,
                y.time_of_day_seconds,
                y.millisecond,
            )),
        ),
        (ValueData::Monetary(x), ValueData::Monetary(y)) => CmpResult::from_ordering(
            x.amount.partial_cmp(&y.amount).unwrap_or(std::cmp::Ordering::Equal),
        ),
        (ValueData::Bytes(x), ValueData::Bytes(y)) => cmp_char_bytes(domain.type_id, x, y),
        (ValueData::Bits(x), ValueData::Bits(y)) => cmp_bits(x, y),
        (ValueData::Oid(x), ValueData::Oid(y)) => {
            CmpResult::from_ordering((x.volume, x.page, x.slot).cmp(&(y.volume, y.page, y.slot)))
        }
        (ValueData::Set(x), ValueData::Set(y)) => cmp_set(domain, x, y)?,
        (ValueData::Pointer(x), ValueData::Pointer(y)) => CmpResult::from_ordering(x.cmp(y)),
        (ValueData::Error(x), ValueData::Error(y)) => CmpResult::from_ordering(x.cmp(y)),
        (ValueData::ResultSet(x), ValueData::ResultSet(y)) => CmpResult::from_ordering(x.cmp(y)),
        _ => {
            return Err(ClientError::DomainConflict(format!(
                "cannot compare {:?} values of mismatched representations",
                domain.type_id
            )))
        }
    };
    Ok(raw.apply_direction(reverse, domain.is_desc))
}

fn cmp_char_bytes(type_id: TypeId, a: &[u8], b: &[u8]) -> CmpResult {
    let pad = if matches!(type_id, TypeId::Bit | TypeId::VarBit) {
        0x00
    } else {
        0x20
    };
    let max_len = a.len().max(b.len());
    for i in 0..max_len {
        let ai = *a.get(i).unwrap_or(&pad);
        let bi = *b.get(i).unwrap_or(&pad);
        if ai != bi {
            return CmpResult::from_ordering(ai.cmp(&bi));
        }
    }
    CmpResult::Equal
}

fn cmp_bits(a: &[bool], b: &[bool]) -> CmpResult {
    let max_len = a.len().max(b.len());
    for i in 0..max_len {
        let ai = *a.get(i).unwrap_or(&false);
        let bi = *b.get(i).unwrap_or(&false);
        if ai != bi {
            return CmpResult::from_ordering(ai.cmp(&bi));
        }
    }
    CmpResult::from_ordering(a.len().cmp(&b.len()))
}

fn cmp_set(domain: &Domain, a: &SetRef, b: &SetRef) -> CResult<CmpResult> {
    let (ea, eb) = (materialize(domain, a)?, materialize(domain, b)?);
    match domain.type_id {
        TypeId::Sequence | TypeId::Vobj => {
            for (x, y) in ea.iter().zip(eb.iter()) {
                let mut start_col = 0;
                let r = cmpval(x, y, x.domain(), false, false, false, &mut start_col)?;
                if r != CmpResult::Equal {
                    return Ok(r);
                }
            }
            Ok(CmpResult::from_ordering(ea.len().cmp(&eb.len())))
        }
        _ => {
            // Set/Multiset: order-insensitive. Sort a disk-encoded
            // representation of each side and compare lexicographically.
            let mut sa = encode_each(&ea)?;
            let mut sb = encode_each(&eb)?;
            sa.sort();
            sb.sort();
            Ok(CmpResult::from_ordering(sa.cmp(&sb)))
        }
    }
}

/// Materialises a set reference into its element `Value`s against the
/// enclosing Set/Multiset/Sequence/Vobj `domain` (which carries the
/// element domain via `domain.setdomain`). A `Packed` reference decodes
/// its still-packed on-disk image through the same [`read_set`] path
/// `readval` uses, rather than comparing as an empty set.
fn materialize(domain: &Domain, set_ref: &SetRef) -> CResult<Vec<Value>> {
    match &set_ref.repr {
        SetRepr::Materialized(elements) => Ok(elements
            .borrow()
            .iter()
            .map(|v| {
                let mut out = initval(v.domain());
                let _ = setval(&mut out, v, true);
                out
            })
            .collect()),
        SetRepr::Packed(bytes) => {
            let mut buf = InputBuffer::new(bytes.as_ref());
            match read_set(domain, &mut buf)? {
                ValueData::Set(decoded_ref) => materialize(domain, &decoded_ref),
                _ => unreachable!("read_set always decodes to ValueData::Set"),
            }
        }
    }
}

fn encode_each(values: &[Value]) -> CResult<Vec<Vec<u8>>> {
    values
        .iter()
        .map(|v| {
            let mut buf = OutputBuffer::with_capacity(lengthval(v, true)?.max(16));
            writeval(v, &mut buf)?;
            Ok(buf.into_vec())
        })
        .collect()
}

fn cmp_midxkey(
    a: &Value,
    b: &Value,
    domain: &Domain,
    reverse: bool,
    total_order: bool,
    start_col: &mut i32,
) -> CResult<CmpResult> {
    let (ca, cb) = match (a.data(), b.data()) {
        (ValueData::MidxKey(ca), ValueData::MidxKey(cb)) => (ca, cb),
        _ => {
            return Err(ClientError::DomainConflict(
                "cmpval on MidxKey requires MidxKey values".to_string(),
            ))

        }
    };
    let begin = (*start_col).max(0) as usize;
    for (i, col_domain) in domain.setdomain.iter().enumerate().skip(begin) {
        let (va, vb) = (ca.get(i), cb.get(i));
        let (va, vb) = match (va, vb) {
            (Some(va), Some(vb)) => (va, vb),
            _ => break,
        };
        let mut nested_start = 0;
        let r = cmpval(
            va,
            vb,
            col_domain,
            reverse ^ col_domain.is_desc,
            false,
            total_order,
            &mut nested_start,
        )?;
        if r != CmpResult::Equal {
            *start_col = i as i32;
            return Ok(r);
        }
    }
    *start_col = domain.setdomain.len() as i32;
    Ok(CmpResult::Equal)
}

#[cfg(test)]
mod test {
    use super::*;

    fn integer_value(v: i32) -> Value {
        Value::new(Domain::fixed(TypeId::Integer), ValueData::Integer(v), false)
    }

    #[test]
    fn writeval_readval_roundtrip_integer() {
        let v = integer_value(42);
        let mut buf = OutputBuffer::with_capacity(8);
        writeval(&v, &mut buf).unwrap();
        let mut input = InputBuffer::new(buf.as_slice());
        let back = readval(&Domain::fixed(TypeId::Integer), &mut input, -1).unwrap();
        assert_eq!(back.data().clone(), ValueData::Integer(42));
    }

    #[test]
    fn readval_zero_hint_yields_null() {
        let mut input = InputBuffer::new(&[]);
        let back = readval(&Domain::fixed(TypeId::Integer), &mut input, 0).unwrap();
        assert!(back.is_null());
    }

    #[test]
    fn char_comparison_ignores_trailing_space() {
        let mut start_col = 0;
        let domain = Domain::new(TypeId::Character, 5, 0);
        let a = Value::new(domain.clone(), ValueData::Bytes(b"ab".to_vec()), false);
        let b = Value::new(domain.clone(), ValueData::Bytes(b"ab   ".to_vec()), false);
        let r = cmpval(&a, &b, &domain, false, false, false, &mut start_col).unwrap();
        assert_eq!(r, CmpResult::Equal);
    }

    #[test]
    fn setmem_rejects_oversized_varchar() {
        let domain = Domain::new(TypeId::Character, 2, 0);
        let value = Value::new(domain.clone(), ValueData::Bytes(b"abcdef".to_vec()), false);
        let mut mem = Vec::new();
        assert!(matches!(setmem(&mut mem, &domain, &value), Err(ClientError::DomainConflict(_))));
    }

    #[test]
    fn setmem_rejects_oversized_bit() {
        // precision=8 -> width_bytes=1 -> 8 bits of capacity; 9 bits
        // overflows the backing byte and must reject rather than panic
        // on an out-of-bounds `packed[i / 8]` write.
        let domain = Domain::new(TypeId::Bit, 8, 0);
        let value = Value::new(
            domain.clone(),
            ValueData::Bits(vec![true; 9]),
            false,
        );
        let mut mem = Vec::new();
        assert!(matches!(setmem(&mut mem, &domain, &value), Err(ClientError::DomainConflict(_))));
    }

    #[test]
    fn monetary_roundtrips_through_descriptor() {
        let domain = Domain::fixed(TypeId::Monetary);
        let value = Value::new(
            domain.clone(),
            ValueData::Monetary(wire::Monetary { currency: 1, amount: 19.99 }),
            false,
        );
        let width = lengthval(&value, true).unwrap();
        assert_eq!(width, 16);

        let mut buf = OutputBuffer::with_capacity(width);
        writeval(&value, &mut buf).unwrap();
        assert_eq!(buf.len(), width);

        let mut input = InputBuffer::new(buf.as_slice());
        let mem = readmem(&domain, &mut input).unwrap();
        assert_eq!(mem.len(), width);

        let mut mem_input = InputBuffer::new(&mem);
        let back = readval(&domain, &mut mem_input, width as i32).unwrap();
        match back.data() {
            ValueData::Monetary(m) => {
                assert_eq!(m.currency, 1);
                assert!((m.amount - 19.99).abs() < 1e-9);
            }
            other => panic!("expected Monetary, got {:?}", other),
        }
    }

    #[test]
    fn packed_set_compares_by_decoded_contents_not_as_empty() {
        let element_domain = Domain::fixed(TypeId::Integer);
        let domain = Domain::new(TypeId::Multiset, 0, 0).with_setdomain(vec![element_domain]);

        let encode_packed = |values: &[i32]| -> SetRef {
            let materialized = SetRef::materialized(values.iter().map(|v| integer_value(*v)).collect());
            let mut buf = OutputBuffer::with_capacity(64);
            write_set(&materialized, &mut buf).unwrap();
            SetRef::packed(buf.into_vec())
        };

        let a = Value::new(domain.clone(), ValueData::Set(encode_packed(&[1, 2, 3])), false);
        let b = Value::new(domain.clone(), ValueData::Set(encode_packed(&[1, 2, 3])), false);
        let c = Value::new(domain.clone(), ValueData::Set(encode_packed(&[4, 5, 6])), false);

        let mut start_col = 0;
        assert_eq!(
            cmpval(&a, &b, &domain, false, false, false, &mut start_col).unwrap(),
            CmpResult::Equal
        );
        assert_ne!(
            cmpval(&a, &c, &domain, false, false, false, &mut start_col).unwrap(),
            CmpResult::Equal
        );
    }

    #[test]
    fn total_order_makes_null_sort_first() {
        let mut start_col = 0;
        let domain = Domain::fixed(TypeId::Integer);
        let null = Value::make_value(domain.clone());
        let present = integer_value(5);
        let r = cmpval(&null, &present, &domain, false, false, true, &mut start_col).unwrap();
        assert_eq!(r, CmpResult::Less);
    }
}

impl PartialEq for ValueData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ValueData::Short(a), ValueData::Short(b)) => a == b,
            (ValueData::Integer(a), ValueData::Integer(b)) => a == b,
            (ValueData::Bigint(a), ValueData::Bigint(b)) => a == b,
            (ValueData::Bytes(a), ValueData::Bytes(b)) => a == b,
            (ValueData::None, ValueData::None) => true,
            _ => false,
        }
    }
}
