use bigdecimal::BigDecimal;
use common::err::client_error::ClientError;
use common::err::CResult;

use crate::layout::numeric_disk_width;

/// Packs `value` as a sign/magnitude BCD image of `precision` digits.
/// `setmem`/`setval` on `Numeric(p, s)` call this; the caller is
/// expected to have already validated that `value`'s own precision and
/// scale match the destination domain exactly (§4.2: "no implicit
/// rescale").
pub fn pack_decimal(value: &BigDecimal, precision: u8) -> CResult<Vec<u8>> {
    let (digits, sign_negative) = unscaled_digits(value);
    if digits.len() > precision as usize {
        return Err(ClientError::DomainConflict(format!(
            "numeric value has {} digits, domain precision is {}",
            digits.len(),
            precision
        )));
    }

    let mut padded = vec![0u8; precision as usize - digits.len()];
    padded.extend_from_slice(&digits);

    let mut out = Vec::with_capacity(numeric_disk_width(precision));
    out.push(if sign_negative { 1 } else { 0 });
    for pair in padded.chunks(2) {
        let hi = pair[0];
        let lo = *pair.get(1).unwrap_or(&0);
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

/// Inverse of [`pack_decimal`].
pub fn unpack_decimal(bytes: &[u8], precision: u8, scale: i16) -> CResult<BigDecimal> {
    let expected = numeric_disk_width(precision);
    if bytes.len() != expected {
        return Err(ClientError::DomainConflict(format!(
            "packed numeric width {} does not match precision {}",
            bytes.len(),
            precision
        )));
    }
    let negative = bytes[0] != 0;
    let mut digits = String::with_capacity(precision as usize);
    for byte in &bytes[1..] {
        digits.push(char::from_digit((byte >> 4) as u32, 10).unwrap_or('0'));
        digits.push(char::from_digit((byte & 0x0F) as u32, 10).unwrap_or('0'));
    }
    digits.truncate(precision as usize);

    let mut text = String::new();
    if negative {
        text.push('-');
    }
    text.push_str(&digits);
    let mut unscaled: BigDecimal = text.parse().map_err(|_| {
        ClientError::Bug(format!("unparseable packed numeric digits {:?}", digits))
    })?;
    if scale > 0 {
        unscaled = unscaled / BigDecimal::from(10i64.pow(scale as u32));
    }
    Ok(unscaled)
}

fn unscaled_digits(value: &BigDecimal) -> (Vec<u8>, bool) {
    let (bigint, _exp) = value.as_bigint_and_exponent();
    let text = bigint.to_string();
    let negative = text.starts_with('-');
    let digits: Vec<u8> = text
        .trim_start_matches('-')
        .bytes()
        .map(|b| b - b'0')
        .collect();
    (digits, negative)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn roundtrips_positive_value() {
        let value = BigDecimal::from_str("1234").unwrap();
        let packed = pack_decimal(&value, 6).unwrap();
        assert_eq!(packed.len(), numeric_disk_width(6));
        let back = unpack_decimal(&packed, 6, 0).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn roundtrips_negative_value() {
        let value = BigDecimal::from_str("42").unwrap();
        let negated = -value;
        let packed = pack_decimal(&negated, 4).unwrap();
        let back = unpack_decimal(&packed, 4, 0).unwrap();
        assert_eq!(back, negated);
    }

    #[test]
    fn rejects_overflowing_precision() {
        let value = BigDecimal::from_str("123456").unwrap();
        assert!(pack_decimal(&value, 3).is_err());
    }
}
