//! Operand formatting for IFJcode25.
//!
//! Numbers travel as C99 hex floats (`float@0x1.ep+6`); string operands
//! escape every byte that the target language cannot carry raw as a
//! three-digit decimal `\DDD` sequence.

/// Formats an `f64` the way C's `%a` does: `0x1.8p+6`, `-0x1.4p+1`,
/// `0x0p+0`. The hex mantissa is trimmed of trailing zeros.
pub fn hex_float(value: f64) -> String {
    if value == 0.0 {
        return if value.is_sign_negative() {
            "-0x0p+0".to_string()
        } else {
            "0x0p+0".to_string()
        };
    }

    let bits = value.to_bits();
    let sign = if bits >> 63 == 1 { "-" } else { "" };
    let raw_exp = ((bits >> 52) & 0x7ff) as i64;
    let frac = bits & 0x000f_ffff_ffff_ffff;

    // Subnormals have an implicit leading 0 and a fixed exponent.
    let (lead, exp) = if raw_exp == 0 {
        (0, -1022)
    } else {
        (1, raw_exp - 1023)
    };

    let mut mantissa = format!("{frac:013x}");
    while mantissa.len() > 1 && mantissa.ends_with('0') {
        mantissa.pop();
    }

    if frac == 0 {
        format!("{sign}0x{lead}p{exp:+}")
    } else {
        format!("{sign}0x{lead}.{mantissa}p{exp:+}")
    }
}

/// Escapes string literal bytes for a `string@` operand. Bytes below 33
/// (control characters and space), `#` (35) and `\` (92) must be encoded
/// as `\DDD`; bytes above 126 are encoded the same way so the emitted
/// program stays plain ASCII.
pub fn escape_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b <= 32 || b == 35 || b == 92 || b > 126 {
            out.push_str(&format!("\\{b:03}"));
        } else {
            out.push(b as char);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_float_whole_values() {
        assert_eq!(hex_float(0.0), "0x0p+0");
        assert_eq!(hex_float(1.0), "0x1p+0");
        assert_eq!(hex_float(2.0), "0x1p+1");
        assert_eq!(hex_float(5.0), "0x1.4p+2");
        assert_eq!(hex_float(120.0), "0x1.ep+6");
    }

    #[test]
    fn test_hex_float_fractions_and_negatives() {
        assert_eq!(hex_float(0.5), "0x1p-1");
        assert_eq!(hex_float(-2.5), "-0x1.4p+1");
        assert_eq!(hex_float(-0.0), "-0x0p+0");
    }

    #[test]
    fn test_hex_float_roundtrip() {
        // The %a encoding is exact; parsing the pieces back recovers the
        // original bit pattern.
        for v in [3.14159, 1e-8, 12345.6789, -0.001, 2.0_f64.powi(40)] {
            let text = hex_float(v);
            let (mantissa, exp) = text.split_once('p').unwrap();
            let exp: i32 = exp.parse().unwrap();
            let negative = mantissa.starts_with('-');
            let digits = mantissa.trim_start_matches('-').trim_start_matches("0x");
            let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
            let mut m = i64::from_str_radix(int_part, 16).unwrap() as f64;
            for (i, d) in frac_part.chars().enumerate() {
                m += d.to_digit(16).unwrap() as f64 / 16f64.powi(i as i32 + 1);
            }
            let restored = if negative { -m } else { m } * 2f64.powi(exp);
            assert_eq!(restored.to_bits(), v.to_bits(), "{v} -> {text}");
        }
    }

    #[test]
    fn test_escape_mandated_bytes() {
        assert_eq!(escape_string(b"ab"), "ab");
        assert_eq!(escape_string(b"a b"), "a\\032b");
        assert_eq!(escape_string(b"a\nb"), "a\\010b");
        assert_eq!(escape_string(b"#"), "\\035");
        assert_eq!(escape_string(b"\\"), "\\092");
        assert_eq!(escape_string(b"\x00\x1f"), "\\000\\031");
    }

    #[test]
    fn test_escape_high_bytes_stay_ascii() {
        let escaped = escape_string(&[200u8, b'x']);
        assert_eq!(escaped, "\\200x");
        assert!(escaped.is_ascii());
    }
}
