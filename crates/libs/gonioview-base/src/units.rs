//! Units of measurement used across gonioview.

mod angle;

pub use angle::*;

/// Returns the index of the first character that is not part of a number,
/// i.e. where the unit starts. The `e` of an exponent (`1e-3`) belongs to
/// the number.
fn find_unit_start(s: &[u8]) -> Option<usize> {
    (0..s.len()).find(|&i| {
        let c = s[i];
        let exponent = matches!(c, b'e' | b'E')
            && i > 0
            && s[i - 1].is_ascii_digit()
            && s.get(i + 1)
                .is_some_and(|n| n.is_ascii_digit() || matches!(n, b'+' | b'-'));
        (c.is_ascii_alphabetic() || !c.is_ascii()) && !exponent
    })
}
