//! Integer mixing and bucket addressing.

/// Thomas Wang's 32-bit integer mix.
///
/// Shifts are arithmetic on the signed key and arithmetic wraps, so negative
/// keys spread as well as positive ones. The result depends on the key only;
/// a grown table re-derives bucket indices from its new mask.
#[inline]
pub fn mix(key: i32) -> u32 {
    let mut a = key;
    a = (a ^ 61) ^ (a >> 16);
    a = a.wrapping_add(a << 3);
    a ^= a >> 4;
    a = a.wrapping_mul(0x27d4_eb2d);
    a ^= a >> 15;
    a as u32
}

/// Bucket index of `key` in a table with `mask = realsize - 1`.
#[inline]
pub(crate) fn bucket_index(key: i32, mask: usize) -> usize {
    (mix(key) as usize) & mask
}
