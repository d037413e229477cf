pub mod cigar;
pub mod fragment;

/// Base code for `N`/unknown.
pub const BASE_N: u8 = 4;

/// Complement of an encoded base (`N` maps to itself).
#[inline]
pub fn complement(base: u8) -> u8 {
    if base < BASE_N {
        3 - base
    } else {
        base
    }
}

/// Whether two encoded bases are compatible.
///
/// Positions where either side is `N` never count as mismatches.
#[inline]
pub fn is_match(read_base: u8, reference_base: u8) -> bool {
    read_base == reference_base || read_base == BASE_N || reference_base == BASE_N
}

/// Count mismatching positions over two base streams.
///
/// The count stops at the shorter stream, which lets reference walkers clamp
/// at contig boundaries.
pub fn count_mismatches<R, C>(read: R, reference: C) -> u32
where
    R: IntoIterator<Item = u8>,
    C: IntoIterator<Item = u8>,
{
    read.into_iter()
        .zip(reference)
        .filter(|&(r, c)| !is_match(r, c))
        .count() as u32
}
