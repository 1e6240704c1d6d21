//! Small numeric helpers shared by the bit vector, hash-pair, and builder modules.

use bitm::ceiling_div;
use binout::{AsIs, Serializer};

/// Rounds `n` up to the nearest multiple of 64.
#[inline(always)]
pub fn round_up_64(n: u64) -> u64 {
    ceiling_div(n as usize, 64) as u64 * 64
}

/// Number of 64-bit words needed to hold `n_bits` bits.
#[inline(always)]
pub fn words_for_bits(n_bits: u64) -> usize {
    ceiling_div(n_bits as usize, 64)
}

/// Maps a 64-bit hash uniformly into `[0, n)` without a division.
///
/// Known as *fastrange*: see Daniel Lemire, *A fast alternative to the modulo
/// reduction*, <https://lemire.me/blog/2016/06/27/a-fast-alternative-to-the-modulo-reduction/>.
#[inline(always)]
pub fn fastrange(hash: u64, n: u64) -> u64 {
    (((hash as u128) * (n as u128)) >> 64) as u64
}

/// Reads `n_words` raw little-endian `u64` words from `input`.
pub fn read_words<R: std::io::Read + ?Sized>(input: &mut R, n_words: usize) -> std::io::Result<Box<[u64]>> {
    Ok(AsIs::read_n(input, n_words)?.into_boxed_slice())
}

/// Writes `words` to `output` as raw little-endian `u64`s.
pub fn write_words<W: std::io::Write + ?Sized>(output: &mut W, words: &[u64]) -> std::io::Result<()> {
    AsIs::write_all(output, words)
}
