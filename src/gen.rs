//! Stream preparation utilities: planting a syncseq and injecting noise.
//!
//! These are the generator-side counterparts of the search engine, used by
//! the CLI `gen` mode and by tests that need a stream with a known ground
//! truth. The engine itself never calls into this module.

use rand::Rng;

use crate::error::{Result, SyncscanError};
use crate::stream::BitStream;
use crate::types::Syncseq;

/// Block-noise configuration.
///
/// The stream is divided into blocks of `bit_block_size` bits; within each
/// block a single random bit is flipped with `block_bit_prob` percent
/// probability.
#[derive(Debug, Clone, Copy)]
pub struct NoiseConfig {
    /// Block size in bits; must be non-zero.
    pub bit_block_size: u32,
    /// Per-block flip probability in percent, `0..=100`.
    pub block_bit_prob: u32,
}

/// Overwrite the syncseq into the stream at `first_offset` and every
/// `period` bits after it.
///
/// Writes stay inside `[first_offset, end_offset)` (the stream end when
/// `end_offset` is `None`) and stop after `max_repeat` additional
/// occurrences when a cap is given. A syncseq running past the window end
/// is truncated.
pub fn write_syncseq(
    stream: &mut BitStream,
    syncseq: Syncseq,
    first_offset: u64,
    end_offset: Option<u64>,
    period: u32,
    max_repeat: Option<u32>,
) -> Result<()> {
    debug_assert!(period > 0);

    let end = end_offset
        .unwrap_or(stream.bit_len())
        .min(stream.bit_len());
    let word = syncseq.value().to_le_bytes();
    let bit_size = u64::from(syncseq.bit_size());

    let mut offset = first_offset;
    let mut written = 0u32;
    while offset < end {
        let count = bit_size.min(end - offset);
        stream.copy_bits_from(offset, &word, 0, count)?;

        if let Some(cap) = max_repeat {
            if written >= cap {
                break;
            }
        }
        written += 1;

        // an overlapped write (period shorter than the syncseq) still
        // advances by a full period
        offset += u64::from(period);
    }

    Ok(())
}

/// Splice the syncseq in front of every `period`-sized chunk of the input,
/// growing the stream.
///
/// The prefix before `first_offset` is copied verbatim; after it the output
/// alternates the syncseq with `period - bit_size` source bits, so in the
/// output the syncseq repeats at exactly `period`. Requires the period to
/// exceed the syncseq length.
pub fn insert_syncseq(
    stream: &BitStream,
    syncseq: Syncseq,
    first_offset: u64,
    period: u32,
) -> Result<BitStream> {
    let bit_size = u64::from(syncseq.bit_size());
    let period = u64::from(period);
    debug_assert!(period > bit_size);

    let n = stream.bit_len();
    if first_offset >= n {
        return Err(SyncscanError::BitRangeOutOfBounds {
            offset: first_offset,
            count: bit_size,
            capacity: n,
        });
    }
    let insertions = (n - first_offset - 1) / (period - bit_size) + 1;
    let out_bits = n + insertions * bit_size;

    let mut out = BitStream::zeroed(out_bits)?;
    let word = syncseq.value().to_le_bytes();

    out.copy_bits_from(0, stream.as_bytes(), 0, first_offset)?;

    let mut from = first_offset;
    let mut to = first_offset;
    let data_step = period - bit_size;

    while from < n && to < out_bits {
        let seq_bits = bit_size.min(out_bits - to);
        out.copy_bits_from(to, &word, 0, seq_bits)?;
        to += seq_bits;
        if to >= out_bits {
            break;
        }

        let data_bits = data_step.min(n - from).min(out_bits - to);
        if data_bits > 0 {
            out.copy_bits_from(to, stream.as_bytes(), from, data_bits)?;
        }
        from += data_bits;
        to += data_bits;
    }

    Ok(out)
}

/// Flip one random bit per block with the configured probability.
pub fn inject_block_noise<R: Rng>(stream: &mut BitStream, config: &NoiseConfig, rng: &mut R) {
    debug_assert!(config.bit_block_size > 0);
    debug_assert!(config.block_bit_prob <= 100);

    let n = stream.bit_len();
    let block = u64::from(config.bit_block_size);

    let mut block_start = 0u64;
    while block_start < n {
        let remain = block.min(n - block_start);
        if rng.gen_range(0..100) < config.block_bit_prob {
            let bit = rng.gen_range(0..remain);
            stream.flip_bit(block_start + bit);
        }
        block_start += block;
    }
}

/// Flip exactly `count` distinct bits inside `[start, start + len)`.
pub fn flip_bits_in_window<R: Rng>(
    stream: &mut BitStream,
    start: u64,
    len: u64,
    count: u32,
    rng: &mut R,
) {
    debug_assert!(u64::from(count) <= len);
    debug_assert!(start + len <= stream.bit_len());

    let mut flipped: Vec<u64> = Vec::with_capacity(count as usize);
    while flipped.len() < count as usize {
        let bit = start + rng.gen_range(0..len);
        if !flipped.contains(&bit) {
            flipped.push(bit);
            stream.flip_bit(bit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_write_syncseq_periodic_fill() {
        let mut stream = BitStream::zeroed(64).unwrap();
        let syncseq = Syncseq::new(0xA5, 8).unwrap();

        write_syncseq(&mut stream, syncseq, 7, None, 20, None).unwrap();

        for &offset in &[7u64, 27, 47] {
            assert_eq!(stream.window(offset, 0xFF), 0xA5, "offset {offset}");
        }
        // untouched gaps stay zero
        assert_eq!(stream.window(15, 0xFF), 0x00);
    }

    #[test]
    fn test_write_syncseq_truncates_at_end() {
        let mut stream = BitStream::zeroed(20).unwrap();
        let syncseq = Syncseq::new(0xFF, 8).unwrap();

        write_syncseq(&mut stream, syncseq, 16, None, 8, None).unwrap();

        // only 4 bits fit
        assert_eq!(stream.as_bytes(), &[0x00, 0x00, 0x0F]);
    }

    #[test]
    fn test_write_syncseq_repeat_cap() {
        let mut stream = BitStream::zeroed(64).unwrap();
        let syncseq = Syncseq::new(0xFF, 8).unwrap();

        write_syncseq(&mut stream, syncseq, 0, None, 16, Some(1)).unwrap();

        assert_eq!(stream.window(0, 0xFF), 0xFF);
        assert_eq!(stream.window(16, 0xFF), 0xFF);
        assert_eq!(stream.window(32, 0xFF), 0x00);
    }

    #[test]
    fn test_insert_syncseq_grows_stream() {
        // 16 data bits, syncseq of 4, period 8: two insertions of 4 bits
        let stream = BitStream::new(&[0xFF, 0xFF]).unwrap();
        let syncseq = Syncseq::new(0x5, 4).unwrap();

        let out = insert_syncseq(&stream, syncseq, 0, 8).unwrap();

        // 16 + 4 * ceil(16 / 4 periods) -> 4 insertions
        assert_eq!(out.bit_len(), 32);
        for &offset in &[0u64, 8, 16, 24] {
            assert_eq!(out.window(offset, 0xF), 0x5, "offset {offset}");
        }
        for &offset in &[4u64, 12, 20] {
            assert_eq!(out.window(offset, 0xF), 0xF, "offset {offset}");
        }
    }

    #[test]
    fn test_block_noise_flips_at_most_one_bit_per_block() {
        let mut stream = BitStream::zeroed(256).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        inject_block_noise(
            &mut stream,
            &NoiseConfig {
                bit_block_size: 32,
                block_bit_prob: 100,
            },
            &mut rng,
        );

        for block in 0..8u64 {
            let ones = (0..32u64)
                .filter(|&i| stream.bit(block * 32 + i))
                .count();
            assert_eq!(ones, 1, "block {block}");
        }
    }

    #[test]
    fn test_block_noise_zero_prob_is_identity() {
        let mut stream = BitStream::new(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        let before = stream.as_bytes().to_vec();
        let mut rng = StdRng::seed_from_u64(7);

        inject_block_noise(
            &mut stream,
            &NoiseConfig {
                bit_block_size: 8,
                block_bit_prob: 0,
            },
            &mut rng,
        );

        assert_eq!(stream.as_bytes(), &before[..]);
    }

    #[test]
    fn test_flip_exact_count() {
        let mut stream = BitStream::zeroed(128).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        flip_bits_in_window(&mut stream, 40, 20, 7, &mut rng);

        let ones: Vec<u64> = (0..128).filter(|&i| stream.bit(i)).collect();
        assert_eq!(ones.len(), 7);
        assert!(ones.iter().all(|&i| (40..60).contains(&i)));
    }
}
