//! Per-chain random streams.
//!
//! All chains of a run share one seed. Each chain jumps ahead in the
//! shared stream by `DISCARD_STRIDE * (chain - 1)` draws, so as long as no
//! chain consumes more than `DISCARD_STRIDE` values the chains never see
//! the same part of the stream.

use rand::SeedableRng;
use rand_chacha::{ChaCha12Rng, ChaCha20Rng, ChaCha8Rng};

use crate::error::{HmcError, Result};

/// Number of 64 bit draws reserved for every chain.
///
/// This is an upper bound on the random numbers a single chain may
/// consume. Chains that draw more than 2^50 values run into the stream
/// of the next chain.
pub const DISCARD_STRIDE: u64 = 1 << 50;

/// Largest chain number whose stream fits into the generator.
///
/// The ChaCha block counter addresses 2^68 32 bit words. With two words
/// per draw and `DISCARD_STRIDE` draws per chain this leaves room for
/// exactly 2^17 chains.
pub const MAX_CHAIN: u64 = 1 << 17;

/// The generator used for initialization and sampling.
pub type ChainRng = ChaCha8Rng;

/// Generators that can skip ahead in their stream without producing values.
pub trait Discard {
    /// Advance the generator as if `n` 64 bit values had been drawn.
    fn discard(&mut self, n: u128);
}

macro_rules! impl_discard_chacha {
    ($($rng:ty),*) => {
        $(
            impl Discard for $rng {
                fn discard(&mut self, n: u128) {
                    // A u64 draw consumes two 32 bit words of the block
                    let words = n.wrapping_mul(2);
                    self.set_word_pos(self.get_word_pos().wrapping_add(words));
                }
            }
        )*
    };
}

impl_discard_chacha!(ChaCha8Rng, ChaCha12Rng, ChaCha20Rng);

/// Move `rng` to the start of the stream reserved for `chain`.
///
/// Chains are numbered from 1. Chain 1 leaves the generator untouched.
pub fn advance_chain<R: Discard + ?Sized>(rng: &mut R, chain: u64) -> Result<()> {
    if chain == 0 || chain > MAX_CHAIN {
        return Err(HmcError::InvalidChain(chain));
    }
    // Beyond 2^14 chains the offset no longer fits into a u64
    let skip = u128::from(DISCARD_STRIDE) * u128::from(chain - 1);
    log::debug!("Advancing random stream of chain {chain} by {skip} draws");
    rng.discard(skip);
    Ok(())
}

/// Create the generator for `chain` from the run-wide `seed`.
pub fn chain_rng(seed: u64, chain: u64) -> Result<ChainRng> {
    let mut rng = ChainRng::seed_from_u64(seed);
    advance_chain(&mut rng, chain)?;
    Ok(rng)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rand::Rng;

    use super::*;

    fn draws(rng: &mut ChainRng, count: usize) -> Vec<u64> {
        (0..count).map(|_| rng.random::<u64>()).collect()
    }

    #[test]
    fn first_chain_is_base_stream() {
        let mut base = ChainRng::seed_from_u64(42);
        let mut chain = chain_rng(42, 1).unwrap();
        assert_eq!(draws(&mut base, 16), draws(&mut chain, 16));
    }

    #[test]
    fn discard_skips_draws() {
        let mut rng = ChainRng::seed_from_u64(3);
        let expected = draws(&mut rng, 10)[7..].to_vec();

        let mut skipped = ChainRng::seed_from_u64(3);
        skipped.discard(7);
        assert_eq!(expected, draws(&mut skipped, 3));
    }

    #[test]
    fn chain_offsets_are_strides() {
        let base = ChainRng::seed_from_u64(5);
        for chain in [1u64, 2, 7, MAX_CHAIN] {
            let rng = chain_rng(5, chain).unwrap();
            let offset = rng.get_word_pos() - base.get_word_pos();
            assert_eq!(offset, 2 * u128::from(DISCARD_STRIDE) * u128::from(chain - 1));
        }
    }

    #[test]
    fn invalid_chains() {
        assert!(matches!(chain_rng(1, 0), Err(HmcError::InvalidChain(0))));
        assert!(matches!(
            chain_rng(1, MAX_CHAIN + 1),
            Err(HmcError::InvalidChain(_))
        ));
    }

    #[test]
    fn same_seed_same_chain_is_reproducible() {
        let mut a = chain_rng(11, 4).unwrap();
        let mut b = chain_rng(11, 4).unwrap();
        assert_eq!(draws(&mut a, 32), draws(&mut b, 32));
    }

    #[test]
    fn high_chains_do_not_wrap() {
        let mut first = chain_rng(9, 1).unwrap();
        let expected = draws(&mut first, 64);
        for chain in [(1u64 << 14) + 1, (1 << 14) + 2, MAX_CHAIN] {
            let mut rng = chain_rng(9, chain).unwrap();
            let values = draws(&mut rng, 64);
            assert!(values.iter().all(|x| !expected.contains(x)));
        }
    }

    proptest! {
        #[test]
        fn chain_streams_disjoint(seed in any::<u64>(), c1 in 1u64..64, c2 in 1u64..64) {
            prop_assume!(c1 != c2);
            let mut rng1 = chain_rng(seed, c1).unwrap();
            let mut rng2 = chain_rng(seed, c2).unwrap();
            let first: HashSet<u64> = draws(&mut rng1, 1000).into_iter().collect();
            let second = draws(&mut rng2, 1000);
            prop_assert!(second.iter().all(|x| !first.contains(x)));
        }
    }
}
