use solana_sdk::pubkey::{Pubkey, MAX_SEED_LEN};
use thiserror::Error;

/// Seed tags the program uses for its derived accounts.
pub const CURVE_SEED: &[u8] = b"x_token";
pub const VAULT_SEED: &[u8] = b"sol_vault";
pub const PROFILE_SEED: &[u8] = b"user_profile";
pub const STATS_SEED: &[u8] = b"trading_stats";

#[derive(Debug, Error)]
pub enum PdaError {
    #[error("Seed {index} exceeds the maximum seed length: {len} > {MAX_SEED_LEN}")]
    InvalidSeeds { index: usize, len: usize },

    #[error("No viable bump seed for the given seeds")]
    NoViableBump,
}

/// Derive a program address from an ordered seed list. Pure and
/// deterministic; an over-long seed is a configuration error, not a
/// retryable condition.
pub fn derive_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<(Pubkey, u8), PdaError> {
    for (index, seed) in seeds.iter().enumerate() {
        if seed.len() > MAX_SEED_LEN {
            return Err(PdaError::InvalidSeeds {
                index,
                len: seed.len(),
            });
        }
    }
    Pubkey::try_find_program_address(seeds, program_id).ok_or(PdaError::NoViableBump)
}

/// Bonding-curve account for a mint.
pub fn curve_pda(mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CURVE_SEED, mint.as_ref()], program_id)
}

/// Currency custody vault for a mint's curve.
pub fn vault_pda(mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, mint.as_ref()], program_id)
}

/// Per-user profile record.
pub fn profile_pda(owner: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[PROFILE_SEED, owner.as_ref()], program_id)
}

/// Per-trader stats record; also the address whose signature history seeds
/// trade reconstruction.
pub fn stats_pda(owner: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[STATS_SEED, owner.as_ref()], program_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn derivation_is_deterministic() {
        let program_id = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        assert_eq!(curve_pda(&mint, &program_id), curve_pda(&mint, &program_id));
        assert_eq!(vault_pda(&mint, &program_id), vault_pda(&mint, &program_id));
    }

    #[test]
    fn distinct_tags_yield_distinct_addresses() {
        let program_id = Pubkey::new_unique();
        let key = Pubkey::new_unique();
        let (curve, _) = curve_pda(&key, &program_id);
        let (vault, _) = vault_pda(&key, &program_id);
        let (profile, _) = profile_pda(&key, &program_id);
        let (stats, _) = stats_pda(&key, &program_id);
        assert_ne!(curve, vault);
        assert_ne!(profile, stats);
        assert_ne!(curve, stats);
    }

    #[test]
    fn named_helpers_match_generic_derivation() {
        let program_id = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let derived = derive_address(&[STATS_SEED, owner.as_ref()], &program_id).unwrap();
        assert_eq!(derived, stats_pda(&owner, &program_id));
    }

    #[test]
    fn over_long_seed_is_rejected() {
        let program_id = Pubkey::new_unique();
        let long_seed = [0u8; 33];
        assert_matches!(
            derive_address(&[b"tag", &long_seed], &program_id),
            Err(PdaError::InvalidSeeds { index: 1, len: 33 })
        );
    }
}
