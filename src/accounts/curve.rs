use solana_sdk::pubkey::Pubkey;

use super::{
    put_pubkey, put_str, put_u16_le, put_u64_le, read_bool, read_pubkey, read_str, read_u16_le,
    read_u64_le, DecodeError, DecodeResult,
};

/// Byte layout of the bonding-curve record. The offsets chain off each other
/// so a width change is a one-place edit; decode and encode both read from
/// here and nowhere else.
pub mod layout {
    pub const AUTHORITY: usize = 0;
    pub const TOKEN_MINT: usize = AUTHORITY + 32;
    pub const FEE_RECIPIENT: usize = TOKEN_MINT + 32;
    pub const LABEL_LEN: usize = FEE_RECIPIENT + 32;
    pub const LABEL: usize = LABEL_LEN + 1;
    pub const LABEL_CAP: usize = 31;
    pub const SOL_RESERVE: usize = LABEL + LABEL_CAP;
    pub const TOKEN_RESERVE: usize = SOL_RESERVE + 8;
    pub const TOTAL_SUPPLY: usize = TOKEN_RESERVE + 8;
    pub const BASE_PRICE: usize = TOTAL_SUPPLY + 8;
    pub const SLOPE: usize = BASE_PRICE + 8;
    pub const MAX_SUPPLY: usize = SLOPE + 8;
    pub const FEE_BASIS_POINTS: usize = MAX_SUPPLY + 8;
    pub const CURVE_TYPE: usize = FEE_BASIS_POINTS + 2;
    pub const INITIALIZED: usize = CURVE_TYPE + 1;
    pub const RECORD_LEN: usize = INITIALIZED + 1;
}

/// Pricing rule selector stored in the record's `curve_type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveType {
    /// Unit price grows linearly with supply.
    Linear,
    /// Fixed percentage markup over the base price, independent of supply.
    Proportional,
    /// Price grows with supply scaled against the base price itself.
    QuadraticLike,
}

impl CurveType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Linear),
            1 => Some(Self::Proportional),
            2 => Some(Self::QuadraticLike),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Self::Linear => 0,
            Self::Proportional => 1,
            Self::QuadraticLike => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Proportional => "proportional",
            Self::QuadraticLike => "quadratic-like",
        }
    }
}

/// Decoded bonding-curve state for one mint. All quantities are base units
/// (9 implied decimals) or lamports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveAccount {
    pub authority: Pubkey,
    pub token_mint: Pubkey,
    pub fee_recipient: Pubkey,
    pub owner_label: String,
    pub sol_reserve: u64,
    pub token_reserve: u64,
    pub total_supply: u64,
    pub base_price: u64,
    pub slope: u64,
    pub max_supply: u64,
    pub fee_basis_points: u16,
    pub curve_type: CurveType,
    pub initialized: bool,
}

impl CurveAccount {
    /// Decode a raw curve record. When `expected_mint` is supplied the stored
    /// mint must match it; a record that is too short or not initialized is
    /// never trusted.
    pub fn decode(data: &[u8], expected_mint: Option<&Pubkey>) -> DecodeResult<Self> {
        let truncated = || DecodeError::Truncated {
            needed: layout::RECORD_LEN,
            got: data.len(),
        };

        let authority = read_pubkey(data, layout::AUTHORITY).ok_or_else(truncated)?;
        let token_mint = read_pubkey(data, layout::TOKEN_MINT).ok_or_else(truncated)?;
        let fee_recipient = read_pubkey(data, layout::FEE_RECIPIENT).ok_or_else(truncated)?;
        let label_len = data.get(layout::LABEL_LEN).copied().ok_or_else(truncated)?;
        let owner_label =
            read_str(data, layout::LABEL, layout::LABEL_CAP, label_len as usize)
                .ok_or_else(truncated)?;
        let sol_reserve = read_u64_le(data, layout::SOL_RESERVE).ok_or_else(truncated)?;
        let token_reserve = read_u64_le(data, layout::TOKEN_RESERVE).ok_or_else(truncated)?;
        let total_supply = read_u64_le(data, layout::TOTAL_SUPPLY).ok_or_else(truncated)?;
        let base_price = read_u64_le(data, layout::BASE_PRICE).ok_or_else(truncated)?;
        let slope = read_u64_le(data, layout::SLOPE).ok_or_else(truncated)?;
        let max_supply = read_u64_le(data, layout::MAX_SUPPLY).ok_or_else(truncated)?;
        let fee_basis_points =
            read_u16_le(data, layout::FEE_BASIS_POINTS).ok_or_else(truncated)?;
        let curve_tag = data.get(layout::CURVE_TYPE).copied().ok_or_else(truncated)?;
        let initialized = read_bool(data, layout::INITIALIZED).ok_or_else(truncated)?;

        if !initialized {
            return Err(DecodeError::NotInitialized);
        }
        if let Some(expected) = expected_mint {
            if token_mint != *expected {
                return Err(DecodeError::MintMismatch {
                    expected: *expected,
                    found: token_mint,
                });
            }
        }
        let curve_type =
            CurveType::from_tag(curve_tag).ok_or(DecodeError::UnknownCurveType(curve_tag))?;

        Ok(Self {
            authority,
            token_mint,
            fee_recipient,
            owner_label,
            sol_reserve,
            token_reserve,
            total_supply,
            base_price,
            slope,
            max_supply,
            fee_basis_points,
            curve_type,
            initialized,
        })
    }

    /// Dual writer over the same layout. The label is clamped to its slot and
    /// the stored length field reflects the clamped byte count.
    pub fn encode(&self) -> [u8; layout::RECORD_LEN] {
        let mut buf = [0u8; layout::RECORD_LEN];
        put_pubkey(&mut buf, layout::AUTHORITY, &self.authority);
        put_pubkey(&mut buf, layout::TOKEN_MINT, &self.token_mint);
        put_pubkey(&mut buf, layout::FEE_RECIPIENT, &self.fee_recipient);
        let label_len = put_str(&mut buf, layout::LABEL, layout::LABEL_CAP, &self.owner_label);
        buf[layout::LABEL_LEN] = label_len as u8;
        put_u64_le(&mut buf, layout::SOL_RESERVE, self.sol_reserve);
        put_u64_le(&mut buf, layout::TOKEN_RESERVE, self.token_reserve);
        put_u64_le(&mut buf, layout::TOTAL_SUPPLY, self.total_supply);
        put_u64_le(&mut buf, layout::BASE_PRICE, self.base_price);
        put_u64_le(&mut buf, layout::SLOPE, self.slope);
        put_u64_le(&mut buf, layout::MAX_SUPPLY, self.max_supply);
        put_u16_le(&mut buf, layout::FEE_BASIS_POINTS, self.fee_basis_points);
        buf[layout::CURVE_TYPE] = self.curve_type.tag();
        buf[layout::INITIALIZED] = self.initialized as u8;
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample_account() -> CurveAccount {
        CurveAccount {
            authority: Pubkey::new_unique(),
            token_mint: Pubkey::new_unique(),
            fee_recipient: Pubkey::new_unique(),
            owner_label: "launchpad".to_string(),
            sol_reserve: 1_500_000_000,
            token_reserve: 42_000_000_000,
            total_supply: 5_000_000_000,
            base_price: 8,
            slope: 1_000,
            max_supply: 100_000_000_000,
            fee_basis_points: 50,
            curve_type: CurveType::Linear,
            initialized: true,
        }
    }

    #[test]
    fn layout_matches_program_record() {
        assert_eq!(layout::SOL_RESERVE, 128);
        assert_eq!(layout::FEE_BASIS_POINTS, 176);
        assert_eq!(layout::RECORD_LEN, 180);
    }

    #[test]
    fn roundtrip_is_byte_identical() {
        let account = sample_account();
        let bytes = account.encode();
        let decoded = CurveAccount::decode(&bytes, Some(&account.token_mint)).unwrap();
        assert_eq!(decoded, account);
        assert_eq!(decoded.encode(), bytes);
    }

    #[test]
    fn decode_reads_fixed_offsets() {
        // Hand-packed record, independent of the encoder, to pin the offsets.
        let mint = Pubkey::new_unique();
        let mut data = vec![0u8; layout::RECORD_LEN];
        data[32..64].copy_from_slice(mint.as_ref());
        data[96] = 4;
        data[97..101].copy_from_slice(b"mint");
        data[144..152].copy_from_slice(&5_000_000_000u64.to_le_bytes());
        data[152..160].copy_from_slice(&8u64.to_le_bytes());
        data[160..168].copy_from_slice(&1_000u64.to_le_bytes());
        data[168..176].copy_from_slice(&100_000_000_000u64.to_le_bytes());
        data[176..178].copy_from_slice(&50u16.to_le_bytes());
        data[178] = 0;
        data[179] = 1;

        let decoded = CurveAccount::decode(&data, Some(&mint)).unwrap();
        assert_eq!(decoded.token_mint, mint);
        assert_eq!(decoded.owner_label, "mint");
        assert_eq!(decoded.total_supply, 5_000_000_000);
        assert_eq!(decoded.base_price, 8);
        assert_eq!(decoded.slope, 1_000);
        assert_eq!(decoded.max_supply, 100_000_000_000);
        assert_eq!(decoded.fee_basis_points, 50);
        assert_eq!(decoded.curve_type, CurveType::Linear);
    }

    #[test]
    fn decode_rejects_truncated_record() {
        let bytes = sample_account().encode();
        let result = CurveAccount::decode(&bytes[..100], None);
        assert_matches!(
            result,
            Err(DecodeError::Truncated { needed, got }) if needed == layout::RECORD_LEN && got == 100
        );
    }

    #[test]
    fn decode_rejects_uninitialized_record() {
        let mut account = sample_account();
        account.initialized = false;
        let bytes = account.encode();
        assert_matches!(
            CurveAccount::decode(&bytes, None),
            Err(DecodeError::NotInitialized)
        );
    }

    #[test]
    fn decode_rejects_wrong_mint() {
        let account = sample_account();
        let bytes = account.encode();
        let other = Pubkey::new_unique();
        assert_matches!(
            CurveAccount::decode(&bytes, Some(&other)),
            Err(DecodeError::MintMismatch { expected, found })
                if expected == other && found == account.token_mint
        );
    }

    #[test]
    fn decode_rejects_unknown_curve_tag() {
        let mut bytes = sample_account().encode();
        bytes[layout::CURVE_TYPE] = 9;
        assert_matches!(
            CurveAccount::decode(&bytes, None),
            Err(DecodeError::UnknownCurveType(9))
        );
    }

    #[test]
    fn label_respects_stated_length_over_slot_contents() {
        let mut bytes = sample_account().encode();
        // Slot holds more bytes than the stated length claims.
        bytes[layout::LABEL..layout::LABEL + 6].copy_from_slice(b"abcXYZ");
        bytes[layout::LABEL_LEN] = 3;
        let decoded = CurveAccount::decode(&bytes, None).unwrap();
        assert_eq!(decoded.owner_label, "abc");
    }

    #[test]
    fn encode_clamps_oversized_label() {
        let mut account = sample_account();
        account.owner_label = "x".repeat(64);
        let bytes = account.encode();
        assert_eq!(bytes[layout::LABEL_LEN] as usize, layout::LABEL_CAP);
        let decoded = CurveAccount::decode(&bytes, None).unwrap();
        assert_eq!(decoded.owner_label.len(), layout::LABEL_CAP);
    }
}
