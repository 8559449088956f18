use solana_sdk::pubkey::Pubkey;

use super::{
    put_pubkey, put_u32_le, put_u64_le, read_pubkey, read_u32_le, read_u64_le, DecodeError,
    DecodeResult,
};

/// Byte layout of the per-trader stats record. The program reserves the gaps
/// at 40..56 and 60..128; the record length doubles as the program-account
/// scan filter.
pub mod layout {
    pub const OWNER: usize = 0;
    pub const TOTAL_VOLUME: usize = OWNER + 32;
    pub const TRADE_COUNT: usize = 56;
    pub const RECORD_LEN: usize = 128;
}

/// Per-trader lifetime totals, maintained by the program on every settled
/// trade. Read-only from this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingStats {
    pub owner: Pubkey,
    pub total_volume: u64,
    pub trade_count: u32,
}

impl TradingStats {
    pub fn decode(data: &[u8]) -> DecodeResult<Self> {
        let truncated = || DecodeError::Truncated {
            needed: layout::RECORD_LEN,
            got: data.len(),
        };

        // The reserved tail extends past the last field, so the length gate
        // has to be explicit here.
        if data.len() < layout::RECORD_LEN {
            return Err(truncated());
        }

        let owner = read_pubkey(data, layout::OWNER).ok_or_else(truncated)?;
        let total_volume = read_u64_le(data, layout::TOTAL_VOLUME).ok_or_else(truncated)?;
        let trade_count = read_u32_le(data, layout::TRADE_COUNT).ok_or_else(truncated)?;

        Ok(Self {
            owner,
            total_volume,
            trade_count,
        })
    }

    /// Zeroed stats for a trader whose record does not exist yet. The program
    /// creates the record on the first trade.
    pub fn absent(owner: Pubkey) -> Self {
        Self {
            owner,
            total_volume: 0,
            trade_count: 0,
        }
    }

    pub fn encode(&self) -> [u8; layout::RECORD_LEN] {
        let mut buf = [0u8; layout::RECORD_LEN];
        put_pubkey(&mut buf, layout::OWNER, &self.owner);
        put_u64_le(&mut buf, layout::TOTAL_VOLUME, self.total_volume);
        put_u32_le(&mut buf, layout::TRADE_COUNT, self.trade_count);
        buf
    }
}
