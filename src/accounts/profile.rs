use solana_sdk::pubkey::Pubkey;

use super::{put_pubkey, put_str, read_pubkey, read_str, DecodeError, DecodeResult};

/// Byte layout of the per-user profile record. The two alignment bytes after
/// the length pair are part of the program's contract and stay zero.
pub mod layout {
    pub const OWNER: usize = 0;
    pub const USERNAME_LEN: usize = OWNER + 32;
    pub const BIO_LEN: usize = USERNAME_LEN + 1;
    pub const USERNAME: usize = BIO_LEN + 3;
    pub const USERNAME_CAP: usize = 32;
    pub const BIO: usize = USERNAME + USERNAME_CAP;
    pub const BIO_CAP: usize = 200;
    pub const INITIALIZED: usize = BIO + BIO_CAP;
    pub const RECORD_LEN: usize = INITIALIZED + 1;
}

/// Decoded user profile. Length fields are authoritative for the string
/// slots; the strings here are already trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub owner: Pubkey,
    pub username: String,
    pub bio: String,
    pub username_len: u8,
    pub bio_len: u8,
    pub initialized: bool,
}

impl UserProfile {
    pub fn decode(data: &[u8]) -> DecodeResult<Self> {
        let truncated = || DecodeError::Truncated {
            needed: layout::RECORD_LEN,
            got: data.len(),
        };

        let owner = read_pubkey(data, layout::OWNER).ok_or_else(truncated)?;
        let username_len = data.get(layout::USERNAME_LEN).copied().ok_or_else(truncated)?;
        let bio_len = data.get(layout::BIO_LEN).copied().ok_or_else(truncated)?;
        let username = read_str(
            data,
            layout::USERNAME,
            layout::USERNAME_CAP,
            username_len as usize,
        )
        .ok_or_else(truncated)?;
        let bio = read_str(data, layout::BIO, layout::BIO_CAP, bio_len as usize)
            .ok_or_else(truncated)?;
        let initialized = data
            .get(layout::INITIALIZED)
            .map(|&b| b != 0)
            .ok_or_else(truncated)?;

        if !initialized {
            return Err(DecodeError::NotInitialized);
        }

        Ok(Self {
            owner,
            username,
            bio,
            username_len,
            bio_len,
            initialized,
        })
    }

    pub fn encode(&self) -> [u8; layout::RECORD_LEN] {
        let mut buf = [0u8; layout::RECORD_LEN];
        put_pubkey(&mut buf, layout::OWNER, &self.owner);
        let username_len = put_str(&mut buf, layout::USERNAME, layout::USERNAME_CAP, &self.username);
        let bio_len = put_str(&mut buf, layout::BIO, layout::BIO_CAP, &self.bio);
        buf[layout::USERNAME_LEN] = username_len as u8;
        buf[layout::BIO_LEN] = bio_len as u8;
        buf[layout::INITIALIZED] = self.initialized as u8;
        buf
    }
}

/// Fixed-slot payload for the profile update instruction: byte-clamped
/// username and bio plus their stated lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePayload {
    pub username: [u8; layout::USERNAME_CAP],
    pub bio: [u8; layout::BIO_CAP],
    pub username_len: u8,
    pub bio_len: u8,
}

impl ProfilePayload {
    pub fn prepare(username: &str, bio: &str) -> Self {
        let mut username_fixed = [0u8; layout::USERNAME_CAP];
        let mut bio_fixed = [0u8; layout::BIO_CAP];
        let username_len = put_str(&mut username_fixed, 0, layout::USERNAME_CAP, username);
        let bio_len = put_str(&mut bio_fixed, 0, layout::BIO_CAP, bio);
        Self {
            username: username_fixed,
            bio: bio_fixed,
            username_len: username_len as u8,
            bio_len: bio_len as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample_profile() -> UserProfile {
        UserProfile {
            owner: Pubkey::new_unique(),
            username: "trader_one".to_string(),
            bio: "buys the dip".to_string(),
            username_len: 10,
            bio_len: 12,
            initialized: true,
        }
    }

    #[test]
    fn layout_matches_program_record() {
        assert_eq!(layout::USERNAME, 36);
        assert_eq!(layout::BIO, 68);
        assert_eq!(layout::INITIALIZED, 268);
        assert_eq!(layout::RECORD_LEN, 269);
    }

    #[test]
    fn roundtrip_preserves_fields() {
        let profile = sample_profile();
        let bytes = profile.encode();
        let decoded = UserProfile::decode(&bytes).unwrap();
        assert_eq!(decoded, profile);
        assert_eq!(decoded.encode(), bytes);
    }

    #[test]
    fn decode_trims_to_stated_length() {
        let mut bytes = sample_profile().encode();
        // Slot content longer than the stated length must be ignored.
        bytes[layout::USERNAME..layout::USERNAME + 8].copy_from_slice(b"abcdefgh");
        bytes[layout::USERNAME_LEN] = 3;
        let decoded = UserProfile::decode(&bytes).unwrap();
        assert_eq!(decoded.username, "abc");
    }

    #[test]
    fn decode_rejects_uninitialized_record() {
        let mut profile = sample_profile();
        profile.initialized = false;
        assert_matches!(
            UserProfile::decode(&profile.encode()),
            Err(DecodeError::NotInitialized)
        );
    }

    #[test]
    fn decode_rejects_truncated_record() {
        let bytes = sample_profile().encode();
        assert_matches!(
            UserProfile::decode(&bytes[..64]),
            Err(DecodeError::Truncated { .. })
        );
    }

    #[test]
    fn payload_clamps_to_slot_capacity() {
        let long_name = "n".repeat(50);
        let long_bio = "b".repeat(300);
        let payload = ProfilePayload::prepare(&long_name, &long_bio);
        assert_eq!(payload.username_len as usize, layout::USERNAME_CAP);
        assert_eq!(payload.bio_len as usize, layout::BIO_CAP);
        assert!(payload.username.iter().all(|&b| b == b'n'));
    }

    #[test]
    fn payload_keeps_short_fields_padded() {
        let payload = ProfilePayload::prepare("abc", "");
        assert_eq!(payload.username_len, 3);
        assert_eq!(payload.bio_len, 0);
        assert_eq!(&payload.username[..3], b"abc");
        assert!(payload.username[3..].iter().all(|&b| b == 0));
    }
}
