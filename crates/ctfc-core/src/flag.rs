//! Deterministic flag derivation for runs without a controller.
//!
//! Layout of the encoded bytes:
//!
//! ```text
//! | round: u64 BE | kind: u32 BE | team: u16 BE | tag: 10 bytes |
//! ```
//!
//! `tag` is the head of `SHA3-256(secret || round || kind || team)`. The
//! construction is a keyed prefix hash, not HMAC; tokens issued elsewhere
//! with this layout stay compatible only as long as it is kept bit-exact.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use ctfc_model::{Round, TeamId};
use sha3::{Digest, Sha3_256};

use crate::error::FlagError;

pub const FLAG_PREFIX: &str = "FLAG_";

/// Flag kind used for local runs.
pub const DEV_FLAG_KIND: u32 = 42;

/// Secret used for local runs.
pub const DEV_SECRET: &[u8] = b"TOPSECRET";

const DATA_LEN: usize = 8 + 4 + 2;
const TAG_LEN: usize = 10;

/// Fields carried by a flag token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagData {
    pub round: Round,
    pub kind: u32,
    pub team: TeamId,
}

#[derive(Clone)]
pub struct FlagCodec {
    secret: Vec<u8>,
    kind: u32,
}

impl FlagCodec {
    pub fn new(secret: impl Into<Vec<u8>>, kind: u32) -> Self {
        Self {
            secret: secret.into(),
            kind,
        }
    }

    /// Codec with the well-known local secret.
    pub fn dev() -> Self {
        Self::new(DEV_SECRET, DEV_FLAG_KIND)
    }

    pub fn derive(&self, round: Round, team: TeamId) -> String {
        let data = encode_data(round, self.kind, team);

        let mut raw = Vec::with_capacity(DATA_LEN + TAG_LEN);
        raw.extend_from_slice(&data);
        raw.extend_from_slice(&self.tag(&data));

        format!("{FLAG_PREFIX}{}", STANDARD.encode(raw))
    }

    /// Whether `token` is exactly the flag of `round` for `team`.
    pub fn verify(&self, token: &str, round: Round, team: TeamId) -> bool {
        token == self.derive(round, team)
    }

    /// Parses a token and checks its tag against this codec's secret.
    pub fn decode(&self, token: &str) -> Result<FlagData, FlagError> {
        let body = token
            .strip_prefix(FLAG_PREFIX)
            .ok_or(FlagError::InvalidFormat)?;
        let raw = STANDARD
            .decode(body)
            .map_err(|_| FlagError::InvalidFormat)?;
        if raw.len() != DATA_LEN + TAG_LEN {
            return Err(FlagError::InvalidFormat);
        }

        let (data, tag) = raw.split_at(DATA_LEN);
        if self.tag(data) != tag {
            return Err(FlagError::InvalidMac);
        }

        let mut round = [0u8; 8];
        round.copy_from_slice(&data[..8]);
        let mut kind = [0u8; 4];
        kind.copy_from_slice(&data[8..12]);
        let mut team = [0u8; 2];
        team.copy_from_slice(&data[12..]);

        Ok(FlagData {
            round: Round::from_be_bytes(round),
            kind: u32::from_be_bytes(kind),
            team: TeamId::from_be_bytes(team),
        })
    }

    fn tag(&self, data: &[u8]) -> [u8; TAG_LEN] {
        let mut hasher = Sha3_256::new();
        hasher.update(&self.secret);
        hasher.update(data);
        let digest = hasher.finalize();

        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&digest[..TAG_LEN]);
        tag
    }
}

impl std::fmt::Debug for FlagCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagCodec")
            .field("secret", &"<redacted>")
            .field("kind", &self.kind)
            .finish()
    }
}

fn encode_data(round: Round, kind: u32, team: TeamId) -> [u8; DATA_LEN] {
    let mut data = [0u8; DATA_LEN];
    data[..8].copy_from_slice(&round.to_be_bytes());
    data[8..12].copy_from_slice(&kind.to_be_bytes());
    data[12..].copy_from_slice(&team.to_be_bytes());
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_tokens() {
        let codec = FlagCodec::dev();
        assert_eq!(codec.derive(0, 1), "FLAG_AAAAAAAAAAAAAAAqAAGq7RBkx4P2njs6");
        assert_eq!(codec.derive(10, 3), "FLAG_AAAAAAAAAAoAAAAqAAOWIPdaKpXDRwht");
        assert_eq!(codec.derive(10, 4), "FLAG_AAAAAAAAAAoAAAAqAASyfQbmFelXKdEs");

        let other = FlagCodec::new(b"other".to_vec(), 42);
        assert_eq!(other.derive(1337, 65535), "FLAG_AAAAAAAABTkAAAAq///M09VkQBMbJCkE");
    }

    #[test]
    fn derivation_is_deterministic() {
        let codec = FlagCodec::dev();
        assert_eq!(codec.derive(77, 12), codec.derive(77, 12));
        assert_eq!(codec.derive(77, 12), FlagCodec::dev().derive(77, 12));
    }

    #[test]
    fn every_input_changes_the_token() {
        let base = FlagCodec::dev().derive(5, 9);

        assert_ne!(base, FlagCodec::dev().derive(6, 9));
        assert_ne!(base, FlagCodec::dev().derive(5, 10));
        assert_ne!(base, FlagCodec::new(b"TOPSECRET!".to_vec(), 42).derive(5, 9));
        assert_ne!(base, FlagCodec::new(DEV_SECRET, 43).derive(5, 9));
    }

    #[test]
    fn token_shape() {
        let token = FlagCodec::dev().derive(u64::MAX, u16::MAX);
        assert!(token.starts_with(FLAG_PREFIX));
        // 24 raw bytes encode to 32 base64 characters without padding.
        assert_eq!(token.len(), FLAG_PREFIX.len() + 32);
        assert!(!token.ends_with('='));
    }

    #[test]
    fn verify_checks_round_and_team() {
        let codec = FlagCodec::dev();
        let token = codec.derive(3, 4);

        assert!(codec.verify(&token, 3, 4));
        assert!(!codec.verify(&token, 2, 4));
        assert!(!codec.verify(&token, 3, 5));
    }

    #[test]
    fn decode_recovers_fields() {
        let codec = FlagCodec::dev();
        let data = codec.decode(&codec.derive(4242, 17)).unwrap();

        assert_eq!(
            data,
            FlagData {
                round: 4242,
                kind: DEV_FLAG_KIND,
                team: 17
            }
        );
    }

    #[test]
    fn decode_rejects_foreign_secret() {
        let token = FlagCodec::new(b"elsewhere".to_vec(), 42).derive(1, 1);
        assert_eq!(FlagCodec::dev().decode(&token), Err(FlagError::InvalidMac));
    }

    #[test]
    fn decode_rejects_malformed_tokens() {
        let codec = FlagCodec::dev();
        assert_eq!(codec.decode("FAUST_abc"), Err(FlagError::InvalidFormat));
        assert_eq!(codec.decode("FLAG_!!!"), Err(FlagError::InvalidFormat));
        assert_eq!(codec.decode("FLAG_AAAA"), Err(FlagError::InvalidFormat));
    }
}
