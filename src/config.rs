use std::{
    env,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use base64::{engine::general_purpose, Engine as _};
use dotenvy::Error as DotenvError;
use serde::Deserialize;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use thiserror::Error;

const DEFAULT_SLIPPAGE_BPS: u16 = 1_000;
const DEFAULT_CONFIRM_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_CONFIRM_POLL_MS: u64 = 500;
const DEFAULT_HISTORY_LIMIT: usize = 5;
const DEFAULT_QUOTE_UNITS: u64 = 1_000_000_000;
const DEFAULT_VERIFY_KEYWORD: &str = "MintyFunVerification";

const DEFAULT_LAUNCH_DECIMALS: u8 = 9;
const DEFAULT_LAUNCH_CURVE_TYPE: u8 = 0;
const DEFAULT_LAUNCH_FEE_BPS: u16 = 50;
const DEFAULT_LAUNCH_BASE_PRICE: u64 = 1_000;
const DEFAULT_LAUNCH_SLOPE: u64 = 0;
const DEFAULT_LAUNCH_MAX_SUPPLY: u64 = 1_000_000_000_000_000;

/// What the binary does after startup. Everything except Status submits a
/// transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineAction {
    Status,
    Buy,
    Sell,
    Launch,
    Profile,
}

impl EngineAction {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "status" => Some(Self::Status),
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            "launch" => Some(Self::Launch),
            "profile" => Some(Self::Profile),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Launch => "launch",
            Self::Profile => "profile",
        }
    }
}

/// Parameters for launching a new token, taken from LAUNCH_* variables.
#[derive(Clone, Copy, Debug)]
pub struct LaunchSettings {
    pub decimals: u8,
    pub curve_type: u8,
    pub fee_basis_points: u16,
    pub base_price: u64,
    pub slope: u64,
    pub max_supply: u64,
}

#[derive(Clone)]
pub struct Config {
    pub env_path: PathBuf,
    pub operator: Arc<Keypair>,
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub program_id: Pubkey,
    pub action: EngineAction,
    pub default_slippage_bps: u16,
    pub confirm_timeout_ms: u64,
    pub confirm_poll_ms: u64,
    pub history_limit: usize,
    pub track_mint: Option<Pubkey>,
    pub quote_units: u64,
    pub launch: LaunchSettings,
    pub profile_username: Option<String>,
    pub profile_bio: Option<String>,
    pub log_buy_marker: Option<String>,
    pub log_sell_marker: Option<String>,
    pub twitter_api_key: Option<String>,
    pub verify_keyword: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let env_path = env::current_dir()
            .map_err(|e| ConfigError::Io("current_dir".into(), e))?
            .join(".env");

        match dotenvy::from_path(&env_path) {
            Ok(_) => {}
            Err(DotenvError::LineParse(_, _)) | Err(DotenvError::Io(_)) if env_path.exists() => {
                return Err(ConfigError::Dotenv)
            }
            Err(_) => {
                return Err(ConfigError::MissingEnv(env_path));
            }
        }

        let raw = RawConfig::gather()?;

        let operator = Arc::new(parse_keypair(&raw.wallet_private_key)?);
        let program_id = Pubkey::from_str(raw.program_id.trim())
            .map_err(|e| ConfigError::Pubkey(raw.program_id.clone(), e))?;

        let commitment = match raw.commitment.as_deref() {
            Some(value) => CommitmentConfig::from_str(value)
                .map_err(|_| ConfigError::InvalidCommitment(value.to_string()))?,
            None => CommitmentConfig::confirmed(),
        };

        let action = match raw.action.as_deref() {
            Some(value) => EngineAction::parse(value)
                .ok_or_else(|| ConfigError::InvalidAction(value.to_string()))?,
            None => EngineAction::Status,
        };

        let default_slippage_bps = bounded(
            raw.default_slippage_bps,
            "DEFAULT_SLIPPAGE_BPS",
            10_000,
            DEFAULT_SLIPPAGE_BPS as u64,
        )? as u16;

        let launch = LaunchSettings {
            decimals: bounded(
                raw.launch_decimals,
                "LAUNCH_DECIMALS",
                u8::MAX as u64,
                DEFAULT_LAUNCH_DECIMALS as u64,
            )? as u8,
            curve_type: bounded(
                raw.launch_curve_type,
                "LAUNCH_CURVE_TYPE",
                u8::MAX as u64,
                DEFAULT_LAUNCH_CURVE_TYPE as u64,
            )? as u8,
            fee_basis_points: bounded(
                raw.launch_fee_bps,
                "LAUNCH_FEE_BPS",
                10_000,
                DEFAULT_LAUNCH_FEE_BPS as u64,
            )? as u16,
            base_price: raw.launch_base_price.unwrap_or(DEFAULT_LAUNCH_BASE_PRICE),
            slope: raw.launch_slope.unwrap_or(DEFAULT_LAUNCH_SLOPE),
            max_supply: raw.launch_max_supply.unwrap_or(DEFAULT_LAUNCH_MAX_SUPPLY),
        };

        let track_mint = parse_optional_pubkey(raw.track_mint.as_deref())?;

        Ok(Self {
            env_path,
            operator,
            rpc_url: raw.rpc_url,
            commitment,
            program_id,
            action,
            default_slippage_bps,
            confirm_timeout_ms: raw.confirm_timeout_ms.unwrap_or(DEFAULT_CONFIRM_TIMEOUT_MS),
            confirm_poll_ms: raw.confirm_poll_ms.unwrap_or(DEFAULT_CONFIRM_POLL_MS),
            history_limit: raw
                .history_limit
                .map(|v| v as usize)
                .unwrap_or(DEFAULT_HISTORY_LIMIT),
            track_mint,
            quote_units: raw.quote_units.unwrap_or(DEFAULT_QUOTE_UNITS),
            launch,
            profile_username: raw.profile_username,
            profile_bio: raw.profile_bio,
            log_buy_marker: raw.log_buy_marker,
            log_sell_marker: raw.log_sell_marker,
            twitter_api_key: raw.twitter_api_key,
            verify_keyword: raw
                .verify_keyword
                .unwrap_or_else(|| DEFAULT_VERIFY_KEYWORD.to_string()),
        })
    }

    pub fn operator_pubkey(&self) -> Pubkey {
        self.operator.pubkey()
    }

    pub fn operator_keypair(&self) -> Arc<Keypair> {
        Arc::clone(&self.operator)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn confirm_poll(&self) -> Duration {
        // A zero poll interval would hammer the RPC node.
        Duration::from_millis(self.confirm_poll_ms.max(1))
    }

    pub fn verifier_enabled(&self) -> bool {
        self.twitter_api_key.is_some()
    }
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(rename = "RPC_URL")]
    rpc_url: String,
    #[serde(rename = "WALLET_PRIVATE_KEY")]
    wallet_private_key: String,
    #[serde(rename = "XTOKEN_PROGRAM_ID")]
    program_id: String,
    #[serde(rename = "COMMITMENT", default, deserialize_with = "de_optional_string")]
    commitment: Option<String>,
    #[serde(rename = "ACTION", default, deserialize_with = "de_optional_string")]
    action: Option<String>,
    #[serde(
        rename = "DEFAULT_SLIPPAGE_BPS",
        default,
        deserialize_with = "de_optional_u64"
    )]
    default_slippage_bps: Option<u64>,
    #[serde(
        rename = "CONFIRM_TIMEOUT_MS",
        default,
        deserialize_with = "de_optional_u64"
    )]
    confirm_timeout_ms: Option<u64>,
    #[serde(
        rename = "CONFIRM_POLL_MS",
        default,
        deserialize_with = "de_optional_u64"
    )]
    confirm_poll_ms: Option<u64>,
    #[serde(
        rename = "HISTORY_LIMIT",
        default,
        deserialize_with = "de_optional_u64"
    )]
    history_limit: Option<u64>,
    #[serde(rename = "TRACK_MINT", default, deserialize_with = "de_optional_string")]
    track_mint: Option<String>,
    #[serde(rename = "QUOTE_UNITS", default, deserialize_with = "de_optional_u64")]
    quote_units: Option<u64>,
    #[serde(
        rename = "LAUNCH_DECIMALS",
        default,
        deserialize_with = "de_optional_u64"
    )]
    launch_decimals: Option<u64>,
    #[serde(
        rename = "LAUNCH_CURVE_TYPE",
        default,
        deserialize_with = "de_optional_u64"
    )]
    launch_curve_type: Option<u64>,
    #[serde(
        rename = "LAUNCH_FEE_BPS",
        default,
        deserialize_with = "de_optional_u64"
    )]
    launch_fee_bps: Option<u64>,
    #[serde(
        rename = "LAUNCH_BASE_PRICE",
        default,
        deserialize_with = "de_optional_u64"
    )]
    launch_base_price: Option<u64>,
    #[serde(
        rename = "LAUNCH_SLOPE",
        default,
        deserialize_with = "de_optional_u64"
    )]
    launch_slope: Option<u64>,
    #[serde(
        rename = "LAUNCH_MAX_SUPPLY",
        default,
        deserialize_with = "de_optional_u64"
    )]
    launch_max_supply: Option<u64>,
    #[serde(
        rename = "PROFILE_USERNAME",
        default,
        deserialize_with = "de_optional_string"
    )]
    profile_username: Option<String>,
    #[serde(
        rename = "PROFILE_BIO",
        default,
        deserialize_with = "de_optional_string"
    )]
    profile_bio: Option<String>,
    #[serde(
        rename = "LOG_BUY_MARKER",
        default,
        deserialize_with = "de_optional_string"
    )]
    log_buy_marker: Option<String>,
    #[serde(
        rename = "LOG_SELL_MARKER",
        default,
        deserialize_with = "de_optional_string"
    )]
    log_sell_marker: Option<String>,
    #[serde(
        rename = "TWITTER_API_KEY",
        default,
        deserialize_with = "de_optional_string"
    )]
    twitter_api_key: Option<String>,
    #[serde(
        rename = "VERIFY_KEYWORD",
        default,
        deserialize_with = "de_optional_string"
    )]
    verify_keyword: Option<String>,
}

impl RawConfig {
    fn gather() -> Result<Self, ConfigError> {
        let mut data = std::collections::BTreeMap::new();
        for (key, value) in env::vars() {
            data.insert(key, value);
        }
        let json = serde_json::to_value(&data).map_err(|e| ConfigError::Serde(e.to_string()))?;
        serde_json::from_value(json).map_err(|e| ConfigError::Serde(e.to_string()))
    }
}

fn bounded(value: Option<u64>, key: &str, max: u64, default: u64) -> Result<u64, ConfigError> {
    match value {
        Some(v) if v > max => Err(ConfigError::OutOfRange {
            key: key.to_string(),
            value: v.to_string(),
        }),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

fn parse_optional_pubkey(value: Option<&str>) -> Result<Option<Pubkey>, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Pubkey::from_str(v.trim())
            .map(Some)
            .map_err(|e| ConfigError::Pubkey(v.into(), e)),
        _ => Ok(None),
    }
}

fn parse_keypair(encoded: &str) -> Result<Keypair, ConfigError> {
    let trimmed = encoded.trim();

    if let Ok(bytes) = bs58::decode(trimmed).into_vec() {
        if let Ok(kp) = Keypair::from_bytes(&bytes) {
            return Ok(kp);
        }
    }

    if let Ok(bytes) = general_purpose::STANDARD.decode(trimmed.as_bytes()) {
        if let Ok(kp) = Keypair::from_bytes(&bytes) {
            return Ok(kp);
        }
    }

    if trimmed.starts_with('[') {
        if let Ok(vec) = serde_json::from_str::<Vec<u8>>(trimmed) {
            if let Ok(kp) = Keypair::from_bytes(&vec) {
                return Ok(kp);
            }
        }
    }

    Err(ConfigError::InvalidPrivateKey)
}

fn de_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    }))
}

fn de_optional_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(serde::de::Error::custom("expected integer"));
        }
        trimmed
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom("expected integer"))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            env_path: PathBuf::new(),
            operator: Arc::new(Keypair::new()),
            rpc_url: "http://localhost:8899".to_string(),
            commitment: CommitmentConfig::confirmed(),
            program_id: Pubkey::new_unique(),
            action: EngineAction::Status,
            default_slippage_bps: DEFAULT_SLIPPAGE_BPS,
            confirm_timeout_ms: DEFAULT_CONFIRM_TIMEOUT_MS,
            confirm_poll_ms: DEFAULT_CONFIRM_POLL_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            track_mint: None,
            quote_units: DEFAULT_QUOTE_UNITS,
            launch: LaunchSettings {
                decimals: DEFAULT_LAUNCH_DECIMALS,
                curve_type: DEFAULT_LAUNCH_CURVE_TYPE,
                fee_basis_points: DEFAULT_LAUNCH_FEE_BPS,
                base_price: DEFAULT_LAUNCH_BASE_PRICE,
                slope: DEFAULT_LAUNCH_SLOPE,
                max_supply: DEFAULT_LAUNCH_MAX_SUPPLY,
            },
            profile_username: None,
            profile_bio: None,
            log_buy_marker: None,
            log_sell_marker: None,
            twitter_api_key: None,
            verify_keyword: DEFAULT_VERIFY_KEYWORD.to_string(),
        }
    }

    #[test]
    fn duration_helpers() {
        let mut config = sample_config();
        assert_eq!(config.confirm_timeout(), Duration::from_millis(30_000));
        assert_eq!(config.confirm_poll(), Duration::from_millis(500));

        config.confirm_poll_ms = 0;
        assert_eq!(config.confirm_poll(), Duration::from_millis(1));
    }

    #[test]
    fn verifier_enabled_tracks_api_key() {
        let mut config = sample_config();
        assert!(!config.verifier_enabled());
        config.twitter_api_key = Some("key".to_string());
        assert!(config.verifier_enabled());
    }

    #[test]
    fn action_parsing_accepts_known_names() {
        assert_eq!(EngineAction::parse("status"), Some(EngineAction::Status));
        assert_eq!(EngineAction::parse(" BUY "), Some(EngineAction::Buy));
        assert_eq!(EngineAction::parse("Sell"), Some(EngineAction::Sell));
        assert_eq!(EngineAction::parse("launch"), Some(EngineAction::Launch));
        assert_eq!(EngineAction::parse("profile"), Some(EngineAction::Profile));
        assert_eq!(EngineAction::parse("yolo"), None);
    }

    #[test]
    fn bounded_enforces_ceiling_and_default() {
        assert_eq!(bounded(None, "K", 10, 7).unwrap(), 7);
        assert_eq!(bounded(Some(10), "K", 10, 7).unwrap(), 10);
        assert!(matches!(
            bounded(Some(11), "K", 10, 7),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn keypair_parses_all_supported_encodings() {
        let keypair = Keypair::new();

        let bs58_encoded = keypair.to_base58_string();
        assert_eq!(
            parse_keypair(&bs58_encoded).unwrap().pubkey(),
            keypair.pubkey()
        );

        let base64_encoded = general_purpose::STANDARD.encode(keypair.to_bytes());
        assert_eq!(
            parse_keypair(&base64_encoded).unwrap().pubkey(),
            keypair.pubkey()
        );

        let json_encoded = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();
        assert_eq!(
            parse_keypair(&json_encoded).unwrap().pubkey(),
            keypair.pubkey()
        );
    }

    #[test]
    fn keypair_rejects_garbage() {
        assert!(matches!(
            parse_keypair("not a key"),
            Err(ConfigError::InvalidPrivateKey)
        ));
    }

    #[test]
    fn optional_pubkey_parsing() {
        assert_eq!(parse_optional_pubkey(None).unwrap(), None);
        assert_eq!(parse_optional_pubkey(Some("  ")).unwrap(), None);

        let key = Pubkey::new_unique();
        assert_eq!(
            parse_optional_pubkey(Some(&key.to_string())).unwrap(),
            Some(key)
        );

        assert!(parse_optional_pubkey(Some("garbage")).is_err());
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine working directory for {0}")]
    Io(String, #[source] std::io::Error),
    #[error("missing .env at {0}")]
    MissingEnv(PathBuf),
    #[error("failed to parse .env file")]
    Dotenv,
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("pubkey parse error for {0}")]
    Pubkey(String, #[source] solana_sdk::pubkey::ParsePubkeyError),
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("invalid commitment level: {0}")]
    InvalidCommitment(String),
    #[error("unknown action: {0}")]
    InvalidAction(String),
    #[error("value {value} out of range for {key}")]
    OutOfRange { key: String, value: String },
}

impl ConfigError {
    pub fn missing_env_path(&self) -> Option<&Path> {
        match self {
            ConfigError::MissingEnv(path) => Some(path.as_path()),
            _ => None,
        }
    }
}
