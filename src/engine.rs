use std::{
    collections::HashSet,
    str::FromStr,
    sync::{Arc, Mutex},
    time::Duration,
};

use log::{debug, info, warn};
use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_client::GetConfirmedSignaturesForAddress2Config,
    rpc_config::{
        RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSendTransactionConfig,
        RpcTransactionConfig,
    },
    rpc_filter::RpcFilterType,
};
use solana_rpc_client_api::client_error::Error as RpcClientError;
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    instruction::Instruction,
    message::{Message, VersionedMessage},
    packet::PACKET_DATA_SIZE,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::{Signer, SignerError},
    signers::Signers,
    transaction::VersionedTransaction,
};
use solana_transaction_status::{
    TransactionConfirmationStatus, TransactionStatus, UiTransactionEncoding,
};
use thiserror::Error;
use tokio::time::{sleep, Instant};

use crate::accounts::{
    curve::{CurveAccount, CurveType},
    profile::{ProfilePayload, UserProfile},
    stats::{layout as stats_layout, TradingStats},
    DecodeError,
};
use crate::config::Config;
use crate::curve::{
    instructions::{
        InitializeAccounts, InitializeParams, InstructionBuildError, TradeAccounts, TradeRequest,
        XTokenInstructionBuilder,
    },
    math,
    planner::{self, TradeDirection, TradeEstimate, TradePlan, ValidationError},
};
use crate::history::{self, HistoryEntry, LogClassifier, MarkerClassifier, SettledTransaction};
use crate::pda::{curve_pda, derive_address, profile_pda, stats_pda, PdaError, CURVE_SEED};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("account decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("trade validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("instruction build failed: {0}")]
    Build(#[from] InstructionBuildError),
    #[error("address derivation failed: {0}")]
    Pda(#[from] PdaError),
    #[error("rpc request failed: {0}")]
    Network(#[from] RpcClientError),
    #[error("no curve account for mint {0}")]
    CurveMissing(Pubkey),
    #[error("no profile account for {0}")]
    ProfileMissing(Pubkey),
    #[error("a submission for this trader and mint is already in flight")]
    TradeInFlight,
    #[error("transaction signing failed: {0}")]
    Signing(#[source] SignerError),
    #[error("node rejected the submission: {0}")]
    SubmissionRejected(String),
    #[error("serialized transaction is {size} bytes, limit {limit}")]
    TransactionTooLarge { size: usize, limit: usize },
    #[error("transaction serialization failed: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Lifecycle of one submission. Phases only ever move forward; the last
/// three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradePhase {
    Built,
    Signed,
    Submitted,
    Confirmed,
    Failed,
    TimedOut,
}

impl TradePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Built => "built",
            Self::Signed => "signed",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed | Self::TimedOut)
    }
}

/// Terminal record of one submission. `failure` carries the on-chain error
/// when the phase is Failed; a TimedOut receipt still names the signature so
/// the caller can keep watching it.
#[derive(Debug, Clone)]
pub struct TradeReceipt {
    pub signature: Signature,
    pub phase: TradePhase,
    pub slot: Option<u64>,
    pub failure: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub plan: TradePlan,
    pub receipt: TradeReceipt,
}

/// Spot pricing snapshot for one mint. Either side is None when the curve
/// state cannot support a trade of the quoted size.
#[derive(Debug, Clone)]
pub struct Quote {
    pub mint: Pubkey,
    pub curve_type: CurveType,
    pub spot_unit_price: u64,
    pub units: u64,
    pub buy: Option<TradeEstimate>,
    pub sell: Option<TradeEstimate>,
}

#[derive(Debug)]
pub struct TokenLaunch {
    pub mint: Pubkey,
    pub curve: Pubkey,
    pub receipt: TradeReceipt,
}

#[derive(Debug, Clone)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub owner: Pubkey,
    pub total_volume: u64,
    pub trade_count: u32,
}

/// At most one submission in flight per trader and mint. Acquiring hands out
/// a permit whose drop releases the slot, so every exit path of a submission
/// frees it.
#[derive(Default)]
pub struct SubmissionGuards {
    in_flight: Mutex<HashSet<(Pubkey, Pubkey)>>,
}

impl SubmissionGuards {
    pub fn try_acquire(&self, trader: Pubkey, mint: Pubkey) -> Option<SubmissionPermit<'_>> {
        let mut guard = self.in_flight.lock().unwrap();
        if !guard.insert((trader, mint)) {
            return None;
        }
        Some(SubmissionPermit {
            guards: self,
            key: (trader, mint),
        })
    }

    fn release(&self, key: &(Pubkey, Pubkey)) {
        self.in_flight.lock().unwrap().remove(key);
    }
}

pub struct SubmissionPermit<'a> {
    guards: &'a SubmissionGuards,
    key: (Pubkey, Pubkey),
}

impl Drop for SubmissionPermit<'_> {
    fn drop(&mut self) {
        self.guards.release(&self.key);
    }
}

/// Client for one x_token program deployment: account fetching, pricing,
/// trade submission and history reconstruction behind a single wallet.
pub struct TradeEngine {
    rpc: RpcClient,
    operator: Arc<Keypair>,
    program_id: Pubkey,
    commitment: CommitmentConfig,
    default_slippage_bps: u16,
    confirm_timeout: Duration,
    confirm_poll: Duration,
    history_limit: usize,
    classifier: Box<dyn LogClassifier + Send + Sync>,
    guards: SubmissionGuards,
}

impl TradeEngine {
    pub fn new(config: &Config) -> Self {
        let rpc = RpcClient::new_with_commitment(config.rpc_url.clone(), config.commitment);
        Self {
            rpc,
            operator: config.operator_keypair(),
            program_id: config.program_id,
            commitment: config.commitment,
            default_slippage_bps: config.default_slippage_bps,
            confirm_timeout: config.confirm_timeout(),
            confirm_poll: config.confirm_poll(),
            history_limit: config.history_limit,
            classifier: Box::new(MarkerClassifier::default()),
            guards: SubmissionGuards::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn LogClassifier + Send + Sync>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn operator_pubkey(&self) -> Pubkey {
        self.operator.pubkey()
    }

    pub async fn operator_balance(&self) -> Result<u64, EngineError> {
        Ok(self.rpc.get_balance(&self.operator.pubkey()).await?)
    }

    /// Fetch and decode the curve account for a mint, checking that the
    /// account actually belongs to that mint.
    pub async fn fetch_curve(&self, mint: &Pubkey) -> Result<CurveAccount, EngineError> {
        let (address, _) = curve_pda(mint, &self.program_id);
        let account = self
            .rpc
            .get_account_with_commitment(&address, self.commitment)
            .await?
            .value
            .ok_or(EngineError::CurveMissing(*mint))?;
        Ok(CurveAccount::decode(&account.data, Some(mint))?)
    }

    /// Price both sides of a trade of `units` at the current curve state
    /// without touching wallet balances.
    pub async fn quote(&self, mint: &Pubkey, units: u64) -> Result<Quote, EngineError> {
        let curve = self.fetch_curve(mint).await?;
        let spot_unit_price = math::unit_price(
            curve.curve_type,
            curve.base_price,
            curve.slope,
            curve.total_supply,
        )
        .ok_or(ValidationError::NumericOverflow)?;

        let buy = match planner::plan_buy(&curve, units, None, self.default_slippage_bps) {
            Ok(plan) => Some(plan.estimate),
            Err(err) => {
                debug!("Buy side unquotable | mint={} | err={}", mint, err);
                None
            }
        };
        let sell = match planner::plan_sell(&curve, units, None, self.default_slippage_bps) {
            Ok(plan) => Some(plan.estimate),
            Err(err) => {
                debug!("Sell side unquotable | mint={} | err={}", mint, err);
                None
            }
        };

        Ok(Quote {
            mint: *mint,
            curve_type: curve.curve_type,
            spot_unit_price,
            units,
            buy,
            sell,
        })
    }

    /// Plan, build, sign, submit and confirm one trade. Holdings are checked
    /// against the slippage bound before anything is sent, and at most one
    /// submission per trader and mint runs at a time.
    pub async fn execute_trade(
        &self,
        direction: TradeDirection,
        mint: &Pubkey,
        units: u64,
        tolerance_bps: Option<u16>,
    ) -> Result<TradeOutcome, EngineError> {
        let tolerance = tolerance_bps.unwrap_or(self.default_slippage_bps);
        let trader = self.operator.pubkey();
        let curve = self.fetch_curve(mint).await?;
        let accounts =
            TradeAccounts::for_trade(trader, *mint, curve.fee_recipient, &self.program_id);

        let plan = match direction {
            TradeDirection::Buy => {
                let held = self.rpc.get_balance(&trader).await?;
                planner::plan_buy(&curve, units, Some(held), tolerance)?
            }
            TradeDirection::Sell => {
                let held = self.token_balance(&accounts.trader_ata).await?;
                planner::plan_sell(&curve, units, Some(held), tolerance)?
            }
        };
        info!(
            "Trade planned | direction={} | mint={} | units={} | gross={} | fee={} | bound={} | tolerance_bps={}",
            direction.as_str(),
            mint,
            plan.units,
            plan.estimate.gross_amount,
            plan.estimate.fee_amount,
            plan.bound_amount,
            plan.tolerance_bps
        );

        let _permit = self
            .guards
            .try_acquire(trader, *mint)
            .ok_or(EngineError::TradeInFlight)?;

        let mut instructions = Vec::with_capacity(2);
        if direction == TradeDirection::Buy {
            // First-time buyers need the holding account; idempotent for
            // everyone else.
            instructions.push(XTokenInstructionBuilder::create_holding_ata(
                &trader, &trader, mint,
            ));
        }
        let request = TradeRequest {
            accounts: &accounts,
            program_id: self.program_id,
            plan: &plan,
        };
        instructions.push(match direction {
            TradeDirection::Buy => XTokenInstructionBuilder::buy(request)?,
            TradeDirection::Sell => XTokenInstructionBuilder::sell(request)?,
        });

        let receipt = self
            .submit_and_confirm(&instructions, &[self.operator.as_ref()])
            .await?;
        Ok(TradeOutcome { plan, receipt })
    }

    /// Create a fresh mint and its curve in one transaction. The mint
    /// keypair is generated here and co-signs.
    pub async fn create_token(
        &self,
        params: &InitializeParams,
    ) -> Result<TokenLaunch, EngineError> {
        let mint_keypair = Keypair::new();
        let mint = mint_keypair.pubkey();
        let authority = self.operator.pubkey();

        let (curve, _) = derive_address(&[CURVE_SEED, mint.as_ref()], &self.program_id)?;
        let accounts = InitializeAccounts {
            authority,
            curve,
            mint,
            payer: authority,
        };

        let rent = self
            .rpc
            .get_minimum_balance_for_rent_exemption(spl_token::state::Mint::LEN)
            .await?;

        let instructions =
            XTokenInstructionBuilder::initialize(&accounts, params, rent, self.program_id)?;
        info!(
            "Launching token | mint={} | curve={} | curve_type={}",
            mint, curve, params.curve_type
        );

        let receipt = self
            .submit_and_confirm(&instructions, &[self.operator.as_ref(), &mint_keypair])
            .await?;
        Ok(TokenLaunch {
            mint,
            curve,
            receipt,
        })
    }

    /// Write the operator's profile. The program creates the account on
    /// first use, so this covers both create and update.
    pub async fn update_profile(
        &self,
        username: &str,
        bio: &str,
    ) -> Result<TradeReceipt, EngineError> {
        let owner = self.operator.pubkey();
        let (profile, _) = profile_pda(&owner, &self.program_id);
        let payload = ProfilePayload::prepare(username, bio);
        let ix =
            XTokenInstructionBuilder::update_profile(&profile, &owner, &payload, self.program_id)?;
        info!(
            "Updating profile | owner={} | username_len={} | bio_len={}",
            owner, payload.username_len, payload.bio_len
        );
        self.submit_and_confirm(&[ix], &[self.operator.as_ref()])
            .await
    }

    pub async fn fetch_profile(&self, owner: &Pubkey) -> Result<UserProfile, EngineError> {
        let (address, _) = profile_pda(owner, &self.program_id);
        let account = self
            .rpc
            .get_account_with_commitment(&address, self.commitment)
            .await?
            .value
            .ok_or(EngineError::ProfileMissing(*owner))?;
        Ok(UserProfile::decode(&account.data)?)
    }

    /// Profiles for many owners in one round trip. Owners without a
    /// readable profile are left out.
    pub async fn fetch_profiles(
        &self,
        owners: &[Pubkey],
    ) -> Result<Vec<UserProfile>, EngineError> {
        let addresses: Vec<Pubkey> = owners
            .iter()
            .map(|owner| profile_pda(owner, &self.program_id).0)
            .collect();
        let accounts = self.rpc.get_multiple_accounts(&addresses).await?;

        let mut profiles = Vec::new();
        for (owner, account) in owners.iter().zip(accounts) {
            let account = match account {
                Some(account) => account,
                None => continue,
            };
            match UserProfile::decode(&account.data) {
                Ok(profile) => profiles.push(profile),
                Err(err) => {
                    debug!("Skipping undecodable profile | owner={} | err={}", owner, err)
                }
            }
        }
        Ok(profiles)
    }

    /// Stats for one trader. A missing account means the trader has not
    /// traded yet and comes back zeroed rather than as an error.
    pub async fn fetch_stats(&self, owner: &Pubkey) -> Result<TradingStats, EngineError> {
        let (address, _) = stats_pda(owner, &self.program_id);
        let account = self
            .rpc
            .get_account_with_commitment(&address, self.commitment)
            .await?
            .value;
        match account {
            Some(account) => Ok(TradingStats::decode(&account.data)?),
            None => Ok(TradingStats::absent(*owner)),
        }
    }

    /// All stats accounts under the program, ranked by lifetime volume.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, EngineError> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::DataSize(
                stats_layout::RECORD_LEN as u64,
            )]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                ..Default::default()
            },
            ..Default::default()
        };
        let accounts = self
            .rpc
            .get_program_accounts_with_config(&self.program_id, config)
            .await?;

        let mut rows: Vec<TradingStats> = Vec::with_capacity(accounts.len());
        for (address, account) in accounts {
            match TradingStats::decode(&account.data) {
                Ok(stats) => rows.push(stats),
                Err(err) => debug!(
                    "Skipping undecodable stats account | address={} | err={}",
                    address, err
                ),
            }
        }
        Ok(rank_by_volume(rows))
    }

    /// Recent trades for one owner, reconstructed from transactions that
    /// touched their stats account. One unreadable transaction never sinks
    /// the whole history.
    pub async fn trade_history(&self, owner: &Pubkey) -> Result<Vec<HistoryEntry>, EngineError> {
        let (stats_address, _) = stats_pda(owner, &self.program_id);
        let config = GetConfirmedSignaturesForAddress2Config {
            limit: Some(self.history_limit),
            ..Default::default()
        };
        let infos = self
            .rpc
            .get_signatures_for_address_with_config(&stats_address, config)
            .await?;

        let mut settled = Vec::with_capacity(infos.len());
        for info in infos {
            if info.err.is_some() {
                continue;
            }
            let signature = match Signature::from_str(&info.signature) {
                Ok(signature) => signature,
                Err(err) => {
                    debug!(
                        "Skipping malformed signature | signature={} | err={}",
                        info.signature, err
                    );
                    continue;
                }
            };
            let fetched = match self
                .rpc
                .get_transaction_with_config(&signature, transaction_config())
                .await
            {
                Ok(fetched) => fetched,
                Err(err) => {
                    debug!(
                        "Skipping unfetchable transaction | signature={} | err={}",
                        info.signature, err
                    );
                    continue;
                }
            };
            if let Some(tx) = SettledTransaction::from_encoded(&info.signature, &fetched) {
                settled.push(tx);
            }
        }

        Ok(history::reconstruct(&settled, owner, self.classifier.as_ref()))
    }

    async fn token_balance(&self, ata: &Pubkey) -> Result<u64, EngineError> {
        let account = self
            .rpc
            .get_account_with_commitment(ata, self.commitment)
            .await?
            .value;
        let account = match account {
            Some(account) => account,
            None => return Ok(0),
        };
        match spl_token::state::Account::unpack(&account.data) {
            Ok(token) => Ok(token.amount),
            Err(err) => {
                debug!(
                    "Holding account is not a token account | address={} | err={}",
                    ata, err
                );
                Ok(0)
            }
        }
    }

    async fn submit_and_confirm<T: Signers + ?Sized>(
        &self,
        instructions: &[Instruction],
        signers: &T,
    ) -> Result<TradeReceipt, EngineError> {
        let payer = self.operator.pubkey();
        let mut message = Message::new(instructions, Some(&payer));
        debug!(
            "Transaction built | phase={} | instructions={}",
            TradePhase::Built.as_str(),
            instructions.len()
        );

        message.recent_blockhash = self.rpc.get_latest_blockhash().await?;
        let transaction = VersionedTransaction::try_new(VersionedMessage::Legacy(message), signers)
            .map_err(EngineError::Signing)?;

        let serialized = bincode::serialize(&transaction)?;
        if serialized.len() > PACKET_DATA_SIZE {
            return Err(EngineError::TransactionTooLarge {
                size: serialized.len(),
                limit: PACKET_DATA_SIZE,
            });
        }
        let signature = *transaction
            .signatures
            .first()
            .ok_or(EngineError::Signing(SignerError::NotEnoughSigners))?;
        debug!(
            "Transaction signed | phase={} | signature={} | bytes={}",
            TradePhase::Signed.as_str(),
            signature,
            serialized.len()
        );

        let send_config = RpcSendTransactionConfig {
            preflight_commitment: Some(self.commitment.commitment),
            ..Default::default()
        };
        self.rpc
            .send_transaction_with_config(&transaction, send_config)
            .await
            .map_err(|err| EngineError::SubmissionRejected(err.to_string()))?;
        info!(
            "Transaction submitted | phase={} | signature={}",
            TradePhase::Submitted.as_str(),
            signature
        );

        Ok(self.await_confirmation(signature).await)
    }

    /// Poll signature status until the target commitment, an on-chain
    /// failure, or the deadline. Transient poll errors keep the watch alive.
    async fn await_confirmation(&self, signature: Signature) -> TradeReceipt {
        let deadline = Instant::now() + self.confirm_timeout;
        loop {
            match self.rpc.get_signature_statuses(&[signature]).await {
                Ok(statuses) => {
                    if let Some(status) = statuses.value.first().and_then(|s| s.as_ref()) {
                        if let Some(phase) = phase_for_status(status, self.commitment.commitment) {
                            let failure = status.err.as_ref().map(|err| err.to_string());
                            match phase {
                                TradePhase::Confirmed => info!(
                                    "Transaction confirmed | signature={} | slot={}",
                                    signature, status.slot
                                ),
                                TradePhase::Failed => warn!(
                                    "Transaction failed on chain | signature={} | err={}",
                                    signature,
                                    failure.as_deref().unwrap_or("unknown")
                                ),
                                _ => {}
                            }
                            return TradeReceipt {
                                signature,
                                phase,
                                slot: Some(status.slot),
                                failure,
                            };
                        }
                    }
                }
                Err(err) => {
                    debug!("Status poll failed | signature={} | err={}", signature, err)
                }
            }

            if Instant::now() >= deadline {
                warn!(
                    "Confirmation timed out | signature={} | waited_ms={}",
                    signature,
                    self.confirm_timeout.as_millis()
                );
                return TradeReceipt {
                    signature,
                    phase: TradePhase::TimedOut,
                    slot: None,
                    failure: None,
                };
            }
            sleep(self.confirm_poll).await;
        }
    }
}

fn transaction_config() -> RpcTransactionConfig {
    RpcTransactionConfig {
        encoding: Some(UiTransactionEncoding::Base64),
        commitment: Some(CommitmentConfig::confirmed()),
        max_supported_transaction_version: Some(0),
    }
}

fn phase_for_status(status: &TransactionStatus, target: CommitmentLevel) -> Option<TradePhase> {
    if status.err.is_some() {
        return Some(TradePhase::Failed);
    }
    let reached = match target {
        CommitmentLevel::Finalized => matches!(
            status.confirmation_status,
            Some(TransactionConfirmationStatus::Finalized)
        ),
        _ => matches!(
            status.confirmation_status,
            Some(TransactionConfirmationStatus::Confirmed)
                | Some(TransactionConfirmationStatus::Finalized)
        ),
    };
    reached.then_some(TradePhase::Confirmed)
}

fn rank_by_volume(mut rows: Vec<TradingStats>) -> Vec<LeaderboardRow> {
    rows.sort_by(|a, b| b.total_volume.cmp(&a.total_volume));
    rows.into_iter()
        .enumerate()
        .map(|(index, stats)| LeaderboardRow {
            rank: index + 1,
            owner: stats.owner,
            total_volume: stats.total_volume,
            trade_count: stats.trade_count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::transaction::TransactionError;

    #[test]
    fn guards_are_exclusive_per_trader_and_mint() {
        let guards = SubmissionGuards::default();
        let trader = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let permit = guards.try_acquire(trader, mint);
        assert!(permit.is_some());
        assert!(guards.try_acquire(trader, mint).is_none());

        // A different mint for the same trader is its own slot.
        assert!(guards.try_acquire(trader, Pubkey::new_unique()).is_some());

        drop(permit);
        assert!(guards.try_acquire(trader, mint).is_some());
    }

    #[test]
    fn permit_releases_on_drop_mid_scope() {
        let guards = SubmissionGuards::default();
        let trader = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        {
            let _permit = guards.try_acquire(trader, mint).unwrap();
            assert!(guards.try_acquire(trader, mint).is_none());
        }
        assert!(guards.try_acquire(trader, mint).is_some());
    }

    #[test]
    fn phase_terminality() {
        assert!(!TradePhase::Built.is_terminal());
        assert!(!TradePhase::Signed.is_terminal());
        assert!(!TradePhase::Submitted.is_terminal());
        assert!(TradePhase::Confirmed.is_terminal());
        assert!(TradePhase::Failed.is_terminal());
        assert!(TradePhase::TimedOut.is_terminal());
    }

    fn status(
        err: Option<TransactionError>,
        confirmation: Option<TransactionConfirmationStatus>,
    ) -> TransactionStatus {
        let status = match &err {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        };
        TransactionStatus {
            slot: 7,
            confirmations: None,
            status,
            err,
            confirmation_status: confirmation,
        }
    }

    #[test]
    fn failed_status_maps_to_failed_phase() {
        let s = status(
            Some(TransactionError::AccountNotFound),
            Some(TransactionConfirmationStatus::Confirmed),
        );
        assert_eq!(
            phase_for_status(&s, CommitmentLevel::Confirmed),
            Some(TradePhase::Failed)
        );
    }

    #[test]
    fn confirmation_respects_target_commitment() {
        let confirmed = status(None, Some(TransactionConfirmationStatus::Confirmed));
        assert_eq!(
            phase_for_status(&confirmed, CommitmentLevel::Confirmed),
            Some(TradePhase::Confirmed)
        );
        // Confirmed is not enough when the target is finalized.
        assert_eq!(phase_for_status(&confirmed, CommitmentLevel::Finalized), None);

        let finalized = status(None, Some(TransactionConfirmationStatus::Finalized));
        assert_eq!(
            phase_for_status(&finalized, CommitmentLevel::Finalized),
            Some(TradePhase::Confirmed)
        );

        let processed = status(None, Some(TransactionConfirmationStatus::Processed));
        assert_eq!(phase_for_status(&processed, CommitmentLevel::Confirmed), None);
    }

    #[test]
    fn pending_status_keeps_polling() {
        let pending = status(None, None);
        assert_eq!(phase_for_status(&pending, CommitmentLevel::Confirmed), None);
    }

    #[test]
    fn leaderboard_ranks_descending_by_volume() {
        let a = TradingStats {
            owner: Pubkey::new_unique(),
            total_volume: 50,
            trade_count: 1,
        };
        let b = TradingStats {
            owner: Pubkey::new_unique(),
            total_volume: 900,
            trade_count: 3,
        };
        let c = TradingStats {
            owner: Pubkey::new_unique(),
            total_volume: 200,
            trade_count: 2,
        };

        let rows = rank_by_volume(vec![a, b, c]);
        assert_eq!(rows[0].owner, b.owner);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].owner, c.owner);
        assert_eq!(rows[1].rank, 2);
        assert_eq!(rows[2].owner, a.owner);
        assert_eq!(rows[2].rank, 3);
    }
}
