use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use solana_sdk::pubkey::Pubkey;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, UiTransactionTokenBalance,
};

/// Direction inferred for a settled transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    Buy,
    Sell,
    Unknown,
}

impl TradeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Unknown => "unknown",
        }
    }
}

/// Direction inference from emitted log lines. Marker scanning is fragile by
/// nature; keeping it behind this trait lets a structured event feed replace
/// it without touching the reconstruction below.
pub trait LogClassifier {
    fn classify(&self, logs: &[String]) -> TradeKind;
}

/// Scans log lines in order; on each line the buy marker is checked before
/// the sell marker, and the first matching line decides.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    pub buy_marker: String,
    pub sell_marker: String,
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self {
            buy_marker: "Buy".to_string(),
            sell_marker: "Sell".to_string(),
        }
    }
}

impl LogClassifier for MarkerClassifier {
    fn classify(&self, logs: &[String]) -> TradeKind {
        for line in logs {
            if line.contains(&self.buy_marker) {
                return TradeKind::Buy;
            }
            if line.contains(&self.sell_marker) {
                return TradeKind::Sell;
            }
        }
        TradeKind::Unknown
    }
}

/// One reconstructed trade. Derived entirely from settled transaction data
/// and never authoritative; `ambiguous` is set when more than one mint moved
/// and the largest-delta heuristic had to pick between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub signature: String,
    pub block_time: Option<i64>,
    pub direction: TradeKind,
    pub lamports_delta: i128,
    pub token_mint: Option<String>,
    pub token_delta: Option<i128>,
    pub token_decimals: Option<u8>,
    pub ambiguous: bool,
}

/// One row of a pre or post token-balance table, with the raw base-unit
/// amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalanceRow {
    pub account_index: u8,
    pub mint: String,
    pub decimals: u8,
    pub amount: u128,
}

/// The slice of a settled transaction the reconstruction needs, lifted out
/// of the RPC response types so the logic stays pure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledTransaction {
    pub signature: String,
    pub block_time: Option<i64>,
    pub failed: bool,
    pub account_keys: Vec<Pubkey>,
    pub log_messages: Vec<String>,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub pre_token_balances: Vec<TokenBalanceRow>,
    pub post_token_balances: Vec<TokenBalanceRow>,
}

impl SettledTransaction {
    /// Lift the relevant fields out of a fetched transaction. Returns None
    /// when the metadata or the transaction body cannot be read.
    pub fn from_encoded(
        signature: &str,
        fetched: &EncodedConfirmedTransactionWithStatusMeta,
    ) -> Option<Self> {
        let meta = fetched.transaction.meta.as_ref()?;
        let decoded = fetched.transaction.transaction.decode()?;
        let account_keys = decoded.message.static_account_keys().to_vec();

        let log_messages =
            Option::<Vec<String>>::from(meta.log_messages.clone()).unwrap_or_default();
        let pre_token_balances = token_rows(
            signature,
            Option::<Vec<UiTransactionTokenBalance>>::from(meta.pre_token_balances.clone()),
        );
        let post_token_balances = token_rows(
            signature,
            Option::<Vec<UiTransactionTokenBalance>>::from(meta.post_token_balances.clone()),
        );

        Some(Self {
            signature: signature.to_string(),
            block_time: fetched.block_time,
            failed: meta.err.is_some(),
            account_keys,
            log_messages,
            pre_balances: meta.pre_balances.clone(),
            post_balances: meta.post_balances.clone(),
            pre_token_balances,
            post_token_balances,
        })
    }
}

fn token_rows(
    signature: &str,
    balances: Option<Vec<UiTransactionTokenBalance>>,
) -> Vec<TokenBalanceRow> {
    let mut rows = Vec::new();
    for balance in balances.unwrap_or_default() {
        match balance.ui_token_amount.amount.parse::<u128>() {
            Ok(amount) => rows.push(TokenBalanceRow {
                account_index: balance.account_index,
                mint: balance.mint,
                decimals: balance.ui_token_amount.decimals,
                amount,
            }),
            Err(err) => {
                debug!(
                    "Skipping unparseable token amount | signature={} | account_index={} | err={}",
                    signature, balance.account_index, err
                );
            }
        }
    }
    rows
}

#[derive(Debug)]
struct TokenShift {
    mint: String,
    delta: i128,
    decimals: u8,
}

/// Reconstruct history entries from settled transactions touching the
/// trader's accounts. Transactions that failed, or whose fee payer is not
/// `owner`, are skipped. Entries come back sorted descending by block time,
/// ties keeping the input order; re-running over the same input yields an
/// identical list.
pub fn reconstruct<C>(
    transactions: &[SettledTransaction],
    owner: &Pubkey,
    classifier: &C,
) -> Vec<HistoryEntry>
where
    C: LogClassifier + ?Sized,
{
    let mut entries = Vec::with_capacity(transactions.len());

    for tx in transactions {
        if tx.failed {
            continue;
        }
        // The fee payer occupies key slot zero; anything else is a
        // transaction that merely referenced the trader's accounts.
        if tx.account_keys.first() != Some(owner) {
            continue;
        }

        let direction = classifier.classify(&tx.log_messages);
        let pre = tx.pre_balances.first().copied().unwrap_or(0);
        let post = tx.post_balances.first().copied().unwrap_or(0);
        let lamports_delta = post as i128 - pre as i128;

        let (shift, ambiguous) =
            largest_token_shift(&tx.pre_token_balances, &tx.post_token_balances);

        let (token_mint, token_delta, token_decimals) = match shift {
            Some(shift) => (Some(shift.mint), Some(shift.delta), Some(shift.decimals)),
            None => (None, None, None),
        };

        entries.push(HistoryEntry {
            signature: tx.signature.clone(),
            block_time: tx.block_time,
            direction,
            lamports_delta,
            token_mint,
            token_delta,
            token_decimals,
            ambiguous,
        });
    }

    // Stable sort: ties keep the query order.
    entries.sort_by(|a, b| b.block_time.cmp(&a.block_time));
    entries
}

/// Merge the pre/post tables by account index and pick the account with the
/// largest absolute raw delta. Flags ambiguity when more than one distinct
/// mint saw a nonzero delta.
fn largest_token_shift(
    pre: &[TokenBalanceRow],
    post: &[TokenBalanceRow],
) -> (Option<TokenShift>, bool) {
    let mut merged: BTreeMap<u8, (Option<&TokenBalanceRow>, Option<&TokenBalanceRow>)> =
        BTreeMap::new();
    for row in pre {
        merged.entry(row.account_index).or_default().0 = Some(row);
    }
    for row in post {
        merged.entry(row.account_index).or_default().1 = Some(row);
    }

    let mut moved_mints: BTreeSet<&str> = BTreeSet::new();
    let mut best: Option<TokenShift> = None;
    let mut best_abs: u128 = 0;

    for (pre_row, post_row) in merged.values() {
        let reference = match post_row.or(*pre_row) {
            Some(row) => row,
            None => continue,
        };
        let pre_amount = pre_row.map(|r| r.amount).unwrap_or(0) as i128;
        let post_amount = post_row.map(|r| r.amount).unwrap_or(0) as i128;
        let delta = post_amount - pre_amount;

        if delta != 0 {
            moved_mints.insert(reference.mint.as_str());
        }
        // Strict comparison: on equal magnitudes the lowest account index
        // wins, keeping the pick deterministic.
        if delta.unsigned_abs() > best_abs {
            best_abs = delta.unsigned_abs();
            best = Some(TokenShift {
                mint: reference.mint.clone(),
                delta,
                decimals: reference.decimals,
            });
        }
    }

    (best, moved_mints.len() > 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose;
    use base64::Engine as _;
    use solana_sdk::message::{Message, MessageHeader, VersionedMessage};
    use solana_sdk::signature::Signature;
    use solana_sdk::transaction::VersionedTransaction;
    use solana_transaction_status::option_serializer::OptionSerializer;
    use solana_transaction_status::{
        EncodedTransaction, EncodedTransactionWithStatusMeta, TransactionBinaryEncoding,
        UiTransactionStatusMeta,
    };

    fn row(account_index: u8, mint: &str, amount: u128) -> TokenBalanceRow {
        TokenBalanceRow {
            account_index,
            mint: mint.to_string(),
            decimals: 9,
            amount,
        }
    }

    fn settled(
        signature: &str,
        block_time: Option<i64>,
        payer: Pubkey,
        logs: &[&str],
        pre: u64,
        post: u64,
    ) -> SettledTransaction {
        SettledTransaction {
            signature: signature.to_string(),
            block_time,
            failed: false,
            account_keys: vec![payer, Pubkey::new_unique()],
            log_messages: logs.iter().map(|s| s.to_string()).collect(),
            pre_balances: vec![pre, 0],
            post_balances: vec![post, 0],
            pre_token_balances: Vec::new(),
            post_token_balances: Vec::new(),
        }
    }

    #[test]
    fn classifier_checks_buy_before_sell_per_line() {
        let classifier = MarkerClassifier::default();
        let both = vec!["Program log: Buy and Sell in one line".to_string()];
        assert_eq!(classifier.classify(&both), TradeKind::Buy);
    }

    #[test]
    fn classifier_first_matching_line_wins() {
        let classifier = MarkerClassifier::default();
        let logs = vec![
            "Program invoke [1]".to_string(),
            "Program log: Instruction: Sell".to_string(),
            "Program log: Instruction: Buy".to_string(),
        ];
        assert_eq!(classifier.classify(&logs), TradeKind::Sell);
    }

    #[test]
    fn classifier_defaults_to_unknown() {
        let classifier = MarkerClassifier::default();
        assert_eq!(classifier.classify(&[]), TradeKind::Unknown);
        let logs = vec!["Program log: nothing relevant".to_string()];
        assert_eq!(classifier.classify(&logs), TradeKind::Unknown);
    }

    #[test]
    fn reconstruct_computes_payer_lamports_delta() {
        let owner = Pubkey::new_unique();
        let txs = vec![settled(
            "sig1",
            Some(100),
            owner,
            &["Program log: Instruction: Buy"],
            1_000_000,
            400_000,
        )];
        let entries = reconstruct(&txs, &owner, &MarkerClassifier::default());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].direction, TradeKind::Buy);
        assert_eq!(entries[0].lamports_delta, -600_000);
        assert!(!entries[0].ambiguous);
    }

    #[test]
    fn reconstruct_skips_failed_and_foreign_payers() {
        let owner = Pubkey::new_unique();
        let mut failed = settled("sig1", Some(100), owner, &[], 10, 5);
        failed.failed = true;
        let foreign = settled("sig2", Some(101), Pubkey::new_unique(), &[], 10, 5);
        let entries = reconstruct(&[failed, foreign], &owner, &MarkerClassifier::default());
        assert!(entries.is_empty());
    }

    #[test]
    fn largest_absolute_token_delta_wins() {
        let owner = Pubkey::new_unique();
        let mut tx = settled("sig1", Some(100), owner, &["Buy"], 100, 50);
        tx.pre_token_balances = vec![row(1, "mintA", 1_000), row(2, "mintA", 0)];
        tx.post_token_balances = vec![row(1, "mintA", 900), row(2, "mintA", 5_000)];

        let entries = reconstruct(&[tx], &owner, &MarkerClassifier::default());
        assert_eq!(entries[0].token_mint.as_deref(), Some("mintA"));
        assert_eq!(entries[0].token_delta, Some(5_000));
        assert_eq!(entries[0].token_decimals, Some(9));
        // Same mint on both accounts: not ambiguous.
        assert!(!entries[0].ambiguous);
    }

    #[test]
    fn multiple_moving_mints_flag_ambiguity() {
        let owner = Pubkey::new_unique();
        let mut tx = settled("sig1", Some(100), owner, &["Sell"], 100, 150);
        tx.pre_token_balances = vec![row(1, "mintA", 9_000), row(2, "mintB", 0)];
        tx.post_token_balances = vec![row(1, "mintA", 0), row(2, "mintB", 8_000)];

        let entries = reconstruct(&[tx], &owner, &MarkerClassifier::default());
        assert!(entries[0].ambiguous);
        // The larger magnitude still decides the reported shift.
        assert_eq!(entries[0].token_mint.as_deref(), Some("mintA"));
        assert_eq!(entries[0].token_delta, Some(-9_000));
    }

    #[test]
    fn zero_token_movement_reports_no_mint() {
        let owner = Pubkey::new_unique();
        let mut tx = settled("sig1", Some(100), owner, &["Buy"], 100, 50);
        tx.pre_token_balances = vec![row(1, "mintA", 777)];
        tx.post_token_balances = vec![row(1, "mintA", 777)];

        let entries = reconstruct(&[tx], &owner, &MarkerClassifier::default());
        assert_eq!(entries[0].token_mint, None);
        assert_eq!(entries[0].token_delta, None);
    }

    #[test]
    fn entries_sort_descending_by_time_with_stable_ties() {
        let owner = Pubkey::new_unique();
        let txs = vec![
            settled("older", Some(100), owner, &[], 10, 5),
            settled("newest", Some(300), owner, &[], 10, 5),
            settled("tie_first", Some(200), owner, &[], 10, 5),
            settled("tie_second", Some(200), owner, &[], 10, 5),
        ];
        let entries = reconstruct(&txs, &owner, &MarkerClassifier::default());
        let order: Vec<&str> = entries.iter().map(|e| e.signature.as_str()).collect();
        assert_eq!(order, vec!["newest", "tie_first", "tie_second", "older"]);
    }

    #[test]
    fn reconstruction_is_idempotent() {
        let owner = Pubkey::new_unique();
        let mut tx = settled("sig1", Some(100), owner, &["Buy"], 1_000, 400);
        tx.pre_token_balances = vec![row(1, "mintA", 0), row(2, "mintB", 50)];
        tx.post_token_balances = vec![row(1, "mintA", 40), row(2, "mintB", 0)];
        let txs = vec![tx, settled("sig2", Some(90), owner, &["Sell"], 5, 25)];

        let classifier = MarkerClassifier::default();
        let first = reconstruct(&txs, &owner, &classifier);
        let second = reconstruct(&txs, &owner, &classifier);
        assert_eq!(first, second);
    }

    #[test]
    fn from_encoded_lifts_meta_and_keys() {
        let owner = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        // decode() drops transactions that fail sanitization, so the header
        // must declare the fee payer's signature.
        let message = Message {
            header: MessageHeader {
                num_required_signatures: 1,
                ..MessageHeader::default()
            },
            account_keys: vec![owner, other],
            ..Message::default()
        };
        let tx = VersionedTransaction {
            signatures: vec![Signature::default()],
            message: VersionedMessage::Legacy(message),
        };
        let encoded = general_purpose::STANDARD.encode(bincode::serialize(&tx).unwrap());

        let meta = UiTransactionStatusMeta {
            err: None,
            status: Ok(()),
            fee: 5_000,
            pre_balances: vec![1_000_000, 0],
            post_balances: vec![900_000, 0],
            inner_instructions: OptionSerializer::None,
            log_messages: OptionSerializer::Some(vec![
                "Program log: Instruction: Buy".to_string()
            ]),
            pre_token_balances: OptionSerializer::Some(vec![]),
            post_token_balances: OptionSerializer::None,
            rewards: OptionSerializer::None,
            loaded_addresses: OptionSerializer::None,
            return_data: OptionSerializer::None,
            compute_units_consumed: OptionSerializer::None,
        };

        let fetched = EncodedConfirmedTransactionWithStatusMeta {
            slot: 42,
            transaction: EncodedTransactionWithStatusMeta {
                transaction: EncodedTransaction::Binary(encoded, TransactionBinaryEncoding::Base64),
                meta: Some(meta),
                version: None,
            },
            block_time: Some(1_700_000_000),
        };

        let settled = SettledTransaction::from_encoded("sig1", &fetched).unwrap();
        assert_eq!(settled.account_keys[0], owner);
        assert_eq!(settled.block_time, Some(1_700_000_000));
        assert!(!settled.failed);
        assert_eq!(settled.log_messages.len(), 1);
        assert_eq!(settled.pre_balances[0], 1_000_000);

        let entries = reconstruct(&[settled], &owner, &MarkerClassifier::default());
        assert_eq!(entries[0].direction, TradeKind::Buy);
        assert_eq!(entries[0].lamports_delta, -100_000);
    }
}
