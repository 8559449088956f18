use std::env;

use log::{debug, info, warn};
use solana_sdk::pubkey::Pubkey;

use xtoken_trader::{
    accounts::curve::CurveType,
    config::{Config, EngineAction},
    curve::{instructions::InitializeParams, math, planner::TradeDirection},
    engine::{EngineError, TradeEngine},
    history::MarkerClassifier,
    verify::HandleVerifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env::set_var(
        env_logger::DEFAULT_FILTER_ENV,
        env::var_os(env_logger::DEFAULT_FILTER_ENV).unwrap_or_else(|| "info".into()),
    );
    env_logger::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            if let Some(path) = err.missing_env_path() {
                warn!(
                    "No .env found at {}; copy .env.example and fill in the required values",
                    path.display()
                );
            }
            return Err(err.into());
        }
    };
    let engine = build_engine(&config);

    log_startup_summary(&config, &engine).await;

    match config.action {
        EngineAction::Status => run_status(&config, &engine).await?,
        EngineAction::Buy => run_trade(&config, &engine, TradeDirection::Buy).await?,
        EngineAction::Sell => run_trade(&config, &engine, TradeDirection::Sell).await?,
        EngineAction::Launch => run_launch(&config, &engine).await?,
        EngineAction::Profile => run_profile_update(&config, &engine).await?,
    }

    Ok(())
}

fn build_engine(config: &Config) -> TradeEngine {
    let engine = TradeEngine::new(config);
    if config.log_buy_marker.is_none() && config.log_sell_marker.is_none() {
        return engine;
    }
    let mut classifier = MarkerClassifier::default();
    if let Some(marker) = &config.log_buy_marker {
        classifier.buy_marker = marker.clone();
    }
    if let Some(marker) = &config.log_sell_marker {
        classifier.sell_marker = marker.clone();
    }
    engine.with_classifier(Box::new(classifier))
}

async fn log_startup_summary(config: &Config, engine: &TradeEngine) {
    let balance = match engine.operator_balance().await {
        Ok(value) => value,
        Err(err) => {
            warn!("Failed to fetch operator SOL balance: {err}");
            0
        }
    };
    info!(
        "Startup | operator={} | sol={:.4} | program={} | commitment={:?} | action={}",
        config.operator_pubkey(),
        math::lamports_to_sol(balance),
        config.program_id,
        config.commitment.commitment,
        config.action.as_str()
    );
    info!(
        "Trading | slippage_bps={} | confirm_timeout_ms={} | confirm_poll_ms={} | history_limit={}",
        config.default_slippage_bps,
        config.confirm_timeout_ms,
        config.confirm_poll_ms,
        config.history_limit
    );
    info!("Endpoints | rpc={}", config.rpc_url);
    debug!("Config loaded | env={}", config.env_path.display());
}

async fn run_status(config: &Config, engine: &TradeEngine) -> anyhow::Result<()> {
    let operator = engine.operator_pubkey();

    let profile = match engine.fetch_profile(&operator).await {
        Ok(profile) => Some(profile),
        Err(EngineError::ProfileMissing(_)) => None,
        Err(err) => {
            warn!("Profile fetch failed: {err}");
            None
        }
    };
    match &profile {
        Some(profile) => info!(
            "Profile | username={} | bio={}",
            profile.username, profile.bio
        ),
        None => info!("Profile | none on record"),
    }

    match engine.fetch_stats(&operator).await {
        Ok(stats) => info!(
            "Stats | volume_lamports={} | trades={}",
            stats.total_volume, stats.trade_count
        ),
        Err(err) => warn!("Stats fetch failed: {err}"),
    }

    show_leaderboard(engine, &operator).await;
    show_history(engine, &operator).await;

    if let Some(mint) = config.track_mint {
        show_quote(engine, &mint, config.quote_units).await;
    }

    if let (Some(api_key), Some(profile)) = (&config.twitter_api_key, &profile) {
        if profile.username.is_empty() {
            info!("Verification | profile has no username to check");
        } else {
            let verifier = HandleVerifier::new(api_key.clone(), config.verify_keyword.clone());
            let verified = verifier.handle_posted_keyword(&profile.username).await;
            info!(
                "Verification | handle={} | keyword_posted={}",
                profile.username, verified
            );
        }
    }

    Ok(())
}

async fn show_leaderboard(engine: &TradeEngine, operator: &Pubkey) {
    let rows = match engine.leaderboard().await {
        Ok(rows) => rows,
        Err(err) => {
            warn!("Leaderboard fetch failed: {err}");
            return;
        }
    };
    if rows.is_empty() {
        info!("Leaderboard | no traders on record");
        return;
    }
    let top: Vec<_> = rows.iter().take(10).collect();
    let owners: Vec<Pubkey> = top.iter().map(|row| row.owner).collect();
    let profiles = match engine.fetch_profiles(&owners).await {
        Ok(profiles) => profiles,
        Err(err) => {
            warn!("Leaderboard profile fetch failed: {err}");
            Vec::new()
        }
    };
    for row in top {
        let username = profiles
            .iter()
            .find(|profile| profile.owner == row.owner)
            .map(|profile| profile.username.as_str())
            .unwrap_or("-");
        info!(
            "Rank {:02} | owner={} | username={} | volume={} | trades={}",
            row.rank, row.owner, username, row.total_volume, row.trade_count
        );
    }
    match rows.iter().find(|row| row.owner == *operator) {
        Some(row) => info!("Leaderboard | your rank #{} of {}", row.rank, rows.len()),
        None => info!("Leaderboard | operator unranked ({} traders)", rows.len()),
    }
}

async fn show_history(engine: &TradeEngine, owner: &Pubkey) {
    let entries = match engine.trade_history(owner).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!("History reconstruction failed: {err}");
            return;
        }
    };
    if entries.is_empty() {
        info!("History | no settled trades found");
        return;
    }
    for entry in &entries {
        let mint = entry.token_mint.as_deref().unwrap_or("-");
        info!(
            "History | signature={} | time={:?} | direction={} | lamports_delta={} | mint={} | token_delta={:?} | decimals={:?} | ambiguous={}",
            entry.signature,
            entry.block_time,
            entry.direction.as_str(),
            entry.lamports_delta,
            mint,
            entry.token_delta,
            entry.token_decimals,
            entry.ambiguous
        );
    }
}

async fn show_quote(engine: &TradeEngine, mint: &Pubkey, units: u64) {
    let quote = match engine.quote(mint, units).await {
        Ok(quote) => quote,
        Err(err) => {
            warn!("Quote failed for {mint}: {err}");
            return;
        }
    };
    info!(
        "Quote | mint={} | curve={} | spot_unit_price={} | units={}",
        quote.mint,
        quote.curve_type.as_str(),
        quote.spot_unit_price,
        quote.units
    );
    match &quote.buy {
        Some(estimate) => info!(
            "Quote buy | unit_price={} | gross={} | fee={} | total_cost={}",
            estimate.unit_price, estimate.gross_amount, estimate.fee_amount, estimate.net_amount
        ),
        None => info!("Quote buy | not available at this size"),
    }
    match &quote.sell {
        Some(estimate) => info!(
            "Quote sell | unit_price={} | gross={} | fee={} | net_proceeds={}",
            estimate.unit_price, estimate.gross_amount, estimate.fee_amount, estimate.net_amount
        ),
        None => info!("Quote sell | not available at this size"),
    }
}

async fn run_trade(
    config: &Config,
    engine: &TradeEngine,
    direction: TradeDirection,
) -> anyhow::Result<()> {
    let mint = config
        .track_mint
        .ok_or_else(|| anyhow::anyhow!("TRACK_MINT must be set for buy and sell actions"))?;
    let outcome = engine
        .execute_trade(direction, &mint, config.quote_units, None)
        .await?;
    info!(
        "Trade settled | direction={} | phase={} | signature={} | slot={:?} | lamports={}",
        direction.as_str(),
        outcome.receipt.phase.as_str(),
        outcome.receipt.signature,
        outcome.receipt.slot,
        outcome.plan.estimate.net_amount
    );
    if let Some(failure) = &outcome.receipt.failure {
        warn!("Trade failed on chain | err={failure}");
    }
    Ok(())
}

async fn run_launch(config: &Config, engine: &TradeEngine) -> anyhow::Result<()> {
    let settings = &config.launch;
    if CurveType::from_tag(settings.curve_type).is_none() {
        anyhow::bail!(
            "LAUNCH_CURVE_TYPE {} does not name a known curve shape",
            settings.curve_type
        );
    }
    let params = InitializeParams {
        decimals: settings.decimals,
        curve_type: settings.curve_type,
        fee_basis_points: settings.fee_basis_points,
        base_price: settings.base_price,
        slope: settings.slope,
        max_supply: settings.max_supply,
        fee_recipient: engine.operator_pubkey(),
    };
    let launch = engine.create_token(&params).await?;
    info!(
        "Token launched | mint={} | curve={} | phase={} | signature={}",
        launch.mint,
        launch.curve,
        launch.receipt.phase.as_str(),
        launch.receipt.signature
    );
    Ok(())
}

async fn run_profile_update(config: &Config, engine: &TradeEngine) -> anyhow::Result<()> {
    let username = config
        .profile_username
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("PROFILE_USERNAME must be set for the profile action"))?;
    let bio = config.profile_bio.as_deref().unwrap_or("");
    let receipt = engine.update_profile(username, bio).await?;
    info!(
        "Profile updated | username={} | phase={} | signature={}",
        username,
        receipt.phase.as_str(),
        receipt.signature
    );
    Ok(())
}
