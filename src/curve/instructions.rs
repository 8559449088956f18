use borsh::{self, BorshDeserialize, BorshSerialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction, system_program,
    sysvar,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};
use std::io;
use thiserror::Error;

use crate::curve::planner::{TradeDirection, TradePlan};
use crate::pda::{curve_pda, vault_pda};
use crate::accounts::profile::ProfilePayload;

/// Extra lamports funded on top of mint rent exemption so the program can
/// cover its own bookkeeping writes.
pub const MINT_RENT_CUSHION_LAMPORTS: u64 = 1_000_000;

/// One-byte opcodes selecting the program operation.
pub mod opcodes {
    pub const INITIALIZE: u8 = 0;
    pub const BUY: u8 = 1;
    pub const SELL: u8 = 2;
    pub const UPDATE_PROFILE: u8 = 3;
}

#[derive(Debug, Error)]
pub enum InstructionBuildError {
    #[error("plan direction {got} cannot build a {expected} instruction")]
    DirectionMismatch {
        expected: &'static str,
        got: &'static str,
    },
    #[error("trader token account {provided} does not match derived ATA {derived}")]
    TraderAtaMismatch { provided: Pubkey, derived: Pubkey },
    #[error(transparent)]
    Serialization(#[from] io::Error),
}

#[derive(BorshSerialize, BorshDeserialize)]
struct InitializeArgs {
    decimals: u8,
    curve_type: u8,
    fee_basis_points: u16,
    padding: u8,
    base_price: u64,
    slope: u64,
    max_supply: u64,
    fee_recipient: [u8; 32],
}

#[derive(BorshSerialize, BorshDeserialize)]
struct BuyArgs {
    amount: u64,
    max_cost: u64,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct SellArgs {
    amount: u64,
    min_proceeds: u64,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct UpdateProfileArgs {
    username_len: u8,
    bio_len: u8,
    padding: u8,
    username: [u8; 32],
    bio: [u8; 200],
}

/// Accounts for the buy and sell instructions; both use the same order.
#[derive(Clone, Debug)]
pub struct TradeAccounts {
    pub curve: Pubkey,
    pub mint: Pubkey,
    pub trader_ata: Pubkey,
    pub trader: Pubkey,
    pub vault: Pubkey,
    pub fee_recipient: Pubkey,
    pub token_program: Pubkey,
    pub system_program: Pubkey,
}

impl TradeAccounts {
    /// Derive the full account set for a trader and mint.
    pub fn for_trade(
        trader: Pubkey,
        mint: Pubkey,
        fee_recipient: Pubkey,
        program_id: &Pubkey,
    ) -> Self {
        let (curve, _) = curve_pda(&mint, program_id);
        let (vault, _) = vault_pda(&mint, program_id);
        Self {
            curve,
            mint,
            trader_ata: get_associated_token_address(&trader, &mint),
            trader,
            vault,
            fee_recipient,
            token_program: spl_token::id(),
            system_program: system_program::id(),
        }
    }
}

/// Accounts for curve initialization. Authority and payer are the same
/// wallet in practice, but the program takes them separately.
#[derive(Clone, Debug)]
pub struct InitializeAccounts {
    pub authority: Pubkey,
    pub curve: Pubkey,
    pub mint: Pubkey,
    pub payer: Pubkey,
}

/// Parameters for a new curve, mirroring the program's initialize fields.
#[derive(Clone, Copy, Debug)]
pub struct InitializeParams {
    pub decimals: u8,
    pub curve_type: u8,
    pub fee_basis_points: u16,
    pub base_price: u64,
    pub slope: u64,
    pub max_supply: u64,
    pub fee_recipient: Pubkey,
}

/// Parameters for a trade instruction: a validated plan plus its accounts.
#[derive(Clone, Debug)]
pub struct TradeRequest<'a> {
    pub accounts: &'a TradeAccounts,
    pub program_id: Pubkey,
    pub plan: &'a TradePlan,
}

/// Builds x_token program instructions. One Vec per instruction, opcode byte
/// first, borsh-packed args after it.
pub struct XTokenInstructionBuilder;

impl XTokenInstructionBuilder {
    /// Build a buy carrying the plan's unit amount and its worst-case cost
    /// bound.
    pub fn buy(request: TradeRequest<'_>) -> Result<Instruction, InstructionBuildError> {
        ensure_direction(request.plan, TradeDirection::Buy)?;
        ensure_trader_ata(request.accounts)?;

        let args = BuyArgs {
            amount: request.plan.units,
            max_cost: request.plan.bound_amount,
        };

        let mut data = Vec::with_capacity(1 + core::mem::size_of::<BuyArgs>());
        data.push(opcodes::BUY);
        data.extend(borsh::to_vec(&args)?);

        Ok(Instruction {
            program_id: request.program_id,
            accounts: trade_metas(request.accounts),
            data,
        })
    }

    /// Build a sell carrying the plan's unit amount and its minimum-proceeds
    /// bound.
    pub fn sell(request: TradeRequest<'_>) -> Result<Instruction, InstructionBuildError> {
        ensure_direction(request.plan, TradeDirection::Sell)?;
        ensure_trader_ata(request.accounts)?;

        let args = SellArgs {
            amount: request.plan.units,
            min_proceeds: request.plan.bound_amount,
        };

        let mut data = Vec::with_capacity(1 + core::mem::size_of::<SellArgs>());
        data.push(opcodes::SELL);
        data.extend(borsh::to_vec(&args)?);

        Ok(Instruction {
            program_id: request.program_id,
            accounts: trade_metas(request.accounts),
            data,
        })
    }

    /// Idempotent ATA creation for the trader's holding. Must precede the
    /// trade instruction in the same transaction for a first-time holder.
    pub fn create_holding_ata(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
        create_associated_token_account_idempotent(payer, owner, mint, &spl_token::id())
    }

    /// Build the mint create-account plus curve initialize pair. The mint
    /// account creation must come first; the fresh mint keypair co-signs the
    /// transaction because these instructions create an account it owns.
    pub fn initialize(
        accounts: &InitializeAccounts,
        params: &InitializeParams,
        mint_rent_lamports: u64,
        program_id: Pubkey,
    ) -> Result<Vec<Instruction>, InstructionBuildError> {
        let create_mint = system_instruction::create_account(
            &accounts.payer,
            &accounts.mint,
            mint_rent_lamports + MINT_RENT_CUSHION_LAMPORTS,
            spl_token::state::Mint::LEN as u64,
            &spl_token::id(),
        );

        let args = InitializeArgs {
            decimals: params.decimals,
            curve_type: params.curve_type,
            fee_basis_points: params.fee_basis_points,
            padding: 0,
            base_price: params.base_price,
            slope: params.slope,
            max_supply: params.max_supply,
            fee_recipient: params.fee_recipient.to_bytes(),
        };

        let mut data = Vec::with_capacity(1 + core::mem::size_of::<InitializeArgs>());
        data.push(opcodes::INITIALIZE);
        data.extend(borsh::to_vec(&args)?);

        let initialize = Instruction {
            program_id,
            accounts: initialize_metas(accounts),
            data,
        };

        Ok(vec![create_mint, initialize])
    }

    /// Build a profile update from an already clamped payload.
    pub fn update_profile(
        profile: &Pubkey,
        owner: &Pubkey,
        payload: &ProfilePayload,
        program_id: Pubkey,
    ) -> Result<Instruction, InstructionBuildError> {
        let args = UpdateProfileArgs {
            username_len: payload.username_len,
            bio_len: payload.bio_len,
            padding: 0,
            username: payload.username,
            bio: payload.bio,
        };

        let mut data = Vec::with_capacity(1 + core::mem::size_of::<UpdateProfileArgs>());
        data.push(opcodes::UPDATE_PROFILE);
        data.extend(borsh::to_vec(&args)?);

        Ok(Instruction {
            program_id,
            accounts: vec![
                AccountMeta::new(*profile, false),
                AccountMeta::new(*owner, true),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
            data,
        })
    }
}

fn trade_metas(accounts: &TradeAccounts) -> Vec<AccountMeta> {
    let mut metas = Vec::with_capacity(8);
    metas.push(AccountMeta::new(accounts.curve, false));
    metas.push(AccountMeta::new(accounts.mint, false));
    metas.push(AccountMeta::new(accounts.trader_ata, false));
    metas.push(AccountMeta::new(accounts.trader, true));
    metas.push(AccountMeta::new(accounts.vault, false));
    metas.push(AccountMeta::new(accounts.fee_recipient, false));
    metas.push(AccountMeta::new_readonly(accounts.token_program, false));
    metas.push(AccountMeta::new_readonly(accounts.system_program, false));
    metas
}

fn initialize_metas(accounts: &InitializeAccounts) -> Vec<AccountMeta> {
    let mut metas = Vec::with_capacity(7);
    metas.push(AccountMeta::new(accounts.authority, true));
    metas.push(AccountMeta::new(accounts.curve, false));
    metas.push(AccountMeta::new(accounts.mint, true));
    metas.push(AccountMeta::new(accounts.payer, true));
    metas.push(AccountMeta::new_readonly(system_program::id(), false));
    metas.push(AccountMeta::new_readonly(spl_token::id(), false));
    metas.push(AccountMeta::new_readonly(sysvar::rent::id(), false));
    metas
}

fn ensure_direction(
    plan: &TradePlan,
    expected: TradeDirection,
) -> Result<(), InstructionBuildError> {
    if plan.estimate.direction != expected {
        return Err(InstructionBuildError::DirectionMismatch {
            expected: expected.as_str(),
            got: plan.estimate.direction.as_str(),
        });
    }
    Ok(())
}

fn ensure_trader_ata(accounts: &TradeAccounts) -> Result<(), InstructionBuildError> {
    let derived = get_associated_token_address(&accounts.trader, &accounts.mint);
    if accounts.trader_ata != derived {
        return Err(InstructionBuildError::TraderAtaMismatch {
            provided: accounts.trader_ata,
            derived,
        });
    }
    Ok(())
}
