#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    coins, to_binary, BankMsg, Binary, Deps, DepsMut, Env, MessageInfo, Order, Response, StdError,
    StdResult, Timestamp, Uint128,
};
use cw2::set_contract_version;
use cw_storage_plus::Bound;
use cw_utils::{maybe_addr, must_pay};

use crate::error::ContractError;
use crate::msg::{
    BallotListResponse, BallotResponse, ConfigResponse, ExecuteMsg, InstantiateMsg,
    IsStakerResponse, QueryMsg, StakedResponse, StakerCountResponse, StakerInfo,
    StakerListResponse, SyncResponse, TotalStakedResponse, VoteInfo, VoteListResponse,
    VoteResponse,
};
use crate::oracle::AccessOracle;
use crate::state::{
    next_ballot_id, Ballot, Config, OrgState, StakeRecord, VoteChoice, VoteRecord, BALLOTS,
    CONFIG, ORGS, REGISTRY, STAKES, STAKE_TOTALS, VOTES,
};

// version info for migration info
const CONTRACT_NAME: &str = "crates.io:cw-dao-stake";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = Config {
        denom: msg.denom,
        hold_period: msg.hold_period,
        oracle: AccessOracle(deps.api.addr_validate(&msg.oracle)?),
    };
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::default())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::CreateOrganization { org_id } => execute_create_organization(deps, info, org_id),
        ExecuteMsg::Deposit { org_id } => execute_deposit(deps, env, info, org_id),
        ExecuteMsg::Withdraw { org_id, amount } => execute_withdraw(deps, env, info, org_id, amount),
        ExecuteMsg::CreateBallot {
            org_id,
            title,
            description,
            opens_at,
            closes_at,
        } => execute_create_ballot(deps, env, info, org_id, title, description, opens_at, closes_at),
        ExecuteMsg::CastVote {
            org_id,
            ballot_id,
            choice,
        } => execute_cast_vote(deps, env, info, org_id, ballot_id, choice),
        ExecuteMsg::DeclareOutcome { org_id, ballot_id } => {
            execute_declare_outcome(deps, env, info, org_id, ballot_id)
        }
        ExecuteMsg::RepairSync { org_id, account } => {
            execute_repair_sync(deps, info, org_id, account)
        }
    }
}

pub fn execute_create_organization(
    deps: DepsMut,
    info: MessageInfo,
    org_id: String,
) -> Result<Response, ContractError> {
    if org_id.is_empty() {
        return Err(ContractError::InvalidOrgId {});
    }
    let cfg = CONFIG.load(deps.storage)?;
    cfg.oracle.assert_admin(&deps.querier, &org_id, &info.sender)?;

    if ORGS.has(deps.storage, &org_id) {
        return Err(ContractError::OrgExists { org_id });
    }
    ORGS.save(deps.storage, &org_id, &OrgState::new())?;

    Ok(Response::new()
        .add_attribute("action", "create_organization")
        .add_attribute("sender", info.sender)
        .add_attribute("org_id", org_id))
}

pub fn execute_deposit(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    org_id: String,
) -> Result<Response, ContractError> {
    let cfg = CONFIG.load(deps.storage)?;
    let mut org = ORGS
        .may_load(deps.storage, &org_id)?
        .ok_or_else(|| ContractError::UnknownOrg {
            org_id: org_id.clone(),
        })?;
    let amount = must_pay(&info, &cfg.denom)?;

    // ledger entry; the first deposit into this org starts the hold period,
    // a top-up keeps the original unlock
    let record = match STAKES.may_load(deps.storage, (&info.sender, &org_id))? {
        Some(mut record) => {
            record.amount = record
                .amount
                .checked_add(amount)
                .map_err(StdError::overflow)?;
            record
        }
        None => StakeRecord {
            amount,
            unlock: cfg.hold_period.after(&env.block),
        },
    };
    STAKES.save(deps.storage, (&info.sender, &org_id), &record)?;

    // cross-org aggregate
    STAKE_TOTALS.update(deps.storage, &info.sender, |total| {
        total
            .unwrap_or_default()
            .checked_add(amount)
            .map_err(StdError::overflow)
    })?;

    // registry mirror
    let prev = REGISTRY.may_load(deps.storage, (&org_id, &info.sender))?;
    if prev.is_none() {
        org.staker_count += 1;
    }
    let mirrored = prev
        .unwrap_or_default()
        .checked_add(amount)
        .map_err(StdError::overflow)?;
    REGISTRY.save(deps.storage, (&org_id, &info.sender), &mirrored)?;

    org.vault = org.vault.checked_add(amount).map_err(StdError::overflow)?;
    ORGS.save(deps.storage, &org_id, &org)?;

    Ok(Response::new()
        .add_attribute("action", "deposit")
        .add_attribute("sender", info.sender)
        .add_attribute("org_id", org_id)
        .add_attribute("amount", amount.to_string()))
}

pub fn execute_withdraw(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    org_id: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let cfg = CONFIG.load(deps.storage)?;
    let mut org = ORGS
        .may_load(deps.storage, &org_id)?
        .ok_or_else(|| ContractError::UnknownOrg {
            org_id: org_id.clone(),
        })?;
    let stake = STAKES
        .may_load(deps.storage, (&info.sender, &org_id))?
        .ok_or(ContractError::NoStake {})?;

    if amount.is_zero() || amount > stake.amount {
        return Err(ContractError::InvalidAmount {
            available: stake.amount,
        });
    }
    if !stake.unlock.is_expired(&env.block) {
        return Err(ContractError::StakeLocked {
            expires: stake.unlock,
        });
    }

    let remaining = stake
        .amount
        .checked_sub(amount)
        .map_err(StdError::overflow)?;
    if remaining.is_zero() {
        STAKES.remove(deps.storage, (&info.sender, &org_id));
        REGISTRY.remove(deps.storage, (&org_id, &info.sender));
        // count may already be off while desynced, never underflow it
        org.staker_count = org.staker_count.saturating_sub(1);
    } else {
        STAKES.save(
            deps.storage,
            (&info.sender, &org_id),
            &StakeRecord {
                amount: remaining,
                unlock: stake.unlock,
            },
        )?;
        REGISTRY.save(deps.storage, (&org_id, &info.sender), &remaining)?;
    }

    let total = STAKE_TOTALS
        .may_load(deps.storage, &info.sender)?
        .unwrap_or_default()
        .checked_sub(amount)
        .map_err(StdError::overflow)?;
    if total.is_zero() {
        STAKE_TOTALS.remove(deps.storage, &info.sender);
    } else {
        STAKE_TOTALS.save(deps.storage, &info.sender, &total)?;
    }

    org.vault = org.vault.checked_sub(amount).map_err(StdError::overflow)?;
    ORGS.save(deps.storage, &org_id, &org)?;

    let release = BankMsg::Send {
        to_address: info.sender.to_string(),
        amount: coins(amount.u128(), cfg.denom),
    };

    Ok(Response::new()
        .add_message(release)
        .add_attribute("action", "withdraw")
        .add_attribute("sender", info.sender)
        .add_attribute("org_id", org_id)
        .add_attribute("amount", amount.to_string()))
}

#[allow(clippy::too_many_arguments)]
pub fn execute_create_ballot(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    org_id: String,
    title: String,
    description: String,
    opens_at: Timestamp,
    closes_at: Timestamp,
) -> Result<Response, ContractError> {
    let cfg = CONFIG.load(deps.storage)?;
    if !ORGS.has(deps.storage, &org_id) {
        return Err(ContractError::UnknownOrg { org_id });
    }
    cfg.oracle.assert_admin(&deps.querier, &org_id, &info.sender)?;

    // a ballot nobody can ever vote on is a caller mistake
    if closes_at <= opens_at || closes_at <= env.block.time {
        return Err(ContractError::InvalidBallotWindow {});
    }

    let ballot_id = next_ballot_id(deps.storage, &org_id)?;
    let ballot = Ballot {
        title,
        description,
        opens_at,
        closes_at,
        yes_weight: Uint128::zero(),
        no_weight: Uint128::zero(),
        completed: false,
    };
    BALLOTS.save(deps.storage, (&org_id, ballot_id), &ballot)?;

    Ok(Response::new()
        .set_data(to_binary(&ballot_id)?)
        .add_attribute("action", "create_ballot")
        .add_attribute("sender", info.sender)
        .add_attribute("org_id", org_id)
        .add_attribute("ballot_id", ballot_id.to_string()))
}

pub fn execute_cast_vote(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    org_id: String,
    ballot_id: u64,
    choice: VoteChoice,
) -> Result<Response, ContractError> {
    if !ORGS.has(deps.storage, &org_id) {
        return Err(ContractError::UnknownOrg { org_id });
    }
    let mut ballot = BALLOTS
        .may_load(deps.storage, (&org_id, ballot_id))?
        .ok_or(ContractError::BallotNotFound { ballot_id })?;

    if ballot.completed {
        return Err(ContractError::BallotCompleted {});
    }
    // one clock snapshot for every temporal check in this call
    let now = env.block.time;
    if !ballot.is_open(now) {
        return Err(ContractError::InvalidVoteTime {
            opens_at: ballot.opens_at,
            closes_at: ballot.closes_at,
        });
    }
    if VOTES.has(deps.storage, (&org_id, ballot_id, &info.sender)) {
        return Err(ContractError::AlreadyVoted {});
    }

    // the authoritative weight comes from the registry inside this same call,
    // never from the caller
    let weight = REGISTRY
        .may_load(deps.storage, (&org_id, &info.sender))?
        .unwrap_or_default();
    if weight.is_zero() {
        return Err(ContractError::NoVotingPower {});
    }

    ballot.add_vote(&choice, weight);
    BALLOTS.save(deps.storage, (&org_id, ballot_id), &ballot)?;
    VOTES.save(
        deps.storage,
        (&org_id, ballot_id, &info.sender),
        &VoteRecord {
            choice,
            weight,
            cast_at: now,
        },
    )?;

    Ok(Response::new()
        .add_attribute("action", "cast_vote")
        .add_attribute("sender", info.sender)
        .add_attribute("org_id", org_id)
        .add_attribute("ballot_id", ballot_id.to_string())
        .add_attribute("weight", weight.to_string()))
}

pub fn execute_declare_outcome(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    org_id: String,
    ballot_id: u64,
) -> Result<Response, ContractError> {
    let cfg = CONFIG.load(deps.storage)?;
    if !ORGS.has(deps.storage, &org_id) {
        return Err(ContractError::UnknownOrg { org_id });
    }
    cfg.oracle.assert_admin(&deps.querier, &org_id, &info.sender)?;

    let mut ballot = BALLOTS
        .may_load(deps.storage, (&org_id, ballot_id))?
        .ok_or(ContractError::BallotNotFound { ballot_id })?;
    if ballot.completed {
        return Err(ContractError::BallotCompleted {});
    }
    if env.block.time < ballot.closes_at {
        return Err(ContractError::InvalidVoteTime {
            opens_at: ballot.opens_at,
            closes_at: ballot.closes_at,
        });
    }

    ballot.completed = true;
    BALLOTS.save(deps.storage, (&org_id, ballot_id), &ballot)?;

    Ok(Response::new()
        .add_attribute("action", "declare_outcome")
        .add_attribute("sender", info.sender)
        .add_attribute("org_id", org_id)
        .add_attribute("ballot_id", ballot_id.to_string())
        .add_attribute("yes_weight", ballot.yes_weight.to_string())
        .add_attribute("no_weight", ballot.no_weight.to_string()))
}

/// Reconcile one registry mirror entry against the ledger. The ledger is
/// ground truth. Under fully atomic execution of deposit/withdraw desync
/// cannot occur; this exists for storage layers that cannot guarantee
/// multi-record atomicity.
pub fn execute_repair_sync(
    deps: DepsMut,
    info: MessageInfo,
    org_id: String,
    account: String,
) -> Result<Response, ContractError> {
    let cfg = CONFIG.load(deps.storage)?;
    let mut org = ORGS
        .may_load(deps.storage, &org_id)?
        .ok_or_else(|| ContractError::UnknownOrg {
            org_id: org_id.clone(),
        })?;
    cfg.oracle.assert_admin(&deps.querier, &org_id, &info.sender)?;

    let account = deps.api.addr_validate(&account)?;
    let ledger = STAKES
        .may_load(deps.storage, (&account, &org_id))?
        .map(|r| r.amount)
        .unwrap_or_default();
    let mirror = REGISTRY.may_load(deps.storage, (&org_id, &account))?;

    let result = if ledger.is_zero() {
        match mirror {
            // ghost entry cleanup
            Some(_) => {
                REGISTRY.remove(deps.storage, (&org_id, &account));
                org.staker_count = org.staker_count.saturating_sub(1);
                ORGS.save(deps.storage, &org_id, &org)?;
                "removed"
            }
            None => "in_sync",
        }
    } else {
        match mirror {
            Some(mirrored) if mirrored == ledger => "in_sync",
            Some(_) => {
                REGISTRY.save(deps.storage, (&org_id, &account), &ledger)?;
                "corrected"
            }
            None => {
                REGISTRY.save(deps.storage, (&org_id, &account), &ledger)?;
                org.staker_count += 1;
                ORGS.save(deps.storage, &org_id, &org)?;
                "restored"
            }
        }
    };

    Ok(Response::new()
        .add_attribute("action", "repair_sync")
        .add_attribute("sender", info.sender)
        .add_attribute("org_id", org_id)
        .add_attribute("account", account)
        .add_attribute("result", result))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_binary(&query_config(deps)?),
        QueryMsg::Staked { account } => to_binary(&query_staked(deps, account)?),
        QueryMsg::OrgStaked { org_id, account } => {
            to_binary(&query_org_staked(deps, org_id, account)?)
        }
        QueryMsg::TotalStaked { org_id } => to_binary(&query_total_staked(deps, org_id)?),
        QueryMsg::StakerCount { org_id } => to_binary(&query_staker_count(deps, org_id)?),
        QueryMsg::IsStaker { org_id, account } => {
            to_binary(&query_is_staker(deps, org_id, account)?)
        }
        QueryMsg::ListStakers {
            org_id,
            start_after,
            limit,
        } => to_binary(&list_stakers(deps, org_id, start_after, limit)?),
        QueryMsg::Ballot { org_id, ballot_id } => to_binary(&query_ballot(deps, org_id, ballot_id)?),
        QueryMsg::ListBallots {
            org_id,
            start_after,
            limit,
        } => to_binary(&list_ballots(deps, org_id, start_after, limit)?),
        QueryMsg::Vote {
            org_id,
            ballot_id,
            voter,
        } => to_binary(&query_vote(deps, org_id, ballot_id, voter)?),
        QueryMsg::ListVotes {
            org_id,
            ballot_id,
            start_after,
            limit,
        } => to_binary(&list_votes(deps, org_id, ballot_id, start_after, limit)?),
        QueryMsg::ValidateSync { org_id, account } => {
            to_binary(&query_validate_sync(deps, org_id, account)?)
        }
    }
}

fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let cfg = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        denom: cfg.denom,
        hold_period: cfg.hold_period,
        oracle: cfg.oracle.addr().into_string(),
    })
}

pub fn query_staked(deps: Deps, account: String) -> StdResult<StakedResponse> {
    let account = deps.api.addr_validate(&account)?;
    let amount = STAKE_TOTALS
        .may_load(deps.storage, &account)?
        .unwrap_or_default();
    Ok(StakedResponse { amount })
}

pub fn query_org_staked(deps: Deps, org_id: String, account: String) -> StdResult<StakedResponse> {
    let account = deps.api.addr_validate(&account)?;
    let amount = REGISTRY
        .may_load(deps.storage, (&org_id, &account))?
        .unwrap_or_default();
    Ok(StakedResponse { amount })
}

pub fn query_total_staked(deps: Deps, org_id: String) -> StdResult<TotalStakedResponse> {
    let total = ORGS
        .may_load(deps.storage, &org_id)?
        .map(|o| o.vault)
        .unwrap_or_default();
    Ok(TotalStakedResponse { total })
}

pub fn query_staker_count(deps: Deps, org_id: String) -> StdResult<StakerCountResponse> {
    let count = ORGS
        .may_load(deps.storage, &org_id)?
        .map(|o| o.staker_count)
        .unwrap_or_default();
    Ok(StakerCountResponse { count })
}

pub fn query_is_staker(deps: Deps, org_id: String, account: String) -> StdResult<IsStakerResponse> {
    let account = deps.api.addr_validate(&account)?;
    let is_staker = REGISTRY.has(deps.storage, (&org_id, &account));
    Ok(IsStakerResponse { is_staker })
}

// settings for pagination
const MAX_LIMIT: u32 = 30;
const DEFAULT_LIMIT: u32 = 10;

fn list_stakers(
    deps: Deps,
    org_id: String,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<StakerListResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let addr = maybe_addr(deps.api, start_after)?;
    let start = addr.as_ref().map(Bound::exclusive);

    let stakers = REGISTRY
        .prefix(&org_id)
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| {
            let (account, amount) = item?;
            Ok(StakerInfo {
                account: account.into_string(),
                amount,
            })
        })
        .collect::<StdResult<Vec<_>>>()?;

    Ok(StakerListResponse { stakers })
}

pub fn query_ballot(deps: Deps, org_id: String, ballot_id: u64) -> StdResult<BallotResponse> {
    let ballot = BALLOTS.load(deps.storage, (&org_id, ballot_id))?;
    Ok(BallotResponse { ballot_id, ballot })
}

fn list_ballots(
    deps: Deps,
    org_id: String,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<BallotListResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    let ballots = BALLOTS
        .prefix(&org_id)
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| {
            let (ballot_id, ballot) = item?;
            Ok(BallotResponse { ballot_id, ballot })
        })
        .collect::<StdResult<Vec<_>>>()?;

    Ok(BallotListResponse { ballots })
}

pub fn query_vote(
    deps: Deps,
    org_id: String,
    ballot_id: u64,
    voter: String,
) -> StdResult<VoteResponse> {
    let voter = deps.api.addr_validate(&voter)?;
    let vote = VOTES
        .may_load(deps.storage, (&org_id, ballot_id, &voter))?
        .map(|record| VoteInfo {
            voter: voter.into_string(),
            choice: record.choice,
            weight: record.weight,
            cast_at: record.cast_at,
        });
    Ok(VoteResponse { vote })
}

fn list_votes(
    deps: Deps,
    org_id: String,
    ballot_id: u64,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<VoteListResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let addr = maybe_addr(deps.api, start_after)?;
    let start = addr.as_ref().map(Bound::exclusive);

    let votes = VOTES
        .prefix((&org_id, ballot_id))
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| {
            let (voter, record) = item?;
            Ok(VoteInfo {
                voter: voter.into_string(),
                choice: record.choice,
                weight: record.weight,
                cast_at: record.cast_at,
            })
        })
        .collect::<StdResult<Vec<_>>>()?;

    Ok(VoteListResponse { votes })
}

/// True iff the registry mirror matches the ledger, where absence on one
/// side requires absence on the other. Read-only so it can back an
/// out-of-band monitoring job.
pub fn query_validate_sync(deps: Deps, org_id: String, account: String) -> StdResult<SyncResponse> {
    let account = deps.api.addr_validate(&account)?;
    let ledger = STAKES
        .may_load(deps.storage, (&account, &org_id))?
        .map(|r| r.amount);
    let registry = REGISTRY.may_load(deps.storage, (&org_id, &account))?;

    Ok(SyncResponse {
        in_sync: ledger == registry,
        ledger: ledger.unwrap_or_default(),
        registry: registry.unwrap_or_default(),
    })
}
