use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, StdResult, Storage, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};
use cw_utils::{Duration, Expiration};

use crate::oracle::AccessOracle;

#[cw_serde]
pub struct Config {
    /// denom of the token locked as collateral
    pub denom: String,
    /// minimum time collateral stays locked after an account's first deposit
    /// into an organization
    pub hold_period: Duration,
    /// access-control contract answering admin checks
    pub oracle: AccessOracle,
}

/// Per-organization counters. The vault total must equal the sum of the
/// organization's registry entries at rest.
#[cw_serde]
pub struct OrgState {
    pub vault: Uint128,
    pub staker_count: u64,
    pub ballot_count: u64,
}

impl OrgState {
    pub fn new() -> Self {
        OrgState {
            vault: Uint128::zero(),
            staker_count: 0,
            ballot_count: 0,
        }
    }
}

/// One account's locked collateral in one organization. This is the source of
/// truth; the REGISTRY entry mirrors `amount`.
#[cw_serde]
pub struct StakeRecord {
    pub amount: Uint128,
    /// set on the first deposit and preserved across top-ups
    pub unlock: Expiration,
}

#[cw_serde]
pub enum VoteChoice {
    Yes,
    No,
}

#[cw_serde]
pub struct Ballot {
    pub title: String,
    pub description: String,
    pub opens_at: Timestamp,
    pub closes_at: Timestamp,
    pub yes_weight: Uint128,
    pub no_weight: Uint128,
    pub completed: bool,
}

impl Ballot {
    pub fn is_open(&self, now: Timestamp) -> bool {
        now >= self.opens_at && now <= self.closes_at
    }

    pub fn add_vote(&mut self, choice: &VoteChoice, weight: Uint128) {
        match choice {
            VoteChoice::Yes => self.yes_weight += weight,
            VoteChoice::No => self.no_weight += weight,
        }
    }
}

/// One recorded vote, stored under the voter's address so a second vote by
/// the same account is a single lookup away.
#[cw_serde]
pub struct VoteRecord {
    pub choice: VoteChoice,
    pub weight: Uint128,
    pub cast_at: Timestamp,
}

pub const CONFIG: Item<Config> = Item::new("config");

/// organization id -> per-organization counters
pub const ORGS: Map<&str, OrgState> = Map::new("orgs");

/// (account, organization id) -> ledger record; removed when amount hits zero
pub const STAKES: Map<(&Addr, &str), StakeRecord> = Map::new("stakes");

/// account -> total staked across all organizations (denormalized)
pub const STAKE_TOTALS: Map<&Addr, Uint128> = Map::new("stake_totals");

/// (organization id, account) -> staked amount; mirror of STAKES kept for
/// O(1) per-organization aggregates; absence means zero
pub const REGISTRY: Map<(&str, &Addr), Uint128> = Map::new("registry");

/// (organization id, ballot id) -> ballot
pub const BALLOTS: Map<(&str, u64), Ballot> = Map::new("ballots");

/// (organization id, ballot id, voter) -> recorded vote
pub const VOTES: Map<(&str, u64, &Addr), VoteRecord> = Map::new("votes");

/// Allocate the next ballot id for an organization. Ids start at 1.
pub fn next_ballot_id(store: &mut dyn Storage, org_id: &str) -> StdResult<u64> {
    let mut org = ORGS.load(store, org_id)?;
    org.ballot_count += 1;
    let id = org.ballot_count;
    ORGS.save(store, org_id, &org)?;
    Ok(id)
}
