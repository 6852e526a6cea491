use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Timestamp, Uint128};
use cw_utils::Duration;

use crate::state::{Ballot, VoteChoice};

#[cw_serde]
pub struct InstantiateMsg {
    /// denom of the token locked as collateral
    pub denom: String,
    /// minimum lock time after an account's first deposit into an organization
    pub hold_period: Duration,
    /// address of the access-control contract
    pub oracle: String,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Set up the keyed sub-state for a new organization. Only callable by an
    /// address the oracle confirms as that organization's admin.
    CreateOrganization { org_id: String },
    /// Lock all collateral tokens sent with the message into the
    /// organization's vault and gain the equivalent voting power.
    Deposit { org_id: String },
    /// Release previously locked collateral back to the sender. Blocked until
    /// the hold period from the first deposit has elapsed.
    Withdraw { org_id: String, amount: Uint128 },
    /// Open a new yes/no ballot. Admin only.
    CreateBallot {
        org_id: String,
        title: String,
        description: String,
        opens_at: Timestamp,
        closes_at: Timestamp,
    },
    /// Vote with the full registry weight held at call time. The weight is
    /// never taken from the caller.
    CastVote {
        org_id: String,
        ballot_id: u64,
        choice: VoteChoice,
    },
    /// Freeze a ballot once its close time has passed. Admin only.
    DeclareOutcome { org_id: String, ballot_id: u64 },
    /// Reconcile one account's registry mirror against the ledger. Admin
    /// only; a no-op when already in sync.
    RepairSync { org_id: String, account: String },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},
    /// Total staked by one account across all organizations.
    #[returns(StakedResponse)]
    Staked { account: String },
    /// Staked by one account in one organization (zero if absent).
    #[returns(StakedResponse)]
    OrgStaked { org_id: String, account: String },
    /// Vault balance of the organization, i.e. total voting power.
    #[returns(TotalStakedResponse)]
    TotalStaked { org_id: String },
    #[returns(StakerCountResponse)]
    StakerCount { org_id: String },
    #[returns(IsStakerResponse)]
    IsStaker { org_id: String, account: String },
    #[returns(StakerListResponse)]
    ListStakers {
        org_id: String,
        start_after: Option<String>,
        limit: Option<u32>,
    },
    #[returns(BallotResponse)]
    Ballot { org_id: String, ballot_id: u64 },
    #[returns(BallotListResponse)]
    ListBallots {
        org_id: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    /// The vote one account cast on one ballot, if any.
    #[returns(VoteResponse)]
    Vote {
        org_id: String,
        ballot_id: u64,
        voter: String,
    },
    #[returns(VoteListResponse)]
    ListVotes {
        org_id: String,
        ballot_id: u64,
        start_after: Option<String>,
        limit: Option<u32>,
    },
    /// Compare one account's ledger balance with its registry mirror.
    #[returns(SyncResponse)]
    ValidateSync { org_id: String, account: String },
}

#[cw_serde]
pub struct ConfigResponse {
    pub denom: String,
    pub hold_period: Duration,
    pub oracle: String,
}

#[cw_serde]
pub struct StakedResponse {
    pub amount: Uint128,
}

#[cw_serde]
pub struct TotalStakedResponse {
    pub total: Uint128,
}

#[cw_serde]
pub struct StakerCountResponse {
    pub count: u64,
}

#[cw_serde]
pub struct IsStakerResponse {
    pub is_staker: bool,
}

#[cw_serde]
pub struct StakerInfo {
    pub account: String,
    pub amount: Uint128,
}

#[cw_serde]
pub struct StakerListResponse {
    pub stakers: Vec<StakerInfo>,
}

#[cw_serde]
pub struct BallotResponse {
    pub ballot_id: u64,
    pub ballot: Ballot,
}

#[cw_serde]
pub struct BallotListResponse {
    pub ballots: Vec<BallotResponse>,
}

#[cw_serde]
pub struct VoteInfo {
    pub voter: String,
    pub choice: VoteChoice,
    pub weight: Uint128,
    pub cast_at: Timestamp,
}

#[cw_serde]
pub struct VoteResponse {
    pub vote: Option<VoteInfo>,
}

#[cw_serde]
pub struct VoteListResponse {
    pub votes: Vec<VoteInfo>,
}

#[cw_serde]
pub struct SyncResponse {
    pub in_sync: bool,
    pub ledger: Uint128,
    pub registry: Uint128,
}
