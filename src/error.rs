use cosmwasm_std::{StdError, Timestamp, Uint128};
use cw_utils::{Expiration, PaymentError};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Payment(#[from] PaymentError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Organization id cannot be empty")]
    InvalidOrgId {},

    #[error("Organization '{org_id}' already exists")]
    OrgExists { org_id: String },

    #[error("Organization '{org_id}' does not exist")]
    UnknownOrg { org_id: String },

    #[error("No stake recorded for this account in the organization")]
    NoStake {},

    #[error("Invalid amount, {available} staked")]
    InvalidAmount { available: Uint128 },

    #[error("Stake is still locked ({expires})")]
    StakeLocked { expires: Expiration },

    #[error("Ballot {ballot_id} not found")]
    BallotNotFound { ballot_id: u64 },

    #[error("Ballot must close after it opens and in the future")]
    InvalidBallotWindow {},

    #[error("Voting is not open between {opens_at} and {closes_at}")]
    InvalidVoteTime {
        opens_at: Timestamp,
        closes_at: Timestamp,
    },

    #[error("Account already voted on this ballot")]
    AlreadyVoted {},

    #[error("Account has no voting power in this organization")]
    NoVotingPower {},

    #[error("Ballot outcome already declared")]
    BallotCompleted {},
}
