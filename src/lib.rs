/*!
This contract is the collateral-and-voting ledger for a multi-tenant governance
platform. Any number of independently governed organizations share one contract
instance; each organization gets its own collateral vault, staker registry, and
ballot list, all keyed by an organization id.

Accounts lock native tokens into an organization's vault to obtain voting
power. Locked tokens are tracked twice on purpose: once in a per-account ledger
(the source of truth, including a cross-organization total) and once in a
per-organization registry mirror so aggregate reads like "total voting power"
or "how many stakers" are O(1) instead of a global scan. The `ValidateSync`
query and the privileged `RepairSync` call reconcile the mirror against the
ledger if a storage layer ever leaves them diverged.

Voting power is spent on time-boxed yes/no ballots. The weight applied to a
vote is always read from the registry inside the voting call itself — callers
never supply their own weight. A configurable hold period blocks withdrawals
for a while after an account's first deposit into an organization, so nobody
can stake, vote with the resulting weight, and exit within the same short
window.

Who may administer an organization is not decided here: an external
access-control contract is queried as a yes/no oracle (see [`oracle`]).
*/

pub mod contract;
mod error;
pub mod msg;
pub mod oracle;
pub mod state;

#[cfg(test)]
mod integration_tests;

pub use crate::error::ContractError;
