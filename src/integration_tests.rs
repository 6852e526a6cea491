//! End-to-end tests running the contract against the multi-test app, with a
//! real bank module holding the vault funds and a mock access-control
//! contract standing in for the external oracle.

use cosmwasm_std::{coins, Addr, Empty, Uint128};
use cw_multi_test::{App, AppBuilder, Contract, ContractWrapper, Executor};
use cw_utils::{Duration, Expiration};

use crate::error::ContractError;
use crate::msg::{
    BallotResponse, ExecuteMsg, InstantiateMsg, QueryMsg, StakedResponse, StakerCountResponse,
    SyncResponse, TotalStakedResponse,
};
use crate::state::VoteChoice;

const DENOM: &str = "ustake";
const OPERATOR: &str = "operator";
const ALICE: &str = "alice";
const BOB: &str = "bob";
const ORG: &str = "dao-one";

const HOLD_SECS: u64 = 7 * 24 * 3600;

/// Minimal access-control contract: one address administers every
/// organization. Only the query side matters here.
mod mock_oracle {
    use cosmwasm_schema::cw_serde;
    use cosmwasm_std::{
        to_binary, Addr, Binary, Deps, DepsMut, Empty, Env, MessageInfo, Response, StdResult,
    };
    use cw_storage_plus::Item;

    use crate::oracle::{IsAdminResponse, OracleQueryMsg};

    pub const ADMIN: Item<Addr> = Item::new("admin");

    #[cw_serde]
    pub struct InstantiateMsg {
        pub admin: String,
    }

    pub fn instantiate(
        deps: DepsMut,
        _env: Env,
        _info: MessageInfo,
        msg: InstantiateMsg,
    ) -> StdResult<Response> {
        ADMIN.save(deps.storage, &deps.api.addr_validate(&msg.admin)?)?;
        Ok(Response::default())
    }

    pub fn execute(
        _deps: DepsMut,
        _env: Env,
        _info: MessageInfo,
        _msg: Empty,
    ) -> StdResult<Response> {
        Ok(Response::default())
    }

    pub fn query(deps: Deps, _env: Env, msg: OracleQueryMsg) -> StdResult<Binary> {
        match msg {
            OracleQueryMsg::IsAdmin { addr, .. } => {
                let admin = ADMIN.load(deps.storage)?;
                to_binary(&IsAdminResponse {
                    is_admin: admin.as_str() == addr,
                })
            }
        }
    }
}

fn contract_stake() -> Box<dyn Contract<Empty>> {
    let contract = ContractWrapper::new(
        crate::contract::execute,
        crate::contract::instantiate,
        crate::contract::query,
    );
    Box::new(contract)
}

fn contract_oracle() -> Box<dyn Contract<Empty>> {
    let contract = ContractWrapper::new(
        mock_oracle::execute,
        mock_oracle::instantiate,
        mock_oracle::query,
    );
    Box::new(contract)
}

struct Suite {
    app: App,
    stake: Addr,
}

impl Suite {
    fn init() -> Suite {
        let mut app = AppBuilder::new().build(|router, _, storage| {
            for user in [ALICE, BOB] {
                router
                    .bank
                    .init_balance(storage, &Addr::unchecked(user), coins(1_000, DENOM))
                    .unwrap();
            }
        });

        let oracle_id = app.store_code(contract_oracle());
        let oracle = app
            .instantiate_contract(
                oracle_id,
                Addr::unchecked(OPERATOR),
                &mock_oracle::InstantiateMsg {
                    admin: OPERATOR.to_string(),
                },
                &[],
                "oracle",
                None,
            )
            .unwrap();

        let stake_id = app.store_code(contract_stake());
        let stake = app
            .instantiate_contract(
                stake_id,
                Addr::unchecked(OPERATOR),
                &InstantiateMsg {
                    denom: DENOM.to_string(),
                    hold_period: Duration::Time(HOLD_SECS),
                    oracle: oracle.into_string(),
                },
                &[],
                "dao-stake",
                None,
            )
            .unwrap();

        let mut suite = Suite { app, stake };
        suite
            .execute(OPERATOR, ExecuteMsg::CreateOrganization {
                org_id: ORG.to_string(),
            })
            .unwrap();
        suite
    }

    fn execute(&mut self, sender: &str, msg: ExecuteMsg) -> Result<(), ContractError> {
        self.execute_with_funds(sender, msg, &[])
    }

    fn execute_with_funds(
        &mut self,
        sender: &str,
        msg: ExecuteMsg,
        funds: &[cosmwasm_std::Coin],
    ) -> Result<(), ContractError> {
        self.app
            .execute_contract(Addr::unchecked(sender), self.stake.clone(), &msg, funds)
            .map(|_| ())
            .map_err(|err| err.downcast().unwrap())
    }

    fn deposit(&mut self, sender: &str, amount: u128) {
        self.execute_with_funds(
            sender,
            ExecuteMsg::Deposit {
                org_id: ORG.to_string(),
            },
            &coins(amount, DENOM),
        )
        .unwrap();
    }

    fn advance_time(&mut self, secs: u64) {
        self.app.update_block(|block| {
            block.time = block.time.plus_seconds(secs);
            block.height += secs / 5;
        });
    }

    fn balance(&self, addr: &str) -> u128 {
        self.app
            .wrap()
            .query_balance(addr, DENOM)
            .unwrap()
            .amount
            .u128()
    }

    fn total_staked(&self) -> Uint128 {
        let res: TotalStakedResponse = self
            .app
            .wrap()
            .query_wasm_smart(
                self.stake.clone(),
                &QueryMsg::TotalStaked {
                    org_id: ORG.to_string(),
                },
            )
            .unwrap();
        res.total
    }
}

#[test]
fn vault_custody_matches_total_staked() {
    let mut suite = Suite::init();

    suite.deposit(ALICE, 500);
    suite.deposit(BOB, 300);

    // the contract account actually holds the pooled collateral
    assert_eq!(suite.balance(suite.stake.as_str()), 800);
    assert_eq!(suite.total_staked(), Uint128::new(800));
    assert_eq!(suite.balance(ALICE), 500);
    assert_eq!(suite.balance(BOB), 700);

    let count: StakerCountResponse = suite
        .app
        .wrap()
        .query_wasm_smart(
            suite.stake.clone(),
            &QueryMsg::StakerCount {
                org_id: ORG.to_string(),
            },
        )
        .unwrap();
    assert_eq!(count.count, 2);
}

#[test]
fn withdraw_returns_funds_after_hold_period() {
    let mut suite = Suite::init();
    let deposited_at = suite.app.block_info().time;

    suite.deposit(ALICE, 500);

    let withdraw = ExecuteMsg::Withdraw {
        org_id: ORG.to_string(),
        amount: Uint128::new(200),
    };
    let err = suite.execute(ALICE, withdraw.clone()).unwrap_err();
    assert_eq!(
        err,
        ContractError::StakeLocked {
            expires: Expiration::AtTime(deposited_at.plus_seconds(HOLD_SECS)),
        }
    );
    // nothing moved
    assert_eq!(suite.balance(ALICE), 500);
    assert_eq!(suite.total_staked(), Uint128::new(500));

    suite.advance_time(HOLD_SECS);
    suite.execute(ALICE, withdraw).unwrap();

    assert_eq!(suite.balance(ALICE), 700);
    assert_eq!(suite.balance(suite.stake.as_str()), 300);
    assert_eq!(suite.total_staked(), Uint128::new(300));

    let sync: SyncResponse = suite
        .app
        .wrap()
        .query_wasm_smart(
            suite.stake.clone(),
            &QueryMsg::ValidateSync {
                org_id: ORG.to_string(),
                account: ALICE.to_string(),
            },
        )
        .unwrap();
    assert!(sync.in_sync);
}

#[test]
fn stake_weighted_ballot_end_to_end() {
    let mut suite = Suite::init();

    suite.deposit(ALICE, 500);
    suite.deposit(BOB, 300);

    let now = suite.app.block_info().time;
    suite
        .execute(OPERATOR, ExecuteMsg::CreateBallot {
            org_id: ORG.to_string(),
            title: "fund the grants round".to_string(),
            description: "allocate the quarterly grants budget".to_string(),
            opens_at: now,
            closes_at: now.plus_seconds(3600),
        })
        .unwrap();

    suite
        .execute(ALICE, ExecuteMsg::CastVote {
            org_id: ORG.to_string(),
            ballot_id: 1,
            choice: VoteChoice::Yes,
        })
        .unwrap();
    suite
        .execute(BOB, ExecuteMsg::CastVote {
            org_id: ORG.to_string(),
            ballot_id: 1,
            choice: VoteChoice::No,
        })
        .unwrap();

    // a second vote is rejected even with more stake deposited meanwhile
    suite.deposit(ALICE, 100);
    let err = suite
        .execute(ALICE, ExecuteMsg::CastVote {
            org_id: ORG.to_string(),
            ballot_id: 1,
            choice: VoteChoice::Yes,
        })
        .unwrap_err();
    assert_eq!(err, ContractError::AlreadyVoted {});

    // outcome only after the window closes
    let declare = ExecuteMsg::DeclareOutcome {
        org_id: ORG.to_string(),
        ballot_id: 1,
    };
    let err = suite.execute(OPERATOR, declare.clone()).unwrap_err();
    assert!(matches!(err, ContractError::InvalidVoteTime { .. }));

    suite.advance_time(3601);
    suite.execute(OPERATOR, declare).unwrap();

    let res: BallotResponse = suite
        .app
        .wrap()
        .query_wasm_smart(
            suite.stake.clone(),
            &QueryMsg::Ballot {
                org_id: ORG.to_string(),
                ballot_id: 1,
            },
        )
        .unwrap();
    assert_eq!(res.ballot.yes_weight, Uint128::new(500));
    assert_eq!(res.ballot.no_weight, Uint128::new(300));
    assert!(res.ballot.completed);
}

#[test]
fn flash_stake_voting_is_blocked() {
    let mut suite = Suite::init();

    let now = suite.app.block_info().time;
    suite
        .execute(OPERATOR, ExecuteMsg::CreateBallot {
            org_id: ORG.to_string(),
            title: "contentious".to_string(),
            description: "a vote worth attacking".to_string(),
            opens_at: now,
            closes_at: now.plus_seconds(3600),
        })
        .unwrap();

    // stake, vote with the fresh weight...
    suite.deposit(ALICE, 500);
    suite
        .execute(ALICE, ExecuteMsg::CastVote {
            org_id: ORG.to_string(),
            ballot_id: 1,
            choice: VoteChoice::Yes,
        })
        .unwrap();

    // ...but the collateral cannot leave until long after the ballot closed
    let err = suite
        .execute(ALICE, ExecuteMsg::Withdraw {
            org_id: ORG.to_string(),
            amount: Uint128::new(500),
        })
        .unwrap_err();
    assert!(matches!(err, ContractError::StakeLocked { .. }));
    assert_eq!(suite.balance(ALICE), 500);
}

#[test]
fn repair_sync_is_privileged_and_idempotent() {
    let mut suite = Suite::init();
    suite.deposit(ALICE, 500);

    let repair = ExecuteMsg::RepairSync {
        org_id: ORG.to_string(),
        account: ALICE.to_string(),
    };
    let err = suite.execute(ALICE, repair.clone()).unwrap_err();
    assert_eq!(err, ContractError::Unauthorized {});

    // with nothing diverged the repair is a no-op, twice over
    suite.execute(OPERATOR, repair.clone()).unwrap();
    suite.execute(OPERATOR, repair).unwrap();

    let staked: StakedResponse = suite
        .app
        .wrap()
        .query_wasm_smart(
            suite.stake.clone(),
            &QueryMsg::OrgStaked {
                org_id: ORG.to_string(),
                account: ALICE.to_string(),
            },
        )
        .unwrap();
    assert_eq!(staked.amount, Uint128::new(500));
}
