use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, QuerierWrapper, StdResult};

use crate::error::ContractError;

/// Query interface of the external access-control contract. This contract
/// only ever asks one question of it.
#[cw_serde]
pub enum OracleQueryMsg {
    IsAdmin { org_id: String, addr: String },
}

#[cw_serde]
pub struct IsAdminResponse {
    pub is_admin: bool,
}

/// AccessOracle is a wrapper around Addr that knows how to ask the
/// access-control contract whether a caller administers an organization.
///
/// Role policy lives entirely in that contract; here it is consumed as a
/// yes/no answer.
#[cw_serde]
pub struct AccessOracle(pub Addr);

impl AccessOracle {
    pub fn addr(&self) -> Addr {
        self.0.clone()
    }

    pub fn is_admin(
        &self,
        querier: &QuerierWrapper,
        org_id: &str,
        addr: &Addr,
    ) -> StdResult<bool> {
        let query = OracleQueryMsg::IsAdmin {
            org_id: org_id.to_string(),
            addr: addr.to_string(),
        };
        let res: IsAdminResponse = querier.query_wasm_smart(self.addr(), &query)?;
        Ok(res.is_admin)
    }

    pub fn assert_admin(
        &self,
        querier: &QuerierWrapper,
        org_id: &str,
        addr: &Addr,
    ) -> Result<(), ContractError> {
        if !self.is_admin(querier, org_id, addr)? {
            return Err(ContractError::Unauthorized {});
        }
        Ok(())
    }
}
