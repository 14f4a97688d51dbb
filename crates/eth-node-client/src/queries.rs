//! Contract view-call helpers
//!
//! Each helper evaluates one view function at the given block and returns
//! the raw integer result. No de-scaling happens here.

use fixrate_core::{Address, BlockHeight};
use web3::types::{H160, U256};

use crate::contracts::{self, Abi};
use crate::{NodeClient, Result};

/// Names of the functions read by fixrate
pub mod methods {
    /// Money-market cToken: underlying per cToken, accrued to this block
    pub const EXCHANGE_RATE_CURRENT: &str = "exchangeRateCurrent";
    /// Money-market cToken: supply interest rate per block (1e18)
    pub const SUPPLY_RATE_PER_BLOCK: &str = "supplyRatePerBlock";
    /// ERC-20 balance
    pub const BALANCE_OF: &str = "balanceOf";
    /// Claim series: floor exchange rate fixed at creation (1e16)
    pub const CREATE_PRICE: &str = "createPrice";
    /// Claim series: collateralization ratio (1e18)
    pub const COLLATERAL_FACTOR: &str = "collateralFactor";
    /// Claim series: blocks remaining until maturity
    pub const BLOCKS_TO_EXPIRY: &str = "blocksToExpiry";
    /// Claim series: first expiry block at least `n` blocks away
    pub const CALC_NEXT_EXPIRY_BLOCK_AFTER: &str = "calcNextExpiryBlockAfter";
    /// AMM pair reserves (uint112, uint112, uint32)
    pub const GET_RESERVES: &str = "getReserves";
    /// AMM pair first token
    pub const TOKEN0: &str = "token0";
}

async fn query_u256(
    client: &NodeClient,
    abi: Abi,
    contract: &Address,
    method: &str,
    block: BlockHeight,
) -> Result<U256> {
    client.query(abi, contract, method, (), block).await
}

pub async fn exchange_rate_current(
    client: &NodeClient,
    ctoken: &Address,
    block: BlockHeight,
) -> Result<u128> {
    let raw = query_u256(client, Abi::CToken, ctoken, methods::EXCHANGE_RATE_CURRENT, block).await?;
    contracts::to_u128(raw, methods::EXCHANGE_RATE_CURRENT)
}

pub async fn supply_rate_per_block(
    client: &NodeClient,
    ctoken: &Address,
    block: BlockHeight,
) -> Result<u128> {
    let raw = query_u256(client, Abi::CToken, ctoken, methods::SUPPLY_RATE_PER_BLOCK, block).await?;
    contracts::to_u128(raw, methods::SUPPLY_RATE_PER_BLOCK)
}

pub async fn balance_of(
    client: &NodeClient,
    token: &Address,
    owner: &Address,
    block: BlockHeight,
) -> Result<u128> {
    let owner = contracts::to_h160(owner)?;
    let raw: U256 = client
        .query(Abi::Erc20, token, methods::BALANCE_OF, (owner,), block)
        .await?;
    contracts::to_u128(raw, methods::BALANCE_OF)
}

pub async fn create_price(
    client: &NodeClient,
    series: &Address,
    block: BlockHeight,
) -> Result<u128> {
    let raw = query_u256(client, Abi::Series, series, methods::CREATE_PRICE, block).await?;
    contracts::to_u128(raw, methods::CREATE_PRICE)
}

pub async fn collateral_factor(
    client: &NodeClient,
    series: &Address,
    block: BlockHeight,
) -> Result<u128> {
    let raw = query_u256(client, Abi::Series, series, methods::COLLATERAL_FACTOR, block).await?;
    contracts::to_u128(raw, methods::COLLATERAL_FACTOR)
}

pub async fn blocks_to_expiry(
    client: &NodeClient,
    series: &Address,
    block: BlockHeight,
) -> Result<u64> {
    let raw = query_u256(client, Abi::Series, series, methods::BLOCKS_TO_EXPIRY, block).await?;
    contracts::to_u64(raw, methods::BLOCKS_TO_EXPIRY)
}

pub async fn calc_next_expiry_block_after(
    client: &NodeClient,
    series: &Address,
    min_blocks: u64,
    block: BlockHeight,
) -> Result<BlockHeight> {
    let raw: U256 = client
        .query(
            Abi::Series,
            series,
            methods::CALC_NEXT_EXPIRY_BLOCK_AFTER,
            (U256::from(min_blocks),),
            block,
        )
        .await?;
    contracts::to_u64(raw, methods::CALC_NEXT_EXPIRY_BLOCK_AFTER)
}

/// Pair reserves in token0/token1 order
pub async fn get_reserves(
    client: &NodeClient,
    pair: &Address,
    block: BlockHeight,
) -> Result<(u128, u128)> {
    let (reserve0, reserve1, _timestamp): (U256, U256, U256) = client
        .query(Abi::Pair, pair, methods::GET_RESERVES, (), block)
        .await?;
    Ok((
        contracts::to_u128(reserve0, "reserve0")?,
        contracts::to_u128(reserve1, "reserve1")?,
    ))
}

pub async fn token0(client: &NodeClient, pair: &Address, block: BlockHeight) -> Result<Address> {
    let token: H160 = client
        .query(Abi::Pair, pair, methods::TOKEN0, (), block)
        .await?;
    Ok(contracts::from_h160(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixrate_core::{NodeConfig, NodeError};
    use web3::ethabi;

    fn functions(abi: Abi) -> Vec<String> {
        let contract = ethabi::Contract::load(abi.json()).unwrap();
        contract.functions().map(|f| f.name.clone()).collect()
    }

    #[test]
    fn test_every_method_is_in_its_abi() {
        let cases = [
            (Abi::CToken, methods::EXCHANGE_RATE_CURRENT),
            (Abi::CToken, methods::SUPPLY_RATE_PER_BLOCK),
            (Abi::Erc20, methods::BALANCE_OF),
            (Abi::Series, methods::CREATE_PRICE),
            (Abi::Series, methods::COLLATERAL_FACTOR),
            (Abi::Series, methods::BLOCKS_TO_EXPIRY),
            (Abi::Series, methods::CALC_NEXT_EXPIRY_BLOCK_AFTER),
            (Abi::Pair, methods::GET_RESERVES),
            (Abi::Pair, methods::TOKEN0),
        ];
        for (abi, method) in cases {
            assert!(
                functions(abi).iter().any(|f| f == method),
                "{} missing from {} ABI",
                method,
                abi.name()
            );
        }
    }

    #[test]
    fn test_reserves_decode_from_return_data() {
        let contract = ethabi::Contract::load(Abi::Pair.json()).unwrap();
        let function = contract.function(methods::GET_RESERVES).unwrap();

        let mut data = Vec::new();
        for value in [1_000_000u64, 1_200_000, 1_650_000_000] {
            let mut word = [0u8; 32];
            word[24..].copy_from_slice(&value.to_be_bytes());
            data.extend_from_slice(&word);
        }

        let tokens = function.decode_output(&data).unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], ethabi::Token::Uint(U256::from(1_000_000u64)));
        assert_eq!(tokens[1], ethabi::Token::Uint(U256::from(1_200_000u64)));
    }

    #[tokio::test]
    async fn test_query_malformed_contract_address() {
        let client = NodeClient::new_unconnected(NodeConfig::default()).unwrap();
        let err = create_price(&client, &Address::new("0x22"), 14_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_query_unreachable_node() {
        let client = NodeClient::new_unconnected(NodeConfig {
            url: "http://127.0.0.1:1".to_string(),
            request_timeout_secs: 1,
        })
        .unwrap();
        let series = Address::new("0x1111111111111111111111111111111111111111");
        let err = blocks_to_expiry(&client, &series, 14_000_000)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NodeError::Unreachable { .. } | NodeError::Timeout { .. }
        ));
    }
}
