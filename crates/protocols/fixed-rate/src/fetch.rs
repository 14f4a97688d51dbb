//! Fixed-Rate State Fetching from Node
//!
//! Reads one consistent snapshot: the block height is pinned first and every
//! contract read is evaluated at that block. Reads run concurrently; any
//! failure aborts the cycle before pricing.

use std::future::Future;
use std::time::{SystemTime, UNIX_EPOCH};

use eth_node_client::{queries, NodeClient};
use fixrate_core::{Address, BlockHeight, MarketConfig, NodeError, ProtocolError};

use crate::scaling::TokenScales;
use crate::state::{MarketPricingState, NextExpiry, RawSnapshot};

/// Contract reads needed to price a market
pub trait MarketReader: Sync {
    fn block_number(&self) -> impl Future<Output = Result<BlockHeight, ProtocolError>> + Send;

    fn exchange_rate_current(
        &self,
        ctoken: &Address,
        block: BlockHeight,
    ) -> impl Future<Output = Result<u128, ProtocolError>> + Send;

    fn supply_rate_per_block(
        &self,
        ctoken: &Address,
        block: BlockHeight,
    ) -> impl Future<Output = Result<u128, ProtocolError>> + Send;

    fn balance_of(
        &self,
        token: &Address,
        owner: &Address,
        block: BlockHeight,
    ) -> impl Future<Output = Result<u128, ProtocolError>> + Send;

    /// Series floor exchange rate (`createPrice`)
    fn min_exchange_rate(
        &self,
        series: &Address,
        block: BlockHeight,
    ) -> impl Future<Output = Result<u128, ProtocolError>> + Send;

    fn collateral_factor(
        &self,
        series: &Address,
        block: BlockHeight,
    ) -> impl Future<Output = Result<u128, ProtocolError>> + Send;

    fn blocks_to_expiry(
        &self,
        series: &Address,
        block: BlockHeight,
    ) -> impl Future<Output = Result<u64, ProtocolError>> + Send;

    /// AMM reserves as (claim, collateral)
    fn pair_reserves(
        &self,
        market: &MarketConfig,
        block: BlockHeight,
    ) -> impl Future<Output = Result<(u128, u128), ProtocolError>> + Send;

    fn next_expiry_block_after(
        &self,
        series: &Address,
        min_blocks: u64,
        block: BlockHeight,
    ) -> impl Future<Output = Result<BlockHeight, ProtocolError>> + Send;
}

fn map_node_error(err: NodeError, context: &str) -> ProtocolError {
    match err {
        NodeError::Unreachable { .. } | NodeError::Timeout { .. } => {
            ProtocolError::StateUnavailable {
                reason: format!("{}: {}", context, err),
            }
        }
        _ => ProtocolError::DecodeError {
            message: format!("{}: {}", context, err),
        },
    }
}

/// Order pair reserves as (claim, collateral) using the pair's token0
fn orient_reserves(
    market: &MarketConfig,
    token0: &Address,
    (reserve0, reserve1): (u128, u128),
) -> Result<(u128, u128), ProtocolError> {
    let is = |a: &Address| a.as_str().eq_ignore_ascii_case(token0.as_str());

    if is(&market.series) {
        Ok((reserve0, reserve1))
    } else if is(&market.ctoken) {
        Ok((reserve1, reserve0))
    } else {
        Err(ProtocolError::DecodeError {
            message: format!(
                "pair {} token0 {} is neither series {} nor cToken {}",
                market.pair, token0, market.series, market.ctoken
            ),
        })
    }
}

impl MarketReader for NodeClient {
    async fn block_number(&self) -> Result<BlockHeight, ProtocolError> {
        NodeClient::block_number(self)
            .await
            .map_err(|e| map_node_error(e, "Block number"))
    }

    async fn exchange_rate_current(
        &self,
        ctoken: &Address,
        block: BlockHeight,
    ) -> Result<u128, ProtocolError> {
        queries::exchange_rate_current(self, ctoken, block)
            .await
            .map_err(|e| map_node_error(e, "cToken exchange rate"))
    }

    async fn supply_rate_per_block(
        &self,
        ctoken: &Address,
        block: BlockHeight,
    ) -> Result<u128, ProtocolError> {
        queries::supply_rate_per_block(self, ctoken, block)
            .await
            .map_err(|e| map_node_error(e, "cToken supply rate"))
    }

    async fn balance_of(
        &self,
        token: &Address,
        owner: &Address,
        block: BlockHeight,
    ) -> Result<u128, ProtocolError> {
        queries::balance_of(self, token, owner, block)
            .await
            .map_err(|e| map_node_error(e, "Token balance"))
    }

    async fn min_exchange_rate(
        &self,
        series: &Address,
        block: BlockHeight,
    ) -> Result<u128, ProtocolError> {
        queries::create_price(self, series, block)
            .await
            .map_err(|e| map_node_error(e, "Series create price"))
    }

    async fn collateral_factor(
        &self,
        series: &Address,
        block: BlockHeight,
    ) -> Result<u128, ProtocolError> {
        queries::collateral_factor(self, series, block)
            .await
            .map_err(|e| map_node_error(e, "Series collateral factor"))
    }

    async fn blocks_to_expiry(
        &self,
        series: &Address,
        block: BlockHeight,
    ) -> Result<u64, ProtocolError> {
        queries::blocks_to_expiry(self, series, block)
            .await
            .map_err(|e| map_node_error(e, "Series blocks to expiry"))
    }

    async fn pair_reserves(
        &self,
        market: &MarketConfig,
        block: BlockHeight,
    ) -> Result<(u128, u128), ProtocolError> {
        let (reserves, token0) = tokio::try_join!(
            queries::get_reserves(self, &market.pair, block),
            queries::token0(self, &market.pair, block),
        )
        .map_err(|e| map_node_error(e, "AMM pair"))?;

        orient_reserves(market, &token0, reserves)
    }

    async fn next_expiry_block_after(
        &self,
        series: &Address,
        min_blocks: u64,
        block: BlockHeight,
    ) -> Result<BlockHeight, ProtocolError> {
        queries::calc_next_expiry_block_after(self, series, min_blocks, block)
            .await
            .map_err(|e| map_node_error(e, "Series next expiry"))
    }
}

async fn wallet_balance<R: MarketReader>(
    reader: &R,
    token: &Address,
    wallet: Option<&Address>,
    block: BlockHeight,
) -> Result<u128, ProtocolError> {
    match wallet {
        Some(owner) => reader.balance_of(token, owner, block).await,
        None => Ok(0),
    }
}

/// Read every pricing input for a market at one block height.
///
/// Claim tokens are balances on the series contract. Without a wallet,
/// wallet balances are zero.
pub async fn fetch_raw_snapshot<R: MarketReader>(
    reader: &R,
    market: &MarketConfig,
    wallet: Option<&Address>,
) -> Result<RawSnapshot, ProtocolError> {
    let block_height = reader.block_number().await?;

    let (
        current_exchange_rate,
        supply_rate_per_block,
        min_exchange_rate,
        collateral_factor,
        blocks_to_expiry,
        (claim_reserve, collateral_reserve),
        wallet_ctoken_balance,
        wallet_claim_balance,
    ) = tokio::try_join!(
        reader.exchange_rate_current(&market.ctoken, block_height),
        reader.supply_rate_per_block(&market.ctoken, block_height),
        reader.min_exchange_rate(&market.series, block_height),
        reader.collateral_factor(&market.series, block_height),
        reader.blocks_to_expiry(&market.series, block_height),
        reader.pair_reserves(market, block_height),
        wallet_balance(reader, &market.ctoken, wallet, block_height),
        wallet_balance(reader, &market.series, wallet, block_height),
    )?;

    tracing::debug!(
        market = %market.id,
        block_height,
        claim_reserve,
        collateral_reserve,
        current_exchange_rate,
        blocks_to_expiry,
        "Fetched market snapshot"
    );

    if claim_reserve == 0 || collateral_reserve == 0 {
        tracing::warn!(
            market = %market.id,
            block_height,
            "AMM pair has an empty reserve"
        );
    }

    Ok(RawSnapshot {
        block_height,
        claim_reserve,
        collateral_reserve,
        min_exchange_rate,
        current_exchange_rate,
        collateral_factor,
        supply_rate_per_block,
        blocks_to_expiry,
        wallet_ctoken_balance,
        wallet_claim_balance,
    })
}

/// Fetch a snapshot and price it
pub async fn fetch_market_pricing<R: MarketReader>(
    reader: &R,
    market: &MarketConfig,
    wallet: Option<&Address>,
    scales: &TokenScales,
    blocks_per_year: f64,
) -> Result<MarketPricingState, ProtocolError> {
    let raw = fetch_raw_snapshot(reader, market, wallet).await?;

    let now_unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    MarketPricingState::from_snapshot(
        market,
        wallet.cloned(),
        raw,
        scales,
        blocks_per_year,
        now_unix,
    )
    .map_err(|e| {
        tracing::warn!(market = %market.id, error = %e, "Market pricing failed");
        ProtocolError::from(e)
    })
}

/// Look up the next expiry block at least `min_blocks` ahead
pub async fn fetch_next_expiry<R: MarketReader>(
    reader: &R,
    market: &MarketConfig,
    min_blocks: u64,
) -> Result<NextExpiry, ProtocolError> {
    let block_height = reader.block_number().await?;
    let expiry_block = reader
        .next_expiry_block_after(&market.series, min_blocks, block_height)
        .await?;

    Ok(NextExpiry {
        block_height,
        min_blocks,
        expiry_block,
        blocks_away: expiry_block.saturating_sub(block_height),
    })
}
