//! Contract ABIs and conversions between fixrate and web3 types

use fixrate_core::{Address, BlockHeight, NodeError};
use web3::types::{BlockId, BlockNumber, H160, U256, U64};

use crate::Result;

const ERC20_ABI: &[u8] = include_bytes!("../abi/erc20.json");
const CTOKEN_ABI: &[u8] = include_bytes!("../abi/ctoken.json");
const SERIES_ABI: &[u8] = include_bytes!("../abi/series.json");
const PAIR_ABI: &[u8] = include_bytes!("../abi/pair.json");

/// Contract interfaces read by fixrate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abi {
    /// Token balances (cToken and claim series)
    Erc20,
    /// Money-market cToken
    CToken,
    /// Claim token series
    Series,
    /// AMM pair trading claims against the cToken
    Pair,
}

impl Abi {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Erc20 => "ERC-20",
            Self::CToken => "cToken",
            Self::Series => "series",
            Self::Pair => "pair",
        }
    }

    pub fn json(&self) -> &'static [u8] {
        match self {
            Self::Erc20 => ERC20_ABI,
            Self::CToken => CTOKEN_ABI,
            Self::Series => SERIES_ABI,
            Self::Pair => PAIR_ABI,
        }
    }
}

pub fn to_h160(addr: &Address) -> Result<H160> {
    addr.to_bytes()
        .map(H160::from)
        .ok_or_else(|| NodeError::ParseError(format!("malformed address {}", addr)))
}

/// Full lowercase hex, `0x`-prefixed
pub fn from_h160(addr: H160) -> Address {
    Address::new(format!("{:#x}", addr))
}

pub fn at_block(block: BlockHeight) -> BlockId {
    BlockId::Number(BlockNumber::Number(U64::from(block)))
}

pub fn to_u128(value: U256, what: &str) -> Result<u128> {
    if value.bits() > 128 {
        return Err(NodeError::ParseError(format!(
            "{} exceeds 128 bits: {}",
            what, value
        )));
    }
    Ok(value.as_u128())
}

pub fn to_u64(value: U256, what: &str) -> Result<u64> {
    if value.bits() > 64 {
        return Err(NodeError::ParseError(format!("{} out of range: {}", what, value)));
    }
    Ok(value.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use web3::ethabi;

    fn selector(abi: Abi, function: &str) -> [u8; 4] {
        let contract = ethabi::Contract::load(abi.json()).unwrap();
        contract.function(function).unwrap().short_signature()
    }

    #[test]
    fn test_abis_parse_with_known_selectors() {
        assert_eq!(selector(Abi::Erc20, "balanceOf"), [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(selector(Abi::Pair, "getReserves"), [0x09, 0x02, 0xf1, 0xac]);
        assert_eq!(selector(Abi::Pair, "token0"), [0x0d, 0xfe, 0x16, 0x81]);
        assert_eq!(selector(Abi::CToken, "exchangeRateCurrent"), [0xbd, 0x6d, 0x89, 0x4d]);
        assert_eq!(selector(Abi::CToken, "supplyRatePerBlock"), [0xae, 0x9d, 0x70, 0xb0]);
    }

    #[test]
    fn test_series_abi_functions() {
        let contract = ethabi::Contract::load(Abi::Series.json()).unwrap();
        for name in [
            "createPrice",
            "collateralFactor",
            "blocksToExpiry",
            "calcNextExpiryBlockAfter",
        ] {
            assert!(contract.function(name).is_ok(), "{}", name);
        }
        assert_eq!(
            contract.function("calcNextExpiryBlockAfter").unwrap().inputs.len(),
            1
        );
    }

    #[test]
    fn test_address_conversion() {
        let addr = Address::new("0x39AA39c021dfbaE8faC545936693aC917d5E7563");
        let h160 = to_h160(&addr).unwrap();
        assert_eq!(
            from_h160(h160).as_str(),
            "0x39aa39c021dfbae8fac545936693ac917d5e7563"
        );

        // Leading zero bytes are kept
        let low = from_h160(H160::from_low_u64_be(1));
        assert_eq!(low.as_str(), "0x0000000000000000000000000000000000000001");

        assert!(to_h160(&Address::new("0x22")).is_err());
    }

    #[test]
    fn test_at_block() {
        assert_eq!(
            at_block(14_000_000),
            BlockId::Number(BlockNumber::Number(U64::from(14_000_000u64)))
        );
    }

    #[test]
    fn test_integer_ranges() {
        assert_eq!(to_u128(U256::from(u128::MAX), "reserve").unwrap(), u128::MAX);
        assert!(to_u128(U256::from(u128::MAX) + 1, "reserve").is_err());

        assert_eq!(to_u64(U256::from(200_000u64), "blocks").unwrap(), 200_000);
        assert!(to_u64(U256::from(u64::MAX) + 1, "blocks").is_err());
    }
}
