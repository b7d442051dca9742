//! Contract bindings for the token, pair, factory, router and price aggregator contracts, plus
//! helpers to run typed read calls through a [`ChainClient`].

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::{SolCall, SolEvent},
};
use pairswap_common::{errors::SwapError, models::Log, traits::ChainClient};

sol! {
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);

        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
    }

    interface IWETH {
        event Withdrawal(address indexed src, uint256 wad);
    }

    interface IUniswapV2Factory {
        function getPair(address tokenA, address tokenB) external view returns (address pair);
    }

    interface IUniswapV2Pair {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves()
            external
            view
            returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }

    interface IUniswapV2Router02 {
        function getAmountsOut(uint256 amountIn, address[] calldata path)
            external
            view
            returns (uint256[] memory amounts);

        function swapExactETHForTokensSupportingFeeOnTransferTokens(
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external payable;

        function swapExactTokensForETHSupportingFeeOnTransferTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external;
    }

    interface AggregatorV3Interface {
        function decimals() external view returns (uint8);
        function latestRoundData()
            external
            view
            returns (
                uint80 roundId,
                int256 answer,
                uint256 startedAt,
                uint256 updatedAt,
                uint80 answeredInRound
            );
    }
}

/// Decodes the return data of `C`, naming the function on failure.
pub fn decode_returns<C: SolCall>(data: &[u8]) -> Result<C::Return, SwapError> {
    C::abi_decode_returns(data).map_err(|e| SwapError::Decode(format!("{}: {e}", C::SIGNATURE)))
}

/// Executes a read-only call and decodes its return data.
pub async fn read<C: SolCall + Send>(
    client: &dyn ChainClient,
    to: Address,
    call: C,
) -> Result<C::Return, SwapError> {
    let data = Bytes::from(call.abi_encode());
    let output = client.call(to, data).await?;
    decode_returns::<C>(&output)
}

/// Sum of all ERC20 transfers of `token` to `recipient` in the given logs.
pub fn received_amount(logs: &[Log], token: Address, recipient: Address) -> Option<U256> {
    let recipient_topic = recipient.into_word();
    sum_amounts(logs.iter().filter(|log| {
        log.address == token &&
            log.topics.len() == 3 &&
            log.topics[0] == IERC20::Transfer::SIGNATURE_HASH &&
            log.topics[2] == recipient_topic
    }))
}

/// Sum of all wrapped-native withdrawals by `src` in the given logs.
pub fn withdrawn_amount(logs: &[Log], wrapped_native: Address, src: Address) -> Option<U256> {
    let src_topic = src.into_word();
    sum_amounts(logs.iter().filter(|log| {
        log.address == wrapped_native &&
            log.topics.len() == 2 &&
            log.topics[0] == IWETH::Withdrawal::SIGNATURE_HASH &&
            log.topics[1] == src_topic
    }))
}

fn sum_amounts<'a>(logs: impl Iterator<Item = &'a Log>) -> Option<U256> {
    let mut total: Option<U256> = None;
    for log in logs {
        let amount = U256::try_from_be_slice(&log.data)?;
        total = Some(total.unwrap_or(U256::ZERO).checked_add(amount)?);
    }
    total
}
