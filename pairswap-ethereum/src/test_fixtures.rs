//! Shared test fixtures for pairswap-ethereum tests.
//!
//! [`FakeChain`] is an in-memory stand-in for a node with a single token / wrapped-native pair,
//! its router, factory and a price aggregator. It records every interaction so tests can assert
//! on the order of reads, approvals and swaps.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use alloy::{
    primitives::{aliases::U112, Address, Bytes, TxHash, B256, I256, U256},
    sol_types::{Revert, SolCall, SolError, SolEvent},
};
use async_trait::async_trait;
use pairswap_common::{
    errors::ChainError,
    models::{Log, ReceiptStatus, TransactionReceipt, TransactionRequest},
    planner::unix_now,
    traits::ChainClient,
};

use crate::{
    abi::{
        AggregatorV3Interface, IUniswapV2Factory, IUniswapV2Pair, IUniswapV2Router02, IERC20,
        IWETH,
    },
    config::DexConfig,
};

pub const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

/// How the router reacts to the next swaps.
#[derive(Clone, Debug)]
pub enum SwapBehaviour {
    /// Executes and emits the configured output amount.
    Success,
    /// Reverts with the given raw output.
    Revert(Option<Bytes>),
}

impl SwapBehaviour {
    pub fn revert_with(message: &str) -> Self {
        Self::Revert(Some(Bytes::from(Revert { reason: message.to_string() }.abi_encode())))
    }
}

#[derive(Debug)]
pub struct FakeState {
    pub decimals: HashMap<Address, u8>,
    pub total_supply: U256,
    pub balance: U256,
    pub allowances: HashMap<Address, U256>,
    pub reserves: (u128, u128),
    /// Last element returned by `getAmountsOut`.
    pub quoted_out: U256,
    /// Amount reported in the logs of a successful swap.
    pub realised_out: U256,
    pub swap_behaviour: SwapBehaviour,
    pub approve_reverts: bool,
    /// Allowance left after an approval is mined, simulating a concurrent spender.
    pub allowance_after_approval: Option<U256>,
    pub oracle_answer: I256,
    pub oracle_decimals: u8,
    pub oracle_updated_at: u64,
    pub unreachable: bool,
    pub confirmation_delay: Duration,
    /// Every interaction in order, e.g. `call:allowance`, `send:approve`, `wait`.
    pub events: Vec<String>,
    pub sent: Vec<TransactionRequest>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    nonce: u64,
}

#[derive(Clone, Debug)]
pub struct FakeChain {
    pub owner: Address,
    pub token: Address,
    pub weth: Address,
    pub pair: Address,
    pub factory: Address,
    pub router: Address,
    pub aggregator: Address,
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeChain {
    fn default() -> Self {
        let weth = Address::repeat_byte(0x11);
        let token = Address::repeat_byte(0x22);
        let state = FakeState {
            decimals: HashMap::from([(weth, 18), (token, 18)]),
            total_supply: U256::from(300_000_000u128 * ONE_ETHER),
            balance: U256::from(1_000u128 * ONE_ETHER),
            allowances: HashMap::new(),
            // (weth, token) since weth sorts first
            reserves: (5_000 * ONE_ETHER, 50_000 * ONE_ETHER),
            quoted_out: U256::from(2 * ONE_ETHER),
            realised_out: U256::from(2 * ONE_ETHER),
            swap_behaviour: SwapBehaviour::Success,
            approve_reverts: false,
            allowance_after_approval: None,
            oracle_answer: I256::try_from(3_000_00000000i64).unwrap(),
            oracle_decimals: 8,
            oracle_updated_at: unix_now(),
            unreachable: false,
            confirmation_delay: Duration::ZERO,
            events: Vec::new(),
            sent: Vec::new(),
            receipts: HashMap::new(),
            nonce: 0,
        };
        Self {
            owner: Address::repeat_byte(0xaa),
            token,
            weth,
            pair: Address::repeat_byte(0x33),
            factory: Address::repeat_byte(0x44),
            router: Address::repeat_byte(0x55),
            aggregator: Address::repeat_byte(0x66),
            state: Arc::new(Mutex::new(state)),
        }
    }
}

impl FakeChain {
    pub fn client(&self) -> Arc<dyn ChainClient> {
        Arc::new(self.clone())
    }

    pub fn dex_config(&self) -> DexConfig {
        DexConfig::new(self.router, self.factory, self.weth)
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn set_reserves(&self, weth_reserve: u128, token_reserve: u128) {
        self.state().reserves = (weth_reserve, token_reserve);
    }

    pub fn set_allowance(&self, value: u128) {
        let router = self.router;
        self.state()
            .allowances
            .insert(router, U256::from(value));
    }

    pub fn events(&self) -> Vec<String> {
        self.state().events.clone()
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.state().sent.clone()
    }

    /// Index of the `nth` occurrence of an event, panicking if absent.
    pub fn position(&self, event: &str, nth: usize) -> usize {
        self.events()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.as_str() == event)
            .nth(nth)
            .map(|(i, _)| i)
            .unwrap_or_else(|| panic!("event {event} #{nth} not recorded"))
    }

    pub fn count(&self, event: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.as_str() == event)
            .count()
    }

    fn token0(&self) -> Address {
        self.token.min(self.weth)
    }

    fn handle_call(&self, to: Address, data: &[u8]) -> Result<(String, Vec<u8>), ChainError> {
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ChainError::Rejected("missing selector".into()))?;
        let state = self.state();

        let result = if to == self.factory && selector == IUniswapV2Factory::getPairCall::SELECTOR {
            let call = IUniswapV2Factory::getPairCall::abi_decode(data).unwrap();
            let known = [self.token, self.weth];
            let pair = if known.contains(&call.tokenA) &&
                known.contains(&call.tokenB) &&
                call.tokenA != call.tokenB
            {
                self.pair
            } else {
                Address::ZERO
            };
            ("getPair", IUniswapV2Factory::getPairCall::abi_encode_returns(&pair))
        } else if to == self.pair && selector == IUniswapV2Pair::token0Call::SELECTOR {
            ("token0", IUniswapV2Pair::token0Call::abi_encode_returns(&self.token0()))
        } else if to == self.pair && selector == IUniswapV2Pair::getReservesCall::SELECTOR {
            let (weth_reserve, token_reserve) = state.reserves;
            let (reserve0, reserve1) = if self.token0() == self.weth {
                (weth_reserve, token_reserve)
            } else {
                (token_reserve, weth_reserve)
            };
            let ret = IUniswapV2Pair::getReservesReturn {
                reserve0: U112::from(reserve0),
                reserve1: U112::from(reserve1),
                blockTimestampLast: 0,
            };
            ("getReserves", IUniswapV2Pair::getReservesCall::abi_encode_returns(&ret))
        } else if to == self.aggregator && selector == AggregatorV3Interface::decimalsCall::SELECTOR
        {
            (
                "oracle:decimals",
                AggregatorV3Interface::decimalsCall::abi_encode_returns(&state.oracle_decimals),
            )
        } else if to == self.aggregator &&
            selector == AggregatorV3Interface::latestRoundDataCall::SELECTOR
        {
            let ret = AggregatorV3Interface::latestRoundDataReturn {
                roundId: Default::default(),
                answer: state.oracle_answer,
                startedAt: U256::from(state.oracle_updated_at),
                updatedAt: U256::from(state.oracle_updated_at),
                answeredInRound: Default::default(),
            };
            (
                "latestRoundData",
                AggregatorV3Interface::latestRoundDataCall::abi_encode_returns(&ret),
            )
        } else if selector == IERC20::decimalsCall::SELECTOR && state.decimals.contains_key(&to) {
            ("decimals", IERC20::decimalsCall::abi_encode_returns(&state.decimals[&to]))
        } else if to == self.token && selector == IERC20::totalSupplyCall::SELECTOR {
            ("totalSupply", IERC20::totalSupplyCall::abi_encode_returns(&state.total_supply))
        } else if to == self.token && selector == IERC20::balanceOfCall::SELECTOR {
            let call = IERC20::balanceOfCall::abi_decode(data).unwrap();
            let balance = if call.owner == self.owner { state.balance } else { U256::ZERO };
            ("balanceOf", IERC20::balanceOfCall::abi_encode_returns(&balance))
        } else if to == self.token && selector == IERC20::allowanceCall::SELECTOR {
            let call = IERC20::allowanceCall::abi_decode(data).unwrap();
            let allowance = if call.owner == self.owner {
                state
                    .allowances
                    .get(&call.spender)
                    .copied()
                    .unwrap_or_default()
            } else {
                U256::ZERO
            };
            ("allowance", IERC20::allowanceCall::abi_encode_returns(&allowance))
        } else if to == self.router && selector == IUniswapV2Router02::getAmountsOutCall::SELECTOR
        {
            let call = IUniswapV2Router02::getAmountsOutCall::abi_decode(data).unwrap();
            let amounts = vec![call.amountIn, state.quoted_out];
            ("getAmountsOut", IUniswapV2Router02::getAmountsOutCall::abi_encode_returns(&amounts))
        } else {
            return Err(ChainError::Rejected(format!("execution reverted: call to {to}")));
        };
        Ok((result.0.to_string(), result.1))
    }

    fn handle_send(&self, tx: &TransactionRequest) -> Result<(String, TransactionReceipt), ChainError> {
        let selector: [u8; 4] = tx
            .data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ChainError::Rejected("missing selector".into()))?;
        let mut state = self.state();
        state.nonce += 1;
        let tx_hash = B256::from(U256::from(state.nonce));
        let mut receipt = TransactionReceipt {
            tx_hash,
            block_number: 100 + state.nonce,
            status: ReceiptStatus::Success,
            logs: vec![],
            revert_data: None,
        };

        let name = if tx.to == self.token && selector == IERC20::approveCall::SELECTOR {
            let call = IERC20::approveCall::abi_decode(&tx.data).unwrap();
            if state.approve_reverts {
                receipt.status = ReceiptStatus::Reverted;
            } else {
                let allowance = state
                    .allowance_after_approval
                    .unwrap_or(call.value);
                state
                    .allowances
                    .insert(call.spender, allowance);
            }
            "approve"
        } else if tx.to == self.router &&
            selector ==
                IUniswapV2Router02::swapExactTokensForETHSupportingFeeOnTransferTokensCall::SELECTOR
        {
            let call = IUniswapV2Router02::swapExactTokensForETHSupportingFeeOnTransferTokensCall::abi_decode(&tx.data)
                .unwrap();
            match state.swap_behaviour.clone() {
                SwapBehaviour::Success => {
                    let allowance = state
                        .allowances
                        .entry(self.router)
                        .or_default();
                    *allowance = allowance.saturating_sub(call.amountIn);
                    state.balance = state.balance.saturating_sub(call.amountIn);
                    receipt.logs = vec![
                        erc20_transfer(self.token, self.owner, self.pair, call.amountIn),
                        erc20_transfer(self.weth, self.pair, self.router, state.realised_out),
                        Log {
                            address: self.weth,
                            topics: vec![IWETH::Withdrawal::SIGNATURE_HASH, self.router.into_word()],
                            data: Bytes::from(state.realised_out.to_be_bytes::<32>().to_vec()),
                        },
                    ];
                }
                SwapBehaviour::Revert(data) => {
                    receipt.status = ReceiptStatus::Reverted;
                    receipt.revert_data = data;
                }
            }
            "swapExactTokensForETH"
        } else if tx.to == self.router &&
            selector ==
                IUniswapV2Router02::swapExactETHForTokensSupportingFeeOnTransferTokensCall::SELECTOR
        {
            let call = IUniswapV2Router02::swapExactETHForTokensSupportingFeeOnTransferTokensCall::abi_decode(&tx.data)
                .unwrap();
            match state.swap_behaviour.clone() {
                SwapBehaviour::Success => {
                    let bought = call.path.last().copied().unwrap();
                    receipt.logs = vec![erc20_transfer(
                        bought,
                        self.pair,
                        call.to,
                        state.realised_out,
                    )];
                }
                SwapBehaviour::Revert(data) => {
                    receipt.status = ReceiptStatus::Reverted;
                    receipt.revert_data = data;
                }
            }
            "swapExactETHForTokens"
        } else {
            return Err(ChainError::Rejected(format!("unexpected transaction to {}", tx.to)));
        };

        state.sent.push(tx.clone());
        state
            .receipts
            .insert(tx_hash, receipt.clone());
        Ok((name.to_string(), receipt))
    }
}

pub fn erc20_transfer(token: Address, from: Address, to: Address, value: U256) -> Log {
    Log {
        address: token,
        topics: vec![IERC20::Transfer::SIGNATURE_HASH, from.into_word(), to.into_word()],
        data: Bytes::from(value.to_be_bytes::<32>().to_vec()),
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        if self.state().unreachable {
            return Err(ChainError::Transport("connection refused".into()));
        }
        let result = self.handle_call(to, &data);
        let name = match &result {
            Ok((name, _)) => name.clone(),
            Err(_) => "unknown".to_string(),
        };
        self.state()
            .events
            .push(format!("call:{name}"));
        result.map(|(_, output)| Bytes::from(output))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ChainError> {
        if self.state().unreachable {
            return Err(ChainError::Transport("connection refused".into()));
        }
        let (name, receipt) = self.handle_send(&tx)?;
        self.state()
            .events
            .push(format!("send:{name}"));
        Ok(receipt.tx_hash)
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        _confirmations: u64,
    ) -> Result<TransactionReceipt, ChainError> {
        let delay = {
            let mut state = self.state();
            state.events.push("wait".to_string());
            state.confirmation_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.state()
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| ChainError::Unknown(format!("unknown transaction {tx_hash}")))
    }

    async fn signer_address(&self) -> Result<Address, ChainError> {
        self.state()
            .events
            .push("signer".to_string());
        Ok(self.owner)
    }
}
