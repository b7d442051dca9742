//! Quote, approve and swap against the router.
//!
//! A swap moves through `planned -> approval_checked -> [approving ->] submitted -> confirmed |
//! reverted`; each transition is logged with a `state` field. Swaps for the same owner and token
//! are serialised so that one swap's allowance cannot be consumed by another between the
//! approval and the submission.

use std::{collections::HashMap, sync::Arc, time::Duration};

use alloy::{
    primitives::{Address, TxHash, U256},
    sol_types::SolCall,
};
use pairswap_common::{
    display::opt,
    errors::SwapError,
    models::{Amount, SwapDirection, SwapOutcome, SwapPlan, SwapRequest, TransactionRequest},
    planner::{unix_now, validate_slippage, SwapPlanner},
    traits::ChainClient,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::{
    abi::{read, received_amount, withdrawn_amount, IUniswapV2Router02, IERC20},
    config::DexConfig,
    parse_address,
    revert::{decode_revert, swap_reverted},
    BigUintCodec,
};

type PairLocks = HashMap<(Address, Address), Arc<Mutex<()>>>;

/// Executes swaps between a token and the base asset through the configured router.
pub struct SwapExecutor {
    client: Arc<dyn ChainClient>,
    config: DexConfig,
    planner: SwapPlanner,
    locks: Mutex<PairLocks>,
}

impl SwapExecutor {
    pub fn new(client: Arc<dyn ChainClient>, config: DexConfig) -> Self {
        Self {
            planner: SwapPlanner::new(config.deadline_window()),
            client,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &DexConfig {
        &self.config
    }

    /// Quotes the swap and computes its bounds without sending anything.
    #[instrument(skip(self, request), fields(direction = %request.direction, token = %request.token_address))]
    pub async fn preview(&self, request: &SwapRequest) -> Result<SwapPlan, SwapError> {
        let token = self.validate(request)?;
        self.plan(request, token).await
    }

    /// Submits the swap and waits for it to be mined.
    pub async fn execute(&self, request: SwapRequest) -> Result<SwapOutcome, SwapError> {
        self.submit(request)
            .await?
            .confirm()
            .await
    }

    /// Runs every step up to and including broadcasting the swap transaction.
    ///
    /// For sells the router's allowance is checked and, if short, an approval for exactly
    /// `amount_in` is sent and confirmed first. The returned [`PendingSwap`] holds the
    /// owner/token lock until it is confirmed or dropped.
    #[instrument(skip(self, request), fields(direction = %request.direction, token = %request.token_address))]
    pub async fn submit(&self, request: SwapRequest) -> Result<PendingSwap, SwapError> {
        let token = self.validate(&request)?;
        let owner = self.client.signer_address().await?;
        let guard = self.lock(owner, token).await;

        let plan = self.plan(&request, token).await?;
        debug!(state = "planned", min_out = %plan.min_out, deadline = plan.deadline);
        let amount_in = U256::from_biguint(plan.amount_in.value())?;

        let approval_tx_hash = match request.direction {
            SwapDirection::Sell => {
                self.check_balance(token, owner, amount_in)
                    .await?;
                self.ensure_allowance(token, owner, amount_in)
                    .await?
            }
            SwapDirection::Buy => None,
        };
        debug!(state = "approval_checked", approval = ?approval_tx_hash);

        let now = unix_now();
        if plan.is_expired_at(now) {
            warn!(deadline = plan.deadline, now, "Deadline passed before submission");
            return Err(SwapError::Expired { deadline: plan.deadline, tx_hash: None });
        }

        let min_out = U256::from_biguint(plan.min_out.value())?;
        let deadline = U256::from(plan.deadline);
        let router = self.config.router;
        let tx = match request.direction {
            SwapDirection::Sell => TransactionRequest::new(
                router,
                IUniswapV2Router02::swapExactTokensForETHSupportingFeeOnTransferTokensCall {
                    amountIn: amount_in,
                    amountOutMin: min_out,
                    path: plan.path.clone(),
                    to: owner,
                    deadline,
                }
                .abi_encode(),
            ),
            SwapDirection::Buy => TransactionRequest::new(
                router,
                IUniswapV2Router02::swapExactETHForTokensSupportingFeeOnTransferTokensCall {
                    amountOutMin: min_out,
                    path: plan.path.clone(),
                    to: owner,
                    deadline,
                }
                .abi_encode(),
            )
            .with_value(amount_in),
        };

        let tx_hash = self.client.send_transaction(tx).await?;
        info!(
            state = "submitted",
            %tx_hash,
            amount_in = %plan.amount_in,
            min_out = %plan.min_out,
            "Submitted swap"
        );

        Ok(PendingSwap {
            client: self.client.clone(),
            tx_hash,
            approval_tx_hash,
            plan,
            direction: request.direction,
            token,
            owner,
            router,
            wrapped_native: self.config.wrapped_native,
            confirmations: self.config.confirmations,
            _guard: guard,
        })
    }

    fn validate(&self, request: &SwapRequest) -> Result<Address, SwapError> {
        validate_slippage(request.slippage_bps)?;
        if request.amount_in.is_zero() {
            return Err(SwapError::InvalidAmount("amount_in must be positive".to_string()));
        }
        let token = parse_address(&request.token_address)?;
        if token == self.config.wrapped_native {
            return Err(SwapError::InvalidAddress(format!(
                "{token} is the wrapped base asset, not a tradable token"
            )));
        }
        Ok(token)
    }

    fn path(&self, direction: SwapDirection, token: Address) -> Vec<Address> {
        match direction {
            SwapDirection::Sell => vec![token, self.config.wrapped_native],
            SwapDirection::Buy => vec![self.config.wrapped_native, token],
        }
    }

    async fn plan(&self, request: &SwapRequest, token: Address) -> Result<SwapPlan, SwapError> {
        let client = self.client.as_ref();
        let token_decimals = read(client, token, IERC20::decimalsCall {}).await?;
        let native_decimals = self.config.native_decimals;
        let (in_decimals, out_decimals) = match request.direction {
            SwapDirection::Sell => (token_decimals, native_decimals),
            SwapDirection::Buy => (native_decimals, token_decimals),
        };
        if request.amount_in.decimals() != in_decimals {
            return Err(SwapError::InvalidAmount(format!(
                "amount_in has {} decimals, {in_decimals} expected",
                request.amount_in.decimals()
            )));
        }

        let path = self.path(request.direction, token);
        let amounts = read(
            client,
            self.config.router,
            IUniswapV2Router02::getAmountsOutCall {
                amountIn: U256::from_biguint(request.amount_in.value())?,
                path: path.clone(),
            },
        )
        .await?;
        let quoted = amounts
            .last()
            .copied()
            .ok_or_else(|| SwapError::Decode("getAmountsOut returned no amounts".to_string()))?;
        if quoted.is_zero() {
            return Err(SwapError::InvalidAmount(format!(
                "{} is too small to produce any output",
                request.amount_in
            )));
        }

        self.planner.plan(
            request.amount_in.clone(),
            Amount::new(quoted.to_biguint(), out_decimals),
            request.slippage_bps,
            path,
        )
    }

    async fn check_balance(
        &self,
        token: Address,
        owner: Address,
        amount_in: U256,
    ) -> Result<(), SwapError> {
        let balance = read(self.client.as_ref(), token, IERC20::balanceOfCall { owner }).await?;
        if balance < amount_in {
            return Err(SwapError::InsufficientBalance {
                balance: balance.to_biguint(),
                required: amount_in.to_biguint(),
            });
        }
        Ok(())
    }

    async fn read_allowance(&self, token: Address, owner: Address) -> Result<U256, SwapError> {
        read(
            self.client.as_ref(),
            token,
            IERC20::allowanceCall { owner, spender: self.config.router },
        )
        .await
    }

    /// Approves the router for exactly `amount_in` if the current allowance is short.
    ///
    /// Returns the approval hash if one was sent.
    async fn ensure_allowance(
        &self,
        token: Address,
        owner: Address,
        amount_in: U256,
    ) -> Result<Option<TxHash>, SwapError> {
        let allowance = self.read_allowance(token, owner).await?;
        if allowance >= amount_in {
            debug!(%allowance, "Allowance sufficient");
            return Ok(None);
        }

        let spender = self.config.router;
        let data = IERC20::approveCall { spender, value: amount_in }.abi_encode();
        let approval_hash = self
            .client
            .send_transaction(TransactionRequest::new(token, data))
            .await?;
        info!(state = "approving", tx_hash = %approval_hash, %allowance, required = %amount_in, "Submitted approval");

        let receipt = self
            .client
            .wait_for_confirmation(approval_hash, self.config.confirmations)
            .await?;
        if !receipt.is_success() {
            let reason = decode_revert(receipt.revert_data.as_ref());
            warn!(tx_hash = %approval_hash, reason = opt(&reason), "Approval reverted");
            return Err(SwapError::ApprovalReverted { tx_hash: approval_hash, reason });
        }

        let allowance = self.read_allowance(token, owner).await?;
        if allowance < amount_in {
            warn!(%allowance, required = %amount_in, "Allowance still short after approval");
            return Err(SwapError::InsufficientAllowance {
                allowance: allowance.to_biguint(),
                required: amount_in.to_biguint(),
            });
        }
        info!(tx_hash = %approval_hash, "Approval confirmed");
        Ok(Some(approval_hash))
    }

    async fn lock(&self, owner: Address, token: Address) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry((owner, token))
                .or_default()
                .clone()
        };
        lock.lock_owned().await
    }
}

/// A broadcast swap that has not been confirmed yet.
///
/// The transaction is in the network: dropping this value or giving up on
/// [`confirm_with_timeout`](Self::confirm_with_timeout) only stops waiting, it never withdraws
/// the transaction. Holding it keeps other swaps of the same owner and token waiting.
pub struct PendingSwap {
    client: Arc<dyn ChainClient>,
    tx_hash: TxHash,
    approval_tx_hash: Option<TxHash>,
    plan: SwapPlan,
    direction: SwapDirection,
    token: Address,
    owner: Address,
    router: Address,
    wrapped_native: Address,
    confirmations: u64,
    _guard: OwnedMutexGuard<()>,
}

impl PendingSwap {
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn approval_tx_hash(&self) -> Option<TxHash> {
        self.approval_tx_hash
    }

    pub fn plan(&self) -> &SwapPlan {
        &self.plan
    }

    /// Waits for the swap to be mined.
    ///
    /// A revert is returned as an error: `Expired` for a deadline revert and `SwapReverted`
    /// otherwise, both carrying the transaction hash.
    #[instrument(skip(self), fields(tx_hash = %self.tx_hash, direction = %self.direction))]
    pub async fn confirm(self) -> Result<SwapOutcome, SwapError> {
        let receipt = self
            .client
            .wait_for_confirmation(self.tx_hash, self.confirmations)
            .await?;
        if !receipt.is_success() {
            return Err(swap_reverted(self.tx_hash, self.plan.deadline, receipt.revert_data.as_ref()));
        }

        let received = match self.direction {
            SwapDirection::Buy => received_amount(&receipt.logs, self.token, self.owner),
            SwapDirection::Sell => withdrawn_amount(&receipt.logs, self.wrapped_native, self.router),
        };
        let confirmed_amount_out =
            received.map(|value| Amount::new(value.to_biguint(), self.plan.expected_out.decimals()));
        info!(
            state = "confirmed",
            block = receipt.block_number,
            amount_out = opt(&confirmed_amount_out),
            "Swap confirmed"
        );
        Ok(SwapOutcome::confirmed(self.tx_hash, confirmed_amount_out, self.approval_tx_hash))
    }

    /// Like [`confirm`](Self::confirm), but reports the swap as still `Submitted` if it is not
    /// mined within `timeout`.
    pub async fn confirm_with_timeout(self, timeout: Duration) -> Result<SwapOutcome, SwapError> {
        let tx_hash = self.tx_hash;
        let approval_tx_hash = self.approval_tx_hash;
        match tokio::time::timeout(timeout, self.confirm()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%tx_hash, ?timeout, "Swap not confirmed in time, transaction stays in flight");
                Ok(SwapOutcome::submitted(tx_hash, approval_tx_hash))
            }
        }
    }
}
