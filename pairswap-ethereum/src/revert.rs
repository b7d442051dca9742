use alloy::sol_types::decode_revert_reason;
use pairswap_common::{
    display::opt,
    errors::{RevertKind, RevertReason, SwapError},
    Bytes, TxHash,
};
use tracing::warn;

/// Decodes raw revert output into a classified reason.
///
/// Returns `None` if no output was recovered or it is neither an `Error(string)`, a `Panic`
/// nor plain text.
pub fn decode_revert(data: Option<&Bytes>) -> Option<RevertReason> {
    let data = data.filter(|d| !d.is_empty())?;
    decode_revert_reason(data).map(RevertReason::from_message)
}

/// Maps a mined swap revert onto the user facing error.
pub(crate) fn swap_reverted(tx_hash: TxHash, deadline: u64, data: Option<&Bytes>) -> SwapError {
    let reason = decode_revert(data);
    warn!(%tx_hash, reason = opt(&reason), "Swap transaction reverted");
    match reason {
        Some(RevertReason { kind: RevertKind::Expired, .. }) => {
            SwapError::Expired { deadline, tx_hash: Some(tx_hash) }
        }
        reason => SwapError::SwapReverted { tx_hash, reason },
    }
}
