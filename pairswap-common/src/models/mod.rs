pub mod amount;
pub mod chain;
pub mod decimal;
pub mod market;
pub mod swap;

pub use amount::Amount;
pub use chain::{Log, ReceiptStatus, TransactionReceipt, TransactionRequest};
pub use decimal::Decimal;
pub use market::{MarketStats, PriceQuote, PriceSource, ReserveSnapshot, TokenInfo};
pub use swap::{SwapDirection, SwapOutcome, SwapPlan, SwapRequest, SwapStatus};
