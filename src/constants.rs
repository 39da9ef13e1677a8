/// Decimal precision for ledger calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Contract multiplier for standard option contracts
pub const OPTION_CONTRACT_MULTIPLIER: i32 = 100;

/// Contract multiplier for equities and anything else
pub const DEFAULT_CONTRACT_MULTIPLIER: i32 = 1;

/// How far back the price resolver will walk for a "most recent" quote
pub const MAX_PRICE_LOOKBACK_DAYS: i64 = 30;

/// Minutes past the exchange close before a session's data is trusted
pub const MARKET_CLOSE_BUFFER_MINUTES: i64 = 30;

/// Quote rows written per insert batch
pub const QUOTE_INSERT_CHUNK_SIZE: usize = 1000;
