/// Quote source written by the provider-facing collector
pub const DATA_SOURCE_PROVIDER: &str = "PROVIDER";

/// Quote source for manually entered prices
pub const DATA_SOURCE_MANUAL: &str = "MANUAL";
