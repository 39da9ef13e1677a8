pub const INSTRUMENT_TYPE_EQUITY: &str = "EQUITY";
pub const INSTRUMENT_TYPE_OPTION: &str = "OPTION";
