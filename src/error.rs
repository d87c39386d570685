use thiserror::Error;

/// Validation failures raised by the tick math, position math and swap engine.
///
/// These abort the whole call. Running out of liquidity mid-trade is not an
/// error; it is reported through [`crate::engine::swap::SwapStatus::Starved`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("tick {0} is outside the supported tick range")]
    TickOutOfRange(i32),

    #[error("lower tick {lower} must be strictly below upper tick {upper}")]
    InvalidTickOrder { lower: i32, upper: i32 },

    #[error("tick spacing must be positive, got {0}")]
    InvalidTickSpacing(i32),

    #[error("tick {tick} is not a multiple of tick spacing {spacing}")]
    UnalignedTick { tick: i32, spacing: i32 },

    #[error("passive profile uses tick spacing {passive} but the jit profile uses {jit}")]
    TickSpacingMismatch { passive: i32, jit: i32 },

    #[error("{what} must be positive, got {value}")]
    NonPositivePrice { what: &'static str, value: String },

    #[error("{what} must not be negative, got {value}")]
    NegativeAmount { what: &'static str, value: String },

    #[error("fee rate must lie in [0, 1), got {0}")]
    InvalidFeeRate(String),

    #[error("token decimals must lie in [0, 255], got {0}")]
    InvalidDecimals(i64),

    #[error("precision of {requested} significant digits is below the minimum of {minimum}")]
    InsufficientPrecision { requested: u64, minimum: u64 },

    #[error("division by zero")]
    DivisionByZero,

    #[error("non-finite input {0}")]
    NonFiniteInput(String),

    #[error("sqrt price {0} lies below the lowest representable tick")]
    PriceBelowRange(String),

    #[error("{boundaries} candidate boundaries exceed the limit of {limit}")]
    CandidateGridTooLarge { boundaries: u64, limit: u64 },

    #[error("at most one of amount0 / amount1 may be positive (got {amount0} and {amount1})")]
    InvalidTradeAmounts { amount0: String, amount1: String },
}
