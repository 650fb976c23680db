use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Math error - overflow")]
    Overflow,
    #[error("Math error - underflow")]
    Underflow,
    #[error("Math error - out of bounds")]
    OutOfBounds,
    #[error("Math error - division by zero")]
    DivisionByZero,
    #[error("BitMath error - zero input value")]
    ZeroValue,
    #[error("Math error - compound rate outside of [0, 1) for sqrt approximation")]
    SqrtCompoundDomain,
    #[error("Math error - compound divide operands out of range")]
    CompoundDivideBounds,
    #[error("Math error - liquidity inflator reached 1.0")]
    InflatorOverflow,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("State error - sqrtPrice out of bounds")]
    SqrtPriceOutOfBounds,

    #[error("State error - tick out of bounds")]
    TickOutOfBounds,

    #[error("State error - liquidity is 0")]
    LiquidityIsZero,

    #[error("State error - liquidity is not a whole multiple of the lot size")]
    LotsNotAligned,
    #[error("State error - level holds fewer lots than requested")]
    InsufficientLots,

    #[error("State error - knockout tranche range differs from the active pivot")]
    KnockoutRangeMismatch,
    #[error("State error - knockout order must sit entirely on one side of the curve")]
    KnockoutPosition,
    #[error("State error - knockout flag set without an active pivot")]
    MissingPivot,

    #[error("State error - curve price is neither at the limit nor out of quantity")]
    PriceNotStable,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SwapError {
    #[error("Swap error - amount specified is 0")]
    AmountSpecifiedIsZero,
    #[error("Swap error - limit price is behind the curve price")]
    LimitPriceBehindCurve,
    #[error("Swap error - remaining quantity cannot cover the tick bump burn")]
    ShaveBurnDown,
    #[error("Swap error - no active liquidity left to fill the remaining quantity")]
    InsufficientLiquidity,
    #[error("Swap error - pool is not known to the snapshot provider")]
    UnknownPool,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Config error - tick size must be positive")]
    ZeroTickSize,
    #[error("Config error - range [{0}, {1}) is empty or outside the tick domain")]
    InvalidRange(i32, i32),
    #[error("Config error - tick {0} is not a multiple of the tick size {1}")]
    MisalignedTick(i32, u16),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] crate::error::MathError),

    #[error(transparent)]
    StateError(#[from] crate::error::StateError),

    #[error(transparent)]
    SwapError(#[from] crate::error::SwapError),

    #[error(transparent)]
    ConfigError(#[from] crate::error::ConfigError),
}

/// Stable, caller-facing classification of a failed simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The pool cannot fill any of the remaining quantity.
    NoRoute,
    /// The request itself is malformed (zero quantity, limit behind the curve).
    InvalidRequest,
    UnknownPool,
    /// An arithmetic or state precondition of the pool was violated.
    PreconditionViolated,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NoRoute => "NO_ROUTE",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::UnknownPool => "UNKNOWN_POOL",
            ErrorCode::PreconditionViolated => "PRECONDITION_VIOLATED",
        }
    }
}

impl From<&Error> for ErrorCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::SwapError(SwapError::InsufficientLiquidity) => ErrorCode::NoRoute,
            Error::SwapError(SwapError::UnknownPool) => ErrorCode::UnknownPool,
            Error::SwapError(SwapError::AmountSpecifiedIsZero)
            | Error::SwapError(SwapError::LimitPriceBehindCurve)
            | Error::ConfigError(_) => ErrorCode::InvalidRequest,
            Error::SwapError(SwapError::ShaveBurnDown)
            | Error::MathError(_)
            | Error::StateError(_) => ErrorCode::PreconditionViolated,
        }
    }
}

/// Error returned from the public simulation entry point.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("simulation failed [{}]: {source}", .code.as_str())]
pub struct SimulationError {
    pub code: ErrorCode,
    #[source]
    pub source: Error,
}

impl From<Error> for SimulationError {
    fn from(source: Error) -> Self {
        Self {
            code: ErrorCode::from(&source),
            source,
        }
    }
}
