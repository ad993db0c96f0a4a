//! Shared helpers for Diesel repository implementations.
//!
//! Every port error enum generated by `define_port_error!` carries
//! `connection` and `query` constructors; the macro below stamps out the
//! pool/Diesel error mappers so each adapter file keeps only its
//! domain-specific translation logic.

use tracing::debug;

use super::pool::PoolError;

/// Extract a readable message from a Diesel error and emit debug context.
pub(crate) fn diesel_error_message(
    error: &diesel::result::Error,
    operation: &str,
) -> String {
    let message = error.to_string();
    debug!(%message, %operation, "diesel operation failed");
    message
}

/// Extract a readable message from a pool error.
pub(crate) fn pool_error_message(error: &PoolError) -> String {
    error.message().to_owned()
}

/// Generate `map_pool_error` / `map_diesel_error` functions translating
/// infrastructure failures into the given port error type.
macro_rules! impl_error_mappers {
    ($error:ty) => {
        fn map_pool_error(error: crate::outbound::persistence::pool::PoolError) -> $error {
            <$error>::connection(crate::outbound::persistence::diesel_helpers::pool_error_message(
                &error,
            ))
        }

        fn map_diesel_error(error: diesel::result::Error) -> $error {
            <$error>::query(crate::outbound::persistence::diesel_helpers::diesel_error_message(
                &error,
                stringify!($error),
            ))
        }
    };
}

pub(crate) use impl_error_mappers;
