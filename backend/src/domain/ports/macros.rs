//! Helper macro for declaring domain port error enums.
//!
//! Every driven port declares its failures with [`define_port_error!`],
//! which expands to a `thiserror` enum plus snake_case constructor helpers
//! that accept `impl Into<FieldType>` arguments, so adapters can write
//! `Error::query(err.to_string())` instead of building struct variants by
//! hand.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $($field:ident : $ty:ty),* $(,)? } => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { $($field : $ty),* },
            )*
        }

        impl $name {
            ::paste::paste! {
                $(
                    #[doc = concat!("Construct [`", stringify!($name), "::", stringify!($variant), "`].")]
                    pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                        Self::$variant { $($field: $field.into()),* }
                    }
                )*
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Macro expansion coverage.
    use rstest::rstest;

    define_port_error! {
        /// Test-only error enum.
        pub enum DemoError {
            /// Connection failed.
            Connection { message: String } => "connection failed: {message}",
            /// Version check failed.
            Stale { expected: i32, actual: i32 } => "stale: expected {expected}, found {actual}",
        }
    }

    #[rstest]
    fn constructors_accept_into_arguments() {
        let error = DemoError::connection("refused");
        assert_eq!(error.to_string(), "connection failed: refused");
    }

    #[rstest]
    fn multi_field_variants_format_each_field() {
        let error = DemoError::stale(3, 7);
        assert_eq!(error.to_string(), "stale: expected 3, found 7");
    }
}
