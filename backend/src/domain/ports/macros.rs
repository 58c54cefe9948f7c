//! Helper macro for port error enums.
//!
//! Every port failure carries a single `message` describing the cause; the
//! variant supplies the category prefix used by `Display`.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $prefix:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error("{prefix}: {message}", prefix = $prefix)]
                $variant {
                    /// Cause reported by the adapter.
                    message: String,
                },
            )*
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = concat!("Build a `", stringify!($variant), "` error.")]
                    pub fn [<$variant:snake>](message: impl Into<String>) -> Self {
                        Self::$variant { message: message.into() }
                    }
                }
            )*

            /// Cause reported by the adapter, without the category prefix.
            pub fn message(&self) -> &str {
                match self {
                    $( Self::$variant { message } => message.as_str(), )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;
