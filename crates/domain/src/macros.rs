//! Macro for implementing Display and FromStr for wire-name enums
//!
//! Several small enums travel as lowercase strings: on the wire, in the
//! config document, or as CLI arguments. This macro keeps the mapping in one
//! place and handles case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use agentcore_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Stage {
//!     Staging,
//!     Production,
//! }
//!
//! impl_wire_name_conversions!(Stage {
//!     Staging => "staging",
//!     Production => "production",
//! });
//! ```

/// Implements Display and FromStr traits for wire-name enums
///
/// This macro generates:
/// - Display trait: converts enum variants to their lowercase wire name
/// - FromStr trait: parses case-insensitive strings to enum variants
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
