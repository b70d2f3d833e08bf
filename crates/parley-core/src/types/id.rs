//! Typed identifiers for users and messages.
//!
//! Identifiers are 12-byte values rendered as 24 lowercase hexadecimal
//! characters: a 4-byte big-endian Unix timestamp, 5 random bytes, and a
//! 3-byte big-endian counter. Using distinct newtypes prevents passing a
//! `MessageId` where a `UserId` is expected. When the `sqlx` feature is
//! enabled, each ID type is stored as PostgreSQL `TEXT`.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of an identifier in bytes.
pub const ID_LEN: usize = 12;

/// Error returned when a string is not a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier '{0}': expected 24 hexadecimal characters")]
pub struct ParseIdError(pub String);

static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
static PROCESS_RANDOM: OnceLock<[u8; 5]> = OnceLock::new();

/// Produce fresh identifier bytes.
fn generate() -> [u8; ID_LEN] {
    let seconds = chrono::Utc::now().timestamp() as u32;
    let random = PROCESS_RANDOM.get_or_init(|| {
        let seed = uuid::Uuid::new_v4();
        let mut bytes = [0u8; 5];
        bytes.copy_from_slice(&seed.as_bytes()[..5]);
        bytes
    });
    let counter = COUNTER
        .get_or_init(|| {
            let seed = uuid::Uuid::new_v4();
            let b = seed.as_bytes();
            AtomicU32::new(u32::from_be_bytes([0, b[5], b[6], b[7]]))
        })
        .fetch_add(1, Ordering::Relaxed)
        & 0x00ff_ffff;

    let mut out = [0u8; ID_LEN];
    out[..4].copy_from_slice(&seconds.to_be_bytes());
    out[4..9].copy_from_slice(random);
    out[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
    out
}

fn parse(s: &str) -> Result<[u8; ID_LEN], ParseIdError> {
    let trimmed = s.trim();
    if trimmed.len() != ID_LEN * 2 {
        return Err(ParseIdError(s.to_string()));
    }
    let mut out = [0u8; ID_LEN];
    hex::decode_to_slice(trimmed, &mut out).map_err(|_| ParseIdError(s.to_string()))?;
    Ok(out)
}

/// Macro to define a newtype ID wrapper around 12 raw bytes.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; ID_LEN]);

        impl $name {
            /// Create a new unique identifier.
            pub fn new() -> Self {
                Self(generate())
            }

            /// Return the raw bytes.
            pub fn as_bytes(&self) -> &[u8; ID_LEN] {
                &self.0
            }

            /// Seconds since the Unix epoch embedded in the identifier.
            pub fn timestamp(&self) -> u32 {
                u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }

        #[cfg(feature = "sqlx")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "sqlx")]
        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.to_string(), buf)
            }
        }

        #[cfg(feature = "sqlx")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(raw.parse::<Self>()?)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user account.
    UserId
);

define_id!(
    /// Unique identifier for a persisted message.
    MessageId
);
