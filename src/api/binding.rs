//! String binding for query-string enums
//!
//! Enum values bind from their variant name (any case) or their numeric
//! value. Flag sets bind from `Read, Write`, `Read|Write` or a number.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("'{value}' is not a valid {type_name}")]
    UnknownVariant {
        type_name: &'static str,
        value: String,
    },
}

/// Bind an optional value; an absent or empty value is `None`.
pub fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

macro_rules! query_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant = $value),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl FromStr for $name {
            type Err = BindingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let found = match s.parse::<i64>() {
                    Ok(number) => Self::ALL.iter().copied().find(|v| *v as i64 == number),
                    Err(_) => Self::ALL.iter().copied().find(|v| v.name().eq_ignore_ascii_case(s)),
                };
                found.ok_or_else(|| BindingError::UnknownVariant {
                    type_name: stringify!($name),
                    value: s.to_string(),
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

query_enum! {
    OrderStatus {
        Pending = 0,
        Processing = 1,
        Shipped = 2,
        Delivered = 3,
        Cancelled = 4,
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

query_enum! {
    Priority {
        Low = 1,
        Medium = 2,
        High = 3,
        Critical = 4,
    }
}

/// Flag set of access rights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Permissions(u8);

impl Permissions {
    pub const NONE: Permissions = Permissions(0);
    pub const READ: Permissions = Permissions(1);
    pub const WRITE: Permissions = Permissions(2);
    pub const DELETE: Permissions = Permissions(4);
    pub const ADMIN: Permissions = Permissions(8);

    const NAMED: &'static [(&'static str, Permissions)] = &[
        ("Read", Permissions::READ),
        ("Write", Permissions::WRITE),
        ("Delete", Permissions::DELETE),
        ("Admin", Permissions::ADMIN),
    ];

    const ALL_BITS: u8 = 0b1111;

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self::Output {
        Permissions(self.0 | rhs.0)
    }
}

impl FromStr for Permissions {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || BindingError::UnknownVariant {
            type_name: "Permissions",
            value: s.trim().to_string(),
        };

        if let Ok(bits) = s.trim().parse::<u8>() {
            return if bits & !Self::ALL_BITS == 0 {
                Ok(Permissions(bits))
            } else {
                Err(unknown())
            };
        }

        s.split([',', '|'])
            .map(str::trim)
            .try_fold(Permissions::NONE, |acc, part| {
                if part.eq_ignore_ascii_case("None") {
                    return Ok(acc);
                }
                Self::NAMED
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(part))
                    .map(|(_, flag)| acc | *flag)
                    .ok_or_else(unknown)
            })
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }

        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect();
        f.write_str(&names.join(", "))
    }
}

impl Serialize for Permissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
