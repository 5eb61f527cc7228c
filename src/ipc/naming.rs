//! Enumeration wire naming
//!
//! Every enum-valued protocol field is written as the snake_case form of the
//! variant identifier (`AuthError` <-> `auth_error`). The conversion lives
//! here once; [`wire_enum!`](crate::wire_enum) wires an enum into it.
//!
//! Decoding splits on `_`, capitalizes each segment and matches the result
//! against the declared variant identifiers. Anything else is a decode error.

use serde::de::{self, Deserialize, Deserializer};
use serde::Serializer;

/// An enum whose wire form follows the snake_case naming rule
pub trait SnakeCaseEnum: Sized + Copy + 'static {
    /// Type name used in error messages
    const NAME: &'static str;

    /// Every variant, in declaration order
    const VARIANTS: &'static [Self];

    /// The PascalCase identifier of this variant
    fn ident(self) -> &'static str;

    /// Wire form of this variant
    fn to_wire(self) -> String {
        pascal_to_snake(self.ident())
    }

    /// Parse a wire literal, `None` when it names no known variant
    fn from_wire(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }

        let pascal = snake_to_pascal(text);
        Self::VARIANTS
            .iter()
            .copied()
            .find(|variant| variant.ident() == pascal)
    }
}

/// `AuthError` -> `auth_error`
pub fn pascal_to_snake(pascal: &str) -> String {
    let mut snake = String::with_capacity(pascal.len() + 4);

    for (i, c) in pascal.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            snake.push('_');
        }
        snake.extend(c.to_lowercase());
    }

    snake
}

/// `auth_error` -> `AuthError`
pub fn snake_to_pascal(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Serialize any [`SnakeCaseEnum`] as its wire string
pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: SnakeCaseEnum,
    S: Serializer,
{
    serializer.serialize_str(&value.to_wire())
}

/// Deserialize any [`SnakeCaseEnum`] from its wire string
pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: SnakeCaseEnum,
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;

    T::from_wire(&text)
        .ok_or_else(|| de::Error::custom(format!("invalid {} value: {:?}", T::NAME, text)))
}

/// Declare a protocol enum that serializes through [`SnakeCaseEnum`]
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $crate::ipc::naming::SnakeCaseEnum for $name {
            const NAME: &'static str = stringify!($name);
            const VARIANTS: &'static [Self] = &[$($name::$variant),+];

            fn ident(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)+
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                $crate::ipc::naming::serialize(self, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                $crate::ipc::naming::deserialize(deserializer)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&$crate::ipc::naming::SnakeCaseEnum::to_wire(*self))
            }
        }
    };
}
