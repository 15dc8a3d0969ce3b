/// Declares a string-backed enum stored in a `TEXT` column.
///
/// Generates serde/ts-rs derives with the column spelling, plus `as_str`,
/// `FromStr` and `Display`.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            serde::Serialize,
            serde::Deserialize,
            ts_rs::TS,
        )]
        #[ts(export)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Invalid {} '{}'", stringify!($name), other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod attachment;
pub mod checklist;
pub mod deleted_user;
pub mod entity_activity;
pub mod equipamento;
pub mod equipe;
pub mod expense;
pub mod obra;
pub mod org;
pub mod rate_limit;
pub mod rdo;
pub mod rdo_item;
pub mod role;
pub mod session;
pub mod user;
pub mod user_role;

// Re-export models for easier access
pub use attachment::*;
pub use checklist::*;
pub use deleted_user::*;
pub use entity_activity::*;
pub use equipamento::*;
pub use equipe::*;
pub use expense::*;
pub use obra::*;
pub use org::*;
pub use rate_limit::*;
pub use rdo::*;
pub use rdo_item::*;
pub use role::*;
pub use session::*;
pub use user::*;
pub use user_role::*;
