//! Strongly-typed string identifiers.
//!
//! Every entity key in the data model (§3) is an opaque string at the
//! storage boundary but must never be confused with a sibling id type at
//! the call site — a `ShipId` passed where a `LocationId` is expected
//! should fail to compile, not fail at runtime. `string_id!` generates the
//! thin newtype wrapper once per id kind.

use std::fmt;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(LocationId);
string_id!(BodyId);
string_id!(ShipId);
string_id!(CorpId);
string_id!(EquipmentId);
string_id!(JobId);
string_id!(TeamId);
string_id!(ResourceId);
string_id!(RecipeId);
string_id!(TechId);
string_id!(ItemId);
