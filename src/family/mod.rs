//! The family aggregate: one creator, three accounts, many members.

mod core;
mod create_endpoint;
mod my_family_endpoint;

pub use core::{
    CreatorProfile, Family, FamilyOverview, create_family, create_family_table, get_family,
    get_family_by_creator, get_family_overview,
};
pub use create_endpoint::create_family_endpoint;
pub use my_family_endpoint::get_my_family_endpoint;
