//! Family members: named slots within a family, optionally bound to a
//! login identity.

mod core;
mod create_endpoint;
mod list_endpoint;

pub use core::{
    FamilyMember, MemberRole, NewMember, create_member_tables, get_member, get_member_of_user,
    list_members,
};
pub(crate) use core::{bind_member_user, insert_member};
pub use create_endpoint::create_member_endpoint;
pub use list_endpoint::list_members_endpoint;
