//! The join-request workflow that links an unaffiliated user to an
//! existing family member slot.

mod accept_endpoint;
mod core;
mod create_endpoint;
mod list_endpoint;
mod reject_endpoint;

pub use accept_endpoint::accept_request_endpoint;
pub use core::{
    JoinFamilyRequest, RequestStatus, accept_request, create_join_request,
    create_join_request_table, get_join_request, list_requests_for_family, list_requests_of_user,
    reject_request,
};
pub use create_endpoint::create_join_request_endpoint;
pub use list_endpoint::list_join_requests_endpoint;
pub use reject_endpoint::reject_request_endpoint;
