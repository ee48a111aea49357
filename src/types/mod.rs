//! Shared request and response types.

mod pagination;
mod response;

pub use pagination::{
    Paginated, PaginatedActivity, PaginatedGroups, PaginatedMembers, PaginatedNewFriends,
    PaginatedRegularMembers, PaginationMeta, PaginationParams,
};
pub use response::MessageResponse;
