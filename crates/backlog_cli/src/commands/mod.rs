//! Command handlers for the backlog CLI.

pub(crate) mod comments;
pub(crate) mod items;
pub(crate) mod limits;
pub(crate) mod shared;
