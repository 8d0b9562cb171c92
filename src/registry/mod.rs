//! Registry interaction: role routing, the npm-backed client, and
//! visibility polling

pub mod client;
pub mod endpoint;
pub mod visibility;
