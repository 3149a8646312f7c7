pub mod api;
pub mod client;
pub mod identity;
pub mod mapper;

pub use api::KurobbsApi;
pub use client::KurobbsClient;
