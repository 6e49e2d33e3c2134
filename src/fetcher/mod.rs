pub mod client;
pub mod errors;
pub mod decode;
pub mod types;

pub use client::{HttpPageLoader, PageLoader};
pub use errors::FetchError;
pub use types::{Charset, FetchOptions, PageResponse};

#[cfg(test)]
pub use client::MockPageLoader;
