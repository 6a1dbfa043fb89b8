mod http;
mod traits;

pub use http::HttpCompletionClient;
pub use traits::*;
