pub mod fetcher;
pub mod http;
pub mod pool;

pub use fetcher::HttpFetcher;
pub use http::HttpClient;
pub use pool::ClientPool;
