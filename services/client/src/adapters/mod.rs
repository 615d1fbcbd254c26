pub mod geojson;
pub mod http;
pub mod jwt;
pub mod token_store;

pub use http::HttpApi;
pub use jwt::JwtDecoder;
pub use token_store::FileTokenStore;
