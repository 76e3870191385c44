pub mod client;
pub mod method;
pub mod request;
pub mod response;

pub use client::HttpClient;
pub use method::HttpMethod;
pub use request::{RequestBody, RequestInput};
pub use response::HttpResponse;
