//! HTTP plumbing: typed requests, transports, the middleware pipeline and
//! failure classification used by the authenticated client.

mod classify;
mod error;
mod fixture;
mod middleware;
mod request;
mod single_flight;
mod transport;

pub use classify::{classify, FailureClass};
pub use error::HttpError;
pub use fixture::FixtureTransport;
pub use middleware::{AntiForgeryHeader, BearerCredentials, Pipeline, RequestMiddleware};
pub use request::{ApiRequest, ApiResponse};
pub use single_flight::SingleFlight;
pub use transport::{ReqwestTransport, Transport, USER_AGENT};

#[cfg(test)]
pub use transport::MockTransport;
