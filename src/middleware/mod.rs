//! Middleware layer.
//!
//! Two kinds live here, matching the two handler levels:
//!
//! - endpoint decorators, composed per route with an
//!   [`EndpointConfig`](crate::EndpointConfig):
//!   - [`logger`]: logs the time spent in everything it wraps
//!   - [`timeout`]: gives the request context a 50 ms deadline
//!   - [`limit_up`]: rejects or caps bodies over [`BUFFER_MAX`](crate::BUFFER_MAX)
//! - transport wrappers, applied once around the whole router:
//!   - [`cors`]: answers preflights and echoes the caller's origin
//!
//! [`Timeout`] and [`LimitUp`] are the configurable forms of [`timeout`] and [`limit_up`];
//! both implement [`Decorator`](crate::Decorator).

mod cors;
mod limit;
mod logger;
mod timeout;

pub use cors::{Cors, cors};
pub use limit::{LimitUp, limit_up};
pub use logger::logger;
pub use timeout::{TIMEOUT, Timeout, timeout};
