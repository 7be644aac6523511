//! Route handlers, one module per resource.
//!
//! Handlers only translate between HTTP and the service modules; every
//! success body is a `{"success": true, …}` envelope.

pub mod members;
pub mod session;
pub mod submissions;
pub mod toggle;
