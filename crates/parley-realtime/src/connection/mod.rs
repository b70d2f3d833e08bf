//! WebSocket connection bookkeeping: handles, the live pool, the presence
//! registry, and handshake authentication.

pub mod authenticator;
pub mod handle;
pub mod pool;
pub mod registry;

pub use handle::ConnectionHandle;
pub use pool::ConnectionPool;
pub use registry::ConnectionRegistry;
