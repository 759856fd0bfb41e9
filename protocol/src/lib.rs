//! RPC Dispatch (component D of the client-side pipeline): for each
//! server operation, build a request buffer using `wire`+`dbtype`,
//! send it, receive the reply, and unpack it. `dispatch::Dispatcher` is
//! the single generic driver; `rpc` holds one `Request` impl per
//! concrete server operation, grouped by the reply-shape taxonomy of
//! §4.4 (no-reply, unary, reply+1/2 blocks, reply+Copy Area, reply+Log
//! Page, reply+callback).

pub mod copy_area;
pub mod dispatch;
pub mod op_id;
pub mod reply;
pub mod request;
pub mod rpc;
pub mod transport;

pub use copy_area::{CopyArea, CopyDescriptor, CopyOperation};
pub use dispatch::Dispatcher;
pub use op_id::OpId;
pub use request::Request;
pub use transport::{LoopbackTransport, TcpTransport, Transport};
