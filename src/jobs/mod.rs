pub mod handler;
pub mod handlers;
pub mod registry;
pub mod schedule;
pub mod scheduler;

pub use handler::*;
pub use handlers::*;
pub use registry::*;
pub use schedule::*;
pub use scheduler::*;
