mod session;
mod shutdown;

pub use session::{BootEnv, BootError, Session};
pub use shutdown::ShutdownGuard;
