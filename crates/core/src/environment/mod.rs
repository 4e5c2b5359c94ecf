//! Host stand-ins for the device collaborators the pipeline talks to:
//! the expanded-memory pool, the network link and the clock.

pub mod clock;
pub mod link;
pub mod memory;
