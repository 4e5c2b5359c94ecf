//! Startup stages. The probe runs before any buffer is sized; the
//! connectivity manager runs before any request is issued.

pub mod connectivity;
pub mod probe;

pub use connectivity::ConnectivityManager;
pub use probe::probe;
