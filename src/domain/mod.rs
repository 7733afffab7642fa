pub mod profile;
pub mod payment;
pub mod doubt;

pub use profile::*;
pub use payment::*;
pub use doubt::*;
