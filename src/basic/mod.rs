//! Basic kernel group: small elementwise kernels.

mod init3;

pub use init3::Init3;
