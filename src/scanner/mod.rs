//! Scanning functionality: volume walking, recycle-bin forensics,
//! credential-store discovery and security-posture collection.

pub mod accounts;
pub mod recycle_bin;
pub mod security;
pub mod walker;

pub use accounts::AccountStore;
pub use recycle_bin::{derive_cleanup, RecycleBinScanner, RecycleCleanup};
pub use security::{RegistryActivity, SecurityPosture, SecurityScanner, ServiceEntry};
pub use walker::{VolumeWalker, SKIP_DIRECTORIES};
