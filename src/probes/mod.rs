//! Collaborator interfaces to the operating system.
//!
//! Every external data source the scan depends on sits behind an async
//! trait here: volume enumeration, directory listing and stat, service
//! and tamper-protection queries, file version metadata, and registry
//! reads. The OS-backed implementations shell out the same way the
//! desktop tooling this replaces did; tests substitute in-memory fakes.
//! A failing probe degrades its check, it never aborts the session.

pub mod drives;
pub mod fs;
pub mod metadata;
pub mod registry;
pub mod services;

pub use drives::{DriveProbe, SystemDrives};
pub use fs::{DirEntryInfo, FsProbe, LocalFs, StatInfo};
pub use metadata::{MetadataProbe, VersionInfoProbe};
pub use registry::{RegistryProbe, SystemRegistry};
pub use services::{ServiceControlProbe, ServiceProbe};
