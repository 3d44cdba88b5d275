//! Evidence aggregation, scoring, plain-text reports and chunked
//! delivery.

pub mod bundle;
pub mod chunker;
pub mod delivery;
pub mod scoring;
pub mod text;

pub use bundle::{BundleParts, EvidenceBundle, FileDigest, SummaryViews};
pub use chunker::{reassemble, ChunkKind, Chunker, DeliveryChunk};
pub use delivery::{deliver_bundle, DeliveryReport, HttpTransport, KindDelivery, Transport};
pub use scoring::{compute_score, RiskLevel, NON_OVERRIDE_CAP, SIGNATURE_OVERRIDE_SCORE};
pub use text::{recycle_bin_report, suspicious_files_report};
