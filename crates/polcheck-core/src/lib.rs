pub mod error;
pub mod model;
pub mod regulation;
pub mod segment;

pub use error::{PolicyCheckerError, Result};
pub use model::{Citation, ComplianceAnalysis, Discrepancy, Provenance};
pub use regulation::{Regulation, normalize_regulation_name};
pub use segment::{ProvisionNumber, Segment, SegmentMetadata};
