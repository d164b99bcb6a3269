//! Turning extracted proposal content into reconciled, validated records.
//!
//! - [`alignment`]: visit index, phase reduction and orbit pairing
//! - [`reconciler`]: one record per exposure with an accepted spectral element
//! - [`screening`]: abstract keyword screen for exoplanet programs
//! - [`validator`]: error and warning report over a reconciled table
//! - [`pipeline`]: the steps above chained for one proposal

pub mod alignment;
pub mod pipeline;
pub mod reconciler;
pub mod screening;
pub mod validator;

pub use alignment::{align_orbits, reduce_phases, AlignmentShortfall, OrbitAlignment, VisitIndex};
pub use pipeline::{reconcile_apt_file, ExocatPipeline, PipelineConfig, PipelineResult};
pub use reconciler::{
    resolve_display_name, Category, ReconcileOutcome, Reconciler, Reconciliation,
    SpectralElementFilter,
};
pub use screening::ExoplanetScreen;
pub use validator::{RecordValidator, ValidationResult, ValidationStats};
