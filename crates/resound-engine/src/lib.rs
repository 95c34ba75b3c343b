//! Simulation facade for resound.
//!
//! [`AcousticSimulator`] turns "a sound of this volume plays here" into a
//! settled volume field. It fetches a scene window around the source
//! from a [`SceneProvider`](resound_core::SceneProvider), leases a grid
//! from the shared [`ArrayPool`](resound_arena::ArrayPool), runs the
//! configured solver on a worker thread, and hands back an
//! [`AcousticSimulationResult`] that answers per-position volume queries
//! until it is [`finish`](AcousticSimulationResult::finish)ed.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod result;
pub mod simulator;

pub use config::{ConfigError, SimulatorConfig, SolverKind, MAX_RANGE};
pub use metrics::{SimulationMetrics, SolverStats};
pub use result::AcousticSimulationResult;
pub use simulator::{AcousticSimulator, PendingSimulation, ShutdownReport};
