#![deny(unreachable_patterns)]
//! Smart crop and caption synchronization for vertical clips.
//!
//! Given noisy per-frame person detections and a word-level transcript, the
//! engine produces:
//! 1. A smooth crop trajectory that keeps the active speaker framed
//! 2. Caption cues with per-word reveal and keyword highlight timing
//! 3. One time-ordered instruction stream for the compositor
//!
//! # Architecture
//!
//! ```text
//! Detector frames                     Transcript words
//!     │                                     │
//!     ▼                                     │
//! ┌──────────────────┐                      │
//! │ Detection Ingest │ ← Threshold, clamp,  │
//! └────────┬─────────┘   repair timestamps  │
//!          │                                │
//!          ▼                                │
//! ┌──────────────────┐                      │
//! │ Subject Tracker  │ ← One subject/frame  │
//! └────────┬─────────┘                      │
//!          │                                ▼
//!          ▼                      ┌──────────────────┐
//! ┌──────────────────┐            │ Caption Builder  │ ← Lines, reveal,
//! │ Trajectory Plan  │ ← EMA +    └────────┬─────────┘   highlight
//! └────────┬─────────┘   delta cap         │
//!          │                               │
//!          └──────────────┬────────────────┘
//!                         ▼
//!               ┌──────────────────┐
//!               │   Timeline Mux   │ ← Validate and merge
//!               └────────┬─────────┘
//!                        │
//!                        ▼
//!                    Timeline
//! ```
//!
//! The engine is a pure batch transform. Parallelism exists only across
//! clips; see [`engine::process_batch`] and [`engine::run_with_deadline`].

pub mod captions;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod mux;
pub mod planner;
pub mod smoothing;
pub mod subject;

pub use captions::{CaptionTimelineBuilder, KeywordLexicon};
pub use config::EngineConfig;
pub use engine::{build_timeline, process_batch, run_with_deadline, Engine};
pub use error::{EngineError, EngineResult};
pub use ingest::{group_records, DetectionIngest, IngestOutput};
pub use logging::ClipLogger;
pub use mux::TimelineMux;
pub use planner::{CropTrajectory, CropTrajectoryPlanner, PlannerStats};
pub use subject::{select_subject, SubjectTracker};
