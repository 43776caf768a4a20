//! Image Analysis Service
//!
//! HTTP service for image upload and idempotent skin analysis. Uploads
//! are validated, stored on the filesystem under a fresh identifier,
//! and analyzed on demand. The analysis is a deterministic derivation
//! from the identifier: the first request persists the result, every
//! later request returns the stored record verbatim.
//!
//! ## Architecture
//!
//! ```text
//! POST /upload                POST /analyze
//! ┌──────────────┐           ┌──────────────┐
//! │ Upload       │           │ Analysis     │
//! │ Service      │           │ Engine       │
//! └──────────────┘           └──────────────┘
//!        │                      │         │
//!        ▼                      ▼         ▼
//! ┌──────────────┐    exists? ┌──┐  ┌──────────────┐
//! │ Blob Store   │◀───────────┘  │  │ Result Store │
//! │ data/images/ │               │  │ data/analysis│
//! └──────────────┘               │  └──────────────┘
//!                                │    get / put (idempotency)
//! ```
//!
//! All persistent state lives in the two stores; the engine holds no
//! in-memory cache, so any number of server processes can share one
//! data directory.

pub mod analysis;
pub mod api;
pub mod blob_store;
pub mod config;
pub mod error;
pub mod model;
pub mod result_store;
pub mod upload;

pub use analysis::{derive_result, AnalysisEngine};
pub use api::{create_router, start_api_server, AppState};
pub use blob_store::FsBlobStore;
pub use config::Config;
pub use error::ServiceError;
pub use model::{AnalysisResult, Issue, SkinType};
pub use result_store::FsResultStore;
pub use upload::UploadService;
