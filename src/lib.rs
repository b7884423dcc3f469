//! Eraframe turns one portrait into a set of decade-styled variants and lays the
//! finished variants out on a printable album page.
//!
//! # Pipeline overview
//!
//! 1. **Generate**: a [`Scheduler`] runs one [`Generator`] call per [`Label`], at most
//!    `N` in flight, publishing [`GenerationEvent`]s as items move from `Pending` to
//!    `Done` or `Error`.
//! 2. **Track**: an [`AlbumSession`] owns the authoritative [`ResultMap`]; it applies
//!    events from the current round and ignores late events from abandoned rounds.
//! 3. **Compose**: a [`Compositor`] loads the completed images concurrently, plans the
//!    page ([`PagePlan`]), rasterizes it on the CPU and encodes a JPEG ([`EncodedImage`]).
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Cooperative concurrency**: workers are futures joined on the caller's task; shared
//!   state needs no locks.
//! - **Fonts before drawing**: a [`FontBook`] is resolved before any text is drawn and a
//!   missing face fails composition.
//! - **Premultiplied RGBA8** between decode and encode.
#![forbid(unsafe_code)]

mod assets;
mod compositor;
mod foundation;
mod generation;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
mod test_support;

/// JSON configuration with environment overrides.
pub mod config;
/// Tracing subscriber setup for binaries.
pub mod logging;
/// Session state: the authoritative result map.
pub mod session;

pub use assets::decode::{DecodedImage, decode_image};
pub use assets::fonts::{FontBook, FontRole, FontSpec, LoadedFont};
pub use assets::source::{load_source, read_source_bytes};
pub use compositor::Compositor;
pub use compositor::cpu::{CpuPageRenderer, PageRGBA};
pub use compositor::encode::{EncodedImage, encode_jpeg};
pub use compositor::layout::{GridSpec, PageLayout, PrintGeometry};
pub use compositor::plan::{
    CellOp, ImageDims, PageOp, PagePlan, ShadowOp, TextOp, plan_page,
};
pub use compositor::text::{TextBrush, TextLayoutEngine};
pub use config::{AlbumConfig, FontConfig, GenerationConfig};
pub use foundation::core::{
    Affine, ImageRef, ImageSource, Label, LabelMap, Point, Rect, Rgba8, Vec2,
};
pub use foundation::error::{AlbumError, AlbumResult, truncate_reference};
pub use generation::generator::{
    FnGenerator, Generator, ImageService, PromptedGenerator, SourcePhoto, generator_fn,
};
pub use generation::http::HttpImageService;
pub use generation::prompt::{DEFAULT_DECADES, default_labels, fallback_prompt_for, prompt_for};
pub use generation::scheduler::{RetryOutcome, Scheduler, UpdateSink};
pub use generation::state::{
    GenerationEvent, GenerationFailure, GenerationState, ResultMap, RoundId, RoundSummary,
};
pub use session::{AlbumSession, CompositionInput, Progress};
