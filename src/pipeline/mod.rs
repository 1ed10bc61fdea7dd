//! Pipeline stages for page and graphic extraction.
//!
//! Each submodule implements one step; [`assemble`] strings them together
//! for a single page.
//!
//! ## Data Flow
//!
//! ```text
//!                      ┌─▶ images ───────────────────────────┐
//! input ──▶ content ───┤                                     ├─▶ assemble
//!                      └─▶ cluster ──▶ rasterize ──▶ chart ──┘
//!           render (pdfium, full page) ──────────────────────┘
//! ```
//!
//! 1. [`input`]     — read the local file or download the URL into memory
//! 2. [`render`]    — full-page bitmaps behind the [`render::PageRenderer`] trait
//! 3. [`content`]   — interpret the content stream into [`drawing::Drawing`]s
//!    and image placements
//! 4. [`images`]    — decode image XObjects and force RGB; stream filters
//!    come from [`filters`]
//! 5. [`cluster`]   — drop background-scale drawings from grouping and
//!    union overlapping ones
//! 6. [`rasterize`] — paint each cluster onto its own white surface
//! 7. [`chart`]     — gridded reading-aid variant of every image
//! 8. [`encode`]    — PNG bytes, atomic writes, base64 payloads

pub mod assemble;
pub mod chart;
pub mod cluster;
pub mod content;
pub mod drawing;
pub mod encode;
pub mod filters;
pub mod images;
pub mod input;
pub mod lexer;
pub mod rasterize;
pub mod render;
