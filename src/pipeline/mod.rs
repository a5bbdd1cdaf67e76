//! Pipeline stages for turning paper content into a poster `.tex`.
//!
//! Each submodule implements one step and is testable on its own; the
//! orchestration lives in [`crate::convert`].
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ mapper ──▶ budget ──▶ columns ──▶ assemble
//! (JSON)    (figures   (shrink    (split into  (template rewrite,
//!            → sections) figures)  columns)      via TemplateStrategy)
//! ```
//!
//! 1. [`input`]    read the content, arrangement and caption JSON and the template
//! 2. [`mapper`]   attach arranged figures to sections through their panels and
//!    compute initial widths
//! 3. [`budget`]   shrink figures that would crowd out a section's text
//! 4. [`columns`]  distribute sections into columns; adaptive column widths
//! 5. [`assemble`] rewrite header and body of the template
//!
//! The leaf helpers [`sanitize`], [`title`] and [`region`] are shared by the
//! assembler strategies.

pub mod assemble;
pub mod budget;
pub mod columns;
pub mod input;
pub mod mapper;
pub mod region;
pub mod sanitize;
pub mod title;
