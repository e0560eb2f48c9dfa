//! Blockport Core Types and Definitions
//!
//! This crate provides the shared data model for the Blockport pipeline. It
//! includes:
//!
//! - **Geometry**: Positions and bounding boxes ([`geometry`] module)
//! - **Spans**: Byte ranges into diagram source ([`span::Span`])
//! - **Blocks**: Block kinds, raw records and classified blocks ([`block`] module)
//! - **Parameters**: Typed parameter values ([`param`] module)

pub mod block;
pub mod geometry;
pub mod param;
pub mod span;
