//! # Algorithms Module
//!
//! Contains:
//! - Reference-counted ambient binding overlay
//! - Relaxed object-literal parser
//! - Loader configuration patcher
//! - FIFO initialization serializer

pub mod config_patcher;
pub mod literal;
pub mod overlay;
pub mod serializer;

pub use config_patcher::{base_url_for, extract_config_literal, patch_config, PatchedConfig};
pub use literal::{parse_literal, value_kind};
pub use overlay::{Bindings, GlobalOverlay, OverlayGuard};
pub use serializer::{Admission, InitPermit, InitSerializer};
