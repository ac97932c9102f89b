// ABOUTME: Versioned document snapshots for offers and contracts
// ABOUTME: Renders PDFs, allocates gap-free version numbers, stores and emails them

pub mod inputs;
pub mod manager;
mod mail;
pub mod pdf;

pub use inputs::{ClientBlock, RenderInputs, RenderLineItem};
pub use manager::VersionManager;
pub use pdf::render_pdf;
