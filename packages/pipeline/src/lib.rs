// ABOUTME: Offer pipeline rules for Robodesk
// ABOUTME: Stage transitions and line item edits, each checked against the offer's current stage

pub mod line_items;
pub mod stage;

pub use line_items::LineItemEditor;
pub use stage::StageGuard;
