//! Reusable HTML components for report generation

pub mod icons;
pub mod layout;
