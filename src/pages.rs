//! Page generation modules
//!
//! Each page module assembles shared components from the components module
//! into a complete HTML document.

pub mod report;
