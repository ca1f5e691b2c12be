//! Site layout configuration
//!
//! A [`SiteLayout`] describes one results site: how to build listing URLs,
//! where the runner links are, and where each runner field lives. Two layouts
//! ship with the crate; others can be loaded from TOML.
//!
//! # Example
//!
//! ```no_run
//! use racecrawl::config::builtin_layout;
//!
//! let layout = builtin_layout("competitor").unwrap();
//! println!("Results container: {}", layout.results_selector);
//! ```

mod parser;
mod site;
mod template;
mod types;
mod validation;

// Re-export types
pub use types::{CacheUnit, FieldKind, FieldSpec, LabelGroup, ParamSpec, SiteLayout};

// Re-export parser functions
pub use parser::{builtin_layout, builtin_names, load_layout, parse_layout};
