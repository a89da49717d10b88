//! # statprofile - Declarative Derived-Stat Evaluation
//!
//! A small evaluation engine for quantities derived from named inputs,
//! such as effective attack, crit rate or mean damage, where some inputs
//! only apply under conditions and others aggregate several sources.
//!
//! - **Hardcode-free**: no built-in stat names; fields are data owned by the caller
//! - **Lazy**: formulas are expression trees evaluated on query
//! - **Composable**: profiles merge (`+`) and overlay like values
//! - **Pure**: no caching, no mutation, no hidden global state
//!
//! ## Core Concepts
//!
//! ```text
//! [Field] ──when(Predicate)──▶ [GuardedField]
//!    │                              │
//!    └──────── keys of ─────────────┴──▶ [Profile] ──get(field)──▶ Value
//! ```
//!
//! 1. **Fields** name quantities and carry a default and a combinator
//! 2. **Expressions** combine fields and scalars with `+ - * /`, `min`, `max`
//! 3. **Predicates** compare expressions and guard contributions
//! 4. **Profiles** hold ordered contributions per field and are the
//!    context every expression is evaluated in
//!
//! Querying a field evaluates each contribution against the profile,
//! drops contributions whose guard was not met, and folds the rest with
//! the field's combinator. When nothing applies the field's default is
//! evaluated instead.
//!
//! ## Example
//!
//! ```rust
//! use statprofile::*;
//!
//! let atk_base = Field::new("atk_base");
//! let atk_percent = Field::new("atk_percent");
//! let atk_flat = Field::new("atk_flat");
//! let atk = Field::new("atk");
//! let hp_ratio = Field::builder("hp_ratio").default(1.0).build();
//!
//! let formulas = Profile::builder()
//!     .insert(&atk, &atk_base * (1.0 + &atk_percent) + &atk_flat)
//!     .build();
//! let stats = Profile::builder()
//!     .insert(&atk_base, 100)
//!     .insert(&atk_percent, 0.5)
//!     .insert(&atk_flat, 20)
//!     // only while below half HP
//!     .insert(atk_percent.when(hp_ratio.lt(0.5)), 0.25)
//!     .build();
//!
//! let profile = &formulas + &stats;
//! assert_eq!(profile.get(&atk).unwrap(), Value::Number(170.0));
//!
//! // what if HP dropped to 40%?
//! let low_hp = profile.get_with(&atk, [(&hp_ratio, 0.4)]).unwrap();
//! assert_eq!(low_hp, Value::Number(195.0));
//! ```
//!
//! ## Modules
//!
//! - [`value`] - Values and the operators over them
//! - [`expr`] - Expression trees
//! - [`predicate`] - Boolean conditions
//! - [`field`] - Fields
//! - [`guard`] - Guarded field bindings
//! - [`combinator`] - Field combination policies
//! - [`context`] - Evaluation context and settings
//! - [`profile`] - Profiles: storage, queries, merge and overlay
//! - [`resolved`] - Per-contribution breakdowns
//! - [`graph`] - Static dependency graph and cycle check
//! - [`registry`] - Name-based field vocabulary and JSON profiles
//! - [`error`] - Error types

pub mod combinator;
pub mod context;
pub mod error;
pub mod expr;
pub mod field;
pub mod graph;
pub mod guard;
pub mod predicate;
pub mod profile;
pub mod registry;
pub mod resolved;
pub mod value;

// Re-export main types for convenience
pub use combinator::Combinator;
pub use context::{Context, EvalConfig};
pub use error::ProfileError;
pub use expr::{max, min, Expr, Outcome};
pub use field::{Field, FieldBuilder};
pub use graph::FieldGraph;
pub use guard::GuardedField;
pub use predicate::Predicate;
pub use profile::{Profile, ProfileBuilder, ProfileKey};
pub use registry::FieldRegistry;
pub use resolved::ResolvedField;
pub use value::Value;
