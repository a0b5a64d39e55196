//! # tenet-validator
//!
//! Structured violation records and the appendable violations sink the
//! rule engine's input-validation phase reads, plus a small set of
//! built-in checks for use inside validation rules.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use tenet_validator::{Check, NotEmpty, Violations};
//!
//! let violations = Violations::new();
//! if let Err(violation) = NotEmpty.check("") {
//!     violations.add(violation);
//! }
//! assert!(violations.has_severe());
//! ```

pub mod checks;
pub mod violation;
pub mod violations;

pub use checks::{Alphanumeric, Check, InRange, Matches, MaxLength, MinLength, NotEmpty};
pub use violation::{Severity, Violation};
pub use violations::{VIOLATIONS_BINDING, Violations};
