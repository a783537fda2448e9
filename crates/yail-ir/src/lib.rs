//! S-expression IR for YAIL.
//!
//! This crate defines the intermediate representation handed to the runtime
//! bridge by the block compiler, plus the reader that turns YAIL source text
//! into it.
//!
//! # S-expression format
//!
//! An S-expression is either:
//! - A literal (`#t`, `#f`, a number, a string)
//! - A symbol (`g$count`, `set-and-coerce-property!`, `+`)
//! - A list, which is a form call when its head is a symbol
//!
//! Example:
//! ```text
//! (def g$count 0)
//! (define-event Button1 Click ()
//!   (set-var! g$count (call-yail-primitive + (*list-for-runtime* (get-var g$count) 1) '(number number) "+")))
//! ```

mod forms;
mod reader;
mod sexpr;
mod validation;

pub use forms::{SPECIAL_FORMS, is_special_form};
pub use reader::{MAX_NESTING, ReadError, parse_number, read, read_one};
pub use sexpr::SExpr;
pub use validation::{ValidationError, validate};
