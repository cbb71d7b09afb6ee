//! Identifier generation.
//!
//! Identifiers have the shape `<prefix>_<unix-millis>_<suffix>` where the suffix is
//! nine random lowercase alphanumerics taken from a v4 UUID. The timestamp keeps ids
//! roughly ordered by creation, the suffix keeps them unique within one millisecond.

use uuid::Uuid;

use crate::time::{Clock, SystemClock};

/// Length of the random suffix.
pub const SUFFIX_LEN: usize = 9;

/// Generate an id with the given prefix using the system clock.
pub fn generate_id(prefix: &str) -> String {
    generate_id_with_clock(prefix, &SystemClock)
}

/// Generate an id with the given prefix using the supplied clock.
pub fn generate_id_with_clock(prefix: &str, clock: &dyn Clock) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        prefix,
        clock.now_millis(),
        &random[..SUFFIX_LEN]
    )
}
