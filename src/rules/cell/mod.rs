//! Cell rule families

pub(super) mod codes;
pub(super) mod dates;
pub(super) mod formats;
pub(super) mod numeric;
pub(super) mod text;
pub(super) mod values;
