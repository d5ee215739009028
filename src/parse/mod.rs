/// Cell text parsing helpers.
///
/// Submodules:
/// - `numeric` — comma-decimal number parsing for measurement cells.

pub mod numeric;

pub use numeric::parse_numeric;
