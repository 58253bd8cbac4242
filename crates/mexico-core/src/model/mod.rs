pub mod claim;
pub mod roll;

/// Category label for the top claim (`21`).
pub const MEXICAN: &str = "mexican";
/// Category label for pairs.
pub const DOUBLE: &str = "double";
/// Category label for every other claim.
pub const NORMAL: &str = "normal";
