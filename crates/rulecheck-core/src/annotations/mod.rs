pub mod marker;
pub mod scan;

pub use marker::{MarkerKind, MatchMode};
pub use scan::{Annotation, scan};
