pub mod model;
pub mod segment;

pub use model::{CodeSegment, ExampleBuckets, split_lines};
pub use segment::{bucket, segment};
