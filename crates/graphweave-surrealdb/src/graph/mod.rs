mod reader;

pub use reader::{GraphReader, GraphStats};
