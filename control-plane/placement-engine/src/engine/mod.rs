mod decision;

pub use decision::{reset, step};
