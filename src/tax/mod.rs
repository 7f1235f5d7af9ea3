//! GST rate handling, place-of-supply resolution and the inclusive pricing split

pub mod gst;
pub mod jurisdiction;
pub mod pricing;

pub use gst::*;
pub use jurisdiction::*;
pub use pricing::*;
