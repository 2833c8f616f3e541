#![forbid(unsafe_code)]

//! Transform pipeline engine for the gostsig XML signature library.
//!
//! Each reference carries a sequence of transforms applied in order.  The
//! signing profile fixes that sequence to the enveloped-signature transform
//! (enveloped signatures only), exclusive C14N and the SMEV transform.

pub mod enveloped;
pub mod pipeline;
pub mod smev;
pub mod uri;

pub use pipeline::{C14nTransform, Transform, TransformData, TransformPipeline};
