//! Value classification

mod reclassify;

pub use reclassify::{
    reclassify, ClassBreak, MissingPolicy, RangeBoundaries, Reclassify, ReclassifyParams,
};
