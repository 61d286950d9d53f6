pub mod design;
pub mod fir_core;
pub mod peak_detector;
pub mod sliding_max;

pub use design::{
    CoefficientDesigner, FilterSpec, RemezDesigner, WindowedSincDesigner, create_designer,
};
pub use fir_core::FirFilterCore;
pub use peak_detector::{BandRuntimeState, PeakDecision, PeakDetector};
pub use sliding_max::SlidingWindowMax;
