//! Home screen risk cell state and the identity used to decide re-rendering.

mod risk_cell;

pub use risk_cell::{
    DetectionMode, DetectionState, ManualExposureDetectionState, RiskCellConfigurator,
    RiskCellRefresh, UpdateButton,
};
