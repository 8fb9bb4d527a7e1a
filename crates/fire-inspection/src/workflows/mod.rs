pub mod forecasting;
pub mod inspection;
