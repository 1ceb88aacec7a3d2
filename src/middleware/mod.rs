pub mod gate;
pub mod json;
pub mod response;

pub use gate::{enforce, Gate, Pipeline, Stage};
pub use json::JsonBody;
pub use response::{ApiResponse, ApiResult};
