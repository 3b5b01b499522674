//! Response envelope shared by all API handlers.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Body of acknowledgement-only responses such as logout.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
