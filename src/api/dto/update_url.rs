//! DTOs for updating and deleting shortened URLs.

use serde::{Deserialize, Serialize};

use crate::application::services::UpdateCommand;

/// Partial update of an owned URL.
///
/// `generateRandom` wins over `newCustomCode`. Omitted fields are unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUrlRequest {
    #[serde(default)]
    pub original_url: Option<String>,

    #[serde(default)]
    pub new_custom_code: Option<String>,

    #[serde(default)]
    pub generate_random: bool,
}

impl From<UpdateUrlRequest> for UpdateCommand {
    fn from(req: UpdateUrlRequest) -> Self {
        Self {
            url: req.original_url.filter(|u| !u.trim().is_empty()),
            new_code: req.new_custom_code,
            regenerate: req.generate_random,
        }
    }
}

/// Plain confirmation message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
