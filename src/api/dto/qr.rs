//! Query of the QR code endpoint.

use serde::Deserialize;

/// `?size=` query parameter, in pixels per module.
#[derive(Debug, Default, Deserialize)]
pub struct QrQuery {
    pub size: Option<u32>,
}
