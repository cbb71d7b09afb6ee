//! Mold list from the persistence API.

use serde_json::Value;

use crate::{error::ClientError, scene::Mold};

/// `GET` endpoint listing the molds visible to the user.
pub fn molds_url(api_base: &str) -> String {
    format!("{}/mold/", api_base.trim_end_matches('/'))
}

/// Fetch the molds available for placement.
///
/// A response that is not a JSON array is treated as an empty list.
pub async fn fetch_molds(
    client: &reqwest::Client,
    api_base: &str,
    token: &str,
) -> Result<Vec<Mold>, ClientError> {
    let response = client
        .get(molds_url(api_base))
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| ClientError::MoldApi(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ClientError::MoldApi(format!(
            "unexpected status {}",
            response.status()
        )));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| ClientError::MoldApi(e.to_string()))?;
    let Value::Array(records) = body else {
        return Ok(Vec::new());
    };

    let molds = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<Mold>(record) {
            Ok(mold) => Some(mold),
            Err(e) => {
                tracing::warn!("Skipping invalid mold record: {}", e);
                None
            }
        })
        .collect();
    Ok(molds)
}
