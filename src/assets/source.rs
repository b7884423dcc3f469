use crate::{
    assets::decode::{DecodedImage, decode_image},
    foundation::core::ImageSource,
    foundation::error::{AlbumError, AlbumResult},
};

/// Fetch the encoded bytes behind an [`ImageSource`].
///
/// Every failure is reported as [`AlbumError::LoadFailure`] naming the source.
pub async fn read_source_bytes(
    source: &ImageSource,
    http: &reqwest::Client,
) -> AlbumResult<Vec<u8>> {
    let reference = source.reference();
    match source {
        ImageSource::Bytes(bytes) => Ok(bytes.to_vec()),
        ImageSource::Path(path) => tokio::fs::read(path)
            .await
            .map_err(|e| AlbumError::load_failure(&reference, e.to_string())),
        ImageSource::Url(url) => {
            let resp = http
                .get(url)
                .send()
                .await
                .map_err(|e| AlbumError::load_failure(&reference, e.to_string()))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(AlbumError::load_failure(
                    &reference,
                    format!("http status {status}"),
                ));
            }
            let body = resp
                .bytes()
                .await
                .map_err(|e| AlbumError::load_failure(&reference, e.to_string()))?;
            Ok(body.to_vec())
        }
    }
}

/// Resolve and decode one source. Decoding runs on the blocking pool.
#[tracing::instrument(skip(http), fields(source = %source.reference()))]
pub async fn load_source(source: &ImageSource, http: &reqwest::Client) -> AlbumResult<DecodedImage> {
    let reference = source.reference();
    let bytes = read_source_bytes(source, http).await?;

    let decoded = tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| AlbumError::load_failure(&reference, format!("decode task failed: {e}")))?;

    decoded.map_err(|e| match e {
        AlbumError::LoadFailure { .. } => e,
        other => AlbumError::load_failure(&reference, format!("{other:#}")),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
