use std::{future::Future, path::Path, sync::Arc};

use crate::{
    foundation::core::{ImageRef, Label},
    foundation::error::{AlbumError, AlbumResult},
    generation::prompt::{fallback_prompt_for, prompt_for},
    generation::state::GenerationFailure,
};

/// Produces one image for a label. May fail; failures become per-item state.
#[allow(async_fn_in_trait)]
pub trait Generator {
    async fn generate(&self, label: &Label) -> Result<ImageRef, GenerationFailure>;
}

/// [`Generator`] backed by a closure taking the label by value.
pub struct FnGenerator<F>(F);

/// Wrap a closure `Fn(Label) -> impl Future<Output = Result<ImageRef, GenerationFailure>>`.
pub fn generator_fn<F, Fut>(f: F) -> FnGenerator<F>
where
    F: Fn(Label) -> Fut,
    Fut: Future<Output = Result<ImageRef, GenerationFailure>>,
{
    FnGenerator(f)
}

impl<F, Fut> Generator for FnGenerator<F>
where
    F: Fn(Label) -> Fut,
    Fut: Future<Output = Result<ImageRef, GenerationFailure>>,
{
    async fn generate(&self, label: &Label) -> Result<ImageRef, GenerationFailure> {
        (self.0)(label.clone()).await
    }
}

/// The photo every decade is generated from.
#[derive(Clone)]
pub struct SourcePhoto {
    pub bytes: Arc<[u8]>,
    pub mime_type: String,
}

impl std::fmt::Debug for SourcePhoto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourcePhoto")
            .field("bytes_len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

impl SourcePhoto {
    /// Sniff the encoded format; anything the `image` crate cannot identify is rejected.
    pub fn from_bytes(bytes: Vec<u8>) -> AlbumResult<Self> {
        let format = image::guess_format(&bytes)
            .map_err(|e| AlbumError::validation(format!("unrecognized photo format: {e}")))?;
        Ok(Self {
            bytes: Arc::from(bytes),
            mime_type: format.to_mime_type().to_string(),
        })
    }

    pub async fn read(path: &Path) -> AlbumResult<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AlbumError::validation(format!("read photo '{}': {e}", path.display()))
        })?;
        Self::from_bytes(bytes)
    }
}

/// The remote image-generation call: one source image plus an instruction in,
/// one image out.
#[allow(async_fn_in_trait)]
pub trait ImageService {
    async fn generate(
        &self,
        source: &SourcePhoto,
        prompt: &str,
    ) -> Result<ImageRef, GenerationFailure>;
}

/// Adapts an [`ImageService`] to a per-label [`Generator`] using the decade prompts.
///
/// When the primary instruction fails, one attempt is made with the fallback
/// wording; the second failure is the one reported.
pub struct PromptedGenerator<S> {
    service: S,
    source: SourcePhoto,
}

impl<S: ImageService> PromptedGenerator<S> {
    pub fn new(service: S, source: SourcePhoto) -> Self {
        Self { service, source }
    }

    pub fn source(&self) -> &SourcePhoto {
        &self.source
    }
}

impl<S: ImageService> Generator for PromptedGenerator<S> {
    async fn generate(&self, label: &Label) -> Result<ImageRef, GenerationFailure> {
        match self
            .service
            .generate(&self.source, &prompt_for(label))
            .await
        {
            Ok(image) => Ok(image),
            Err(first) => {
                tracing::debug!(%label, error = %first, "primary prompt failed; trying fallback");
                self.service
                    .generate(&self.source, &fallback_prompt_for(label))
                    .await
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generation/generator.rs"]
mod tests;
