pub(crate) mod cpu;
pub(crate) mod encode;
pub(crate) mod layout;
pub(crate) mod plan;
pub(crate) mod text;

use rand::Rng;

use crate::{
    assets::decode::DecodedImage,
    assets::fonts::FontBook,
    assets::source::load_source,
    compositor::cpu::CpuPageRenderer,
    compositor::encode::{EncodedImage, encode_jpeg},
    compositor::layout::PageLayout,
    compositor::plan::{ImageDims, PagePlan, plan_page},
    foundation::error::{AlbumError, AlbumResult},
    session::CompositionInput,
};

/// Builds the printable album page from completed results.
///
/// Independent of the scheduler: it only sees a `label -> image` mapping.
#[derive(Clone, Debug)]
pub struct Compositor {
    layout: PageLayout,
    fonts: FontBook,
    http: reqwest::Client,
}

impl Compositor {
    /// Fonts are resolved before a compositor exists, so drawing never waits on them.
    pub fn new(layout: PageLayout, fonts: FontBook) -> AlbumResult<Self> {
        layout.validate()?;
        Ok(Self {
            layout,
            fonts,
            http: reqwest::Client::new(),
        })
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Load every source concurrently. The first failure aborts the page.
    pub async fn load_images(&self, images: &CompositionInput) -> AlbumResult<Vec<DecodedImage>> {
        futures::future::try_join_all(
            images
                .iter()
                .map(|(_, source)| load_source(source, &self.http)),
        )
        .await
    }

    /// Plan a page for already decoded images, in mapping order.
    pub fn plan<R>(
        &self,
        images: &CompositionInput,
        decoded: &[DecodedImage],
        rng: &mut R,
    ) -> AlbumResult<PagePlan>
    where
        R: Rng + ?Sized,
    {
        if images.len() != decoded.len() {
            return Err(AlbumError::validation(format!(
                "{} labels but {} decoded images",
                images.len(),
                decoded.len()
            )));
        }
        let entries: Vec<_> = images
            .keys()
            .zip(decoded)
            .map(|(label, d)| {
                (
                    label.clone(),
                    ImageDims {
                        width: d.width,
                        height: d.height,
                    },
                )
            })
            .collect();
        plan_page(&self.layout, &entries, rng)
    }

    /// Load, lay out, render and encode one album page.
    #[tracing::instrument(skip_all, fields(images = images.len()))]
    pub async fn compose_page<R>(
        &self,
        images: &CompositionInput,
        rng: &mut R,
    ) -> AlbumResult<EncodedImage>
    where
        R: Rng + ?Sized,
    {
        if images.is_empty() {
            return Err(AlbumError::validation(
                "cannot compose a page from an empty image mapping",
            ));
        }

        let decoded = self.load_images(images).await?;
        let plan = self.plan(images, &decoded, rng)?;

        let fonts = self.fonts.clone();
        let quality = self.layout.jpeg_quality_percent();
        let encoded = tokio::task::spawn_blocking(move || {
            let page = CpuPageRenderer::new(&fonts).render(&plan, &decoded)?;
            encode_jpeg(&page, quality)
        })
        .await
        .map_err(|e| AlbumError::environment(format!("render task failed: {e}")))??;

        tracing::info!(
            width = encoded.width,
            height = encoded.height,
            bytes = encoded.bytes.len(),
            "album page composed"
        );
        Ok(encoded)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/mod.rs"]
mod tests;
