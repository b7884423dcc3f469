use std::{cell::RefCell, io::Cursor};

use super::*;

fn png_photo() -> SourcePhoto {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    SourcePhoto::from_bytes(buf).unwrap()
}

/// Fails any prompt containing `fail_marker`, records every prompt it sees.
struct ScriptedService {
    fail_marker: &'static str,
    prompts: RefCell<Vec<String>>,
}

impl ImageService for ScriptedService {
    async fn generate(
        &self,
        _source: &SourcePhoto,
        prompt: &str,
    ) -> Result<ImageRef, GenerationFailure> {
        self.prompts.borrow_mut().push(prompt.to_string());
        if prompt.contains(self.fail_marker) {
            Err(GenerationFailure::new("blocked"))
        } else {
            Ok(ImageRef::from_bytes(prompt.as_bytes().to_vec()))
        }
    }
}

#[test]
fn source_photo_sniffs_mime_type() {
    assert_eq!(png_photo().mime_type, "image/png");
    assert!(SourcePhoto::from_bytes(b"plain text".to_vec()).is_err());
}

#[tokio::test]
async fn primary_prompt_success_skips_fallback() {
    let service = ScriptedService {
        fail_marker: "<never>",
        prompts: RefCell::new(Vec::new()),
    };
    let generator = PromptedGenerator::new(service, png_photo());
    generator.generate(&Label::from("1960s")).await.unwrap();
    assert_eq!(generator.service.prompts.borrow().len(), 1);
}

#[tokio::test]
async fn failed_primary_prompt_falls_back_once() {
    let service = ScriptedService {
        fail_marker: "Reimagine",
        prompts: RefCell::new(Vec::new()),
    };
    let generator = PromptedGenerator::new(service, png_photo());
    let out = generator.generate(&Label::from("1980s")).await.unwrap();
    assert!(matches!(out, ImageRef::Bytes(_)));

    let prompts = generator.service.prompts.borrow();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("1980s"));
}

#[tokio::test]
async fn fallback_failure_is_reported() {
    let service = ScriptedService {
        fail_marker: "",
        prompts: RefCell::new(Vec::new()),
    };
    let generator = PromptedGenerator::new(service, png_photo());
    let err = generator.generate(&Label::from("1990s")).await.unwrap_err();
    assert_eq!(err.message, "blocked");
}

#[tokio::test]
async fn closures_are_generators() {
    let generator = generator_fn(|label: Label| async move {
        Ok(ImageRef::Url(format!("https://img.example/{label}.jpg")))
    });
    let out = generator.generate(&Label::from("1950s")).await.unwrap();
    assert_eq!(out, ImageRef::Url("https://img.example/1950s.jpg".to_string()));
}
