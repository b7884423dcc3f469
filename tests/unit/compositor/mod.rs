use std::{io::Cursor, sync::Arc};

use rand::SeedableRng;

use super::*;
use crate::{
    assets::fonts::LoadedFont,
    foundation::core::{ImageSource, Label},
};

fn png(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn placeholder_fonts() -> FontBook {
    let f = LoadedFont {
        family: "placeholder".to_string(),
        bytes: Arc::new(Vec::new()),
        index: 0,
    };
    FontBook::from_fonts(f.clone(), f)
}

fn any_system_fonts() -> Option<FontBook> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    let id = db.faces().next()?.id;
    let font = db.with_face_data(id, |data, index| LoadedFont {
        family: "system".to_string(),
        bytes: Arc::new(data.to_vec()),
        index,
    })?;
    Some(FontBook::from_fonts(font.clone(), font))
}

fn input(items: &[(&str, ImageSource)]) -> CompositionInput {
    items
        .iter()
        .map(|(l, s)| (Label::from(*l), s.clone()))
        .collect()
}

fn rng() -> rand::rngs::StdRng {
    rand::rngs::StdRng::seed_from_u64(42)
}

#[tokio::test]
async fn empty_mapping_is_rejected() {
    let compositor = Compositor::new(PageLayout::default(), placeholder_fonts()).unwrap();
    let err = compositor
        .compose_page(&CompositionInput::new(), &mut rng())
        .await
        .unwrap_err();
    assert!(matches!(err, AlbumError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn unreadable_source_fails_the_page() {
    let compositor = Compositor::new(PageLayout::default(), placeholder_fonts()).unwrap();
    let images = input(&[
        ("1950s", ImageSource::from_bytes(png(4, 4, [255, 0, 0, 255]))),
        ("1960s", ImageSource::Path("/nonexistent/eraframe/1960s.png".into())),
    ]);
    let err = compositor
        .compose_page(&images, &mut rng())
        .await
        .unwrap_err();
    match err {
        AlbumError::LoadFailure { source_ref, .. } => {
            assert!(source_ref.contains("1960s"), "{source_ref}")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_bytes_fail_the_page() {
    let compositor = Compositor::new(PageLayout::default(), placeholder_fonts()).unwrap();
    let images = input(&[("1950s", ImageSource::from_bytes(b"garbage".to_vec()))]);
    let err = compositor
        .compose_page(&images, &mut rng())
        .await
        .unwrap_err();
    assert!(matches!(err, AlbumError::LoadFailure { .. }), "{err:?}");
}

#[tokio::test]
async fn plan_has_one_cell_per_loaded_image() {
    let compositor = Compositor::new(PageLayout::default(), placeholder_fonts()).unwrap();
    let images = input(&[
        ("1950s", ImageSource::from_bytes(png(6, 4, [255, 0, 0, 255]))),
        ("1980s", ImageSource::from_bytes(png(4, 6, [0, 255, 0, 255]))),
    ]);
    let decoded = compositor.load_images(&images).await.unwrap();
    let plan = compositor.plan(&images, &decoded, &mut rng()).unwrap();

    let indices: Vec<_> = plan.cells().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(plan.cells().nth(1).unwrap().label, Label::from("1980s"));
}

#[test]
fn invalid_layout_is_rejected_up_front() {
    let layout = PageLayout {
        jpeg_quality: 2.0,
        ..PageLayout::default()
    };
    assert!(Compositor::new(layout, placeholder_fonts()).is_err());
}

#[tokio::test]
async fn composes_a_full_size_jpeg() {
    let Some(fonts) = any_system_fonts() else {
        return;
    };
    let compositor = Compositor::new(PageLayout::default(), fonts).unwrap();
    let images = input(&[
        ("1950s", ImageSource::from_bytes(png(32, 24, [200, 40, 40, 255]))),
        ("1960s", ImageSource::from_bytes(png(24, 32, [40, 40, 200, 255]))),
    ]);

    let page = compositor.compose_page(&images, &mut rng()).await.unwrap();
    assert_eq!((page.width, page.height), (2480, 3508));
    assert_eq!(page.format, image::ImageFormat::Jpeg);

    let decoded = image::load_from_memory(&page.bytes).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (2480, 3508));
    assert_near_background(decoded.get_pixel(5, 5).0);
    assert_near_background(decoded.get_pixel(2474, 3502).0);
}

fn assert_near_background(px: [u8; 3]) {
    for (got, want) in px.iter().zip([0xfd_u8, 0xf5, 0xe6]) {
        assert!((i16::from(*got) - i16::from(want)).abs() <= 6, "{px:?}");
    }
}
