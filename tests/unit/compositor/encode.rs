use super::*;

fn solid_page(width: u32, height: u32, premul: [u8; 4]) -> PageRGBA {
    PageRGBA {
        width,
        height,
        data: premul
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect(),
    }
}

#[test]
fn jpeg_round_trips_dimensions_and_color() {
    let page = solid_page(16, 8, [200, 100, 50, 255]);
    let encoded = encode_jpeg(&page, 92).unwrap();

    assert_eq!(encoded.format, image::ImageFormat::Jpeg);
    assert_eq!(encoded.mime_type(), "image/jpeg");
    assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);

    let decoded = image::load_from_memory(&encoded.bytes).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (16, 8));
    let px = decoded.get_pixel(8, 4).0;
    for (got, want) in px.iter().zip([200u8, 100, 50]) {
        assert!((i16::from(*got) - i16::from(want)).abs() <= 6, "{px:?}");
    }
}

#[test]
fn buffer_length_mismatch_is_an_encode_error() {
    let mut page = solid_page(4, 4, [0, 0, 0, 255]);
    page.data.pop();
    let err = encode_jpeg(&page, 92).unwrap_err();
    assert!(matches!(err, AlbumError::Encode(_)), "{err:?}");
}

#[test]
fn unpremultiply_before_dropping_alpha() {
    let rgb = premul_rgba_to_rgb(&[64, 32, 0, 128, 9, 9, 9, 0]);
    assert_eq!(rgb, vec![128, 64, 0, 0, 0, 0]);
}

#[tokio::test]
async fn write_to_creates_parent_dirs() {
    let dir = std::env::temp_dir().join(format!("eraframe_encode_{}", std::process::id()));
    let path = dir.join("nested").join("album.jpg");
    let encoded = encode_jpeg(&solid_page(2, 2, [0, 0, 0, 255]), 80).unwrap();

    encoded.write_to(&path).await.unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), encoded.bytes);
    let _ = std::fs::remove_dir_all(&dir);
}
