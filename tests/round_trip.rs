use futures::executor::block_on;
use qr_styling::options::{DotType, DotsOptions, ErrorCorrectionLevel, QrOptions, ShapeType};
use qr_styling::{decode, generate, DecodeOptions, Extension, InversionAttempts, Options};

fn styled(data: &str, dot_type: DotType) -> Options {
    Options {
        margin: Some(20.0),
        dots_options: Some(DotsOptions {
            dot_type: Some(dot_type),
            ..Default::default()
        }),
        qr_options: Some(QrOptions {
            error_correction_level: Some(ErrorCorrectionLevel::H),
            ..Default::default()
        }),
        ..Options::new(data)
    }
}

fn png_pixels(options: Options) -> (Vec<u8>, u32, u32) {
    let qr_code = generate(options, None).unwrap();
    let png = block_on(qr_code.get_raw_data(Extension::Png)).unwrap();
    let image = image::load_from_memory(&png).unwrap().to_rgba8();
    let (width, height) = image.dimensions();
    (image.into_raw(), width, height)
}

#[test]
fn exported_png_decodes_back_to_data() {
    let (pixels, width, height) = png_pixels(styled("https://example.com/a", DotType::Square));
    let result = decode(&pixels, width, height, None).expect("code should be readable");
    assert_eq!(result.data, "https://example.com/a");
    assert_eq!(result.binary_data, b"https://example.com/a".to_vec());
    assert!(result.location.top_left_corner.x < result.location.top_right_corner.x);
    assert!(result.location.top_left_corner.y < result.location.bottom_left_corner.y);
}

#[test]
fn rounded_dot_styles_stay_readable() {
    for dot_type in [DotType::Rounded, DotType::Dots, DotType::ExtraRounded] {
        let (pixels, width, height) = png_pixels(styled("styled dots", dot_type));
        let result = decode(&pixels, width, height, None);
        assert_eq!(
            result.map(|result| result.data),
            Some("styled dots".to_owned()),
            "{:?}",
            dot_type
        );
    }
}

#[test]
fn light_on_dark_needs_inversion() {
    let (mut pixels, width, height) = png_pixels(styled("inverted", DotType::Square));
    for pixel in pixels.chunks_exact_mut(4) {
        for channel in &mut pixel[..3] {
            *channel = 255 - *channel;
        }
    }

    let strategy = |inversion_attempts| {
        Some(DecodeOptions {
            inversion_attempts: Some(inversion_attempts),
        })
    };
    assert!(decode(&pixels, width, height, strategy(InversionAttempts::DontInvert)).is_none());
    assert!(decode(&pixels, width, height, strategy(InversionAttempts::OnlyInvert)).is_some());
    assert!(decode(&pixels, width, height, None).is_some());
}

#[test]
fn circle_shape_exports_at_requested_size() {
    let options = Options {
        width: Some(240),
        height: Some(240),
        shape: Some(ShapeType::Circle),
        ..styled("round", DotType::Classy)
    };
    let (_, width, height) = png_pixels(options);
    assert_eq!((width, height), (240, 240));
}
