//! End-to-end image extraction from small in-memory PDFs.

mod common;

use common::{PdfBuilder, deflate, predict, read_png};
use pdfraster_core::api::{extract_all, scan_images};
use pdfraster_core::document::page::images_on_page;
use pdfraster_core::error::{PdfError, Result};
use pdfraster_core::image::{ImageExtractor, JpegCodec};
use pdfraster_core::{ExtractOptions, ObjectCatalog};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Writes a fixed PNG instead of decoding anything.
#[derive(Default)]
struct StubCodec {
    calls: AtomicUsize,
    masked_calls: AtomicUsize,
}

impl JpegCodec for StubCodec {
    fn compose(&self, jpeg: &Path, mask: Option<&Path>, output: &Path) -> Result<()> {
        assert!(jpeg.exists());
        self.calls.fetch_add(1, Ordering::SeqCst);
        if mask.is_some_and(Path::exists) {
            self.masked_calls.fetch_add(1, Ordering::SeqCst);
        }
        fs::write(output, b"\x89PNG\r\n\x1a\n")?;
        Ok(())
    }
}

const PAGE: &str = "<< /Type /Page /Resources << /XObject << /Im0 7 0 R >> >> /Contents 9 0 R >>";
const GRAY_IMAGE: &str =
    "/Subtype /Image /Width 2 /Height 1 /BitsPerComponent 8 /ColorSpace /DeviceGray /Filter /FlateDecode";

fn scenario_a() -> PdfBuilder {
    PdfBuilder::new()
        .object(1, PAGE)
        .stream(7, GRAY_IMAGE, &deflate(&[10, 20]))
        .stream(9, "", b"q 2 0 0 1 0 0 cm /Im0 Do Q")
}

fn extract(pdf: Vec<u8>, objid: u32, output: &Path) -> Result<bool> {
    let catalog = ObjectCatalog::build(pdf);
    let options = ExtractOptions::default();
    let codec = StubCodec::default();
    Ok(ImageExtractor::new(&catalog, &options, &codec)
        .extract(objid, output)?
        .is_some())
}

#[test]
fn test_scenario_a_gray_flate_image() {
    let catalog = ObjectCatalog::build(scenario_a().build());
    assert_eq!(
        images_on_page(&catalog, 1, 1 << 20).unwrap(),
        vec![("Im0".to_string(), 7)]
    );

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("a.png");
    assert!(extract(scenario_a().build(), 7, &output).unwrap());

    let png = read_png(&fs::read(&output).unwrap());
    assert_eq!((png.width, png.height), (2, 1));
    assert_eq!(png.bit_depth, 8);
    assert_eq!(png.color_type, 0);
    assert_eq!(png.chunk_types, vec!["IHDR", "IDAT", "IEND"]);
    assert_eq!(png.pixels, vec![10, 20]);
}

#[test]
fn test_scenario_b_soft_mask_becomes_alpha() {
    let pdf = PdfBuilder::new()
        .object(1, PAGE)
        .stream(7, &format!("{GRAY_IMAGE} /SMask 8 0 R"), &deflate(&[10, 20]))
        .stream(8, GRAY_IMAGE, &deflate(&[255, 128]))
        .stream(9, "", b"/Im0 Do")
        .build();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("b.png");
    assert!(extract(pdf, 7, &output).unwrap());

    let png = read_png(&fs::read(&output).unwrap());
    assert_eq!(png.color_type, 4);
    assert_eq!(png.pixels, vec![10, 255, 20, 128]);
}

#[test]
fn test_scenario_c_mask_size_mismatch() {
    let tall_mask = GRAY_IMAGE.replace("/Height 1", "/Height 2");
    let pdf = PdfBuilder::new()
        .object(1, PAGE)
        .stream(7, &format!("{GRAY_IMAGE} /SMask 8 0 R"), &deflate(&[10, 20]))
        .stream(8, &tall_mask, &deflate(&[255, 128, 0, 0]))
        .build();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("c.png");
    let err = extract(pdf, 7, &output).unwrap_err();
    assert!(matches!(err, PdfError::DimensionMismatch { .. }));
    assert!(!output.exists());
}

#[test]
fn test_scenario_d_missing_width_is_skipped() {
    let pdf = PdfBuilder::new()
        .stream(
            7,
            "/Subtype /Image /Height 1 /BitsPerComponent 8 /Filter /FlateDecode",
            &deflate(&[1]),
        )
        .build();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("d.png");
    assert!(!extract(pdf, 7, &output).unwrap());
    assert!(!output.exists());
}

#[test]
fn test_scenario_e_flate_then_dct_is_unsupported() {
    let pdf = PdfBuilder::new()
        .stream(
            7,
            "/Subtype /Image /Width 2 /Height 1 /BitsPerComponent 8 /Filter [/FlateDecode /DCTDecode]",
            &deflate(b"\xff\xd8"),
        )
        .build();
    let dir = tempfile::tempdir().unwrap();
    let err = extract(pdf, 7, &dir.path().join("e.png")).unwrap_err();
    match err {
        PdfError::UnsupportedFilter(names) => assert_eq!(names, vec!["FlateDecode", "DCTDecode"]),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_overflowing_predictor_columns_are_rejected() {
    let pdf = PdfBuilder::new()
        .stream(
            7,
            "/Subtype /Image /Width 2 /Height 1 /BitsPerComponent 8 /ColorSpace /DeviceRGB \
             /Filter /FlateDecode /DecodeParms << /Predictor 12 /Colors 3 /Columns 9223372036854775807 >>",
            &deflate(&[0, 1, 2, 3, 4, 5, 6]),
        )
        .build();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cols.png");
    let err = extract(pdf, 7, &output).unwrap_err();
    assert!(matches!(err, PdfError::InvalidValue { .. }), "{err:?}");
    assert!(!output.exists());
}

#[test]
fn test_huge_geometry_is_a_dimension_mismatch() {
    let pdf = PdfBuilder::new()
        .stream(
            7,
            "/Subtype /Image /Width 4294967295 /Height 4294967295 /BitsPerComponent 8 \
             /ColorSpace /DeviceRGB /Filter /FlateDecode",
            &deflate(&[1, 2, 3]),
        )
        .build();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("huge.png");
    let err = extract(pdf, 7, &output).unwrap_err();
    assert!(matches!(err, PdfError::DimensionMismatch { .. }), "{err:?}");
    assert!(!output.exists());
}

#[test]
fn test_rgb_image_with_png_predictor_and_referenced_parms() {
    let raster: Vec<u8> = (0..2 * 3 * 3).map(|i| (i * 13) as u8).collect();
    let encoded = predict(&raster, 3, 2, &[1, 2, 4]);
    let pdf = PdfBuilder::new()
        .object(5, "<< /Predictor 15 /Colors 3 /Columns 2 >>")
        .object(6, "[/ICCBased 11 0 R]")
        .stream(11, "/N 3", b"icc")
        .stream(
            7,
            "/Subtype /Image /Width 2 /Height 3 /BitsPerComponent 8 /ColorSpace 6 0 R \
             /Filter /FlateDecode /DecodeParms 5 0 R",
            &deflate(&encoded),
        )
        .build();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("rgb.png");
    assert!(extract(pdf, 7, &output).unwrap());
    let png = read_png(&fs::read(&output).unwrap());
    assert_eq!(png.color_type, 2);
    assert_eq!(png.pixels, raster);
}

#[test]
fn test_dct_image_is_delegated_with_mask() {
    let pdf = PdfBuilder::new()
        .stream(
            7,
            "/Subtype /Image /Width 2 /Height 1 /BitsPerComponent 8 /ColorSpace /DeviceRGB \
             /Filter /DCTDecode /SMask 8 0 R",
            b"\xff\xd8\xff\xe0fakejpeg\xff\xd9",
        )
        .stream(8, GRAY_IMAGE, &deflate(&[1, 2]))
        .build();
    let catalog = ObjectCatalog::build(pdf);
    let options = ExtractOptions::default();
    let codec = StubCodec::default();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("nested").join("jpeg.png");
    let desc = ImageExtractor::new(&catalog, &options, &codec)
        .extract(7, &output)
        .unwrap()
        .unwrap();
    assert_eq!(desc.components, 3);
    assert_eq!(codec.calls.load(Ordering::SeqCst), 1);
    assert_eq!(codec.masked_calls.load(Ordering::SeqCst), 1);
    assert!(output.exists());
}

#[test]
fn test_dct_mask_mismatch_never_reaches_codec() {
    let pdf = PdfBuilder::new()
        .stream(
            7,
            "/Subtype /Image /Width 4 /Height 4 /BitsPerComponent 8 /Filter /DCTDecode /Mask 8 0 R",
            b"\xff\xd8",
        )
        .stream(8, GRAY_IMAGE, &deflate(&[1, 2]))
        .build();
    let catalog = ObjectCatalog::build(pdf);
    let options = ExtractOptions::default();
    let codec = StubCodec::default();
    let dir = tempfile::tempdir().unwrap();
    let err = ImageExtractor::new(&catalog, &options, &codec)
        .extract(7, &dir.path().join("x.png"))
        .unwrap_err();
    assert!(matches!(err, PdfError::DimensionMismatch { .. }));
    assert_eq!(codec.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_extract_all_over_several_pages() {
    let pdf = PdfBuilder::new()
        .object(2, "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /Resources << /XObject << /Im0 7 0 R /Im1 8 0 R >> >> >>")
        .object(3, "<< /Type /Page /Parent 2 0 R /Contents [10 0 R 11 0 R] >>")
        .object(4, "<< /Type /Page /Parent 2 0 R /Contents 12 0 R >>")
        .stream(7, GRAY_IMAGE, &deflate(&[1, 2]))
        .stream(8, GRAY_IMAGE, &deflate(&[3, 4]))
        .stream(10, "", b"/Im1 Do")
        .stream(11, "/Filter /FlateDecode", &deflate(b"/Im0 Do"))
        .stream(12, "", b"/Im0 Do")
        .build();
    let catalog = ObjectCatalog::build(pdf);
    let options = ExtractOptions::default();

    let pages = scan_images(&catalog, &options).unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].images[0].objid, 8);
    assert_eq!(pages[0].images[1].objid, 7);

    let dir = tempfile::tempdir().unwrap();
    let out = extract_all(&catalog, dir.path(), &options, &StubCodec::default()).unwrap();
    let summary: Vec<(usize, usize, u32)> = out.iter().map(|e| (e.page, e.index, e.objid)).collect();
    assert_eq!(summary, vec![(1, 1, 8), (1, 2, 7), (2, 1, 7)]);
    let second = read_png(&fs::read(dir.path().join("p1_1.png")).unwrap());
    assert_eq!(second.pixels, vec![3, 4]);

    let json = serde_json::to_value(&out[0]).unwrap();
    assert_eq!(json["name"], "Im1");
    assert_eq!(json["width"], 2);
}

#[test]
fn test_extract_all_fails_fast() {
    let pdf = PdfBuilder::new()
        .object(1, PAGE)
        .stream(
            7,
            "/Subtype /Image /Width 2 /Height 1 /BitsPerComponent 8 /Filter /LZWDecode",
            b"\x80",
        )
        .stream(9, "", b"/Im0 Do")
        .build();
    let catalog = ObjectCatalog::build(pdf);
    let dir = tempfile::tempdir().unwrap();
    let err = extract_all(
        &catalog,
        dir.path(),
        &ExtractOptions::default(),
        &StubCodec::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PdfError::UnsupportedFilter(_)));
}
