//! End-to-end tests over the bundled templates

use std::path::PathBuf;

use propkit::assets::FileAssets;
use propkit::compositor::FileTemplates;
use propkit::export::{CanvasRasterizer, FileSink, SummaryPacker};
use propkit::sync::{Phase, Pipeline};
use propkit::{FormSnapshot, StudioConfig, TemplateVariant, SUMMARY_FILENAME};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn out_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("propkit-it-{}", name));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn pipeline(out: &PathBuf, assets_base: &PathBuf) -> Pipeline {
    Pipeline::new(
        StudioConfig {
            compose_wait_ms: 200,
            export_wait_ms: 200,
            ..Default::default()
        },
        Box::new(FileTemplates::new(repo_root())),
        Box::new(FileAssets::new(assets_base)),
        Box::new(CanvasRasterizer),
        Box::new(FileSink::new(out)),
        Box::new(SummaryPacker),
    )
}

fn showhouse_form() -> FormSnapshot {
    FormSnapshot {
        broker: "alex-krause".to_string(),
        headline: "SHOWHOUSE".to_string(),
        city: "Sandton".to_string(),
        suburb: "Morningside".to_string(),
        tag1: "ON AUCTION".to_string(),
        tag2: "NO RESERVE".to_string(),
        date: "2025-03-15".to_string(),
        time: "14:00".to_string(),
        address: "12 Rivonia Road".to_string(),
        feat1: "4 Bedrooms".to_string(),
        feat2: "Double Garage".to_string(),
        feat3: "Heated Pool".to_string(),
        ..Default::default()
    }
}

fn jpeg_photo(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 255])
    });
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("encode fixture");
    out.into_inner()
}

#[test]
fn social_generates_ready_without_a_photo() {
    let out = out_dir("social-nophoto");
    let mut p = pipeline(&out, &repo_root());
    let report = p.generate(TemplateVariant::Social, &showhouse_form()).unwrap();
    assert_eq!(report.phase, Phase::Ready);
    assert!(report.warning.is_none());
    assert!(report.canvas_digest.is_none());

    let inst = p.instance(TemplateVariant::Social).unwrap();
    assert!(inst.html.contains("SHOWHOUSE"));
    assert!(inst.html.contains("ON AUCTION IN Sandton"));
    assert!(inst.html.contains("Saturday, 15 March 2025 @ 14:00"));
    // Every token in the bundled templates is a known field
    assert!(!inst.html.contains("{{"));

    // The contact block carries the resolved broker, name uppercased
    let block = inst.dom.find_by_class("textbox_Contact_Details").unwrap();
    let texts: Vec<&str> = inst
        .dom
        .elements
        .iter()
        .filter(|e| e.tag == "span" && e.parent == Some(block))
        .map(|e| e.text.as_str())
        .collect();
    assert_eq!(texts, ["ALEX KRAUSE", "078 549 2029", "alex@auctioninc.co.za"]);
}

#[test]
fn social_export_writes_a_double_scale_jpeg() {
    let out = out_dir("social-export");
    let mut p = pipeline(&out, &repo_root());
    let receipt = p.export(TemplateVariant::Social, &showhouse_form()).unwrap();
    assert_eq!(receipt.filename, "social.jpg");

    let bytes = std::fs::read(out.join("social.jpg")).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    // Container is 1130 x 1080 and exports render at 2x
    assert_eq!((decoded.width(), decoded.height()), (2260, 2160));
}

#[test]
fn newsletter_contact_block_carries_the_resolved_broker() {
    let out = out_dir("newsletter-broker");
    let mut p = pipeline(&out, &repo_root());
    p.generate(TemplateVariant::Newsletter, &showhouse_form()).unwrap();

    let inst = p.instance(TemplateVariant::Newsletter).unwrap();
    let block = inst.dom.find_by_class("textbox_Contact_Details").unwrap();
    let texts: Vec<&str> = inst
        .dom
        .elements
        .iter()
        .filter(|e| e.tag == "span" && e.parent == Some(block))
        .map(|e| e.text.as_str())
        .collect();
    assert_eq!(texts[0], "ALEX KRAUSE");
    assert!(texts[1].starts_with("0"));
    assert!(texts[2].contains('@'));
}

#[test]
fn photo_composites_deterministically() {
    let assets = out_dir("assets-base");
    std::fs::create_dir_all(assets.join("assets")).unwrap();
    // A real overlay bitmap so the social draw path runs end to end
    let tag = image::RgbaImage::from_pixel(49, 46, image::Rgba([200, 20, 20, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(tag)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    std::fs::write(assets.join("assets/red-tag.png"), buf.into_inner()).unwrap();

    let out = out_dir("photo-composite");
    let mut form = showhouse_form();
    form.photo = Some(jpeg_photo(1600, 900));

    let mut p = pipeline(&out, &assets);
    let first = p.generate(TemplateVariant::Social, &form).unwrap();
    let digest = first.canvas_digest.expect("surface drawn");

    let second = p.generate(TemplateVariant::Social, &form).unwrap();
    assert_eq!(second.canvas_digest.as_deref(), Some(digest.as_str()));

    let inst = p.instance(TemplateVariant::Social).unwrap();
    let canvas = inst.canvas.as_ref().unwrap();
    assert_eq!((canvas.width(), canvas.height()), (1130, 700));
    assert!(!canvas.is_blank());
}

#[test]
fn oversized_photo_degrades_with_one_warning() {
    let out = out_dir("oversized");
    let mut form = showhouse_form();
    // Valid JPEG, but pushed past the ceiling with padding
    let mut bytes = jpeg_photo(64, 64);
    bytes.resize(9 * 1024 * 1024, 0);
    form.photo = Some(bytes);

    let mut p = pipeline(&out, &repo_root());
    let report = p.generate(TemplateVariant::Social, &form).unwrap();
    assert_eq!(report.phase, Phase::Ready);
    assert_eq!(
        report.warning.as_deref(),
        Some("Please upload an image under 8MB.")
    );
    assert!(report.canvas_digest.is_none());
}

#[test]
fn flyer_text_fit_touches_the_enumerated_boxes() {
    let out = out_dir("flyer-fit");
    let mut p = pipeline(&out, &repo_root());
    let report = p.generate(TemplateVariant::Flyer, &showhouse_form()).unwrap();
    assert!(report.boxes_sized.contains(&"textbox_Feature_1".to_string()));
    assert!(report.boxes_sized.contains(&"DATE".to_string()));
    assert!(report.boxes_sized.contains(&"ADDRESS".to_string()));

    let inst = p.instance(TemplateVariant::Flyer).unwrap();
    let date = inst.dom.find_by_id("DATE").unwrap();
    let span = inst.dom.descendant_by_tag(date, "span").unwrap();
    let fs = inst.dom.elements[span].style_value("font-size").unwrap();
    assert!(fs.ends_with("px"));
}

#[test]
fn summary_document_has_the_fixed_label_order() {
    let out = out_dir("summary");
    let mut p = pipeline(&out, &repo_root());
    let receipt = p.export_summary(&showhouse_form()).unwrap();
    assert_eq!(receipt.filename, SUMMARY_FILENAME);

    let text = std::fs::read_to_string(out.join(SUMMARY_FILENAME)).unwrap();
    let labels: Vec<&str> = text
        .lines()
        .filter(|l| !l.is_empty())
        .map(|l| l.split(':').next().unwrap())
        .collect();
    assert_eq!(
        labels,
        [
            "Broker", "Headline", "City", "Suburb", "Tagline 1", "Tagline 2",
            "Date & Time", "Feature 1", "Feature 2", "Feature 3"
        ]
    );
    assert!(text.contains("Date & Time: Saturday, 15 March 2025 @ 14:00"));
}
