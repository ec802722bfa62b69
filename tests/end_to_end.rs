//! End-to-end flow: parse operands, build the step, update an archive, read it back.

use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::sync::{Arc, Mutex};

use image::{ImageBuffer, ImageFormat, Rgb};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use cbz_meta::{
    CbzError, ComicInfo, MutationStep, UpdateOptions, parse_assignments, read_comic_info,
    update_archives,
};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn jpeg_page() -> Vec<u8> {
    let image = ImageBuffer::from_pixel(24, 32, Rgb([240u8, 240, 230]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Jpeg).unwrap();
    out.into_inner()
}

fn entry_bytes(archive: &mut ZipArchive<File>, name: &str) -> Vec<u8> {
    let mut entry = archive.by_name(name).unwrap();
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).unwrap();
    bytes
}

#[test]
fn set_validate_render_on_fresh_archive() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("issue-1.cbz");
    let page = jpeg_page();
    {
        let mut writer = ZipWriter::new(File::create(&path).unwrap());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file("page1.jpg", options).unwrap();
        writer.write_all(&page).unwrap();
        writer.finish().unwrap();
    }

    let assignments = parse_assignments(["Series=Foo", "Volume=1"]).unwrap();
    let preview = Captured::default();
    let mut steps = MutationStep::from_assignments(assignments);
    steps.push(MutationStep::validate());
    steps.push(MutationStep::render(preview.clone()));
    let step = MutationStep::join(steps);

    let summary = update_archives([&path], &step, &UpdateOptions::default()).unwrap();
    assert_eq!(summary.updated, vec![path.clone()]);

    let expected = "<ComicInfo>\n  <Series>Foo</Series>\n  <Volume>1</Volume>\n</ComicInfo>";
    let rendered = String::from_utf8(preview.0.lock().unwrap().clone()).unwrap();
    assert_eq!(rendered, format!("{expected}\n"));

    let mut archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert_eq!(names.len(), 2);
    assert_eq!(archive.by_index(1).unwrap().name(), "ComicInfo.xml");
    assert_eq!(entry_bytes(&mut archive, "page1.jpg"), page);
    let stored = String::from_utf8(entry_bytes(&mut archive, "ComicInfo.xml")).unwrap();
    assert_eq!(stored, expected);

    let info = read_comic_info(&path).unwrap().unwrap();
    assert_eq!(
        info,
        ComicInfo {
            series: "Foo".into(),
            volume: 1,
            ..Default::default()
        }
    );
}

#[test]
fn bad_operand_is_rejected_before_any_archive_is_touched() {
    let err = parse_assignments(["Series=Foo", "Volume=one"]).unwrap_err();
    assert!(matches!(
        err,
        CbzError::Conversion { ref field, ref value, .. } if field == "Volume" && value == "one"
    ));
    assert!(matches!(
        parse_assignments(["SeriesFoo"]),
        Err(CbzError::MalformedAssignment { .. })
    ));
}

#[test]
fn page_analysis_through_the_batch_entry_point() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("issue-2.cbz");
    let page = jpeg_page();
    {
        let mut writer = ZipWriter::new(File::create(&path).unwrap());
        for name in ["p01.jpg", "p02.jpeg"] {
            writer
                .start_file(name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(&page).unwrap();
        }
        writer.finish().unwrap();
    }

    let options = UpdateOptions::builder()
        .compute_pages(true)
        .infer_double_pages(true)
        .build();
    update_archives([&path], &MutationStep::noop(), &options).unwrap();

    let info = read_comic_info(&path).unwrap().unwrap();
    assert_eq!(info.pages.len(), 2);
    for (index, page) in info.pages.iter().enumerate() {
        assert_eq!(page.image, index as i64);
        assert_eq!((page.image_width, page.image_height), (24, 32));
        assert!(!page.double_page);
    }
}
