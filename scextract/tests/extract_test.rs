//! File-level round trip: build a synthetic shellcode PE on disk, run the
//! parse/verify/extract pipeline against it, and check the written blob.

use scextract::testutil::PeBuilder;
use scextract::{extract_text, ExtractError, PeFile};

fn temp_path(name: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("scextract_test_{}_{name}", std::process::id()));
    path
}

#[test]
fn test_extract_from_disk_roundtrip() {
    let mut code = vec![0x90u8; 96];
    code[0] = 0xEB; // jmp short over the nops
    *code.last_mut().unwrap() = 0xC3;

    let image = PeBuilder::new64()
        .entry_rva(0x1000)
        .section(".text", 0x1000, code.clone())
        .build();

    let input = temp_path("in.exe");
    let output = temp_path("out.bin");
    std::fs::write(&input, &image).unwrap();

    let pe = PeFile::from_file(&input).unwrap();
    let blob = extract_text(&pe).unwrap();
    std::fs::write(&output, &blob.bytes).unwrap();

    let written = std::fs::read(&output).unwrap();
    assert_eq!(written, code);
    assert_eq!(written[0], 0xEB);

    std::fs::remove_file(&input).unwrap();
    std::fs::remove_file(&output).unwrap();
}

#[test]
fn test_missing_file_reports_io_error() {
    let missing = temp_path("does_not_exist.exe");
    match PeFile::from_file(&missing) {
        Err(ExtractError::Io(_)) => {}
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn test_layout_violation_fails_the_build_step() {
    let image = PeBuilder::new64()
        .entry_rva(0x1000)
        .section(".text", 0x1000, vec![0xC3; 16])
        .section(".data", 0x2000, vec![1; 16])
        .build();

    let input = temp_path("layout.exe");
    std::fs::write(&input, &image).unwrap();

    let pe = PeFile::from_file(&input).unwrap();
    assert!(matches!(
        extract_text(&pe),
        Err(ExtractError::SecondSectionNotDebug(name)) if name == ".data"
    ));

    std::fs::remove_file(&input).unwrap();
}
