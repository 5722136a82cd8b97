//! Section layout verification and `.text` extraction.
//!
//! A shellcode image has exactly one section, or two where the second is
//! an `.rdata` holding only debug information; anything else means data
//! escaped the merge recipe and the blob would be incomplete. The
//! extracted bytes are the `.text` raw data verbatim, except that when
//! the PE entry point did not land at section offset zero a 5-byte near
//! jump to it is patched over the first bytes — a blob is entered at byte
//! zero, wherever the linker put the stub.

use crate::error::ExtractError;
use crate::pe::PeFile;

/// A near `jmp rel32`, valid on both x86 and x64.
const JMP_REL32_LEN: usize = 5;

pub struct Blob {
    pub bytes: Vec<u8>,
    /// Whether an entry jump had to be patched over offset zero.
    pub patched: bool,
}

pub fn extract_text(pe: &PeFile) -> Result<Blob, ExtractError> {
    verify_layout(pe)?;

    let text = &pe.sections[0];
    let start = text.pointer_to_raw_data as usize;
    let size = text.size_of_raw_data as usize;
    let raw = pe
        .bytes
        .get(start..start + size)
        .ok_or(ExtractError::CorruptSection)?;

    if !text.contains_rva(pe.entry_point_rva) {
        return Err(ExtractError::EntryOutsideText(pe.entry_point_rva));
    }
    let entry_offset = (pe.entry_point_rva - text.virtual_address) as usize;

    let mut bytes = raw.to_vec();
    let patched = entry_offset != 0;
    if patched {
        // The entry stub lost the subsection ordering race; give the blob
        // a first instruction that reaches it. Internal pc-relative
        // references are untouched because nothing moves.
        if bytes.len() < JMP_REL32_LEN || entry_offset < JMP_REL32_LEN {
            return Err(ExtractError::TextTooSmall);
        }
        log::warn!(
            "entry stub at .text offset {entry_offset:#x}, patching a jump at offset 0 \
             (self-cleanup builds rely on the stub being first)"
        );
        bytes[0] = 0xE9;
        let rel = (entry_offset - JMP_REL32_LEN) as u32;
        bytes[1..5].copy_from_slice(&rel.to_le_bytes());
    }

    log::info!(
        "extracted {} bytes of .text (entry offset {:#x})",
        bytes.len(),
        entry_offset
    );

    Ok(Blob { bytes, patched })
}

fn verify_layout(pe: &PeFile) -> Result<(), ExtractError> {
    match pe.sections.len() {
        0 => return Err(ExtractError::NoSections),
        1 | 2 => {}
        n => return Err(ExtractError::SectionLayout(n)),
    }

    let text = &pe.sections[0];
    if text.name != ".text" {
        return Err(ExtractError::TextNotFirst(text.name.clone()));
    }

    if let Some(second) = pe.sections.get(1) {
        // A second section is tolerated only to carry debug records.
        let debug_inside = pe
            .debug_directory
            .map(|(rva, _)| second.contains_rva(rva))
            .unwrap_or(false);
        if second.name != ".rdata" || !debug_inside {
            return Err(ExtractError::SecondSectionNotDebug(second.name.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::PeBuilder;

    fn stub(len: usize) -> Vec<u8> {
        let mut code = vec![0x90u8; len];
        code[len - 1] = 0xC3;
        code
    }

    #[test]
    fn test_extracts_single_section_verbatim() {
        let code = stub(64);
        let pe = PeFile::parse(
            PeBuilder::new64()
                .entry_rva(0x1000)
                .section(".text", 0x1000, code.clone())
                .build(),
        )
        .unwrap();

        let blob = extract_text(&pe).unwrap();
        assert!(!blob.patched);
        assert_eq!(blob.bytes, code);
    }

    #[test]
    fn test_patches_entry_jump_when_stub_is_not_first() {
        let code = stub(0x40);
        let pe = PeFile::parse(
            PeBuilder::new64()
                .entry_rva(0x1020)
                .section(".text", 0x1000, code.clone())
                .build(),
        )
        .unwrap();

        let blob = extract_text(&pe).unwrap();
        assert!(blob.patched);
        assert_eq!(blob.bytes[0], 0xE9);
        assert_eq!(
            u32::from_le_bytes(blob.bytes[1..5].try_into().unwrap()),
            0x20 - 5
        );
        // Everything past the patch is untouched.
        assert_eq!(&blob.bytes[5..], &code[5..]);
    }

    #[test]
    fn test_rejects_multiple_sections() {
        let pe = PeFile::parse(
            PeBuilder::new64()
                .entry_rva(0x1000)
                .section(".text", 0x1000, stub(16))
                .section(".rdata", 0x2000, vec![0; 16])
                .section(".data", 0x3000, vec![0; 16])
                .build(),
        )
        .unwrap();

        assert!(matches!(
            extract_text(&pe),
            Err(ExtractError::SectionLayout(3))
        ));
    }

    #[test]
    fn test_rejects_non_debug_second_section() {
        let pe = PeFile::parse(
            PeBuilder::new64()
                .entry_rva(0x1000)
                .section(".text", 0x1000, stub(16))
                .section(".rdata", 0x2000, vec![0; 16])
                .build(),
        )
        .unwrap();

        // No debug directory pointing into .rdata: not tolerated.
        assert!(matches!(
            extract_text(&pe),
            Err(ExtractError::SecondSectionNotDebug(_))
        ));
    }

    #[test]
    fn test_accepts_debug_only_rdata() {
        let pe = PeFile::parse(
            PeBuilder::new64()
                .entry_rva(0x1000)
                .debug_directory(0x2010, 0x1C)
                .section(".text", 0x1000, stub(16))
                .section(".rdata", 0x2000, vec![0; 0x40])
                .build(),
        )
        .unwrap();

        let blob = extract_text(&pe).unwrap();
        assert_eq!(blob.bytes.len(), 16);
    }

    #[test]
    fn test_rejects_text_not_first() {
        let pe = PeFile::parse(
            PeBuilder::new64()
                .entry_rva(0x2000)
                .section(".rdata", 0x1000, vec![0; 16])
                .section(".text", 0x2000, stub(16))
                .build(),
        )
        .unwrap();

        assert!(matches!(
            extract_text(&pe),
            Err(ExtractError::TextNotFirst(name)) if name == ".rdata"
        ));
    }

    #[test]
    fn test_rejects_entry_outside_text() {
        let pe = PeFile::parse(
            PeBuilder::new64()
                .entry_rva(0x5000)
                .section(".text", 0x1000, stub(16))
                .build(),
        )
        .unwrap();

        assert!(matches!(
            extract_text(&pe),
            Err(ExtractError::EntryOutsideText(0x5000))
        ));
    }

    #[test]
    fn test_rejects_no_sections() {
        let pe = PeFile::parse(PeBuilder::new64().build()).unwrap();
        assert!(matches!(extract_text(&pe), Err(ExtractError::NoSections)));
    }

    #[test]
    fn test_x86_image_extracts_too() {
        let code = stub(32);
        let pe = PeFile::parse(
            PeBuilder::new32()
                .entry_rva(0x1000)
                .section(".text", 0x1000, code.clone())
                .build(),
        )
        .unwrap();

        let blob = extract_text(&pe).unwrap();
        assert_eq!(blob.bytes, code);
    }
}
