//! Minimal on-disk PE parsing: enough header material to verify a
//! shellcode image's layout and locate its `.text` raw data. Handles both
//! PE32 and PE32+, parsed from bytes so the tool runs on any host.

use crate::error::ExtractError;

pub const IMAGE_DOS_SIGNATURE: u16 = 0x5A4D; // "MZ"
pub const IMAGE_NT_SIGNATURE: u32 = 0x0000_4550; // "PE\0\0"

pub const IMAGE_FILE_MACHINE_I386: u16 = 0x014c;
pub const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;

pub const IMAGE_NT_OPTIONAL_HDR32_MAGIC: u16 = 0x10b;
pub const IMAGE_NT_OPTIONAL_HDR64_MAGIC: u16 = 0x20b;

pub const IMAGE_DIRECTORY_ENTRY_DEBUG: usize = 6;

const DOS_LFANEW_OFFSET: usize = 0x3C;
const FILE_HEADER_SIZE: usize = 20;
const SECTION_HEADER_SIZE: usize = 40;

// Offset of the data directory array inside the optional header.
const DATA_DIRECTORY_OFFSET_32: usize = 96;
const DATA_DIRECTORY_OFFSET_64: usize = 112;

/// One section header, with its name already decoded.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub virtual_size: u32,
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
}

impl Section {
    /// Whether an RVA falls inside this section's virtual range.
    pub fn contains_rva(&self, rva: u32) -> bool {
        let size = self.virtual_size.max(self.size_of_raw_data);
        rva >= self.virtual_address && rva - self.virtual_address < size
    }
}

/// Parsed header material of a PE image.
#[derive(Debug)]
pub struct PeFile {
    pub bytes: Vec<u8>,
    pub machine: u16,
    pub entry_point_rva: u32,
    pub sections: Vec<Section>,
    /// Debug data directory (RVA, size), if any.
    pub debug_directory: Option<(u32, u32)>,
}

fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, ExtractError> {
    let raw = bytes
        .get(offset..offset + 2)
        .ok_or(ExtractError::Truncated)?;
    Ok(u16::from_le_bytes([raw[0], raw[1]]))
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, ExtractError> {
    let raw = bytes
        .get(offset..offset + 4)
        .ok_or(ExtractError::Truncated)?;
    Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

impl PeFile {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ExtractError> {
        Self::parse(std::fs::read(path)?)
    }

    pub fn parse(bytes: Vec<u8>) -> Result<Self, ExtractError> {
        let dos_magic = read_u16(&bytes, 0)?;
        if dos_magic != IMAGE_DOS_SIGNATURE {
            return Err(ExtractError::InvalidDosHeader(dos_magic));
        }

        let lfanew = read_u32(&bytes, DOS_LFANEW_OFFSET)? as usize;
        if read_u32(&bytes, lfanew)? != IMAGE_NT_SIGNATURE {
            return Err(ExtractError::InvalidPeSignature);
        }

        let file_header = lfanew + 4;
        let machine = read_u16(&bytes, file_header)?;
        if machine != IMAGE_FILE_MACHINE_I386 && machine != IMAGE_FILE_MACHINE_AMD64 {
            return Err(ExtractError::UnsupportedMachine(machine));
        }

        let number_of_sections = read_u16(&bytes, file_header + 2)? as usize;
        let size_of_optional_header = read_u16(&bytes, file_header + 16)? as usize;

        let optional_header = file_header + FILE_HEADER_SIZE;
        let magic = read_u16(&bytes, optional_header)?;
        let directory_offset = match magic {
            IMAGE_NT_OPTIONAL_HDR32_MAGIC => DATA_DIRECTORY_OFFSET_32,
            IMAGE_NT_OPTIONAL_HDR64_MAGIC => DATA_DIRECTORY_OFFSET_64,
            other => return Err(ExtractError::UnsupportedMagic(other)),
        };

        // AddressOfEntryPoint sits at the same offset in both variants.
        let entry_point_rva = read_u32(&bytes, optional_header + 16)?;

        let number_of_rva_and_sizes = read_u32(&bytes, optional_header + directory_offset - 4)?;
        let debug_directory = if number_of_rva_and_sizes as usize > IMAGE_DIRECTORY_ENTRY_DEBUG {
            let entry = optional_header + directory_offset + IMAGE_DIRECTORY_ENTRY_DEBUG * 8;
            let rva = read_u32(&bytes, entry)?;
            let size = read_u32(&bytes, entry + 4)?;
            (rva != 0 && size != 0).then_some((rva, size))
        } else {
            None
        };

        let mut sections = Vec::with_capacity(number_of_sections);
        let section_table = optional_header + size_of_optional_header;
        for index in 0..number_of_sections {
            let header = section_table + index * SECTION_HEADER_SIZE;
            let raw_name = bytes
                .get(header..header + 8)
                .ok_or(ExtractError::Truncated)?;
            let name_len = raw_name.iter().position(|&b| b == 0).unwrap_or(8);
            sections.push(Section {
                name: String::from_utf8_lossy(&raw_name[..name_len]).to_string(),
                virtual_size: read_u32(&bytes, header + 8)?,
                virtual_address: read_u32(&bytes, header + 12)?,
                size_of_raw_data: read_u32(&bytes, header + 16)?,
                pointer_to_raw_data: read_u32(&bytes, header + 20)?,
            });
        }

        log::debug!(
            "machine={machine:#06x} magic={magic:#05x} entry={entry_point_rva:#x} sections={}",
            sections.len()
        );

        Ok(Self {
            bytes,
            machine,
            entry_point_rva,
            sections,
            debug_directory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::PeBuilder;

    #[test]
    fn test_rejects_bad_dos_magic() {
        let mut bytes = PeBuilder::new64().build();
        bytes[0] = b'X';
        match PeFile::parse(bytes) {
            Err(ExtractError::InvalidDosHeader(_)) => {}
            other => panic!("expected InvalidDosHeader, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_pe_signature() {
        let builder = PeBuilder::new64();
        let lfanew = 0x80;
        let mut bytes = builder.build();
        bytes[lfanew] = 0;
        assert!(matches!(
            PeFile::parse(bytes),
            Err(ExtractError::InvalidPeSignature)
        ));
    }

    #[test]
    fn test_rejects_unknown_machine() {
        let bytes = PeBuilder::new64().machine(0xAA64).build();
        assert!(matches!(
            PeFile::parse(bytes),
            Err(ExtractError::UnsupportedMachine(0xAA64))
        ));
    }

    #[test]
    fn test_parses_sections_and_entry() {
        let bytes = PeBuilder::new64()
            .entry_rva(0x1000)
            .section(".text", 0x1000, vec![0xC3; 64])
            .build();
        let pe = PeFile::parse(bytes).unwrap();
        assert_eq!(pe.machine, IMAGE_FILE_MACHINE_AMD64);
        assert_eq!(pe.entry_point_rva, 0x1000);
        assert_eq!(pe.sections.len(), 1);
        assert_eq!(pe.sections[0].name, ".text");
        assert_eq!(pe.sections[0].virtual_address, 0x1000);
        assert_eq!(pe.sections[0].size_of_raw_data, 64);
    }

    #[test]
    fn test_parses_pe32_directory_offset() {
        let bytes = PeBuilder::new32()
            .entry_rva(0x1000)
            .debug_directory(0x2000, 0x40)
            .section(".text", 0x1000, vec![0xC3; 16])
            .section(".rdata", 0x2000, vec![0; 0x80])
            .build();
        let pe = PeFile::parse(bytes).unwrap();
        assert_eq!(pe.machine, IMAGE_FILE_MACHINE_I386);
        assert_eq!(pe.debug_directory, Some((0x2000, 0x40)));
    }

    #[test]
    fn test_section_contains_rva() {
        let section = Section {
            name: ".text".into(),
            virtual_size: 0x100,
            virtual_address: 0x1000,
            size_of_raw_data: 0x100,
            pointer_to_raw_data: 0x400,
        };
        assert!(section.contains_rva(0x1000));
        assert!(section.contains_rva(0x10FF));
        assert!(!section.contains_rva(0x1100));
        assert!(!section.contains_rva(0xFFF));
    }
}
