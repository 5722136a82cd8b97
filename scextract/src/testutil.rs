//! Synthetic PE images for the test suite: just enough of a header chain
//! for the parser and the extraction rules, with raw data laid out the
//! way the linker would.

const LFANEW: usize = 0x80;
const FILE_HEADER_SIZE: usize = 20;
const SECTION_HEADER_SIZE: usize = 40;
const FIRST_RAW_OFFSET: u32 = 0x400;
const RAW_ALIGN: u32 = 0x200;

pub struct PeBuilder {
    machine: u16,
    magic: u16,
    entry_rva: u32,
    debug_directory: Option<(u32, u32)>,
    sections: Vec<(String, u32, Vec<u8>)>,
}

impl PeBuilder {
    pub fn new64() -> Self {
        Self {
            machine: super::pe::IMAGE_FILE_MACHINE_AMD64,
            magic: super::pe::IMAGE_NT_OPTIONAL_HDR64_MAGIC,
            entry_rva: 0,
            debug_directory: None,
            sections: Vec::new(),
        }
    }

    pub fn new32() -> Self {
        Self {
            machine: super::pe::IMAGE_FILE_MACHINE_I386,
            magic: super::pe::IMAGE_NT_OPTIONAL_HDR32_MAGIC,
            entry_rva: 0,
            debug_directory: None,
            sections: Vec::new(),
        }
    }

    pub fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    pub fn entry_rva(mut self, rva: u32) -> Self {
        self.entry_rva = rva;
        self
    }

    pub fn debug_directory(mut self, rva: u32, size: u32) -> Self {
        self.debug_directory = Some((rva, size));
        self
    }

    pub fn section(mut self, name: &str, rva: u32, data: Vec<u8>) -> Self {
        self.sections.push((name.to_string(), rva, data));
        self
    }

    fn optional_header_size(&self) -> usize {
        if self.magic == super::pe::IMAGE_NT_OPTIONAL_HDR64_MAGIC {
            112 + 16 * 8
        } else {
            96 + 16 * 8
        }
    }

    pub fn build(self) -> Vec<u8> {
        let optional_header_size = self.optional_header_size();
        let optional_header = LFANEW + 4 + FILE_HEADER_SIZE;

        // Assign raw offsets first so the total size is known.
        let mut raw_offset = FIRST_RAW_OFFSET;
        let mut placed = Vec::new();
        for (name, rva, data) in &self.sections {
            placed.push((name.clone(), *rva, raw_offset, data.clone()));
            let len = data.len() as u32;
            raw_offset = (raw_offset + len + RAW_ALIGN - 1) / RAW_ALIGN * RAW_ALIGN;
        }
        let total = placed
            .iter()
            .map(|(_, _, off, data)| *off as usize + data.len())
            .max()
            .unwrap_or(FIRST_RAW_OFFSET as usize);

        let mut bytes = vec![0u8; total];

        // DOS header: magic + e_lfanew.
        bytes[0] = b'M';
        bytes[1] = b'Z';
        bytes[0x3C..0x40].copy_from_slice(&(LFANEW as u32).to_le_bytes());

        // NT signature + file header.
        bytes[LFANEW..LFANEW + 4].copy_from_slice(&super::pe::IMAGE_NT_SIGNATURE.to_le_bytes());
        let file_header = LFANEW + 4;
        bytes[file_header..file_header + 2].copy_from_slice(&self.machine.to_le_bytes());
        bytes[file_header + 2..file_header + 4]
            .copy_from_slice(&(self.sections.len() as u16).to_le_bytes());
        bytes[file_header + 16..file_header + 18]
            .copy_from_slice(&(optional_header_size as u16).to_le_bytes());

        // Optional header: magic, entry point, directory count, debug dir.
        bytes[optional_header..optional_header + 2].copy_from_slice(&self.magic.to_le_bytes());
        bytes[optional_header + 16..optional_header + 20]
            .copy_from_slice(&self.entry_rva.to_le_bytes());
        let directory_offset = if self.magic == super::pe::IMAGE_NT_OPTIONAL_HDR64_MAGIC {
            112
        } else {
            96
        };
        bytes[optional_header + directory_offset - 4..optional_header + directory_offset]
            .copy_from_slice(&16u32.to_le_bytes());
        if let Some((rva, size)) = self.debug_directory {
            let entry =
                optional_header + directory_offset + super::pe::IMAGE_DIRECTORY_ENTRY_DEBUG * 8;
            bytes[entry..entry + 4].copy_from_slice(&rva.to_le_bytes());
            bytes[entry + 4..entry + 8].copy_from_slice(&size.to_le_bytes());
        }

        // Section table and raw data.
        let section_table = optional_header + optional_header_size;
        for (index, (name, rva, raw, data)) in placed.iter().enumerate() {
            let header = section_table + index * SECTION_HEADER_SIZE;
            let name_bytes = name.as_bytes();
            bytes[header..header + name_bytes.len().min(8)]
                .copy_from_slice(&name_bytes[..name_bytes.len().min(8)]);
            bytes[header + 8..header + 12].copy_from_slice(&(data.len() as u32).to_le_bytes());
            bytes[header + 12..header + 16].copy_from_slice(&rva.to_le_bytes());
            bytes[header + 16..header + 20].copy_from_slice(&(data.len() as u32).to_le_bytes());
            bytes[header + 20..header + 24].copy_from_slice(&raw.to_le_bytes());
            bytes[*raw as usize..*raw as usize + data.len()].copy_from_slice(data);
        }

        bytes
    }
}
