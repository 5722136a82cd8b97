//! Error types for PE verification and extraction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read PE file")]
    Io(#[from] std::io::Error),

    #[error("File too small for a PE header")]
    Truncated,

    #[error("Invalid DOS header: expected 'MZ', found {0:04X}")]
    InvalidDosHeader(u16),

    #[error("Invalid PE signature: expected 'PE\\0\\0'")]
    InvalidPeSignature,

    #[error("Unsupported machine type: {0:#06x}")]
    UnsupportedMachine(u16),

    #[error("Unsupported optional header magic: {0:#06x}")]
    UnsupportedMagic(u16),

    #[error("PE has no sections")]
    NoSections,

    #[error(".text is not the first section (found '{0}')")]
    TextNotFirst(String),

    #[error("Image has {0} sections; a shellcode image has exactly one, or two where the second is a debug-only .rdata")]
    SectionLayout(usize),

    #[error("Second section '{0}' is not a debug-only .rdata")]
    SecondSectionNotDebug(String),

    #[error("Entry point RVA {0:#x} lies outside .text")]
    EntryOutsideText(u32),

    #[error(".text raw data lies outside the file")]
    CorruptSection,

    #[error(".text is too small to hold the entry jump patch")]
    TextTooSmall,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ExtractError::InvalidDosHeader(0x1234);
        assert!(error.to_string().contains("1234"));
        assert!(error.to_string().contains("MZ"));

        let error = ExtractError::TextNotFirst(".data".to_string());
        assert!(error.to_string().contains(".data"));

        let error = ExtractError::SectionLayout(4);
        assert!(error.to_string().contains('4'));
    }
}
