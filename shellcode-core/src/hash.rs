//! Case-folded FNV-1a hashing for module and export names.
//!
//! Names are hashed instead of stored so that hash-mode blobs carry no
//! plaintext strings: the declaration side hashes at compile time, the
//! resolvers hash what they walk at runtime, and equality of the two is the
//! match criterion.
//!
//! The fold is one-sided: any byte `>= b'a'` has `0x20` subtracted, with no
//! upper bound check. Both sides of every comparison fold identically, so
//! bytes above `b'z'` mangle consistently. Wide strings hash the low byte
//! of each unit; export and module names are ASCII.

pub const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
pub const FNV_PRIME: u32 = 0x0100_0193;

#[inline(always)]
const fn mix(hash: u32, unit: u8) -> u32 {
    let mut byte = unit;
    if byte >= b'a' {
        byte -= 0x20;
    }
    (hash ^ byte as u32).wrapping_mul(FNV_PRIME)
}

/// Hash a byte slice. Compile-time evaluable.
pub const fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash = mix(hash, bytes[i]);
        i += 1;
    }
    hash
}

/// Hash a string literal. Compile-time evaluable.
pub const fn fnv1a_str(s: &str) -> u32 {
    fnv1a(s.as_bytes())
}

/// Hash a NUL-terminated byte string at runtime.
#[inline(always)]
pub unsafe fn fnv1a_cstr(mut p: *const u8) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    while *p != 0 {
        hash = mix(hash, *p);
        p = p.add(1);
    }
    hash
}

/// Hash a NUL-terminated UTF-16 string at runtime, low byte of each unit.
#[inline(always)]
pub unsafe fn fnv1a_wcstr(mut p: *const u16) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    while *p != 0 {
        hash = mix(hash, *p as u8);
        p = p.add(1);
    }
    hash
}

pub const NTDLL_HASH: u32 = fnv1a_str("ntdll.dll");
pub const KERNEL32_HASH: u32 = fnv1a_str("kernel32.dll");
pub const NTOSKRNL_HASH: u32 = fnv1a_str("ntoskrnl.exe");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_offset_basis() {
        assert_eq!(fnv1a(b""), FNV_OFFSET_BASIS);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(fnv1a_str("kernel32.dll"), fnv1a_str("KERNEL32.DLL"));
        assert_eq!(fnv1a_str("GetProcAddress"), fnv1a_str("getprocaddress"));
        assert_eq!(fnv1a_str("NtClose"), fnv1a_str("nTcLoSe"));
    }

    #[test]
    fn test_equals_uppercased() {
        let names = ["VirtualFree", "LoadLibraryA", "ntdll.dll", "a_b-c.1"];
        for name in names {
            assert_eq!(fnv1a_str(name), fnv1a(name.to_ascii_uppercase().as_bytes()));
        }
    }

    #[test]
    fn test_distinct_names_distinct_hashes() {
        let hashes = [NTDLL_HASH, KERNEL32_HASH, NTOSKRNL_HASH];
        for (i, a) in hashes.iter().enumerate() {
            for (j, b) in hashes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn test_runtime_matches_const() {
        unsafe {
            assert_eq!(fnv1a_cstr(b"VirtualFree\0".as_ptr()), fnv1a_str("VirtualFree"));
        }
    }

    #[test]
    fn test_wide_matches_narrow_for_ascii() {
        let wide: Vec<u16> = "Kernel32.DLL"
            .encode_utf16()
            .chain(core::iter::once(0))
            .collect();
        unsafe {
            assert_eq!(fnv1a_wcstr(wide.as_ptr()), KERNEL32_HASH);
        }
    }

    #[test]
    fn test_const_evaluable() {
        const H: u32 = fnv1a_str("WriteConsoleA");
        assert_eq!(H, fnv1a_str("writeconsolea"));
    }
}
