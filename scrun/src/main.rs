//! Test loader for extracted shellcode blobs.
//!
//! Reads the blob, maps it into RWX memory, calls byte zero as
//! `entry(argument1, argument2)`, and afterwards probes whether the pages
//! are still accessible to report whether the blob freed itself. This is
//! scaffolding around the blob's invocation ABI, not part of it.

use std::env;
use std::process::exit;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <input.bin> [arg1] [arg2]", args[0]);
        eprintln!();
        eprintln!("Loads and executes a shellcode binary.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  input.bin  Path to the shellcode binary file");
        eprintln!("  arg1       Optional first argument (passed in RCX/ECX)");
        eprintln!("  arg2       Optional second argument (passed in RDX/EDX)");
        exit(1);
    }

    let argument1 = args.get(2).map(|s| parse_pointer(s)).unwrap_or(Some(0));
    let argument2 = args.get(3).map(|s| parse_pointer(s)).unwrap_or(Some(0));
    let (argument1, argument2) = match (argument1, argument2) {
        (Some(a1), Some(a2)) => (a1, a2),
        _ => {
            eprintln!("[!] Error: Arguments must be decimal or 0x-prefixed hex pointers");
            exit(1);
        }
    };

    let blob = match std::fs::read(&args[1]) {
        Ok(blob) => blob,
        Err(err) => {
            eprintln!("[!] Error: Failed to read file '{}': {}", args[1], err);
            exit(1);
        }
    };

    if blob.is_empty() {
        eprintln!("[!] Error: File is empty");
        exit(1);
    }

    exit(run(&blob, argument1, argument2));
}

/// Decimal or 0x-prefixed hex pointer value.
fn parse_pointer(s: &str) -> Option<usize> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).ok()
    } else {
        s.parse::<usize>().ok()
    }
}

#[cfg(windows)]
fn run(blob: &[u8], argument1: usize, argument2: usize) -> i32 {
    use std::ffi::c_void;
    use windows::Win32::System::Memory::{
        VirtualAlloc, VirtualFree, VirtualProtect, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE,
        PAGE_EXECUTE_READWRITE, PAGE_NOACCESS, PAGE_PROTECTION_FLAGS,
    };

    #[cfg(target_arch = "x86")]
    type ShellcodeEntry = unsafe extern "fastcall" fn(*mut c_void, *mut c_void);
    #[cfg(not(target_arch = "x86"))]
    type ShellcodeEntry = unsafe extern "system" fn(*mut c_void, *mut c_void);

    let base = unsafe {
        VirtualAlloc(
            None,
            blob.len(),
            MEM_COMMIT | MEM_RESERVE,
            PAGE_EXECUTE_READWRITE,
        )
    };
    if base.is_null() {
        eprintln!("[!] Error: Failed to allocate {} bytes of RWX memory", blob.len());
        return 1;
    }

    unsafe {
        std::ptr::copy_nonoverlapping(blob.as_ptr(), base as *mut u8, blob.len());
    }

    println!("[ ] Loaded {} bytes at {:p}", blob.len(), base);
    println!("[ ] Executing shellcode");
    println!();

    log::debug!("argument1 = {argument1:#x}, argument2 = {argument2:#x}");

    let entry: ShellcodeEntry = unsafe { std::mem::transmute(base) };
    unsafe {
        entry(argument1 as *mut c_void, argument2 as *mut c_void);
    }

    println!();
    println!("[ ] Shellcode returned");

    // If the blob freed its own pages, reprotecting them fails. If it
    // did not, free them here.
    let mut old = PAGE_PROTECTION_FLAGS::default();
    let still_mapped =
        unsafe { VirtualProtect(base, blob.len(), PAGE_NOACCESS, &mut old) }.is_ok();
    if still_mapped {
        println!("[*] Memory freed: NO");
        if let Err(err) = unsafe { VirtualFree(base, 0, MEM_RELEASE) } {
            log::warn!("VirtualFree failed: {err}");
        }
    } else {
        println!("[ ] Memory freed: YES");
    }

    0
}

#[cfg(not(windows))]
fn run(_blob: &[u8], _argument1: usize, _argument2: usize) -> i32 {
    eprintln!("[!] Error: scrun executes Windows shellcode and only runs on Windows");
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pointer_decimal() {
        assert_eq!(parse_pointer("0"), Some(0));
        assert_eq!(parse_pointer("4096"), Some(4096));
    }

    #[test]
    fn test_parse_pointer_hex() {
        assert_eq!(parse_pointer("0x1000"), Some(0x1000));
        assert_eq!(parse_pointer("0XdeadBEEF"), Some(0xdead_beef));
    }

    #[test]
    fn test_parse_pointer_rejects_garbage() {
        assert_eq!(parse_pointer("blob"), None);
        assert_eq!(parse_pointer("0xZZ"), None);
        assert_eq!(parse_pointer(""), None);
    }
}
