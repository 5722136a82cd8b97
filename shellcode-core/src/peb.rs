//! User-mode module lookup via the loader's own data structures.
//!
//! The PEB holds the loader data, which chains every loaded module on
//! `InLoadOrderModuleList`. Walking that list and comparing base names
//! replaces `GetModuleHandle` without touching any API. The structures are
//! declared by hand with only the fields the walk dereferences named;
//! trailing members are omitted because nothing here is ever allocated,
//! only read through pointers the loader owns.
//!
//! The first list entry is the process image, the second is always ntdll
//! and the third kernel32. The fast-path lookups exploit those fixed
//! positions with a fixed hop count; `full-module-search` turns them off
//! for environments (emulation layers) that perturb the load order.

use crate::crt;
use crate::hash;
use core::ffi::c_void;

#[repr(C)]
pub struct ListEntry {
    pub flink: *mut ListEntry,
    pub blink: *mut ListEntry,
}

#[repr(C)]
pub struct UnicodeString {
    pub length: u16,
    pub maximum_length: u16,
    pub buffer: *mut u16,
}

#[repr(C)]
pub struct PebLdrData {
    pub length: u32,
    pub initialized: u8,
    pub ss_handle: *mut c_void,
    pub in_load_order_module_list: ListEntry,
    pub in_memory_order_module_list: ListEntry,
    pub in_initialization_order_module_list: ListEntry,
}

/// Loader entry. `in_load_order_links` is the first member, so a list
/// pointer is also an entry pointer.
#[repr(C)]
pub struct LdrDataTableEntry {
    pub in_load_order_links: ListEntry,
    pub in_memory_order_links: ListEntry,
    pub in_initialization_order_links: ListEntry,
    pub dll_base: *mut c_void,
    pub entry_point: *mut c_void,
    pub size_of_image: u32,
    pub full_dll_name: UnicodeString,
    pub base_dll_name: UnicodeString,
}

#[repr(C)]
pub struct RtlUserProcessParameters {
    pub maximum_length: u32,
    pub length: u32,
    pub flags: u32,
    pub debug_flags: u32,
    pub console_handle: *mut c_void,
    pub console_flags: u32,
    pub standard_input: *mut c_void,
    pub standard_output: *mut c_void,
    pub standard_error: *mut c_void,
}

#[repr(C)]
pub struct Peb {
    pub inherited_address_space: u8,
    pub read_image_file_exec_options: u8,
    pub being_debugged: u8,
    pub bit_field: u8,
    pub mutant: *mut c_void,
    pub image_base_address: *mut c_void,
    pub ldr: *mut PebLdrData,
    pub process_parameters: *mut RtlUserProcessParameters,
}

/// Current process PEB, from the TEB slot the loader publishes it in.
#[cfg(all(windows, target_arch = "x86_64"))]
#[inline(always)]
pub unsafe fn current_peb() -> *mut Peb {
    let peb: *mut Peb;
    core::arch::asm!(
        "mov {}, gs:[0x60]",
        out(reg) peb,
        options(nostack, pure, readonly),
    );
    peb
}

#[cfg(all(windows, target_arch = "x86"))]
#[inline(always)]
pub unsafe fn current_peb() -> *mut Peb {
    let peb: *mut Peb;
    core::arch::asm!(
        "mov {}, fs:[0x30]",
        out(reg) peb,
        options(nostack, pure, readonly),
    );
    peb
}

/// Host stub so downstream crates build and test anywhere; resolves
/// nothing.
#[cfg(not(all(windows, any(target_arch = "x86", target_arch = "x86_64"))))]
#[inline(always)]
pub unsafe fn current_peb() -> *mut Peb {
    core::ptr::null_mut()
}

#[inline(always)]
unsafe fn walk<M>(matches: M) -> *mut c_void
where
    M: Fn(*const u16) -> bool,
{
    let peb = current_peb();
    #[cfg(not(all(windows, any(target_arch = "x86", target_arch = "x86_64"))))]
    if peb.is_null() {
        return core::ptr::null_mut();
    }
    let head = &mut (*(*peb).ldr).in_load_order_module_list as *mut ListEntry;
    let mut entry = (*head).flink;
    while entry != head {
        let module = entry as *mut LdrDataTableEntry;
        if matches((*module).base_dll_name.buffer) {
            return (*module).dll_base;
        }
        entry = (*entry).flink;
    }
    core::ptr::null_mut()
}

/// ntdll is always the second in-load-order entry (the first is the
/// process image): two hops from the list head.
#[inline(always)]
pub unsafe fn find_module_ntdll() -> *mut c_void {
    let peb = current_peb();
    #[cfg(not(all(windows, any(target_arch = "x86", target_arch = "x86_64"))))]
    if peb.is_null() {
        return core::ptr::null_mut();
    }
    let entry = (*(*peb).ldr).in_load_order_module_list.flink;
    (*((*entry).flink as *mut LdrDataTableEntry)).dll_base
}

/// kernel32 is always the third in-load-order entry: three hops.
#[inline(always)]
pub unsafe fn find_module_kernel32() -> *mut c_void {
    let peb = current_peb();
    #[cfg(not(all(windows, any(target_arch = "x86", target_arch = "x86_64"))))]
    if peb.is_null() {
        return core::ptr::null_mut();
    }
    let entry = (*(*peb).ldr).in_load_order_module_list.flink;
    (*((*(*entry).flink).flink as *mut LdrDataTableEntry)).dll_base
}

/// Find a loaded module by case-folded FNV-1a hash of its base name.
#[inline(always)]
pub unsafe fn find_module_by_hash(module_hash: u32) -> *mut c_void {
    #[cfg(not(feature = "full-module-search"))]
    {
        // Constant comparisons; only the matching branch survives when the
        // caller's hash is itself a constant.
        if module_hash == hash::NTDLL_HASH {
            return find_module_ntdll();
        }
        if module_hash == hash::KERNEL32_HASH {
            return find_module_kernel32();
        }
    }
    walk(|name| unsafe { hash::fnv1a_wcstr(name) } == module_hash)
}

/// Find a loaded module by ASCII name, case-insensitive against the
/// UTF-16 base name.
#[inline(always)]
pub unsafe fn find_module_by_ascii(name: *const u8) -> *mut c_void {
    #[cfg(not(feature = "full-module-search"))]
    {
        if crt::eq_cstr_nocase(name, b"ntdll.dll\0".as_ptr()) {
            return find_module_ntdll();
        }
        if crt::eq_cstr_nocase(name, b"kernel32.dll\0".as_ptr()) {
            return find_module_kernel32();
        }
    }
    walk(|module| unsafe { crt::eq_wstr_ascii_nocase(module, name) })
}

/// Find a loaded module by UTF-16 name, case-insensitive.
#[inline(always)]
pub unsafe fn find_module_by_wide(name: *const u16) -> *mut c_void {
    walk(|module| unsafe { crt::eq_wstr_nocase(module, name) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_links_are_first_member() {
        // The walk casts a ListEntry pointer straight to an entry pointer.
        assert_eq!(core::mem::offset_of!(LdrDataTableEntry, in_load_order_links), 0);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_peb_layout_x64() {
        assert_eq!(core::mem::offset_of!(Peb, ldr), 0x18);
        assert_eq!(core::mem::offset_of!(Peb, process_parameters), 0x20);
        assert_eq!(
            core::mem::offset_of!(RtlUserProcessParameters, standard_output),
            0x28
        );
        assert_eq!(core::mem::offset_of!(LdrDataTableEntry, dll_base), 0x30);
        assert_eq!(core::mem::offset_of!(LdrDataTableEntry, base_dll_name), 0x58);
        assert_eq!(
            core::mem::offset_of!(PebLdrData, in_load_order_module_list),
            0x10
        );
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn test_peb_layout_x86() {
        assert_eq!(core::mem::offset_of!(Peb, ldr), 0x0C);
        assert_eq!(core::mem::offset_of!(Peb, process_parameters), 0x10);
        assert_eq!(
            core::mem::offset_of!(RtlUserProcessParameters, standard_output),
            0x1C
        );
        assert_eq!(core::mem::offset_of!(LdrDataTableEntry, dll_base), 0x18);
    }

    // The walks themselves need a live loader.
    #[cfg(windows)]
    mod live {
        use super::super::*;
        use crate::hash::fnv1a_str;

        #[test]
        fn test_fast_paths_agree_with_full_walk() {
            unsafe {
                let ntdll = find_module_ntdll();
                let kernel32 = find_module_kernel32();
                assert!(!ntdll.is_null());
                assert!(!kernel32.is_null());
                assert_ne!(ntdll, kernel32);
                assert_eq!(find_module_by_ascii(b"ntdll.dll\0".as_ptr()), ntdll);
                assert_eq!(find_module_by_hash(fnv1a_str("kernel32.dll")), kernel32);
            }
        }

        #[test]
        fn test_unknown_module_is_null() {
            unsafe {
                assert!(find_module_by_ascii(b"no_such_module_.dll\0".as_ptr()).is_null());
            }
        }
    }
}
