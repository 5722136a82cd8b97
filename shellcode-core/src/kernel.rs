//! Kernel-mode module lookup via the system module information query.
//!
//! There is no PEB to walk in kernel mode; the loaded-driver list comes
//! from `ZwQuerySystemInformation(SystemModuleInformation)` instead. The
//! three routines that feed the query are themselves resolved against the
//! caller-provided kernel image base with the export walker, so the blob
//! still calls nothing it did not resolve itself.
//!
//! `MmGetSystemRoutineAddress` would avoid the query, but it cannot look
//! into arbitrary modules, which makes it useless here.

use crate::crt;
use crate::hash;
use crate::pe;
use core::ffi::c_void;

pub type Ntstatus = i32;

pub const STATUS_SUCCESS: Ntstatus = 0;
pub const STATUS_INFO_LENGTH_MISMATCH: Ntstatus = 0xC000_0004_u32 as i32;

pub const SYSTEM_MODULE_INFORMATION: u32 = 11;
pub const NON_PAGED_POOL: u32 = 0;

#[inline]
pub fn nt_success(status: Ntstatus) -> bool {
    status >= 0
}

type ZwQuerySystemInformationFn =
    unsafe extern "system" fn(u32, *mut c_void, u32, *mut u32) -> Ntstatus;
type ExAllocatePoolFn = unsafe extern "system" fn(u32, usize) -> *mut c_void;
type ExFreePoolFn = unsafe extern "system" fn(*mut c_void);

#[repr(C)]
pub struct RtlProcessModuleInformation {
    pub section: *mut c_void,
    pub mapped_base: *mut c_void,
    pub image_base: *mut c_void,
    pub image_size: u32,
    pub flags: u32,
    pub load_order_index: u16,
    pub init_order_index: u16,
    pub load_count: u16,
    pub offset_to_file_name: u16,
    pub full_path_name: [u8; 256],
}

#[repr(C)]
pub struct RtlProcessModules {
    pub number_of_modules: u32,
    pub modules: [RtlProcessModuleInformation; 1],
}

/// Resolve one of the bootstrap routines from the kernel base, by hash or
/// by string depending on the init-symbols-by-string feature.
macro_rules! bootstrap {
    ($kernel_base:expr, $name:literal) => {{
        #[cfg(not(feature = "init-symbols-by-string"))]
        let address = pe::export_by_hash($kernel_base, hash::fnv1a_str($name), None);
        #[cfg(feature = "init-symbols-by-string")]
        let address = pe::export_by_name($kernel_base, $crate::__embedded_cstr!($name), None);
        address
    }};
}

unsafe fn find_module_impl<M>(kernel_base: *mut c_void, matches: M) -> *mut c_void
where
    M: Fn(*const u8) -> bool,
{
    let allocate = bootstrap!(kernel_base, "ExAllocatePool");
    let free = bootstrap!(kernel_base, "ExFreePool");
    let query = bootstrap!(kernel_base, "ZwQuerySystemInformation");
    if allocate.is_null() || free.is_null() || query.is_null() {
        return core::ptr::null_mut();
    }
    let allocate: ExAllocatePoolFn = core::mem::transmute(allocate);
    let free: ExFreePoolFn = core::mem::transmute(free);
    let query: ZwQuerySystemInformationFn = core::mem::transmute(query);

    let mut buffer: *mut c_void = core::ptr::null_mut();
    let mut buffer_length = 0u32;
    let mut required_length = 0u32;

    let status = loop {
        if required_length != 0 {
            if !buffer.is_null() {
                free(buffer);
            }
            buffer = allocate(NON_PAGED_POOL, required_length as usize);
            if buffer.is_null() {
                return core::ptr::null_mut();
            }
            buffer_length = required_length;
        }
        let status = query(
            SYSTEM_MODULE_INFORMATION,
            buffer,
            buffer_length,
            &mut required_length,
        );
        if status != STATUS_INFO_LENGTH_MISMATCH {
            break status;
        }
    };

    // Any terminal status other than success is a resolution failure.
    if status != STATUS_SUCCESS || buffer.is_null() {
        if !buffer.is_null() {
            free(buffer);
        }
        return core::ptr::null_mut();
    }

    let modules = buffer as *const RtlProcessModules;
    let mut result = core::ptr::null_mut();
    let first = (*modules).modules.as_ptr();
    let mut index = 0;
    while index < (*modules).number_of_modules as usize {
        let info = first.add(index);
        let name = (*info)
            .full_path_name
            .as_ptr()
            .add((*info).offset_to_file_name as usize);
        if matches(name) {
            result = (*info).image_base;
            break;
        }
        index += 1;
    }

    free(buffer);
    result
}

/// Find a loaded kernel module by case-folded FNV-1a hash of its file name.
#[inline(always)]
pub unsafe fn find_module_by_hash(kernel_base: *mut c_void, module_hash: u32) -> *mut c_void {
    find_module_impl(kernel_base, |name| unsafe { hash::fnv1a_cstr(name) } == module_hash)
}

/// Find a loaded kernel module by ASCII file name, case-insensitive.
#[inline(always)]
pub unsafe fn find_module_by_ascii(kernel_base: *mut c_void, name: *const u8) -> *mut c_void {
    find_module_impl(kernel_base, |module| unsafe { crt::eq_cstr_nocase(module, name) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nt_success() {
        assert!(nt_success(STATUS_SUCCESS));
        assert!(nt_success(1));
        assert!(!nt_success(STATUS_INFO_LENGTH_MISMATCH));
        assert!(!nt_success(-1));
    }

    #[test]
    fn test_module_information_layout() {
        // The query writes these at fixed offsets; the struct must agree.
        #[cfg(target_pointer_width = "64")]
        {
            assert_eq!(core::mem::offset_of!(RtlProcessModuleInformation, image_base), 0x10);
            assert_eq!(
                core::mem::offset_of!(RtlProcessModuleInformation, offset_to_file_name),
                0x26
            );
            assert_eq!(
                core::mem::offset_of!(RtlProcessModuleInformation, full_path_name),
                0x28
            );
            assert_eq!(core::mem::size_of::<RtlProcessModuleInformation>(), 0x128);
            assert_eq!(core::mem::offset_of!(RtlProcessModules, modules), 8);
        }
        #[cfg(target_pointer_width = "32")]
        {
            assert_eq!(core::mem::offset_of!(RtlProcessModuleInformation, image_base), 0x08);
            assert_eq!(
                core::mem::offset_of!(RtlProcessModuleInformation, full_path_name),
                0x1C
            );
            assert_eq!(core::mem::offset_of!(RtlProcessModules, modules), 4);
        }
    }
}
