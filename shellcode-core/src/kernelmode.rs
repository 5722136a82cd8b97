//! Kernel-mode platform backend.
//!
//! `argument1` must be the kernel image base; there is no reliable
//! self-discovery from inside an arbitrary kernel thread, so the invoker
//! provides it and base init stashes it in the mode state. Module lookup
//! queries system module information (`kernel.rs`); symbol lookup is the
//! same export walker as user mode, without forwarder support. Dynamic
//! load/unload/resolve do not exist here and are rejected at compile time
//! through `SUPPORTS_DYNAMIC`.

use crate::hash;
use crate::kernel;
use crate::pe;
use crate::table::{BaseSlots, Mode};
use core::ffi::c_void;

#[cfg(all(
    windows,
    any(target_arch = "x86", target_arch = "x86_64"),
    feature = "cleanup",
    not(test)
))]
extern "C" {
    /// Assembly cleanup tail (`arch.rs`): reads `free` from slot 1 and
    /// tail-calls `ExFreePool(blob_base)`.
    fn _cleanup_kernelmode();
}

#[repr(C)]
pub struct KernelState {
    pub kernel_base: *mut c_void,
}

pub struct Kernel;

impl Mode for Kernel {
    type State = KernelState;
    const INIT_STATE: KernelState = KernelState {
        kernel_base: core::ptr::null_mut(),
    };
    const SUPPORTS_DYNAMIC: bool = false;

    /// `ExFreePool`.
    #[cfg(feature = "cleanup")]
    type FreeFn = unsafe extern "system" fn(*mut c_void);

    unsafe fn base_init(
        slots: &mut BaseSlots<Self>,
        argument1: *mut c_void,
        _argument2: *mut c_void,
    ) -> u32 {
        slots.state.kernel_base = argument1;

        #[cfg(feature = "cleanup")]
        {
            #[cfg(all(
                windows,
                any(target_arch = "x86", target_arch = "x86_64"),
                not(test)
            ))]
            {
                slots.cleanup = Some(core::mem::transmute(crate::pic::relocate_raw(
                    _cleanup_kernelmode as usize,
                )));
            }
            #[cfg(not(feature = "init-symbols-by-string"))]
            let free = pe::export_by_hash(argument1, hash::fnv1a_str("ExFreePool"), None);
            #[cfg(feature = "init-symbols-by-string")]
            let free = pe::export_by_name(argument1, crate::__embedded_cstr!("ExFreePool"), None);
            slots.free = core::mem::transmute(free);
        }

        0
    }

    unsafe fn base_destroy(
        _slots: &mut BaseSlots<Self>,
        _argument1: *mut c_void,
        _argument2: *mut c_void,
    ) {
    }

    unsafe fn find_module_hash(slots: &BaseSlots<Self>, module_hash: u32) -> *mut c_void {
        if module_hash == hash::NTOSKRNL_HASH {
            return slots.state.kernel_base;
        }
        kernel::find_module_by_hash(slots.state.kernel_base, module_hash)
    }

    unsafe fn find_module_name(slots: &BaseSlots<Self>, name: *const u8) -> *mut c_void {
        if crate::crt::eq_cstr_nocase(name, b"ntoskrnl.exe\0".as_ptr()) {
            return slots.state.kernel_base;
        }
        kernel::find_module_by_ascii(slots.state.kernel_base, name)
    }

    unsafe fn lookup_symbol_hash(
        _slots: &BaseSlots<Self>,
        module: *mut c_void,
        symbol_hash: u32,
    ) -> *mut c_void {
        pe::export_by_hash(module, symbol_hash, None)
    }

    unsafe fn lookup_symbol_name(
        _slots: &BaseSlots<Self>,
        module: *mut c_void,
        name: *const u8,
    ) -> *mut c_void {
        pe::export_by_name(module, name, None)
    }

    // The dynamic operations are unreachable: declarations carrying
    // DYNAMIC_* flags fail to compile against this mode.
    unsafe fn lookup_symbol_dynamic(
        _slots: &BaseSlots<Self>,
        _module: *mut c_void,
        _name: *const u8,
    ) -> *mut c_void {
        core::ptr::null_mut()
    }

    unsafe fn load_module(_slots: &BaseSlots<Self>, _name: *const u8) -> *mut c_void {
        core::ptr::null_mut()
    }

    unsafe fn unload_module(_slots: &BaseSlots<Self>, _module: *mut c_void) {}
}
