//! User-mode platform backend.
//!
//! Base init resolves kernel32 through the loader list (fast path unless
//! `full-module-search`) and then, feature by feature, the primitives the
//! rest of the run needs: `VirtualFree` for the cleanup tail,
//! `GetProcAddress` for DYNAMIC_RESOLVE, `LoadLibraryA` / `FreeLibrary`
//! for DYNAMIC_LOAD / DYNAMIC_UNLOAD. Names are hashed unless the
//! `init-*-by-string` features switch the bootstrap to string compares.

use crate::pe;
use crate::peb;
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
    /// tail-calls `VirtualFree(blob_base, 0, MEM_RELEASE)`.
    fn _cleanup_usermode();
}

/// Resolve a bootstrap export from kernel32, by hash or by string.
macro_rules! base_symbol {
    ($kernel32:expr, $name:literal) => {{
        #[cfg(not(feature = "init-symbols-by-string"))]
        let address = pe::export_by_hash(
            $kernel32,
            $crate::hash::fnv1a_str($name),
            Some(peb::find_module_by_ascii as pe::ModuleResolver),
        );
        #[cfg(feature = "init-symbols-by-string")]
        let address = pe::export_by_name(
            $kernel32,
            $crate::__embedded_cstr!($name),
            Some(peb::find_module_by_ascii as pe::ModuleResolver),
        );
        address
    }};
}

pub struct User;

impl Mode for User {
    type State = ();
    const INIT_STATE: () = ();
    const SUPPORTS_DYNAMIC: bool = true;

    /// `VirtualFree`.
    #[cfg(feature = "cleanup")]
    type FreeFn = unsafe extern "system" fn(*mut c_void, usize, u32) -> i32;

    unsafe fn base_init(
        slots: &mut BaseSlots<Self>,
        _argument1: *mut c_void,
        _argument2: *mut c_void,
    ) -> u32 {
        let _ = &slots;

        // kernel32 is only needed when at least one optional primitive is
        // compiled in.
        #[cfg(any(
            feature = "cleanup",
            feature = "load-module",
            feature = "unload-module",
            feature = "lookup-symbol"
        ))]
        {
            #[cfg(not(feature = "init-modules-by-string"))]
            let kernel32 = peb::find_module_by_hash(crate::hash::KERNEL32_HASH);
            #[cfg(feature = "init-modules-by-string")]
            let kernel32 = peb::find_module_by_ascii(crate::__embedded_cstr!("kernel32.dll"));

            #[cfg(feature = "cleanup")]
            {
                #[cfg(all(
                    windows,
                    any(target_arch = "x86", target_arch = "x86_64"),
                    not(test)
                ))]
                {
                    slots.cleanup = Some(core::mem::transmute(crate::pic::relocate_raw(
                        _cleanup_usermode as usize,
                    )));
                }
                slots.free = core::mem::transmute(base_symbol!(kernel32, "VirtualFree"));
            }
            #[cfg(feature = "lookup-symbol")]
            {
                slots.lookup_symbol =
                    core::mem::transmute(base_symbol!(kernel32, "GetProcAddress"));
            }
            #[cfg(feature = "load-module")]
            {
                slots.load_module = core::mem::transmute(base_symbol!(kernel32, "LoadLibraryA"));
            }
            #[cfg(feature = "unload-module")]
            {
                slots.unload_module = core::mem::transmute(base_symbol!(kernel32, "FreeLibrary"));
            }
        }

        0
    }

    unsafe fn base_destroy(
        _slots: &mut BaseSlots<Self>,
        _argument1: *mut c_void,
        _argument2: *mut c_void,
    ) {
        // Freeing the blob's own pages is the assembly tail's job, after
        // this has returned.
    }

    unsafe fn find_module_hash(_slots: &BaseSlots<Self>, module_hash: u32) -> *mut c_void {
        peb::find_module_by_hash(module_hash)
    }

    unsafe fn find_module_name(_slots: &BaseSlots<Self>, name: *const u8) -> *mut c_void {
        peb::find_module_by_ascii(name)
    }

    unsafe fn lookup_symbol_hash(
        _slots: &BaseSlots<Self>,
        module: *mut c_void,
        symbol_hash: u32,
    ) -> *mut c_void {
        pe::export_by_hash(
            module,
            symbol_hash,
            Some(peb::find_module_by_ascii as pe::ModuleResolver),
        )
    }

    unsafe fn lookup_symbol_name(
        _slots: &BaseSlots<Self>,
        module: *mut c_void,
        name: *const u8,
    ) -> *mut c_void {
        pe::export_by_name(
            module,
            name,
            Some(peb::find_module_by_ascii as pe::ModuleResolver),
        )
    }

    unsafe fn lookup_symbol_dynamic(
        slots: &BaseSlots<Self>,
        module: *mut c_void,
        name: *const u8,
    ) -> *mut c_void {
        #[cfg(feature = "lookup-symbol")]
        {
            (slots.lookup_symbol.unwrap_unchecked())(module, name)
        }
        #[cfg(not(feature = "lookup-symbol"))]
        {
            let _ = (slots, module, name);
            core::ptr::null_mut()
        }
    }

    unsafe fn load_module(slots: &BaseSlots<Self>, name: *const u8) -> *mut c_void {
        #[cfg(feature = "load-module")]
        {
            (slots.load_module.unwrap_unchecked())(name)
        }
        #[cfg(not(feature = "load-module"))]
        {
            let _ = (slots, name);
            core::ptr::null_mut()
        }
    }

    unsafe fn unload_module(slots: &BaseSlots<Self>, module: *mut c_void) {
        #[cfg(feature = "unload-module")]
        {
            (slots.unload_module.unwrap_unchecked())(module);
        }
        #[cfg(not(feature = "unload-module"))]
        {
            let _ = (slots, module);
        }
    }
}
