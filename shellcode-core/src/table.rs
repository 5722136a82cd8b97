//! Dispatch table base storage and the platform mode seam.
//!
//! The dispatch table is one flat `repr(C)` record: these base slots
//! first, then one slot per declared entry in declaration order (the
//! [`crate::imports!`] macro generates that part). The entry stub assembly
//! reads the first two slots at hardcoded offsets:
//!
//! ```text
//! x86                         x64
//! +0  cleanup                 +0   cleanup
//! +4  free                    +8   free
//! +8  load_module             +16  load_module
//! +12 unload_module           +24  unload_module
//! +16 lookup_symbol           +32  lookup_symbol
//! ```
//!
//! Each slot exists only when its feature is enabled; do not reorder the
//! fields without updating the assembly in `arch.rs`.

use core::ffi::c_void;

/// Symbol lookup goes through the platform's dynamic resolver
/// (`GetProcAddress`). Implies the name is kept as a string. On a module,
/// applies to all of its symbols. Requires the `lookup-symbol` feature.
pub const DYNAMIC_RESOLVE: u32 = 0x01;

/// Module is loaded with `LoadLibraryA` instead of being found in the
/// loader list; for DLLs not already present in the target process.
/// Module-only; user-mode only. Requires the `load-module` feature.
pub const DYNAMIC_LOAD: u32 = 0x02;

/// Module is released with `FreeLibrary` during destroy. Only valid
/// together with [`DYNAMIC_LOAD`]. Requires the `unload-module` feature.
pub const DYNAMIC_UNLOAD: u32 = 0x04;

/// Module is matched by case-insensitive string instead of by hash.
/// Larger output: the name ends up in the blob.
pub const STRING_MODULE: u32 = 0x08;

/// Symbol is matched by string instead of by hash.
pub const STRING_SYMBOL: u32 = 0x10;

/// Entry ABI: fastcall on x86 (`argument1` in ecx, `argument2` in edx),
/// the native calling convention elsewhere.
#[cfg(target_arch = "x86")]
pub type EntryFn = unsafe extern "fastcall" fn(*mut c_void, *mut c_void);
#[cfg(not(target_arch = "x86"))]
pub type EntryFn = unsafe extern "system" fn(*mut c_void, *mut c_void);

/// The assembly cleanup routine: `(table, return_address)`.
pub type CleanupFn = EntryFn;

pub type LoadModuleFn = unsafe extern "system" fn(*const u8) -> *mut c_void;
pub type UnloadModuleFn = unsafe extern "system" fn(*mut c_void) -> i32;
pub type LookupSymbolFn = unsafe extern "system" fn(*mut c_void, *const u8) -> *mut c_void;

/// Feature state of this crate, for `const` assertions inside macro
/// expansions (`cfg!` there would observe the invoking crate's features).
pub mod features {
    pub const CLEANUP: bool = cfg!(feature = "cleanup");
    pub const LOAD_MODULE: bool = cfg!(feature = "load-module");
    pub const UNLOAD_MODULE: bool = cfg!(feature = "unload-module");
    pub const LOOKUP_SYMBOL: bool = cfg!(feature = "lookup-symbol");
    pub const XOR_STRING: bool = cfg!(feature = "xor-string");
}

/// Platform specialization: selects the module/symbol resolution strategy
/// and the freeing primitive behind the abstract operations the generated
/// table code calls. [`crate::usermode::User`] and
/// [`crate::kernelmode::Kernel`] are the real backends; tests supply
/// recording modes.
pub trait Mode: Sized {
    /// Opaque per-platform state stored at the end of the base slots.
    type State;
    const INIT_STATE: Self::State;

    /// Whether DYNAMIC_LOAD / DYNAMIC_UNLOAD / DYNAMIC_RESOLVE are
    /// expressible at all; the declaration macro rejects them at compile
    /// time when this is false.
    const SUPPORTS_DYNAMIC: bool;

    /// Signature of the page/pool freeing primitive stored in the `free`
    /// slot for the cleanup tail.
    #[cfg(feature = "cleanup")]
    type FreeFn: Copy;

    /// Populate the base slots. Returns 0 on success; the chain does not
    /// run on failure.
    unsafe fn base_init(
        slots: &mut BaseSlots<Self>,
        argument1: *mut c_void,
        argument2: *mut c_void,
    ) -> u32;

    /// Base-level teardown, invoked after the chain has unwound.
    unsafe fn base_destroy(
        slots: &mut BaseSlots<Self>,
        argument1: *mut c_void,
        argument2: *mut c_void,
    );

    unsafe fn find_module_hash(slots: &BaseSlots<Self>, module_hash: u32) -> *mut c_void;
    unsafe fn find_module_name(slots: &BaseSlots<Self>, name: *const u8) -> *mut c_void;

    unsafe fn lookup_symbol_hash(
        slots: &BaseSlots<Self>,
        module: *mut c_void,
        symbol_hash: u32,
    ) -> *mut c_void;
    unsafe fn lookup_symbol_name(
        slots: &BaseSlots<Self>,
        module: *mut c_void,
        name: *const u8,
    ) -> *mut c_void;

    /// Dynamic resolver (`GetProcAddress` path). Only reachable from
    /// declarations carrying [`DYNAMIC_RESOLVE`].
    unsafe fn lookup_symbol_dynamic(
        slots: &BaseSlots<Self>,
        module: *mut c_void,
        name: *const u8,
    ) -> *mut c_void;

    /// Dynamic loader. Only reachable from [`DYNAMIC_LOAD`] declarations.
    unsafe fn load_module(slots: &BaseSlots<Self>, name: *const u8) -> *mut c_void;

    /// Dynamic unloader. Only reachable from [`DYNAMIC_UNLOAD`]
    /// declarations during destroy.
    unsafe fn unload_module(slots: &BaseSlots<Self>, module: *mut c_void);
}

/// Fixed prefix of every dispatch table. See the module docs for the
/// offset contract with the assembly.
#[repr(C)]
pub struct BaseSlots<M: Mode> {
    #[cfg(feature = "cleanup")]
    pub cleanup: Option<CleanupFn>,
    #[cfg(feature = "cleanup")]
    pub free: Option<M::FreeFn>,
    #[cfg(feature = "load-module")]
    pub load_module: Option<LoadModuleFn>,
    #[cfg(feature = "unload-module")]
    pub unload_module: Option<UnloadModuleFn>,
    #[cfg(feature = "lookup-symbol")]
    pub lookup_symbol: Option<LookupSymbolFn>,
    pub state: M::State,
}

impl<M: Mode> BaseSlots<M> {
    pub const fn empty() -> Self {
        Self {
            #[cfg(feature = "cleanup")]
            cleanup: None,
            #[cfg(feature = "cleanup")]
            free: None,
            #[cfg(feature = "load-module")]
            load_module: None,
            #[cfg(feature = "unload-module")]
            unload_module: None,
            #[cfg(feature = "lookup-symbol")]
            lookup_symbol: None,
            state: M::INIT_STATE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullMode;

    impl Mode for NullMode {
        type State = ();
        const INIT_STATE: () = ();
        const SUPPORTS_DYNAMIC: bool = true;
        #[cfg(feature = "cleanup")]
        type FreeFn = unsafe extern "system" fn(*mut c_void);

        unsafe fn base_init(_: &mut BaseSlots<Self>, _: *mut c_void, _: *mut c_void) -> u32 {
            0
        }
        unsafe fn base_destroy(_: &mut BaseSlots<Self>, _: *mut c_void, _: *mut c_void) {}
        unsafe fn find_module_hash(_: &BaseSlots<Self>, _: u32) -> *mut c_void {
            core::ptr::null_mut()
        }
        unsafe fn find_module_name(_: &BaseSlots<Self>, _: *const u8) -> *mut c_void {
            core::ptr::null_mut()
        }
        unsafe fn lookup_symbol_hash(
            _: &BaseSlots<Self>,
            _: *mut c_void,
            _: u32,
        ) -> *mut c_void {
            core::ptr::null_mut()
        }
        unsafe fn lookup_symbol_name(
            _: &BaseSlots<Self>,
            _: *mut c_void,
            _: *const u8,
        ) -> *mut c_void {
            core::ptr::null_mut()
        }
        unsafe fn lookup_symbol_dynamic(
            _: &BaseSlots<Self>,
            _: *mut c_void,
            _: *const u8,
        ) -> *mut c_void {
            core::ptr::null_mut()
        }
        unsafe fn load_module(_: &BaseSlots<Self>, _: *const u8) -> *mut c_void {
            core::ptr::null_mut()
        }
        unsafe fn unload_module(_: &BaseSlots<Self>, _: *mut c_void) {}
    }

    #[test]
    fn test_base_slot_offsets_match_the_asm_contract() {
        let ptr = core::mem::size_of::<usize>();
        let mut expected = 0;
        #[cfg(feature = "cleanup")]
        {
            assert_eq!(core::mem::offset_of!(BaseSlots<NullMode>, cleanup), 0);
            assert_eq!(core::mem::offset_of!(BaseSlots<NullMode>, free), ptr);
            expected += 2 * ptr;
        }
        #[cfg(feature = "load-module")]
        {
            assert_eq!(core::mem::offset_of!(BaseSlots<NullMode>, load_module), expected);
            expected += ptr;
        }
        #[cfg(feature = "unload-module")]
        {
            assert_eq!(
                core::mem::offset_of!(BaseSlots<NullMode>, unload_module),
                expected
            );
            expected += ptr;
        }
        #[cfg(feature = "lookup-symbol")]
        {
            assert_eq!(
                core::mem::offset_of!(BaseSlots<NullMode>, lookup_symbol),
                expected
            );
            expected += ptr;
        }
        assert_eq!(core::mem::size_of::<BaseSlots<NullMode>>(), expected);
    }

    #[test]
    fn test_empty_is_all_zero() {
        let empty = BaseSlots::<NullMode>::empty();
        let bytes = unsafe {
            core::slice::from_raw_parts(
                &empty as *const _ as *const u8,
                core::mem::size_of::<BaseSlots<NullMode>>(),
            )
        };
        assert!(bytes.iter().all(|&b| b == 0));
    }
}
