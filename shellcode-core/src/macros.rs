//! The import declaration block and embedded-string macros.
//!
//! [`imports!`] is the author-facing declaration mini-language. One
//! invocation per blob:
//!
//! ```ignore
//! shellcode_core::imports! {
//!     mode: user;
//!     module kernel32 = "kernel32.dll" {
//!         fn WriteConsoleA(console: *mut c_void, buffer: *const u8,
//!                          length: u32, written: *mut u32,
//!                          reserved: *mut c_void) -> i32;
//!     }
//!     module user32 = "user32.dll" [DYNAMIC_LOAD | DYNAMIC_UNLOAD] {
//!         fn MessageBoxA(wnd: *mut c_void, text: *const u8,
//!                        caption: *const u8, style: u32) -> i32;
//!     }
//! }
//!
//! fn entry(argument1: *mut c_void, argument2: *mut c_void) {
//!     unsafe { WriteConsoleA(/* … */) };
//! }
//! ```
//!
//! The expansion is a flat record plus free functions: `__DispatchTable`
//! (base slots, then one slot per declaration in order), `__table_init` /
//! `__table_destroy` (the forward and reverse traversals of the chain),
//! one zero-cost call proxy per symbol, the `_entry` routine, and the
//! entry stub assembly for the built-in modes. The author must define
//! `entry(argument1, argument2)` in the same module.
//!
//! Declaration forms inside a `module` block:
//!
//! - `fn Name(arg: Ty, …) -> Ret;` — callable import, `extern "system"`.
//! - `extern "C" fn Name(arg: Ty, …, ...) -> Ret;` — explicit ABI; with a
//!   trailing `...` the import is variadic and the proxy is an accessor
//!   returning the fn pointer (`Name()(args…)`), since Rust functions
//!   cannot themselves be variadic.
//! - `static Name: Ty;` — value import: the slot holds the export's
//!   address and `Name()` returns it as `Ty`.
//! - Any form may be prefixed with `[FLAGS]`, e.g.
//!   `[STRING_SYMBOL] fn NtClose(handle: *mut c_void) -> i32;`.
//!
//! `mode:` is `user`, `kernel`, or a path to a custom
//! [`crate::table::Mode`] type; custom modes get the table and chain but
//! no entry stub, which is how the chain protocol is tested off target.

/// Chooses between the XOR-encoded and plain renditions of an embedded
/// string. This is a macro rather than `cfg!` because expansions land in
/// the author's crate, where `cfg!(feature = "xor-string")` would observe
/// the wrong feature set — and the untaken branch must not expand at all,
/// or its plaintext static would still reach the binary.
#[cfg(feature = "xor-string")]
#[doc(hidden)]
#[macro_export]
macro_rules! __xor_select {
    ($encoded:expr, $plain:expr) => {
        $encoded
    };
}

#[cfg(not(feature = "xor-string"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __xor_select {
    ($encoded:expr, $plain:expr) => {
        $plain
    };
}

/// Embed a NUL-terminated narrow string in the blob and yield a runtime
/// pointer to it: relocated on x86, XOR-encoded (and lazily decoded in
/// place) under the `xor-string` feature.
#[macro_export]
macro_rules! text {
    ($s:literal) => {
        $crate::__xor_select!(
            {
                #[link_section = ".text$s"]
                static ENCODED: $crate::crt::StaticCell<
                    $crate::xorstr::XorString<{ $s.len() + 1 }>,
                > = $crate::crt::StaticCell::new($crate::xorstr::XorString::new(
                    $s,
                    $crate::xorstr::key_from_seed(::core::line!()),
                ));
                unsafe { $crate::xorstr::decode($crate::pic::relocate_mut(ENCODED.get())) }
            },
            {
                #[link_section = ".text$s"]
                static PLAIN: [u8; { $s.len() + 1 }] = $crate::crt::to_cstr($s);
                $crate::pic::relocate(PLAIN.as_ptr())
            }
        )
    };
}

/// Wide-string variant of [`text!`]: yields `*const u16`.
#[macro_export]
macro_rules! wtext {
    ($s:literal) => {
        $crate::__xor_select!(
            {
                #[link_section = ".text$s"]
                static ENCODED: $crate::crt::StaticCell<
                    $crate::xorstr::XorWString<{ $s.len() + 1 }>,
                > = $crate::crt::StaticCell::new($crate::xorstr::XorWString::new(
                    $s,
                    $crate::xorstr::wide_key_from_seed(::core::line!()),
                ));
                unsafe { $crate::xorstr::decode_wide($crate::pic::relocate_mut(ENCODED.get())) }
            },
            {
                #[link_section = ".text$s"]
                static PLAIN: [u16; { $s.len() + 1 }] = $crate::crt::to_wcstr($s);
                $crate::pic::relocate(PLAIN.as_ptr())
            }
        )
    };
}

/// Framework-internal embedded string: like [`text!`] but keyed by the
/// literal's hash, because every name inside one `imports!` expansion
/// shares the invocation's `line!()`.
#[doc(hidden)]
#[macro_export]
macro_rules! __embedded_cstr {
    ($s:expr) => {
        $crate::__xor_select!(
            {
                #[link_section = ".text$s"]
                static ENCODED: $crate::crt::StaticCell<
                    $crate::xorstr::XorString<{ $s.len() + 1 }>,
                > = $crate::crt::StaticCell::new($crate::xorstr::XorString::new(
                    $s,
                    $crate::xorstr::key_from_seed($crate::hash::fnv1a_str($s)),
                ));
                unsafe { $crate::xorstr::decode($crate::pic::relocate_mut(ENCODED.get())) }
            },
            {
                #[link_section = ".text$s"]
                static PLAIN: [u8; { $s.len() + 1 }] = $crate::crt::to_cstr($s);
                $crate::pic::relocate(PLAIN.as_ptr())
            }
        )
    };
}

/// Per-entry flag expression evaluated with the flag constants in scope,
/// so declarations can say `[DYNAMIC_LOAD | STRING_SYMBOL]` unqualified.
#[doc(hidden)]
#[macro_export]
macro_rules! __flags {
    ($flags:expr) => {{
        #[allow(unused_imports)]
        use $crate::table::*;
        $flags
    }};
}

#[macro_export]
macro_rules! imports {
    (mode: user; $($body:tt)*) => {
        $crate::__imports_common!($crate::usermode::User; exported; $($body)*);
        $crate::__imports_entry_fn!();
        $crate::__stub_asm_user!();
    };
    (mode: kernel; $($body:tt)*) => {
        $crate::__imports_common!($crate::kernelmode::Kernel; exported; $($body)*);
        $crate::__imports_entry_fn!();
        $crate::__stub_asm_kernel!();
    };
    (mode: $mode:path; $($body:tt)*) => {
        $crate::__imports_common!($mode; local; $($body)*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __imports_common {
    ($mode:path; $place:ident; $($body:tt)*) => {
        $crate::__imports_table!($mode; $place; $($body)*);
        $crate::__imports_init!($mode; $($body)*);
        $crate::__imports_destroy!($mode; $($body)*);
        $crate::__imports_proxies!($($body)*);
    };
}

//
// Table layout: accumulate one field per declaration, then emit the record
// and its zeroed initializer in a single final step.
//

#[doc(hidden)]
#[macro_export]
macro_rules! __imports_table {
    // module with flags
    (@mods $mode:path; $place:ident; [$($fields:tt)*]; [$($inits:tt)*];
     module $mid:ident = $mname:literal [$mflags:expr] { $($syms:tt)* } $($rest:tt)*) => {
        $crate::__imports_table!(@syms $mode; $place;
            [$($fields)* pub $mid: *mut ::core::ffi::c_void,];
            [$($inits)* $mid: ::core::ptr::null_mut(),];
            [$($rest)*];
            $($syms)*);
    };
    // module without flags
    (@mods $mode:path; $place:ident; [$($fields:tt)*]; [$($inits:tt)*];
     module $mid:ident = $mname:literal { $($syms:tt)* } $($rest:tt)*) => {
        $crate::__imports_table!(@mods $mode; $place; [$($fields)*]; [$($inits)*];
            module $mid = $mname [0u32] { $($syms)* } $($rest)*);
    };
    // all modules consumed
    (@mods $mode:path; $place:ident; [$($fields:tt)*]; [$($inits:tt)*];) => {
        $crate::__imports_table!(@finish $mode; $place; [$($fields)*]; [$($inits)*]);
    };

    // callable symbol
    (@syms $mode:path; $place:ident; [$($fields:tt)*]; [$($inits:tt)*]; [$($rest:tt)*];
     [$sflags:expr] extern $abi:literal fn $name:ident ($($arg:ident : $aty:ty),*) $(-> $ret:ty)? ;
     $($more:tt)*) => {
        $crate::__imports_table!(@syms $mode; $place;
            [$($fields)* pub $name: ::core::option::Option<
                unsafe extern $abi fn($($aty),*) $(-> $ret)?>,];
            [$($inits)* $name: ::core::option::Option::None,];
            [$($rest)*];
            $($more)*);
    };
    // variadic callable symbol
    (@syms $mode:path; $place:ident; [$($fields:tt)*]; [$($inits:tt)*]; [$($rest:tt)*];
     [$sflags:expr] extern $abi:literal fn $name:ident ($($arg:ident : $aty:ty,)* ...) $(-> $ret:ty)? ;
     $($more:tt)*) => {
        $crate::__imports_table!(@syms $mode; $place;
            [$($fields)* pub $name: ::core::option::Option<
                unsafe extern $abi fn($($aty,)* ...) $(-> $ret)?>,];
            [$($inits)* $name: ::core::option::Option::None,];
            [$($rest)*];
            $($more)*);
    };
    // value symbol
    (@syms $mode:path; $place:ident; [$($fields:tt)*]; [$($inits:tt)*]; [$($rest:tt)*];
     [$sflags:expr] static $name:ident : $ty:ty ; $($more:tt)*) => {
        $crate::__imports_table!(@syms $mode; $place;
            [$($fields)* pub $name: *mut ::core::ffi::c_void,];
            [$($inits)* $name: ::core::ptr::null_mut(),];
            [$($rest)*];
            $($more)*);
    };
    // normalizations: default ABI, default flags
    (@syms $mode:path; $place:ident; $f:tt; $i:tt; $r:tt;
     [$sflags:expr] fn $($decl:tt)*) => {
        $crate::__imports_table!(@syms $mode; $place; $f; $i; $r;
            [$sflags] extern "system" fn $($decl)*);
    };
    (@syms $mode:path; $place:ident; $f:tt; $i:tt; $r:tt;
     extern $abi:literal fn $($decl:tt)*) => {
        $crate::__imports_table!(@syms $mode; $place; $f; $i; $r;
            [0u32] extern $abi fn $($decl)*);
    };
    (@syms $mode:path; $place:ident; $f:tt; $i:tt; $r:tt;
     fn $($decl:tt)*) => {
        $crate::__imports_table!(@syms $mode; $place; $f; $i; $r;
            [0u32] extern "system" fn $($decl)*);
    };
    (@syms $mode:path; $place:ident; $f:tt; $i:tt; $r:tt;
     static $($decl:tt)*) => {
        $crate::__imports_table!(@syms $mode; $place; $f; $i; $r;
            [0u32] static $($decl)*);
    };
    // symbol list consumed: resume with the remaining modules
    (@syms $mode:path; $place:ident; [$($fields:tt)*]; [$($inits:tt)*]; [$($rest:tt)*];) => {
        $crate::__imports_table!(@mods $mode; $place; [$($fields)*]; [$($inits)*]; $($rest)*);
    };

    (@finish $mode:path; $place:ident; [$($fields:tt)*]; [$($inits:tt)*]) => {
        /// The single global dispatch table for this blob: base slots
        /// first, then one slot per declared entry in declaration order.
        #[repr(C)]
        #[allow(non_snake_case)]
        pub struct __DispatchTable {
            pub base: $crate::table::BaseSlots<$mode>,
            $($fields)*
        }

        impl __DispatchTable {
            pub const EMPTY: Self = Self {
                base: $crate::table::BaseSlots::empty(),
                $($inits)*
            };
        }

        $crate::__imports_table!(@static $place);
    };
    (@static exported) => {
        #[export_name = "__dispatch_table"]
        #[link_section = ".text$t"]
        static __DISPATCH_TABLE: $crate::crt::StaticCell<__DispatchTable> =
            $crate::crt::StaticCell::new(__DispatchTable::EMPTY);

        #[allow(dead_code)]
        #[inline(always)]
        fn __dispatch_table_ptr() -> *mut __DispatchTable {
            $crate::pic::relocate_mut(__DISPATCH_TABLE.get())
        }
    };
    (@static local) => {
        static __DISPATCH_TABLE: $crate::crt::StaticCell<__DispatchTable> =
            $crate::crt::StaticCell::new(__DispatchTable::EMPTY);

        #[allow(dead_code)]
        #[inline(always)]
        fn __dispatch_table_ptr() -> *mut __DispatchTable {
            $crate::pic::relocate_mut(__DISPATCH_TABLE.get())
        }
    };

    ($mode:path; $place:ident; $($body:tt)*) => {
        $crate::__imports_table!(@mods $mode; $place; []; []; $($body)*);
    };
}

//
// Init: base first, then every entry in declaration order. Each entry
// bumps the index and returns it on failure, so the caller can tell which
// link broke.
//

#[doc(hidden)]
#[macro_export]
macro_rules! __imports_init {
    (@mods $mode:path; $t:ident; $ix:ident;
     module $mid:ident = $mname:literal [$mflags:expr] { $($syms:tt)* } $($rest:tt)*) => {
        $ix += 1;
        {
            const MODULE_FLAGS: u32 = $crate::__flags!($mflags);
            const _: () = {
                assert!(
                    MODULE_FLAGS & $crate::table::DYNAMIC_UNLOAD == 0
                        || MODULE_FLAGS & $crate::table::DYNAMIC_LOAD != 0,
                    "DYNAMIC_UNLOAD requires DYNAMIC_LOAD"
                );
                assert!(
                    MODULE_FLAGS
                        & ($crate::table::DYNAMIC_LOAD | $crate::table::DYNAMIC_UNLOAD) == 0
                        || <$mode as $crate::table::Mode>::SUPPORTS_DYNAMIC,
                    "dynamic module loading is not supported in this mode"
                );
                assert!(
                    MODULE_FLAGS & $crate::table::DYNAMIC_LOAD == 0
                        || $crate::table::features::LOAD_MODULE,
                    "DYNAMIC_LOAD requires the load-module feature"
                );
                assert!(
                    MODULE_FLAGS & $crate::table::DYNAMIC_UNLOAD == 0
                        || $crate::table::features::UNLOAD_MODULE,
                    "DYNAMIC_UNLOAD requires the unload-module feature"
                );
            };
            let handle = if MODULE_FLAGS & $crate::table::DYNAMIC_LOAD != 0 {
                <$mode as $crate::table::Mode>::load_module(
                    &(*$t).base,
                    $crate::__embedded_cstr!($mname),
                )
            } else if MODULE_FLAGS & $crate::table::STRING_MODULE != 0 {
                <$mode as $crate::table::Mode>::find_module_name(
                    &(*$t).base,
                    $crate::__embedded_cstr!($mname),
                )
            } else {
                <$mode as $crate::table::Mode>::find_module_hash(&(*$t).base, {
                    const MODULE_HASH: u32 = $crate::hash::fnv1a_str($mname);
                    MODULE_HASH
                })
            };
            if handle.is_null() {
                return $ix;
            }
            (*$t).$mid = handle;
        }
        $crate::__imports_init!(@syms $mode; $t; $ix; $mid; [$mflags]; $($syms)*);
        $crate::__imports_init!(@mods $mode; $t; $ix; $($rest)*);
    };
    (@mods $mode:path; $t:ident; $ix:ident;
     module $mid:ident = $mname:literal { $($syms:tt)* } $($rest:tt)*) => {
        $crate::__imports_init!(@mods $mode; $t; $ix;
            module $mid = $mname [0u32] { $($syms)* } $($rest)*);
    };
    (@mods $mode:path; $t:ident; $ix:ident;) => {};

    // callable and variadic symbols share one resolution shape; the value
    // form differs only in how the slot is written.
    (@syms $mode:path; $t:ident; $ix:ident; $mid:ident; [$mflags:expr];
     [$sflags:expr] extern $abi:literal fn $name:ident ($($arg:ident : $aty:ty),*) $(-> $ret:ty)? ;
     $($more:tt)*) => {
        $ix += 1;
        {
            let address = $crate::__imports_init!(@resolve $mode; $t; $mid; [$mflags]; [$sflags]; $name);
            if address.is_null() {
                return $ix;
            }
            (*$t).$name = ::core::mem::transmute(address);
        }
        $crate::__imports_init!(@syms $mode; $t; $ix; $mid; [$mflags]; $($more)*);
    };
    (@syms $mode:path; $t:ident; $ix:ident; $mid:ident; [$mflags:expr];
     [$sflags:expr] extern $abi:literal fn $name:ident ($($arg:ident : $aty:ty,)* ...) $(-> $ret:ty)? ;
     $($more:tt)*) => {
        $ix += 1;
        {
            let address = $crate::__imports_init!(@resolve $mode; $t; $mid; [$mflags]; [$sflags]; $name);
            if address.is_null() {
                return $ix;
            }
            (*$t).$name = ::core::mem::transmute(address);
        }
        $crate::__imports_init!(@syms $mode; $t; $ix; $mid; [$mflags]; $($more)*);
    };
    (@syms $mode:path; $t:ident; $ix:ident; $mid:ident; [$mflags:expr];
     [$sflags:expr] static $name:ident : $ty:ty ; $($more:tt)*) => {
        $ix += 1;
        {
            let address = $crate::__imports_init!(@resolve $mode; $t; $mid; [$mflags]; [$sflags]; $name);
            if address.is_null() {
                return $ix;
            }
            (*$t).$name = address;
        }
        $crate::__imports_init!(@syms $mode; $t; $ix; $mid; [$mflags]; $($more)*);
    };
    (@syms $mode:path; $t:ident; $ix:ident; $mid:ident; $mf:tt;
     [$sflags:expr] fn $($decl:tt)*) => {
        $crate::__imports_init!(@syms $mode; $t; $ix; $mid; $mf;
            [$sflags] extern "system" fn $($decl)*);
    };
    (@syms $mode:path; $t:ident; $ix:ident; $mid:ident; $mf:tt;
     extern $abi:literal fn $($decl:tt)*) => {
        $crate::__imports_init!(@syms $mode; $t; $ix; $mid; $mf;
            [0u32] extern $abi fn $($decl)*);
    };
    (@syms $mode:path; $t:ident; $ix:ident; $mid:ident; $mf:tt;
     fn $($decl:tt)*) => {
        $crate::__imports_init!(@syms $mode; $t; $ix; $mid; $mf;
            [0u32] extern "system" fn $($decl)*);
    };
    (@syms $mode:path; $t:ident; $ix:ident; $mid:ident; $mf:tt;
     static $($decl:tt)*) => {
        $crate::__imports_init!(@syms $mode; $t; $ix; $mid; $mf;
            [0u32] static $($decl)*);
    };
    (@syms $mode:path; $t:ident; $ix:ident; $mid:ident; $mf:tt;) => {};

    // Effective flags are the symbol's own plus the inheritable bits of
    // its enclosing module; the strategy branches are constant and the
    // untaken ones fold away, encoded names included.
    (@resolve $mode:path; $t:ident; $mid:ident; [$mflags:expr]; [$sflags:expr]; $name:ident) => {{
        const SYMBOL_FLAGS: u32 = $crate::__flags!($sflags);
        const EFFECTIVE: u32 = SYMBOL_FLAGS
            | ($crate::__flags!($mflags)
                & ($crate::table::DYNAMIC_RESOLVE | $crate::table::STRING_SYMBOL));
        const _: () = {
            assert!(
                SYMBOL_FLAGS & $crate::table::DYNAMIC_LOAD == 0,
                "DYNAMIC_LOAD can only be used on a module"
            );
            assert!(
                SYMBOL_FLAGS & $crate::table::DYNAMIC_UNLOAD == 0,
                "DYNAMIC_UNLOAD can only be used on a module"
            );
            assert!(
                SYMBOL_FLAGS & $crate::table::STRING_MODULE == 0,
                "STRING_MODULE can only be used on a module"
            );
            assert!(
                EFFECTIVE & $crate::table::DYNAMIC_RESOLVE == 0
                    || <$mode as $crate::table::Mode>::SUPPORTS_DYNAMIC,
                "dynamic symbol lookup is not supported in this mode"
            );
            assert!(
                EFFECTIVE & $crate::table::DYNAMIC_RESOLVE == 0
                    || $crate::table::features::LOOKUP_SYMBOL,
                "DYNAMIC_RESOLVE requires the lookup-symbol feature"
            );
        };
        if EFFECTIVE & $crate::table::DYNAMIC_RESOLVE != 0 {
            <$mode as $crate::table::Mode>::lookup_symbol_dynamic(
                &(*$t).base,
                (*$t).$mid,
                $crate::__embedded_cstr!(stringify!($name)),
            )
        } else if EFFECTIVE & $crate::table::STRING_SYMBOL != 0 {
            <$mode as $crate::table::Mode>::lookup_symbol_name(
                &(*$t).base,
                (*$t).$mid,
                $crate::__embedded_cstr!(stringify!($name)),
            )
        } else {
            <$mode as $crate::table::Mode>::lookup_symbol_hash(&(*$t).base, (*$t).$mid, {
                const SYMBOL_HASH: u32 = $crate::hash::fnv1a_str(stringify!($name));
                SYMBOL_HASH
            })
        }
    }};

    ($mode:path; $($body:tt)*) => {
        #[allow(dead_code, unused_variables, unused_mut)]
        unsafe fn __table_init(
            table: *mut __DispatchTable,
            argument1: *mut ::core::ffi::c_void,
            argument2: *mut ::core::ffi::c_void,
        ) -> u32 {
            let err = <$mode as $crate::table::Mode>::base_init(
                &mut (*table).base,
                argument1,
                argument2,
            );
            if err != 0 {
                return err;
            }
            let mut index: u32 = 0;
            $crate::__imports_init!(@mods $mode; table; index; $($body)*);
            0
        }
    };
}

//
// Destroy: unwind the chain end-first. Symbols have nothing to release;
// module links unload iff they dynamically loaded and were asked to.
//

#[doc(hidden)]
#[macro_export]
macro_rules! __imports_destroy {
    (@mods $mode:path; $t:ident;
     module $mid:ident = $mname:literal [$mflags:expr] { $($syms:tt)* } $($rest:tt)*) => {
        // Later declarations unwind first.
        $crate::__imports_destroy!(@mods $mode; $t; $($rest)*);
        {
            const MODULE_FLAGS: u32 = $crate::__flags!($mflags);
            const DYNAMIC: u32 = $crate::table::DYNAMIC_LOAD | $crate::table::DYNAMIC_UNLOAD;
            if MODULE_FLAGS & DYNAMIC == DYNAMIC && !(*$t).$mid.is_null() {
                <$mode as $crate::table::Mode>::unload_module(&(*$t).base, (*$t).$mid);
            }
        }
    };
    (@mods $mode:path; $t:ident;
     module $mid:ident = $mname:literal { $($syms:tt)* } $($rest:tt)*) => {
        $crate::__imports_destroy!(@mods $mode; $t;
            module $mid = $mname [0u32] { $($syms)* } $($rest)*);
    };
    (@mods $mode:path; $t:ident;) => {};

    ($mode:path; $($body:tt)*) => {
        #[allow(dead_code, unused_variables)]
        unsafe fn __table_destroy(
            table: *mut __DispatchTable,
            argument1: *mut ::core::ffi::c_void,
            argument2: *mut ::core::ffi::c_void,
        ) {
            $crate::__imports_destroy!(@mods $mode; table; $($body)*);
            <$mode as $crate::table::Mode>::base_destroy(
                &mut (*table).base,
                argument1,
                argument2,
            );
        }
    };
}

//
// Proxies: the author-visible surface. A callable import becomes a
// function of the same name whose body is one read and one indirect call;
// nothing validates the slot, a never-resolved slot is a null call.
//

#[doc(hidden)]
#[macro_export]
macro_rules! __imports_proxies {
    (@mods module $mid:ident = $mname:literal $([$mflags:expr])? { $($syms:tt)* } $($rest:tt)*) => {
        $crate::__imports_proxies!(@syms $($syms)*);
        $crate::__imports_proxies!(@mods $($rest)*);
    };
    (@mods) => {};

    (@syms [$sflags:expr] extern $abi:literal fn $name:ident ($($arg:ident : $aty:ty),*) $(-> $ret:ty)? ;
     $($more:tt)*) => {
        #[allow(non_snake_case, dead_code, clippy::too_many_arguments)]
        #[inline(always)]
        pub unsafe fn $name($($arg: $aty),*) $(-> $ret)? {
            ((*__dispatch_table_ptr()).$name.unwrap_unchecked())($($arg),*)
        }
        $crate::__imports_proxies!(@syms $($more)*);
    };
    // Variadic import: expose the resolved pointer, call as `Name()(…)`.
    (@syms [$sflags:expr] extern $abi:literal fn $name:ident ($($arg:ident : $aty:ty,)* ...) $(-> $ret:ty)? ;
     $($more:tt)*) => {
        #[allow(non_snake_case, dead_code)]
        #[inline(always)]
        pub unsafe fn $name() -> unsafe extern $abi fn($($aty,)* ...) $(-> $ret)? {
            (*__dispatch_table_ptr()).$name.unwrap_unchecked()
        }
        $crate::__imports_proxies!(@syms $($more)*);
    };
    // Value import: the slot holds the export's address.
    (@syms [$sflags:expr] static $name:ident : $ty:ty ; $($more:tt)*) => {
        #[allow(non_snake_case, dead_code)]
        #[inline(always)]
        pub unsafe fn $name() -> $ty {
            ::core::mem::transmute::<*mut ::core::ffi::c_void, $ty>(
                (*__dispatch_table_ptr()).$name,
            )
        }
        $crate::__imports_proxies!(@syms $($more)*);
    };
    (@syms [$sflags:expr] fn $($decl:tt)*) => {
        $crate::__imports_proxies!(@syms [$sflags] extern "system" fn $($decl)*);
    };
    (@syms extern $abi:literal fn $($decl:tt)*) => {
        $crate::__imports_proxies!(@syms [0u32] extern $abi fn $($decl)*);
    };
    (@syms fn $($decl:tt)*) => {
        $crate::__imports_proxies!(@syms [0u32] extern "system" fn $($decl)*);
    };
    (@syms static $($decl:tt)*) => {
        $crate::__imports_proxies!(@syms [0u32] static $($decl)*);
    };
    (@syms) => {};

    ($($body:tt)*) => {
        $crate::__imports_proxies!(@mods $($body)*);
    };
}

//
// `_entry`: resolve the table through the PIC fixup, run the chain, run
// the author's body, unwind. Skipped entirely when init fails.
//

#[doc(hidden)]
#[macro_export]
macro_rules! __imports_entry_fn {
    () => {
        #[cfg(target_arch = "x86")]
        #[no_mangle]
        #[cfg_attr(windows, link_section = ".text$20")]
        pub unsafe extern "fastcall" fn _entry(
            argument1: *mut ::core::ffi::c_void,
            argument2: *mut ::core::ffi::c_void,
        ) {
            __entry_impl(argument1, argument2);
        }

        #[cfg(not(target_arch = "x86"))]
        #[no_mangle]
        #[cfg_attr(windows, link_section = ".text$20")]
        pub unsafe extern "system" fn _entry(
            argument1: *mut ::core::ffi::c_void,
            argument2: *mut ::core::ffi::c_void,
        ) {
            __entry_impl(argument1, argument2);
        }

        #[inline(always)]
        unsafe fn __entry_impl(
            argument1: *mut ::core::ffi::c_void,
            argument2: *mut ::core::ffi::c_void,
        ) {
            let table = __dispatch_table_ptr();
            if __table_init(table, argument1, argument2) != 0 {
                return;
            }
            entry(argument1, argument2);
            __table_destroy(table, argument1, argument2);
        }
    };
}
