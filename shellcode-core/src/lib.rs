//! Compile-time framework for building Windows position-independent
//! shellcode.
//!
//! A blob built with this crate is the raw `.text` section of a
//! freestanding PE: copy it anywhere, in user or kernel mode, on x86 or
//! x64, and call byte zero as
//! `entry(argument1, argument2)`. The author declares the modules and
//! symbols they intend to call; the framework generates a dispatch table
//! and call proxies at compile time, and at runtime resolves every
//! declared module from the loader's own data structures and every symbol
//! from its module's PE export directory, by string or by case-folded
//! FNV-1a hash.
//!
//! ```ignore
//! #![no_std]
//! #![no_main]
//! use core::ffi::c_void;
//! use shellcode_core::text;
//!
//! shellcode_core::imports! {
//!     mode: user;
//!     module kernel32 = "kernel32.dll" {
//!         fn Sleep(milliseconds: u32);
//!     }
//!     module user32 = "user32.dll" [DYNAMIC_LOAD] {
//!         fn MessageBoxA(wnd: *mut c_void, text: *const u8,
//!                        caption: *const u8, style: u32) -> i32;
//!     }
//! }
//!
//! fn entry(_argument1: *mut c_void, _argument2: *mut c_void) {
//!     unsafe {
//!         Sleep(1000);
//!         MessageBoxA(core::ptr::null_mut(), text!("Hi"), text!("blob"), 0);
//!     }
//! }
//! ```
//!
//! Everything the blob needs at runtime is in this crate and inlines into
//! the author's binary; the workspace tools (`scextract`, `scrun`) verify
//! the PE layout, extract the section, and exercise the result. Cargo
//! features mirror the build-time options: `cleanup`, `load-module`,
//! `unload-module`, `lookup-symbol`, `xor-string`, `full-module-search`,
//! `module-forwarder`, `init-modules-by-string`, `init-symbols-by-string`.
//! They all default off; each one adds code or slots to the output.

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod crt;
pub mod hash;
pub mod kernel;
pub mod kernelmode;
pub mod macros;
pub mod pe;
pub mod peb;
pub mod pic;
pub mod table;
pub mod usermode;
pub mod xorstr;

pub use table::{
    DYNAMIC_LOAD, DYNAMIC_RESOLVE, DYNAMIC_UNLOAD, STRING_MODULE, STRING_SYMBOL,
};
