//! Prints to the console through a hash-resolved `WriteConsoleA`, with
//! every embedded string XOR-encoded. Build with `--release`; the console
//! handle comes straight from the PEB process parameters, so the blob
//! calls exactly one API.

#![cfg_attr(windows, no_std, no_main)]

#[cfg(windows)]
mod blob {
    use core::ffi::c_void;
    use shellcode_core::peb;
    use shellcode_core::text;

    shellcode_core::imports! {
        mode: user;
        module kernel32 = "kernel32.dll" {
            fn WriteConsoleA(
                console: *mut c_void,
                buffer: *const u8,
                length: u32,
                written: *mut u32,
                reserved: *mut c_void
            ) -> i32;
        }
    }

    fn entry(_argument1: *mut c_void, _argument2: *mut c_void) {
        unsafe {
            let peb = peb::current_peb();
            let console = (*(*peb).process_parameters).standard_output;
            WriteConsoleA(
                console,
                text!("Hello, World!\n"),
                14,
                core::ptr::null_mut(),
                core::ptr::null_mut(),
            );
        }
    }

    #[panic_handler]
    fn panic(_info: &core::panic::PanicInfo) -> ! {
        loop {}
    }
}

#[cfg(not(windows))]
fn main() {}
