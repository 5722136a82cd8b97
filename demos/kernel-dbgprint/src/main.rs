//! Kernel-mode blob: resolves `DbgPrintEx` against the kernel image whose
//! base the invoker passes as `argument1` (a driver stub typically
//! derives it from its own loaded-module list) and prints a marker line.
//! `DbgPrintEx` is variadic, so the proxy is an accessor returning the
//! pointer. Build with `--release`.

#![cfg_attr(windows, no_std, no_main)]

#[cfg(windows)]
mod blob {
    use core::ffi::c_void;
    use shellcode_core::text;

    const DPFLTR_IHVDRIVER_ID: u32 = 77;
    const DPFLTR_ERROR_LEVEL: u32 = 0;

    shellcode_core::imports! {
        mode: kernel;
        module ntoskrnl = "ntoskrnl.exe" {
            extern "C" fn DbgPrintEx(
                component: u32,
                level: u32,
                format: *const u8,
                ...
            ) -> u32;
        }
    }

    fn entry(_argument1: *mut c_void, _argument2: *mut c_void) {
        unsafe {
            DbgPrintEx()(
                DPFLTR_IHVDRIVER_ID,
                DPFLTR_ERROR_LEVEL,
                text!("shellcode: hello from kernel mode\n"),
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
