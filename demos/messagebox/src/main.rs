//! Shows a message box. user32 is not a given in an arbitrary host
//! process, so the module is declared DYNAMIC_LOAD (and unloaded again on
//! the way out); its symbols still resolve through the export walker.
//! Build with `--release`.

#![cfg_attr(windows, no_std, no_main)]

#[cfg(windows)]
mod blob {
    use core::ffi::c_void;
    use shellcode_core::text;

    shellcode_core::imports! {
        mode: user;
        module user32 = "user32.dll" [DYNAMIC_LOAD | DYNAMIC_UNLOAD] {
            fn MessageBoxA(
                wnd: *mut c_void,
                text: *const u8,
                caption: *const u8,
                style: u32
            ) -> i32;
        }
    }

    fn entry(_argument1: *mut c_void, _argument2: *mut c_void) {
        unsafe {
            MessageBoxA(
                core::ptr::null_mut(),
                text!("Hello, World!"),
                text!("shellcode"),
                0,
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
