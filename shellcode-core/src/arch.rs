//! Entry stub assembly.
//!
//! The blob's first byte must be `_init`; the linker sorts `.text$`
//! subsections lexically, so the stub claims `.text$00` and the rest of
//! the machinery `.text$10` while compiler-generated code lands later.
//! `scextract` verifies the result.
//!
//! Layout contract with `table.rs`: slot 0 of the dispatch table is the
//! cleanup routine, slot 1 the freeing primitive. `_start` reads slot 0
//! after `_entry` returns and tail-calls it with the table address and the
//! caller's return address; the cleanup routine reads slot 1, stages the
//! free of the blob's own pages (`_init`'s address), and tail-jumps so the
//! platform primitive returns straight to the original caller. Nothing in
//! the blob executes after that jump.
//!
//! x86 note: symbol references use the target's decorated names
//! (`__pc`, `@_entry@8`, `___dispatch_table`), and the runtime table
//! address is computed with the `_pc` delta because there is no
//! RIP-relative addressing to lean on.

/// Emit items only when the `cleanup` feature of this crate is enabled.
/// A macro instead of `cfg` because the expansion site is the author's
/// crate, which has its own feature set.
#[cfg(feature = "cleanup")]
#[doc(hidden)]
#[macro_export]
macro_rules! __if_cleanup {
    ($($item:item)*) => { $($item)* };
}

#[cfg(not(feature = "cleanup"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __if_cleanup {
    ($($item:item)*) => {};
}

#[cfg(feature = "cleanup")]
#[doc(hidden)]
#[macro_export]
macro_rules! __if_not_cleanup {
    ($($item:item)*) => {};
}

#[cfg(not(feature = "cleanup"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __if_not_cleanup {
    ($($item:item)*) => { $($item)* };
}

/// Stub without self-cleanup: identical for both modes. `_start` is a
/// bare tail-jump, the entry arguments pass through untouched in
/// registers.
#[doc(hidden)]
#[macro_export]
macro_rules! __stub_asm_nocleanup {
    () => {
        #[cfg(all(windows, target_arch = "x86_64"))]
        ::core::arch::global_asm!(
            r#"
            .section .text$00,"xr"
            .globl _init
        _init:
            jmp _start

            .section .text$10,"xr"
            .globl _pc
        _pc:
            lea rax, [rip + _pc]
            ret

            .globl _start
        _start:
            jmp _entry
        "#
        );

        #[cfg(all(windows, target_arch = "x86"))]
        ::core::arch::global_asm!(
            r#"
            .section .text$00,"xr"
            .globl __init
        __init:
            jmp __start

            .section .text$10,"xr"
            .globl __pc
        __pc:
            call 1f
        1:
            pop eax
            sub eax, 5
            ret

            .globl __start
        __start:
            jmp @_entry@8
        "#
        );
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __stub_asm_user {
    () => {
        $crate::__if_not_cleanup! {
            $crate::__stub_asm_nocleanup!();
        }
        $crate::__if_cleanup! {
            #[cfg(all(windows, target_arch = "x86_64"))]
            ::core::arch::global_asm!(
                r#"
                .section .text$00,"xr"
                .globl _init
            _init:
                jmp _start

                .section .text$10,"xr"
                .globl _pc
            _pc:
                lea rax, [rip + _pc]
                ret

                .globl _start
            _start:
                push rsi
                lea rsi, [rip + __dispatch_table]
                sub rsp, 0x20
                call _entry
                add rsp, 0x20
                mov rcx, rsi
                mov rax, [rsi]
                pop rsi
                mov rdx, [rsp]
                jmp rax

                .globl _cleanup_usermode
            _cleanup_usermode:
                mov rax, [rcx + 8]
                lea rcx, [rip + _init]
                xor edx, edx
                mov r8d, 0x8000
                jmp rax
            "#
            );

            #[cfg(all(windows, target_arch = "x86"))]
            ::core::arch::global_asm!(
                r#"
                .section .text$00,"xr"
                .globl __init
            __init:
                jmp __start

                .section .text$10,"xr"
                .globl __pc
            __pc:
                call 1f
            1:
                pop eax
                sub eax, 5
                ret

                .globl __start
            __start:
                push esi
                call __pc
                sub eax, offset __pc
                mov esi, offset ___dispatch_table
                add esi, eax
                call @_entry@8
                mov ecx, esi
                mov eax, [esi]
                pop esi
                mov edx, [esp]
                jmp eax

                .globl __cleanup_usermode
            __cleanup_usermode:
                call __pc
                sub eax, offset __pc
                add eax, offset __init
                mov ecx, [ecx + 4]
                pop edx
                push 0x8000
                push 0
                push eax
                push edx
                jmp ecx
            "#
            );
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __stub_asm_kernel {
    () => {
        $crate::__if_not_cleanup! {
            $crate::__stub_asm_nocleanup!();
        }
        $crate::__if_cleanup! {
            #[cfg(all(windows, target_arch = "x86_64"))]
            ::core::arch::global_asm!(
                r#"
                .section .text$00,"xr"
                .globl _init
            _init:
                jmp _start

                .section .text$10,"xr"
                .globl _pc
            _pc:
                lea rax, [rip + _pc]
                ret

                .globl _start
            _start:
                push rsi
                lea rsi, [rip + __dispatch_table]
                sub rsp, 0x20
                call _entry
                add rsp, 0x20
                mov rcx, rsi
                mov rax, [rsi]
                pop rsi
                mov rdx, [rsp]
                jmp rax

                .globl _cleanup_kernelmode
            _cleanup_kernelmode:
                mov rax, [rcx + 8]
                lea rcx, [rip + _init]
                jmp rax
            "#
            );

            #[cfg(all(windows, target_arch = "x86"))]
            ::core::arch::global_asm!(
                r#"
                .section .text$00,"xr"
                .globl __init
            __init:
                jmp __start

                .section .text$10,"xr"
                .globl __pc
            __pc:
                call 1f
            1:
                pop eax
                sub eax, 5
                ret

                .globl __start
            __start:
                push esi
                call __pc
                sub eax, offset __pc
                mov esi, offset ___dispatch_table
                add esi, eax
                call @_entry@8
                mov ecx, esi
                mov eax, [esi]
                pop esi
                mov edx, [esp]
                jmp eax

                .globl __cleanup_kernelmode
            __cleanup_kernelmode:
                call __pc
                sub eax, offset __pc
                add eax, offset __init
                mov ecx, [ecx + 4]
                pop edx
                push eax
                push edx
                jmp ecx
            "#
            );
        }
    };
}
