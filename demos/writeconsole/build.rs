fn main() {
    // The blob link recipe: entry stub first, all data merged into .text,
    // no base relocations, minimal file alignment, no CRT. Extraction is
    // `scextract target/release/writeconsole.exe writeconsole.bin`.
    let os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let env = std::env::var("CARGO_CFG_TARGET_ENV").unwrap_or_default();
    if os == "windows" && env == "msvc" {
        for arg in [
            "/ENTRY:_init",
            "/SUBSYSTEM:CONSOLE",
            "/NODEFAULTLIB",
            "/MERGE:.rdata=.text",
            "/MERGE:.data=.text",
            "/MERGE:.pdata=.text",
            "/MERGE:.xdata=.text",
            "/FIXED",
            "/FILEALIGN:1",
        ] {
            println!("cargo:rustc-link-arg-bins={arg}");
        }
    }
}
