fn main() {
    let os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let env = std::env::var("CARGO_CFG_TARGET_ENV").unwrap_or_default();
    if os == "windows" && env == "msvc" {
        for arg in [
            "/ENTRY:_init",
            "/SUBSYSTEM:NATIVE",
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
