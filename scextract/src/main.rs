//! CLI: verify a shellcode PE and write out its `.text` blob.

use scextract::{extract_text, PeFile};
use std::env;
use std::path::Path;
use std::process::exit;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() != 3 {
        eprintln!("Usage: {} <input.exe> <output.bin>", args[0]);
        eprintln!();
        eprintln!("Verifies the PE's section layout and extracts .text.");
        exit(1);
    }

    let pe = match PeFile::from_file(Path::new(&args[1])) {
        Ok(pe) => pe,
        Err(err) => {
            eprintln!("[!] Error: {}: {err}", args[1]);
            exit(1);
        }
    };

    let blob = match extract_text(&pe) {
        Ok(blob) => blob,
        Err(err) => {
            eprintln!("[!] Error: {err}");
            exit(1);
        }
    };

    if let Err(err) = std::fs::write(&args[2], &blob.bytes) {
        eprintln!("[!] Error: Failed to write '{}': {err}", args[2]);
        exit(1);
    }

    println!(
        "[ ] Wrote {} bytes to {}{}",
        blob.bytes.len(),
        args[2],
        if blob.patched { " (entry jump patched)" } else { "" }
    );
}
