//! Build script for spinor-core.
//!
//! Generates the build-time part database from RON fixtures when
//! `static-parts` is enabled (§4.9).

use std::env;
use std::path::PathBuf;

fn main() {
    #[cfg(feature = "static-parts")]
    {
        let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
        let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

        // Fixtures directory is at the workspace root.
        let chips_dir = manifest_dir.parent().unwrap().parent().unwrap().join("chips").join("vendors");
        let output_file = out_dir.join("parts_static.rs");

        println!("cargo::rerun-if-changed={}", chips_dir.display());
        for entry in std::fs::read_dir(&chips_dir).unwrap() {
            let entry = entry.unwrap();
            if entry.path().extension().is_some_and(|ext| ext == "ron") {
                println!("cargo::rerun-if-changed={}", entry.path().display());
            }
        }

        spinor_chips_codegen::generate(&chips_dir, &output_file).expect("failed to generate static part database");
    }

    #[cfg(not(feature = "static-parts"))]
    {
        let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
        let output_file = out_dir.join("parts_static.rs");
        std::fs::write(output_file, "// static-parts disabled\n").unwrap();
    }
}
