#[cfg(not(feature = "cbindgen"))]
fn main() {} // Skip header generation when the doc is building

#[cfg(feature = "cbindgen")]
fn main() {
    use std::env;
    use std::path::PathBuf;

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Regenerate the header only when the exported surface changes
    println!("cargo:rerun-if-changed=src/lib.rs");

    // The header is written next to the other build artifacts so a host
    // build can pick it up with -I$OUT_DIR
    cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("BLUESHMEM_H")
        .with_sys_include("stdint.h")
        .with_documentation(true)
        .generate()
        .expect("Unable to generate blueshmem.h")
        .write_to_file(out_path.join("blueshmem.h"));
}
