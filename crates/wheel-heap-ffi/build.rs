use std::env;
use std::path::PathBuf;

fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR")
        .expect("wheel-heap-ffi build: CARGO_MANIFEST_DIR is not set");
    let crate_dir = PathBuf::from(crate_dir);

    let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml"))
        .expect("wheel-heap-ffi build: cannot read cbindgen.toml");

    let include_dir = crate_dir.join("include");
    std::fs::create_dir_all(&include_dir)
        .expect("wheel-heap-ffi build: cannot create include/ for wheel_heap.h");

    cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
        .expect("wheel-heap-ffi build: cbindgen could not generate wheel_heap.h from the mem_* exports")
        .write_to_file(include_dir.join("wheel_heap.h"));

    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=cbindgen.toml");
}
