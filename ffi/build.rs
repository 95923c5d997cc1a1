use std::env;
use std::path::PathBuf;

/// Set to a directory to also copy the generated header there.
const HEADER_DIR_VAR: &str = "HUBSPOT_FFI_HEADER_DIR";

fn main() {
    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()));
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-env-changed={HEADER_DIR_VAR}");

    let Some(out_dir) = env::var_os("OUT_DIR").map(PathBuf::from) else {
        println!("cargo:warning=OUT_DIR is not set, header not generated");
        return;
    };

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("HUBSPOT_FFI_H")
        .with_cpp_compat(true)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(out_dir.join("hubspot_ffi.h"));
            if let Some(dir) = env::var_os(HEADER_DIR_VAR) {
                bindings.write_to_file(PathBuf::from(dir).join("hubspot_ffi.h"));
            }
        }
        Err(e) => println!("cargo:warning=cbindgen failed, header not generated: {e}"),
    }
}
