use std::{env, fs::File, io::Write, path::Path};

fn main() {
    let out_dir = env::var("OUT_DIR").expect("No out dir");
    let dest_path = Path::new(&out_dir).join("constants.rs");
    let mut f = File::create(&dest_path).expect("Could not create file");

    writeln!(
        &mut f,
        "pub const FAULT_HARDENING: bool = {};",
        cfg!(feature = "fault_hardening")
    )
    .expect("Could not write file");

    let default_thread_count = env::var("HSS_DEFAULT_THREADS").ok();
    let default_thread_count: usize = default_thread_count
        .as_deref()
        .map_or(Ok(16), str::parse)
        .expect("Could not parse HSS_DEFAULT_THREADS");

    writeln!(
        &mut f,
        "pub const DEFAULT_THREAD_COUNT: usize = {};",
        default_thread_count
    )
    .expect("Could not write file");
    println!("cargo:rerun-if-env-changed=HSS_DEFAULT_THREADS");
}
