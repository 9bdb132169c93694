use std::{env, fs, path::Path};

// Copy config.json next to the built binary so `cargo run` finds it.
fn main() {
    println!("cargo:rerun-if-changed=config.json");

    let Ok(out_dir) = env::var("OUT_DIR") else {
        println!("cargo:warning=OUT_DIR not set, config.json not copied");
        return;
    };

    // OUT_DIR = target/<profile>/build/<crate>/out
    let Some(profile_dir) = Path::new(&out_dir).ancestors().nth(3) else {
        println!("cargo:warning=Cannot find target profile directory");
        return;
    };

    let dst = profile_dir.join("config.json");
    if let Err(e) = fs::copy("config.json", &dst) {
        println!("cargo:warning=Could not copy config.json to {}: {}", dst.display(), e);
    }
}
