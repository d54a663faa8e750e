use chrono::Utc;

fn main() {
    // Stamped into `--version` output.
    let build_time = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    println!("cargo:rustc-env=GPS_RELAY_BUILD_TIME={}", build_time);
    println!("cargo:rerun-if-changed=build.rs");
}
