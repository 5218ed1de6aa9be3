//! Host-side helper: `cargo run` builds the WASM package into `static/pkg`
//! and serves `static/` locally. Pass a variant name to open it directly.

use std::process::{Command, ExitCode, Stdio};
use std::{env, thread, time::Duration};

use hero_viz::variant::PRESETS;

const PORT: &str = "8000";

fn main() -> ExitCode {
    let variant = env::args().nth(1).unwrap_or_else(|| "timeline".to_string());
    if !PRESETS.contains(&variant.as_str()) {
        eprintln!("unknown variant `{variant}`; choose one of {}", PRESETS.join(", "));
        return ExitCode::FAILURE;
    }

    println!("Building WASM pkg …");
    match Command::new("wasm-pack")
        .args(["build", "--release", "--target", "web", "--out-dir", "static/pkg"])
        .status()
    {
        Ok(st) if st.success() => {}
        Ok(_) => {
            eprintln!(
                "wasm-pack finished with errors. Ensure wasm-pack is installed \
                 (https://rustwasm.github.io/wasm-pack/)."
            );
            return ExitCode::FAILURE;
        }
        Err(_) => {
            eprintln!(
                "wasm-pack not found in PATH. Skipping wasm build; the site may serve stale \
                 artifacts."
            );
        }
    }

    println!("Serving http://127.0.0.1:{PORT}/?variant={variant} …");
    let server = Command::new("python3")
        .args(["-m", "http.server", PORT, "--directory", "static"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    let mut server = match server {
        Ok(child) => child,
        Err(err) => {
            eprintln!("failed to start http server: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Keep process alive while the server runs.
    loop {
        match server.try_wait() {
            Ok(Some(status)) => {
                eprintln!("http server exited with {status}");
                return ExitCode::FAILURE;
            }
            Ok(None) => thread::sleep(Duration::from_secs(5)),
            Err(err) => {
                eprintln!("lost track of http server: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
}
