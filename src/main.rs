#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), eframe::Error> {
    // RUST_LOG=node_canvas=debug shows requests and DOM widget mounts
    env_logger::init();

    node_canvas::run_app()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
