use objscene::config::{CameraPlacement, ViewerConfig};

fn main() -> anyhow::Result<()> {
    let mut config = ViewerConfig::default();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--detached-camera" => config.camera_placement = CameraPlacement::Detached,
            "-h" | "--help" => {
                println!("usage: objscene [model.obj] [--detached-camera]");
                println!("models are read from ./assets/");
                return Ok(());
            }
            file => config.model_file = file.to_string(),
        }
    }
    objscene::flow::run(config)
}
