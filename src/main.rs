//! `vitrine <url-or-path> [options.toml]`: open a window showing one glTF/GLB asset.

use std::path::Path;

use vitrine::{Options, Viewer};

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        log::error!("Usage: vitrine <URL or path to .glb/.gltf> [options.toml]");
        std::process::exit(1);
    };

    let options = match args.next() {
        Some(path) => match Options::load(Path::new(&path)) {
            Ok(options) => options,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        },
        None => Options::default(),
    };

    let result = Viewer::builder()
        .with_url(url)
        .with_options(options)
        .build()
        .run();
    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}
