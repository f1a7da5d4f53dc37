use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use flyby::{NormalMode, Options};

#[derive(Parser, Debug)]
#[command(name = "flyby", version, about = "Fly a camera around a scene of vertex-file models")]
struct Cli {
    /// Settings document naming the models, textures and shaders
    #[arg(default_value = "settings.json")]
    settings: PathBuf,

    /// Derive per-triangle normals instead of reading them from the files
    #[arg(long)]
    generate_normals: bool,

    /// Turn the scene on a turntable instead of using the free camera
    #[arg(long)]
    spin: bool,

    #[arg(long, default_value_t = flyby::flow::DEFAULT_WIDTH)]
    width: u32,

    #[arg(long, default_value_t = flyby::flow::DEFAULT_HEIGHT)]
    height: u32,
}

impl From<Cli> for Options {
    fn from(cli: Cli) -> Self {
        Self {
            settings: cli.settings,
            mode: if cli.generate_normals {
                NormalMode::Generate
            } else {
                NormalMode::FromFile
            },
            spin: cli.spin,
            width: cli.width,
            height: cli.height,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match flyby::run(cli.into()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("flyby: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
