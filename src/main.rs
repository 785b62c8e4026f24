use model_viewer::ViewerConfig;

fn main() -> anyhow::Result<()> {
    let config = ViewerConfig::from_args(std::env::args_os().skip(1));
    model_viewer::run(config)
}
