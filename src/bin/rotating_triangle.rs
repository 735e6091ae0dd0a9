use spin_ngin::{flow, settings::Settings, triangle::RotatingTriangle};

fn main() -> anyhow::Result<()> {
    let settings = Settings::default();
    flow::run(settings.clone(), RotatingTriangle::new(settings))
}
