use keyspline::{CompiledScene, Overrides, Scene};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let s = include_str!("../tests/data/scenes/wave.json");
    let scene = Scene::from_str(s)?;
    let compiled = CompiledScene::load(&scene)?;

    let overrides = Overrides::new();
    for p in [0.0, 0.25, 0.5, 0.75, 1.0] {
        let values = compiled.query_all(p, &overrides)?;
        let row: Vec<String> = values.iter().map(|(k, v)| format!("{k}={v:.3}")).collect();
        println!("@{p}: {}", row.join("  "));
    }

    Ok(())
}
