use keyspline::{
    BackendKind, CompileOptions, CompiledScene, KeysplineError, Overrides, RangePolicy, Scene,
    create_backend,
};

fn wave() -> CompiledScene {
    let scene = Scene::from_str(include_str!("data/scenes/wave.json")).unwrap();
    CompiledScene::load(&scene).unwrap()
}

fn motion() -> CompiledScene {
    let scene = Scene::from_str(include_str!("data/scenes/motion.json")).unwrap();
    CompiledScene::load(&scene).unwrap()
}

#[test]
fn expression_keyframes_evaluate_before_interpolation() {
    let scene = wave();
    // The middle key is sin(pi * t) * amp, which is amp at t = 0.5, and
    // the cubic passes through its keys.
    let v = scene.query("wave.y", 0.5, &Overrides::new()).unwrap();
    assert!((v - 2.5).abs() < 1e-9, "got {v}");
    let ends = [
        scene.query("wave.y", 0.0, &Overrides::new()).unwrap(),
        scene.query("wave.y", 1.0, &Overrides::new()).unwrap(),
    ];
    assert!(ends.iter().all(|v| v.abs() < 1e-9), "got {ends:?}");
}

#[test]
fn cross_channel_reference_sees_the_same_position() {
    let scene = motion();
    let none = Overrides::new();
    for p in [0.0, 2.5, 5.0, 7.5, 10.0] {
        let all = scene.query_all(p, &none).unwrap();
        assert_eq!(all["pos.y"], all["pos.x"] * 2.0, "at {p}");
    }
}

#[test]
fn min_max_clamps_out_of_bound_values() {
    let scene = wave();
    let none = Overrides::new();
    // Linear 0 -> 20 clamped to [0, 10]: untouched at 0.25, pinned at 1.
    assert_eq!(scene.query("wave.drift", 0.25, &none).unwrap(), 5.0);
    assert_eq!(scene.query("wave.drift", 1.0, &none).unwrap(), 10.0);
}

#[test]
fn overrides_shadow_dependent_channels() {
    let scene = motion();
    let mut ov = Overrides::new();
    ov.insert("pos.x".to_owned(), 7.0);
    assert_eq!(scene.query("pos.x", 5.0, &ov).unwrap(), 7.0);
    assert_eq!(scene.query("pos.y", 5.0, &ov).unwrap(), 14.0);
}

#[test]
fn override_naming_an_unknown_channel_is_rejected() {
    let scene = motion();
    let mut ov = Overrides::new();
    ov.insert("pos.w".to_owned(), 1.0);
    let err = scene.query("pos.x", 5.0, &ov).unwrap_err();
    assert!(matches!(err, KeysplineError::Evaluation(_)));
    assert!(err.to_string().contains("pos.w"));
}

#[test]
fn clamp_policy_is_the_default() {
    let scene = motion();
    let none = Overrides::new();
    let inside = scene.query("pos.x", 10.0, &none).unwrap();
    let outside = scene.query("pos.x", 12.0, &none).unwrap();
    assert_eq!(inside, outside);
    assert_eq!(
        scene.query("pos.x", -1.0, &none).unwrap(),
        scene.query("pos.x", 0.0, &none).unwrap()
    );
}

#[test]
fn error_policy_rejects_out_of_range_positions() {
    let doc = Scene::from_str(include_str!("data/scenes/motion.json")).unwrap();
    let scene = doc
        .compile(CompileOptions {
            range_policy: RangePolicy::Error,
            ..Default::default()
        })
        .unwrap();
    let none = Overrides::new();
    assert!(scene.query("pos.x", 10.0, &none).is_ok());
    let err = scene.query("pos.x", 12.0, &none).unwrap_err();
    assert!(matches!(err, KeysplineError::Evaluation(_)));
    assert!(err.to_string().contains("12"));
}

#[test]
fn seeded_queries_are_reproducible() {
    let json = r#"{
        "seed": 99,
        "splines": [{
            "name": "n",
            "channels": [{ "name": "x", "keyframes": [{ "@": 0.0, "value": "rand() * 100" }] }]
        }]
    }"#;
    let a = CompiledScene::load(&Scene::from_str(json).unwrap()).unwrap();
    let b = CompiledScene::load(&Scene::from_str(json).unwrap()).unwrap();
    let none = Overrides::new();

    for p in [0.0, 0.3, 0.9] {
        let va = a.query("n.x", p, &none).unwrap();
        let vb = b.query("n.x", p, &none).unwrap();
        assert_eq!(va.to_bits(), vb.to_bits(), "at {p}");
        // And re-querying the same scene is bit-identical.
        assert_eq!(va.to_bits(), a.query("n.x", p, &none).unwrap().to_bits());
    }

    let other_seed = json.replace("\"seed\": 99", "\"seed\": 100");
    let c = CompiledScene::load(&Scene::from_str(&other_seed).unwrap()).unwrap();
    assert_ne!(
        a.query("n.x", 0.3, &none).unwrap().to_bits(),
        c.query("n.x", 0.3, &none).unwrap().to_bits()
    );
}

#[test]
fn randint_floors_arguments_and_checks_order() {
    let scene = CompiledScene::load(
        &Scene::from_str(
            r#"{
                "splines": [{
                    "name": "n",
                    "channels": [
                        { "name": "a", "keyframes": [{ "@": 0.0, "value": "randint(1.9, 5.2)" }] },
                        { "name": "b", "keyframes": [{ "@": 0.0, "value": "randint(5, 1)" }] }
                    ]
                }]
            }"#,
        )
        .unwrap(),
    )
    .unwrap();
    let none = Overrides::new();
    let v = scene.query("n.a", 0.5, &none).unwrap();
    assert_eq!(v, v.trunc());
    assert!((1.0..=5.0).contains(&v));
    // Reversed bounds surface at query time, not load.
    assert!(scene.query("n.b", 0.5, &none).is_err());
}

#[test]
fn bulk_sampling_matches_single_queries_across_backends() {
    let doc = Scene::from_str(include_str!("data/scenes/motion.json")).unwrap();
    let scene = doc
        .compile(CompileOptions {
            backend: BackendKind::Parallel,
            ..Default::default()
        })
        .unwrap();

    let positions: Vec<f64> = (0..101).map(|i| i as f64 / 10.0).collect();
    let bulk = scene.sample_bulk("pos.y", &positions).unwrap();

    let scalar = create_backend(BackendKind::Scalar)
        .unwrap()
        .sample_channel(&scene, "pos.y", &positions)
        .unwrap();

    assert_eq!(bulk.len(), positions.len());
    for (i, (a, b)) in bulk.iter().zip(&scalar).enumerate() {
        assert_eq!(a.to_bits(), b.to_bits(), "sample {i}");
    }
}

#[test]
fn published_view_uses_public_names() {
    let scene = motion();
    let view = scene.published_at(5.0).unwrap();
    let names: Vec<&str> = view.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["fade.alpha", "opacity", "out.x", "out.y"]);

    let none = Overrides::new();
    assert_eq!(view["out.x"], scene.query("pos.x", 5.0, &none).unwrap());
    assert_eq!(view["opacity"], view["fade.alpha"]);
    // The plateau between the middle keys holds exactly 1.
    assert_eq!(view["fade.alpha"], 1.0);
}

