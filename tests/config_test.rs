//! Layered settings loading

use std::fs;

use config::Map;
use tempfile::TempDir;

use kinlayout::application::TreeService;
use kinlayout::config::Settings;

#[test]
fn given_env_override_when_loading_then_env_wins_over_files() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let local = dir.path().join("kinlayout.toml");
    fs::write(&local, "[render]\nsurface_height = 700.0\nsurface_width = 900.0\n").unwrap();
    let vars: Map<String, String> = [(
        "KINLAYOUT__RENDER__SURFACE_HEIGHT".to_string(),
        "640".to_string(),
    )]
    .into_iter()
    .collect();

    // Act
    let settings =
        Settings::load_with_env(None, Some(&local), Settings::environment().source(Some(vars)))
            .unwrap();

    // Assert
    assert_eq!(settings.render.surface_height, 640.0);
    assert_eq!(settings.render.surface_width, 900.0);
}

#[test]
fn given_custom_layout_file_when_rendering_then_service_uses_it() {
    let dir = TempDir::new().unwrap();
    let local = dir.path().join("kinlayout.toml");
    fs::write(&local, "[layout]\ntop_margin = 10.0\n\n[render]\nviewport_width = 140.0\n").unwrap();
    let settings = Settings::load_layers(None, Some(&local)).unwrap();
    let members = vec![kinlayout::domain::Person::new("a", "A", "X").as_root()];

    let view = TreeService::new(&settings)
        .unwrap()
        .render(&members, &[])
        .unwrap();

    assert_eq!(view.bounds().map(|b| (b.x, b.y)), Some((0.0, 10.0)));
}

#[test]
fn given_effective_settings_when_serialized_then_round_trips_through_toml() {
    let settings = Settings::default();

    let text = settings.to_toml().unwrap();

    assert_eq!(toml::from_str::<Settings>(&text).unwrap(), settings);
}
