use siteflow::config::{load_and_validate, validate_config, DEFAULT_CONFIG_FILE};
use siteflow::errors::SiteflowError;
use siteflow_test_utils::builders::{ConfigFileBuilder, TempProject};

#[test]
fn builder_values_pass_validation() {
    let config = ConfigFileBuilder::new()
        .with_port(8080)
        .with_debounce_ms(50)
        .with_lint("npx eslint app/assets/js")
        .build();

    validate_config(&config).unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.watch.debounce().as_millis(), 50);
}

#[test]
fn out_of_range_values_are_config_errors() {
    let zero_port = ConfigFileBuilder::new().with_port(0).build();
    assert!(matches!(validate_config(&zero_port), Err(SiteflowError::Config(_))));

    let zero_debounce = ConfigFileBuilder::new().with_debounce_ms(0).build();
    assert!(matches!(validate_config(&zero_debounce), Err(SiteflowError::Config(_))));

    let blank_command = ConfigFileBuilder::new().with_lint_test("   ").build();
    assert!(matches!(validate_config(&blank_command), Err(SiteflowError::Config(_))));
}

#[test]
fn project_file_overrides_defaults() {
    let project = TempProject::new();
    project.file(
        DEFAULT_CONFIG_FILE,
        "[server]\nport = 3001\n\n[watch]\ndebounce_ms = 250\n",
    );

    let config = load_and_validate(project.path(DEFAULT_CONFIG_FILE)).unwrap();
    assert_eq!(config.server.port, 3001);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.watch.debounce_ms, 250);
}
