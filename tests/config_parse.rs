use audit_sweep::checker::{FatalityPolicy, validate_specs};
use audit_sweep::config::{CheckerKind, Config};

#[test]
fn parse_example_config() {
    let raw = include_str!("../audit-sweep.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");

    assert!(!cfg.paths.report_dir.is_empty());
    assert_eq!(cfg.checkers.len(), 2);

    let strict = &cfg.checkers[0];
    assert_eq!(strict.name, "strict-linter");
    assert_eq!(strict.kind, CheckerKind::Json);
    assert_eq!(strict.policy, FatalityPolicy::Strict);
    assert!(strict.fix);
    assert_eq!(strict.config_file_arg.as_deref(), Some("--config"));
    assert_eq!(strict.config.get("semi").and_then(|v| v.as_str()), Some("always"));

    let lenient = &cfg.checkers[1];
    assert_eq!(lenient.kind, CheckerKind::Plain);
    assert_eq!(lenient.policy, FatalityPolicy::Lenient);
    assert_eq!(lenient.fixed_prefix, "fixed ");

    validate_specs(&cfg.checkers).expect("specs valid");
}

#[test]
fn effective_config_round_trips_through_toml() {
    let raw = include_str!("../audit-sweep.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");

    let dumped = cfg.normalized_for_hash();
    assert!(!dumped.is_empty());

    let back: Config = toml::from_str(&dumped).expect("re-parse dumped TOML");
    assert_eq!(back.checkers.len(), cfg.checkers.len());
    assert_eq!(
        back.checkers[0].config_file_arg,
        cfg.checkers[0].config_file_arg
    );
    assert_eq!(back.checkers[0].config, cfg.checkers[0].config);
    assert_eq!(back.checkers[1].fixed_prefix, cfg.checkers[1].fixed_prefix);
}

#[test]
fn duplicate_checker_names_are_rejected() {
    let raw = r#"
        [[checker]]
        name = "twice"
        command = ["tool"]

        [[checker]]
        name = "twice"
        command = ["tool"]
    "#;
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert!(validate_specs(&cfg.checkers).is_err());
}

#[test]
fn defaults_fill_missing_sections() {
    let cfg: Config = toml::from_str("").expect("parse empty TOML");
    assert!(cfg.checkers.is_empty());
    assert_eq!(cfg.logging.level, "info");
    assert!(cfg.output.write_report_json);
}
