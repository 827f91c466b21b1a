#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::*;

    #[test]
    fn full_config_parses_with_defaults() {
        let ron = r#"(
            edge_log: true,
            physical_keys: ["lshift"],
            behaviors: {
                "caps": ToggleInHold(key: "ctrl"),
                "tap": HoldInToggle(key: "alt", threshold_ms: 500),
                "spam": ContinuousClick(key: "lbutton", max_click: 5, trigger: "f1"),
                "mouse4": MultiClick(actions: [Key("back"), Click(key: "forward")]),
                "esc2": SecondaryAction(key: "a", secondary: Behavior("mouse4"), mode: "concur"),
                "fan": OneToMany(actions: [Key("x"), Key("y")]),
                "route": TriggerWhen(
                    branches: [(All([Pressed("lshift"), Not(Window("game"))]), Key("z"))],
                    default: Key("q"),
                ),
                "lb": FixDoubleClick(key: "lbutton", log_stats: true),
                "alt": LongShortPress(hold_key: "alt", on_long: Click(key: "tab", hold_ms: 30)),
                "plain": Record(key: "b"),
            },
            bindings: [("capslock", "caps"), ("xbutton1", "mouse4")],
        )"#;
        let cfg = load_from_str(ron, None).unwrap();
        assert!(cfg.edge_log);
        assert_eq!(cfg.physical_keys, vec!["lshift".to_string()]);
        assert_eq!(cfg.behaviors.len(), 10);
        assert_eq!(
            cfg.behavior("caps"),
            Some(&Behavior::ToggleInHold {
                key: "ctrl".into(),
                threshold_ms: 200
            })
        );
        assert_eq!(
            cfg.behavior("tap"),
            Some(&Behavior::HoldInToggle {
                key: "alt".into(),
                threshold_ms: 500,
                press_time_ms: 0
            })
        );
        match cfg.behavior("spam") {
            Some(Behavior::ContinuousClick {
                interval_ms,
                press_time_ms,
                max_click,
                trigger,
                ..
            }) => {
                assert_eq!((*interval_ms, *press_time_ms, *max_click), (100, 20, 5));
                assert_eq!(trigger.as_deref(), Some("f1"));
            }
            other => panic!("unexpected {other:?}"),
        }
        match cfg.behavior("esc2") {
            Some(Behavior::SecondaryAction {
                nth_click,
                threshold_ms,
                mode,
                ..
            }) => assert_eq!((*nth_click, *threshold_ms, mode.as_str()), (2, 200, "concur")),
            other => panic!("unexpected {other:?}"),
        }
        match cfg.behavior("alt") {
            Some(Behavior::LongShortPress {
                threshold_ms,
                mode,
                on_long,
                ..
            }) => {
                assert_eq!(*threshold_ms, 300);
                assert_eq!(mode, "release");
                assert_eq!(
                    on_long,
                    &Some(ActionSpec::Click {
                        key: "tab".into(),
                        hold_ms: 30
                    })
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cfg.bindings.len(), 2);
    }

    #[test]
    fn empty_config_is_valid() {
        let cfg = load_from_str("()", None).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn unknown_binding_target_rejected() {
        let err = load_from_str(
            r#"(bindings: [("f1", "missing")])"#,
            Some(Path::new("/tmp/k.ron")),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("unknown behavior 'missing'"));
        assert_eq!(err.path(), Some(Path::new("/tmp/k.ron")));
    }

    #[test]
    fn unknown_action_reference_rejected() {
        let err = load_from_str(
            r#"(behaviors: { "a": OneToMany(actions: [Behavior("nope")]) })"#,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("refers to unknown behavior 'nope'"));

        let spec = ActionSpec::Behavior("nope".into());
        assert_eq!(spec.behavior_ref(), Some("nope"));
        assert_eq!(ActionSpec::Key("a".into()).behavior_ref(), None);
    }

    #[test]
    fn empty_action_key_rejected() {
        let err = load_from_str(
            r#"(behaviors: { "a": OneToMany(actions: [Key("x"), Click(key: "")]) })"#,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("action with an empty key"));
    }

    #[test]
    fn duplicate_binding_rejected() {
        let err = load_from_str(
            r#"(
                behaviors: { "r": Record(key: "a") },
                bindings: [("f1", "r"), ("f1", "r")],
            )"#,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("bound more than once"));
    }

    #[test]
    fn empty_action_lists_rejected() {
        let err = load_from_str(r#"(behaviors: { "m": MultiClick(actions: []) })"#, None)
            .unwrap_err();
        assert!(err.to_string().contains("needs at least one action"));
    }

    #[test]
    fn hold_key_constraints() {
        let err = load_from_str(
            r#"(behaviors: { "l": LongShortPress(hold_key: "alt", on_short: Key("x")) })"#,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("needs on_long"));
        let err = load_from_str(
            r#"(behaviors: { "l": LongShortPress(hold_key: "alt", on_press: Key("p"), on_long: Key("x")) })"#,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot combine"));
    }

    #[test]
    fn syntax_error_has_location() {
        let src = "(\n    edge_log: true,\n    behaviors: { \"a\": Bogus() },\n)";
        let err = load_from_str(src, None).unwrap_err();
        match &err {
            Error::Parse { line, excerpt, .. } => {
                assert!(*line >= 1);
                assert!(excerpt.contains('^'));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(err.pretty().starts_with("Config parse error"));
    }

    #[test]
    fn unknown_field_rejected() {
        let err = load_from_str(r#"(behaviors: { "a": Record(key: "a", colour: 1) })"#, None)
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
