use statprofile::*;

fn number(profile: &Profile, field: &Field) -> f64 {
    profile.get_number(field).unwrap()
}

/// A field nobody contributed to resolves to its default.
#[test]
fn test_default_fallback() {
    let plain = Field::new("plain");
    let seeded = Field::builder("seeded").default(7).build();

    let profile = Profile::empty();
    assert_eq!(number(&profile, &plain), 0.0);
    assert_eq!(number(&profile, &seeded), 7.0);
}

/// Contributions to a summed field add up.
#[test]
fn test_sum_of_contributions() {
    let x = Field::new("x");
    let profile = Profile::new([(&x, 2), (&x, 3), (&x, 5)]);
    assert_eq!(number(&profile, &x), 10.0);
}

/// Contributions whose guard is false are skipped.
#[test]
fn test_guard_filtering() {
    let x = Field::new("x");
    let y = Field::new("y");
    let profile = Profile::builder()
        .insert(&x, 1)
        .insert(y.when(x.gt(0)), 4)
        .insert(y.when(x.gt(5)), 100)
        .build();

    assert_eq!(number(&profile, &y), 4.0);
}

/// When every guard fails the default is used, not zero.
#[test]
fn test_all_guards_false_uses_default() {
    let x = Field::new("x");
    let y = Field::builder("y").default(-1).build();
    let profile = Profile::builder()
        .insert(&x, 0)
        .insert(y.when(x.gt(0)), 4)
        .insert(y.when(x.lt(0)), 8)
        .build();

    assert_eq!(number(&profile, &y), -1.0);
    assert!(profile.explain(&y).unwrap().used_default);
}

/// Merging concatenates contributions in operand order.
#[test]
fn test_merge_concatenates() {
    let x = Field::new("x");
    let a = Profile::new([(&x, 1), (&x, 2)]);
    let b = Profile::new([(&x, 3)]);

    let merged = &a + &b;
    assert_eq!(number(&merged, &x), 6.0);

    let order: Vec<String> = merged.contributions(&x).iter().map(|e| e.to_string()).collect();
    assert_eq!(order, vec!["1", "2", "3"]);

    let first = Field::builder("first").combinator(Combinator::First).build();
    let ab = Profile::new([(&first, 1)]) + Profile::new([(&first, 2)]);
    let ba = Profile::new([(&first, 2)]) + Profile::new([(&first, 1)]);
    assert_eq!(number(&ab, &first), 1.0);
    assert_eq!(number(&ba, &first), 2.0);
}

/// Overlay takes whole fields from the top profile.
#[test]
fn test_overlay_precedence() {
    let x = Field::new("x");
    let y = Field::new("y");
    let top = Profile::new([(&x, 10)]);
    let base = Profile::new([(&x, 1), (&x, 2), (&y, 5)]);

    let overlaid = top.overlay(&base);
    assert_eq!(number(&overlaid, &x), 10.0);
    assert_eq!(number(&overlaid, &y), 5.0);

    let reversed = base.overlay(&top);
    assert_eq!(number(&reversed, &x), 3.0);
}

/// A scoped override changes the query result only.
#[test]
fn test_scoped_override_is_transient() {
    let a = Field::new("a");
    let b = Field::new("b");
    let profile = Profile::builder().insert(&a, 2).insert(&b, &a * 10).build();

    assert_eq!(profile.get_with(&b, [(&a, 5)]).unwrap(), Value::Number(50.0));
    assert_eq!(b.scoped([(&a, 3)]).evaluate(&profile).unwrap(), Value::Number(30.0));
    assert_eq!(number(&profile, &a), 2.0);
    assert_eq!(number(&profile, &b), 20.0);
}

/// Overriding a field with the value it already has changes nothing.
#[test]
fn test_scoped_override_with_current_value() {
    let base = Field::new("base");
    let scale = Field::builder("scale").default(1.5).build();
    let total = Field::new("total");
    let profile = Profile::builder()
        .insert(&base, 40)
        .insert(&base, 2)
        .insert(&total, &base * &scale + 1)
        .build();

    let current = profile.get(&base).unwrap();
    assert_eq!(
        profile.get_with(&total, [(&base, current)]).unwrap(),
        profile.get(&total).unwrap()
    );
    assert_eq!(
        profile.get_with(&total, [(&scale, profile.get(&scale).unwrap())]).unwrap(),
        Value::Number(64.0)
    );
    assert_eq!(profile.get(&base).unwrap(), current);
    assert_eq!(profile.contributions(&base).len(), 2);
}

/// Overlaying leaves both operands as they were.
#[test]
fn test_overlay_leaves_operands_untouched() {
    let x = Field::new("x");
    let y = Field::new("y");
    let top = Profile::new([(&x, 10)]);
    let base = Profile::new([(&x, 1), (&x, 2), (&y, 5)]);

    let overlaid = top.overlay(&base);
    assert_eq!(number(&overlaid, &x), 10.0);

    assert_eq!(number(&top, &x), 10.0);
    assert!(!top.contains(&y));
    assert_eq!(top.len(), 1);
    assert_eq!(number(&base, &x), 3.0);
    assert_eq!(base.contributions(&x).len(), 2);
    assert_eq!(number(&base, &y), 5.0);
}

/// Derived fields read through merged profiles.
#[test]
fn test_attack_chain() {
    let atk_base = Field::new("atk_base");
    let atk_percent = Field::new("atk_percent");
    let atk_flat = Field::new("atk_flat");
    let atk = Field::new("atk");

    let formulas = Profile::new([(&atk, &atk_base * (1.0 + &atk_percent) + &atk_flat)]);
    let character = Profile::new([(&atk_base, 100.0), (&atk_percent, 0.5)]);
    let weapon = Profile::new([(&atk_flat, 20)]);

    let profile = formulas + character + weapon;
    assert_eq!(number(&profile, &atk), 170.0);
}

/// `min` and `max` accept a field or a scalar on either side.
#[test]
fn test_min_max_either_side() {
    let x = Field::new("x");
    let profile = Profile::new([(&x, 4)]);

    let cases: Vec<(Expr, f64)> = vec![
        (x.min(3), 3.0),
        (min(3, &x), 3.0),
        (x.max(10), 10.0),
        (max(10, &x), 10.0),
        (min(&x, 9), 4.0),
        (max(1.5, &x), 4.0),
        ((&x * 2).clamp(0, 5), 5.0),
    ];
    for (expr, expected) in cases {
        assert_eq!(expr.evaluate(&profile).unwrap(), Value::Number(expected), "{}", expr);
    }
}

/// A full damage formula set with a conditional buff.
#[test]
fn test_damage_formula_set() {
    let atk = Field::new("atk");
    let crit_rate = Field::builder("crit_rate").default(0.05).build();
    let crit_dmg = Field::builder("crit_dmg").default(0.5).build();
    let dmg_bonus = Field::new("dmg_bonus");
    let hp_ratio = Field::builder("hp_ratio").default(1.0).build();
    let damage = Field::new("damage");

    let formulas = Profile::new([(
        &damage,
        &atk * (1.0 + &dmg_bonus) * (1.0 + max(0, min(&crit_rate, 1)) * &crit_dmg),
    )]);
    let stats = Profile::builder()
        .insert(&atk, 1000)
        .insert(&crit_rate, 0.75)
        .insert(&crit_rate, 0.5)
        .insert(&crit_dmg, 1.0)
        .insert(dmg_bonus.when(hp_ratio.lt(0.5)), 0.5)
        .build();
    let profile = &formulas + &stats;

    // crit rate 1.25 clamps to 1
    assert_eq!(number(&profile, &crit_rate), 1.25);
    assert_eq!(number(&profile, &damage), 2000.0);

    let low_hp = profile.get_with(&damage, [(&hp_ratio, 0.25)]).unwrap();
    assert_eq!(low_hp, Value::Number(3000.0));
    assert_eq!(number(&profile, &dmg_bonus), 0.0);
}

/// Guards compose with `&`, `|` and `!`.
#[test]
fn test_predicate_combinations() {
    let level = Field::new("level");
    let wet = Field::new("wet");
    let bonus = Field::new("bonus");

    let profile = Profile::builder()
        .insert(&level, 50)
        .insert(&wet, true)
        .insert(bonus.when(level.ge(40) & wet.equals(true)), 1)
        .insert(bonus.when(level.lt(10) | wet.equals(false)), 10)
        .insert(bonus.when(!level.gt(60)), 100)
        .insert(bonus.when(level.ge(20)).when(level.le(30)), 1000)
        .build();

    assert_eq!(number(&profile, &bonus), 101.0);
}

/// Combinators other than sum.
#[test]
fn test_combinators() {
    let last = Field::builder("last").combinator(Combinator::Last).build();
    let highest = Field::builder("highest").combinator(Combinator::Max).build();
    let product = Field::builder("product").combinator(Combinator::Product).build();
    let average = Field::builder("average")
        .combinator(Combinator::custom("mean", |values: &[Value]| {
            let mut total = 0.0;
            for value in values {
                total += value.expect_number("mean")?;
            }
            Ok::<_, ProfileError>(Value::Number(total / values.len() as f64))
        }))
        .build();

    let profile = Profile::new([
        (&last, 1),
        (&last, 2),
        (&highest, 3),
        (&highest, 9),
        (&highest, 4),
        (&product, 2),
        (&product, 3),
        (&average, 2),
        (&average, 4),
    ]);

    assert_eq!(number(&profile, &last), 2.0);
    assert_eq!(number(&profile, &highest), 9.0);
    assert_eq!(number(&profile, &product), 6.0);
    assert_eq!(number(&profile, &average), 3.0);
}

/// Evaluation errors surface from the query that hit them.
#[test]
fn test_evaluation_errors() {
    let x = Field::new("x");
    let flag = Field::new("flag");
    let ratio = Field::new("ratio");
    let sum = Field::new("sum");

    let profile = Profile::builder()
        .insert(&x, 0)
        .insert(&flag, true)
        .insert(&ratio, 10 / Expr::from(&x))
        .insert(&sum, &flag + 1)
        .build();

    assert!(matches!(
        profile.get(&ratio),
        Err(ProfileError::DivisionByZero(_))
    ));
    assert!(matches!(profile.get(&sum), Err(ProfileError::Type { .. })));
    // other fields are unaffected
    assert_eq!(number(&profile, &x), 0.0);
}

/// Mutually recursive formulas stop at the depth limit and are caught
/// statically by the cycle check.
#[test]
fn test_recursive_formulas() {
    let a = Field::new("a");
    let b = Field::new("b");
    let profile = Profile::builder()
        .insert(&a, &b + 1)
        .insert(&b, &a + 1)
        .build();

    match profile.get(&a) {
        Err(ProfileError::RecursionLimit { limit, .. }) => {
            assert_eq!(limit, EvalConfig::DEFAULT_MAX_DEPTH)
        }
        other => panic!("expected RecursionLimit, got {:?}", other),
    }
    assert!(matches!(
        profile.check_acyclic(),
        Err(ProfileError::Cycle { .. })
    ));
}

/// Profiles loaded from JSON reject unknown names.
#[test]
fn test_registry_profiles() {
    let mut registry = FieldRegistry::new();
    let atk = registry.define("atk").unwrap();
    let bonus = registry.define("bonus").unwrap();

    let stats = registry
        .profile_from_str(r#"{ "atk": [100, 50], "bonus": 0.5 }"#)
        .unwrap();
    assert_eq!(number(&stats, &atk), 150.0);
    assert_eq!(number(&stats, &bonus), 0.5);

    // a formula merged onto loaded values reads them like any other
    let bonus_atk = Field::new("bonus_atk");
    let formulas = Profile::new([(&bonus_atk, &atk * &bonus)]);
    assert_eq!(number(&(&formulas + &stats), &bonus_atk), 75.0);

    assert_eq!(
        registry.profile_from_str(r#"{ "def": 1 }"#).unwrap_err(),
        ProfileError::InvalidKey("def".to_string())
    );
}

/// `explain` serializes to JSON for reporting.
#[test]
fn test_explain_serializes() {
    let x = Field::new("x");
    let y = Field::new("y");
    let profile = Profile::builder()
        .insert(&x, 2)
        .insert(&y, &x * 3)
        .insert(y.when(x.gt(2)), 1)
        .build();

    let resolved = profile.explain(&y).unwrap();
    assert_eq!(resolved.value, Value::Number(6.0));
    assert_eq!(resolved.unmet_count(), 1);

    let json = serde_json::to_value(&resolved).unwrap();
    assert_eq!(json["field"], "y");
    assert_eq!(json["combinator"], "sum");

    let back: ResolvedField = serde_json::from_value(json).unwrap();
    assert_eq!(back, resolved);
}
