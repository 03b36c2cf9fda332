use goldencmp::{evaluate, ComparisonType, Policy};

#[test]
fn desktop_passes_on_small_channel_drift_regardless_of_ssim() {
    let policy = ComparisonType::Desktop.policy();
    assert!(policy.evaluate(0.10, 1).passed);
    assert!(policy.evaluate(0.0, 2).passed);
}

#[test]
fn desktop_fails_when_neither_branch_holds() {
    let policy = ComparisonType::Desktop.policy();
    let verdict = policy.evaluate(0.990, 3);
    assert!(!verdict.passed);
    assert_eq!(
        verdict.description,
        "Desktop (SSIM ≥ 0.995 OR channel Δ ≤ 2)"
    );
}

#[test]
fn desktop_passes_on_ssim_branch_with_large_drift() {
    let policy = ComparisonType::Desktop.policy();
    assert!(policy.evaluate(0.996, 50).passed);
    assert!(policy.evaluate(0.995, 255).passed);
}

#[test]
fn web_vs_desktop_ignores_channel_difference() {
    let policy = ComparisonType::WebVsDesktop.policy();
    let verdict = policy.evaluate(0.985, 0);
    assert!(!verdict.passed);
    assert_eq!(verdict.description, "Web vs Desktop (SSIM ≥ 0.99)");
    assert!(policy.evaluate(0.990, 255).passed);
}

#[test]
fn free_evaluate_matches_method() {
    let policy = ComparisonType::WebVsDesktop.policy();
    assert_eq!(evaluate(&policy, 0.991, 9), policy.evaluate(0.991, 9));
}

#[test]
fn builtin_thresholds() {
    let desktop = ComparisonType::Desktop.policy();
    assert_eq!(desktop.ssim_min(), 0.995);
    assert_eq!(desktop.max_channel_diff(), Some(2));
    assert_eq!(desktop.kind(), ComparisonType::Desktop);

    let web = ComparisonType::WebVsDesktop.policy();
    assert_eq!(web.ssim_min(), 0.990);
    assert_eq!(web.max_channel_diff(), None);
    assert_eq!(Policy::default(), desktop);
}

#[test]
fn custom_policy_description_tracks_thresholds() {
    let policy = Policy::new(ComparisonType::Desktop, 0.98, Some(4));
    assert_eq!(
        policy.description(),
        "Desktop (SSIM ≥ 0.98 OR channel Δ ≤ 4)"
    );
    assert!(policy.evaluate(0.5, 4).passed);
    assert!(!policy.evaluate(0.5, 5).passed);
}

#[test]
fn comparison_type_parses_cli_spelling() {
    assert_eq!("desktop".parse::<ComparisonType>(), Ok(ComparisonType::Desktop));
    assert_eq!(
        "web_vs_desktop".parse::<ComparisonType>(),
        Ok(ComparisonType::WebVsDesktop)
    );
    assert!("mobile".parse::<ComparisonType>().is_err());
    assert_eq!(ComparisonType::WebVsDesktop.to_string(), "web_vs_desktop");
    assert_eq!(ComparisonType::default(), ComparisonType::Desktop);
}
