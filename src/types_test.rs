// Unit tests for types module

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_device_profile_parse() {
    // Valid formats
    let profile = DeviceProfile::parse("1920x1080").unwrap();
    assert_eq!(profile.width, 1920);
    assert_eq!(profile.height, 1080);
    assert_eq!(profile.device, None);

    let profile = DeviceProfile::parse("390x844").unwrap();
    assert_eq!(profile.width, 390);
    assert_eq!(profile.height, 844);

    // Invalid formats
    assert!(DeviceProfile::parse("1920").is_err());
    assert!(DeviceProfile::parse("1920x").is_err());
    assert!(DeviceProfile::parse("x1080").is_err());
    assert!(DeviceProfile::parse("abc x def").is_err());
    assert!(DeviceProfile::parse("1920X1080").is_err()); // uppercase X
}

#[test]
fn test_device_profile_rejects_zero_dimensions() {
    assert!(DeviceProfile::parse("0x844").is_err());
    assert!(DeviceProfile::parse("390x0").is_err());
    assert!(DeviceProfile::parse("0x0").is_err());
}

#[test]
fn test_device_profile_named() {
    let profile = DeviceProfile::named("iphone-13").unwrap();
    assert_eq!(profile.width, 390);
    assert_eq!(profile.height, 844);
    assert_eq!(profile.device.as_deref(), Some("iphone-13"));

    // Case insensitive
    let profile = DeviceProfile::named("Galaxy-S24").unwrap();
    assert_eq!(profile.width, 412);
    assert_eq!(profile.height, 915);

    assert!(DeviceProfile::named("flip-phone").is_err());
}

#[test]
fn test_device_profile_display() {
    let profile = DeviceProfile::parse("412x915").unwrap();
    assert_eq!(profile.to_string(), "412x915");
}

#[test]
fn test_marker_parse() {
    let marker = Marker::parse("#slot-deck");
    assert_eq!(marker, Marker::Css("#slot-deck".to_string()));

    let marker = Marker::parse("text=Click to Shuffle");
    assert_eq!(marker, Marker::Text("Click to Shuffle".to_string()));

    // Display round-trips the parse convention
    assert_eq!(Marker::parse("#slot-deck").to_string(), "#slot-deck");
    assert_eq!(
        Marker::parse("text=Click to Shuffle").to_string(),
        "text=Click to Shuffle"
    );
}

#[test]
fn test_marker_text_xpath() {
    let xpath = Marker::text_xpath("Click to Shuffle");
    assert_eq!(
        xpath,
        "//*[contains(normalize-space(text()), 'Click to Shuffle')]"
    );
}

#[test]
fn test_text_xpath_quotes_text_with_apostrophes() {
    // XPath literals have no escape syntax; an apostrophe in the marker
    // text must not terminate the literal early
    assert_eq!(
        Marker::text_xpath("Don't Shuffle"),
        r#"//*[contains(normalize-space(text()), "Don't Shuffle")]"#
    );
}

#[test]
fn test_text_xpath_handles_both_quote_kinds() {
    assert_eq!(
        Marker::text_xpath(r#"Don't say "stop""#),
        r#"//*[contains(normalize-space(text()), concat('Don', "'", 't say "stop"'))]"#
    );
}

#[test]
fn test_phase_list_parse() {
    let phases = AnimationPhase::parse_list("split=1600,merge=1300,return=1000").unwrap();
    assert_eq!(phases.len(), 3);
    assert_eq!(phases[0].name, "split");
    assert_eq!(phases[0].nominal, Duration::from_millis(1600));
    assert_eq!(phases[1].name, "merge");
    assert_eq!(phases[1].nominal, Duration::from_millis(1300));
    assert_eq!(phases[2].name, "return");
    assert_eq!(phases[2].nominal, Duration::from_millis(1000));

    // Whitespace tolerated
    let phases = AnimationPhase::parse_list(" split = 250 , merge=100 ").unwrap();
    assert_eq!(phases[0].name, "split");
    assert_eq!(phases[0].nominal, Duration::from_millis(250));
    assert_eq!(phases[1].name, "merge");
}

#[test]
fn test_phase_list_parse_rejects_bad_input() {
    assert!(AnimationPhase::parse_list("").is_err());
    assert!(AnimationPhase::parse_list("split").is_err());
    assert!(AnimationPhase::parse_list("split=abc").is_err());
    assert!(AnimationPhase::parse_list("split=0").is_err());
}

#[test]
fn test_capture_target_constructors() {
    assert_eq!(
        CaptureTarget::viewport(),
        CaptureTarget::FullPage {
            full_document: false
        }
    );
    assert_eq!(
        CaptureTarget::element("#slot-deck"),
        CaptureTarget::Element {
            selector: "#slot-deck".to_string()
        }
    );
}

#[test]
fn test_navigation_policy_default_retries_once() {
    let policy = NavigationPolicy::default();
    assert!(policy.retry_on_timeout);
    assert_eq!(policy.timeout, Duration::from_secs(10));
}

#[test]
fn test_readiness_condition_css_uses_default_budget() {
    let condition = ReadinessCondition::css("#slot-deck");
    assert_eq!(condition.marker, Marker::Css("#slot-deck".to_string()));
    assert_eq!(condition.timeout, DEFAULT_READY_TIMEOUT);
}
