#[cfg(test)]
mod tests {
    use crate::commands::utils;
    use crate::types::{CaptureTarget, DeviceProfile, Marker, DEFAULT_READY_TIMEOUT};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_resolve_profile_viewport_wins_over_device() {
        let profile =
            utils::resolve_profile(Some("800x600"), Some("iphone-13"), DeviceProfile::new(1, 1))
                .unwrap();
        assert_eq!((profile.width, profile.height), (800, 600));
        assert_eq!(profile.device, None);
    }

    #[test]
    fn test_resolve_profile_device_lookup() {
        let profile =
            utils::resolve_profile(None, Some("iphone-13"), DeviceProfile::new(1, 1)).unwrap();
        assert_eq!((profile.width, profile.height), (390, 844));
        assert_eq!(profile.device.as_deref(), Some("iphone-13"));
    }

    #[test]
    fn test_resolve_profile_fallback() {
        let profile = utils::resolve_profile(None, None, DeviceProfile::new(1280, 720)).unwrap();
        assert_eq!((profile.width, profile.height), (1280, 720));
    }

    #[test]
    fn test_resolve_profile_rejects_malformed_viewport() {
        assert!(utils::resolve_profile(Some("800by600"), None, DeviceProfile::new(1, 1)).is_err());
    }

    #[test]
    fn test_ready_conditions_keep_cli_order_and_parse_markers() {
        let conditions = utils::ready_conditions(
            &[
                "#slot-deck".to_string(),
                "text=Click to Shuffle".to_string(),
            ],
            DEFAULT_READY_TIMEOUT,
        );

        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].marker, Marker::Css("#slot-deck".to_string()));
        assert_eq!(
            conditions[1].marker,
            Marker::Text("Click to Shuffle".to_string())
        );
        assert_eq!(conditions[0].timeout, DEFAULT_READY_TIMEOUT);
    }

    #[test]
    fn test_viewport_list_parses_comma_separated_sizes() {
        let viewports = utils::viewport_list("390x844, 1920x1080").unwrap();
        assert_eq!(viewports.len(), 2);
        assert_eq!((viewports[0].width, viewports[0].height), (390, 844));
        assert_eq!((viewports[1].width, viewports[1].height), (1920, 1080));
    }

    #[test]
    fn test_viewport_list_rejects_bad_entry() {
        assert!(utils::viewport_list("390x844,huge").is_err());
    }

    #[test]
    fn test_navigation_policy_flags() {
        let policy = utils::navigation_policy(5000, false);
        assert_eq!(policy.timeout, Duration::from_millis(5000));
        assert!(policy.retry_on_timeout);

        let no_retry = utils::navigation_policy(5000, true);
        assert!(!no_retry.retry_on_timeout);
    }

    #[test]
    fn test_capture_target_element_wins_over_full_document() {
        assert_eq!(
            utils::capture_target(Some("#player-hand-container"), true),
            CaptureTarget::element("#player-hand-container")
        );
        assert_eq!(
            utils::capture_target(None, true),
            CaptureTarget::full_document()
        );
        assert_eq!(utils::capture_target(None, false), CaptureTarget::viewport());
    }
}
