use proptest::prelude::*;

use soko_api::cache::keys::query_key;
use soko_api::services::catalog::common::{resolve_image_url, truncate_description};
use soko_api::services::catalog::product_admin_service::slugify;

proptest! {
    #[test]
    fn truncation_never_exceeds_the_cap_plus_ellipsis(description in ".{0,600}") {
        let truncated = truncate_description(&description, 300);
        prop_assert!(truncated.chars().count() <= 303);
    }

    #[test]
    fn truncation_preserves_short_descriptions(description in ".{0,300}") {
        // Anything within the cap passes through byte-identical
        prop_assert_eq!(truncate_description(&description, 300), description);
    }

    #[test]
    fn truncated_output_is_a_prefix_plus_ellipsis(description in ".{301,600}") {
        let truncated = truncate_description(&description, 300);
        prop_assert!(truncated.ends_with("..."));
        let prefix = truncated.trim_end_matches("...");
        prop_assert!(description.starts_with(prefix));
    }

    #[test]
    fn slugs_are_always_url_safe(name in ".{0,80}") {
        let slug = slugify(&name);
        prop_assert!(slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
    }

    #[test]
    fn absolute_urls_always_pass_through(path in "[a-z0-9/._-]{1,40}") {
        let absolute = format!("https://cdn.example/{}", path);
        prop_assert_eq!(resolve_image_url(&absolute, "https://api.example"), absolute);
    }

    #[test]
    fn relative_refs_always_gain_the_base(path in "[a-z0-9._-]{1,40}") {
        let resolved = resolve_image_url(&path, "https://api.example");
        prop_assert!(resolved.starts_with("https://api.example/"));
        prop_assert!(resolved.ends_with(&path));
    }

    #[test]
    fn cache_keys_are_order_independent(
        a in "[a-z0-9]{1,12}",
        b in "[a-z0-9]{1,12}",
    ) {
        let forward = query_key("p", &[("first", a.clone()), ("second", b.clone())]);
        let reverse = query_key("p", &[("second", b), ("first", a)]);
        prop_assert_eq!(forward, reverse);
    }
}
