//! `within` against the in-memory driver.
//!
//! Covers CSS, XPath and node targets, nesting, failure recovery and form
//! interaction inside a scope.

#![allow(clippy::unwrap_used)]

mod common;

use common::{extract_results, session_at};
use enclose::prelude::*;

// ============================================================================
// Selector kinds
// ============================================================================

mod css {
    use super::*;

    #[test]
    fn test_clicks_links_in_the_given_scope() {
        let mut session = session_at("/with_scope");
        session
            .within(Query::css("ul li").with_text("With Simple HTML"), |s| {
                s.click_link("Go")
            })
            .unwrap();
        assert_eq!(session.current_path().as_deref(), Some("/bar"));
        assert!(session.body().unwrap().contains("Bar"));
    }

    #[test]
    fn test_asserts_content_in_the_given_scope() {
        let mut session = session_at("/with_scope");
        session
            .within(Query::css("#for_foo"), |s| {
                assert!(s.has_no_content("First Name")?);
                Ok(())
            })
            .unwrap();
        assert!(session.has_content("First Name").unwrap());
    }

    #[test]
    fn test_accepts_additional_options() {
        let mut session = session_at("/with_scope");
        session
            .within_with(
                Query::css("ul li"),
                FilterOptions::new().with_text("With Simple HTML"),
                |s| s.click_link("Go"),
            )
            .unwrap();
        assert_eq!(session.current_path().as_deref(), Some("/bar"));
    }

    #[test]
    fn test_kind_tuple() {
        let mut session = session_at("/with_scope");
        let text = session
            .within((SelectorKind::Css, "#another_foo li"), |s| s.text())
            .unwrap();
        assert_eq!(text, "With Simple HTML: Go");
    }

    #[test]
    fn test_invalid_css_is_reported() {
        let mut session = session_at("/with_scope");
        let err = session
            .within(Query::css("ul li[[["), |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, EncloseError::InvalidSelector { .. }));
        assert_eq!(session.scope_depth(), 0);
    }
}

mod xpath {
    use super::*;

    #[test]
    fn test_clicks_links_in_the_given_scope() {
        let mut session = session_at("/with_scope");
        session
            .within(Query::xpath("//li[contains(.,'With Simple HTML')]"), |s| {
                s.click_link("Go")
            })
            .unwrap();
        assert_eq!(session.current_path().as_deref(), Some("/bar"));
    }

    #[test]
    fn test_default_selector_is_xpath() {
        let mut session = session_at("/with_scope");
        session
            .within("//li[contains(., 'With Simple HTML')]", |s| s.click_link("Go"))
            .unwrap();
        assert!(session.body().unwrap().contains("Bar"));
    }

    #[test]
    fn test_absolute_path_is_anchored_at_the_scope() {
        let mut session = session_at("/with_scope");
        let count = session
            .within("//div[@id='another_foo']", |s| s.all("//li").map(|li| li.len()))
            .unwrap();
        assert_eq!(count, 1);
    }
}

mod node_target {
    use super::*;

    #[test]
    fn test_clicks_links_in_the_given_scope() {
        let mut session = session_at("/with_scope");
        let node = session
            .find(Query::css("ul li").with_text("With Simple HTML"))
            .unwrap();
        session.within(node, |s| s.click_link("Go")).unwrap();
        assert_eq!(session.current_path().as_deref(), Some("/bar"));
    }

    #[test]
    fn test_options_are_ignored() {
        let mut session = session_at("/with_scope");
        let node = session.find("//div[@id='another_foo']").unwrap();
        let text = session
            .within_with(node, FilterOptions::new().with_text("no such text"), |s| {
                s.text()
            })
            .unwrap();
        assert_eq!(text, "With Simple HTML: Go");
    }

    #[test]
    fn test_node_from_a_previous_document_is_stale() {
        let mut session = session_at("/with_scope");
        let node = session.find("//div[@id='for_bar']").unwrap();
        session.visit("/with_scope").unwrap();
        let err = session.within(node, |s| s.click_link("Go")).unwrap_err();
        assert!(matches!(err, EncloseError::StaleNode { .. }));
        assert_eq!(session.scope_depth(), 0);
    }
}

// ============================================================================
// Nesting and recovery
// ============================================================================

mod nesting {
    use super::*;

    #[test]
    fn test_respects_the_inner_scope() {
        let mut session = session_at("/with_scope");
        session
            .within("//div[@id='for_bar']", |s| {
                s.within(".//li[contains(.,'Bar')]", |s| s.click_link("Go"))
            })
            .unwrap();
        assert!(session.body().unwrap().contains("Another World"));
    }

    #[test]
    fn test_respects_the_outer_scope() {
        let mut session = session_at("/with_scope");
        session
            .within("//div[@id='another_foo']", |s| {
                s.within(".//li[contains(.,'With Simple HTML')]", |s| {
                    s.click_link("Go")
                })
            })
            .unwrap();
        assert!(session.body().unwrap().contains("Hello world"));
    }

    #[test]
    fn test_scopes_are_reported_outermost_first() {
        let mut session = session_at("/with_scope");
        let outer = session.find("//div[@id='for_bar']").unwrap();
        let seen = session
            .within(outer, |s| {
                s.within(".//ul", |s| Ok(s.scopes().to_vec()))
            })
            .unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], outer);
        assert_eq!(session.current_scope(), Scope::Root);
    }
}

mod recovery {
    use super::*;

    #[test]
    fn test_missing_scope_raises_not_found() {
        let mut session = session_at("/with_scope");
        let err = session
            .within("//div[@id='doesnotexist']", |_| Ok(()))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Unable to find xpath \"//div[@id='doesnotexist']\" within document"
        );
    }

    #[test]
    fn test_restores_the_scope_when_an_error_is_raised() {
        let mut session = session_at("/with_scope");
        assert!(session.has_xpath(".//div[@id='another_foo']").unwrap());
        session
            .within("//div[@id='for_bar']", |s| {
                assert!(!s.has_xpath(".//div[@id='another_foo']")?);
                let err = s
                    .within(".//div[@id='doesnotexist']", |_| Ok(()))
                    .unwrap_err();
                assert!(err.is_not_found());
                assert!(!s.has_xpath(".//div[@id='another_foo']")?);
                assert_eq!(s.scope_depth(), 1);
                Ok(())
            })
            .unwrap();
        assert!(session.has_xpath(".//div[@id='another_foo']").unwrap());
    }

    #[test]
    fn test_restores_the_scope_when_the_body_panics() {
        let mut session = session_at("/with_scope");
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = session.within("//div[@id='for_bar']", |s| {
                s.within(".//ul", |_| -> EncloseResult<()> { panic!("boom") })
            });
        }));
        assert!(outcome.is_err());
        assert_eq!(session.scope_depth(), 0);
        assert!(session.has_xpath(".//div[@id='another_foo']").unwrap());
    }

    #[test]
    fn test_body_error_is_returned_unchanged() {
        let mut session = session_at("/with_scope");
        let err = session
            .within("//div[@id='for_bar']", |s| s.click_link("Nowhere"))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Nowhere"));
        assert_eq!(session.scope_depth(), 0);
    }
}

// ============================================================================
// Forms
// ============================================================================

mod forms {
    use super::*;

    #[test]
    fn test_fills_in_a_field_and_clicks_a_button() {
        let mut session = session_at("/with_scope");
        session
            .within("//li[contains(.,'Bar')]", |s| s.click_button("Go"))
            .unwrap();
        assert_eq!(extract_results(&session)["first_name"], "Peter");

        session.visit("/with_scope").unwrap();
        session
            .within("//li[contains(.,'Bar')]", |s| {
                s.fill_in("First Name", "Dagobert")?;
                s.click_button("Go")
            })
            .unwrap();
        assert_eq!(extract_results(&session)["first_name"], "Dagobert");
    }

    #[test]
    fn test_within_fieldset_by_id() {
        let mut session = session_at("/fieldsets");
        session
            .within_fieldset("villain_fieldset", |s| {
                s.fill_in("Name", "Goldfinger")?;
                s.click_button("Create")
            })
            .unwrap();
        let results = extract_results(&session);
        assert_eq!(results["villain_name"], "Goldfinger");
        assert!(results.get("agent_name").is_none());
    }

    #[test]
    fn test_within_fieldset_by_legend() {
        let mut session = session_at("/fieldsets");
        session
            .within_fieldset("Villain", |s| {
                s.fill_in("Name", "Goldfinger")?;
                s.click_button("Create")
            })
            .unwrap();
        assert_eq!(extract_results(&session)["villain_name"], "Goldfinger");
    }

    #[test]
    fn test_within_table_by_id() {
        let mut session = session_at("/tables");
        session
            .within_table("girl_table", |s| {
                s.fill_in("Name", "Christmas")?;
                s.click_button("Create")
            })
            .unwrap();
        assert_eq!(extract_results(&session)["girl_name"], "Christmas");
    }

    #[test]
    fn test_within_table_by_caption() {
        let mut session = session_at("/tables");
        session
            .within_table("Villain", |s| {
                s.fill_in("Name", "Quantum")?;
                s.click_button("Create")
            })
            .unwrap();
        assert_eq!(extract_results(&session)["villain_name"], "Quantum");
    }

    #[test]
    fn test_fieldset_id_wins_over_an_earlier_legend() {
        let mut session = session_at("/ambiguous");
        let text = session.within_fieldset("villain", |s| s.text()).unwrap();
        assert_eq!(text, "Other Matched by id");
    }

    #[test]
    fn test_fieldset_falls_back_to_legend() {
        let mut session = session_at("/ambiguous");
        let found = session
            .within_fieldset("Other", |s| s.has_content("Matched by id"))
            .unwrap();
        assert!(found);
    }

    #[test]
    fn test_table_id_wins_over_an_earlier_caption() {
        let mut session = session_at("/ambiguous");
        let text = session.within_table("girl", |s| s.text()).unwrap();
        assert_eq!(text, "Other Matched by id");
    }

    #[test]
    fn test_missing_fieldset_is_not_found() {
        let mut session = session_at("/fieldsets");
        let err = session.within_fieldset("Henchman", |_| Ok(())).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(session.scope_depth(), 0);
    }
}

// ============================================================================
// Navigation
// ============================================================================

mod navigation {
    use super::*;

    #[test]
    fn test_redirects_are_followed() {
        let session = session_at("/redirect_to_bar");
        assert_eq!(session.current_path().as_deref(), Some("/bar"));
        assert!(session.has_content("Bar").unwrap());
    }

    #[test]
    fn test_scoped_click_follows_the_redirect() {
        let mut session = session_at("/with_scope");
        session
            .within(Query::css("ul li").with_text("With Simple HTML"), |s| {
                s.click_link("Go")
            })
            .unwrap();
        assert_eq!(session.current_path().as_deref(), Some("/bar"));
        assert!(session.body().unwrap().contains("Bar"));
        assert_eq!(
            session.driver().history(),
            ["/with_scope", "/redirect_to_bar", "/bar"]
        );
    }

    #[test]
    fn test_redirect_loops_stop() {
        let mut session = session_at("/");
        let err = session.visit("/loop").unwrap_err();
        assert!(matches!(err, EncloseError::Navigation { .. }));
    }
}
