use nettsted::analyzer::*;

// CharacterFilter Tests

#[cfg(test)]
mod character_filter_tests {
    use super::*;

    mod html_tag_filter {
        use super::*;

        #[test]
        fn test_empty_string() {
            let filter = HTMLTagFilter;
            assert_eq!(filter.filter("".to_string()), "");
        }

        #[test]
        fn test_plain_text_no_html() {
            let filter = HTMLTagFilter;
            assert_eq!(filter.filter("Hello World".to_string()), "Hello World");
        }

        #[test]
        fn test_each_tag_becomes_one_space() {
            let filter = HTMLTagFilter;
            let result = filter.filter("<p>Hello <b>World</b></p>".to_string());
            assert_eq!(result, " Hello  World  ");
        }

        #[test]
        fn test_attributes_are_removed_with_tag() {
            let filter = HTMLTagFilter;
            let result = filter.filter(r#"<a href="/x" class="lenke">lenke</a>"#.to_string());
            assert_eq!(result, " lenke ");
        }

        #[test]
        fn test_unterminated_tag_is_kept() {
            let filter = HTMLTagFilter;
            assert_eq!(filter.filter("a < b".to_string()), "a < b");
        }
    }

    mod whitespace_filter {
        use super::*;

        #[test]
        fn test_collapses_and_trims() {
            let filter = WhiteSpaceCollapseFilter;
            let result = filter.filter("  one \n\t two   three ".to_string());
            assert_eq!(result, "one two three");
        }

        #[test]
        fn test_whitespace_only() {
            let filter = WhiteSpaceCollapseFilter;
            assert_eq!(filter.filter(" \n\t ".to_string()), "");
        }
    }
}

#[cfg(test)]
mod text_analyzer_tests {
    use super::*;

    #[test]
    fn test_plain_text_pipeline() {
        let result = plain_text("<h2>Program</h2>\n<p>Dag  1:\n<em>Åpning</em></p>");
        assert_eq!(result, "Program Dag 1: Åpning");
    }

    #[test]
    fn test_pipeline_order_matters() {
        let analyzer = TextAnalyzer::new(vec![
            Box::new(WhiteSpaceCollapseFilter),
            Box::new(HTMLTagFilter),
        ]);
        assert_eq!(analyzer.analyze("<p>a</p>".to_string()), " a ");
    }

    #[test]
    fn test_plain_text_is_idempotent() {
        let once = plain_text("<div> Mange   <br/>ord </div>");
        assert_eq!(plain_text(&once), once);
    }

    #[test]
    fn test_fold_case_keeps_char_count() {
        for s in ["ÆØÅ Bergen", "İstanbul", "straße"] {
            assert_eq!(fold_case(s).chars().count(), s.chars().count());
        }
        assert_eq!(fold_case("ÆØÅ Bergen"), "æøå bergen");
    }
}
