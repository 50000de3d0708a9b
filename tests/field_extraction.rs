use extractly::{FieldExtractor, FieldSet, FieldSpec, HtmlDocument, ParseError, RawDocument};

fn extract(html: &str, spec: FieldSpec) -> String {
    let doc = HtmlDocument::parse_str(html);
    FieldExtractor::extract(&doc, &spec)
}

#[cfg(test)]
mod title_tests {
    use super::*;

    #[test]
    fn test_title_element() {
        let html = "<html><head><title>Hello</title></head><body></body></html>";
        assert_eq!(extract(html, FieldSpec::Title), "Hello");
    }

    #[test]
    fn test_title_is_trimmed() {
        let html = "<html><head><title>\n   Hello World  \n</title></head></html>";
        assert_eq!(extract(html, FieldSpec::Title), "Hello World");
    }

    #[test]
    fn test_meta_title_fallback() {
        let html = r#"<html><head><meta name="title" content="Fallback"></head></html>"#;
        assert_eq!(extract(html, FieldSpec::Title), "Fallback");
    }

    #[test]
    fn test_blank_title_uses_fallback() {
        let html = r#"<html><head><title>   </title>
            <meta name="title" content=" Fallback "></head></html>"#;
        assert_eq!(extract(html, FieldSpec::Title), "Fallback");
    }

    #[test]
    fn test_title_element_wins_over_meta() {
        let html = r#"<html><head><title>Real</title>
            <meta name="title" content="Meta"></head></html>"#;
        assert_eq!(extract(html, FieldSpec::Title), "Real");
    }

    #[test]
    fn test_no_title_at_all() {
        let html = "<html><head></head><body><p>text</p></body></html>";
        assert_eq!(extract(html, FieldSpec::Title), "");
    }

    #[test]
    fn test_meta_title_without_content() {
        let html = r#"<html><head><meta name="title"></head></html>"#;
        assert_eq!(extract(html, FieldSpec::Title), "");
    }

    #[test]
    fn test_title_selector_uses_title_rule() {
        let html = r#"<html><head><meta name="title" content="Fallback"></head>
            <body><article><title>inside</title></article></body></html>"#;
        let doc = HtmlDocument::parse_str(html);

        assert_eq!(
            FieldExtractor::extract(&doc, &FieldSpec::selector("title")),
            FieldExtractor::extract(&doc, &FieldSpec::Title)
        );
    }
}

#[cfg(test)]
mod selector_tests {
    use super::*;

    #[test]
    fn test_elements_joined_and_collapsed() {
        let html = "<article><p>  a  </p><p>b</p></article>";
        assert_eq!(extract(html, FieldSpec::selector("p")), "a b");
    }

    #[test]
    fn test_inner_whitespace_and_newlines_collapsed() {
        let html = "<main><p>first\n\n   line</p>\n<p>\tsecond   line\t</p></main>";
        assert_eq!(
            extract(html, FieldSpec::selector("p")),
            "first line second line"
        );
    }

    #[test]
    fn test_union_of_regions_in_document_order() {
        let html = r#"
            <body>
                <section><h2>one</h2></section>
                <main><h2>two</h2></main>
                <article><h2>three</h2></article>
            </body>
        "#;
        assert_eq!(extract(html, FieldSpec::selector("h2")), "one two three");
    }

    #[test]
    fn test_elements_outside_regions_ignored() {
        let html = r#"
            <body>
                <header><p>nav</p></header>
                <article><p>body</p></article>
                <footer><p>footer</p></footer>
            </body>
        "#;
        assert_eq!(extract(html, FieldSpec::selector("p")), "body");
    }

    #[test]
    fn test_nested_regions_do_not_duplicate() {
        let html = "<main><section><article><p>once</p></article></section></main>";
        assert_eq!(extract(html, FieldSpec::selector("p")), "once");
    }

    #[test]
    fn test_nested_text_included() {
        let html = "<article><p>Some <b>bold</b> and <a href='#'>linked</a> text</p></article>";
        assert_eq!(
            extract(html, FieldSpec::selector("p")),
            "Some bold and linked text"
        );
    }

    #[test]
    fn test_empty_elements_leave_no_gaps() {
        let html = "<article><p>a</p><p>   </p><p>b</p></article>";
        assert_eq!(extract(html, FieldSpec::selector("p")), "a b");
    }

    #[test]
    fn test_no_match_is_empty() {
        let html = "<article><p>text</p></article>";
        assert_eq!(extract(html, FieldSpec::selector("h1")), "");
    }

    #[test]
    fn test_uppercase_tag_name_matches() {
        let html = "<article><H3>Heading</H3></article>";
        assert_eq!(extract(html, FieldSpec::selector("H3")), "Heading");
    }
}

#[cfg(test)]
mod meta_tests {
    use super::*;

    #[test]
    fn test_meta_content_collapsed() {
        let html = r#"<head><meta name="description" content="  hi   there "></head>"#;
        assert_eq!(
            extract(html, FieldSpec::meta("name", "description")),
            "hi there"
        );
    }

    #[test]
    fn test_meta_property_attribute() {
        let html = r#"<head><meta property="og:title" content="Open Graph"></head>"#;
        assert_eq!(
            extract(html, FieldSpec::meta("property", "og:title")),
            "Open Graph"
        );
    }

    #[test]
    fn test_first_matching_meta_wins() {
        let html = r#"<head>
            <meta name="keywords" content="first">
            <meta name="keywords" content="second">
        </head>"#;
        assert_eq!(extract(html, FieldSpec::meta("name", "keywords")), "first");
    }

    #[test]
    fn test_meta_value_matches_exactly() {
        let html = r#"<head><meta name="Description" content="wrong case"></head>"#;
        assert_eq!(extract(html, FieldSpec::meta("name", "description")), "");
    }

    #[test]
    fn test_meta_without_content_is_empty() {
        let html = r#"<head><meta name="description"></head>"#;
        assert_eq!(extract(html, FieldSpec::meta("name", "description")), "");
    }

    #[test]
    fn test_missing_meta_is_empty() {
        let html = "<head><title>x</title></head>";
        assert_eq!(extract(html, FieldSpec::meta("name", "author")), "");
    }
}

#[cfg(test)]
mod document_tests {
    use super::*;

    #[test]
    fn test_extract_all_follows_field_order() {
        let html = r#"<html><head><title>T</title><meta name="description" content="D"></head>
            <body><main><h1>H</h1><p>P</p></main></body></html>"#;
        let doc = HtmlDocument::parse_str(html);
        let fields: FieldSet = r#"p,title,name="description",h1"#.parse().unwrap();

        let values = FieldExtractor::extract_all(&doc, &fields);
        let expected = vec![
            ("p".to_string(), "P".to_string()),
            ("title".to_string(), "T".to_string()),
            (r#"name="description""#.to_string(), "D".to_string()),
            ("h1".to_string(), "H".to_string()),
        ];
        assert_eq!(values, expected);
    }

    #[test]
    fn test_parse_html_content_type() {
        let raw = RawDocument::new(
            "https://example.com",
            "<title>Ok</title>",
            Some("text/html; charset=UTF-8".to_string()),
        );
        let doc = HtmlDocument::parse(&raw).expect("html should parse");
        assert_eq!(doc.title().as_deref(), Some("Ok"));
    }

    #[test]
    fn test_parse_without_content_type() {
        let raw = RawDocument::new("https://example.com", "<title>Ok</title>", None);
        assert!(HtmlDocument::parse(&raw).is_ok());
    }

    #[test]
    fn test_parse_rejects_binary_content() {
        let raw = RawDocument::new(
            "https://example.com/logo.png",
            vec![0x89, b'P', b'N', b'G'],
            Some("Image/PNG".to_string()),
        );

        match HtmlDocument::parse(&raw) {
            Err(ParseError::UnsupportedContentType { content_type }) => {
                assert_eq!(content_type, "image/png")
            }
            Ok(_) => panic!("Expected a parse error"),
        }
    }

    #[test]
    fn test_parse_tolerates_invalid_utf8() {
        let mut body = b"<title>caf".to_vec();
        body.push(0xE9);
        body.extend_from_slice(b"</title>");
        let raw = RawDocument::new("https://example.com", body, None);

        let doc = HtmlDocument::parse(&raw).unwrap();
        assert!(doc.title().unwrap().starts_with("caf"));
    }

    #[test]
    fn test_header_charset_decodes_latin1() {
        let raw = RawDocument::new(
            "https://example.com",
            b"<title>Caf\xe9</title><main><p>cr\xe8me br\xfbl\xe9e</p></main>".to_vec(),
            Some("text/html; charset=iso-8859-1".to_string()),
        );
        assert_eq!(raw.declared_charset(), Some("iso-8859-1"));

        let doc = HtmlDocument::parse(&raw).unwrap();
        assert_eq!(FieldExtractor::extract(&doc, &FieldSpec::Title), "Café");
        assert_eq!(
            FieldExtractor::extract(&doc, &FieldSpec::selector("p")),
            "crème brûlée"
        );
    }

    #[test]
    fn test_meta_charset_decodes_windows_1252() {
        let raw = RawDocument::new(
            "https://example.com",
            b"<html><head><meta charset=\"windows-1252\"><title>na\xefve \x93quotes\x94</title>"
                .to_vec(),
            Some("text/html".to_string()),
        );

        let doc = HtmlDocument::parse(&raw).unwrap();
        assert_eq!(
            FieldExtractor::extract(&doc, &FieldSpec::Title),
            "naïve \u{201c}quotes\u{201d}"
        );
    }

    #[test]
    fn test_http_equiv_charset_is_honored() {
        let raw = RawDocument::new(
            "https://example.com",
            b"<head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=ISO-8859-1\">\
              <meta name=\"description\" content=\"Se\xf1or\"></head>"
                .to_vec(),
            None,
        );

        let doc = HtmlDocument::parse(&raw).unwrap();
        assert_eq!(
            FieldExtractor::extract(&doc, &FieldSpec::meta("name", "description")),
            "Señor"
        );
    }

    #[test]
    fn test_header_charset_wins_over_meta() {
        let raw = RawDocument::new(
            "https://example.com",
            "<meta charset=\"iso-8859-1\"><title>Café</title>",
            Some("text/html; charset=\"utf-8\"".to_string()),
        );
        assert_eq!(raw.declared_charset(), Some("utf-8"));

        let doc = HtmlDocument::parse(&raw).unwrap();
        assert_eq!(doc.title().as_deref(), Some("Café"));
    }

    #[test]
    fn test_unknown_charset_falls_back_to_utf8() {
        let raw = RawDocument::new(
            "https://example.com",
            "<title>Café</title>",
            Some("text/html; charset=x-made-up".to_string()),
        );

        let doc = HtmlDocument::parse(&raw).unwrap();
        assert_eq!(doc.title().as_deref(), Some("Café"));
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let doc = HtmlDocument::parse_str("<p>text</p>");
        assert!(doc.select_all("p[").is_empty());
        assert!(doc.select_one(":::").is_none());
    }
}
