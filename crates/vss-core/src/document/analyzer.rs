//! Structural metadata for a parsed document.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::models::{DocumentShape, ShapeClass};

lazy_static! {
    static ref EMBEDDED_OBJECT: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// Count elements by kind and classify the layout.
///
/// Tables win over forms, forms over divs; anything else is mixed.
pub fn analyze_structure(html: &Html, text_length: usize) -> DocumentShape {
    let mut shape = DocumentShape {
        text_length,
        ..DocumentShape::default()
    };

    for element in html.root_element().descendants().filter_map(ElementRef::wrap) {
        shape.element_count += 1;
        match element.value().name() {
            "table" => shape.table_count += 1,
            "div" => shape.div_count += 1,
            "span" => shape.span_count += 1,
            "form" => shape.form_count += 1,
            "input" => shape.input_count += 1,
            "script" => {
                let body: String = element.text().collect();
                if EMBEDDED_OBJECT.is_match(&body) {
                    shape.has_embedded_structured_data = true;
                }
            }
            _ => {}
        }
    }

    shape.shape_class = classify(&shape);
    shape
}

fn classify(shape: &DocumentShape) -> ShapeClass {
    if shape.table_count > 3 {
        ShapeClass::TableBased
    } else if shape.form_count > 0 {
        ShapeClass::FormBased
    } else if shape.div_count > 10 {
        ShapeClass::DivBased
    } else {
        ShapeClass::Mixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counts_elements() {
        let html = Html::parse_document(
            r#"<html><body>
                <form><input name="a"><input name="b"></form>
                <div><span>x</span></div>
                <table><tr><td>1</td></tr></table>
            </body></html>"#,
        );
        let shape = analyze_structure(&html, 1);
        assert_eq!(shape.form_count, 1);
        assert_eq!(shape.input_count, 2);
        assert_eq!(shape.div_count, 1);
        assert_eq!(shape.span_count, 1);
        assert_eq!(shape.table_count, 1);
        assert_eq!(shape.shape_class, ShapeClass::FormBased);
        assert!(!shape.has_embedded_structured_data);
    }

    #[test]
    fn test_many_tables_are_table_based() {
        let html = Html::parse_document(&"<table><tr><td>x</td></tr></table>".repeat(4));
        assert_eq!(analyze_structure(&html, 4).shape_class, ShapeClass::TableBased);
    }

    #[test]
    fn test_many_divs_are_div_based() {
        let html = Html::parse_document(&"<div>x</div>".repeat(11));
        assert_eq!(analyze_structure(&html, 11).shape_class, ShapeClass::DivBased);

        let html = Html::parse_document(&"<div>x</div>".repeat(10));
        assert_eq!(analyze_structure(&html, 10).shape_class, ShapeClass::Mixed);
    }
}
