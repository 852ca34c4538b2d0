//! Text helpers over the parsed tree.

use scraper::ElementRef;

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element as strategies see it.
///
/// Table rows join cell texts with a tab, tables join rows with newlines and
/// inputs report their `value` attribute. Everything else is the
/// whitespace-collapsed concatenation of its text nodes.
pub fn element_text(element: ElementRef<'_>) -> String {
    match element.value().name() {
        "tr" => row_text(element),
        "table" | "thead" | "tbody" | "tfoot" => {
            let rows: Vec<String> = element
                .children()
                .filter_map(ElementRef::wrap)
                .map(element_text)
                .filter(|row| !row.trim().is_empty())
                .collect();
            rows.join("\n")
        }
        "input" | "textarea" => {
            let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            if text.is_empty() {
                element
                    .value()
                    .attr("value")
                    .map(collapse_whitespace)
                    .unwrap_or_default()
            } else {
                text
            }
        }
        _ => collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")),
    }
}

fn row_text(row: ElementRef<'_>) -> String {
    let cells: Vec<String> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .map(|cell| collapse_whitespace(&cell.text().collect::<Vec<_>>().join(" ")))
        .collect();

    if cells.is_empty() {
        collapse_whitespace(&row.text().collect::<Vec<_>>().join(" "))
    } else {
        cells.join("\t")
    }
}

/// Text held directly by an element, ignoring nested elements.
pub fn own_text(element: ElementRef<'_>) -> String {
    let parts: Vec<&str> = element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| &**t))
        .collect();
    collapse_whitespace(&parts.join(" "))
}

/// Cells of a row-shaped string (tab separated).
pub fn cells(row: &str) -> Vec<&str> {
    row.split('\t').map(str::trim).collect()
}
