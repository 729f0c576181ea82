//! Cell text lookup in an Excel (OOXML) workbook

use std::io::{Cursor, Read};

use roxmltree::{Document, Node};

use crate::error::E2eResult;

const SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const WORKSHEETS: &str = "xl/worksheets/";

/// Every string cell value in the workbook, shared and inline.
///
/// A rich-text value is split into runs in the XML; its runs are joined back
/// into the one string the cell shows. Phonetic hints are not cell text.
pub fn cell_texts(workbook: &[u8]) -> E2eResult<Vec<String>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(workbook))?;
    let mut texts = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        let is_strings = name == SHARED_STRINGS || (name.starts_with(WORKSHEETS) && name.ends_with(".xml"));
        if !is_strings {
            continue;
        }
        let mut xml = String::new();
        entry.read_to_string(&mut xml)?;
        texts.extend(string_items(&xml)?);
    }

    Ok(texts)
}

/// True when some cell holds exactly `expected`
pub fn workbook_contains_text(workbook: &[u8], expected: &str) -> E2eResult<bool> {
    Ok(cell_texts(workbook)?.iter().any(|text| text == expected))
}

/// Text of each `<si>` (shared) or `<is>` (inline) string item in one part
fn string_items(xml: &str) -> E2eResult<Vec<String>> {
    let doc = Document::parse(xml)?;
    Ok(doc
        .descendants()
        .filter(|node| matches!(node.tag_name().name(), "si" | "is"))
        .map(item_text)
        .collect())
}

fn item_text(item: Node<'_, '_>) -> String {
    item.descendants()
        .filter(|node| node.tag_name().name() == "t")
        .filter(|t| !t.ancestors().any(|a| a.tag_name().name() == "rPh"))
        .filter_map(|t| t.text())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::error::E2eError;

    const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

    fn workbook(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn shared_strings(items: &str) -> String {
        format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="{SPREADSHEET_NS}">{items}</sst>"#)
    }

    #[test]
    fn test_shared_and_inline_strings() {
        let book = workbook(&[
            ("[Content_Types].xml", "<Types><t>Not a cell</t></Types>"),
            (
                SHARED_STRINGS,
                shared_strings(r#"<si><t>Title</t></si><si><t xml:space="preserve">Test Item Title</t></si>"#).as_str(),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<worksheet xmlns="{SPREADSHEET_NS}"><sheetData><row><c t="inlineStr"><is><t>Rock &amp; Roll</t></is></c></row></sheetData></worksheet>"#
                )
                .as_str(),
            ),
        ]);

        let texts = cell_texts(&book).unwrap();
        assert_eq!(texts, vec!["Title", "Test Item Title", "Rock & Roll"]);
        assert!(workbook_contains_text(&book, "Test Item Title").unwrap());
        assert!(!workbook_contains_text(&book, "Not a cell").unwrap());
    }

    #[test]
    fn test_rich_text_runs_form_one_value() {
        let book = workbook(&[(
            SHARED_STRINGS,
            shared_strings(
                r#"<si><r><rPr><b/></rPr><t xml:space="preserve">Test Item </t></r><r><t>Title</t></r><rPh sb="0" eb="1"><t>ignored</t></rPh></si>"#,
            )
            .as_str(),
        )]);

        assert_eq!(cell_texts(&book).unwrap(), vec!["Test Item Title"]);
        assert!(workbook_contains_text(&book, "Test Item Title").unwrap());
    }

    #[test]
    fn test_entities_are_decoded() {
        let book = workbook(&[(
            SHARED_STRINGS,
            shared_strings("<si><t>&lt;b&gt; &quot;x&quot; &#233;&#x41;</t></si>").as_str(),
        )]);
        assert_eq!(cell_texts(&book).unwrap(), vec!["<b> \"x\" éA"]);
    }

    #[test]
    fn test_substring_is_not_a_match() {
        let book = workbook(&[(SHARED_STRINGS, shared_strings("<si><t>Test Item Title 2</t></si>").as_str())]);
        assert!(!workbook_contains_text(&book, "Test Item Title").unwrap());
    }

    #[test]
    fn test_not_a_workbook() {
        assert!(cell_texts(b"{\"status\":\"failure\"}").is_err());
    }

    #[test]
    fn test_malformed_strings_part() {
        let book = workbook(&[(SHARED_STRINGS, "<sst><si><t>unterminated</si>")]);
        assert!(matches!(cell_texts(&book), Err(E2eError::Xml(_))));
    }
}
