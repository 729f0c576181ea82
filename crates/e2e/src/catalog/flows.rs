//! UI steps shared by several catalog scenarios

use catalog_webdriver::{ElementRef, Locator};

use crate::error::{ensure, E2eResult};
use crate::page::{button, Page};

/// Title of the record the suite creates, edits, reports on and deletes
pub const TEST_ITEM: &str = "Test Item Title";

/// A lookup table and the value the suite adds to it
#[derive(Debug, Clone, Copy)]
pub struct Lookup {
    /// Path segment under `/library/lookup/`
    pub table: &'static str,
    /// Heading shown on the table's page
    pub label: &'static str,
    pub value: &'static str,
}

impl Lookup {
    pub const fn new(table: &'static str, label: &'static str, value: &'static str) -> Self {
        Self { table, label, value }
    }
}

pub fn legend(label: &str) -> Locator {
    Locator::xpath(format!("//legend[contains(text(), '{}')]", label))
}

pub fn nested_legend(block: &str, index: usize) -> Locator {
    Locator::css(format!("legend[href='#nested-{}-{}']", block, index))
}

fn app_link(path: &str) -> Locator {
    Locator::css(format!("a[href='/library/{}']", path))
}

fn typeahead(testid: &str) -> Locator {
    Locator::css(format!("input[testid='{}']", testid))
}

/// Open the editor's search page
pub async fn open_editor(page: &mut Page) -> E2eResult<()> {
    page.click(&app_link("edit")).await?;
    Ok(())
}

/// Search for the test item by title
pub async fn search_for_test_item(page: &mut Page) -> E2eResult<()> {
    open_editor(page).await?;
    page.set_field_value("title", TEST_ITEM).await?;
    page.click_button("Search").await?;
    Ok(())
}

/// Search for the test item and open it in the editing form
pub async fn open_test_item(page: &mut Page) -> E2eResult<()> {
    search_for_test_item(page).await?;
    let edit = page.find(&Locator::css("button[title='Edit item']")).await?;
    page.scroll_to_bottom().await?;
    page.click_element(&edit).await
}

/// Click a fieldset legend to expand or collapse it
pub async fn toggle(page: &mut Page, label: &str) -> E2eResult<ElementRef> {
    let element = page.click(&legend(label)).await?;
    page.pause(1).await;
    Ok(element)
}

/// Bring the Save button into view and press it
pub async fn save(page: &mut Page) -> E2eResult<()> {
    let save = page.find(&button("Save")).await?;
    page.scroll_into_view(&save).await?;
    page.pause(2).await;
    page.click_element(&save).await
}

/// Set several form fields by id
pub async fn fill(page: &mut Page, fields: &[(&str, &str)]) -> E2eResult<()> {
    for (id, value) in fields {
        page.set_field_value(id, value).await?;
    }
    Ok(())
}

/// Set the fields of one repeated block, e.g. `Parts__2__PartName`
pub async fn fill_block(page: &mut Page, block: &str, index: usize, fields: &[(&str, &str)]) -> E2eResult<()> {
    for (name, value) in fields {
        page.set_field_value(&format!("{}__{}__{}", block, index, name), value).await?;
    }
    Ok(())
}

/// Press an "Add …" button for a repeated block
pub async fn add_block(page: &mut Page, label: &str) -> E2eResult<()> {
    let add = page.find(&button(label)).await?;
    page.scroll_into_view(&add).await?;
    page.pause(1).await;
    page.click_element(&add).await?;
    page.pause(1).await;
    Ok(())
}

/// Type into a typeahead input and accept the suggestion with TAB
pub async fn pick_suggestion(page: &mut Page, testid: &str, value: &str) -> E2eResult<ElementRef> {
    let field = page.find(&typeahead(testid)).await?;
    page.type_into(&field, value).await?;
    page.pause(1).await;
    page.press_tab(&field).await?;
    Ok(field)
}

/// Navigate to a lookup table and check its landing page
pub async fn open_lookup_table(page: &mut Page, table: &str, label: &str) -> E2eResult<()> {
    page.click(&Locator::xpath("//a[contains(text(), 'Lookup Tables')]")).await?;
    page.scroll_to_bottom().await?;
    page.click(&app_link(&format!("lookup/{}", table))).await?;
    page.assert_page_has(label).await?;
    page.assert_page_has("Select a value to edit").await
}

/// Open a table and start a new value
pub async fn start_lookup_value(page: &mut Page, table: &str, label: &str) -> E2eResult<()> {
    open_lookup_table(page, table, label).await?;
    let create = page.find(&button("Create")).await?;
    page.scroll_to_bottom().await?;
    page.click_element(&create).await?;
    page.assert_page_has("Editing Lookup Value").await
}

pub async fn save_lookup_value(page: &mut Page) -> E2eResult<()> {
    let save = page.find(&button("Save")).await?;
    page.scroll_to_bottom().await?;
    page.click_element(&save).await
}

/// Add `lookup.value` to its table; most tables also take a sort position
pub async fn create_lookup_value(page: &mut Page, lookup: &Lookup, sort_position: Option<&str>) -> E2eResult<()> {
    start_lookup_value(page, lookup.table, lookup.label).await?;
    page.set_field_value("LookupValue", lookup.value).await?;
    if let Some(position) = sort_position {
        page.set_field_value("SortPosition", position).await?;
    }
    page.set_field_value("Comments", "Yada yada yada...").await?;
    save_lookup_value(page).await
}

/// Create a lookup value, then select it in one of the test item's dropdowns
pub async fn attach_lookup_value(page: &mut Page, lookup: &Lookup, section: &str, field: &str) -> E2eResult<()> {
    create_lookup_value(page, lookup, Some("-1000")).await?;
    open_test_item(page).await?;
    let fieldset = toggle(page, section).await?;
    page.choose_option(field, lookup.value).await?;
    page.scroll_to_top().await?;
    page.click_element(&fieldset).await?;
    page.pause(1).await;
    save(page).await
}

/// Remove a value the suite added to a lookup table
pub async fn delete_lookup_value(page: &mut Page, lookup: &Lookup) -> E2eResult<()> {
    open_lookup_table(page, lookup.table, lookup.label).await?;
    page.choose_option("lookup-values", lookup.value).await?;
    page.click_button("Edit").await?;

    let delete = page.find(&Locator::css("button[title='Delete this value']")).await?;
    page.scroll_into_view(&delete).await?;
    page.pause(2).await;
    page.scroll_to_bottom().await?;
    page.click_element(&delete).await?;
    page.pause(1).await;

    page.assert_page_has("Are you sure you want to delete this value?").await?;
    page.click(&Locator::css(".modal-footer button.btn-danger")).await?;
    page.pause(1).await;
    Ok(())
}

/// How a report filter is entered
#[derive(Debug, Clone, Copy)]
pub enum Filter<'a> {
    /// Plain text input, by id
    Field(&'a str, &'a str),
    /// Typeahead input, by `testid`
    Suggestion(&'a str, &'a str),
}

/// Narrow the catalog browser by one filter and run the report
pub async fn filtered_report(page: &mut Page, section: &str, filter: Filter<'_>, expected: &str) -> E2eResult<()> {
    page.assert_page_has("Browse Catalog").await?;
    let fieldset = page.find(&legend(section)).await?;
    page.scroll_to_bottom().await?;
    page.click_element(&fieldset).await?;
    page.pause(1).await;

    match filter {
        Filter::Field(id, value) => page.set_field_value(id, value).await?,
        Filter::Suggestion(testid, value) => {
            pick_suggestion(page, testid, value).await?;
        }
    }

    page.click_element(&fieldset).await?;
    page.pause(1).await;
    run_report(page, Some(expected)).await
}

/// Press the Report button.
///
/// With `expected`, switch to the tab the report opened in and check that it
/// lists the expected text.
pub async fn run_report(page: &mut Page, expected: Option<&str>) -> E2eResult<()> {
    page.pause(1).await;
    let report = page.find(&button("Report")).await?;
    page.scroll_into_view(&report).await?;
    page.pause(2).await;
    let original = page.current_window().await?;
    page.click_element(&report).await?;
    page.pause(1).await;

    if let Some(expected) = expected {
        let opened = page.switch_to_other_window(&[original]).await?;
        ensure(opened.is_some(), "the report did not open a new tab")?;
        page.assert_page_has(expected).await?;
    }
    Ok(())
}
