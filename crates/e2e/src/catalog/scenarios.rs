//! The ordered catalog suite
//!
//! Scenario 1 creates the test item; every later scenario edits it, reports
//! on it or checks it, and the last one deletes it along with every lookup
//! value added on the way. Each scenario's `requires` list names the earlier
//! scenarios whose records it expects to find.

use std::sync::OnceLock;

use catalog_webdriver::Locator;
use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use tracing::{info, warn};

use super::api::CatalogApi;
use super::excel::workbook_contains_text;
use super::flows::{
    add_block, attach_lookup_value, create_lookup_value, delete_lookup_value, fill, fill_block, filtered_report, legend, nested_legend,
    open_editor, open_test_item, pick_suggestion, run_report, save, save_lookup_value, search_for_test_item,
    start_lookup_value, toggle, Filter, Lookup, TEST_ITEM,
};
use crate::error::{ensure, E2eError, E2eResult};
use crate::page::{button, Page};
use crate::scenario::{Scenario, ScenarioSet};

const ACCOMPANIMENT: Lookup = Lookup::new("accompaniment", "Accompaniments", "Test Accompaniment Value");
const ARRANGEMENT: Lookup = Lookup::new("arrangement", "Arrangements", "Test Arrangement Value");
const HANDBELL_ENSEMBLE: Lookup = Lookup::new("handbell-ensemble", "HandBell Ensembles", "Test Handbell Ensemble Value");
const KEY: Lookup = Lookup::new("key", "Keys", "Test Key Value");
const KEYWORD: Lookup = Lookup::new("keyword", "Keywords", "Test Keyword Value");
const OWNER: Lookup = Lookup::new("owner", "Owners", "Test Owner Value");
const SEASON: Lookup = Lookup::new("season", "Seasons", "Test Season Value");
const SKILL: Lookup = Lookup::new("skill", "Skills", "Test Skill Value");
const TAG: Lookup = Lookup::new("tag", "Tags", "Test Tag Name");
const TAG_GROUP: Lookup = Lookup::new("tag-group", "Tag Groups", "Test Tag Group");
const PERSON: Lookup = Lookup::new("person", "People", "Person, Test");
const COMPANY: Lookup = Lookup::new("company", "Companies", "Test Company Name");

/// Values removed by the cleanup scenario, in deletion order.
///
/// Tags go before their group, and the person and company are only
/// removable once the item that referenced them is gone.
const LOOKUPS: [Lookup; 12] = [
    ACCOMPANIMENT,
    ARRANGEMENT,
    HANDBELL_ENSEMBLE,
    KEY,
    KEYWORD,
    OWNER,
    SEASON,
    SKILL,
    TAG,
    TAG_GROUP,
    PERSON,
    COMPANY,
];

/// Text the printable record must show once every scenario before it has run
const PRINTED: &[&str] = &[
    "Test Item Title [item ID",
    "Test Item Other Title",
    "Test Skill Value",
    "Test Owner Value",
    "Adult Choir; Test Tag Name",
    "Test Item Comments",
    "Person, Test (1900-1999)",
    "Test Company Name",
    "2025 All Rights Reserved",
    "Test Item Stock Number",
    "Test Key Value",
    "Test Accompaniment Value",
    "Test Arrangement Value",
    "5.25",
    "3/4",
    "Test Handbell Ensemble Value",
    "Test Item Program Notes",
    "2020-12-25",
    "Awesome!",
    "2024-12-25",
    "Inspiring!",
    "50",
    "2020-01-01",
    "Shelf 1",
    "2.50",
    "New",
    "yada yada yada",
    "2022-01-01",
    "Floor",
    "OK",
    "2024-01-01",
    "Shelf 2",
    "2.75",
    "Shabby",
    "oboe",
    "clarinet",
    "bassoon",
    "French horn",
    "Klem Kadiddlehopper",
];

/// The performance deleted in scenario 13
const DELETED_PERFORMANCE: &str = "Super!";

const ITEM_SETUP: &[&str] = &["create_item"];

/// Every catalog scenario in execution order
pub fn suite() -> E2eResult<ScenarioSet> {
    let mut set = ScenarioSet::new();
    for scenario in scenarios() {
        set = set.register(scenario)?;
    }
    Ok(set)
}

fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario { id: 1, name: "create_item", title: "Add a new item to the catalog", requires: &[], body: create_item },
        Scenario {
            id: 2,
            name: "accompaniment_value",
            title: "Add a new value to the accompaniment lookup table",
            requires: ITEM_SETUP,
            body: accompaniment_value,
        },
        Scenario {
            id: 3,
            name: "arrangement_value",
            title: "Add a new value to the arrangement lookup table",
            requires: ITEM_SETUP,
            body: arrangement_value,
        },
        Scenario {
            id: 4,
            name: "company_value",
            title: "Add a new value to the company lookup table",
            requires: ITEM_SETUP,
            body: company_value,
        },
        Scenario {
            id: 5,
            name: "handbell_ensemble_value",
            title: "Add a new value to the handbell ensemble lookup table",
            requires: ITEM_SETUP,
            body: handbell_ensemble_value,
        },
        Scenario {
            id: 6,
            name: "key_value",
            title: "Add a new value to the key lookup table",
            requires: ITEM_SETUP,
            body: key_value,
        },
        Scenario {
            id: 7,
            name: "keyword_value",
            title: "Add a new value to the keyword lookup table",
            requires: ITEM_SETUP,
            body: keyword_value,
        },
        Scenario {
            id: 8,
            name: "owner_value",
            title: "Add a new value to the owner lookup table",
            requires: ITEM_SETUP,
            body: owner_value,
        },
        Scenario {
            id: 9,
            name: "person_value",
            title: "Add a new value to the person lookup table",
            requires: ITEM_SETUP,
            body: person_value,
        },
        Scenario {
            id: 10,
            name: "season_value",
            title: "Add a new value to the season lookup table",
            requires: ITEM_SETUP,
            body: season_value,
        },
        Scenario {
            id: 11,
            name: "skill_value",
            title: "Add a new value to the skill/difficulty lookup table",
            requires: ITEM_SETUP,
            body: skill_value,
        },
        Scenario {
            id: 12,
            name: "tag_value",
            title: "Add a new value to the tag lookup table",
            requires: ITEM_SETUP,
            body: tag_value,
        },
        Scenario { id: 13, name: "performances", title: "Add performance blocks", requires: ITEM_SETUP, body: performances },
        Scenario { id: 14, name: "inventories", title: "Add inventory blocks", requires: ITEM_SETUP, body: inventories },
        Scenario { id: 15, name: "parts", title: "Add part blocks", requires: ITEM_SETUP, body: parts },
        Scenario { id: 16, name: "loans", title: "Add loan blocks", requires: ITEM_SETUP, body: loans },
        Scenario {
            id: 17,
            name: "title_report",
            title: "Filter catalog items by title and generate a report",
            requires: ITEM_SETUP,
            body: title_report,
        },
        Scenario {
            id: 18,
            name: "composer_report",
            title: "Filter catalog items by composer and generate a report",
            requires: &["create_item", "person_value"],
            body: composer_report,
        },
        Scenario {
            id: 19,
            name: "arrangement_report",
            title: "Filter catalog items by arrangement and generate a report",
            requires: &["create_item", "arrangement_value"],
            body: arrangement_report,
        },
        Scenario {
            id: 20,
            name: "keyword_report",
            title: "Filter catalog items by keyword and generate a report",
            requires: &["create_item", "keyword_value"],
            body: keyword_report,
        },
        Scenario {
            id: 21,
            name: "occasion_report",
            title: "Filter catalog items by occasion and generate a report",
            requires: &["create_item", "season_value"],
            body: occasion_report,
        },
        Scenario {
            id: 22,
            name: "tag_report",
            title: "Filter catalog items by tag and generate a report",
            requires: &["create_item", "tag_value"],
            body: tag_report,
        },
        Scenario {
            id: 23,
            name: "owner_report",
            title: "Filter catalog items by owner and generate a report",
            requires: &["create_item", "owner_value"],
            body: owner_report,
        },
        Scenario {
            id: 24,
            name: "excel_report",
            title: "Test the Excel version of a report",
            requires: ITEM_SETUP,
            body: excel_report,
        },
        Scenario {
            id: 25,
            name: "print",
            title: "Check the full record for the item we created",
            requires: &[
                "create_item",
                "accompaniment_value",
                "arrangement_value",
                "company_value",
                "handbell_ensemble_value",
                "key_value",
                "owner_value",
                "person_value",
                "skill_value",
                "tag_value",
                "performances",
                "inventories",
                "parts",
                "loans",
            ],
            body: print,
        },
        Scenario {
            id: 26,
            name: "cleanup",
            title: "Remove our test data",
            requires: &[
                "create_item",
                "accompaniment_value",
                "arrangement_value",
                "company_value",
                "handbell_ensemble_value",
                "key_value",
                "keyword_value",
                "owner_value",
                "person_value",
                "season_value",
                "skill_value",
                "tag_value",
            ],
            body: cleanup,
        },
    ]
}

// Item

fn create_item(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        open_editor(page).await?;
        page.assert_page_has("Search for an existing record to edit").await?;
        page.click_button("Create").await?;
        page.assert_page_has("Adding New Record").await?;

        let identification = page.click(&legend("Identification")).await?;
        fill(
            page,
            &[
                ("ItemTitle", TEST_ITEM),
                ("OtherTitle", "Test Item Other Title"),
                ("Comments", "Test Item Comments"),
            ],
        )
        .await?;
        page.scroll_into_view(&identification).await?;
        page.pause(1).await;
        page.click_element(&identification).await?;
        page.pause(1).await;

        let publication = page.find(&legend("Publication")).await?;
        page.scroll_into_view(&publication).await?;
        page.click_element(&publication).await?;
        page.pause(2).await;
        fill(
            page,
            &[
                ("Copyright", "2025 All Rights Reserved"),
                ("StockNumber", "Test Item Stock Number"),
            ],
        )
        .await?;
        page.click_element(&publication).await?;
        page.pause(1).await;

        let musical = toggle(page, "Musical Information").await?;
        fill(
            page,
            &[
                ("TimeSignature", "3/4"),
                ("Duration", "5.25"),
                ("ProgramNotes", "Test Item Program Notes"),
            ],
        )
        .await?;
        page.click_element(&musical).await?;

        save(page).await?;
        page.assert_page_has("Successfully saved Test Item Title").await
    }
    .boxed()
}

// Lookup values

fn accompaniment_value(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    attach_lookup_value(page, &ACCOMPANIMENT, "Musical Information", "AccompanimentID").boxed()
}

fn arrangement_value(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    attach_lookup_value(page, &ARRANGEMENT, "Musical Information", "ArrangementID").boxed()
}

fn handbell_ensemble_value(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    attach_lookup_value(page, &HANDBELL_ENSEMBLE, "Musical Information", "HandbellEnsembleID").boxed()
}

fn key_value(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    attach_lookup_value(page, &KEY, "Musical Information", "KeyID").boxed()
}

fn owner_value(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    attach_lookup_value(page, &OWNER, "Identification", "OwnerID").boxed()
}

fn season_value(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    attach_lookup_value(page, &SEASON, "Identification", "SeasonID").boxed()
}

fn company_value(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        open_test_item(page).await?;
        let add = page.find(&button("Add Company")).await?;
        page.scroll_into_view(&add).await?;
        page.pause(2).await;
        page.scroll_to_bottom().await?;
        page.click_element(&add).await?;

        page.assert_page_has("Create New Company Record").await?;
        fill(
            page,
            &[
                ("CompanyName", COMPANY.value),
                ("WebSite", "https://www.example.com"),
                ("Address", "23 Skidoo Lane"),
                ("City", "Kalamazoo"),
                ("State", "MI"),
                ("ZIPCode", "49008"),
                ("Country", "USA"),
                ("Phone", "+1 269-555-1212"),
                ("PhoneNotes", "Don't call after 9pm"),
                ("Email", "klem@kadiddlehopper.org"),
            ],
        )
        .await?;
        let notes = page.find(&Locator::css(".modal-dialog textarea")).await?;
        page.type_into(&notes, "yadissimo").await?;
        let add_record = page.find(&button("Add Record")).await?;
        page.scroll_to_bottom().await?;
        page.click_element(&add_record).await?;

        let publication = toggle(page, "Publication").await?;
        pick_suggestion(page, "PublisherID", COMPANY.value).await?;
        pick_suggestion(page, "SupplierID", COMPANY.value).await?;
        page.click_element(&publication).await?;
        page.pause(1).await;
        save(page).await
    }
    .boxed()
}

fn keyword_value(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        create_lookup_value(page, &KEYWORD, None).await?;
        open_test_item(page).await?;
        let identification = toggle(page, "Identification").await?;
        let keywords = pick_suggestion(page, "Keywords", KEYWORD.value).await?;
        page.pause(1).await;
        page.type_into(&keywords, "justice").await?;
        page.press_tab(&keywords).await?;
        page.click_element(&identification).await?;
        page.pause(1).await;
        save(page).await
    }
    .boxed()
}

fn person_value(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        open_test_item(page).await?;
        let add = page.find(&button("Add Person")).await?;
        page.scroll_into_view(&add).await?;
        page.pause(2).await;
        page.click_element(&add).await?;

        page.assert_page_has("Create New Person Record").await?;
        fill(page, &[("LastName", "Person"), ("FirstName", "Test"), ("Dates", "1900-1999")]).await?;
        let notes = page.find(&Locator::css(".modal-dialog textarea")).await?;
        page.type_into(&notes, "Long, productive career").await?;
        page.click_button("Add Record").await?;

        let creation = toggle(page, "Creation").await?;
        for role in ["ComposerID", "LyricistID", "ArrangerID"] {
            pick_suggestion(page, role, PERSON.value).await?;
        }
        page.click_element(&creation).await?;
        page.pause(1).await;
        save(page).await
    }
    .boxed()
}

fn skill_value(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        create_lookup_value(page, &SKILL, Some("-1000")).await?;
        open_test_item(page).await?;

        let identification = toggle(page, "Identification").await?;
        page.choose_option("SkillID", SKILL.value).await?;
        page.scroll_to_top().await?;
        page.click_element(&identification).await?;
        page.pause(1).await;

        let musical = toggle(page, "Musical Information").await?;
        for voice in ["Soprano", "Alto", "Tenor", "Bass"] {
            page.choose_option(&format!("{}ID", voice), SKILL.value).await?;
        }
        page.click_element(&musical).await?;
        page.pause(1).await;
        save(page).await
    }
    .boxed()
}

fn tag_value(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        start_lookup_value(page, TAG_GROUP.table, TAG_GROUP.label).await?;
        fill(page, &[("TagGroupName", TAG_GROUP.value), ("Comments", "Yada yada yada...")]).await?;
        save_lookup_value(page).await?;

        start_lookup_value(page, TAG.table, TAG.label).await?;
        page.choose_option("TagGroup", TAG_GROUP.value).await?;
        fill(page, &[("TagName", TAG.value), ("Comments", "Yada yada yada...")]).await?;
        save_lookup_value(page).await?;

        open_test_item(page).await?;
        let identification = toggle(page, "Identification").await?;
        let tags = pick_suggestion(page, "Tags", "Test Tag Group: Test Tag Name").await?;
        page.pause(1).await;
        page.type_into(&tags, "ensemble: adult choir").await?;
        page.press_tab(&tags).await?;
        page.click_element(&identification).await?;
        page.pause(1).await;
        save(page).await
    }
    .boxed()
}

// Repeated blocks

fn performances(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        open_test_item(page).await?;
        page.scroll_to_bottom().await?;
        toggle(page, "Performances").await?;

        let rows = [("12252020", "Awesome!"), ("12252022", DELETED_PERFORMANCE), ("12252024", "Inspiring!")];
        for (index, (date, comments)) in rows.into_iter().enumerate() {
            if index > 0 {
                page.scroll_to_bottom().await?;
            }
            add_block(page, "Add Performance").await?;
            fill_block(page, "Performances", index, &[("PerformanceDate", date), ("Comments", comments)]).await?;
        }

        page.click(&Locator::css("legend[href='#nested-Performances-1'] button.trash-button")).await?;
        page.scroll_to_bottom().await?;
        page.click(&Locator::css(".modal-footer .btn-danger")).await?;
        save(page).await
    }
    .boxed()
}

fn inventories(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        open_test_item(page).await?;
        page.scroll_to_bottom().await?;
        toggle(page, "Inventories").await?;

        let rows = [
            ("50", "01012020", "Shelf 1", "2.50", "New"),
            ("50", "01012022", "Floor", "2.50", "OK"),
            ("60", "01012024", "Shelf 2", "2.75", "Shabby"),
        ];
        for (index, (in_stock, date, location, price, condition)) in rows.into_iter().enumerate() {
            add_block(page, "Add Inventory").await?;
            fill_block(
                page,
                "Inventories",
                index,
                &[
                    ("InStock", in_stock),
                    ("InStockDate", date),
                    ("StorageLocation", location),
                    ("LatestPrice", price),
                    ("AcquireCondition", condition),
                    ("Comments", "yada yada yada"),
                ],
            )
            .await?;
            page.click(&nested_legend("Inventories", index)).await?;
            page.pause(1).await;
        }

        save(page).await
    }
    .boxed()
}

fn parts(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        open_test_item(page).await?;
        page.scroll_to_bottom().await?;
        toggle(page, "Parts").await?;

        for (index, part) in ["oboe", "clarinet", "bassoon", "French horn"].into_iter().enumerate() {
            add_block(page, "Add Part").await?;
            fill_block(page, "Parts", index, &[("PartName", part), ("InventoryDate", "01012020"), ("OnHand", "1")])
                .await?;
            if index == 0 {
                fill_block(page, "Parts", index, &[("Needed", "2")]).await?;
            }
            page.click(&nested_legend("Parts", index)).await?;
            page.pause(1).await;
        }

        save(page).await
    }
    .boxed()
}

fn loans(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        open_test_item(page).await?;
        page.scroll_to_bottom().await?;
        toggle(page, "Loans").await?;
        add_block(page, "Add Loan").await?;
        fill_block(
            page,
            "Loans",
            0,
            &[
                ("LoanRecipient", "Klem Kadiddlehopper"),
                ("LoanDate", "01012020"),
                ("LoanReturned", "01012022"),
                ("Comments", "yada yada yada"),
            ],
        )
        .await?;
        page.click(&nested_legend("Loans", 0)).await?;
        page.pause(1).await;
        save(page).await
    }
    .boxed()
}

// Reports

fn token_label(text: &str) -> Locator {
    Locator::xpath(format!("//div[@class='rbt-token-label' and text()='{}']", text))
}

fn title_report(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        page.assert_page_has("Browse Catalog").await?;
        let options = toggle(page, "Options").await?;
        page.set_field_value("report-title", "Test Report").await?;

        // Move the Item ID column onto Title
        let target = page.find(&token_label("Title")).await?;
        ensure(page.is_displayed(&target).await?, "Title column is not visible")?;
        let dragged = page.find(&token_label("Item ID")).await?;
        ensure(page.is_displayed(&dragged).await?, "Item ID column is not visible")?;
        page.drag_and_drop(&dragged, &target).await?;

        pick_suggestion(page, "report-columns", "other").await?;
        page.click_element(&options).await?;

        let identification = page.find(&legend("Identification")).await?;
        page.scroll_to_bottom().await?;
        page.click_element(&identification).await?;
        page.pause(1).await;
        page.set_field_value("title", TEST_ITEM).await?;
        page.click_element(&identification).await?;
        page.pause(1).await;

        let original = page.current_window().await?;
        run_report(page, Some(TEST_ITEM)).await?;
        let report = page.current_window().await?;
        page.assert_page_has("Test Report").await?;
        page.save_pdf("report.pdf").await?;

        let links = page.find_all(&Locator::css("td a")).await?;
        let first = links.first().ok_or_else(|| E2eError::AssertionFailed("report lists no records".to_string()))?;
        page.click_element(first).await?;
        page.switch_to_other_window(&[original, report]).await?;
        page.pause(1).await;
        page.save_pdf("link-from-report.pdf").await
    }
    .boxed()
}

fn composer_report(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    filtered_report(page, "Identification", Filter::Field("creator", PERSON.value), PERSON.value).boxed()
}

fn arrangement_report(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    filtered_report(page, "Identification", Filter::Suggestion("arrangement", ARRANGEMENT.value), TEST_ITEM).boxed()
}

fn keyword_report(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    filtered_report(page, "Classification", Filter::Suggestion("keyword", KEYWORD.value), TEST_ITEM).boxed()
}

fn occasion_report(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    filtered_report(page, "Classification", Filter::Suggestion("season", SEASON.value), TEST_ITEM).boxed()
}

fn tag_report(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    filtered_report(page, "Classification", Filter::Suggestion("tag", "Test Tag"), TEST_ITEM).boxed()
}

fn owner_report(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    filtered_report(page, "Activity", Filter::Suggestion("owner", OWNER.value), TEST_ITEM).boxed()
}

fn report_link() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| {
        Regex::new(r"Report Music Library Report \d{8}-(\d+)\.xlsx").expect("report link pattern is valid")
    })
}

/// Request id from the download link of a finished Excel report
fn report_request_id(source: &str) -> Option<String> {
    report_link().captures(source).map(|c| c[1].to_string())
}

fn excel_report(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        page.assert_page_has("Browse Catalog").await?;
        page.scroll_to_bottom().await?;
        let options = toggle(page, "Options").await?;
        page.click(&Locator::id("report-format-excel")).await?;
        page.click_element(&options).await?;
        page.pause(1).await;
        run_report(page, None).await?;

        let snapshot = page.snapshot().await?;
        let request_id = report_request_id(snapshot.source())
            .ok_or_else(|| E2eError::AssertionFailed("no Excel report link on the page".to_string()))?;

        // The browser's cookies aren't ours to reuse; log in separately
        let api = CatalogApi::new(page.config().api_url())?;
        api.login(&page.config().credentials).await?;
        let workbook = api.fetch_report(&request_id).await?;
        if let Err(e) = api.logout().await {
            warn!("report download session did not close: {}", e);
        }

        ensure(
            workbook_contains_text(&workbook, TEST_ITEM)?,
            format!("report {} has no cell reading {:?}", request_id, TEST_ITEM),
        )
    }
    .boxed()
}

// Whole record

fn print(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        open_editor(page).await?;
        page.scroll_to_bottom().await?;
        page.set_field_value("title", TEST_ITEM).await?;
        let search = page.find(&button("Search")).await?;
        page.scroll_to_bottom().await?;
        page.click_element(&search).await?;
        page.scroll_to_bottom().await?;

        page.click(&Locator::css("button[title='Display printable version of item']")).await?;
        page.pause(1).await;
        let current = page.current_window().await?;
        page.switch_to_other_window(&[current]).await?;
        page.save_pdf("printable-item.pdf").await?;

        let snapshot = page.snapshot().await?;
        let missing: Vec<&str> = PRINTED.iter().copied().filter(|text| !snapshot.contains(text)).collect();
        ensure(missing.is_empty(), format!("printable record is missing {:?}", missing))?;
        page.assert_page_not_has(DELETED_PERFORMANCE).await
    }
    .boxed()
}

fn cleanup(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        search_for_test_item(page).await?;
        let delete = page.find(&Locator::css("button[title='Delete this item']")).await?;
        page.scroll_to_bottom().await?;
        page.click_element(&delete).await?;
        let confirm = page.find(&button("Delete")).await?;
        page.scroll_to_bottom().await?;
        page.click_element(&confirm).await?;
        page.assert_page_has("Successfully deleted Test Item Title.").await?;
        page.assert_page_has("No matching records found.").await?;

        // Keep going past a value that won't delete so the rest still go
        let mut first_failure = None;
        for lookup in &LOOKUPS {
            match delete_lookup_value(page, lookup).await {
                Ok(()) => info!("deleted {} from {}", lookup.value, lookup.table),
                Err(e) => {
                    warn!("could not delete {} from {}: {}", lookup.value, lookup.table, e);
                    first_failure.get_or_insert(e);
                }
            }
        }
        first_failure.map_or(Ok(()), Err)
    }
    .boxed()
}
