//! Read result-table rows into [`RawResultEntry`] values.
//!
//! Cell layout: placing 0, trainer 3, time 4, margin 5, split 6, starting
//! price 11. The competitor name and dam come from the row's result
//! links. A row that cannot be read contributes nothing.

use crate::config::SiteProfile;
use crate::record::RawResultEntry;
use crate::renderer::{PageElement, Selector};
use anyhow::{Context, Result};
use tracing::{debug, warn};

const PLACING_CELL: usize = 0;
const TRAINER_CELL: usize = 3;
const TIME_CELL: usize = 4;
const MARGIN_CELL: usize = 5;
const SPLIT_CELL: usize = 6;
const PRICE_CELL: usize = 11;

/// Scrape every non-scratched row, in table order.
pub async fn scrape_rows(site: &SiteProfile, rows: &[Box<dyn PageElement>]) -> Vec<RawResultEntry> {
    let mut entries = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        match scrape_row(site, row.as_ref()).await {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => debug!("row {i}: scratched"),
            Err(e) => warn!("row {i}: skipped unreadable result row: {e:#}"),
        }
    }
    entries
}

/// Read one row. `Ok(None)` means the runner was scratched.
pub async fn scrape_row(site: &SiteProfile, row: &dyn PageElement) -> Result<Option<RawResultEntry>> {
    let cells = row.find_all(&Selector::css("td")).await?;

    let placing = required_text(&cells, PLACING_CELL)
        .await
        .context("placing cell")?;
    if is_scratched(&placing, &site.scratch_token) {
        return Ok(None);
    }

    let name = match row.find_all(&site.result_name()).await?.first() {
        Some(el) => el.text().await?.trim().to_string(),
        None => anyhow::bail!("no competitor name in row"),
    };
    let trainer = required_text(&cells, TRAINER_CELL)
        .await
        .context("trainer cell")?;

    let links = row.find_all(&site.result_links()).await?;
    let dam = match links.last() {
        Some(last) if links.len() >= 2 => last.text().await?.trim().to_string(),
        _ => String::new(),
    };

    Ok(Some(RawResultEntry {
        name,
        trainer,
        dam,
        time: optional_text(&cells, TIME_CELL).await?,
        margin: optional_text(&cells, MARGIN_CELL).await?,
        split: optional_text(&cells, SPLIT_CELL).await?,
        starting_price: optional_text(&cells, PRICE_CELL).await?,
    }))
}

fn is_scratched(placing: &str, token: &str) -> bool {
    placing.to_uppercase() == token.to_uppercase()
}

async fn required_text(cells: &[Box<dyn PageElement>], idx: usize) -> Result<String> {
    let cell = cells
        .get(idx)
        .with_context(|| format!("row has {} cells, needed index {idx}", cells.len()))?;
    Ok(cell.text().await?.trim().to_string())
}

async fn optional_text(cells: &[Box<dyn PageElement>], idx: usize) -> Result<String> {
    match cells.get(idx) {
        Some(cell) => Ok(cell.text().await?.trim().to_string()),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::mock::{MockElement, MockPage, MockRenderer, MockSite};
    use crate::renderer::Renderer;
    use std::time::Duration;

    fn entry(name: &str, dam: &str) -> RawResultEntry {
        RawResultEntry {
            name: name.into(),
            trainer: " P. Smith ".into(),
            dam: dam.into(),
            time: "29.87".into(),
            margin: "1.25".into(),
            split: "5.42".into(),
            starting_price: "$4.60".into(),
        }
    }

    async fn scrape(rows: Vec<MockElement>) -> Vec<RawResultEntry> {
        let site = SiteProfile::default();
        let renderer = MockRenderer::new(
            MockSite::new().page("table", MockPage::new().with(&site.result_rows(), rows)),
        );
        let mut ctx = renderer.new_context().await.unwrap();
        ctx.navigate("table").await.unwrap();
        let found = ctx
            .find_all(&site.result_rows(), Duration::ZERO)
            .await
            .unwrap();
        scrape_rows(&site, &found).await
    }

    #[tokio::test]
    async fn test_scrapes_fields_by_position() {
        let site = SiteProfile::default();
        let got = scrape(vec![MockElement::result_row(&site, "1", &entry("Swift Sal", "Old Meg"))]).await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "Swift Sal");
        assert_eq!(got[0].trainer, "P. Smith");
        assert_eq!(got[0].dam, "Old Meg");
        assert_eq!(got[0].time, "29.87");
        assert_eq!(got[0].margin, "1.25");
        assert_eq!(got[0].split, "5.42");
        assert_eq!(got[0].starting_price, "$4.60");
    }

    #[tokio::test]
    async fn test_scratched_rows_do_not_shift_order() {
        let site = SiteProfile::default();
        let got = scrape(vec![
            MockElement::result_row(&site, "1", &entry("A", "DA")),
            MockElement::result_row(&site, "scr", &entry("Withdrawn", "DW")),
            MockElement::result_row(&site, "2", &entry("B", "DB")),
        ])
        .await;
        let names: Vec<_> = got.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[tokio::test]
    async fn test_single_link_means_no_dam() {
        let site = SiteProfile::default();
        let got = scrape(vec![MockElement::result_row(&site, "3", &entry("Solo", ""))]).await;
        assert_eq!(got[0].dam, "");
    }

    #[tokio::test]
    async fn test_unreadable_rows_are_swallowed() {
        let site = SiteProfile::default();
        let short_row = MockElement::default()
            .with_children(&Selector::css("td"), vec![MockElement::text("4")])
            .with_children(&site.result_name(), vec![MockElement::text("Short")]);
        let got = scrape(vec![
            MockElement::default().broken(),
            short_row,
            MockElement::result_row(&site, "5", &entry("Kept", "D")),
        ])
        .await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "Kept");
    }

    #[tokio::test]
    async fn test_missing_optional_cells_are_empty() {
        let site = SiteProfile::default();
        let cells = ["1", "", "", "T. Trainer", "30.01"]
            .into_iter()
            .map(MockElement::text)
            .collect();
        let row = MockElement::default()
            .with_children(&Selector::css("td"), cells)
            .with_children(&site.result_name(), vec![MockElement::text("Partial")]);
        let got = scrape(vec![row]).await;
        assert_eq!(got[0].time, "30.01");
        assert_eq!(got[0].margin, "");
        assert_eq!(got[0].starting_price, "");
    }
}
