//! `crawl` command handlers.

use campdb_core::{AppConfig, BoundingBox};
use campdb_harvest::TriggerSource;
use campdb_scraper::Crawler;

/// Print the regions a crawl would visit without sending any requests.
///
/// # Errors
///
/// Returns an error if the crawler cannot be constructed from `config`.
pub(crate) fn run_crawl_dry_run(config: &AppConfig) -> anyhow::Result<()> {
    let crawler = Crawler::from_app_config(config)?;
    let regions = crawler.plan(config.crawl_bounds);

    println!("{}", format_plan(config.crawl_bounds, &regions));
    Ok(())
}

/// Run one full crawl and reconcile the results.
///
/// # Errors
///
/// Returns an error if the results cannot be persisted. Regional failures,
/// even of every region, are reported in the summary but not propagated.
pub(crate) async fn run_crawl(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let crawler = Crawler::from_app_config(config)?;
    let summary =
        campdb_harvest::run_harvest(pool, &crawler, config.crawl_bounds, TriggerSource::Cli)
            .await?;

    println!(
        "crawl run {} succeeded: {} regions ({} failed), {} records collected, \
         {} inserted, {} updated, {} duplicates skipped",
        summary.public_id,
        summary.regions_total,
        summary.regions_failed,
        summary.records_collected,
        summary.reconcile.inserted,
        summary.reconcile.updated,
        summary.reconcile.duplicates_skipped,
    );
    Ok(())
}

fn format_plan(root: BoundingBox, regions: &[BoundingBox]) -> String {
    let header = format!(
        "dry-run: would crawl {} regions covering {root}",
        regions.len()
    );
    std::iter::once(header)
        .chain(
            regions
                .iter()
                .enumerate()
                .map(|(index, region)| format!("{:>4}  {}", index + 1, region.to_bbox_param())),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_plan_lists_every_region_in_order() {
        let root = BoundingBox::new(2.0, 0.0, 2.0, 0.0).unwrap();
        let regions = vec![
            BoundingBox::new(1.0, 0.0, 1.0, 0.0).unwrap(),
            BoundingBox::new(1.0, 0.0, 2.0, 1.0).unwrap(),
        ];

        let out = format_plan(root, &regions);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("dry-run: would crawl 2 regions"));
        assert_eq!(lines[1], "   1  0,0,1,1");
        assert_eq!(lines[2], "   2  1,0,2,1");
    }

    #[test]
    fn format_plan_handles_an_empty_grid() {
        let root = BoundingBox::conus();
        assert_eq!(format_plan(root, &[]).lines().count(), 1);
    }
}
