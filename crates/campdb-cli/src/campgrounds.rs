//! Read-only `campgrounds` queries.

use campdb_db::{DbError, PersistedCampground};

/// Print one page of stored campgrounds as a table.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_campgrounds_list(
    pool: &sqlx::PgPool,
    limit: i64,
    offset: i64,
) -> anyhow::Result<()> {
    let rows = campdb_db::list_campgrounds(pool, limit, offset).await?;
    let total = campdb_db::count_campgrounds(pool).await?;

    if rows.is_empty() {
        println!("no campgrounds found ({total} stored); run `crawl` first");
        return Ok(());
    }

    println!(
        "{:<12}{:<40}{:<20}{:<8}UPDATED",
        "ID", "NAME", "REGION", "RATING"
    );
    for row in &rows {
        println!(
            "{:<12}{:<40}{:<20}{:<8}{}",
            row.id,
            truncate(&row.name, 38),
            truncate(&row.region_name, 18),
            row.rating.map_or_else(|| "-".to_string(), |r| format!("{r:.1}")),
            row.updated_at.format("%Y-%m-%d %H:%M"),
        );
    }
    println!("showing {} of {total}", rows.len());

    Ok(())
}

/// Print every stored field of one campground.
///
/// # Errors
///
/// Returns an error if the campground does not exist or the query fails.
pub(crate) async fn run_campgrounds_get(pool: &sqlx::PgPool, id: &str) -> anyhow::Result<()> {
    let row = match campdb_db::get_campground(pool, id).await {
        Ok(row) => row,
        Err(DbError::NotFound) => anyhow::bail!("campground '{id}' not found"),
        Err(e) => return Err(e.into()),
    };

    println!("{}", describe(&row));
    Ok(())
}

fn describe(row: &PersistedCampground) -> String {
    let opt = |v: Option<&str>| v.unwrap_or("-").to_string();
    let price = match (row.price_low, row.price_high) {
        (Some(low), Some(high)) if (high - low).abs() > f64::EPSILON => {
            format!("${low:.2} - ${high:.2}")
        }
        (Some(low), _) => format!("${low:.2}"),
        (None, Some(high)) => format!("${high:.2}"),
        (None, None) => "-".to_string(),
    };

    [
        format!("id:            {}", row.id),
        format!("name:          {}", row.name),
        format!("region:        {}", row.region_name),
        format!("area:          {}", opt(row.administrative_area.as_deref())),
        format!("nearest city:  {}", opt(row.nearest_city_name.as_deref())),
        format!("address:       {}", opt(row.address.as_deref())),
        format!("coordinates:   {:.5}, {:.5}", row.latitude, row.longitude),
        format!("operator:      {}", opt(row.operator.as_deref())),
        format!("bookable:      {}", row.bookable),
        format!("price:         {price}"),
        format!(
            "rating:        {} ({} reviews)",
            row.rating.map_or_else(|| "-".to_string(), |r| format!("{r:.1}")),
            row.reviews_count
        ),
        format!("accommodation: {}", row.accommodation_type_names.join(", ")),
        format!("camper types:  {}", row.camper_types.join(", ")),
        format!("link:          {}", row.self_link),
        format!("updated:       {}", row.updated_at.to_rfc3339()),
    ]
    .join("\n")
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        format!("{}...", value.chars().take(max_chars - 3).collect::<String>())
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_values() {
        assert_eq!(truncate("Moab", 10), "Moab");
    }

    #[test]
    fn truncate_shortens_long_values_on_char_boundaries() {
        assert_eq!(truncate("Cañon City Campground", 10), "Cañon C...");
    }
}
