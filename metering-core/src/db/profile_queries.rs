use anyhow::{anyhow, Result};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{Month, Profile};

#[derive(Debug, sqlx::FromRow)]
struct FractionRow {
    profile_name: String,
    month: String,
    fraction: f64,
}

fn row_month(row: &FractionRow) -> Result<Month> {
    row.month
        .parse::<Month>()
        .map_err(|e| anyhow!("corrupt profile row for '{}': {e}", row.profile_name))
}

/// Fetch a profile by name, reassembled from its row-per-month storage.
pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Profile>> {
    let rows = sqlx::query_as::<_, FractionRow>(
        r#"
        SELECT profile_name, month, fraction
        FROM profile_fractions
        WHERE profile_name = $1
        "#,
    )
    .bind(name)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok(None);
    }

    let mut fractions = Vec::with_capacity(rows.len());
    for row in &rows {
        fractions.push((row_month(row)?, row.fraction));
    }
    Ok(Some(Profile::from_stored_rows(name.to_string(), fractions)))
}

/// Fetch every stored profile.
pub async fn find_all(pool: &PgPool) -> Result<Vec<Profile>> {
    let rows = sqlx::query_as::<_, FractionRow>(
        r#"
        SELECT profile_name, month, fraction
        FROM profile_fractions
        ORDER BY profile_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut profiles = Vec::new();
    let mut current: Option<(String, Vec<(Month, f64)>)> = None;
    for row in &rows {
        let month = row_month(row)?;
        match &mut current {
            Some((name, fractions)) if *name == row.profile_name => {
                fractions.push((month, row.fraction));
            }
            _ => {
                if let Some((name, fractions)) = current.take() {
                    profiles.push(Profile::from_stored_rows(name, fractions));
                }
                current = Some((row.profile_name.clone(), vec![(month, row.fraction)]));
            }
        }
    }
    if let Some((name, fractions)) = current {
        profiles.push(Profile::from_stored_rows(name, fractions));
    }

    Ok(profiles)
}

/// Persist a set of already-validated profiles in one transaction,
/// overwriting any existing rows for the same names.
pub async fn save_all(pool: &PgPool, profiles: &[Profile]) -> Result<()> {
    if profiles.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    for profile in profiles {
        sqlx::query("DELETE FROM profile_fractions WHERE profile_name = $1")
            .bind(profile.name())
            .execute(&mut *tx)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO profile_fractions (profile_name, month, fraction) ",
        );
        builder.push_values(profile.fractions(), |mut b, fraction| {
            b.push_bind(profile.name().to_string())
                .push_bind(fraction.month.as_str())
                .push_bind(fraction.value);
        });
        builder.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, name: &str) -> Result<()> {
    sqlx::query("DELETE FROM profile_fractions WHERE profile_name = $1")
        .bind(name)
        .execute(pool)
        .await?;
    Ok(())
}
