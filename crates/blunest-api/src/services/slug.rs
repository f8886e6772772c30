//! URL slugs for properties and categories

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};

/// Lowercase, runs of non-alphanumerics collapsed to one `-`, trimmed
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// `base`, or `base-2`, `base-3`, ... whichever is not taken in `column`
pub async fn unique_slug<E, C>(db: &C, column: E::Column, base: &str) -> Result<String, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let base = if base.is_empty() { "listing" } else { base };
    let mut candidate = base.to_string();
    let mut suffix = 2;

    while E::find()
        .filter(column.eq(candidate.as_str()))
        .count(db)
        .await?
        > 0
    {
        candidate = format!("{}-{}", base, suffix);
        suffix += 1;
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Sea View Villa, Goa"), "sea-view-villa-goa");
        assert_eq!(slugify("  3BHK -- Koramangala!! "), "3bhk-koramangala");
        assert_eq!(slugify("Prestige   Tower"), "prestige-tower");
        assert_eq!(slugify("!!!"), "");
    }
}
