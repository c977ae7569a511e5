use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Company - identity is its domain. Never hard-deleted, only deactivated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub domain: String,
    pub name: String,
    pub description: Option<String>,
    pub source: DiscoverySource,
    pub last_discovered_at: DateTime<Utc>,
    pub is_active: bool,
}

/// A company as reported by a discovery source, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyCandidate {
    pub name: String,
    pub domain: String,
    pub description: Option<String>,
    pub source: DiscoverySource,
}

impl CompanyCandidate {
    /// Manual seed for a bare domain; the domain doubles as the display name.
    pub fn seed(domain: &str) -> Self {
        Self {
            name: domain.to_string(),
            domain: domain.to_string(),
            description: None,
            source: DiscoverySource::Manual,
        }
    }
}

impl From<Company> for CompanyCandidate {
    fn from(company: Company) -> Self {
        Self {
            name: company.name,
            domain: company.domain,
            description: company.description,
            source: DiscoverySource::Manual,
        }
    }
}

/// Independent method of finding companies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    /// Seed by domain (re-discovery of a known company).
    Manual,
    /// Code-hosting organization search.
    CodeHost,
    /// Search-engine dorking.
    SearchDork,
}

impl DiscoverySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoverySource::Manual => "manual",
            DiscoverySource::CodeHost => "code_host",
            DiscoverySource::SearchDork => "search_dork",
        }
    }
}

impl std::fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiscoverySource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "manual" => Ok(DiscoverySource::Manual),
            "code_host" | "github" => Ok(DiscoverySource::CodeHost),
            "search_dork" | "google_dork" => Ok(DiscoverySource::SearchDork),
            _ => Err(anyhow::anyhow!("Invalid discovery source: {}", s)),
        }
    }
}

#[derive(sqlx::FromRow)]
struct CompanyRow {
    domain: String,
    name: String,
    description: Option<String>,
    source: String,
    last_discovered_at: DateTime<Utc>,
    is_active: bool,
}

impl TryFrom<CompanyRow> for Company {
    type Error = anyhow::Error;

    fn try_from(row: CompanyRow) -> Result<Self> {
        Ok(Self {
            source: row.source.parse()?,
            domain: row.domain,
            name: row.name,
            description: row.description,
            last_discovered_at: row.last_discovered_at,
            is_active: row.is_active,
        })
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl Company {
    pub async fn find_by_domain(domain: &str, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT domain, name, description, source, last_discovered_at, is_active
            FROM companies
            WHERE domain = $1
            "#,
        )
        .bind(domain)
        .fetch_optional(pool)
        .await
        .context("Failed to load company")?;

        row.map(Company::try_from).transpose()
    }

    /// Active companies not discovered since `cutoff`, oldest first.
    pub async fn find_stale(cutoff: DateTime<Utc>, pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT domain, name, description, source, last_discovered_at, is_active
            FROM companies
            WHERE is_active AND last_discovered_at < $1
            ORDER BY last_discovered_at ASC, domain ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await
        .context("Failed to query stale companies")?;

        rows.into_iter().map(Company::try_from).collect()
    }

    /// Insert on first discovery, refresh name/description on rediscovery.
    ///
    /// `last_discovered_at` is only set on insert; stamping it later is
    /// [`Company::touch_discovered`]'s job.
    pub async fn upsert_many(
        candidates: &[CompanyCandidate],
        discovered_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<usize> {
        let mut tx = pool.begin().await.context("Failed to begin transaction")?;
        let mut stored = 0;

        for candidate in candidates {
            let result = sqlx::query(
                r#"
                INSERT INTO companies (domain, name, description, source, last_discovered_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (domain) DO UPDATE
                SET name = EXCLUDED.name,
                    description = COALESCE(EXCLUDED.description, companies.description)
                "#,
            )
            .bind(&candidate.domain)
            .bind(&candidate.name)
            .bind(&candidate.description)
            .bind(candidate.source.as_str())
            .bind(discovered_at)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to upsert company {}", candidate.domain))?;

            stored += result.rows_affected() as usize;
        }

        tx.commit().await.context("Failed to commit companies")?;
        Ok(stored)
    }

    pub async fn touch_discovered(domain: &str, at: DateTime<Utc>, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE companies SET last_discovered_at = $2 WHERE domain = $1")
            .bind(domain)
            .bind(at)
            .execute(pool)
            .await
            .context("Failed to update company last_discovered_at")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_round_trips_through_str() {
        for source in [
            DiscoverySource::Manual,
            DiscoverySource::CodeHost,
            DiscoverySource::SearchDork,
        ] {
            assert_eq!(source.as_str().parse::<DiscoverySource>().unwrap(), source);
        }
    }

    #[test]
    fn legacy_source_tags_are_accepted() {
        assert_eq!(
            "github".parse::<DiscoverySource>().unwrap(),
            DiscoverySource::CodeHost
        );
        assert_eq!(
            "google_dork".parse::<DiscoverySource>().unwrap(),
            DiscoverySource::SearchDork
        );
        assert!("crunchbase".parse::<DiscoverySource>().is_err());
    }

    #[test]
    fn seed_uses_domain_as_name() {
        let seed = CompanyCandidate::seed("acme.com");
        assert_eq!(seed.name, "acme.com");
        assert_eq!(seed.source, DiscoverySource::Manual);
    }
}
