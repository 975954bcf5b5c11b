//! Typed endpoint wrappers.
//!
//! League endpoints live on the platform host, match endpoints on the
//! regional host. Each wrapper decodes into the defined record shape from
//! `tftcurate_types::riot`.

use tftcurate_types::ids::{MatchId, Puuid};
use tftcurate_types::riot::{LeagueEntry, LeagueList, MatchDetail};
use tftcurate_types::tier::{Tier, TierDivision};
use tftcurate_types::window::CycleWindow;

use crate::error::ApiError;
use crate::http::RiotClient;

/// Ranked queue identifier used across league endpoints.
const RANKED_QUEUE: &str = "RANKED_TFT";

impl RiotClient {
    /// Apex league snapshot (CHALLENGER, GRANDMASTER, MASTER).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] for non-apex tiers, otherwise
    /// the usual terminal conditions.
    pub async fn apex_league(&self, tier: Tier) -> Result<LeagueList, ApiError> {
        let path = match tier {
            Tier::Challenger => "challenger",
            Tier::Grandmaster => "grandmaster",
            Tier::Master => "master",
            other => {
                return Err(ApiError::InvalidRequest(format!(
                    "{other} is not an apex league"
                )))
            }
        };
        let url = format!("{}/tft/league/v1/{path}", self.platform_base());
        let mut league: LeagueList = self
            .get_json(&url, &[("queue", RANKED_QUEUE.to_string())])
            .await?;
        league.tier.get_or_insert(tier);
        Ok(league)
    }

    /// One page of league entries for a tier/division bucket.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] for apex tiers (use
    /// [`RiotClient::apex_league`]), otherwise the usual terminal
    /// conditions.
    pub async fn league_entries(
        &self,
        bucket: TierDivision,
        page: u32,
    ) -> Result<Vec<LeagueEntry>, ApiError> {
        let Some(division) = bucket.division else {
            return Err(ApiError::InvalidRequest(format!(
                "{} has no divisions; fetch the apex league instead",
                bucket.tier
            )));
        };
        let url = format!(
            "{}/tft/league/v1/entries/{}/{}",
            self.platform_base(),
            bucket.tier.as_str(),
            division.as_str()
        );
        self.get_json(
            &url,
            &[
                ("queue", RANKED_QUEUE.to_string()),
                ("page", page.to_string()),
            ],
        )
        .await
    }

    /// Match IDs for a player, bounded to the cycle window.
    ///
    /// # Errors
    ///
    /// Returns the usual terminal conditions.
    pub async fn match_ids(
        &self,
        puuid: &Puuid,
        window: &CycleWindow,
        count: u32,
    ) -> Result<Vec<String>, ApiError> {
        let url = format!(
            "{}/tft/match/v1/matches/by-puuid/{}/ids",
            self.regional_base(),
            puuid.as_str()
        );
        self.get_json(
            &url,
            &[
                ("start", "0".to_string()),
                ("count", count.to_string()),
                ("startTime", window.start_seconds().to_string()),
                ("endTime", window.end_seconds().to_string()),
            ],
        )
        .await
    }

    /// Full match detail.
    ///
    /// # Errors
    ///
    /// Returns the usual terminal conditions.
    pub async fn match_detail(&self, match_id: &MatchId) -> Result<MatchDetail, ApiError> {
        let url = format!(
            "{}/tft/match/v1/matches/{}",
            self.regional_base(),
            match_id.as_str()
        );
        self.get_json(&url, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ClientConfig;
    use tftcurate_types::ids::Region;
    use tftcurate_types::tier::Division;

    fn client() -> RiotClient {
        RiotClient::new(ClientConfig::new("RGAPI-test", Region::new("la2"))).unwrap()
    }

    #[tokio::test]
    async fn apex_league_rejects_divided_tiers() {
        let err = client().apex_league(Tier::Gold).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn league_entries_rejects_apex_buckets() {
        let err = client()
            .league_entries(TierDivision::apex(Tier::Challenger), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn divided_bucket_has_division() {
        let bucket = TierDivision::divided(Tier::Gold, Division::IV);
        assert_eq!(bucket.division, Some(Division::IV));
    }
}
